use crate::submit::SessionContext;

pub const REDIRECT_URL: &str = "https://example.org/done";

pub fn context() -> SessionContext {
    SessionContext {
        participant_id: "p-1".to_string(),
        redirect_url: REDIRECT_URL.to_string(),
    }
}
