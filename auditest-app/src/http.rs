use auditest_task::{Submission, SubmissionReceipt, SubmitError, Submitter};
use std::time::Duration;
use tracing::debug;

/// Upper bound on one results upload.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(20);

/// Posts results as a form to the experiment server and reads back its JSON
/// verdict.
pub struct HttpSubmitter {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSubmitter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SubmitError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl Submitter for HttpSubmitter {
    fn submit(&mut self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError> {
        debug!(url = %self.url, "Posting results");

        let response = self
            .client
            .post(&self.url)
            .form(&submission.form_fields())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SubmitError::Timeout
                } else {
                    SubmitError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmitError::InvalidResponse(format!("HTTP {}", status)));
        }

        response
            .json::<SubmissionReceipt>()
            .map_err(|e| SubmitError::InvalidResponse(e.to_string()))
    }
}
