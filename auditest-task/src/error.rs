//! Error types for the evaluation workflow

use auditest_audio::AudioError;
use auditest_core::{ConfigError, TaskState};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Operation not allowed in the current workflow state
    #[error("Cannot {action} while in {state:?}")]
    InvalidState {
        action: &'static str,
        state: TaskState,
    },

    #[error("Unknown control: {0}")]
    UnknownControl(String),

    #[error("Condition {0} is out of range")]
    ConditionOutOfRange(usize),

    /// An audio element failed; the session cannot continue
    #[error("Session halted by an audio failure: {0}")]
    Halted(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Why a submission never produced a server verdict
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("The submission timed out")]
    Timeout,

    #[error("Could not reach the submission server: {0}")]
    Transport(String),

    #[error("Unexpected response from the submission server: {0}")]
    InvalidResponse(String),
}
