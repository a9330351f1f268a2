pub mod error;
mod handlers;
pub mod mushra;
pub mod pairwise;
pub mod session;
pub mod submit;
pub mod task;
pub mod variant;

#[cfg(test)]
mod test_support;

pub use error::{Result, SubmitError, TaskError};
pub use mushra::{MUSHRA_MAX_RATING, Mushra, MushraTask};
pub use pairwise::{Pairwise, PairwiseTask, SELECTED_LABEL, SELECTION_PROMPT};
pub use session::{AUDIO_GROUP_ID, REJECTED_TEXT, TaskCore};
pub use submit::{
    RecordingSubmitter, SessionContext, Submission, SubmissionReceipt, SubmissionStatus, Submitter,
};
pub use task::{EvaluationTask, TaskEvent};
pub use variant::{TaskVariant, TrialOutcome, base_next_trial};
