use crate::error::SubmitError;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Who is taking the test and where to send them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub participant_id: String,
    pub redirect_url: String,
}

/// Payload of the one and only results upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub participant_id: String,
    /// JSON array of rating records.
    pub completed_condition_data: String,
    /// JSON of the configuration the session ran with.
    pub config: String,
}

impl Submission {
    /// Form fields in wire order.
    pub fn form_fields(&self) -> [(&'static str, &str); 3] {
        [
            ("participant_id", self.participant_id.as_str()),
            ("completedConditionData", self.completed_condition_data.as_str()),
            ("config", self.config.as_str()),
        ]
    }
}

/// Server verdict on a submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmissionReceipt {
    pub error: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmissionReceipt {
    pub fn accepted() -> Self {
        Self {
            error: false,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Accepted,
    /// The server answered with `error: true`.
    Rejected,
    /// No answer: timeout or transport failure.
    Failed,
}

/// Transport for the results upload. Implementations must bound their own
/// wait time; the workflow has no way to cancel an attempt.
pub trait Submitter {
    fn submit(&mut self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError>;
}

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Result<SubmissionReceipt, SubmitError>>,
    submissions: Vec<Submission>,
}

/// In-process submitter that keeps every upload and answers from a queue
/// of canned responses, accepting once the queue is empty. Clones share
/// the queue and the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubmitter {
    script: Rc<RefCell<Script>>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer to the next unanswered upload.
    pub fn respond_with(&self, response: Result<SubmissionReceipt, SubmitError>) -> &Self {
        self.script.borrow_mut().responses.push_back(response);
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.script.borrow().submissions.clone()
    }
}

impl Submitter for RecordingSubmitter {
    fn submit(&mut self, submission: &Submission) -> Result<SubmissionReceipt, SubmitError> {
        let mut script = self.script.borrow_mut();
        script.submissions.push(submission.clone());
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(SubmissionReceipt::accepted()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_order() {
        let submission = Submission {
            participant_id: "p-1".into(),
            completed_condition_data: "[]".into(),
            config: "{}".into(),
        };
        let names: Vec<&str> = submission.form_fields().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["participant_id", "completedConditionData", "config"]);
    }

    #[test]
    fn test_recording_submitter_answers_in_order_then_accepts() {
        let submission = Submission {
            participant_id: "p-1".into(),
            completed_condition_data: "[]".into(),
            config: "{}".into(),
        };
        let recorder = RecordingSubmitter::new();
        recorder
            .respond_with(Err(SubmitError::Timeout))
            .respond_with(Ok(SubmissionReceipt::rejected("duplicate")));

        let mut submitter = recorder.clone();
        assert_eq!(submitter.submit(&submission), Err(SubmitError::Timeout));
        assert_eq!(
            submitter.submit(&submission),
            Ok(SubmissionReceipt::rejected("duplicate"))
        );
        assert_eq!(submitter.submit(&submission), Ok(SubmissionReceipt::accepted()));
        assert_eq!(recorder.submissions(), vec![submission; 3]);
    }

    #[test]
    fn test_receipt_message_optional() {
        let receipt: SubmissionReceipt = serde_json::from_str(r#"{"error": false}"#).unwrap();
        assert_eq!(receipt, SubmissionReceipt::accepted());
        let receipt: SubmissionReceipt =
            serde_json::from_str(r#"{"error": true, "message": "duplicate"}"#).unwrap();
        assert_eq!(receipt, SubmissionReceipt::rejected("duplicate"));
    }
}
