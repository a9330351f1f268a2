/// Workflow states, in the only order they can be visited.
#[derive(Copy, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TaskState {
    #[default]
    Introduction,
    Training,
    Evaluation,
    Submit,
    Complete,
}

impl TaskState {
    pub fn next(&self) -> Option<Self> {
        use TaskState::*;
        Some(match self {
            Introduction => Training,
            Training => Evaluation,
            Evaluation => Submit,
            Submit => Complete,
            Complete => return None,
        })
    }

    /// A transition is legal when it moves strictly forward.
    pub fn can_advance_to(&self, target: TaskState) -> bool {
        target > *self
    }

    /// View shown for this state when nothing overlays it.
    pub fn view(&self) -> View {
        match self {
            TaskState::Introduction => View::Introduction,
            TaskState::Training => View::Training,
            TaskState::Evaluation => View::Evaluation,
            TaskState::Submit => View::Submit,
            TaskState::Complete => View::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TaskState::Complete)
    }
}

/// Named views of the host page. Exactly one is visible at a time.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash)]
pub enum View {
    Introduction,
    Training,
    Evaluation,
    Submit,
    Complete,
    Error,
    Loading,
    SubmissionError,
}

impl View {
    pub const ALL: [View; 8] = [
        View::Introduction,
        View::Training,
        View::Evaluation,
        View::Submit,
        View::Complete,
        View::Error,
        View::Loading,
        View::SubmissionError,
    ];

    pub fn dom_id(&self) -> &'static str {
        match self {
            View::Introduction => "#introduction",
            View::Training => "#training",
            View::Evaluation => "#evaluation",
            View::Submit => "#submit",
            View::Complete => "#complete",
            View::Error => "#error",
            View::Loading => "#loading",
            View::SubmissionError => "#submission-error",
        }
    }

    /// Overlays are shown on top of a state and never counted as progress.
    pub fn is_overlay(&self) -> bool {
        matches!(self, View::Error | View::Loading | View::SubmissionError)
    }
}

pub const LEAVE_WARNING: &str = "The evaluation is not complete. Are you sure you want to leave?";

/// Confirmation to show when the participant tries to leave the page.
pub fn leave_warning(state: TaskState) -> Option<&'static str> {
    (!state.is_complete()).then_some(LEAVE_WARNING)
}
