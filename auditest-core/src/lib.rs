pub mod config;
pub mod ids;
pub mod phase;
pub mod record;
pub mod ui;

pub use config::{AudioFile, Condition, ConditionGroup, ConfigError, ExperimentConfig};
pub use ids::{AudioId, GroupId, Key, StimulusEntry};
pub use phase::{TaskState, View, leave_warning};
pub use record::{CompletedConditions, RatingRecord};
pub use ui::{ControlId, PlayControl, Slider, UiState};
