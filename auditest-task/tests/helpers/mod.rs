//! Shared fixtures for the workflow integration tests
//!
//! - `Fixture`: a task wired to in-memory media and a manual clock

#![allow(dead_code)]

use auditest_audio::{ElementHandle, MemoryMedia};
use auditest_core::{AudioId, ExperimentConfig};
use auditest_task::{EvaluationTask, RecordingSubmitter, SessionContext, TaskVariant};
use auditest_timing::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const REDIRECT_URL: &str = "https://example.org/thanks";

/// Two MUSHRA conditions from different groups, no timeout.
pub const MUSHRA_CONFIG: &str = r#"{
    "conditions": [
        {"groupID": 1, "conditionID": 10, "stimulusKeys": ["A", "B"], "referenceKeys": ["R"],
         "evaluation_instructions_html": "<p>Rate the piano.</p>"},
        {"groupID": 2, "conditionID": 20, "stimulusKeys": ["C", "D", "E"], "referenceKeys": ["R"],
         "evaluation_instructions_html": "None"}
    ],
    "conditionGroups": {
        "1": {"referenceFiles": [["R", "g1/ref.wav"]],
              "stimulusFiles": [["A", "g1/a.wav"], ["B", "g1/b.wav"]]},
        "2": {"referenceFiles": [["R", "g2/ref.wav"]],
              "stimulusFiles": [["C", "g2/c.wav"], ["D", "g2/d.wav"], ["E", "g2/e.wav"]]}
    },
    "referenceExampleDict": {"R": "train/ref.wav"},
    "qualityExampleDict": {"Q": ["train/q0.wav", "train/q1.wav"]},
    "testTimeoutSec": 0,
    "defaultRatingValue": 50
}"#;

/// Two pairwise conditions with a five second listening minimum.
pub const PAIRWISE_CONFIG: &str = r#"{
    "conditions": [
        {"groupID": 0, "conditionID": "p1", "stimulusKeys": ["A", "B"], "referenceKeys": ["R"]},
        {"groupID": 0, "conditionID": "p2", "stimulusKeys": ["A", "C"], "referenceKeys": ["R"]}
    ],
    "conditionGroups": {
        "0": {"referenceFiles": [["R", "ref.wav"]],
              "stimulusFiles": [["A", "a.wav"], ["B", "b.wav"], ["C", "c.wav"]]}
    },
    "testTimeoutSec": 5
}"#;

pub struct Fixture<V: TaskVariant<MemoryMedia, ManualTimer, StdRng>> {
    pub task: EvaluationTask<V, MemoryMedia, ManualTimer, StdRng>,
    pub media: MemoryMedia,
    pub timer: ManualTimer,
    pub submitter: RecordingSubmitter,
}

impl<V: TaskVariant<MemoryMedia, ManualTimer, StdRng>> Fixture<V> {
    pub fn new(config: &str, variant: V) -> Self {
        Self::with_media(config, variant, MemoryMedia::new())
    }

    /// For tests that need durations or failures registered before the
    /// task opens its elements.
    pub fn with_media(config: &str, variant: V, media: MemoryMedia) -> Self {
        let timer = ManualTimer::new();
        let submitter = RecordingSubmitter::default();
        let task = EvaluationTask::new(
            ExperimentConfig::from_json(config).unwrap(),
            SessionContext {
                participant_id: "participant-42".to_string(),
                redirect_url: REDIRECT_URL.to_string(),
            },
            media.clone(),
            timer.clone(),
            StdRng::seed_from_u64(11),
            Box::new(submitter.clone()),
            variant,
        )
        .unwrap();

        Self {
            task,
            media,
            timer,
            submitter,
        }
    }

    /// Completes every pending load.
    pub fn load_everything(&mut self) {
        self.media.load_all();
        self.task.update();
    }

    pub fn element(&self, id: &str) -> ElementHandle {
        self.media.handle(&AudioId::new(id)).unwrap()
    }
}
