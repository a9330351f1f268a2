//! End-to-end MUSHRA session: loading, training, two rated conditions and
//! the final upload.

mod helpers;

use auditest_core::{ControlId, Key, TaskState, View};
use auditest_task::{Mushra, SubmissionStatus, TaskError, TrialOutcome};
use helpers::{Fixture, MUSHRA_CONFIG, REDIRECT_URL};
use serde_json::Value;

#[test]
fn test_full_session_submits_both_conditions() {
    let mut fx = Fixture::new(MUSHRA_CONFIG, Mushra);
    fx.load_everything();
    assert_eq!(fx.task.view(), View::Introduction);

    fx.task.start_training().unwrap();
    fx.task.start_evaluation().unwrap();
    assert_eq!(fx.task.view(), View::Evaluation);
    assert_eq!(fx.task.ui().trial_label, Some((1, 2)));
    assert_eq!(fx.task.ui().instructions.as_deref(), Some("<p>Rate the piano.</p>"));

    fx.task.set_slider(0, 20).unwrap();
    fx.task.set_slider(1, 90).unwrap();
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Advanced);

    assert_eq!(fx.task.ui().trial_label, Some((2, 2)));
    assert_eq!(fx.task.slider_values(), vec![50, 50, 50]);
    // "None" keeps whatever was shown before.
    assert_eq!(fx.task.ui().instructions.as_deref(), Some("<p>Rate the piano.</p>"));

    fx.task.set_slider(2, 0).unwrap();
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Submitted);
    assert_eq!(fx.task.state(), TaskState::Complete);
    assert_eq!(fx.task.view(), View::Complete);
    assert_eq!(fx.task.ui().redirect.as_deref(), Some(REDIRECT_URL));
    assert_eq!(fx.task.leave_warning(), None);

    let uploads = fx.submitter.submissions();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].participant_id, "participant-42");

    let records: Value = serde_json::from_str(&uploads[0].completed_condition_data).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["conditionID"], 10);
    assert_eq!(records[0]["ratings"]["A"], 20);
    assert_eq!(records[0]["ratings"]["B"], 90);
    assert_eq!(records[1]["conditionID"], 20);
    assert_eq!(records[1]["ratings"]["C"], 50);
    assert_eq!(records[1]["ratings"]["E"], 0);

    let config: Value = serde_json::from_str(&uploads[0].config).unwrap();
    assert_eq!(config["defaultRatingValue"], 50);
}

#[test]
fn test_single_playback_locks_controls_until_ended() {
    let mut fx = Fixture::new(MUSHRA_CONFIG, Mushra);
    fx.load_everything();
    fx.task.start_evaluation().unwrap();

    assert!(fx.task.play_reference(&Key::new("R")).unwrap());
    assert!(fx.element("G1_R").is_playing());
    let reference = fx.task.ui().control(&ControlId::Reference(Key::new("R"))).unwrap();
    assert!(reference.active && reference.played);

    assert!(!fx.task.play_stimulus(0).unwrap());
    assert!(!fx.element("G1_A").is_playing());

    fx.element("G1_R").finish();
    fx.task.update();
    assert!(fx.task.audio().is_idle());
    assert!(fx.task.ui().evaluation_controls.iter().all(|c| c.enabled && !c.active));

    assert!(fx.task.play_stimulus(0).unwrap());
    assert!(fx.element("G1_A").is_playing());
}

#[test]
fn test_looping_playback_leaves_controls_open() {
    let config = MUSHRA_CONFIG.replace(
        "\"testTimeoutSec\": 0",
        "\"testTimeoutSec\": 0, \"loopAudio\": true",
    );
    let mut fx = Fixture::new(&config, Mushra);
    fx.load_everything();
    fx.task.start_evaluation().unwrap();

    assert!(fx.task.play_reference(&Key::new("R")).unwrap());
    assert!(!fx.element("G1_R").is_looping());
    assert!(fx.task.ui().evaluation_controls.iter().all(|c| c.enabled));

    // Each pass ends and starts over.
    for pass in 2..=4 {
        fx.element("G1_R").finish();
        fx.task.update();
        assert!(fx.element("G1_R").is_playing());
        assert_eq!(fx.element("G1_R").play_count(), pass);
    }

    assert!(fx.task.play_stimulus(0).unwrap());
    assert!(fx.element("G1_A").is_playing());
    assert!(!fx.element("G1_R").is_playing());
    let reference = fx.task.ui().control(&ControlId::Reference(Key::new("R"))).unwrap();
    assert!(reference.played && !reference.active);
}

#[test]
fn test_time_updates_track_the_playing_element() {
    let media = auditest_audio::MemoryMedia::new();
    media.set_duration("g1/a.wav", 4.0);
    let mut fx = Fixture::with_media(MUSHRA_CONFIG, Mushra, media);
    fx.load_everything();
    fx.task.start_evaluation().unwrap();

    fx.task.play_stimulus(0).unwrap();
    fx.element("G1_A").tick(1.0);
    fx.task.update();
    assert_eq!(fx.task.ui().playback_position, 25.0);

    // Elements that are not audible do not move the bar.
    fx.element("G1_B").tick(3.0);
    fx.task.update();
    assert_eq!(fx.task.ui().playback_position, 25.0);
}

#[test]
fn test_operations_outside_evaluation_are_rejected() {
    let mut fx = Fixture::new(MUSHRA_CONFIG, Mushra);
    assert!(matches!(
        fx.task.next_trial(),
        Err(TaskError::InvalidState { state: TaskState::Introduction, .. })
    ));
    assert!(fx.task.play_stimulus(0).is_err());

    fx.task.start_evaluation().unwrap();
    assert!(matches!(
        fx.task.start_training(),
        Err(TaskError::InvalidState { state: TaskState::Evaluation, .. })
    ));
}

#[test]
fn test_condition_index_stays_within_bounds() {
    let mut fx = Fixture::new(MUSHRA_CONFIG, Mushra);
    fx.task.start_evaluation().unwrap();
    assert_eq!(fx.task.trial_progress(), Some((1, 2)));

    fx.task.next_trial().unwrap();
    assert_eq!(fx.task.condition_index(), 1);
    assert_eq!(fx.task.trial_progress(), Some((2, 2)));

    fx.task.next_trial().unwrap();
    assert_eq!(fx.task.condition_index(), 2);
    assert_eq!(fx.task.trial_progress(), None);
    assert_eq!(fx.task.completed().len(), 2);

    assert!(fx.task.next_trial().is_err());
    assert_eq!(fx.task.condition_index(), 2);
}

#[test]
fn test_submitting_twice_is_rejected() {
    let mut fx = Fixture::new(MUSHRA_CONFIG, Mushra);
    fx.task.start_evaluation().unwrap();
    assert_eq!(fx.task.submit_results().unwrap(), SubmissionStatus::Accepted);
    assert!(fx.task.submit_results().is_err());
    assert_eq!(fx.submitter.submissions().len(), 1);
}
