//! Pairwise sessions: the next button opens only after both candidates and
//! the reference were heard, one was chosen, and the timeout passed.

mod helpers;

use auditest_audio::Playback;
use auditest_core::{Key, TaskState};
use auditest_task::{Pairwise, SELECTION_PROMPT, TrialOutcome};
use helpers::{Fixture, PAIRWISE_CONFIG};
use serde_json::Value;
use std::time::Duration;

fn listen_to_everything_and_pick(fx: &mut Fixture<Pairwise>, choice: usize) {
    fx.task.play_reference(&Key::new("R")).unwrap();
    fx.task.play_stimulus(1 - choice).unwrap();
    fx.task.play_stimulus(choice).unwrap();
}

#[test]
fn test_next_blocked_until_timeout_fires() {
    let mut fx = Fixture::new(PAIRWISE_CONFIG, Pairwise::default());
    fx.load_everything();
    fx.task.start_evaluation().unwrap();

    listen_to_everything_and_pick(&mut fx, 0);
    assert!(!fx.task.ui().evaluation_next_enabled);
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Blocked);
    assert_eq!(fx.task.condition_index(), 0);

    fx.timer.advance(Duration::from_millis(4_999));
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Blocked);

    fx.timer.advance(Duration::from_millis(1));
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Advanced);
    assert_eq!(fx.task.condition_index(), 1);
}

#[test]
fn test_each_condition_restarts_the_gate() {
    let mut fx = Fixture::new(PAIRWISE_CONFIG, Pairwise::default());
    fx.load_everything();
    fx.task.start_evaluation().unwrap();

    fx.timer.advance(Duration::from_secs(5));
    listen_to_everything_and_pick(&mut fx, 1);
    fx.task.update();
    assert!(fx.task.ui().evaluation_next_enabled);
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Advanced);

    assert!(!fx.task.variant().timeout_passed());
    assert!(!fx.task.ui().evaluation_next_enabled);
    assert!(fx.task.ui().evaluation_controls.iter().all(|c| !c.played));
    assert_eq!(fx.task.ui().selected_stimulus(), None);
    assert!(fx.task.audio().is_idle());

    let keys: Vec<&str> = fx.task.stimulus_map().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["A", "C"]);

    // The timer restarted with the new condition.
    fx.timer.advance(Duration::from_secs(4));
    listen_to_everything_and_pick(&mut fx, 0);
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Blocked);
    fx.timer.advance(Duration::from_secs(1));
    assert_eq!(fx.task.next_trial().unwrap(), TrialOutcome::Submitted);
    assert_eq!(fx.task.state(), TaskState::Complete);

    let uploads = fx.submitter.submissions();
    let records: Value = serde_json::from_str(&uploads[0].completed_condition_data).unwrap();
    assert_eq!(records[0]["ratings"]["A"], 0);
    assert_eq!(records[0]["ratings"]["B"], 1);
    assert_eq!(records[1]["ratings"]["A"], 1);
    assert_eq!(records[1]["ratings"]["C"], 0);
}

#[test]
fn test_candidates_loop_while_switching() {
    let mut fx = Fixture::new(PAIRWISE_CONFIG, Pairwise::default());
    fx.load_everything();
    fx.task.start_evaluation().unwrap();

    fx.task.play_stimulus(0).unwrap();
    for id in ["G0_A", "G0_B", "G0_R"] {
        assert!(fx.element(id).is_playing(), "{id} should be running");
        assert!(fx.element(id).is_looping(), "{id} should loop");
    }
    assert!(!fx.element("G0_C").is_playing());
    assert!(!fx.element("G0_C").is_looping());

    fx.element("G0_A").finish();
    fx.task.update();
    assert!(fx.element("G0_A").is_playing());
    assert!(matches!(fx.task.audio().playback(), Playback::SyncPlaying(_)));

    // Switching only moves the volume; nothing restarts.
    fx.task.play_reference(&Key::new("R")).unwrap();
    assert_eq!(fx.element("G0_A").play_count(), 1);
    assert_eq!(fx.element("G0_R").volume(), 1.0);
    assert_eq!(fx.element("G0_A").volume(), 0.0);
}

#[test]
fn test_missing_selection_prompt_is_shown_once() {
    let mut fx = Fixture::new(PAIRWISE_CONFIG, Pairwise::default());
    fx.task.start_evaluation().unwrap();

    assert!(!fx.task.save_ratings().unwrap());
    assert_eq!(fx.task.take_prompt().as_deref(), Some(SELECTION_PROMPT));
    assert_eq!(fx.task.take_prompt(), None);
    assert!(fx.task.completed().is_empty());
}
