use crate::session::TaskCore;
use crate::error::Result;
use auditest_audio::MediaBackend;
use auditest_core::{ControlId, Key};
use auditest_timing::Timer;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// The next condition is on screen.
    Advanced,
    /// That was the last condition; results went out.
    Submitted,
    /// "Next" is still disabled; nothing changed.
    Blocked,
    /// The variant refused to save the ratings; nothing changed.
    Vetoed,
}

/// What a rating scheme adds on top of the shared workflow.
///
/// Only the stimulus map and the ratings are mandatory; everything else
/// defaults to single-element playback and the timeout-only gate.
pub trait TaskVariant<B: MediaBackend, T: Timer, R: Rng> {
    /// Called once at the end of task construction.
    fn initialize(&mut self, core: &mut TaskCore<B, T, R>) -> Result<()> {
        let index = core.condition_index();
        self.create_stimulus_map(core, index)
    }

    fn create_stimulus_map(&mut self, core: &mut TaskCore<B, T, R>, condition_index: usize)
    -> Result<()>;

    /// Records the current condition. Returning false vetoes advancement.
    fn save_ratings(&mut self, core: &mut TaskCore<B, T, R>) -> Result<bool>;

    /// Runs after the shared part of `start_evaluation`.
    fn start_evaluation(&mut self, _core: &mut TaskCore<B, T, R>) -> Result<()> {
        Ok(())
    }

    /// The trial countdown ran out.
    fn on_timeout(&mut self, core: &mut TaskCore<B, T, R>) {
        debug!("Trial timeout elapsed, enabling next");
        core.ui_mut().evaluation_next_enabled = true;
    }

    fn play_reference(&mut self, core: &mut TaskCore<B, T, R>, key: &Key) -> Result<()> {
        let id = core.condition_audio_id(key)?;
        core.play_single(ControlId::Reference(key.clone()), &id)
    }

    fn play_stimulus(&mut self, core: &mut TaskCore<B, T, R>, idx: usize) -> Result<()> {
        let id = core.stimulus_audio_id(idx)?;
        core.play_single(ControlId::Stimulus(idx), &id)
    }

    fn next_trial(&mut self, core: &mut TaskCore<B, T, R>) -> Result<TrialOutcome> {
        base_next_trial(self, core)
    }
}

/// Shared trial advancement: save, reset transient marks, move on or submit.
pub fn base_next_trial<V, B, T, R>(variant: &mut V, core: &mut TaskCore<B, T, R>) -> Result<TrialOutcome>
where
    V: TaskVariant<B, T, R> + ?Sized,
    B: MediaBackend,
    T: Timer,
    R: Rng,
{
    if !variant.save_ratings(core)? {
        return Ok(TrialOutcome::Vetoed);
    }

    core.audio_mut().pause();
    let ui = core.ui_mut();
    ui.clear_played();
    ui.playback_position = 0.0;

    if core.advance_condition() {
        core.submit_results()?;
        return Ok(TrialOutcome::Submitted);
    }

    core.build_evaluation_controls();
    core.set_trial_labels();
    core.show_instructions();
    Ok(TrialOutcome::Advanced)
}
