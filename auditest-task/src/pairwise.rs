//! Two-way forced choice. Reference and both candidates run in sync so the
//! participant can switch between them without losing their place.

use crate::session::TaskCore;
use crate::error::Result;
use crate::task::EvaluationTask;
use crate::variant::{TaskVariant, TrialOutcome};
use auditest_audio::MediaBackend;
use auditest_core::{AudioId, ControlId, Key};
use auditest_timing::Timer;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const SELECTION_PROMPT: &str =
    "Press the A or B button to select your preferred recording before continuing.";
pub const SELECTED_LABEL: &str = "(selected)";

/// Gate state beyond what the view already shows. "Played" and "selected"
/// live on the controls themselves.
#[derive(Debug, Clone, Default)]
pub struct Pairwise {
    timeout_passed: bool,
}

pub type PairwiseTask<B, T, R> = EvaluationTask<Pairwise, B, T, R>;

impl Pairwise {
    pub fn timeout_passed(&self) -> bool {
        self.timeout_passed
    }

    /// Enables "next" once everything was heard, a choice is made and the
    /// timeout has run out.
    fn test_next_trial_requirements<B: MediaBackend, T: Timer, R: Rng>(
        &self,
        core: &mut TaskCore<B, T, R>,
    ) {
        let ui = core.ui_mut();
        if ui.all_evaluation_played() && ui.selected_stimulus().is_some() && self.timeout_passed {
            debug!("Pairwise requirements met, enabling next");
            ui.evaluation_next_enabled = true;
        }
    }

    pub fn stop_all_audio<B: MediaBackend, T: Timer, R: Rng>(core: &mut TaskCore<B, T, R>) {
        core.audio_mut().sync_pause();
        core.ui_mut().clear_active();
    }

    fn solo_and_start<B: MediaBackend, T: Timer, R: Rng>(
        core: &mut TaskCore<B, T, R>,
        id: &AudioId,
    ) -> Result<()> {
        let audio = core.audio_mut();
        audio.solo(id)?;
        if audio.is_idle() {
            audio.sync_play();
        }
        Ok(())
    }
}

impl<B: MediaBackend, T: Timer, R: Rng> TaskVariant<B, T, R> for Pairwise {
    fn initialize(&mut self, core: &mut TaskCore<B, T, R>) -> Result<()> {
        self.timeout_passed = false;
        let index = core.condition_index();
        self.create_stimulus_map(core, index)
    }

    fn create_stimulus_map(&mut self, core: &mut TaskCore<B, T, R>, condition_index: usize) -> Result<()> {
        let entries = core.build_stimulus_map(condition_index)?;
        if entries.len() != 2 {
            warn!(
                "Pairwise condition {} has {} stimuli, expected 2",
                condition_index,
                entries.len()
            );
        }

        let mut sync_ids: Vec<AudioId> = entries.iter().map(|e| e.audio_id.clone()).collect();
        sync_ids.extend(core.reference_ids(condition_index)?);
        core.audio_mut().set_sync_ids(sync_ids)?;
        core.set_stimulus_map(entries);
        Ok(())
    }

    fn start_evaluation(&mut self, core: &mut TaskCore<B, T, R>) -> Result<()> {
        core.audio_mut().set_loop_audio(true);
        Ok(())
    }

    fn on_timeout(&mut self, core: &mut TaskCore<B, T, R>) {
        self.timeout_passed = true;
        self.test_next_trial_requirements(core);
    }

    fn play_reference(&mut self, core: &mut TaskCore<B, T, R>, key: &Key) -> Result<()> {
        let id = core.condition_audio_id(key)?;
        Self::solo_and_start(core, &id)?;

        let ui = core.ui_mut();
        ui.clear_active();
        if let Some(control) = ui.control_mut(&ControlId::Reference(key.clone())) {
            control.active = true;
            control.played = true;
        }

        self.test_next_trial_requirements(core);
        Ok(())
    }

    fn play_stimulus(&mut self, core: &mut TaskCore<B, T, R>, idx: usize) -> Result<()> {
        let id = core.stimulus_audio_id(idx)?;

        let ui = core.ui_mut();
        ui.clear_active();
        ui.clear_selection();

        Self::solo_and_start(core, &id)?;

        if let Some(control) = core.ui_mut().control_mut(&ControlId::Stimulus(idx)) {
            control.active = true;
            control.played = true;
            control.selected = true;
            control.label = Some(SELECTED_LABEL.to_string());
        }

        self.test_next_trial_requirements(core);
        Ok(())
    }

    fn save_ratings(&mut self, core: &mut TaskCore<B, T, R>) -> Result<bool> {
        let Some(selected) = core.ui().selected_stimulus() else {
            core.ui_mut().prompt = Some(SELECTION_PROMPT.to_string());
            return Ok(false);
        };

        let ratings: BTreeMap<Key, i64> = core
            .stimulus_map()
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.key.clone(), i64::from(i == selected)))
            .collect();
        core.store_ratings(ratings)?;
        Ok(true)
    }

    fn next_trial(&mut self, core: &mut TaskCore<B, T, R>) -> Result<TrialOutcome> {
        Self::stop_all_audio(core);
        if !self.save_ratings(core)? {
            return Ok(TrialOutcome::Vetoed);
        }

        let ui = core.ui_mut();
        ui.clear_selection();
        ui.clear_played();
        ui.evaluation_next_enabled = false;
        ui.playback_position = 0.0;
        core.countdown_mut().cancel();

        if core.advance_condition() {
            core.submit_results()?;
            return Ok(TrialOutcome::Submitted);
        }

        let index = core.condition_index();
        self.create_stimulus_map(core, index)?;
        core.build_evaluation_controls();
        core.set_trial_labels();
        core.show_instructions();

        self.timeout_passed = false;
        core.start_countdown();
        Ok(TrialOutcome::Advanced)
    }
}

impl<B: MediaBackend, T: Timer, R: Rng> EvaluationTask<Pairwise, B, T, R> {
    /// Pauses the synchronized set and clears play highlighting.
    pub fn stop_all_audio(&mut self) {
        let (_, core) = self.parts_mut();
        Pairwise::stop_all_audio(core);
    }

    /// Runs the ratings step on its own, as the "next" button would.
    pub fn save_ratings(&mut self) -> Result<bool> {
        let (variant, core) = self.parts_mut();
        variant.save_ratings(core)
    }
}
