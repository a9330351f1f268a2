//! Multi-stimulus rating with one slider per candidate.

use crate::session::TaskCore;
use crate::error::{Result, TaskError};
use crate::task::EvaluationTask;
use crate::variant::{TaskVariant, TrialOutcome, base_next_trial};
use auditest_audio::MediaBackend;
use auditest_core::{Key, Slider};
use auditest_timing::Timer;
use rand::Rng;
use std::collections::BTreeMap;

/// Slider scale is `0..=MUSHRA_MAX_RATING`.
pub const MUSHRA_MAX_RATING: i64 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct Mushra;

pub type MushraTask<B, T, R> = EvaluationTask<Mushra, B, T, R>;

impl Mushra {
    fn reset_sliders<B: MediaBackend, T: Timer, R: Rng>(core: &mut TaskCore<B, T, R>, value: i64) {
        let count = core.stimulus_map().len();
        let value = value.clamp(0, MUSHRA_MAX_RATING);
        core.ui_mut().sliders = vec![Slider::new(value); count];
    }
}

impl<B: MediaBackend, T: Timer, R: Rng> TaskVariant<B, T, R> for Mushra {
    fn initialize(&mut self, core: &mut TaskCore<B, T, R>) -> Result<()> {
        let index = core.condition_index();
        self.create_stimulus_map(core, index)?;
        let default = core.config().default_rating_value;
        Self::reset_sliders(core, default);
        Ok(())
    }

    fn create_stimulus_map(&mut self, core: &mut TaskCore<B, T, R>, condition_index: usize) -> Result<()> {
        let entries = core.build_stimulus_map(condition_index)?;
        core.set_stimulus_map(entries);
        Ok(())
    }

    fn save_ratings(&mut self, core: &mut TaskCore<B, T, R>) -> Result<bool> {
        let ratings: BTreeMap<Key, i64> = core
            .stimulus_map()
            .iter()
            .zip(&core.ui().sliders)
            .map(|(entry, slider)| (entry.key.clone(), slider.value))
            .collect();
        core.store_ratings(ratings)?;
        Ok(true)
    }

    fn next_trial(&mut self, core: &mut TaskCore<B, T, R>) -> Result<TrialOutcome> {
        let outcome = base_next_trial(self, core)?;
        if outcome == TrialOutcome::Advanced {
            let index = core.condition_index();
            self.create_stimulus_map(core, index)?;
            let default = core.config().default_rating_value;
            Self::reset_sliders(core, default);
        }
        Ok(outcome)
    }
}

impl<B: MediaBackend, T: Timer, R: Rng> EvaluationTask<Mushra, B, T, R> {
    /// Slider input: stores the value and mirrors it into the readout.
    pub fn set_slider(&mut self, idx: usize, value: i64) -> Result<()> {
        let (_, core) = self.parts_mut();
        let slider = core
            .ui_mut()
            .sliders
            .get_mut(idx)
            .ok_or_else(|| TaskError::UnknownControl(format!("slider {idx}")))?;
        slider.set(value.clamp(0, MUSHRA_MAX_RATING));
        Ok(())
    }

    pub fn set_sliders(&mut self, value: i64) {
        let (_, core) = self.parts_mut();
        Mushra::reset_sliders(core, value);
    }

    pub fn slider_values(&self) -> Vec<i64> {
        self.ui().sliders.iter().map(|s| s.value).collect()
    }
}
