//! Explicit view state. The workflow mutates it, the host renders it.

use crate::ids::{AudioId, Key};
use crate::phase::View;

/// Which button a play control is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControlId {
    /// Training sound, addressed by its audio id.
    Audio(AudioId),
    Reference(Key),
    /// Position in the current stimulus map.
    Stimulus(usize),
}

impl ControlId {
    pub fn dom_id(&self) -> String {
        match self {
            ControlId::Audio(id) => format!("play{id}Btn"),
            ControlId::Reference(key) => format!("playReference{key}Btn"),
            ControlId::Stimulus(idx) => format!("playStimulus{idx}Btn"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayControl {
    pub id: ControlId,
    pub enabled: bool,
    /// Currently audible.
    pub active: bool,
    /// Played at least once this trial.
    pub played: bool,
    /// Pairwise preference marker.
    pub selected: bool,
    pub label: Option<String>,
}

impl PlayControl {
    pub fn new(id: ControlId) -> Self {
        Self {
            id,
            enabled: true,
            active: false,
            played: false,
            selected: false,
            label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub value: i64,
    /// Text box mirroring `value`.
    pub readout: String,
}

impl Slider {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            readout: value.to_string(),
        }
    }

    pub fn set(&mut self, value: i64) {
        self.value = value;
        self.readout = value.to_string();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub view: View,
    pub training_controls: Vec<PlayControl>,
    pub evaluation_controls: Vec<PlayControl>,
    pub training_continue_enabled: bool,
    pub evaluation_next_enabled: bool,
    pub sliders: Vec<Slider>,
    /// Percent of the audible element already played.
    pub playback_position: f64,
    /// `(current, total)` trial counter, 1-based.
    pub trial_label: Option<(usize, usize)>,
    pub instructions: Option<String>,
    pub error_text: Option<String>,
    /// Blocking prompt the host must show before anything else.
    pub prompt: Option<String>,
    /// Set once, when the participant should be sent away.
    pub redirect: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            view: View::Introduction,
            training_controls: Vec::new(),
            evaluation_controls: Vec::new(),
            training_continue_enabled: true,
            evaluation_next_enabled: false,
            sliders: Vec::new(),
            playback_position: 0.0,
            trial_label: None,
            instructions: None,
            error_text: None,
            prompt: None,
            redirect: None,
        }
    }
}

impl UiState {
    pub fn show_only(&mut self, view: View) {
        self.view = view;
    }

    /// Every play control on the page, training and evaluation alike.
    pub fn play_controls_mut(&mut self) -> impl Iterator<Item = &mut PlayControl> {
        self.training_controls
            .iter_mut()
            .chain(self.evaluation_controls.iter_mut())
    }

    pub fn control(&self, id: &ControlId) -> Option<&PlayControl> {
        self.training_controls
            .iter()
            .chain(&self.evaluation_controls)
            .find(|c| c.id == *id)
    }

    pub fn control_mut(&mut self, id: &ControlId) -> Option<&mut PlayControl> {
        self.play_controls_mut().find(|c| c.id == *id)
    }

    /// Drops the "currently audible" highlight from every control.
    pub fn clear_active(&mut self) {
        for control in self.play_controls_mut() {
            control.active = false;
        }
    }

    pub fn clear_played(&mut self) {
        for control in self.play_controls_mut() {
            control.played = false;
        }
    }

    pub fn clear_selection(&mut self) {
        for control in &mut self.evaluation_controls {
            control.selected = false;
            control.label = None;
        }
    }

    pub fn selected_stimulus(&self) -> Option<usize> {
        self.evaluation_controls.iter().find_map(|c| match c.id {
            ControlId::Stimulus(idx) if c.selected => Some(idx),
            _ => None,
        })
    }

    pub fn all_evaluation_played(&self) -> bool {
        self.evaluation_controls.iter().all(|c| c.played)
    }

    pub fn take_prompt(&mut self) -> Option<String> {
        self.prompt.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ui() -> UiState {
        UiState {
            training_controls: vec![PlayControl::new(ControlId::Audio(AudioId::new("TrainingR")))],
            evaluation_controls: vec![
                PlayControl::new(ControlId::Reference(Key::new("R"))),
                PlayControl::new(ControlId::Stimulus(0)),
                PlayControl::new(ControlId::Stimulus(1)),
            ],
            ..UiState::default()
        }
    }

    #[test]
    fn test_control_lookup_spans_both_views() {
        let mut ui = ui();
        assert!(ui.control(&ControlId::Audio(AudioId::new("TrainingR"))).is_some());
        ui.control_mut(&ControlId::Stimulus(1)).unwrap().played = true;
        assert!(ui.control(&ControlId::Stimulus(1)).unwrap().played);
        assert!(ui.control(&ControlId::Stimulus(2)).is_none());
    }

    #[test]
    fn test_selection_and_played_tracking() {
        let mut ui = ui();
        assert_eq!(ui.selected_stimulus(), None);
        ui.control_mut(&ControlId::Stimulus(1)).unwrap().selected = true;
        assert_eq!(ui.selected_stimulus(), Some(1));
        ui.clear_selection();
        assert_eq!(ui.selected_stimulus(), None);

        assert!(!ui.all_evaluation_played());
        for c in ui.play_controls_mut() {
            c.played = true;
        }
        assert!(ui.all_evaluation_played());
        ui.clear_played();
        assert!(!ui.all_evaluation_played());
    }

    #[test]
    fn test_dom_ids() {
        assert_eq!(ControlId::Stimulus(0).dom_id(), "playStimulus0Btn");
        assert_eq!(ControlId::Reference(Key::new("R")).dom_id(), "playReferenceRBtn");
    }

    #[test]
    fn test_slider_readout_mirrors_value() {
        let mut slider = Slider::new(50);
        slider.set(73);
        assert_eq!(slider.readout, "73");
    }
}
