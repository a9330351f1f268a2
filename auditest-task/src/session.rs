//! State shared by every task variant: configuration, audio, view state,
//! trial bookkeeping and the results upload.

use crate::error::{Result, TaskError};
use crate::handlers::MediaHandler;
use crate::submit::{Submission, SubmissionStatus, Submitter, SessionContext};
use auditest_audio::{AudioGroup, MediaBackend, MediaEvent};
use auditest_core::{
    AudioId, CompletedConditions, Condition, ControlId, ExperimentConfig, Key, PlayControl,
    RatingRecord, StimulusEntry, TaskState, UiState, View,
};
use auditest_timing::{Countdown, Timer};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

pub const AUDIO_GROUP_ID: &str = "audioGroup";

/// Shown when the server refuses the results without saying why.
pub const REJECTED_TEXT: &str = "The server rejected the submitted results.";

pub struct TaskCore<B: MediaBackend, T: Timer, R: Rng> {
    config: ExperimentConfig,
    context: SessionContext,
    audio: AudioGroup<B>,
    ui: UiState,
    state: TaskState,
    condition_index: usize,
    completed: CompletedConditions,
    stimulus_map: Vec<StimulusEntry>,
    countdown: Countdown<T>,
    rng: R,
    pending_loads: usize,
    failure: Option<String>,
    submitter: Box<dyn Submitter>,
    last_submission: Option<Submission>,
}

impl<B: MediaBackend, T: Timer, R: Rng> TaskCore<B, T, R> {
    /// Registers every training and condition sound up front so no trial
    /// ever waits on a load.
    pub fn new(
        config: ExperimentConfig,
        context: SessionContext,
        backend: B,
        timer: T,
        rng: R,
        submitter: Box<dyn Submitter>,
    ) -> Self {
        let mut audio = AudioGroup::new(AUDIO_GROUP_ID, backend);
        audio.set_loop_audio(config.loop_audio);

        let mut core = Self {
            config,
            context,
            audio,
            ui: UiState::default(),
            state: TaskState::Introduction,
            condition_index: 0,
            completed: CompletedConditions::default(),
            stimulus_map: Vec::new(),
            countdown: Countdown::new(timer),
            rng,
            pending_loads: 0,
            failure: None,
            submitter,
            last_submission: None,
        };

        core.load_training_audio();
        core.load_all_condition_group_audio();
        core.build_training_controls();

        info!(
            "Task ready: {} conditions, {} audio elements",
            core.config.condition_count(),
            core.audio.len()
        );
        core
    }

    fn load_training_audio(&mut self) {
        let training: Vec<(AudioId, String)> = self
            .config
            .training_audio()
            .into_iter()
            .map(|(id, path)| (id, path.to_string()))
            .collect();
        for (id, path) in training {
            self.add_audio(&path, id);
        }
    }

    fn load_all_condition_group_audio(&mut self) {
        let audio: Vec<(AudioId, String)> = self
            .config
            .condition_audio()
            .into_iter()
            .map(|(id, path)| (id, path.to_string()))
            .collect();
        for (id, path) in audio {
            self.add_audio(&path, id);
        }
    }

    fn add_audio(&mut self, path: &str, id: AudioId) {
        self.pending_loads += 1;
        self.ui.show_only(View::Loading);
        self.audio.add_audio(path, id);
    }

    fn build_training_controls(&mut self) {
        self.ui.training_controls = self
            .config
            .training_audio()
            .into_iter()
            .map(|(id, _)| PlayControl::new(ControlId::Audio(id)))
            .collect();
    }

    /// Fresh play controls for the current condition: references first,
    /// then one per stimulus position.
    pub fn build_evaluation_controls(&mut self) {
        let Some(condition) = self.config.condition(self.condition_index) else {
            self.ui.evaluation_controls.clear();
            return;
        };

        let references = condition
            .reference_keys
            .iter()
            .map(|key| PlayControl::new(ControlId::Reference(key.clone())));
        let stimuli =
            (0..condition.stimulus_keys.len()).map(|i| PlayControl::new(ControlId::Stimulus(i)));
        self.ui.evaluation_controls = references.chain(stimuli).collect();
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn audio(&self) -> &AudioGroup<B> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioGroup<B> {
        &mut self.audio
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn condition_index(&self) -> usize {
        self.condition_index
    }

    pub fn completed(&self) -> &CompletedConditions {
        &self.completed
    }

    pub fn stimulus_map(&self) -> &[StimulusEntry] {
        &self.stimulus_map
    }

    pub fn set_stimulus_map(&mut self, entries: Vec<StimulusEntry>) {
        self.stimulus_map = entries;
    }

    pub fn pending_loads(&self) -> usize {
        self.pending_loads
    }

    /// Message of the audio failure that halted the session, if any.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Fails every workflow step once an audio element has errored.
    pub fn require_healthy(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(TaskError::Halted(message.clone())),
            None => Ok(()),
        }
    }

    pub fn countdown_mut(&mut self) -> &mut Countdown<T> {
        &mut self.countdown
    }

    pub fn require_state(&self, expected: TaskState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TaskError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    pub(crate) fn transition(&mut self, target: TaskState, action: &'static str) -> Result<()> {
        if !self.state.can_advance_to(target) {
            return Err(TaskError::InvalidState {
                action,
                state: self.state,
            });
        }
        debug!("{:?} -> {:?}", self.state, target);
        self.state = target;
        Ok(())
    }

    /// Shows the natural view of the current state unless sounds are still
    /// loading. A failed session stays on the error view.
    pub fn show_state_view(&mut self) {
        if self.failure.is_some() {
            self.ui.show_only(View::Error);
        } else if self.pending_loads > 0 {
            self.ui.show_only(View::Loading);
        } else {
            self.ui.show_only(self.state.view());
        }
    }

    pub fn condition(&self, index: usize) -> Result<&Condition> {
        self.config
            .condition(index)
            .ok_or(TaskError::ConditionOutOfRange(index))
    }

    pub fn current_condition(&self) -> Result<&Condition> {
        self.condition(self.condition_index)
    }

    /// Audio id of a reference or stimulus key within the current condition.
    pub fn condition_audio_id(&self, key: &Key) -> Result<AudioId> {
        let condition = self.current_condition()?;
        Ok(AudioId::condition(&condition.group_id, key))
    }

    pub fn stimulus_audio_id(&self, idx: usize) -> Result<AudioId> {
        self.stimulus_map
            .get(idx)
            .map(|entry| entry.audio_id.clone())
            .ok_or_else(|| TaskError::UnknownControl(ControlId::Stimulus(idx).dom_id()))
    }

    /// Stimulus map for `index`, shuffled when the configuration asks for it.
    pub fn build_stimulus_map(&mut self, index: usize) -> Result<Vec<StimulusEntry>> {
        let condition = self.condition(index)?;
        let mut entries: Vec<StimulusEntry> = condition
            .stimulus_keys
            .iter()
            .map(|key| StimulusEntry::new(condition.group_id.clone(), key.clone()))
            .collect();

        if self.config.randomize_stimulus_order {
            entries.shuffle(&mut self.rng);
        }
        Ok(entries)
    }

    pub fn reference_ids(&self, index: usize) -> Result<Vec<AudioId>> {
        let condition = self.condition(index)?;
        Ok(condition
            .reference_keys
            .iter()
            .map(|key| AudioId::condition(&condition.group_id, key))
            .collect())
    }

    pub fn set_trial_labels(&mut self) {
        self.ui.trial_label = Some((self.condition_index + 1, self.config.condition_count()));
    }

    pub fn show_instructions(&mut self) {
        let instructions = self
            .config
            .condition(self.condition_index)
            .and_then(|c| c.instructions())
            .map(str::to_string);
        if instructions.is_some() {
            self.ui.instructions = instructions;
        }
    }

    pub fn start_countdown(&mut self) {
        let timeout = self.config.test_timeout();
        self.countdown.start(timeout);
    }

    /// Returns whether the control can be clicked.
    pub fn control_enabled(&self, control: &ControlId) -> Result<bool> {
        self.ui
            .control(control)
            .map(|c| c.enabled)
            .ok_or_else(|| TaskError::UnknownControl(control.dom_id()))
    }

    /// Single-element playback: the clicked control is highlighted and
    /// marked played. Without looping every play control locks until the
    /// sound ends; a looping sound never ends, so the controls stay as they
    /// are and the next click switches sounds.
    pub fn play_single(&mut self, control: ControlId, audio_id: &AudioId) -> Result<()> {
        self.audio.pause();
        self.audio.play(audio_id)?;
        let lock = !self.audio.loop_audio();
        for c in self.ui.play_controls_mut() {
            c.active = false;
            if lock {
                c.enabled = false;
            }
        }
        if let Some(c) = self.ui.control_mut(&control) {
            c.active = true;
            c.played = true;
        }
        debug!("Playing {}", audio_id);
        Ok(())
    }

    /// Stores the ratings of the current condition.
    pub fn store_ratings(&mut self, ratings: BTreeMap<Key, i64>) -> Result<()> {
        let index = self.condition_index;
        let record = RatingRecord::for_condition(&self.config, index, ratings)
            .ok_or(TaskError::ConditionOutOfRange(index))?;
        if !self.completed.store(index, record) {
            return Err(TaskError::ConditionOutOfRange(index));
        }
        debug!("Saved ratings for condition {}", index);
        Ok(())
    }

    /// Moves to the next condition. Returns true when there is none left.
    pub fn advance_condition(&mut self) -> bool {
        self.condition_index += 1;
        self.condition_index >= self.config.condition_count()
    }

    pub fn submit_results(&mut self) -> Result<SubmissionStatus> {
        self.require_healthy()?;
        self.transition(TaskState::Submit, "submit results")?;
        self.countdown.cancel();
        self.audio.pause();
        self.ui.show_only(View::Loading);

        let submission = Submission {
            participant_id: self.context.participant_id.clone(),
            completed_condition_data: self.completed.to_json()?,
            config: self.config.to_echo_json()?,
        };
        info!(
            "Submitting {} completed conditions for {}",
            self.completed.len(),
            submission.participant_id
        );
        self.last_submission = Some(submission);
        self.send()
    }

    /// Re-sends the last submission after a rejected or failed attempt.
    pub fn retry_submission(&mut self) -> Result<SubmissionStatus> {
        self.require_healthy()?;
        self.require_state(TaskState::Submit, "retry submission")?;
        if self.ui.view != View::SubmissionError {
            return Err(TaskError::InvalidState {
                action: "retry a submission that has not failed",
                state: self.state,
            });
        }
        self.ui.show_only(View::Loading);
        self.send()
    }

    fn send(&mut self) -> Result<SubmissionStatus> {
        let Some(submission) = self.last_submission.as_ref() else {
            return Err(TaskError::InvalidState {
                action: "send results before building them",
                state: self.state,
            });
        };

        let status = match self.submitter.submit(submission) {
            Ok(receipt) if !receipt.error => {
                self.state = TaskState::Complete;
                self.ui.show_only(View::Complete);
                self.ui.redirect = Some(self.context.redirect_url.clone());
                info!("Results accepted, redirecting to {}", self.context.redirect_url);
                SubmissionStatus::Accepted
            }
            Ok(receipt) => {
                let text = receipt.message.unwrap_or_else(|| REJECTED_TEXT.to_string());
                warn!("Results rejected: {}", text);
                self.ui.error_text = Some(text);
                self.ui.show_only(View::SubmissionError);
                SubmissionStatus::Rejected
            }
            Err(e) => {
                error!("Submission failed: {}", e);
                self.ui.error_text = Some(e.to_string());
                self.ui.show_only(View::SubmissionError);
                SubmissionStatus::Failed
            }
        };
        Ok(status)
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) {
        let mut handler = MediaHandler {
            ui: &mut self.ui,
            pending_loads: &mut self.pending_loads,
            failure: &mut self.failure,
            state: self.state,
            require_listen_all: self.config.require_listening_to_all_training_sounds,
        };
        self.audio.dispatch(event, &mut handler);
    }
}
