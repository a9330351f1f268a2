use crate::session::TaskCore;
use crate::error::Result;
use crate::submit::{SessionContext, SubmissionStatus, Submitter};
use crate::variant::{TaskVariant, TrialOutcome};
use auditest_audio::{AudioGroup, MediaBackend, MediaEvent};
use auditest_core::{
    AudioId, CompletedConditions, ControlId, ExperimentConfig, Key, StimulusEntry, TaskState,
    UiState, View, leave_warning,
};
use auditest_timing::Timer;
use rand::Rng;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    TimeoutElapsed,
    Media(MediaEvent),
}

/// The participant-facing workflow: introduction, training, one trial per
/// condition, submission.
pub struct EvaluationTask<V, B, T, R>
where
    V: TaskVariant<B, T, R>,
    B: MediaBackend,
    T: Timer,
    R: Rng,
{
    core: TaskCore<B, T, R>,
    variant: V,
}

impl<V, B, T, R> EvaluationTask<V, B, T, R>
where
    V: TaskVariant<B, T, R>,
    B: MediaBackend,
    T: Timer,
    R: Rng,
{
    pub fn new(
        config: ExperimentConfig,
        context: SessionContext,
        backend: B,
        timer: T,
        rng: R,
        submitter: Box<dyn Submitter>,
        variant: V,
    ) -> Result<Self> {
        let core = TaskCore::new(config, context, backend, timer, rng, submitter);
        let mut task = Self { core, variant };
        task.variant.initialize(&mut task.core)?;
        Ok(task)
    }

    pub fn start_training(&mut self) -> Result<()> {
        self.core.require_healthy()?;
        self.core.transition(TaskState::Training, "start training")?;

        if self.core.config().require_listening_to_all_training_sounds {
            let ui = self.core.ui_mut();
            for (i, control) in ui.training_controls.iter_mut().enumerate() {
                control.enabled = i == 0;
            }
            ui.training_continue_enabled = false;
        }

        self.core.show_state_view();
        info!("Training started");
        Ok(())
    }

    pub fn start_evaluation(&mut self) -> Result<()> {
        self.core.require_healthy()?;
        self.core.transition(TaskState::Evaluation, "start evaluation")?;
        self.core.audio_mut().pause();
        self.core.build_evaluation_controls();

        self.core.ui_mut().evaluation_next_enabled = false;
        self.core.start_countdown();

        self.core.set_trial_labels();
        self.core.show_instructions();
        self.core.show_state_view();

        self.variant.start_evaluation(&mut self.core)?;
        info!(
            "Evaluation started with {} conditions",
            self.core.config().condition_count()
        );
        Ok(())
    }

    /// Plays a training sound. Returns false when its control is locked.
    pub fn play_audio(&mut self, id: &AudioId) -> Result<bool> {
        self.core.require_healthy()?;
        let control = ControlId::Audio(id.clone());
        if !self.core.control_enabled(&control)? {
            debug!("Ignoring click on locked {}", control.dom_id());
            return Ok(false);
        }
        self.core.play_single(control, id)?;
        Ok(true)
    }

    pub fn play_reference(&mut self, key: &Key) -> Result<bool> {
        self.core.require_healthy()?;
        self.core
            .require_state(TaskState::Evaluation, "play a reference")?;
        let control = ControlId::Reference(key.clone());
        if !self.core.control_enabled(&control)? {
            debug!("Ignoring click on locked {}", control.dom_id());
            return Ok(false);
        }
        self.variant.play_reference(&mut self.core, key)?;
        Ok(true)
    }

    pub fn play_stimulus(&mut self, idx: usize) -> Result<bool> {
        self.core.require_healthy()?;
        self.core
            .require_state(TaskState::Evaluation, "play a stimulus")?;
        let control = ControlId::Stimulus(idx);
        if !self.core.control_enabled(&control)? {
            debug!("Ignoring click on locked {}", control.dom_id());
            return Ok(false);
        }
        self.variant.play_stimulus(&mut self.core, idx)?;
        Ok(true)
    }

    /// The "next" button. Delivers due timers first, then does nothing
    /// while the button is disabled.
    pub fn next_trial(&mut self) -> Result<TrialOutcome> {
        self.core
            .require_state(TaskState::Evaluation, "advance the trial")?;
        self.update();
        self.core.require_healthy()?;

        if !self.core.ui().evaluation_next_enabled {
            debug!("Next is disabled, staying on condition {}", self.core.condition_index());
            return Ok(TrialOutcome::Blocked);
        }

        let outcome = self.variant.next_trial(&mut self.core)?;
        info!(
            "Trial {:?}, now at condition {} of {}",
            outcome,
            self.core.condition_index(),
            self.core.config().condition_count()
        );
        Ok(outcome)
    }

    pub fn submit_results(&mut self) -> Result<SubmissionStatus> {
        self.core.submit_results()
    }

    pub fn retry_submission(&mut self) -> Result<SubmissionStatus> {
        self.core.retry_submission()
    }

    /// Dispatches whatever happened since the last call: the trial timeout
    /// and element notifications.
    pub fn update(&mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();

        if self.core.countdown_mut().poll() {
            self.variant.on_timeout(&mut self.core);
            events.push(TaskEvent::TimeoutElapsed);
        }

        for event in self.core.audio_mut().poll_events() {
            self.core.handle_media_event(event.clone());
            events.push(TaskEvent::Media(event));
        }

        events
    }

    pub fn state(&self) -> TaskState {
        self.core.state()
    }

    pub fn failure(&self) -> Option<&str> {
        self.core.failure()
    }

    pub fn view(&self) -> View {
        self.core.ui().view
    }

    pub fn ui(&self) -> &UiState {
        self.core.ui()
    }

    /// Hands the pending blocking prompt to the host, once.
    pub fn take_prompt(&mut self) -> Option<String> {
        self.core.ui_mut().take_prompt()
    }

    pub fn leave_warning(&self) -> Option<&'static str> {
        leave_warning(self.core.state())
    }

    pub fn condition_index(&self) -> usize {
        self.core.condition_index()
    }

    pub fn completed(&self) -> &CompletedConditions {
        self.core.completed()
    }

    pub fn stimulus_map(&self) -> &[StimulusEntry] {
        self.core.stimulus_map()
    }

    pub fn audio(&self) -> &AudioGroup<B> {
        self.core.audio()
    }

    pub fn config(&self) -> &ExperimentConfig {
        self.core.config()
    }

    pub fn variant(&self) -> &V {
        &self.variant
    }

    pub fn core(&self) -> &TaskCore<B, T, R> {
        &self.core
    }

    /// `(current, total)`, 1-based, while trials remain.
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        let total = self.core.config().condition_count();
        let current = self.core.condition_index();
        (current < total).then_some((current + 1, total))
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut V, &mut TaskCore<B, T, R>) {
        (&mut self.variant, &mut self.core)
    }
}
