use auditest_audio::{AudioEvents, AudioGroup, MediaBackend, Playback};
use auditest_core::{AudioId, TaskState, UiState, View};
use tracing::{debug, error, warn};

/// Borrowed slice of the task that element notifications may touch.
pub(crate) struct MediaHandler<'a> {
    pub ui: &'a mut UiState,
    pub pending_loads: &'a mut usize,
    pub failure: &'a mut Option<String>,
    pub state: TaskState,
    pub require_listen_all: bool,
}

impl<B: MediaBackend> AudioEvents<B> for MediaHandler<'_> {
    fn on_time_update(&mut self, group: &mut AudioGroup<B>, id: &AudioId) {
        let audible = match group.playback() {
            Playback::Idle => {
                self.ui.playback_position = 0.0;
                return;
            }
            Playback::SyncPlaying(_) => group.soloing() == Some(id),
            Playback::Playing(playing) => playing == id,
        };

        if audible {
            if let Some(position) = group.progress_percent(id) {
                self.ui.playback_position = position;
            }
        }
    }

    fn on_loaded_data(&mut self, _group: &mut AudioGroup<B>, id: &AudioId) {
        *self.pending_loads = self.pending_loads.saturating_sub(1);
        debug!("Loaded {}, {} still loading", id, self.pending_loads);

        if *self.pending_loads == 0 && self.failure.is_none() && self.ui.view == View::Loading {
            self.ui.show_only(self.state.view());
        }
    }

    /// Fatal: playback stops and the session halts on the error view.
    fn on_error(&mut self, group: &mut AudioGroup<B>, id: &AudioId, message: &str) {
        error!("Audio {} failed: {}", id, message);
        group.pause();
        if self.failure.is_none() {
            *self.failure = Some(message.to_string());
            self.ui.error_text = Some(message.to_string());
        }
        self.ui.show_only(View::Error);
    }

    fn on_ended(&mut self, group: &mut AudioGroup<B>, id: &AudioId) {
        if group.loop_audio() {
            if let Err(e) = group.replay_if_looping(id) {
                warn!("Could not loop {}: {}", id, e);
            }
        } else {
            for control in self.ui.play_controls_mut() {
                control.enabled = true;
                control.active = false;
            }
            group.note_ended(id);
        }

        if self.state == TaskState::Training && self.require_listen_all {
            self.unlock_next_training_sound();
        }
    }
}

impl MediaHandler<'_> {
    /// Only the first unplayed training sound stays clickable; once all
    /// were heard the participant may continue.
    fn unlock_next_training_sound(&mut self) {
        let mut first_unplayed = true;
        for control in self.ui.training_controls.iter_mut().filter(|c| !c.played) {
            control.enabled = first_unplayed;
            first_unplayed = false;
        }

        if first_unplayed {
            debug!("All training sounds played");
            self.ui.training_continue_enabled = true;
        }
    }
}
