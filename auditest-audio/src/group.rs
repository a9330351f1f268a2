use crate::media::{MediaBackend, MediaElement, MediaEvent, MediaEventKind};
use auditest_core::AudioId;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Sync members start here rather than at zero so every element seeks.
pub const SYNC_START_OFFSET_SEC: f64 = 0.000_001;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("No audio element with id {0}")]
    UnknownId(AudioId),
}

pub type Result<T> = std::result::Result<T, AudioError>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Playback {
    #[default]
    Idle,
    Playing(AudioId),
    SyncPlaying(Vec<AudioId>),
}

/// Receives element notifications dispatched by [`AudioGroup::dispatch`].
pub trait AudioEvents<B: MediaBackend> {
    fn on_time_update(&mut self, _group: &mut AudioGroup<B>, _id: &AudioId) {}

    fn on_loaded_data(&mut self, _group: &mut AudioGroup<B>, _id: &AudioId) {}

    fn on_error(&mut self, _group: &mut AudioGroup<B>, _id: &AudioId, _message: &str) {}

    fn on_ended(&mut self, group: &mut AudioGroup<B>, id: &AudioId) {
        if let Err(e) = group.replay_if_looping(id) {
            warn!("Could not loop {}: {}", id, e);
        }
    }
}

/// Handler with only the default behavior.
pub struct DefaultEvents;

impl<B: MediaBackend> AudioEvents<B> for DefaultEvents {}

/// Named set of addressable audio elements.
pub struct AudioGroup<B: MediaBackend> {
    id: String,
    backend: B,
    elements: BTreeMap<AudioId, B::Element>,
    loop_audio: bool,
    playback: Playback,
    soloing: Option<AudioId>,
    sync_ids: Vec<AudioId>,
}

impl<B: MediaBackend> AudioGroup<B> {
    pub fn new(id: impl Into<String>, backend: B) -> Self {
        Self {
            id: id.into(),
            backend,
            elements: BTreeMap::new(),
            loop_audio: false,
            playback: Playback::Idle,
            soloing: None,
            sync_ids: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn add_audio(&mut self, path: &str, id: AudioId) {
        debug!("Adding {} ({}) to {}", id.dom_id(&self.id), path, self.id);
        let element = self.backend.open(&id, path);
        self.elements.insert(id, element);
    }

    /// Declares the synchronized subset. Members should share a duration;
    /// a mismatch is only logged.
    pub fn set_sync_ids(&mut self, ids: Vec<AudioId>) -> Result<()> {
        let mut durations = Vec::with_capacity(ids.len());
        for id in &ids {
            durations.push(self.element(id)?.duration());
        }

        if let Some(Some(first)) = durations.first() {
            for (id, duration) in ids.iter().zip(&durations) {
                if let Some(d) = duration {
                    if (d - first).abs() > f64::EPSILON {
                        warn!(
                            "Synced audio {} lasts {:.3}s, expected {:.3}s",
                            id, d, first
                        );
                    }
                }
            }
        }

        self.sync_ids = ids;
        self.apply_native_loop();
        Ok(())
    }

    pub fn sync_ids(&self) -> &[AudioId] {
        &self.sync_ids
    }

    /// Removes every element and forgets all playback markers.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.sync_ids.clear();
        self.playback = Playback::Idle;
        self.soloing = None;
    }

    /// Restarts `id` from zero. A previously playing single element keeps
    /// going; stopping it is up to the caller.
    pub fn play(&mut self, id: &AudioId) -> Result<()> {
        let element = self.element_mut(id)?;
        element.set_current_time(0.0);
        element.play();
        self.playback = Playback::Playing(id.clone());
        self.soloing = Some(id.clone());
        Ok(())
    }

    pub fn pause(&mut self) {
        match self.playback.clone() {
            Playback::SyncPlaying(_) => self.sync_pause(),
            Playback::Playing(id) => {
                if let Some(element) = self.elements.get_mut(&id) {
                    element.pause();
                }
                self.playback = Playback::Idle;
            }
            Playback::Idle => {}
        }
        self.soloing = None;
    }

    pub fn sync_play(&mut self) {
        for id in &self.sync_ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.set_current_time(SYNC_START_OFFSET_SEC);
                element.play();
            }
        }
        self.playback = Playback::SyncPlaying(self.sync_ids.clone());
    }

    pub fn sync_pause(&mut self) {
        let single = match &self.playback {
            Playback::Idle => return,
            Playback::Playing(id) => Some(id.clone()),
            Playback::SyncPlaying(_) => None,
        };

        for id in self.sync_ids.iter().chain(single.as_ref()) {
            if let Some(element) = self.elements.get_mut(id) {
                element.pause();
            }
        }
        self.playback = Playback::Idle;
    }

    /// Makes `id` the only audible member of the sync set without touching
    /// transport state.
    pub fn solo(&mut self, id: &AudioId) -> Result<()> {
        self.element(id)?;
        self.mute_all();
        self.element_mut(id)?.set_volume(1.0);
        self.soloing = Some(id.clone());
        Ok(())
    }

    pub fn mute_all(&mut self) {
        for id in &self.sync_ids {
            if let Some(element) = self.elements.get_mut(id) {
                element.set_volume(0.0);
            }
        }
        self.soloing = None;
    }

    /// Sync members loop natively so they stay aligned. Single playback
    /// never does: it relies on the ended notification, see
    /// [`AudioGroup::replay_if_looping`].
    pub fn set_loop_audio(&mut self, looping: bool) {
        self.loop_audio = looping;
        self.apply_native_loop();
    }

    pub fn loop_audio(&self) -> bool {
        self.loop_audio
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn is_idle(&self) -> bool {
        self.playback == Playback::Idle
    }

    pub fn soloing(&self) -> Option<&AudioId> {
        self.soloing.as_ref()
    }

    /// Replays `id` when looping is on and it is still the single playing
    /// element. Returns whether anything was restarted.
    pub fn replay_if_looping(&mut self, id: &AudioId) -> Result<bool> {
        let current = matches!(&self.playback, Playback::Playing(playing) if playing == id);
        if !(self.loop_audio && current) {
            return Ok(false);
        }
        self.play(id)?;
        Ok(true)
    }

    /// Bookkeeping for an element that ran to its end without looping.
    pub fn note_ended(&mut self, id: &AudioId) {
        let finished = match &self.playback {
            Playback::Playing(playing) => playing == id,
            Playback::SyncPlaying(ids) => ids.contains(id),
            Playback::Idle => false,
        };
        if finished {
            self.playback = Playback::Idle;
        }
    }

    pub fn duration(&self, id: &AudioId) -> Result<Option<f64>> {
        Ok(self.element(id)?.duration())
    }

    pub fn position(&self, id: &AudioId) -> Result<f64> {
        Ok(self.element(id)?.current_time())
    }

    /// Progress of `id` in percent, when its duration is known.
    pub fn progress_percent(&self, id: &AudioId) -> Option<f64> {
        let element = self.elements.get(id)?;
        element
            .duration()
            .filter(|d| *d > 0.0)
            .map(|d| element.current_time() / d * 100.0)
    }

    pub fn contains(&self, id: &AudioId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Collects pending notifications from every element.
    pub fn poll_events(&mut self) -> Vec<MediaEvent> {
        let mut events = Vec::new();
        for (id, element) in &mut self.elements {
            for kind in element.drain_events() {
                events.push(MediaEvent {
                    id: id.clone(),
                    kind,
                });
            }
        }
        events
    }

    pub fn dispatch(&mut self, event: MediaEvent, handler: &mut impl AudioEvents<B>) {
        match &event.kind {
            MediaEventKind::TimeUpdate => handler.on_time_update(self, &event.id),
            MediaEventKind::LoadedData => handler.on_loaded_data(self, &event.id),
            MediaEventKind::Error(message) => handler.on_error(self, &event.id, message),
            MediaEventKind::Ended => handler.on_ended(self, &event.id),
        }
    }

    fn apply_native_loop(&mut self) {
        for (id, element) in &mut self.elements {
            element.set_loop(self.loop_audio && self.sync_ids.contains(id));
        }
    }

    fn element(&self, id: &AudioId) -> Result<&B::Element> {
        self.elements
            .get(id)
            .ok_or_else(|| AudioError::UnknownId(id.clone()))
    }

    fn element_mut(&mut self, id: &AudioId) -> Result<&mut B::Element> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| AudioError::UnknownId(id.clone()))
    }
}
