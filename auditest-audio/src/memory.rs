//! Scripted, in-process media backend.
//!
//! Nothing loads or finishes on its own: callers drive each element through
//! an [`ElementHandle`] (`load`, `tick`, `finish`, `fail`). Used by tests and
//! for dry runs of a configuration.

use crate::media::{MediaBackend, MediaElement, MediaEventKind};
use auditest_core::AudioId;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

#[derive(Debug)]
struct ElementState {
    path: String,
    playing: bool,
    position: f64,
    duration: Option<f64>,
    volume: f32,
    looping: bool,
    play_count: usize,
    events: Vec<MediaEventKind>,
}

#[derive(Debug, Default)]
struct Registry {
    durations: HashMap<String, f64>,
    failures: HashMap<String, String>,
    elements: BTreeMap<AudioId, Rc<RefCell<ElementState>>>,
}

/// Clones share one registry, so a test can keep a copy after handing the
/// backend to an audio group.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedia {
    registry: Rc<RefCell<Registry>>,
}

impl MemoryMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration reported by elements opened on `path` afterwards.
    pub fn set_duration(&self, path: &str, seconds: f64) {
        self.registry
            .borrow_mut()
            .durations
            .insert(path.to_string(), seconds);
    }

    /// Elements opened on `path` afterwards raise an error immediately.
    pub fn set_failure(&self, path: &str, message: &str) {
        self.registry
            .borrow_mut()
            .failures
            .insert(path.to_string(), message.to_string());
    }

    pub fn handle(&self, id: &AudioId) -> Option<ElementHandle> {
        self.registry
            .borrow()
            .elements
            .get(id)
            .map(|state| ElementHandle {
                state: Rc::clone(state),
            })
    }

    /// Raises the loaded notification on every element opened so far.
    pub fn load_all(&self) {
        for state in self.registry.borrow().elements.values() {
            state.borrow_mut().events.push(MediaEventKind::LoadedData);
        }
    }

    pub fn ids(&self) -> Vec<AudioId> {
        self.registry.borrow().elements.keys().cloned().collect()
    }

    pub fn playing_ids(&self) -> Vec<AudioId> {
        self.registry
            .borrow()
            .elements
            .iter()
            .filter(|(_, state)| state.borrow().playing)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl MediaBackend for MemoryMedia {
    type Element = MemoryElement;

    fn open(&mut self, id: &AudioId, path: &str) -> MemoryElement {
        let mut registry = self.registry.borrow_mut();
        let mut events = Vec::new();
        if let Some(message) = registry.failures.get(path) {
            events.push(MediaEventKind::Error(message.clone()));
        }

        let state = Rc::new(RefCell::new(ElementState {
            path: path.to_string(),
            playing: false,
            position: 0.0,
            duration: registry.durations.get(path).copied(),
            volume: 1.0,
            looping: false,
            play_count: 0,
            events,
        }));
        registry.elements.insert(id.clone(), Rc::clone(&state));
        MemoryElement { state }
    }
}

#[derive(Debug)]
pub struct MemoryElement {
    state: Rc<RefCell<ElementState>>,
}

impl MediaElement for MemoryElement {
    fn play(&mut self) {
        let mut state = self.state.borrow_mut();
        state.playing = true;
        state.play_count += 1;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().playing = false;
    }

    fn is_paused(&self) -> bool {
        !self.state.borrow().playing
    }

    fn current_time(&self) -> f64 {
        self.state.borrow().position
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.state.borrow_mut().position = seconds;
    }

    fn duration(&self) -> Option<f64> {
        self.state.borrow().duration
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn set_loop(&mut self, looping: bool) {
        self.state.borrow_mut().looping = looping;
    }

    fn drain_events(&mut self) -> Vec<MediaEventKind> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}

/// Test-side view of one element.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    state: Rc<RefCell<ElementState>>,
}

impl ElementHandle {
    pub fn path(&self) -> String {
        self.state.borrow().path.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn is_looping(&self) -> bool {
        self.state.borrow().looping
    }

    pub fn position(&self) -> f64 {
        self.state.borrow().position
    }

    pub fn set_position(&self, seconds: f64) {
        self.state.borrow_mut().position = seconds;
    }

    pub fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    pub fn play_count(&self) -> usize {
        self.state.borrow().play_count
    }

    pub fn load(&self) {
        self.state.borrow_mut().events.push(MediaEventKind::LoadedData);
    }

    /// Moves the transport to `seconds` and raises a time update.
    pub fn tick(&self, seconds: f64) {
        let mut state = self.state.borrow_mut();
        state.position = seconds;
        state.events.push(MediaEventKind::TimeUpdate);
    }

    /// Runs the element to its end. A looping element wraps to zero and
    /// keeps playing without notification; anything else stops and raises
    /// the ended notification.
    pub fn finish(&self) {
        let mut state = self.state.borrow_mut();
        if state.looping {
            state.position = 0.0;
            return;
        }
        state.playing = false;
        if let Some(duration) = state.duration {
            state.position = duration;
        }
        state.events.push(MediaEventKind::Ended);
    }

    pub fn fail(&self, message: &str) {
        self.state
            .borrow_mut()
            .events
            .push(MediaEventKind::Error(message.to_string()));
    }
}
