//! Host media capability. Decoding and output live behind these traits.

use auditest_core::AudioId;

/// Lifecycle notifications an element can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    TimeUpdate,
    LoadedData,
    /// Unreadable or missing source; the text is passed on verbatim.
    Error(String),
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub id: AudioId,
    pub kind: MediaEventKind,
}

/// A single playable element, in the shape of an HTML media element.
pub trait MediaElement {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;

    /// Seconds from the start.
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    /// Unknown until the source has loaded.
    fn duration(&self) -> Option<f64>;

    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn set_loop(&mut self, looping: bool);

    /// Notifications raised since the last call, oldest first.
    fn drain_events(&mut self) -> Vec<MediaEventKind>;
}

pub trait MediaBackend {
    type Element: MediaElement;

    /// Starts loading `path`. Load completion or failure is reported later
    /// through the element's events.
    fn open(&mut self, id: &AudioId, path: &str) -> Self::Element;
}
