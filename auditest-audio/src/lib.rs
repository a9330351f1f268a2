pub mod group;
pub mod media;
pub mod memory;

pub use group::{AudioError, AudioEvents, AudioGroup, DefaultEvents, Playback};
pub use media::{MediaBackend, MediaElement, MediaEvent, MediaEventKind};
pub use memory::{ElementHandle, MemoryMedia};
