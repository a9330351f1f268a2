//! Silent media backend for the console host.
//!
//! Elements read their duration from the WAV header and then simply let the
//! clock run: nothing is decoded or sent to an output device. Missing or
//! unreadable files report a media error instead of loading.

use auditest_audio::{MediaBackend, MediaElement, MediaEventKind};
use auditest_core::AudioId;
use auditest_timing::Timer;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ClockMedia<T: Timer> {
    root: PathBuf,
    timer: T,
}

impl<T: Timer> ClockMedia<T> {
    /// Relative paths from the configuration resolve against `root`.
    pub fn new(root: impl Into<PathBuf>, timer: T) -> Self {
        Self {
            root: root.into(),
            timer,
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

/// Length of a WAV file in seconds.
pub fn wav_duration(path: &Path) -> Result<f64, hound::Error> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    Ok(f64::from(reader.duration()) / f64::from(spec.sample_rate))
}

impl<T: Timer> MediaBackend for ClockMedia<T> {
    type Element = ClockElement<T>;

    fn open(&mut self, id: &AudioId, path: &str) -> ClockElement<T> {
        let resolved = self.resolve(path);
        let (duration, event) = match wav_duration(&resolved) {
            Ok(seconds) => {
                debug!("{} is {:.2}s ({})", id, seconds, resolved.display());
                (Some(seconds), MediaEventKind::LoadedData)
            }
            Err(e) => (
                None,
                MediaEventKind::Error(format!("Could not load {}: {}", path, e)),
            ),
        };

        ClockElement {
            timer: self.timer.clone(),
            started: None,
            offset: 0.0,
            duration,
            volume: 1.0,
            looping: false,
            events: vec![event],
        }
    }
}

pub struct ClockElement<T: Timer> {
    timer: T,
    /// Set while playing.
    started: Option<T::Timestamp>,
    /// Position when `started` was taken, or the paused position.
    offset: f64,
    duration: Option<f64>,
    volume: f32,
    looping: bool,
    events: Vec<MediaEventKind>,
}

impl<T: Timer> ClockElement<T> {
    fn running_position(&self) -> f64 {
        match self.started {
            Some(ts) => self.offset + self.timer.elapsed(ts).as_secs_f64(),
            None => self.offset,
        }
    }

    /// Applies the end of the source: wraps when looping, stops otherwise.
    fn check_end(&mut self) {
        let (Some(duration), Some(_)) = (self.duration, self.started) else {
            return;
        };
        let position = self.running_position();
        if position < duration {
            return;
        }

        if self.looping && duration > 0.0 {
            self.offset = position % duration;
            self.started = Some(self.timer.now());
        } else {
            self.started = None;
            self.offset = duration;
            self.events.push(MediaEventKind::Ended);
        }
    }
}

impl<T: Timer> MediaElement for ClockElement<T> {
    fn play(&mut self) {
        if self.started.is_none() {
            if self.duration.is_some_and(|d| self.offset >= d) {
                self.offset = 0.0;
            }
            self.started = Some(self.timer.now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.current_time();
        self.started = None;
    }

    fn is_paused(&self) -> bool {
        self.started.is_none()
    }

    fn current_time(&self) -> f64 {
        let position = self.running_position();
        match self.duration {
            Some(d) if self.looping && d > 0.0 => position % d,
            Some(d) => position.min(d),
            None => position,
        }
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.offset = seconds.max(0.0);
        if self.started.is_some() {
            self.started = Some(self.timer.now());
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn drain_events(&mut self) -> Vec<MediaEventKind> {
        if self.started.is_some() {
            self.events.push(MediaEventKind::TimeUpdate);
        }
        self.check_end();
        std::mem::take(&mut self.events)
    }
}
