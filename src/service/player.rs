use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use crate::model::Playback;

/// Where a session reads the current position and duration from.
pub trait PlaybackSource: Send + Sync + 'static {
    fn sample(&self) -> Playback;
}

impl<T: PlaybackSource> PlaybackSource for Arc<T> {
    fn sample(&self) -> Playback {
        (**self).sample()
    }
}

/// An in-memory player whose clock advances with real time while playing.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<PlayerState>>,
}

#[derive(Debug, Default)]
struct PlayerState {
    position: f64,
    duration: Option<f64>,
    playing_since: Option<Instant>,
}

impl PlayerState {
    fn position(&self) -> f64 {
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or_default();

        let position = self.position + elapsed;

        match self.duration {
            Some(duration) if duration.is_finite() && duration > 0.0 => position.min(duration),
            _ => position,
        }
    }

    /// Fold the time played so far into `position`.
    fn settle(&mut self) {
        self.position = self.position();
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn play(&self) {
        let mut state = self.state();
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
    }

    pub fn pause(&self) {
        let mut state = self.state();
        state.settle();
        state.playing_since = None;
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing_since.is_some()
    }

    pub fn seek(&self, position: f64) {
        let mut state = self.state();
        state.settle();
        state.position = position;
    }

    /// Set the duration reported by the media metadata, `None` while it is still loading.
    pub fn set_duration(&self, duration: Option<f64>) {
        let mut state = self.state();
        state.settle();
        state.duration = duration;
    }

    /// Jump to the end of the media and stop playing.
    pub fn finish(&self) {
        let mut state = self.state();
        state.settle();
        state.playing_since = None;

        if let Some(duration) = state.duration.filter(|duration| duration.is_finite()) {
            state.position = state.position.max(duration);
        }
    }
}

impl PlaybackSource for SimulatedPlayer {
    fn sample(&self) -> Playback {
        let state = self.state();
        Playback::new(state.position(), state.duration)
    }
}
