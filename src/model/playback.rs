use super::*;

/// A single reading of the player taken at the moment a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct Playback {
    /// Current playback position in seconds.
    pub position: f64,
    /// Media duration in seconds, `None` before the metadata has loaded.
    pub duration: Option<f64>,
}

impl Playback {
    /// Whole seconds watched, i.e. the floored position. Unusable positions read as zero.
    pub fn watched_seconds(&self) -> u64 {
        if self.position.is_finite() && self.position > 0.0 {
            self.position.floor() as u64
        } else {
            0
        }
    }

    /// The duration, if the player reported a usable one.
    ///
    /// Players report `NaN` before the metadata arrives and infinity for live streams,
    /// neither of which can anchor a watch ratio.
    pub fn known_duration(&self) -> Option<f64> {
        self.duration.filter(|duration| duration.is_finite() && *duration > 0.0)
    }
}
