use derive_new::new;

use crate::model::Playback;

/// Fraction of the media that must be watched before a credit is requested.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Duration assumed by the completion path when the player never reported one.
pub const DEFAULT_FALLBACK_DURATION: f64 = 30.0;

/// Outcome of checking a [Playback] sample against the watch threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Eligible {
        watched_seconds: u64,
        video_duration: u64,
    },
    Ineligible {
        watched_seconds: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct Eligibility {
    threshold: f64,
    fallback_duration: f64,
}

impl Default for Eligibility {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_FALLBACK_DURATION)
    }
}

impl Eligibility {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Threshold as a whole percentage, for status text.
    pub fn percent(&self) -> u32 {
        (self.threshold * 100.0).round() as u32
    }

    pub fn effective_duration(&self, playback: &Playback) -> f64 {
        playback.known_duration().unwrap_or(self.fallback_duration)
    }

    /// `floor(position) >= threshold * effective duration`.
    pub fn check(&self, playback: &Playback) -> Verdict {
        let watched_seconds = playback.watched_seconds();
        let duration = self.effective_duration(playback);

        if watched_seconds as f64 >= self.threshold * duration {
            Verdict::Eligible {
                watched_seconds,
                video_duration: duration.floor() as u64,
            }
        } else {
            Verdict::Ineligible { watched_seconds }
        }
    }
}
