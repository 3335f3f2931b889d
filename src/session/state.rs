use tracing::instrument;

use super::eligibility::{Eligibility, Verdict};
use crate::model::{CreditLabel, Playback, ReportRequest, ReportResponse, VideoId};
use crate::service::ReportError;

pub const REPORT_FAILED: &str = "Error reporting watch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not credited and nothing outstanding.
    #[default]
    Watching,
    /// A report has been sent and its answer is still outstanding.
    ReportPending,
    /// The endpoint accepted the report. Terminal.
    Credited,
}

/// The watch-eligibility state machine of a single video.
///
/// This type does no IO. Triggers hand it a [Playback] sample and get back the request to send, if
/// any; the answer is fed back through [WatchSession::resolve]. See [crate::session::spawn] for the
/// driver that wires it to a player, a timer and a [crate::service::Reporter].
#[derive(Debug, Clone)]
pub struct WatchSession {
    video_id: VideoId,
    credit: CreditLabel,
    eligibility: Eligibility,
    state: SessionState,
    status: String,
    last_seen: Option<Playback>,
}

impl WatchSession {
    pub fn new(video_id: VideoId, credit: CreditLabel, eligibility: Eligibility) -> Self {
        Self {
            video_id,
            credit,
            eligibility,
            state: SessionState::Watching,
            status: String::new(),
            last_seen: None,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        &self.video_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_credited(&self) -> bool {
        self.state == SessionState::Credited
    }

    /// Current human readable status, replaced wholesale on every update.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The most recent sample any trigger observed.
    pub fn last_seen(&self) -> Option<Playback> {
        self.last_seen
    }

    /// The player reached the end of the media.
    ///
    /// An unknown duration is replaced by the fallback duration on this path.
    pub fn on_ended(&mut self, playback: Playback) -> Option<ReportRequest> {
        self.try_credit(playback)
    }

    /// A periodic probe tick.
    ///
    /// Unlike [WatchSession::on_ended] the tick is skipped while the duration is unknown.
    pub fn on_probe(&mut self, playback: Playback) -> Option<ReportRequest> {
        self.last_seen = Some(playback);

        if self.state != SessionState::Watching {
            return None;
        }

        if playback.known_duration().is_none() {
            tracing::debug!(video_id = %self.video_id, "duration is not known yet, skipping probe");
            return None;
        }

        self.try_credit(playback)
    }

    /// Decide whether `playback` earns a credit and, if so, produce the report to send.
    ///
    /// Returns `None` without touching anything once credited or while a report is outstanding.
    /// Otherwise either refreshes the "watch more" status or moves to [SessionState::ReportPending]
    /// and returns the request. The caller must answer with [WatchSession::resolve].
    #[instrument(skip(self), fields(video_id = %self.video_id, state = ?self.state))]
    pub fn try_credit(&mut self, playback: Playback) -> Option<ReportRequest> {
        self.last_seen = Some(playback);

        match self.state {
            SessionState::Credited => return None,
            SessionState::ReportPending => {
                tracing::debug!("a report is already outstanding, ignoring trigger");
                return None;
            }
            SessionState::Watching => {}
        }

        match self.eligibility.check(&playback) {
            Verdict::Ineligible { watched_seconds } => {
                self.status = format!(
                    "Watch at least {}% to get credit. Watched: {}s",
                    self.eligibility.percent(),
                    watched_seconds
                );
                None
            }
            Verdict::Eligible {
                watched_seconds,
                video_duration,
            } => {
                tracing::info!(watched_seconds, video_duration, "watch is eligible, reporting");
                self.state = SessionState::ReportPending;
                Some(ReportRequest::new(
                    self.video_id.clone(),
                    watched_seconds,
                    video_duration,
                ))
            }
        }
    }

    /// Apply the answer to the outstanding report.
    pub fn resolve(&mut self, outcome: Result<ReportResponse, ReportError>) {
        if self.state != SessionState::ReportPending {
            tracing::warn!(video_id = %self.video_id, state = ?self.state, "received a report outcome with no report outstanding");
        }

        match outcome {
            Ok(response) if response.is_accepted() => {
                tracing::info!(video_id = %self.video_id, status = %response.status, "video credited");
                self.state = SessionState::Credited;
                self.status = format!("Credited: ${}", self.credit);
            }
            Ok(response) => {
                tracing::warn!(video_id = %self.video_id, status = %response.status, message = ?response.message, "report was not credited");
                self.state = SessionState::Watching;
                self.status = format!("Not credited: {}", response.reason());
            }
            Err(error) => {
                tracing::error!(video_id = %self.video_id, %error, "could not report watch");
                self.state = SessionState::Watching;
                self.status = REPORT_FAILED.to_string();
            }
        }
    }
}
