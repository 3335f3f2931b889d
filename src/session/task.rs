use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use futures::future::{BoxFuture, FutureExt, OptionFuture};
use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{instrument, Instrument, Span};

use super::state::{SessionState, WatchSession};
use crate::model::{ReportRequest, ReportResponse};
use crate::service::{PlaybackSource, ReportError, Reporter, TimedOutSnafu};

/// How often the probe samples the player while the session is not yet credited.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// How long a report may stay outstanding before it counts as failed.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Timing {
    pub probe_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_INTERVAL, DEFAULT_REQUEST_TIMEOUT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ended,
    Attempt,
}

#[derive(Debug, Clone, Copy)]
struct Quit;

type Outcome = Result<ReportResponse, ReportError>;

/// Owner of a running session.
///
/// Dropping the handle, or calling [SessionHandle::shutdown], stops the probe and releases the
/// player. The session also stops on its own once it has been credited.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<String>,
    state: watch::Receiver<SessionState>,
    quit: oneshot::Sender<Quit>,
    task: JoinHandle<WatchSession>,
}

impl SessionHandle {
    /// Deliver the player's "ended" event.
    pub fn playback_ended(&self) {
        let _ = self.commands.send(Command::Ended);
    }

    /// Ask for a credit right now, with the same rules as the "ended" event.
    pub fn attempt(&self) {
        let _ = self.commands.send(Command::Attempt);
    }

    /// Subscribe to status updates.
    pub fn status(&self) -> watch::Receiver<String> {
        self.status.clone()
    }

    pub fn current_status(&self) -> String {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Whether the session has stopped, either because it was credited or it was shut down.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the session and return its final state.
    ///
    /// A report still outstanding is abandoned.
    pub async fn shutdown(self) -> Option<WatchSession> {
        let _ = self.quit.send(Quit);
        self.task.await.ok()
    }
}

/// Start driving `session` on the current tokio runtime.
#[instrument(name = "watch_session", skip_all, fields(video_id = %session.video_id()))]
pub fn spawn<P, R>(session: WatchSession, source: P, reporter: Arc<R>, timing: Timing) -> SessionHandle
where
    P: PlaybackSource,
    R: Reporter,
{
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (status_tx, status) = watch::channel(session.status().to_string());
    let (state_tx, state) = watch::channel(session.state());
    let (quit, quit_rx) = oneshot::channel();

    tracing::info!(
        "start watch session for video `{}`, probing every {}",
        session.video_id(),
        humantime::format_duration(timing.probe_interval)
    );

    let driver = Driver {
        session,
        source,
        reporter,
        timing,
        status: status_tx,
        state: state_tx,
    };
    // events from the driver stay inside the session span
    let task = tokio::spawn(driver.run(command_rx, quit_rx).instrument(Span::current()));

    SessionHandle {
        commands,
        status,
        state,
        quit,
        task,
    }
}

struct Driver<P, R> {
    session: WatchSession,
    source: P,
    reporter: Arc<R>,
    timing: Timing,
    status: watch::Sender<String>,
    state: watch::Sender<SessionState>,
}

impl<P, R> Driver<P, R>
where
    P: PlaybackSource,
    R: Reporter,
{
    async fn run(
        mut self, mut commands: mpsc::UnboundedReceiver<Command>, mut quit: oneshot::Receiver<Quit>,
    ) -> WatchSession {
        let mut probe = probe_interval(self.timing.probe_interval);
        let mut outstanding: Option<BoxFuture<'static, Outcome>> = None;

        loop {
            select! {
                _ = &mut quit => {
                    tracing::info!(video_id = %self.session.video_id(), "watch session closed");
                    break;
                }

                Some(outcome) = OptionFuture::from(outstanding.as_mut()), if outstanding.is_some() => {
                    outstanding = None;
                    self.session.resolve(outcome);
                    self.publish();

                    if self.session.is_credited() {
                        tracing::info!(video_id = %self.session.video_id(), "session credited, stopping probe");
                        break;
                    }
                }

                Some(command) = commands.recv() => {
                    let playback = self.source.sample();
                    tracing::debug!(?command, ?playback, "received session command");

                    let request = match command {
                        Command::Ended => self.session.on_ended(playback),
                        Command::Attempt => self.session.try_credit(playback),
                    };

                    if let Some(request) = request {
                        outstanding = Some(self.dispatch(request));
                    }
                    self.publish();
                }

                _ = probe.tick() => {
                    let playback = self.source.sample();
                    tracing::debug!(?playback, "probe ticked");

                    if let Some(request) = self.session.on_probe(playback) {
                        outstanding = Some(self.dispatch(request));
                    }
                    self.publish();
                }
            }
        }

        self.session
    }

    fn dispatch(&self, request: ReportRequest) -> BoxFuture<'static, Outcome> {
        let reporter = self.reporter.clone();
        let timeout = self.timing.request_timeout;

        async move {
            match tokio::time::timeout(timeout, reporter.report(&request)).await {
                Ok(outcome) => outcome,
                Err(_) => TimedOutSnafu { timeout }.fail(),
            }
        }
        .boxed()
    }

    fn publish(&self) {
        let status = self.session.status();
        self.status.send_if_modified(|current| {
            if current.as_str() == status {
                return false;
            }
            status.clone_into(current);
            true
        });
        self.state.send_if_modified(|current| {
            let changed = *current != self.session.state();
            *current = self.session.state();
            changed
        });
    }
}

/// Ticks every `period`, starting one period from now.
fn probe_interval(period: Duration) -> Interval {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}
