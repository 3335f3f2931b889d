use std::sync::Arc;

use rustyline::{history::MemHistory, Editor};
use snafu::{ResultExt, Snafu};

use crate::{
    config::Config,
    model::VideoId,
    service::{HttpReporter, PlaybackSource, SimulatedPlayer},
    session::{self, SessionHandle, WatchSession},
};

mod parse;

const PROMPT: &str = "watch> ";

/// Line editor for the watch commands.
///
/// Output produced between two prompts is queued as notes and printed right above the next
/// prompt, so it never interleaves with what the user is typing.
pub struct Repl {
    editor: Editor<(), MemHistory>,
    notes: Vec<String>,
}

impl Repl {
    pub fn new() -> Result<Self, ReplError> {
        let editor = Editor::with_history(rustyline::Config::default(), MemHistory::new())
            .context(RustylineSnafu)?;

        Ok(Self {
            editor,
            notes: Vec::new(),
        })
    }

    /// Print the queued notes, then read and parse one command.
    ///
    /// End of input or an interrupt reads as [Action::Exit].
    pub async fn read(&mut self) -> Action {
        let prompt = self
            .notes
            .drain(..)
            .map(|note| format!("  {note}\n"))
            .chain(std::iter::once(PROMPT.to_string()))
            .collect::<String>();

        // the session keeps running on the other workers while we wait for input
        let Ok(line) = tokio::task::block_in_place(|| self.editor.readline(&prompt)) else {
            return Action::Exit;
        };

        if line.trim().is_empty() {
            return Action::None;
        }
        self.editor.add_history_entry(line.as_str()).ok();

        parse::parse(&line).unwrap_or_else(|err| {
            self.note(err.to_string());
            Action::None
        })
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Action {
    Open { video_id: VideoId },
    Duration { seconds: Option<f64> },
    Seek { seconds: f64 },
    Play,
    Pause,
    End,
    Credit,
    Status,
    Close,
    Exit,
    None,
}

#[derive(Debug, Snafu)]
pub enum ReplError {
    #[snafu(display("failed to initialize REPL: {}", source))]
    Rustyline {
        source: rustyline::error::ReadlineError,
    },
}

/// The session currently opened from the prompt, with the last status shown to the user.
struct Opened {
    video_id: VideoId,
    handle: SessionHandle,
    shown: String,
}

impl Opened {
    fn new(video_id: VideoId, handle: SessionHandle) -> Self {
        Self {
            video_id,
            handle,
            shown: String::new(),
        }
    }

    fn take_update(&mut self) -> Option<String> {
        let status = self.handle.current_status();
        if status.is_empty() || status == self.shown {
            return None;
        }

        self.shown.clone_from(&status);
        Some(status)
    }
}

pub async fn start(
    repl: &mut Repl, config: &Config, reporter: Arc<HttpReporter>,
) -> Result<(), ReplError> {
    tracing::info!(endpoint = %reporter.endpoint(), "starting REPL");

    let mut player = SimulatedPlayer::new();
    let mut opened: Option<Opened> = None;

    loop {
        if let Some(update) = opened.as_mut().and_then(Opened::take_update) {
            repl.note(update);
        }

        match repl.read().await {
            Action::Exit => break,
            Action::Open { video_id } => {
                close(repl, opened.take()).await;

                player = SimulatedPlayer::new();
                let session = WatchSession::new(
                    video_id.clone(),
                    config.credit_label.clone(),
                    config.eligibility(),
                );
                let handle =
                    session::spawn(session, player.clone(), reporter.clone(), config.timing());

                repl.note(format!("watching `{}`", video_id));
                opened = Some(Opened::new(video_id, handle));
            }
            Action::Duration { seconds } => {
                player.set_duration(seconds);
                match seconds {
                    Some(seconds) => repl.note(format!("duration is {seconds}s")),
                    None => repl.note("duration is unknown"),
                }
            }
            Action::Seek { seconds } => {
                player.seek(seconds);
                repl.note(format!("seeked to {seconds}s"));
            }
            Action::Play => player.play(),
            Action::Pause => player.pause(),
            Action::End => {
                player.finish();
                match &opened {
                    Some(opened) => opened.handle.playback_ended(),
                    None => repl.note("playback ended, but no video is open"),
                }
            }
            Action::Credit => match &opened {
                Some(opened) => opened.handle.attempt(),
                None => repl.note("no video is open"),
            },
            Action::Status => {
                let playback = player.sample();
                let duration = playback
                    .duration
                    .map(|duration| format!("{duration:.1}s"))
                    .unwrap_or_else(|| "unknown".to_string());
                let state = if player.is_playing() {
                    "playing"
                } else {
                    "paused"
                };

                let message = match &opened {
                    Some(opened) => format!(
                        "`{}` {:?}, {} at {:.1}s of {}: {}",
                        opened.video_id,
                        opened.handle.state(),
                        state,
                        playback.position,
                        duration,
                        opened.handle.current_status()
                    ),
                    None => format!(
                        "no video is open, {} at {:.1}s of {}",
                        state, playback.position, duration
                    ),
                };
                repl.note(message);
            }
            Action::Close => close(repl, opened.take()).await,
            _ => continue,
        }
    }

    close(repl, opened.take()).await;

    Ok(())
}

async fn close(repl: &mut Repl, opened: Option<Opened>) {
    let Some(opened) = opened else { return };

    match opened.handle.shutdown().await {
        Some(session) => {
            tracing::info!(video_id = %session.video_id(), state = ?session.state(), "closed watch session");
            repl.note(format!("closed `{}` ({:?})", opened.video_id, session.state()));
        }
        None => {
            tracing::error!(video_id = %opened.video_id, "watch session task did not finish cleanly");
        }
    }
}
