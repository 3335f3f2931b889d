use super::*;
use chumsky::{error::SimpleReason, prelude::*, text::whitespace};
use itertools::Itertools;

use crate::model::{ParseVideoId, VideoId};

/// A command line the grammar rejected, with every position it gave up at.
#[derive(Debug, Snafu)]
#[snafu(display("could not read `{input}`: {}", self.describe()))]
pub struct ParseError {
    input: String,
    errors: Vec<Simple<char>>,
}

impl ParseError {
    fn describe(&self) -> String {
        self.errors
            .iter()
            .map(|err| {
                let column = err.span().start + 1;
                match err.reason() {
                    SimpleReason::Custom(msg) => format!("{msg} at column {column}"),
                    _ => match err.found() {
                        Some(found) => format!("unexpected '{found}' at column {column}"),
                        None => format!("command ends early at column {column}"),
                    },
                }
            })
            .join("; ")
    }
}

pub fn parse(input: &str) -> Result<Action, ParseError> {
    program().parse(input).map_err(|errors| ParseError {
        input: input.to_string(),
        errors,
    })
}

fn program() -> impl Parser<char, Action, Error = Simple<char>> {
    choice((
        action_open(),
        action_duration(),
        action_seek(),
        just("play").to(Action::Play),
        just("pause").to(Action::Pause),
        just("end").to(Action::End),
        just("credit").to(Action::Credit),
        just("status").to(Action::Status),
        just("close").to(Action::Close),
        choice((just("exit"), just("quit"))).to(Action::Exit),
    ))
    .padded()
    .then_ignore(end())
}

fn action_open() -> impl Parser<char, Action, Error = Simple<char>> {
    just("open")
        .then_ignore(whitespace().at_least(1))
        .ignore_then(video_id())
        .map(|video_id| Action::Open { video_id })
}

fn action_duration() -> impl Parser<char, Action, Error = Simple<char>> {
    just("duration")
        .then_ignore(whitespace().at_least(1))
        .ignore_then(just("unknown").to(None).or(seconds().map(Some)))
        .map(|seconds| Action::Duration { seconds })
}

fn action_seek() -> impl Parser<char, Action, Error = Simple<char>> {
    just("seek")
        .then_ignore(whitespace().at_least(1))
        .ignore_then(seconds())
        .map(|seconds| Action::Seek { seconds })
}

fn video_id() -> impl Parser<char, VideoId, Error = Simple<char>> {
    filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .try_map(|chars, span| {
            chars
                .into_iter()
                .collect::<String>()
                .parse()
                .map_err(|err: ParseVideoId| Simple::custom(span, err.to_string()))
        })
}

/// A number of seconds such as `80`, `79.5` or `80s`.
fn seconds() -> impl Parser<char, f64, Error = Simple<char>> {
    filter(|c: &char| c.is_ascii_digit() || *c == '.')
        .repeated()
        .at_least(1)
        .try_map(|chars, span| {
            chars
                .into_iter()
                .collect::<String>()
                .parse::<f64>()
                .map_err(|_| Simple::custom(span, "invalid number of seconds"))
        })
        .then_ignore(just('s').or_not())
}
