pub mod annotate;
pub mod config;
pub mod delete;
pub mod list;
pub mod start;
pub mod stop;
pub mod tag;
pub mod tags;
pub mod track;
pub mod undo;
pub mod untag;

use crate::db::database::Database;
use crate::libs::config::Rules;
use crate::libs::data::{get_intervals_by_filter, get_latest_interval};
use crate::libs::datetime::{parse_input, Datetime};
use crate::libs::filter::IntervalFilter;
use crate::libs::formatter::{format_datetime, format_duration, format_tags};
use crate::libs::interval::Interval;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_error_anyhow};
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Start tracking, stopping any open interval")]
    Start(start::StartArgs),
    #[command(about = "Stop the open interval")]
    Stop(stop::StopArgs),
    #[command(about = "Record a closed interval", arg_required_else_help = true)]
    Track(track::TrackArgs),
    #[command(about = "Delete intervals by id", arg_required_else_help = true)]
    Delete(delete::DeleteArgs),
    #[command(about = "Add tags to intervals")]
    Tag(tag::TagArgs),
    #[command(about = "Remove tags from intervals")]
    Untag(untag::UntagArgs),
    #[command(about = "Set the annotation of intervals")]
    Annotate(annotate::AnnotateArgs),
    #[command(about = "List tracked intervals")]
    List(list::ListArgs),
    #[command(about = "List tags and their usage")]
    Tags,
    #[command(about = "Revert the last change")]
    Undo,
    #[command(about = "Show or change settings")]
    Config(config::ConfigArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Start(args) => start::cmd(args),
            Commands::Stop(args) => stop::cmd(args),
            Commands::Track(args) => track::cmd(args),
            Commands::Delete(args) => delete::cmd(args),
            Commands::Tag(args) => tag::cmd(args),
            Commands::Untag(args) => untag::cmd(args),
            Commands::Annotate(args) => annotate::cmd(args),
            Commands::List(args) => list::cmd(args),
            Commands::Tags => tags::cmd(),
            Commands::Undo => undo::cmd(),
            Commands::Config(args) => config::cmd(args),
        }
    }
}

/// Parses an optional user supplied time, defaulting to `now`.
pub(crate) fn time_or(value: Option<&str>, now: Datetime) -> Result<Datetime> {
    match value {
        Some(value) => parse_input(value).map_err(|_| msg_error_anyhow!(Message::InvalidDate(value.to_string()))),
        None => Ok(now),
    }
}

/// Splits `@<id>` tokens from the remaining words.
pub(crate) fn split_ids(tokens: &[String]) -> Result<(Vec<usize>, Vec<String>)> {
    let mut ids = Vec::new();
    let mut words = Vec::new();
    for token in tokens {
        match token.strip_prefix('@') {
            Some(id) => {
                let id = id.parse::<usize>().ok().filter(|id| *id > 0);
                ids.push(id.ok_or_else(|| msg_error_anyhow!(Message::NoIdsProvided))?);
            }
            None => words.push(token.clone()),
        }
    }
    Ok((ids, words))
}

/// The stored intervals behind `ids`, or the open interval when no ids are
/// given.
pub(crate) fn resolve_targets(database: &mut Database, rules: &Rules, ids: &[usize], now: Datetime) -> Result<Vec<Interval>> {
    if ids.is_empty() {
        return match get_latest_interval(database)? {
            Some(latest) if latest.is_open() => Ok(vec![latest]),
            _ => Err(msg_error_anyhow!(Message::NoIdsProvided)),
        };
    }

    let mut filter = IntervalFilter::all_with_ids(ids.iter().copied());
    let found = get_intervals_by_filter(database, rules, &mut filter, now)?;
    for id in ids {
        if !found.iter().any(|interval| interval.id == *id) {
            msg_bail_anyhow!(Message::IdNotFound(*id));
        }
    }
    Ok(found)
}

pub(crate) fn started_message(interval: &Interval) -> Message {
    Message::TrackingStarted {
        tags: format_tags(interval.tags()),
        start: interval.start().as_ref().map(format_datetime).unwrap_or_default(),
    }
}

pub(crate) fn stopped_message(interval: &Interval, now: Datetime) -> Message {
    Message::TrackingStopped {
        tags: format_tags(interval.tags()),
        start: interval.start().as_ref().map(format_datetime).unwrap_or_default(),
        end: interval.end().as_ref().map(format_datetime).unwrap_or_default(),
        total: format_duration(&interval.range.total(now)),
    }
}
