use crate::db::db::Db;
use crate::libs::data::{flatten, get_overlapping};
use crate::libs::datetime::{parse_input, Datetime};
use crate::libs::exclusion::get_all_exclusions;
use crate::libs::formatter::{format_datetime, format_tags};
use crate::libs::interval::Interval;
use crate::libs::messages::Message;
use crate::libs::range::Range;
use crate::{msg_bail_anyhow, msg_error_anyhow, msg_success};
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Start of the interval
    pub start: String,
    /// End of the interval
    pub end: String,
    /// Tags for the interval
    pub tags: Vec<String>,
    /// Annotation for the interval
    #[arg(short, long)]
    pub annotation: Option<String>,
}

pub fn cmd(args: TrackArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args, Utc::now())
}

/// Records a closed interval, leaving out excluded time inside it.
pub fn run(db: &mut Db, args: TrackArgs, now: Datetime) -> Result<()> {
    let start = parse_input(&args.start).map_err(|_| msg_error_anyhow!(Message::InvalidDate(args.start.clone())))?;
    let end = parse_input(&args.end).map_err(|_| msg_error_anyhow!(Message::InvalidDate(args.end.clone())))?;
    if end <= start {
        msg_bail_anyhow!(Message::EndBeforeStart);
    }

    let verbose = db.verbose();
    let Db {
        ref rules,
        ref mut database,
        ref mut journal,
        ..
    } = *db;

    let mut interval = Interval::with_tags(Range::new(start, end), args.tags);
    interval.annotation = args.annotation.unwrap_or_default();

    journal.transaction(|journal| -> Result<()> {
        let overlapping = get_overlapping(database, &interval.range)?;
        if !overlapping.is_empty() {
            msg_bail_anyhow!(Message::IntervalOverlaps(overlapping.len()));
        }

        let exclusions = get_all_exclusions(rules, &interval.range)?;
        for piece in flatten(&interval, &exclusions, now) {
            database.add_interval(&piece, journal, verbose)?;
        }
        database.commit()?;
        Ok(())
    })?;

    if verbose {
        msg_success!(Message::IntervalRecorded {
            tags: format_tags(interval.tags()),
            start: format_datetime(&start),
            end: format_datetime(&end),
        });
    }
    Ok(())
}
