use super::{started_message, stopped_message, time_or};
use crate::db::db::Db;
use crate::libs::data::{flatten_database, get_latest_interval, get_overlapping};
use crate::libs::datetime::Datetime;
use crate::libs::interval::Interval;
use crate::libs::messages::Message;
use crate::libs::range::Range;
use crate::{msg_bail_anyhow, msg_print};
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct StartArgs {
    /// Tags for the new interval
    pub tags: Vec<String>,
    /// Start time instead of now
    #[arg(short, long)]
    pub at: Option<String>,
}

pub fn cmd(args: StartArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args, Utc::now())
}

pub fn run(db: &mut Db, args: StartArgs, now: Datetime) -> Result<()> {
    let start = time_or(args.at.as_deref(), now)?;
    let verbose = db.verbose();
    let Db {
        ref rules,
        ref mut database,
        ref mut journal,
        ..
    } = *db;

    let (stopped, started) = journal.transaction(|journal| -> Result<(Option<Interval>, Interval)> {
        flatten_database(database, journal, rules, now, verbose)?;

        let mut stopped = None;
        if let Some(latest) = get_latest_interval(database)?.filter(Interval::is_open) {
            if latest.start().is_some_and(|s| start <= s) {
                msg_bail_anyhow!(Message::EndBeforeStart);
            }
            let mut closed = latest.clone();
            closed.id = 0;
            closed.range.close(start);
            database.modify_interval(&latest, &closed, journal, verbose)?;
            stopped = Some(closed);
        }

        let overlapping = get_overlapping(database, &Range::open_from(start))?;
        if !overlapping.is_empty() {
            msg_bail_anyhow!(Message::IntervalOverlaps(overlapping.len()));
        }

        let started = Interval::with_tags(Range::open_from(start), args.tags);
        database.add_interval(&started, journal, verbose)?;
        database.commit()?;
        Ok((stopped, started))
    })?;

    if verbose {
        if let Some(stopped) = stopped {
            msg_print!(stopped_message(&stopped, now));
        }
        msg_print!(started_message(&started));
    }
    Ok(())
}
