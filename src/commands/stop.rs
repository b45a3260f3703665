use super::{stopped_message, time_or};
use crate::db::db::Db;
use crate::libs::data::{flatten_database, get_latest_interval};
use crate::libs::datetime::Datetime;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_print};
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct StopArgs {
    /// End time instead of now
    #[arg(short, long)]
    pub at: Option<String>,
}

pub fn cmd(args: StopArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args, Utc::now())
}

pub fn run(db: &mut Db, args: StopArgs, now: Datetime) -> Result<()> {
    let end = time_or(args.at.as_deref(), now)?;
    let verbose = db.verbose();
    let Db {
        ref rules,
        ref mut database,
        ref mut journal,
        ..
    } = *db;

    let stopped = journal.transaction(|journal| -> Result<_> {
        flatten_database(database, journal, rules, now, verbose)?;

        let Some(latest) = get_latest_interval(database)?.filter(|i| i.is_open()) else {
            msg_bail_anyhow!(Message::TrackingNothing);
        };
        if latest.start().is_some_and(|start| end <= start) {
            msg_bail_anyhow!(Message::EndBeforeStart);
        }

        let mut closed = latest.clone();
        closed.id = 0;
        closed.range.close(end);
        database.modify_interval(&latest, &closed, journal, verbose)?;
        database.commit()?;
        Ok(closed)
    })?;

    if verbose {
        msg_print!(stopped_message(&stopped, now));
    }
    Ok(())
}
