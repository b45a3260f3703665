use super::{resolve_targets, split_ids};
use crate::db::db::Db;
use crate::libs::data::flatten_database;
use crate::libs::datetime::Datetime;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_info, msg_success};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Interval ids, such as @1 @3
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

pub fn cmd(args: DeleteArgs) -> Result<()> {
    let mut db = Db::new()?;
    let (ids, _) = split_ids(&args.ids)?;

    if db.confirmation() && !args.force {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteIntervals(ids.len()).to_string())
            .default(false)
            .interact()?;
        if !confirmed {
            msg_info!(Message::OperationCancelled);
            return Ok(());
        }
    }

    run(&mut db, &ids, Utc::now())
}

pub fn run(db: &mut Db, ids: &[usize], now: Datetime) -> Result<()> {
    if ids.is_empty() {
        msg_bail_anyhow!(Message::NoIdsProvided);
    }

    let verbose = db.verbose();
    let Db {
        ref rules,
        ref mut database,
        ref mut journal,
        ..
    } = *db;

    let deleted = journal.transaction(|journal| -> Result<usize> {
        flatten_database(database, journal, rules, now, verbose)?;
        let intervals = resolve_targets(database, rules, ids, now)?;
        for interval in &intervals {
            database.delete_interval(interval, journal)?;
        }
        database.commit()?;
        Ok(intervals.len())
    })?;

    if verbose {
        msg_success!(Message::IntervalsDeleted(deleted));
    }
    Ok(())
}
