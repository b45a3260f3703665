use super::{resolve_targets, split_ids};
use crate::db::db::Db;
use crate::libs::data::flatten_database;
use crate::libs::datetime::Datetime;
use crate::libs::messages::Message;
use crate::msg_success;
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Interval ids (@1 @2) followed by the annotation; an empty annotation
    /// clears it
    pub tokens: Vec<String>,
}

pub fn cmd(args: AnnotateArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args, Utc::now())
}

pub fn run(db: &mut Db, args: AnnotateArgs, now: Datetime) -> Result<()> {
    let (ids, words) = split_ids(&args.tokens)?;
    let annotation = words.join(" ");

    let verbose = db.verbose();
    let Db {
        ref rules,
        ref mut database,
        ref mut journal,
        ..
    } = *db;

    let count = journal.transaction(|journal| -> Result<usize> {
        flatten_database(database, journal, rules, now, verbose)?;
        let intervals = resolve_targets(database, rules, &ids, now)?;
        for interval in &intervals {
            if interval.annotation != annotation {
                let mut annotated = interval.clone();
                annotated.annotation = annotation.clone();
                database.modify_interval(interval, &annotated, journal, verbose)?;
            }
        }
        database.commit()?;
        Ok(intervals.len())
    })?;

    if verbose {
        msg_success!(Message::IntervalsAnnotated(count));
    }
    Ok(())
}
