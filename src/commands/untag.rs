use super::{resolve_targets, split_ids};
use crate::db::db::Db;
use crate::libs::data::flatten_database;
use crate::libs::datetime::Datetime;
use crate::libs::formatter::format_tags;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_success};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use std::collections::BTreeSet;

#[derive(Debug, Args)]
pub struct UntagArgs {
    /// Interval ids (@1 @2) followed by the tags to remove
    #[arg(required = true)]
    pub tokens: Vec<String>,
}

pub fn cmd(args: UntagArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args, Utc::now())
}

pub fn run(db: &mut Db, args: UntagArgs, now: Datetime) -> Result<()> {
    let (ids, tags) = split_ids(&args.tokens)?;
    if tags.is_empty() {
        msg_bail_anyhow!(Message::NoTagsProvided);
    }

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
            let mut untagged = interval.clone();
            for tag in &tags {
                untagged.untag(tag);
            }
            if untagged.serialize() != interval.serialize() {
                database.modify_interval(interval, &untagged, journal, verbose)?;
            }
        }
        database.commit()?;
        Ok(intervals.len())
    })?;

    if verbose {
        let tags: BTreeSet<String> = tags.into_iter().collect();
        msg_success!(Message::IntervalsUntagged {
            count,
            tags: format_tags(&tags),
        });
    }
    Ok(())
}
