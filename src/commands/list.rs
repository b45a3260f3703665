use super::time_or;
use crate::db::db::Db;
use crate::libs::data::get_intervals_by_filter;
use crate::libs::datetime::Datetime;
use crate::libs::filter::IntervalFilter;
use crate::libs::messages::Message;
use crate::libs::range::Range;
use crate::libs::view::View;
use crate::msg_info;
use anyhow::Result;
use chrono::Utc;
use clap::Args;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only intervals touching this time or later
    #[arg(long)]
    pub from: Option<String>,
    /// Only intervals touching time before this
    #[arg(long)]
    pub to: Option<String>,
    /// Required tags; `-tag` excludes a tag and a literal OR accepts any
    pub tags: Vec<String>,
}

pub fn cmd(args: ListArgs) -> Result<()> {
    let mut db = Db::new()?;
    run(&mut db, args, Utc::now())
}

pub fn run(db: &mut Db, args: ListArgs, now: Datetime) -> Result<()> {
    let range = Range {
        start: args.from.as_deref().map(|from| time_or(Some(from), now)).transpose()?,
        end: args.to.as_deref().map(|to| time_or(Some(to), now)).transpose()?,
    };

    let mut filters = vec![IntervalFilter::all_in_range(range)];
    if !args.tags.is_empty() {
        let complex = args.tags.iter().any(|tag| tag == "OR" || tag.starts_with('-'));
        filters.push(if complex {
            IntervalFilter::all_with_tags_complex(args.tags)
        } else {
            IntervalFilter::all_with_tags(args.tags)
        });
    }
    let mut filter = IntervalFilter::and_group(filters);

    let intervals = get_intervals_by_filter(&mut db.database, &db.rules, &mut filter, now)?;
    if intervals.is_empty() {
        msg_info!(Message::NoIntervalsFound);
        return Ok(());
    }

    View::intervals(&intervals, now);
    Ok(())
}
