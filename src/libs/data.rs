//! Queries over the store that combine stored intervals with exclusions.
//!
//! Ids are not stored. [`get_intervals_by_filter`] assigns them while walking
//! the store newest first, so id 1 is always the latest interval. When the
//! latest interval is still open and exclusions fall inside it, it is listed
//! as several synthetic pieces, each with its own id.

use crate::db::database::Database;
use crate::db::journal::Journal;
use crate::libs::config::RulesProvider;
use crate::libs::datetime::Datetime;
use crate::libs::error::AppResult;
use crate::libs::exclusion::get_all_exclusions;
use crate::libs::filter::IntervalFilter;
use crate::libs::interval::Interval;
use crate::libs::range::Range;
use std::collections::VecDeque;
use tracing::debug;

/// Removes every subtraction from every range.
pub fn subtract_ranges(ranges: &[Range], subtractions: &[Range]) -> Vec<Range> {
    let mut results = ranges.to_vec();
    for subtraction in subtractions {
        results = results.iter().flat_map(|range| range.subtract(subtraction)).collect();
    }
    results
}

/// Splits `interval` around the exclusions lying wholly inside it.
///
/// An open interval is measured up to `now`; pieces starting after `now` are
/// dropped and the last piece stays open.
pub fn flatten(interval: &Interval, exclusions: &[Range], now: Datetime) -> Vec<Interval> {
    let mut range = interval.range;
    if interval.is_open() {
        range.close(now.max(range.start.unwrap_or(now)));
    }

    let enclosed: Vec<Range> = exclusions.iter().filter(|e| range.encloses(e)).copied().collect();

    let mut pieces: Vec<Interval> = subtract_ranges(&[range], &enclosed)
        .into_iter()
        .filter(|piece| !interval.is_open() || piece.start.is_some_and(|start| start <= now))
        .map(|piece| {
            let mut chunk = interval.clone();
            chunk.set_range(piece);
            chunk
        })
        .collect();

    if interval.is_open() {
        if let Some(last) = pieces.last_mut() {
            last.range.open();
        }
    }

    pieces
}

/// Intervals accepted by `filter`, oldest first, with ids assigned.
pub fn get_intervals_by_filter(
    database: &mut Database,
    rules: &impl RulesProvider,
    filter: &mut IntervalFilter,
    now: Datetime,
) -> AppResult<Vec<Interval>> {
    let mut accepted = VecDeque::new();
    let mut current_id = 0;
    let mut lines = database.iter();

    if let Some(line) = lines.next() {
        let latest = Interval::from_serialization(line?)?;
        let pieces = if latest.is_open() {
            expand_open(&latest, rules, now)?
        } else {
            vec![latest]
        };

        for mut piece in pieces.into_iter().rev() {
            current_id += 1;
            piece.id = current_id;
            if filter.accepts(&piece) {
                accepted.push_front(piece);
            }
        }
    }

    while !filter.is_done() {
        let Some(line) = lines.next() else {
            break;
        };
        let mut interval = Interval::from_serialization(line?)?;
        current_id += 1;
        interval.id = current_id;
        if filter.accepts(&interval) {
            accepted.push_front(interval);
        }
    }

    debug!("Filter accepted {} of {} intervals", accepted.len(), current_id);
    Ok(accepted.into())
}

/// The latest interval split into synthetic pieces, the last one open.
fn expand_open(latest: &Interval, rules: &impl RulesProvider, now: Datetime) -> AppResult<Vec<Interval>> {
    let Some(start) = latest.start() else {
        return Ok(vec![latest.clone()]);
    };
    if start >= now {
        return Ok(vec![latest.clone()]);
    }

    let exclusions = get_all_exclusions(rules, &Range::new(start, now))?;
    if exclusions.is_empty() {
        return Ok(vec![latest.clone()]);
    }

    let mut pieces = flatten(latest, &exclusions, now);
    if pieces.is_empty() {
        return Ok(vec![latest.clone()]);
    }

    let last = pieces.len() - 1;
    for piece in &mut pieces[..last] {
        piece.synthetic = true;
    }
    Ok(pieces)
}

/// The most recent stored interval, with id 1.
pub fn get_latest_interval(database: &mut Database) -> AppResult<Option<Interval>> {
    match database.get_latest_entry()? {
        Some(line) => {
            let mut interval = Interval::from_serialization(&line)?;
            interval.id = 1;
            Ok(Some(interval))
        }
        None => Ok(None),
    }
}

/// Stored intervals overlapping `range`.
pub fn get_overlapping(database: &mut Database, range: &Range) -> AppResult<Vec<Interval>> {
    let mut filter = IntervalFilter::all_in_range(*range);
    let mut overlapping = Vec::new();
    for line in database.iter() {
        let interval = Interval::from_serialization(line?)?;
        if filter.accepts(&interval) && interval.range.overlaps(range) {
            overlapping.push(interval);
        }
        if filter.is_done() {
            break;
        }
    }
    Ok(overlapping)
}

/// Replaces an open latest interval that exclusions have split by its
/// pieces, so that what is stored matches what is listed.
pub fn flatten_database(
    database: &mut Database,
    journal: &mut Journal,
    rules: &impl RulesProvider,
    now: Datetime,
    verbose: bool,
) -> AppResult<()> {
    let Some(latest) = get_latest_interval(database)? else {
        return Ok(());
    };
    if !latest.is_open() {
        return Ok(());
    }

    let pieces = expand_open(&latest, rules, now)?;
    if pieces.len() < 2 {
        return Ok(());
    }

    debug!("Flattening open interval into {} pieces", pieces.len());
    database.delete_interval(&latest, journal)?;
    for mut piece in pieces {
        piece.synthetic = false;
        piece.id = 0;
        database.add_interval(&piece, journal, verbose)?;
    }
    Ok(())
}
