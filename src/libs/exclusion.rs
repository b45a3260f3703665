//! Untrackable time: nights, weekends, lunch breaks and days off.
//!
//! Exclusions come from settings. A weekday setting holds one or more time
//! blocks, a date setting excludes that whole day:
//!
//! ```text
//! exclusions.monday          = <9:00 12:00-13:00 >18:00
//! exclusions.saturday        = <24:00
//! exclusions.days.2020-12-25 = off
//! ```
//!
//! `<T` covers midnight up to T, `A-B` covers A up to B and `>T` covers T up to
//! the next midnight. [`Exclusion::ranges`] expands a definition into concrete
//! ranges within a window.

use crate::libs::config::RulesProvider;
use crate::libs::datetime::at;
use crate::libs::error::{AppError, AppResult};
use crate::libs::range::Range;
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

const WEEKDAY_STEM: &str = "exclusions.";
const DAYS_STEM: &str = "exclusions.days.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBlock {
    Before(NaiveTime),
    Between(NaiveTime, NaiveTime),
    /// Until the end of the day.
    After(NaiveTime),
    WholeDay,
}

impl TimeBlock {
    fn parse(block: &str) -> AppResult<Self> {
        let malformed = || AppError::validation(format!("Malformed time block '{}'", block));

        if let Some(time) = block.strip_prefix('<') {
            return match parse_time(time).ok_or_else(malformed)? {
                Some(time) => Ok(TimeBlock::Before(time)),
                None => Ok(TimeBlock::WholeDay),
            };
        }
        if let Some(time) = block.strip_prefix('>') {
            return match parse_time(time).ok_or_else(malformed)? {
                Some(time) => Ok(TimeBlock::After(time)),
                None => Err(malformed()),
            };
        }

        let (from, to) = block.split_once('-').ok_or_else(malformed)?;
        let from = parse_time(from).flatten().ok_or_else(malformed)?;
        match parse_time(to).ok_or_else(malformed)? {
            Some(to) if to > from => Ok(TimeBlock::Between(from, to)),
            None => Ok(TimeBlock::After(from)),
            Some(_) => Err(malformed()),
        }
    }

    fn range_on(&self, day: NaiveDate) -> Range {
        let midnight = at(day, NaiveTime::MIN);
        let next_midnight = midnight + Duration::days(1);
        match *self {
            TimeBlock::Before(time) => Range::new(midnight, at(day, time)),
            TimeBlock::Between(from, to) => Range::new(at(day, from), at(day, to)),
            TimeBlock::After(time) => Range::new(at(day, time), next_midnight),
            TimeBlock::WholeDay => Range::new(midnight, next_midnight),
        }
    }
}

/// `Some(None)` stands for `24:00`, the end of the day.
fn parse_time(value: &str) -> Option<Option<NaiveTime>> {
    if value == "24:00" || value == "24:00:00" {
        return Some(None);
    }
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
        .map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Weekday { day: Weekday, blocks: Vec<TimeBlock> },
    DayOff(NaiveDate),
}

impl Exclusion {
    /// Builds an exclusion from one `exclusions.*` setting.
    pub fn from_rule(name: &str, value: &str) -> AppResult<Self> {
        if let Some(date) = name.strip_prefix(DAYS_STEM) {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| AppError::validation(format!("'{}' is not a valid date", date)))?;
            return match value.trim() {
                "off" => Ok(Exclusion::DayOff(date)),
                other => Err(AppError::validation(format!("Unsupported day exclusion '{}'", other))),
            };
        }

        let day = name
            .strip_prefix(WEEKDAY_STEM)
            .and_then(|day| day.parse::<Weekday>().ok())
            .ok_or_else(|| AppError::validation(format!("Unrecognized exclusion '{}'", name)))?;

        let blocks = value.split_whitespace().map(TimeBlock::parse).collect::<AppResult<Vec<_>>>()?;
        if blocks.is_empty() {
            return Err(AppError::validation(format!("Exclusion '{}' has no time blocks", name)));
        }
        Ok(Exclusion::Weekday { day, blocks })
    }

    /// Concrete excluded ranges overlapping `window`.
    ///
    /// Weekday exclusions need a closed window; an unbounded one yields
    /// nothing.
    pub fn ranges(&self, window: &Range) -> Vec<Range> {
        match self {
            Exclusion::DayOff(date) => {
                let day = TimeBlock::WholeDay.range_on(*date);
                if window.intersects(&day) {
                    vec![day]
                } else {
                    Vec::new()
                }
            }
            Exclusion::Weekday { day, blocks } => {
                let (Some(start), Some(end)) = (window.start, window.end) else {
                    return Vec::new();
                };
                let mut results = Vec::new();
                let mut date = start.date_naive();
                while date <= end.date_naive() {
                    if date.weekday() == *day {
                        results.extend(blocks.iter().map(|block| block.range_on(date)).filter(|r| window.overlaps(r)));
                    }
                    date += Duration::days(1);
                }
                results
            }
        }
    }
}

pub fn get_exclusions(rules: &impl RulesProvider) -> AppResult<Vec<Exclusion>> {
    rules
        .all(WEEKDAY_STEM)
        .iter()
        .map(|name| Exclusion::from_rule(name, rules.get(name).unwrap_or_default()))
        .collect()
}

/// Every excluded range overlapping `window`, days off first.
pub fn get_all_exclusions(rules: &impl RulesProvider, window: &Range) -> AppResult<Vec<Range>> {
    let exclusions = get_exclusions(rules)?;
    let (days, weekly): (Vec<&Exclusion>, Vec<&Exclusion>) =
        exclusions.iter().partition(|exclusion| matches!(exclusion, Exclusion::DayOff(_)));

    Ok(days.into_iter().chain(weekly).flat_map(|exclusion| exclusion.ranges(window)).collect())
}
