//! Half-open time ranges and their set algebra.
//!
//! A [`Range`] is `[start, end)`. A missing end makes the range *open*: it is
//! started but still running, and it extends to positive infinity for the
//! purpose of overlap and intersection. A range with neither bound is empty
//! and is used by filters to mean "everything".
//!
//! The algebra never invents "now". Callers that need an open range closed
//! against the current time pass that time in explicitly.

use crate::libs::datetime::{to_iso, Datetime};
use chrono::Duration;
use std::fmt;

/// A `[start, end)` span. Either bound may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: Option<Datetime>,
    pub end: Option<Datetime>,
}

impl Range {
    /// A closed range. `start` is not checked against `end`; callers
    /// validate ordering where it matters.
    pub fn new(start: Datetime, end: Datetime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A started range with no end yet.
    pub fn open_from(start: Datetime) -> Self {
        Self { start: Some(start), end: None }
    }

    /// Removes the end, making the range open.
    pub fn open(&mut self) {
        self.end = None;
    }

    /// Sets the end, closing an open range.
    pub fn close(&mut self, end: Datetime) {
        self.end = Some(end);
    }

    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.end.is_some()
    }

    /// Started but not ended.
    pub fn is_open(&self) -> bool {
        self.is_started() && !self.is_ended()
    }

    /// Neither bound is set.
    pub fn is_empty(&self) -> bool {
        !self.is_started() && !self.is_ended()
    }

    /// True when both ranges are started and share at least one instant.
    pub fn overlaps(&self, other: &Range) -> bool {
        let (Some(start), Some(other_start)) = (self.start, other.start) else {
            return false;
        };

        // Other range ends before this range starts.
        if let Some(other_end) = other.end {
            if other_end <= start {
                return false;
            }
        }

        // Other range starts after this range ends.
        if let Some(end) = self.end {
            if other_start >= end {
                return false;
            }
        }

        true
    }

    /// Like [`Range::overlaps`], but a missing bound on either side is
    /// unbounded rather than disqualifying.
    pub fn intersects(&self, other: &Range) -> bool {
        if let (Some(start), Some(other_end)) = (self.start, other.end) {
            if start >= other_end {
                return false;
            }
        }

        if let (Some(end), Some(other_start)) = (self.end, other.start) {
            if end <= other_start {
                return false;
            }
        }

        true
    }

    /// True when `other` lies entirely within this range.
    pub fn encloses(&self, other: &Range) -> bool {
        let (Some(start), Some(other_start)) = (self.start, other.start) else {
            return false;
        };
        if other_start < start {
            return false;
        }
        match self.end {
            Some(end) => matches!(other.end, Some(other_end) if other_end <= end),
            None => true,
        }
    }

    /// The overlapping portion of both ranges, or an empty range when they
    /// do not overlap.
    pub fn intersect(&self, other: &Range) -> Range {
        if !self.overlaps(other) {
            return Range::default();
        }

        let start = self.start.max(other.start);
        let end = match (self.end, other.end) {
            (Some(end), Some(other_end)) => Some(end.min(other_end)),
            (Some(end), None) => Some(end),
            (None, other_end) => other_end,
        };

        Range { start, end }
    }

    /// This range with the portion covered by `other` removed.
    ///
    /// Yields no range when `other` covers this one, one range when `other`
    /// clips a prefix or suffix (or does not overlap at all), and two when
    /// `other` is strictly interior.
    pub fn subtract(&self, other: &Range) -> Vec<Range> {
        if !self.overlaps(other) {
            return vec![*self];
        }

        let mut results = Vec::with_capacity(2);
        let (Some(start), Some(other_start)) = (self.start, other.start) else {
            return results;
        };

        if start < other_start {
            results.push(Range::new(start, other_start));
        }

        if let Some(other_end) = other.end {
            match self.end {
                Some(end) if end > other_end => results.push(Range::new(other_end, end)),
                Some(_) => {}
                None => results.push(Range::open_from(other_end)),
            }
        }

        results
    }

    /// Duration of the range. An open range is measured up to `now`.
    pub fn total(&self, now: Datetime) -> Duration {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end - start,
            (Some(start), None) if now > start => now - start,
            _ => Duration::zero(),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range {} - {}",
            self.start.as_ref().map_or_else(|| "n/a".to_string(), to_iso),
            self.end.as_ref().map_or_else(|| "n/a".to_string(), to_iso)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::datetime::parse_input;

    fn at(value: &str) -> Datetime {
        parse_input(value).unwrap()
    }

    fn range(start: &str, end: &str) -> Range {
        Range::new(at(start), at(end))
    }

    #[test]
    fn overlap_cases() {
        let base = range("2016-06-10T10:00", "2016-06-10T12:00");
        // A: entirely before
        assert!(!base.overlaps(&range("2016-06-10T08:00", "2016-06-10T09:00")));
        // B: ends where base starts (half-open)
        assert!(!base.overlaps(&range("2016-06-10T09:00", "2016-06-10T10:00")));
        // C: straddles start
        assert!(base.overlaps(&range("2016-06-10T09:00", "2016-06-10T11:00")));
        // D: interior
        assert!(base.overlaps(&range("2016-06-10T10:30", "2016-06-10T11:00")));
        // E: starts where base ends
        assert!(!base.overlaps(&range("2016-06-10T12:00", "2016-06-10T13:00")));
        // F: open, starting inside
        assert!(base.overlaps(&Range::open_from(at("2016-06-10T11:00"))));
        // G: open, starting after
        assert!(!base.overlaps(&Range::open_from(at("2016-06-10T12:30"))));
        // unstarted ranges never overlap
        assert!(!base.overlaps(&Range::default()));
    }

    #[test]
    fn open_range_overlaps_everything_after_start() {
        let open = Range::open_from(at("2016-06-10T10:00"));
        assert!(open.overlaps(&range("2017-01-01T00:00", "2017-01-02T00:00")));
        assert!(!open.overlaps(&range("2016-06-09T00:00", "2016-06-10T10:00")));
    }

    #[test]
    fn intersect_picks_later_start_and_earlier_end() {
        let a = range("2016-06-10T10:00", "2016-06-10T12:00");
        let b = range("2016-06-10T11:00", "2016-06-10T13:00");
        assert_eq!(a.intersect(&b), range("2016-06-10T11:00", "2016-06-10T12:00"));

        let open = Range::open_from(at("2016-06-10T11:30"));
        assert_eq!(a.intersect(&open), range("2016-06-10T11:30", "2016-06-10T12:00"));
        assert_eq!(open.intersect(&Range::open_from(at("2016-06-10T12:00"))), Range::open_from(at("2016-06-10T12:00")));
    }

    #[test]
    fn intersect_of_disjoint_ranges_is_empty() {
        let a = range("2016-06-10T10:00", "2016-06-10T12:00");
        let b = range("2016-06-11T10:00", "2016-06-11T12:00");
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn subtract_cases() {
        let base = range("2016-06-10T10:00", "2016-06-10T12:00");

        // disjoint
        let disjoint = range("2016-06-11T10:00", "2016-06-11T12:00");
        assert_eq!(base.subtract(&disjoint), vec![base]);

        // enclosing
        let cover = range("2016-06-10T09:00", "2016-06-10T13:00");
        assert!(base.subtract(&cover).is_empty());
        assert!(base.subtract(&base).is_empty());

        // prefix
        let prefix = range("2016-06-10T09:00", "2016-06-10T11:00");
        assert_eq!(base.subtract(&prefix), vec![range("2016-06-10T11:00", "2016-06-10T12:00")]);

        // suffix
        let suffix = range("2016-06-10T11:00", "2016-06-10T13:00");
        assert_eq!(base.subtract(&suffix), vec![range("2016-06-10T10:00", "2016-06-10T11:00")]);

        // interior
        let interior = range("2016-06-10T10:30", "2016-06-10T11:00");
        assert_eq!(
            base.subtract(&interior),
            vec![range("2016-06-10T10:00", "2016-06-10T10:30"), range("2016-06-10T11:00", "2016-06-10T12:00")]
        );
    }

    #[test]
    fn subtract_and_intersect_reconstruct_original() {
        let base = range("2016-06-10T10:00", "2016-06-10T12:00");
        let interior = range("2016-06-10T10:30", "2016-06-10T11:00");

        let mut pieces = base.subtract(&interior);
        pieces.push(base.intersect(&interior));
        pieces.sort_by_key(|r| r.start);

        let total: Duration = pieces.iter().map(|r| r.total(at("2030-01-01"))).sum();
        assert_eq!(total, base.total(at("2030-01-01")));
        assert_eq!(pieces.first().unwrap().start, base.start);
        assert_eq!(pieces.last().unwrap().end, base.end);
        for pair in pieces.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn subtract_from_open_range_keeps_open_tail() {
        let open = Range::open_from(at("2016-06-10T10:00"));
        let lunch = range("2016-06-10T12:00", "2016-06-10T13:00");
        assert_eq!(
            open.subtract(&lunch),
            vec![range("2016-06-10T10:00", "2016-06-10T12:00"), Range::open_from(at("2016-06-10T13:00"))]
        );
    }

    #[test]
    fn encloses_requires_full_containment() {
        let base = range("2016-06-10T10:00", "2016-06-10T12:00");
        assert!(base.encloses(&range("2016-06-10T10:00", "2016-06-10T12:00")));
        assert!(!base.encloses(&range("2016-06-10T09:59", "2016-06-10T11:00")));
        assert!(!base.encloses(&Range::open_from(at("2016-06-10T11:00"))));
        assert!(Range::open_from(at("2016-06-10T10:00")).encloses(&Range::open_from(at("2016-06-10T11:00"))));
    }

    #[test]
    fn intersects_treats_missing_bounds_as_unbounded() {
        let base = range("2016-06-10T10:00", "2016-06-10T12:00");
        assert!(base.intersects(&Range::default()));
        assert!(base.intersects(&Range { start: None, end: Some(at("2016-06-10T11:00")) }));
        assert!(!base.intersects(&Range { start: None, end: Some(at("2016-06-10T10:00")) }));
    }

    #[test]
    fn total_of_open_range_uses_supplied_now() {
        let open = Range::open_from(at("2016-06-10T10:00"));
        assert_eq!(open.total(at("2016-06-10T11:30")), Duration::minutes(90));
        assert_eq!(Range::default().total(at("2016-06-10T11:30")), Duration::zero());
    }
}
