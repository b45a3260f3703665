//! Stateful predicates applied while walking the store newest first.
//!
//! A filter sees intervals in reverse chronological order with their ids
//! already assigned. Besides accepting or rejecting each one it can declare
//! itself done, meaning no older interval could match, so the walk stops
//! early.
//!
//! ```rust
//! use tempo::libs::filter::IntervalFilter;
//! use tempo::libs::interval::Interval;
//!
//! let mut filter = IntervalFilter::first_of(IntervalFilter::all_with_tags(["client"]));
//! let tagged = Interval::with_tags(Default::default(), ["client"]);
//! assert!(filter.accepts(&tagged));
//! assert!(filter.is_done());
//! ```

use crate::libs::interval::Interval;
use crate::libs::range::Range;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub enum IntervalFilter {
    /// Accepts everything.
    All,
    AllInRange {
        range: Range,
        done: bool,
    },
    /// Wanted ids ascending; `next` indexes the next id to match.
    AllWithIds {
        ids: Vec<usize>,
        next: usize,
        done: bool,
    },
    AllWithTags {
        tags: BTreeSet<String>,
    },
    /// Tags may be negated with a leading `-`. A literal `OR` among the tags
    /// switches from all-must-match to any-may-match.
    AllWithTagsComplex {
        tags: BTreeSet<String>,
    },
    AndGroup {
        filters: Vec<IntervalFilter>,
        done: bool,
    },
    FirstOf {
        inner: Box<IntervalFilter>,
        done: bool,
    },
}

impl IntervalFilter {
    pub fn all() -> Self {
        IntervalFilter::All
    }

    /// An empty range accepts every interval.
    pub fn all_in_range(range: Range) -> Self {
        IntervalFilter::AllInRange { range, done: false }
    }

    /// Matches by id. Duplicates collapse; an empty id list matches nothing.
    pub fn all_with_ids(ids: impl IntoIterator<Item = usize>) -> Self {
        let ids: BTreeSet<usize> = ids.into_iter().collect();
        let done = ids.is_empty();
        IntervalFilter::AllWithIds {
            ids: ids.into_iter().collect(),
            next: 0,
            done,
        }
    }

    /// Every listed tag must be present.
    pub fn all_with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IntervalFilter::AllWithTags {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn all_with_tags_complex<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IntervalFilter::AllWithTagsComplex {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Accepts what every member accepts. Done as soon as any member is.
    pub fn and_group(filters: Vec<IntervalFilter>) -> Self {
        IntervalFilter::AndGroup { filters, done: false }
    }

    /// Only the first interval `inner` accepts, i.e. the newest one.
    pub fn first_of(inner: IntervalFilter) -> Self {
        IntervalFilter::FirstOf {
            inner: Box::new(inner),
            done: false,
        }
    }

    /// The usual command line selection: a time range and required tags.
    pub fn from_range_and_tags(range: Range, tags: &BTreeSet<String>) -> Self {
        let mut filters = vec![IntervalFilter::all_in_range(range)];
        if !tags.is_empty() {
            filters.push(IntervalFilter::all_with_tags(tags.iter().cloned()));
        }
        IntervalFilter::and_group(filters)
    }

    /// Feeds the next interval of a newest-first walk.
    pub fn accepts(&mut self, interval: &Interval) -> bool {
        match self {
            IntervalFilter::All => true,

            IntervalFilter::AllInRange { range, done } => {
                if *done {
                    return false;
                }
                if range.is_empty() || interval.range.intersects(range) {
                    return true;
                }
                // Walking backwards: an interval starting before the range
                // means nothing older can intersect it.
                if let (Some(start), Some(range_start)) = (interval.start(), range.start) {
                    *done = start < range_start;
                }
                false
            }

            IntervalFilter::AllWithIds { ids, next, done } => {
                if *done {
                    return false;
                }
                if ids.get(*next) == Some(&interval.id) {
                    *next += 1;
                    *done = *next == ids.len();
                    return true;
                }
                false
            }

            IntervalFilter::AllWithTags { tags } => tags.iter().all(|tag| interval.has_tag(tag)),

            IntervalFilter::AllWithTagsComplex { tags } => accepts_complex(tags, interval),

            IntervalFilter::AndGroup { filters, done } => {
                if *done {
                    return false;
                }
                for filter in filters.iter_mut() {
                    if !filter.accepts(interval) {
                        *done = filter.is_done();
                        return false;
                    }
                }
                true
            }

            IntervalFilter::FirstOf { inner, done } => {
                if *done {
                    return false;
                }
                if inner.accepts(interval) {
                    *done = true;
                    return true;
                }
                *done = inner.is_done();
                false
            }
        }
    }

    /// No older interval can be accepted anymore.
    pub fn is_done(&self) -> bool {
        match self {
            IntervalFilter::All | IntervalFilter::AllWithTags { .. } | IntervalFilter::AllWithTagsComplex { .. } => false,
            IntervalFilter::AllInRange { done, .. }
            | IntervalFilter::AllWithIds { done, .. }
            | IntervalFilter::AndGroup { done, .. }
            | IntervalFilter::FirstOf { done, .. } => *done,
        }
    }

    /// Rewinds the filter for another walk.
    pub fn reset(&mut self) {
        match self {
            IntervalFilter::All | IntervalFilter::AllWithTags { .. } | IntervalFilter::AllWithTagsComplex { .. } => {}
            IntervalFilter::AllInRange { done, .. } => *done = false,
            IntervalFilter::AllWithIds { ids, next, done } => {
                *next = 0;
                *done = ids.is_empty();
            }
            IntervalFilter::AndGroup { filters, done } => {
                filters.iter_mut().for_each(IntervalFilter::reset);
                *done = false;
            }
            IntervalFilter::FirstOf { inner, done } => {
                inner.reset();
                *done = false;
            }
        }
    }
}

// No precedence and no grouping: one OR anywhere makes every term optional.
fn accepts_complex(tags: &BTreeSet<String>, interval: &Interval) -> bool {
    let any = tags.contains("OR");

    for tag in tags {
        if any && tag == "OR" {
            continue;
        }
        let (name, negated) = match tag.strip_prefix('-') {
            Some(name) => (name, true),
            None => (tag.as_str(), false),
        };
        let matched = interval.has_tag(name) != negated;

        if any && matched {
            return true;
        }
        if !any && !matched {
            return false;
        }
    }

    !any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::datetime::parse_input;

    fn interval(start: &str, end: &str, tags: &[&str]) -> Interval {
        Interval::with_tags(Range::new(parse_input(start).unwrap(), parse_input(end).unwrap()), tags.iter().copied())
    }

    fn with_id(mut interval: Interval, id: usize) -> Interval {
        interval.id = id;
        interval
    }

    #[test]
    fn empty_range_accepts_everything() {
        let mut filter = IntervalFilter::all_in_range(Range::default());
        assert!(filter.accepts(&interval("2020-01-01T00:00", "2020-01-01T01:00", &[])));
        assert!(!filter.is_done());
    }

    #[test]
    fn range_filter_stops_once_past_the_start() {
        let mut filter = IntervalFilter::all_in_range(Range::new(
            parse_input("2020-06-01T00:00").unwrap(),
            parse_input("2020-06-02T00:00").unwrap(),
        ));

        assert!(!filter.accepts(&interval("2020-06-03T00:00", "2020-06-03T01:00", &[])));
        assert!(!filter.is_done());
        assert!(filter.accepts(&interval("2020-06-01T10:00", "2020-06-01T11:00", &[])));
        assert!(filter.accepts(&interval("2020-05-31T23:00", "2020-06-01T01:00", &[])));
        assert!(!filter.accepts(&interval("2020-05-31T20:00", "2020-05-31T21:00", &[])));
        assert!(filter.is_done());

        filter.reset();
        assert!(!filter.is_done());
    }

    #[test]
    fn open_interval_intersects_later_range() {
        let mut filter = IntervalFilter::all_in_range(Range::new(
            parse_input("2020-06-05T00:00").unwrap(),
            parse_input("2020-06-06T00:00").unwrap(),
        ));
        let open = Interval::new(Range::open_from(parse_input("2020-06-01T00:00").unwrap()));
        assert!(filter.accepts(&open));
    }

    #[test]
    fn ids_are_consumed_in_ascending_order() {
        let base = interval("2020-06-01T00:00", "2020-06-01T01:00", &[]);
        let mut filter = IntervalFilter::all_with_ids([3, 1]);

        assert!(filter.accepts(&with_id(base.clone(), 1)));
        assert!(!filter.accepts(&with_id(base.clone(), 2)));
        assert!(!filter.is_done());
        assert!(filter.accepts(&with_id(base.clone(), 3)));
        assert!(filter.is_done());
        assert!(!filter.accepts(&with_id(base, 4)));
    }

    #[test]
    fn no_ids_is_done_immediately() {
        let filter = IntervalFilter::all_with_ids(Vec::new());
        assert!(filter.is_done());
    }

    #[test]
    fn tags_must_all_be_present() {
        let mut filter = IntervalFilter::all_with_tags(["foo", "bar"]);
        assert!(filter.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["foo", "bar", "baz"])));
        assert!(!filter.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["foo"])));
    }

    #[test]
    fn complex_tags_support_negation() {
        let mut filter = IntervalFilter::all_with_tags_complex(["foo", "-bar"]);
        assert!(filter.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["foo"])));
        assert!(!filter.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["foo", "bar"])));
    }

    #[test]
    fn complex_tags_or_makes_any_term_sufficient() {
        let mut filter = IntervalFilter::all_with_tags_complex(["foo", "OR", "bar"]);
        assert!(filter.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["bar"])));
        assert!(!filter.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["baz"])));

        // Known limitation: OR applies to every term, there is no grouping.
        let mut mixed = IntervalFilter::all_with_tags_complex(["a", "b", "OR", "c"]);
        assert!(mixed.accepts(&interval("2020-06-01T00:00", "2020-06-01T01:00", &["a"])));
    }

    #[test]
    fn and_group_is_done_when_rejecting_child_is_done() {
        let mut filter = IntervalFilter::and_group(vec![
            IntervalFilter::all_in_range(Range::new(
                parse_input("2020-06-01T00:00").unwrap(),
                parse_input("2020-06-02T00:00").unwrap(),
            )),
            IntervalFilter::all_with_tags(["foo"]),
        ]);

        assert!(!filter.accepts(&interval("2020-06-01T10:00", "2020-06-01T11:00", &["bar"])));
        assert!(!filter.is_done());
        assert!(filter.accepts(&interval("2020-06-01T08:00", "2020-06-01T09:00", &["foo"])));
        assert!(!filter.accepts(&interval("2020-05-30T08:00", "2020-05-30T09:00", &["foo"])));
        assert!(filter.is_done());
    }

    #[test]
    fn first_of_accepts_once() {
        let mut filter = IntervalFilter::first_of(IntervalFilter::all_with_tags(["foo"]));
        let tagged = interval("2020-06-01T00:00", "2020-06-01T01:00", &["foo"]);

        assert!(!filter.accepts(&interval("2020-06-01T02:00", "2020-06-01T03:00", &[])));
        assert!(filter.accepts(&tagged));
        assert!(filter.is_done());
        assert!(!filter.accepts(&tagged));

        filter.reset();
        assert!(filter.accepts(&tagged));
    }
}
