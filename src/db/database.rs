//! The interval store: one [`Datafile`] per calendar month.
//!
//! The database owns every month file found in its directory plus the tag
//! counters. Mutations take the [`Journal`] explicitly so that every change
//! made inside a transaction is recorded for undo:
//!
//! ```rust,no_run
//! use tempo::db::database::Database;
//! use tempo::db::journal::{Journal, JournalSize};
//! use tempo::libs::atomic_file::AtomicWriteRegistry;
//! use tempo::libs::datetime::parse_input;
//! use tempo::libs::interval::Interval;
//! use tempo::libs::range::Range;
//!
//! let registry = AtomicWriteRegistry::new();
//! let mut database = Database::initialize(&registry, "/tmp/tempo/data")?;
//! let mut journal = Journal::new(&registry, "/tmp/tempo/data/undo.data", JournalSize::Unlimited)?;
//!
//! let range = Range::new(parse_input("2020-06-01T09:00")?, parse_input("2020-06-01T12:00")?);
//! journal.transaction(|journal| {
//!     database.add_interval(&Interval::with_tags(range, ["client"]), journal, false)?;
//!     database.commit()
//! })?;
//! # Ok::<(), tempo::libs::error::AppError>(())
//! ```
//!
//! Intervals crossing a month boundary are split before storage so that no
//! line ever spans two files. Reads walk the stored lines newest first; that
//! order defines interval ids.

use crate::db::datafile::{datafile_name, Datafile, DATAFILE_EXTENSION};
use crate::db::journal::Journal;
use crate::db::tag_info::{TagInfoDatabase, TAGS_FILE_NAME};
use crate::libs::atomic_file::{AtomicFile, AtomicWriteRegistry};
use crate::libs::datetime::{month_start, next_month_start, Datetime};
use crate::libs::error::{AppError, AppResult};
use crate::libs::interval::Interval;
use crate::libs::messages::Message;
use crate::libs::range::Range;
use crate::msg_info;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug)]
pub struct Database {
    location: PathBuf,
    registry: AtomicWriteRegistry,
    /// Sorted by month, oldest first.
    files: Vec<Datafile>,
    tag_info: TagInfoDatabase,
}

impl Database {
    /// Opens the store in `location`, which must be an existing directory.
    pub fn initialize(registry: &AtomicWriteRegistry, location: impl AsRef<Path>) -> AppResult<Self> {
        let location = location.as_ref();
        if !location.is_dir() {
            return Err(AppError::validation(format!("Database location '{}' does not exist", location.display())));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(location)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DATAFILE_EXTENSION) {
                continue;
            }
            // undo.data and tags.data share the extension.
            if let Ok(file) = Datafile::new(registry, &path) {
                files.push(file);
            }
        }
        files.sort_by_key(|file| file.month().start);
        debug!("Found {} datafiles in {}", files.len(), location.display());

        let mut database = Self {
            location: location.to_path_buf(),
            registry: registry.clone(),
            files,
            tag_info: TagInfoDatabase::new(),
        };
        database.tag_info = database.load_tag_info()?;
        Ok(database)
    }

    /// The data directory holding the month files.
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn registry(&self) -> &AtomicWriteRegistry {
        &self.registry
    }

    /// Names of the known month files, oldest first.
    pub fn files(&self) -> Vec<String> {
        self.files.iter().map(Datafile::name).collect()
    }

    /// Every tag ever counted, including tags no longer in use.
    pub fn tags(&self) -> BTreeSet<String> {
        self.tag_info.tags()
    }

    pub fn tag_info(&self) -> &TagInfoDatabase {
        &self.tag_info
    }

    /// Stored lines, newest first.
    pub fn iter(&mut self) -> Lines<'_> {
        Lines::new(&mut self.files, true)
    }

    /// Stored lines, oldest first.
    pub fn iter_oldest_first(&mut self) -> Lines<'_> {
        Lines::new(&mut self.files, false)
    }

    /// The most recently stored line.
    pub fn get_latest_entry(&mut self) -> AppResult<Option<String>> {
        for file in self.files.iter_mut().rev() {
            if let Some(line) = file.last_line()? {
                return Ok(Some(line.to_string()));
            }
        }
        Ok(None)
    }

    /// True when no month file holds a line.
    pub fn is_empty(&mut self) -> AppResult<bool> {
        Ok(self.get_latest_entry()?.is_none())
    }

    pub fn add_interval(&mut self, interval: &Interval, journal: &mut Journal, verbose: bool) -> AppResult<()> {
        self.insert(interval, verbose)?;
        journal.record_interval_action("", &interval.json());
        Ok(())
    }

    /// `interval` must be exactly as read from the store.
    pub fn delete_interval(&mut self, interval: &Interval, journal: &mut Journal) -> AppResult<()> {
        self.remove(interval)?;
        journal.record_interval_action(&interval.json(), "");
        Ok(())
    }

    /// Replaces `from` by `to` as a single undoable action.
    ///
    /// An empty `from` only adds and an empty `to` only deletes, which is
    /// how undo reverses an addition or a deletion.
    pub fn modify_interval(&mut self, from: &Interval, to: &Interval, journal: &mut Journal, verbose: bool) -> AppResult<()> {
        if !from.is_empty() {
            self.remove(from)?;
        }
        if !to.is_empty() {
            self.insert(to, verbose)?;
        }

        let before = if from.is_empty() { String::new() } else { from.json() };
        let after = if to.is_empty() { String::new() } else { to.json() };
        journal.record_interval_action(&before, &after);
        Ok(())
    }

    /// Stages every dirty month file and the tag counters, then finalizes.
    pub fn commit(&mut self) -> AppResult<()> {
        for file in self.files.iter_mut() {
            file.commit()?;
        }

        if self.tag_info.is_modified() {
            let mut json = self.tag_info.to_json()?;
            json.push('\n');
            AtomicFile::write(&self.registry, self.location.join(TAGS_FILE_NAME), &json)?;
            self.tag_info.clear_modified();
        }

        self.registry.finalize_all()
    }

    fn insert(&mut self, interval: &Interval, verbose: bool) -> AppResult<()> {
        let start = interval
            .start()
            .ok_or_else(|| AppError::validation("Cannot store an interval without a start time"))?;
        debug!("Adding {}", interval.serialize());

        for segment in segments(interval) {
            let segment_start = segment.start().unwrap_or(start);
            let stored = self.datafile_for(segment_start)?.add_interval(&segment)?;
            if !stored {
                return Err(AppError::validation(format!("Interval '{}' does not belong to any month", segment.serialize())));
            }
            for tag in segment.tags() {
                if self.tag_info.increment_tag(tag).is_none() && verbose {
                    msg_info!(Message::NewTag(tag.clone()));
                }
            }
        }
        Ok(())
    }

    fn remove(&mut self, interval: &Interval) -> AppResult<()> {
        debug!("Deleting {}", interval.serialize());

        for segment in segments(interval) {
            let Some(start) = segment.start() else {
                return Err(AppError::NotFound {
                    file: self.location.display().to_string(),
                    line: segment.serialize(),
                });
            };
            let month = month_start(&start);
            let file = self
                .files
                .iter_mut()
                .find(|file| file.month().start == Some(month))
                .ok_or_else(|| AppError::NotFound {
                    file: datafile_name(&start),
                    line: segment.serialize(),
                })?;
            file.delete_interval(&segment)?;

            for tag in segment.tags() {
                self.tag_info.decrement_tag(tag)?;
            }
        }
        Ok(())
    }

    /// The datafile for the month containing `start`, created on demand.
    fn datafile_for(&mut self, start: Datetime) -> AppResult<&mut Datafile> {
        let month = Some(month_start(&start));
        let index = match self.files.iter().position(|file| file.month().start == month) {
            Some(index) => index,
            None => {
                let file = Datafile::new(&self.registry, self.location.join(datafile_name(&start)))?;
                let index = self.files.partition_point(|existing| existing.month().start < month);
                debug!("Creating datafile {}", file.name());
                self.files.insert(index, file);
                index
            }
        };
        Ok(&mut self.files[index])
    }

    fn load_tag_info(&mut self) -> AppResult<TagInfoDatabase> {
        let path = self.location.join(TAGS_FILE_NAME);
        if path.exists() {
            return TagInfoDatabase::from_json(&AtomicFile::read(&self.registry, &path)?);
        }

        debug!("Rebuilding tag counters from stored intervals");
        let mut tag_info = TagInfoDatabase::new();
        for line in self.iter_oldest_first() {
            for tag in Interval::from_serialization(line?)?.tags() {
                tag_info.increment_tag(tag);
            }
        }
        Ok(tag_info)
    }
}

/// Splits a closed range at every month boundary it crosses.
///
/// Open and unstarted ranges are returned unchanged.
pub fn segment_range(range: Range) -> Vec<Range> {
    let (Some(start), Some(end)) = (range.start, range.end) else {
        return vec![range];
    };

    let mut segments = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let boundary = next_month_start(&cursor).min(end);
        segments.push(Range::new(cursor, boundary));
        cursor = boundary;
    }

    if segments.is_empty() {
        segments.push(range);
    }
    segments
}

fn segments(interval: &Interval) -> Vec<Interval> {
    segment_range(interval.range)
        .into_iter()
        .map(|range| {
            let mut segment = interval.clone();
            segment.range = range;
            segment.id = 0;
            segment.synthetic = false;
            segment
        })
        .collect()
}

/// Lazily loading walk over every stored line.
pub struct Lines<'a> {
    files: std::slice::IterMut<'a, Datafile>,
    current: std::slice::Iter<'a, String>,
    newest_first: bool,
}

impl<'a> Lines<'a> {
    fn new(files: &'a mut [Datafile], newest_first: bool) -> Self {
        Self {
            files: files.iter_mut(),
            current: Default::default(),
            newest_first,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = AppResult<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = if self.newest_first { self.current.next_back() } else { self.current.next() };
            if let Some(line) = line {
                return Some(Ok(line.as_str()));
            }

            let file = if self.newest_first { self.files.next_back()? } else { self.files.next()? };
            match file.all_lines() {
                Ok(lines) => self.current = lines.iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::datetime::parse_input;

    fn range(start: &str, end: &str) -> Range {
        Range::new(parse_input(start).unwrap(), parse_input(end).unwrap())
    }

    #[test]
    fn range_within_a_month_is_not_split() {
        let r = range("2020-06-01T01:00", "2020-06-30T23:00");
        assert_eq!(segment_range(r), vec![r]);
    }

    #[test]
    fn range_is_split_at_month_boundaries() {
        let r = range("2020-05-31T22:00", "2020-07-01T02:00");
        assert_eq!(
            segment_range(r),
            vec![
                range("2020-05-31T22:00", "2020-06-01T00:00"),
                range("2020-06-01T00:00", "2020-07-01T00:00"),
                range("2020-07-01T00:00", "2020-07-01T02:00"),
            ]
        );
    }

    #[test]
    fn range_ending_on_boundary_yields_no_empty_piece() {
        let r = range("2020-12-31T22:00", "2021-01-01T00:00");
        assert_eq!(segment_range(r), vec![r]);
    }

    #[test]
    fn open_range_goes_whole_into_start_month() {
        let r = Range::open_from(parse_input("2020-05-31T22:00").unwrap());
        assert_eq!(segment_range(r), vec![r]);
    }
}
