//! One calendar month of stored intervals.
//!
//! A datafile is named `YYYY-MM.data` and holds one serialized interval per
//! line, sorted ascending by start time. Lines are read lazily on first
//! access and written back through the atomic write primitive on
//! [`Datafile::commit`].

use crate::libs::atomic_file::{AtomicFile, AtomicWriteRegistry};
use crate::libs::datetime::{at, next_month_start, Datetime};
use crate::libs::error::{AppError, AppResult};
use crate::libs::interval::Interval;
use crate::libs::range::Range;
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;
use tracing::debug;

/// Extension shared by every month file.
pub const DATAFILE_EXTENSION: &str = "data";

#[derive(Debug)]
pub struct Datafile {
    file: AtomicFile,
    /// `None` until the file has been read.
    lines: Option<Vec<String>>,
    dirty: bool,
    month: Range,
}

impl Datafile {
    /// Binds a datafile to `path` without reading it.
    pub fn new(registry: &AtomicWriteRegistry, path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let month = month_from_name(path)?;
        Ok(Self {
            file: AtomicFile::new(registry, path),
            lines: None,
            dirty: false,
            month,
        })
    }

    /// File name without the directory, e.g. `2020-06.data`.
    pub fn name(&self) -> String {
        self.file.name()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `[first of month, first of next month)`
    pub fn month(&self) -> Range {
        self.month
    }

    /// True when lines changed since the last commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_loaded(&self) -> bool {
        self.lines.is_some()
    }

    pub fn all_lines(&mut self) -> AppResult<&[String]> {
        Ok(self.load_lines()?.as_slice())
    }

    pub fn last_line(&mut self) -> AppResult<Option<&str>> {
        Ok(self.load_lines()?.last().map(String::as_str))
    }

    /// Inserts `interval` keeping the lines sorted.
    ///
    /// Returns `false` without touching the file when the interval does not
    /// start in this month.
    pub fn add_interval(&mut self, interval: &Interval) -> AppResult<bool> {
        if !self.owns(interval.start()) {
            return Ok(false);
        }

        let serialized = interval.serialize();
        let lines = self.load_lines()?;
        let position = lines.partition_point(|line| line.as_str() <= serialized.as_str());
        lines.insert(position, serialized);
        self.dirty = true;
        Ok(true)
    }

    /// Removes the line that is exactly `interval`'s serialization.
    pub fn delete_interval(&mut self, interval: &Interval) -> AppResult<()> {
        let serialized = interval.serialize();
        let name = self.name();
        let lines = self.load_lines()?;
        match lines.iter().position(|line| *line == serialized) {
            Some(position) => {
                lines.remove(position);
                self.dirty = true;
                Ok(())
            }
            None => Err(AppError::NotFound { file: name, line: serialized }),
        }
    }

    /// Stages the full line list for writing when anything changed.
    pub fn commit(&mut self) -> AppResult<()> {
        if !self.dirty {
            return Ok(());
        }

        let lines = self.lines.as_deref().unwrap_or_default();
        if lines.is_empty() {
            self.file.remove()?;
        } else {
            self.file.truncate()?;
            let mut content = String::new();
            for line in lines {
                content.push_str(line);
                content.push('\n');
            }
            self.file.write_raw(&content)?;
        }

        debug!("Staged {} lines for {}", lines.len(), self.name());
        self.dirty = false;
        Ok(())
    }

    fn owns(&self, start: Option<Datetime>) -> bool {
        match start {
            Some(start) => self.month.start.is_some_and(|s| start >= s) && self.month.end.is_some_and(|e| start < e),
            None => false,
        }
    }

    fn load_lines(&mut self) -> AppResult<&mut Vec<String>> {
        if self.lines.is_none() {
            let mut lines = Vec::new();
            for line in self.file.read_lines()? {
                if line.trim().is_empty() {
                    continue;
                }
                Interval::from_serialization(&line)?;
                lines.push(line);
            }
            debug!("Loaded {} lines from {}", lines.len(), self.name());
            self.lines = Some(lines);
        }
        Ok(self.lines.get_or_insert_with(Vec::new))
    }
}

/// Derives the month covered by a `YYYY-MM.data` file name.
fn month_from_name(path: &Path) -> AppResult<Range> {
    let invalid = || AppError::validation(format!("'{}' is not a valid datafile name", path.display()));

    if path.extension().and_then(|e| e.to_str()) != Some(DATAFILE_EXTENSION) {
        return Err(invalid());
    }
    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
    let (year, month) = stem.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;

    let start = at(first, NaiveTime::MIN);
    Ok(Range::new(start, next_month_start(&start)))
}

/// File name of the datafile that stores intervals starting at `value`.
pub fn datafile_name(value: &Datetime) -> String {
    format!("{}.{}", value.format("%Y-%m"), DATAFILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::datetime::parse_input;

    #[test]
    fn month_is_derived_from_name() {
        let month = month_from_name(Path::new("/tmp/2020-12.data")).unwrap();
        assert_eq!(month, Range::new(parse_input("2020-12-01").unwrap(), parse_input("2021-01-01").unwrap()));
    }

    #[test]
    fn rejects_foreign_names() {
        assert!(month_from_name(Path::new("undo.data")).is_err());
        assert!(month_from_name(Path::new("2020-13.data")).is_err());
        assert!(month_from_name(Path::new("2020-06.txt")).is_err());
    }

    #[test]
    fn names_follow_start_month() {
        assert_eq!(datafile_name(&parse_input("2016-02-20T10:00").unwrap()), "2016-02.data");
    }
}
