//! Live usage counters for every tag ever attached to a stored interval.
//!
//! Entries are never removed once created: a counter may drop to zero and be
//! incremented again later, so [`TagInfoDatabase::tags`] also reports tags
//! that are no longer in use. Only non-zero counters are written to
//! `tags.data`.

use crate::libs::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// File name of the persisted tag counters inside the data directory.
pub const TAGS_FILE_NAME: &str = "tags.data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagInfo {
    pub count: u32,
}

impl TagInfo {
    pub fn new(count: u32) -> Self {
        Self { count }
    }

    pub fn has_count(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Default)]
pub struct TagInfoDatabase {
    tags: BTreeMap<String, TagInfo>,
    modified: bool,
}

impl TagInfoDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: impl Into<String>, info: TagInfo) {
        self.modified = true;
        self.tags.insert(tag.into(), info);
    }

    /// Increments the counter for `tag`, creating it when missing.
    ///
    /// Returns the previous count, or `None` when the tag was new.
    pub fn increment_tag(&mut self, tag: &str) -> Option<u32> {
        self.modified = true;
        match self.tags.get_mut(tag) {
            Some(info) => {
                let previous = info.count;
                info.count += 1;
                Some(previous)
            }
            None => {
                self.tags.insert(tag.to_string(), TagInfo::new(1));
                None
            }
        }
    }

    /// Decrements the counter for `tag` and returns the new count.
    ///
    /// Decrementing a tag that was never counted, or one already at zero, is
    /// a caller bug and fails.
    pub fn decrement_tag(&mut self, tag: &str) -> AppResult<u32> {
        let info = self.tags.get_mut(tag).ok_or_else(|| AppError::UnknownTag(tag.to_string()))?;
        if info.count == 0 {
            return Err(AppError::UnknownTag(tag.to_string()));
        }
        self.modified = true;
        info.count -= 1;
        Ok(info.count)
    }

    pub fn count(&self, tag: &str) -> Option<u32> {
        self.tags.get(tag).map(|info| info.count)
    }

    pub fn tags(&self) -> BTreeSet<String> {
        self.tags.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TagInfo)> {
        self.tags.iter()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    pub fn to_json(&self) -> AppResult<String> {
        let counted: BTreeMap<&String, &TagInfo> = self.tags.iter().filter(|(_, info)| info.has_count()).collect();
        Ok(serde_json::to_string_pretty(&counted)?)
    }

    pub fn from_json(json: &str) -> AppResult<Self> {
        let tags: BTreeMap<String, TagInfo> = if json.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(json)?
        };
        Ok(Self { tags, modified: false })
    }
}
