//! Tagged intervals and their two storage encodings.
//!
//! An [`Interval`] is a [`Range`] with a set of tags and an optional
//! annotation. It is persisted as a single data file line:
//!
//! ```text
//! inc 20200601T010000Z - 20200601T020000Z # client "deep work" # "notes here"
//! ```
//!
//! and recorded in the undo journal as compact JSON. Both encodings are exact
//! inverses of their parsers; undo replay depends on that.
//!
//! The `id` is never persisted. It is assigned when intervals are listed,
//! newest first, so any mutation of the store may change the ids of other
//! intervals.

use crate::libs::datetime::{from_iso, to_iso, Datetime, ISO_LENGTH};
use crate::libs::error::{AppError, AppResult};
use crate::libs::range::Range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interval {
    pub range: Range,
    /// Position in the newest-first listing, 0 when unassigned.
    pub id: usize,
    /// Produced by applying exclusions to a stored interval; not stored verbatim.
    pub synthetic: bool,
    pub annotation: String,
    tags: BTreeSet<String>,
}

/// JSON shape of an interval inside undo records.
#[derive(Debug, Default, Serialize, Deserialize)]
struct IntervalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    annotation: String,
}

impl Interval {
    pub fn new(range: Range) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(range: Range, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut interval = Self::new(range);
        interval.tag_all(tags);
        interval
    }

    pub fn start(&self) -> Option<Datetime> {
        self.range.start
    }

    pub fn end(&self) -> Option<Datetime> {
        self.range.end
    }

    pub fn is_open(&self) -> bool {
        self.range.is_open()
    }

    /// True when the interval carries no range, tags or annotation.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty() && self.tags.is_empty() && self.annotation.is_empty()
    }

    pub fn set_range(&mut self, range: Range) {
        self.range = range;
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn tag_all<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.tag(tag);
        }
    }

    /// Removing an absent tag is a no-op.
    pub fn untag(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    /// The canonical data file line for this interval.
    pub fn serialize(&self) -> String {
        let mut out = String::from("inc");

        if let Some(start) = &self.range.start {
            out.push(' ');
            out.push_str(&to_iso(start));
        }

        if let Some(end) = &self.range.end {
            out.push_str(" - ");
            out.push_str(&to_iso(end));
        }

        if !self.tags.is_empty() || !self.annotation.is_empty() {
            out.push_str(" #");
            for tag in &self.tags {
                out.push(' ');
                out.push_str(&quote_if_needed(tag));
            }
        }

        if !self.annotation.is_empty() {
            out.push_str(" # ");
            out.push_str(&quote(&self.annotation));
        }

        out
    }

    /// Parses a data file line.
    ///
    /// Syntax: `inc [<iso> [- <iso>]] [# [<tag> ...] [# <annotation>]]`
    pub fn from_serialization(line: &str) -> AppResult<Self> {
        let tokens = tokenize(line)?;
        let mut cursor = tokens.iter().peekable();

        match cursor.next() {
            Some(token) if token.is_word("inc") => {}
            _ => return Err(AppError::parse(line, "expected 'inc'")),
        }

        let mut interval = Interval::default();

        if let Some(token) = cursor.next_if(|t| !t.quoted && t.text.len() == ISO_LENGTH) {
            interval.range.start = Some(from_iso(&token.text).map_err(|e| AppError::parse(line, e.to_string()))?);

            if cursor.next_if(|t| t.is_word("-")).is_some() {
                let end = cursor.next().ok_or_else(|| AppError::parse(line, "missing end after '-'"))?;
                interval.range.end = Some(from_iso(&end.text).map_err(|e| AppError::parse(line, e.to_string()))?);
            }
        }

        if cursor.next_if(|t| t.is_word("#")).is_some() {
            while let Some(token) = cursor.next_if(|t| !t.is_word("#")) {
                interval.tag(token.text.clone());
            }

            if cursor.next_if(|t| t.is_word("#")).is_some() {
                let words: Vec<&str> = cursor.by_ref().map(|t| t.text.as_str()).collect();
                interval.annotation = words.join(" ");
            }
        }

        if cursor.next().is_some() {
            return Err(AppError::parse(line, "unexpected trailing tokens"));
        }

        Ok(interval)
    }

    /// The canonical JSON form used by the undo journal.
    pub fn json(&self) -> String {
        let record = IntervalRecord {
            id: (self.id != 0).then_some(self.id),
            start: self.range.start.as_ref().map(to_iso),
            end: self.range.end.as_ref().map(to_iso),
            tags: self.tags.iter().cloned().collect(),
            annotation: self.annotation.clone(),
        };
        // A record of plain strings and numbers always serializes.
        serde_json::to_string(&record).unwrap_or_default()
    }

    /// Parses [`Interval::json`] output. An empty string is an empty interval.
    pub fn from_json(json: &str) -> AppResult<Self> {
        if json.trim().is_empty() {
            return Ok(Interval::default());
        }

        let record: IntervalRecord = serde_json::from_str(json)?;
        let parse_time = |value: Option<String>| -> AppResult<Option<Datetime>> {
            match value.as_deref() {
                None | Some("") => Ok(None),
                Some(text) => from_iso(text).map(Some),
            }
        };

        let mut interval = Interval::default();
        interval.id = record.id.unwrap_or(0);
        interval.range.start = parse_time(record.start)?;
        interval.range.end = parse_time(record.end)?;
        interval.tag_all(record.tags);
        interval.annotation = record.annotation;
        Ok(interval)
    }
}

#[derive(Debug)]
struct Token {
    text: String,
    quoted: bool,
}

impl Token {
    fn is_word(&self, word: &str) -> bool {
        !self.quoted && self.text == word
    }
}

fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.starts_with('\'')
        || value.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\' || c == '#')
}

/// Wraps `value` in double quotes.
///
/// `"` and `\` are backslash-escaped. Line breaks become `\n` and `\r` so
/// that a serialized interval always stays on one line.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quotes a tag only when it would not survive whitespace tokenizing.
pub fn quote_if_needed(value: &str) -> String {
    if needs_quotes(value) {
        quote(value)
    } else {
        value.to_string()
    }
}

fn tokenize(line: &str) -> AppResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some('n') => text.push('\n'),
                        Some('r') => text.push('\r'),
                        Some(escaped) => text.push(escaped),
                        None => return Err(AppError::parse(line, "dangling escape")),
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => text.push(c),
                }
            }
            if !closed {
                return Err(AppError::parse(line, "unterminated quote"));
            }
            tokens.push(Token { text, quoted: true });
        } else {
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
            tokens.push(Token { text, quoted: false });
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::datetime::parse_input;

    fn closed(start: &str, end: &str) -> Interval {
        Interval::new(Range::new(parse_input(start).unwrap(), parse_input(end).unwrap()))
    }

    #[test]
    fn serializes_closed_interval_with_tags() {
        let interval = Interval::with_tags(closed("2020-06-01T01:00", "2020-06-01T02:00").range, ["foo", "bar"]);
        assert_eq!(interval.serialize(), "inc 20200601T010000Z - 20200601T020000Z # bar foo");
    }

    #[test]
    fn serializes_open_interval() {
        let interval = Interval::new(Range::open_from(parse_input("2020-06-01T01:00").unwrap()));
        assert_eq!(interval.serialize(), "inc 20200601T010000Z");
    }

    #[test]
    fn annotation_without_tags_keeps_empty_tag_section() {
        let mut interval = closed("2020-06-01T01:00", "2020-06-01T02:00");
        interval.annotation = "call with #team".to_string();
        assert_eq!(interval.serialize(), "inc 20200601T010000Z - 20200601T020000Z # # \"call with #team\"");
        assert_eq!(Interval::from_serialization(&interval.serialize()).unwrap(), interval);
    }

    #[test]
    fn awkward_tags_round_trip() {
        let mut interval = closed("2020-06-01T01:00", "2020-06-01T02:00");
        interval.tag_all(["two words", "quote\"inside", "#", "-", "back\\slash", "", "'single"]);
        interval.annotation = "  spaced  \"out\" ".to_string();

        let line = interval.serialize();
        assert_eq!(Interval::from_serialization(&line).unwrap(), interval);
        assert_eq!(Interval::from_json(&interval.json()).unwrap(), interval);
    }

    #[test]
    fn line_breaks_stay_on_one_line() {
        let mut interval = closed("2020-06-01T01:00", "2020-06-01T02:00");
        interval.tag("two\nlines");
        interval.annotation = "line one\r\nline two".to_string();

        let line = interval.serialize();
        assert_eq!(
            line,
            "inc 20200601T010000Z - 20200601T020000Z # \"two\\nlines\" # \"line one\\r\\nline two\""
        );
        assert_eq!(line.lines().count(), 1);
        assert_eq!(Interval::from_serialization(&line).unwrap(), interval);
    }

    #[test]
    fn tag_and_untag_are_idempotent() {
        let mut interval = Interval::default();
        interval.tag("foo");
        interval.tag("foo");
        assert_eq!(interval.tags().len(), 1);
        interval.untag("bar");
        interval.untag("foo");
        interval.untag("foo");
        assert!(interval.tags().is_empty());
    }

    #[test]
    fn rejects_unrecognizable_lines() {
        assert!(Interval::from_serialization("exc monday <8:00").is_err());
        assert!(Interval::from_serialization("inc 20200601T010000Z - nonsense").is_err());
        assert!(Interval::from_serialization("inc 20200601T010000Z # \"open").is_err());
        assert!(Interval::from_serialization("").is_err());
    }

    #[test]
    fn json_omits_unset_fields() {
        let interval = Interval::new(Range::open_from(parse_input("2020-06-01T01:00").unwrap()));
        assert_eq!(interval.json(), r#"{"start":"20200601T010000Z"}"#);
        assert_eq!(Interval::from_json("").unwrap(), Interval::default());
        assert_eq!(Interval::from_json(r#"{"start":"20200601T010000Z","end":""}"#).unwrap(), interval);
    }

    #[test]
    fn json_keeps_id_when_assigned() {
        let mut interval = closed("2020-06-01T01:00", "2020-06-01T02:00");
        interval.id = 3;
        interval.tag("foo");
        let json = interval.json();
        assert_eq!(json, r#"{"id":3,"start":"20200601T010000Z","end":"20200601T020000Z","tags":["foo"]}"#);
        assert_eq!(Interval::from_json(&json).unwrap(), interval);
    }
}
