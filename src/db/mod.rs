//! Storage engine.
//!
//! Intervals live in plain text month files under the data directory, next
//! to the undo journal and the tag counters:
//!
//! ```text
//! <root>/config.json
//! <root>/data/2020-05.data
//! <root>/data/2020-06.data
//! <root>/data/tags.data
//! <root>/data/undo.data
//! ```
//!
//! Every write is staged through the atomic write registry and only becomes
//! visible when the registry is finalized, either by [`database::Database::commit`]
//! or by closing a journal transaction.

/// Opens settings, store and journal together.
pub mod db;

/// The store across all month files.
pub mod database;

/// One month file.
pub mod datafile;

/// Undo transactions.
pub mod journal;

/// Tag usage counters.
pub mod tag_info;
