//! # Tempo - interval based time tracking
//!
//! Tempo records tagged time intervals in plain text month files and keeps an
//! undo journal of every change.
//!
//! ## Features
//!
//! - **Interval Store**: one sorted `YYYY-MM.data` file per month, written
//!   atomically
//! - **Undo**: every command is one journal transaction that can be reverted
//! - **Filters**: select intervals by id, time range and tags
//! - **Exclusions**: configured off hours split tracked time into pieces
//! - **Tag Counters**: usage counts for every tag
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tempo::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
