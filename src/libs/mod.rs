//! Domain types and infrastructure shared by the storage engine and the
//! commands.
//!
//! ## Features
//!
//! - **Time Algebra**: [`range`], [`interval`], [`datetime`]
//! - **Selection**: [`filter`], [`data`], [`exclusion`]
//! - **Infrastructure**: [`atomic_file`], [`config`], [`data_storage`], [`error`]
//! - **Output**: [`messages`], [`view`], [`formatter`]

pub mod atomic_file;
pub mod config;
pub mod data;
pub mod data_storage;
pub mod datetime;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod formatter;
pub mod interval;
pub mod messages;
pub mod range;
pub mod view;
