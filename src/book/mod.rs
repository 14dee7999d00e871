//! Order-book state maintenance
//!
//! `merge` applies snapshots and diffs; `history` keeps the last N states.

pub mod history;
pub mod merge;

pub use history::BookHistory;
pub use merge::{apply_diff, apply_snapshot, BookEngine};
