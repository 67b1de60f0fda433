//! Observable, de-duplicated query results.
//!
//! A [`QueryCache`] owns one entry per cache key. Callers get a
//! [`QueryHandle`] that sees the entry move through
//! `Idle -> Loading -> Success | Error` until it is cancelled or dropped.

pub mod cache;
pub mod handle;
pub mod state;

pub use cache::*;
pub use handle::*;
pub use state::*;
