//! Place Directory Port
//!
//! Offline lookup of well-known place names.

use crate::domain::entities::Place;

/// How a query is matched against directory entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-sensitive equality or substring match
    Exact,
    /// Case-insensitive substring match
    Relaxed,
}

/// Static table of places, consulted without I/O.
pub trait PlaceDirectory: Send + Sync {
    /// Return up to `limit` entries matching `query`, in table order.
    fn find(&self, query: &str, mode: MatchMode, limit: usize) -> Vec<Place>;
}
