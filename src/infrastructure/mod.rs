//! Infrastructure Layer
//!
//! Response caching and process lifecycle.

pub mod response_cache;
pub mod shutdown;

pub use response_cache::ResponseCache;
pub use shutdown::{shutdown_signal, ShutdownController};
