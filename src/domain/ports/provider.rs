//! Provider Port
//!
//! Uniform interface every chain stage implements, whether it talks to a
//! remote API or reads the built-in place table.

use async_trait::async_trait;

/// Why a single provider attempt failed.
///
/// Every variant is absorbed by the fallback chain and turned into an attempt
/// on the next stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("timed out")]
    Timeout,

    #[error("http status {status}")]
    Http { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Short failure class used in logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Http { .. } => "http",
            Self::Malformed(_) => "malformed",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

/// One stage of a capability chain.
///
/// Implementations must not retry internally and must not apply their own
/// deadline; the chain bounds each attempt.
#[async_trait]
pub trait Provider<Req, Out>: Send + Sync
where
    Req: Send + Sync,
    Out: Send,
{
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    /// Make a single attempt.
    async fn attempt(&self, req: &Req) -> Result<Out, ProviderError>;
}
