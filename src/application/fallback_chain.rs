//! Fallback Chain - ordered provider attempts
//!
//! Tries each stage once, in the order it was added, until one produces an
//! acceptable answer. Every attempt is bounded by the chain's timeout.

use crate::domain::ports::{Provider, ProviderError};
use crate::domain::value_objects::Capability;
use std::sync::Arc;
use std::time::Duration;

/// Every stage of a chain failed or was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("{capability}: all {attempts} providers failed")]
    Exhausted {
        capability: Capability,
        attempts: usize,
    },
}

/// Fixed-order list of providers for one capability.
pub struct FallbackChain<Req, Out> {
    capability: Capability,
    stages: Vec<Arc<dyn Provider<Req, Out>>>,
    timeout: Duration,
    accept: fn(&Out) -> bool,
}

impl<Req, Out> FallbackChain<Req, Out>
where
    Req: Send + Sync,
    Out: Send,
{
    /// Empty chain. Every result is accepted until [`accept_when`] says
    /// otherwise.
    ///
    /// [`accept_when`]: Self::accept_when
    pub fn new(capability: Capability, timeout: Duration) -> Self {
        Self {
            capability,
            stages: Vec::new(),
            timeout,
            accept: |_| true,
        }
    }

    /// Append a stage.
    pub fn with_stage(mut self, provider: Arc<dyn Provider<Req, Out>>) -> Self {
        self.stages.push(provider);
        self
    }

    /// Treat successful results failing `accept` as misses.
    pub fn accept_when(mut self, accept: fn(&Out) -> bool) -> Self {
        self.accept = accept;
        self
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Stage names in attempt order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the chain. No stage is attempted twice.
    pub async fn run(&self, req: &Req) -> Result<Out, ChainError> {
        for stage in &self.stages {
            let outcome = match tokio::time::timeout(self.timeout, stage.attempt(req)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ProviderError::Timeout),
            };

            match outcome {
                Ok(out) if (self.accept)(&out) => {
                    tracing::debug!("{} answered by {}", self.capability, stage.name());
                    return Ok(out);
                }
                Ok(_) => {
                    tracing::warn!(
                        "{} provider {} failed (rejected): result not usable",
                        self.capability,
                        stage.name()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "{} provider {} failed ({}): {}",
                        self.capability,
                        stage.name(),
                        e.class(),
                        e
                    );
                }
            }
        }

        Err(ChainError::Exhausted {
            capability: self.capability,
            attempts: self.stages.len(),
        })
    }
}
