//! In-memory identity resolver

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::{DomainError, IdentifyRequest, IdentityResolver};

/// Resolver backed by a fixed set of assertions whose proofs are considered
/// valid. Every other assertion fails verification.
#[derive(Debug, Default)]
pub struct InMemoryIdentityResolver {
    proven: RwLock<HashSet<String>>,
    requests: RwLock<Vec<IdentifyRequest>>,
}

impl InMemoryIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proven(self, assertion: impl Into<String>) -> Self {
        self.add_proven(assertion);
        self
    }

    pub fn add_proven(&self, assertion: impl Into<String>) {
        if let Ok(mut proven) = self.proven.write() {
            proven.insert(assertion.into());
        }
    }

    /// Requests seen so far, in call order
    pub fn requests(&self) -> Vec<IdentifyRequest> {
        self.requests.read().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn resolve_and_verify(
        &self,
        req: &IdentifyRequest,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        if cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }

        self.requests
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))?
            .push(req.clone());

        let proven = self
            .proven
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))?
            .contains(&req.assertion);

        debug!(assertion = %req.assertion, proven, "Resolved assertion");

        if proven {
            Ok(())
        } else {
            Err(DomainError::verification_failed(format!(
                "No valid proof for assertion '{}'",
                req.assertion
            )))
        }
    }
}
