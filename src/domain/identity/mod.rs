//! Identity resolution contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[cfg(test)]
use mockall::automock;

use crate::domain::DomainError;

/// How the resolver should surface identify results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifyBehavior {
    #[default]
    Default,
    /// Background identify on behalf of chat and team plumbing; proof
    /// failures are hard errors and nothing is shown interactively
    ChatGui,
}

/// Request to resolve an assertion and verify its proofs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyRequest {
    pub assertion: String,
    pub reason: String,
    pub can_suppress_ui: bool,
    pub use_delegate_ui: bool,
    pub behavior: IdentifyBehavior,
}

impl IdentifyRequest {
    pub fn new(assertion: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            assertion: assertion.into(),
            reason: reason.into(),
            can_suppress_ui: false,
            use_delegate_ui: false,
            behavior: IdentifyBehavior::Default,
        }
    }

    pub fn with_can_suppress_ui(mut self, can_suppress_ui: bool) -> Self {
        self.can_suppress_ui = can_suppress_ui;
        self
    }

    pub fn with_behavior(mut self, behavior: IdentifyBehavior) -> Self {
        self.behavior = behavior;
        self
    }
}

/// Resolves assertions like `alice@twitter+uid:...` to a user and verifies
/// the backing proofs. Any error is a verification failure for the caller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug {
    async fn resolve_and_verify(
        &self,
        req: &IdentifyRequest,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError>;
}
