//! Team state synchronization
//!
//! Keeps an authoritative, cached view of each team projected from its
//! verified signed chain and reacts to server push events:
//! - key rotation requests, skipped when already stale
//! - membership change and deletion notifications, applied in order
//! - invite acceptance claims, verified against the chain per invite
//!   category before the membership change is committed
//!
//! Every collaborator is injected through [`TeamSyncEnv`] and every
//! operation takes a [`CancellationToken`](tokio_util::sync::CancellationToken).

pub mod config;
pub mod domain;
pub mod env;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use env::{TeamSyncEnv, TeamSyncEnvBuilder};
