//! Per-team git repository metadata

mod entity;
mod repository;

pub use entity::{GitLocalMetadata, GitRepoMetadata, RepoId};
pub use repository::GitMetadataRepository;
