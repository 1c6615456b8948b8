//! Git metadata repository implementations

mod in_memory;

pub use in_memory::InMemoryGitMetadataRepository;
