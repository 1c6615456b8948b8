//! Chain accessor implementations

mod in_memory;

pub use in_memory::InMemoryChainStore;
