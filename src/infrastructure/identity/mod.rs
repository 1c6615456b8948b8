//! Identity resolver implementations

mod in_memory;

pub use in_memory::InMemoryIdentityResolver;
