//! Team loader implementations

mod loader;

pub use loader::CachingTeamLoader;
