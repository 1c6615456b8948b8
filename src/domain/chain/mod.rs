//! Team chain domain - verified chain state and the accessor contract

mod accessor;
mod entity;

#[cfg(test)]
pub use accessor::MockChainAccessor;
pub use accessor::ChainAccessor;
pub use entity::VerifiedChain;
