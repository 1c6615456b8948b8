//! Notify router implementations

mod broadcast;

pub use broadcast::BroadcastNotifyRouter;
