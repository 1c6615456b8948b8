//! Team membership roles and change requests

mod request;
mod role;

pub use request::MembershipChangeRequest;
pub use role::TeamRole;
