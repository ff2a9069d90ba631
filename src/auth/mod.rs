// ABOUTME: Auth module - identity session seam and single-flight token coordinator.
// ABOUTME: Also holds start-up sign-in handling and the shared auth types.

pub mod bootstrap;
mod coordinator;
mod session;
mod types;

pub use coordinator::*;
pub use session::*;
pub use types::*;

#[cfg(test)]
pub(crate) mod scripted_session;
