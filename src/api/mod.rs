// ABOUTME: API module - typed client for the tagging backend endpoints.
// ABOUTME: Defines wire types, the authenticated client, and the location wizard.

mod client;
mod location;
mod types;

pub use client::*;
pub use location::*;
pub use types::*;

#[cfg(test)]
pub(crate) mod fake_backend;
