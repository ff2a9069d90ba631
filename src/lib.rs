// ABOUTME: Root module for doctagger - client library for the tagging service.
// ABOUTME: Auth, backend API, configuration, and current-user modules.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod user;

pub use error::DocTaggerError;
