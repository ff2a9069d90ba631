// ABOUTME: Defines all error types for the doctagger library using thiserror.
// ABOUTME: Each subsystem has its own error enum, unified under DocTaggerError.

use crate::auth::TokenOutcome;

/// Top-level error type for the doctagger library.
#[derive(Debug, thiserror::Error)]
pub enum DocTaggerError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Errors reported by an identity session.
///
/// Cloneable so a single acquisition outcome can be handed to every caller
/// that joined it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// Silent renewal cannot succeed without the user (consent, login, expired session).
    #[error("Interaction required: {reason}")]
    InteractionRequired { reason: String },

    /// Another interactive sign-in already owns the UI.
    #[error("An interactive sign-in is already in progress")]
    InteractionInProgress,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Identity provider error ({code}): {message}")]
    Provider { code: String, message: String },

    /// The user dismissed the interactive prompt.
    #[error("Sign-in cancelled by user")]
    Cancelled,
}

impl IdentityError {
    /// Build an interaction-required error with the given reason.
    pub fn interaction_required(reason: impl Into<String>) -> Self {
        Self::InteractionRequired {
            reason: reason.into(),
        }
    }
}

/// Unrecoverable failures from the token coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Silent token renewal failed: {0}")]
    Silent(#[source] IdentityError),

    #[error("Interactive sign-in failed: {0}")]
    Interactive(#[source] IdentityError),

    /// The acquisition task died before producing an outcome.
    #[error("Token acquisition aborted: {0}")]
    Aborted(String),
}

impl AuthError {
    /// The identity-session error behind this failure, if there was one.
    pub fn identity_error(&self) -> Option<&IdentityError> {
        match self {
            AuthError::Silent(e) | AuthError::Interactive(e) => Some(e),
            AuthError::Aborted(_) => None,
        }
    }
}

/// Errors from tagging backend calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// No token is available right now; the caller should skip the action.
    #[error("Sign-in pending: {0}")]
    SignInPending(TokenOutcome),

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True when the call was skipped because no token could be obtained
    /// without disturbing the user.
    pub fn is_sign_in_pending(&self) -> bool {
        matches!(self, ApiError::SignInPending(_))
    }
}

/// Errors while loading client configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
