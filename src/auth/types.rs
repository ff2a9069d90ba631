// ABOUTME: Core auth types - accounts, access tokens, token requests,
// ABOUTME: interaction modes, and the outcome of a token acquisition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque bearer credential.
///
/// The identity session owns caching and expiry; this type only carries the
/// string through to the `Authorization` header. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token string.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} bytes redacted>)", self.0.len())
    }
}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccessToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A principal resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable subject identifier.
    pub home_account_id: String,
    /// Display name, when the provider supplied one.
    #[serde(default)]
    pub name: Option<String>,
    /// Email-like sign-in name.
    pub username: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl Account {
    pub fn new(home_account_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            home_account_id: home_account_id.into(),
            name: None,
            username: username.into(),
            tenant_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Name to show the user: display name, falling back to username.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

/// Scopes requested for the backend API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenRequest {
    pub scopes: Vec<String>,
}

impl TokenRequest {
    pub fn new(scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a scope to the request.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }
}

/// How an interactive sign-in is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// A dialog that returns the token to the caller.
    Popup,
    /// A full navigation away; nothing comes back in this process.
    Redirect,
}

impl InteractionMode {
    /// Popups for local development, redirects for deployed hosts.
    pub fn for_host(host: &str) -> Self {
        if host.eq_ignore_ascii_case("localhost") {
            InteractionMode::Popup
        } else {
            InteractionMode::Redirect
        }
    }

    /// Parse a configuration value (`popup` or `redirect`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "popup" => Some(InteractionMode::Popup),
            "redirect" => Some(InteractionMode::Redirect),
            _ => None,
        }
    }
}

/// Result of one token acquisition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    /// A usable bearer credential.
    Token(AccessToken),
    /// Another interactive sign-in owns the UI; try again shortly.
    InteractionInProgress,
    /// A redirect sign-in was started; no result will arrive in this process.
    NavigationStarted,
}

impl TokenOutcome {
    pub fn token(&self) -> Option<&AccessToken> {
        match self {
            TokenOutcome::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Collapse the soft outcomes into `None`.
    pub fn into_token(self) -> Option<AccessToken> {
        match self {
            TokenOutcome::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, TokenOutcome::NavigationStarted)
    }
}

impl fmt::Display for TokenOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenOutcome::Token(_) => write!(f, "token acquired"),
            TokenOutcome::InteractionInProgress => {
                write!(f, "another sign-in is already in progress")
            }
            TokenOutcome::NavigationStarted => write!(f, "redirecting to sign-in"),
        }
    }
}
