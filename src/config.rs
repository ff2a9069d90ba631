// ABOUTME: Client configuration loaded from DOCTAGGER_* environment variables.
// ABOUTME: Resolves API base URL, sign-in settings, and the interaction mode.

use reqwest::Url;

use crate::auth::{InteractionMode, TokenRequest};
use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:5173";

/// Settings for the backend API and the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// Scope that grants access to the backend API.
    pub api_scope: String,
    /// Application (client) id registered with the identity provider.
    pub client_id: String,
    pub authority: String,
    /// Origin the app is served from.
    pub app_origin: String,
    pub interaction_mode: InteractionMode,
}

impl ClientConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base_url = read("DOCTAGGER_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&api_base_url).map_err(|_| ConfigError::Invalid {
            key: "DOCTAGGER_API_BASE_URL",
            value: api_base_url.clone(),
        })?;

        let api_scope = read("DOCTAGGER_API_SCOPE").ok_or(ConfigError::Missing("DOCTAGGER_API_SCOPE"))?;
        let client_id = read("DOCTAGGER_CLIENT_ID").ok_or(ConfigError::Missing("DOCTAGGER_CLIENT_ID"))?;
        let authority = read("DOCTAGGER_AUTHORITY").unwrap_or_else(|| DEFAULT_AUTHORITY.to_string());

        let app_origin = read("DOCTAGGER_APP_ORIGIN")
            .unwrap_or_else(|| DEFAULT_APP_ORIGIN.to_string())
            .trim_end_matches('/')
            .to_string();
        let origin_url = Url::parse(&app_origin).map_err(|_| ConfigError::Invalid {
            key: "DOCTAGGER_APP_ORIGIN",
            value: app_origin.clone(),
        })?;

        let interaction_mode = match read("DOCTAGGER_INTERACTION_MODE") {
            Some(value) => InteractionMode::parse(&value).ok_or(ConfigError::Invalid {
                key: "DOCTAGGER_INTERACTION_MODE",
                value,
            })?,
            None => InteractionMode::for_host(origin_url.host_str().unwrap_or_default()),
        };

        Ok(Self {
            api_base_url,
            api_scope,
            client_id,
            authority,
            app_origin,
            interaction_mode,
        })
    }

    /// Where the identity provider sends the browser after sign-in.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.app_origin)
    }

    /// The provider's authorization endpoint for an interactive sign-in.
    pub fn authorize_url(&self) -> Result<Url, ConfigError> {
        let endpoint = format!(
            "{}/oauth2/v2.0/authorize",
            self.authority.trim_end_matches('/')
        );
        Url::parse_with_params(
            &endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri().as_str()),
                ("scope", self.api_scope.as_str()),
            ],
        )
        .map_err(|_| ConfigError::Invalid {
            key: "DOCTAGGER_AUTHORITY",
            value: self.authority.clone(),
        })
    }

    /// Token request for the backend API scope.
    pub fn token_request(&self) -> TokenRequest {
        TokenRequest::new([self.api_scope.clone()])
    }
}
