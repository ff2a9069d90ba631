// ABOUTME: TaggingClient - bearer-authenticated HTTP client for the tagging
// ABOUTME: backend. Every call draws its token from the shared coordinator.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    ApiMessage, CurrentUser, DaemonStatus, Document, Drive, ErrorDetail, FeedbackEntry,
    FeedbackSubmission, Folder, Site, TagOptions, TagResult, TagSet, UploadResult, UploadTarget,
};
use crate::auth::{AccessToken, TokenCoordinator, TokenOutcome};
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Client for the tagging backend.
///
/// Cheap to clone; clones share the HTTP connection pool and the token
/// coordinator, so concurrent calls never trigger more than one sign-in.
#[derive(Clone)]
pub struct TaggingClient {
    base_url: String,
    http: reqwest::Client,
    tokens: Arc<TokenCoordinator>,
}

impl TaggingClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenCoordinator>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            tokens,
        }
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &ClientConfig, tokens: Arc<TokenCoordinator>) -> Self {
        Self::new(config.api_base_url.clone(), tokens)
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenCoordinator> {
        &self.tokens
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Fetch the signed-in user's profile and roles.
    pub async fn me(&self) -> Result<CurrentUser, ApiError> {
        self.get_json("/me-jwt", &[]).await
    }

    // ------------------------------------------------------------------
    // Tagging
    // ------------------------------------------------------------------

    /// Ask the backend to suggest tags for a document.
    pub async fn tag_document(
        &self,
        document: &Document,
        options: &TagOptions,
    ) -> Result<TagResult, ApiError> {
        options.validate()?;

        let form = Form::new()
            .part("file", file_part(document)?)
            .text("mode", options.mode.form_value())
            .text("custom_prompt", options.mode.prompt().to_string())
            .text("num_tags", options.num_tags.to_string());

        let request = self.request(Method::POST, "/tag").multipart(form);
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    /// Upload a document with its tags to a configured target.
    pub async fn upload_to_sharepoint(
        &self,
        document: &Document,
        tags: &TagSet,
        target_label: &str,
    ) -> Result<UploadResult, ApiError> {
        if target_label.trim().is_empty() {
            return Err(ApiError::InvalidInput("an upload target is required".into()));
        }

        let form = Form::new()
            .part("file", file_part(document)?)
            .text("tags", tags.joined())
            .text("upload_target_label", target_label.to_string());

        let request = self
            .request(Method::POST, "/upload-to-sharepoint")
            .multipart(form);
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    // ------------------------------------------------------------------
    // Feedback
    // ------------------------------------------------------------------

    /// Record feedback about a document's tags.
    pub async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<(), ApiError> {
        feedback.validate()?;
        let request = self.request(Method::POST, "/feedback").json(feedback);
        self.execute(request).await?;
        Ok(())
    }

    /// List all feedback. Admin only.
    pub async fn list_feedback(&self) -> Result<Vec<FeedbackEntry>, ApiError> {
        self.get_json("/admin/feedback", &[]).await
    }

    // ------------------------------------------------------------------
    // Upload targets (admin)
    // ------------------------------------------------------------------

    pub async fn list_upload_targets(&self) -> Result<Vec<UploadTarget>, ApiError> {
        self.get_json("/admin/upload-targets", &[]).await
    }

    /// Add a target. The backend rejects duplicate labels with 409.
    pub async fn add_upload_target(&self, target: &UploadTarget) -> Result<ApiMessage, ApiError> {
        target.validate()?;
        let request = self
            .request(Method::POST, "/admin/upload-targets")
            .json(target);
        Ok(self.execute(request).await?.json().await?)
    }

    pub async fn delete_upload_target(&self, label: &str) -> Result<ApiMessage, ApiError> {
        let request = self
            .request(Method::DELETE, "/admin/upload-targets")
            .query(&[("label", label)]);
        Ok(self.execute(request).await?.json().await?)
    }

    /// Include or exclude a target from background scans.
    pub async fn set_upload_target_enabled(
        &self,
        label: &str,
        enabled: bool,
    ) -> Result<ApiMessage, ApiError> {
        let enabled = if enabled { "true" } else { "false" };
        let request = self
            .request(Method::PATCH, "/admin/upload-targets/enabled")
            .query(&[("label", label), ("enabled", enabled)]);
        Ok(self.execute(request).await?.json().await?)
    }

    /// Background scan status, keyed by target label.
    pub async fn daemon_status(&self) -> Result<HashMap<String, DaemonStatus>, ApiError> {
        self.get_json("/admin/upload-targets/status", &[]).await
    }

    // ------------------------------------------------------------------
    // Site browser (admin)
    // ------------------------------------------------------------------

    /// Resolve a site URL such as `https://contoso.sharepoint.com/sites/HR`.
    pub async fn resolve_site(&self, site_url: &str) -> Result<Site, ApiError> {
        self.get_json("/graph/resolve-site", &[("url", site_url)])
            .await
    }

    pub async fn list_drives(&self, site_id: &str) -> Result<Vec<Drive>, ApiError> {
        self.get_json("/graph/drives", &[("siteId", site_id)]).await
    }

    /// Every folder of a drive, root first.
    pub async fn list_folders(&self, site_id: &str, drive_id: &str) -> Result<Vec<Folder>, ApiError> {
        self.get_json(
            "/graph/folders",
            &[("siteId", site_id), ("driveId", drive_id)],
        )
        .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, path).query(query);
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    /// Obtain a token, or bail out without touching the network.
    async fn bearer(&self) -> Result<AccessToken, ApiError> {
        match self.tokens.acquire_outcome().await? {
            TokenOutcome::Token(token) => Ok(token),
            outcome => {
                debug!(%outcome, "no token available, skipping backend call");
                Err(ApiError::SignInPending(outcome))
            }
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let token = self.bearer().await?;
        let response = request
            .header("Authorization", token.bearer())
            .send()
            .await?;

        let status = response.status();
        debug!(url = %response.url().path(), status = status.as_u16(), "backend responded");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        warn!(status = status.as_u16(), %message, "backend call failed");
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn file_part(document: &Document) -> Result<Part, ApiError> {
    Ok(Part::bytes(document.bytes.clone())
        .file_name(document.filename.clone())
        .mime_str("application/octet-stream")?)
}

/// The backend's `detail` field when present, else the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(ErrorDetail {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorDetail { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
