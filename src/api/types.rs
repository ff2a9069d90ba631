// ABOUTME: Wire types for the tagging backend - users, tagging, feedback,
// ABOUTME: upload targets, and the site/drive/folder browser.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Account;
use crate::error::ApiError;

/// Tag counts offered when tagging a document.
pub const TAG_COUNT_CHOICES: [u32; 6] = [3, 5, 7, 10, 15, 20];

/// Tag count used when the caller does not choose one.
pub const DEFAULT_TAG_COUNT: u32 = 5;

/// The signed-in user as reported by `/me-jwt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Tenant id.
    #[serde(default, alias = "tenantId")]
    pub tid: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl CurrentUser {
    /// A provisional user built from the identity account, before the
    /// backend has confirmed roles.
    pub fn from_account(account: &Account) -> Self {
        Self {
            name: Some(account.display_name().to_string()),
            email: Some(account.username.clone()),
            tid: account.tenant_id.clone(),
            is_admin: false,
            groups: Vec::new(),
        }
    }
}

/// How the backend should derive tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagMode {
    #[default]
    Keywords,
    Topics,
    /// Free-form instructions for the tagger.
    CustomPrompt(String),
}

impl TagMode {
    /// Value of the `mode` form field.
    pub fn form_value(&self) -> &'static str {
        match self {
            TagMode::Keywords => "Keywords",
            TagMode::Topics => "Topics",
            TagMode::CustomPrompt(_) => "Custom Prompt",
        }
    }

    /// Value of the `custom_prompt` form field.
    pub fn prompt(&self) -> &str {
        match self {
            TagMode::CustomPrompt(prompt) => prompt.as_str(),
            _ => "",
        }
    }
}

/// Options for a `/tag` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOptions {
    pub mode: TagMode,
    pub num_tags: u32,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            mode: TagMode::default(),
            num_tags: DEFAULT_TAG_COUNT,
        }
    }
}

impl TagOptions {
    pub fn mode(mut self, mode: TagMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn num_tags(mut self, num_tags: u32) -> Self {
        self.num_tags = num_tags;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if !TAG_COUNT_CHOICES.contains(&self.num_tags) {
            return Err(ApiError::InvalidInput(format!(
                "num_tags must be one of {:?}, got {}",
                TAG_COUNT_CHOICES, self.num_tags
            )));
        }
        if let TagMode::CustomPrompt(prompt) = &self.mode {
            if prompt.trim().is_empty() {
                return Err(ApiError::InvalidInput(
                    "custom prompt mode needs a prompt".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A document to send to the backend.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk, named after its file name.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ApiError::InvalidInput(format!("not a file: {}", path.display())))?;
        Ok(Self { filename, bytes })
    }
}

/// Tags suggested for a document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TagResult {
    #[serde(default)]
    pub tags: Vec<String>,
    /// Extracted text preview, when the backend returns one.
    #[serde(default)]
    pub text: Option<String>,
}

/// An editable, duplicate-free list of tags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag. Whitespace is trimmed; empty and duplicate tags are ignored.
    ///
    /// Returns `true` if the tag was added.
    pub fn add(&mut self, tag: &str) -> bool {
        let clean = tag.trim();
        if clean.is_empty() || self.0.iter().any(|t| t == clean) {
            return false;
        }
        self.0.push(clean.to_string());
        true
    }

    /// Remove the tag at `index`, if present.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The `tags` form field: tags joined with ", ".
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.add(tag.as_ref());
        }
        set
    }
}

impl From<TagResult> for TagSet {
    fn from(result: TagResult) -> Self {
        result.tags.iter().collect()
    }
}

/// The item created by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedItem {
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `/upload-to-sharepoint`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub item: Option<UploadedItem>,
}

impl UploadResult {
    pub fn web_url(&self) -> Option<&str> {
        self.item.as_ref()?.web_url.as_deref()
    }
}

/// Feedback about the tags produced for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackSubmission {
    pub filename: String,
    /// 1 to 5.
    pub rating: u8,
    pub comment: String,
}

impl FeedbackSubmission {
    pub fn new(filename: impl Into<String>, rating: u8, comment: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            rating,
            comment: comment.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ApiError::InvalidInput(format!(
                "rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        if self.filename.trim().is_empty() {
            return Err(ApiError::InvalidInput("filename is required".into()));
        }
        Ok(())
    }
}

/// A stored feedback row from `/admin/feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedbackEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub filename: String,
    /// Stored as text by the backend; `None` when it is not a number.
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<u8>,
    #[serde(default)]
    pub comment: String,
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => u8::try_from(n).ok(),
        Raw::Text(s) => s.trim().parse().ok(),
        Raw::Null => None,
    })
}

/// A destination library folder that documents can be uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    /// Unique, human-friendly name.
    pub label: String,
    pub site_id: String,
    pub drive_id: String,
    /// Folder path inside the drive; empty for the root.
    pub folder: String,
    /// Whether background scans include this target. Missing means enabled.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl UploadTarget {
    pub fn new(
        label: impl Into<String>,
        site_id: impl Into<String>,
        drive_id: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            site_id: site_id.into(),
            drive_id: drive_id.into(),
            folder: folder.into(),
            enabled: true,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check that every field the backend requires is filled in.
    ///
    /// An empty folder is the drive root and is accepted.
    pub fn validate(&self) -> Result<(), ApiError> {
        let missing: Vec<&str> = [
            ("label", &self.label),
            ("siteId", &self.site_id),
            ("driveId", &self.drive_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

impl fmt::Display for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let folder = if self.folder.is_empty() { "/" } else { &self.folder };
        write!(
            f,
            "{} [{}] {} -> {} -> {}",
            self.label,
            if self.enabled { "enabled" } else { "disabled" },
            self.site_id,
            self.drive_id,
            folder
        )
    }
}

/// Background scan status for one upload target.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DaemonStatus {
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub files_processed: Option<u64>,
    /// Last scan that finished without error.
    #[serde(default)]
    pub last_success: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

/// A resolved site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// A document library inside a site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Drive {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A folder inside a drive. The root has an empty path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Folder {
    pub name: String,
    pub path: String,
}

/// Plain `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub detail: serde_json::Value,
}
