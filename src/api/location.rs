// ABOUTME: Upload location wizard - resolves a site URL, then preselects the
// ABOUTME: first drive and folder so an upload target can be drafted from it.

use tracing::{debug, warn};

use super::client::TaggingClient;
use super::types::{Drive, Folder, Site, UploadTarget};
use crate::error::ApiError;

/// A site with its drives and the folders of the selected drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub site: Site,
    pub drives: Vec<Drive>,
    /// Drive whose folders were loaded; the first drive by default.
    pub drive_id: Option<String>,
    pub folders: Vec<Folder>,
    /// Preselected folder path; the first listed folder by default.
    pub folder: Option<String>,
}

impl ResolvedLocation {
    /// Draft an upload target from the current selection.
    ///
    /// Returns `None` until a drive is selected.
    pub fn draft_target(&self, label: impl Into<String>) -> Option<UploadTarget> {
        let drive_id = self.drive_id.as_ref()?;
        Some(UploadTarget::new(
            label,
            self.site.id.clone(),
            drive_id.clone(),
            self.folder.clone().unwrap_or_default(),
        ))
    }

    /// Switch to another drive and reload its folders.
    ///
    /// On error the previous drive and folder selection are kept.
    pub async fn select_drive(
        &mut self,
        client: &TaggingClient,
        drive_id: &str,
    ) -> Result<(), ApiError> {
        if !self.drives.iter().any(|d| d.id == drive_id) {
            return Err(ApiError::InvalidInput(format!("unknown drive: {drive_id}")));
        }
        let folders = load_folders(client, &self.site.id, drive_id).await?;
        self.drive_id = Some(drive_id.to_string());
        self.folder = folders.first().map(|f| f.path.clone());
        self.folders = folders;
        Ok(())
    }

    /// Pick a folder by path from the loaded folders.
    pub fn select_folder(&mut self, path: &str) -> Result<(), ApiError> {
        if !self.folders.iter().any(|f| f.path == path) {
            return Err(ApiError::InvalidInput(format!("unknown folder: {path}")));
        }
        self.folder = Some(path.to_string());
        Ok(())
    }
}

/// Resolve a site URL into a location with defaults preselected.
///
/// Site and drive lookups must succeed. A failed folder listing is not fatal:
/// the location comes back with no folders so the caller can still pick the
/// drive root.
pub async fn resolve_location(
    client: &TaggingClient,
    site_url: &str,
) -> Result<ResolvedLocation, ApiError> {
    let site_url = site_url.trim();
    if site_url.is_empty() {
        return Err(ApiError::InvalidInput("a site URL is required".into()));
    }

    let site = client.resolve_site(site_url).await?;
    debug!(site_id = %site.id, "resolved site");
    let drives = client.list_drives(&site.id).await?;

    let mut location = ResolvedLocation {
        site,
        drives,
        drive_id: None,
        folders: Vec::new(),
        folder: None,
    };

    if let Some(first) = location.drives.first() {
        let drive_id = first.id.clone();
        location.folders = load_folders(client, &location.site.id, &drive_id).await?;
        location.folder = location.folders.first().map(|f| f.path.clone());
        location.drive_id = Some(drive_id);
    }

    Ok(location)
}

async fn load_folders(
    client: &TaggingClient,
    site_id: &str,
    drive_id: &str,
) -> Result<Vec<Folder>, ApiError> {
    match client.list_folders(site_id, drive_id).await {
        Ok(folders) => Ok(folders),
        Err(ApiError::Api { status, message }) => {
            warn!(status, %message, drive_id, "failed to list folders");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}
