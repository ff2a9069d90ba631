// ABOUTME: Current-user resolution - a provisional identity from the signed-in
// ABOUTME: account, enriched with roles from the backend when a token is available.

use tracing::warn;

use crate::api::{CurrentUser, TaggingClient};
use crate::error::ApiError;

/// What the app knows about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserState {
    /// Best known identity; `None` while nothing is known yet.
    pub user: Option<CurrentUser>,
    /// Why enrichment from the backend failed, if it did.
    pub error: Option<String>,
}

impl UserState {
    /// Admin pages are only offered to users the backend confirmed as admins.
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// Resolve the current user.
///
/// Starts from the active (or first known) account with no admin rights, then
/// asks `/me-jwt` for the authoritative profile. If no token is available the
/// provisional user is kept silently; any other failure keeps it and records
/// the error.
pub async fn load_current_user(client: &TaggingClient) -> UserState {
    let session = client.tokens().session();
    let account = session
        .active_account()
        .or_else(|| session.all_accounts().into_iter().next());

    let mut state = UserState {
        user: account.as_ref().map(CurrentUser::from_account),
        error: None,
    };

    match client.me().await {
        Ok(user) => state.user = Some(user),
        Err(ApiError::SignInPending(_)) => {}
        Err(e) => {
            warn!(error = %e, "user enrichment failed");
            state.error = Some(e.to_string());
        }
    }

    state
}
