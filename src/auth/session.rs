// ABOUTME: Defines the IdentitySession trait - the seam between the token
// ABOUTME: coordinator and whatever identity library holds the accounts.

use async_trait::async_trait;

use super::{AccessToken, Account, TokenRequest};
use crate::error::IdentityError;

/// Account state and token operations of an identity library.
///
/// Implementations own the token cache and the active-account selection.
/// Each token operation may fail with [`IdentityError::InteractionRequired`]
/// or [`IdentityError::InteractionInProgress`], which callers treat
/// differently from other failures.
#[async_trait]
pub trait IdentitySession: Send + Sync {
    /// The currently selected account, if any.
    fn active_account(&self) -> Option<Account>;

    /// Every account the session knows about.
    fn all_accounts(&self) -> Vec<Account>;

    /// Change the selected account.
    fn set_active_account(&self, account: Option<Account>);

    /// Renew a credential from cache or refresh token, without user interaction.
    async fn acquire_token_silent(
        &self,
        request: &TokenRequest,
        account: &Account,
    ) -> Result<AccessToken, IdentityError>;

    /// Run an interactive sign-in in a dialog and return its credential.
    ///
    /// `account` is `None` when nobody has signed in yet.
    async fn acquire_token_popup(
        &self,
        request: &TokenRequest,
        account: Option<&Account>,
    ) -> Result<AccessToken, IdentityError>;

    /// Start an interactive sign-in that navigates away.
    ///
    /// Returning `Ok(())` means navigation has begun; no credential follows.
    async fn acquire_token_redirect(
        &self,
        request: &TokenRequest,
        account: Option<&Account>,
    ) -> Result<(), IdentityError>;

    /// Process the response of a redirect sign-in that landed on this page.
    ///
    /// Returns the signed-in account, or `None` when this start-up was not a
    /// redirect return.
    async fn handle_redirect_result(&self) -> Result<Option<Account>, IdentityError> {
        Ok(None)
    }

    /// Sign an account out.
    async fn sign_out(&self, account: Option<&Account>) -> Result<(), IdentityError>;
}
