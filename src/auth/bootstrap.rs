// ABOUTME: Start-up sign-in handling - settles a returning redirect and picks
// ABOUTME: the active account before any page asks for a token.

use tracing::{info, warn};

use super::{Account, IdentitySession, TokenRequest};
use crate::error::IdentityError;

/// What start-up resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    /// An account is active and the app can render.
    Ready(Account),
    /// Nobody was signed in; a redirect sign-in has been started.
    NavigationStarted,
}

/// Prepare the identity session at application start.
///
/// A pending redirect response wins; otherwise the first known account is
/// made active. With no account at all a redirect sign-in is started. A
/// failure while reading the redirect response is logged and start-up
/// carries on with the cached accounts.
pub async fn initialize(
    session: &dyn IdentitySession,
    request: &TokenRequest,
) -> Result<Startup, IdentityError> {
    match session.handle_redirect_result().await {
        Ok(Some(account)) => {
            info!(username = %account.username, "signed in via redirect");
            session.set_active_account(Some(account.clone()));
            return Ok(Startup::Ready(account));
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "failed to process redirect response"),
    }

    if let Some(account) = session.all_accounts().into_iter().next() {
        session.set_active_account(Some(account.clone()));
        return Ok(Startup::Ready(account));
    }

    info!("no cached account, redirecting to sign-in");
    session.acquire_token_redirect(request, None).await?;
    Ok(Startup::NavigationStarted)
}

/// Sign out the active (or first known) account.
pub async fn sign_out(session: &dyn IdentitySession) -> Result<(), IdentityError> {
    let account = session
        .active_account()
        .or_else(|| session.all_accounts().into_iter().next());
    session.sign_out(account.as_ref()).await?;
    session.set_active_account(None);
    Ok(())
}
