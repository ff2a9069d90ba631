// ABOUTME: Token coordinator - single-flight access token acquisition.
// ABOUTME: Concurrent callers share one silent/interactive attempt and its outcome.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{AccessToken, Account, IdentitySession, InteractionMode, TokenOutcome, TokenRequest};
use crate::error::{AuthError, IdentityError};

type Attempt = Shared<BoxFuture<'static, Result<TokenOutcome, AuthError>>>;

/// The in-flight slot. `current` is `Some` exactly while an attempt is outstanding.
#[derive(Default)]
struct InFlight {
    started: u64,
    current: Option<(u64, Attempt)>,
}

/// Single-flight coordinator for bearer credentials.
///
/// Every call site that needs a token goes through [`TokenCoordinator::acquire`].
/// When no acquisition is running, the call starts one; calls arriving while
/// it runs join it and receive the same outcome, so at most one interactive
/// sign-in is ever triggered at a time.
///
/// # Attempt Semantics
///
/// - **No account:** the interactive flow runs directly, silent renewal is skipped.
/// - **Silent first:** otherwise the active (or first known) account is renewed silently.
/// - **Interaction required:** falls back to one popup or redirect, per [`InteractionMode`].
/// - **Interaction in progress:** soft outcome, no second prompt is stacked.
/// - **Other failures:** propagate to every joined caller as [`AuthError`].
/// - **Fresh start:** the slot is cleared before any caller sees the outcome,
///   so the next call starts a new attempt instead of replaying this one.
///
/// Each attempt runs on its own tokio task, so it always runs to completion:
/// dropping or timing out every caller does not abort it, and a panicking
/// identity session settles it as [`AuthError::Aborted`].
pub struct TokenCoordinator {
    session: Arc<dyn IdentitySession>,
    request: TokenRequest,
    mode: InteractionMode,
    in_flight: Arc<Mutex<InFlight>>,
}

impl TokenCoordinator {
    /// Create a coordinator over an identity session.
    ///
    /// # Arguments
    ///
    /// * `session` - The identity session that owns accounts and the token cache.
    /// * `request` - Scopes requested on every acquisition.
    /// * `mode` - How interactive sign-in is performed.
    pub fn new(
        session: Arc<dyn IdentitySession>,
        request: TokenRequest,
        mode: InteractionMode,
    ) -> Self {
        Self {
            session,
            request,
            mode,
            in_flight: Arc::new(Mutex::new(InFlight::default())),
        }
    }

    /// The identity session this coordinator draws tokens from.
    pub fn session(&self) -> &Arc<dyn IdentitySession> {
        &self.session
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.mode
    }

    /// Get a bearer credential, or `None` when one cannot be had right now
    /// without disturbing the user further.
    ///
    /// `None` covers both soft outcomes: another sign-in owns the UI, or a
    /// redirect has been started. Use [`TokenCoordinator::acquire_outcome`] to
    /// tell them apart.
    pub async fn acquire(&self) -> Result<Option<AccessToken>, AuthError> {
        Ok(self.acquire_outcome().await?.into_token())
    }

    /// Get the full outcome of the current (or a new) acquisition attempt.
    pub async fn acquire_outcome(&self) -> Result<TokenOutcome, AuthError> {
        let attempt = {
            let mut slot = self.in_flight.lock();
            match &slot.current {
                Some((id, attempt)) => {
                    debug!(attempt = id, "joining outstanding token acquisition");
                    attempt.clone()
                }
                None => {
                    slot.started += 1;
                    let id = slot.started;
                    debug!(attempt = id, "starting token acquisition");
                    let attempt = self.start_attempt(id);
                    slot.current = Some((id, attempt.clone()));
                    attempt
                }
            }
        };

        attempt.await
    }

    /// True while an acquisition attempt is outstanding.
    pub fn is_acquiring(&self) -> bool {
        self.in_flight.lock().current.is_some()
    }

    /// Number of acquisition attempts started so far.
    pub fn attempts_started(&self) -> u64 {
        self.in_flight.lock().started
    }

    /// Spawn the attempt so it settles even if every caller goes away.
    fn start_attempt(&self, id: u64) -> Attempt {
        let session = Arc::clone(&self.session);
        let request = self.request.clone();
        let mode = self.mode;
        let clear = ClearSlot {
            in_flight: Arc::clone(&self.in_flight),
            id,
        };

        let task = tokio::spawn(async move {
            let outcome = run_attempt(session.as_ref(), &request, mode).await;
            // Clear before the outcome reaches any caller.
            drop(clear);
            outcome
        });

        async move {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => {
                    Err(AuthError::Aborted("identity session panicked".into()))
                }
                Err(e) => Err(AuthError::Aborted(e.to_string())),
            };
            match &outcome {
                Ok(result) => debug!(attempt = id, %result, "token acquisition settled"),
                Err(e) => warn!(attempt = id, error = %e, "token acquisition failed"),
            }
            outcome
        }
        .boxed()
        .shared()
    }
}

/// Empties the in-flight slot when an attempt's task finishes or unwinds.
struct ClearSlot {
    in_flight: Arc<Mutex<InFlight>>,
    id: u64,
}

impl Drop for ClearSlot {
    fn drop(&mut self) {
        let mut slot = self.in_flight.lock();
        if slot.current.as_ref().is_some_and(|(current, _)| *current == self.id) {
            slot.current = None;
        }
    }
}

async fn run_attempt(
    session: &dyn IdentitySession,
    request: &TokenRequest,
    mode: InteractionMode,
) -> Result<TokenOutcome, AuthError> {
    let account = session
        .active_account()
        .or_else(|| session.all_accounts().into_iter().next());

    let Some(account) = account else {
        info!(?mode, "no signed-in account, starting interactive sign-in");
        return interactive(session, request, mode, None).await;
    };

    match session.acquire_token_silent(request, &account).await {
        Ok(token) => Ok(TokenOutcome::Token(token)),
        Err(IdentityError::InteractionInProgress) => {
            warn!("interactive sign-in already in progress, skipping");
            Ok(TokenOutcome::InteractionInProgress)
        }
        Err(IdentityError::InteractionRequired { reason }) => {
            info!(?mode, %reason, "silent renewal needs interaction");
            interactive(session, request, mode, Some(&account)).await
        }
        Err(e) => Err(AuthError::Silent(e)),
    }
}

async fn interactive(
    session: &dyn IdentitySession,
    request: &TokenRequest,
    mode: InteractionMode,
    account: Option<&Account>,
) -> Result<TokenOutcome, AuthError> {
    let result = match mode {
        InteractionMode::Popup => session
            .acquire_token_popup(request, account)
            .await
            .map(TokenOutcome::Token),
        InteractionMode::Redirect => session
            .acquire_token_redirect(request, account)
            .await
            .map(|()| TokenOutcome::NavigationStarted),
    };

    match result {
        Ok(outcome) => Ok(outcome),
        Err(IdentityError::InteractionInProgress) => {
            warn!("interactive sign-in already in progress, skipping");
            Ok(TokenOutcome::InteractionInProgress)
        }
        Err(e) => Err(AuthError::Interactive(e)),
    }
}
