// ABOUTME: Scripted IdentitySession for tests - canned results, call counters,
// ABOUTME: and an optional delay on silent renewal to widen race windows.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{AccessToken, Account, IdentitySession, TokenRequest};
use crate::error::IdentityError;

#[derive(Default)]
pub struct ScriptedSession {
    accounts: Mutex<Vec<Account>>,
    active: Mutex<Option<Account>>,
    silent: Mutex<VecDeque<Result<AccessToken, IdentityError>>>,
    silent_fallback: Option<AccessToken>,
    popup: Mutex<VecDeque<Result<AccessToken, IdentityError>>>,
    redirect: Mutex<Option<IdentityError>>,
    redirect_result: Mutex<Option<Result<Option<Account>, IdentityError>>>,
    silent_delay: Option<Duration>,
    panic_next_silent: AtomicBool,
    pub silent_calls: AtomicUsize,
    pub popup_calls: AtomicUsize,
    pub redirect_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub silent_accounts: Mutex<Vec<String>>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: Account) -> Self {
        self.accounts.lock().push(account);
        self
    }

    pub fn with_active(self, account: Account) -> Self {
        *self.active.lock() = Some(account);
        self
    }

    pub fn silent_ok(self, token: &str) -> Self {
        self.silent.lock().push_back(Ok(AccessToken::new(token)));
        self
    }

    /// Token returned once the scripted silent results run out.
    pub fn silent_always(mut self, token: &str) -> Self {
        self.silent_fallback = Some(AccessToken::new(token));
        self
    }

    pub fn silent_err(self, error: IdentityError) -> Self {
        self.silent.lock().push_back(Err(error));
        self
    }

    pub fn popup_ok(self, token: &str) -> Self {
        self.popup.lock().push_back(Ok(AccessToken::new(token)));
        self
    }

    pub fn popup_err(self, error: IdentityError) -> Self {
        self.popup.lock().push_back(Err(error));
        self
    }

    pub fn redirect_err(self, error: IdentityError) -> Self {
        *self.redirect.lock() = Some(error);
        self
    }

    pub fn redirect_returns(self, result: Result<Option<Account>, IdentityError>) -> Self {
        *self.redirect_result.lock() = Some(result);
        self
    }

    pub fn silent_delay(mut self, delay: Duration) -> Self {
        self.silent_delay = Some(delay);
        self
    }

    /// Make the next silent renewal panic instead of answering.
    pub fn silent_panics_once(self) -> Self {
        self.panic_next_silent.store(true, Ordering::SeqCst);
        self
    }

    pub fn silent_count(&self) -> usize {
        self.silent_calls.load(Ordering::SeqCst)
    }

    pub fn popup_count(&self) -> usize {
        self.popup_calls.load(Ordering::SeqCst)
    }

    pub fn redirect_count(&self) -> usize {
        self.redirect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentitySession for ScriptedSession {
    fn active_account(&self) -> Option<Account> {
        self.active.lock().clone()
    }

    fn all_accounts(&self) -> Vec<Account> {
        self.accounts.lock().clone()
    }

    fn set_active_account(&self, account: Option<Account>) {
        *self.active.lock() = account;
    }

    async fn acquire_token_silent(
        &self,
        _request: &TokenRequest,
        account: &Account,
    ) -> Result<AccessToken, IdentityError> {
        self.silent_calls.fetch_add(1, Ordering::SeqCst);
        self.silent_accounts
            .lock()
            .push(account.home_account_id.clone());
        if let Some(delay) = self.silent_delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic_next_silent.swap(false, Ordering::SeqCst) {
            panic!("identity cache corrupted");
        }
        let next = self.silent.lock().pop_front();
        next.unwrap_or_else(|| match &self.silent_fallback {
            Some(token) => Ok(token.clone()),
            None => Err(IdentityError::Network("no scripted silent result".into())),
        })
    }

    async fn acquire_token_popup(
        &self,
        _request: &TokenRequest,
        _account: Option<&Account>,
    ) -> Result<AccessToken, IdentityError> {
        self.popup_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let next = self.popup.lock().pop_front();
        next.unwrap_or_else(|| Err(IdentityError::Cancelled))
    }

    async fn acquire_token_redirect(
        &self,
        _request: &TokenRequest,
        _account: Option<&Account>,
    ) -> Result<(), IdentityError> {
        self.redirect_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.redirect.lock().clone();
        match scripted {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn handle_redirect_result(&self) -> Result<Option<Account>, IdentityError> {
        self.redirect_result.lock().take().unwrap_or(Ok(None))
    }

    async fn sign_out(&self, _account: Option<&Account>) -> Result<(), IdentityError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
