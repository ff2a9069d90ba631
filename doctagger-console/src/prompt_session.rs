// ABOUTME: Terminal identity session - the user pastes an access token when an
// ABOUTME: interactive sign-in is needed; tokens are cached per account in memory.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use doctagger::prelude::*;

/// Reads one answer for a prompt; `None` when input is closed.
pub type Ask = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// An identity session driven from the terminal.
///
/// "Popup" sign-in prints the provider's sign-in URL and asks for the
/// resulting token. "Redirect" sign-in only prints the URL; the token is then
/// supplied through `DOCTAGGER_ACCESS_TOKEN` on the next start.
pub struct PromptSession {
    sign_in_url: String,
    ask: Ask,
    accounts: Mutex<Vec<Account>>,
    active: Mutex<Option<Account>>,
    tokens: Mutex<HashMap<String, AccessToken>>,
    returning: Mutex<Option<(Account, AccessToken)>>,
}

impl PromptSession {
    pub fn new(sign_in_url: impl Into<String>) -> Self {
        Self::with_input(sign_in_url, Arc::new(ask_stdin))
    }

    pub fn with_input(sign_in_url: impl Into<String>, ask: Ask) -> Self {
        Self {
            sign_in_url: sign_in_url.into(),
            ask,
            accounts: Mutex::new(Vec::new()),
            active: Mutex::new(None),
            tokens: Mutex::new(HashMap::new()),
            returning: Mutex::new(None),
        }
    }

    /// Treat a token handed over at start-up as the result of a redirect
    /// sign-in.
    pub fn with_returning_token(self, username: &str, token: impl Into<AccessToken>) -> Self {
        *self.returning.lock() = Some((Account::new(username, username), token.into()));
        self
    }

    /// Forget the cached token of an account so the next call signs in again.
    pub fn forget_token(&self, account: &Account) {
        self.tokens.lock().remove(&account.home_account_id);
    }

    fn remember(&self, account: Account, token: AccessToken) {
        self.tokens
            .lock()
            .insert(account.home_account_id.clone(), token);
        let mut accounts = self.accounts.lock();
        if !accounts.contains(&account) {
            accounts.push(account);
        }
    }

    async fn ask(&self, prompt: String) -> Result<String, IdentityError> {
        let ask = self.ask.clone();
        let answer = tokio::task::spawn_blocking(move || ask(&prompt))
            .await
            .map_err(|_| IdentityError::Cancelled)?;
        answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(IdentityError::Cancelled)
    }
}

fn ask_stdin(prompt: &str) -> Option<String> {
    print!("{prompt}");
    std::io::stdout().flush().ok()?;
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

#[async_trait]
impl IdentitySession for PromptSession {
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
        let cached = self.tokens.lock().get(&account.home_account_id).cloned();
        match cached {
            Some(token) => {
                debug!(username = %account.username, "using cached token");
                Ok(token)
            }
            None => Err(IdentityError::InteractionRequired {
                reason: format!("no cached token for {}", account.username),
            }),
        }
    }

    async fn acquire_token_popup(
        &self,
        request: &TokenRequest,
        account: Option<&Account>,
    ) -> Result<AccessToken, IdentityError> {
        println!("\nSign in at:\n  {}\n", self.sign_in_url);
        let account = match account {
            Some(account) => account.clone(),
            None => {
                let username = self.ask("Username: ".to_string()).await?;
                Account::new(username.clone(), username)
            }
        };
        let token = self
            .ask(format!("Access token for {}: ", request.scopes.join(" ")))
            .await?;

        let token = AccessToken::new(token);
        info!(username = %account.username, "signed in");
        self.remember(account, token.clone());
        Ok(token)
    }

    async fn acquire_token_redirect(
        &self,
        _request: &TokenRequest,
        _account: Option<&Account>,
    ) -> Result<(), IdentityError> {
        println!("\nSign in at:\n  {}", self.sign_in_url);
        println!("Then restart with DOCTAGGER_ACCESS_TOKEN and DOCTAGGER_USERNAME set.\n");
        Ok(())
    }

    async fn handle_redirect_result(&self) -> Result<Option<Account>, IdentityError> {
        let returning = self.returning.lock().take();
        Ok(returning.map(|(account, token)| {
            self.remember(account.clone(), token);
            account
        }))
    }

    async fn sign_out(&self, account: Option<&Account>) -> Result<(), IdentityError> {
        if let Some(account) = account {
            self.forget_token(account);
            self.accounts.lock().retain(|a| a != account);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    fn scripted(answers: &[&str]) -> Ask {
        let answers: Mutex<VecDeque<String>> =
            Mutex::new(answers.iter().map(|a| a.to_string()).collect());
        Arc::new(move |_prompt: &str| answers.lock().pop_front())
    }

    fn request() -> TokenRequest {
        TokenRequest::new(["api://doctagger/.default"])
    }

    #[tokio::test]
    async fn test_popup_caches_token_for_silent_renewal() {
        let session =
            PromptSession::with_input("https://login", scripted(&["bob@contoso.com", " tok-9 "]));

        let token = session.acquire_token_popup(&request(), None).await.unwrap();
        assert_eq!(token.secret(), "tok-9");

        let account = session.all_accounts().remove(0);
        assert_eq!(account.username, "bob@contoso.com");
        let renewed = session.acquire_token_silent(&request(), &account).await;
        assert_eq!(renewed, Ok(AccessToken::new("tok-9")));
    }

    #[tokio::test]
    async fn test_silent_without_token_needs_interaction() {
        let session = PromptSession::with_input("https://login", scripted(&[]));
        let account = Account::new("bob", "bob");

        let err = session
            .acquire_token_silent(&request(), &account)
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InteractionRequired { .. }));
    }

    #[tokio::test]
    async fn test_empty_answer_cancels() {
        let session = PromptSession::with_input("https://login", scripted(&["bob", "  "]));

        let err = session.acquire_token_popup(&request(), None).await.unwrap_err();
        assert_eq!(err, IdentityError::Cancelled);
        assert!(session.all_accounts().is_empty());
    }

    #[tokio::test]
    async fn test_returning_token_signs_in_at_startup() {
        let session = PromptSession::with_input("https://login", scripted(&[]))
            .with_returning_token("bob", "tok-r");

        let startup = bootstrap::initialize(&session, &request()).await.unwrap();
        let Startup::Ready(account) = startup else {
            panic!("Expected Ready, got {:?}", startup);
        };
        assert_eq!(session.active_account(), Some(account.clone()));
        let token = session.acquire_token_silent(&request(), &account).await;
        assert_eq!(token, Ok(AccessToken::new("tok-r")));
    }

    #[tokio::test]
    async fn test_sign_out_forgets_account() {
        let session = PromptSession::with_input("https://login", scripted(&[]))
            .with_returning_token("bob", "tok-r");
        bootstrap::initialize(&session, &request()).await.unwrap();

        bootstrap::sign_out(&session).await.unwrap();
        assert!(session.all_accounts().is_empty());
        assert!(session.active_account().is_none());
    }
}
