// ABOUTME: Interactive console for the DocTagger backend - sign in, tag and
// ABOUTME: upload documents, and manage upload targets from a terminal.

mod commands;
mod prompt_session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use tracing::{info, warn};

use doctagger::prelude::*;

use crate::commands::Workspace;
use crate::prompt_session::PromptSession;

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".doctagger_history"))
}

fn build_session(config: &ClientConfig) -> Result<PromptSession> {
    let session = PromptSession::new(config.authorize_url()?);

    let token = std::env::var("DOCTAGGER_ACCESS_TOKEN").ok();
    let username = std::env::var("DOCTAGGER_USERNAME").ok();
    Ok(match (token, username) {
        (Some(token), Some(username)) => session.with_returning_token(&username, token),
        (Some(_), None) => {
            warn!("DOCTAGGER_ACCESS_TOKEN ignored without DOCTAGGER_USERNAME");
            session
        }
        _ => session,
    })
}

async fn run_console(workspace: &mut Workspace) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    println!("Type 'help' for commands, 'quit' to exit.\n");

    loop {
        let line = match rl.readline("doctagger> ") {
            Ok(line) => line,
            Err(_) => break,
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let _ = rl.add_history_entry(line);
        if let Err(e) = workspace.dispatch(line).await {
            println!("Error: {e:#}\n");
        }
    }

    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ClientConfig::from_env()?;
    info!(
        api = %config.api_base_url,
        mode = ?config.interaction_mode,
        "starting console"
    );

    let session = Arc::new(build_session(&config)?);
    let request = config.token_request();

    match bootstrap::initialize(session.as_ref(), &request).await? {
        Startup::Ready(account) => println!("Signed in as {}", account.display_name()),
        Startup::NavigationStarted => return Ok(()),
    }

    let tokens = TokenCoordinator::new(session.clone(), request, config.interaction_mode);
    let client = TaggingClient::from_config(&config, Arc::new(tokens));

    let user = load_current_user(&client).await;
    if let Some(error) = &user.error {
        println!("Could not load your profile: {error}");
    }
    if user.is_admin() {
        println!("Admin commands enabled.");
    }

    let mut workspace = Workspace::new(client, session, user);
    run_console(&mut workspace).await
}
