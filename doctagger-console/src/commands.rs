// ABOUTME: Console commands - parses a line and runs it against the tagging
// ABOUTME: client, keeping the open document, its tags, and the location draft.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};

use doctagger::api::TAG_COUNT_CHOICES;
use doctagger::prelude::*;

use crate::prompt_session::PromptSession;

const HELP: &str = "\
Documents:
  open <path>              load a document
  mode keywords|topics     choose how tags are derived
  mode prompt <text>       tag with custom instructions
  count <n>                number of tags (3, 5, 7, 10, 15, 20)
  tag                      suggest tags for the open document
  tags                     show the current tags
  addtag <tag>             add a tag
  rmtag <n>                remove tag number n
  upload <label>           upload the document with its tags
  feedback <1-5> [text]    rate the tags of the open document
Account:
  whoami                   show the signed-in user
  logout                   sign out
Admin:
  targets                  list upload targets
  status                   background scan status per target
  feedback-list            all submitted feedback
  target-add <label>|<siteId>|<driveId>|<folder>
  target-rm <label>        delete a target
  enable <label>           include a target in background scans
  disable <label>          exclude a target from background scans
  resolve <site url>       browse a site's drives and folders
  drive <id>               pick a drive of the resolved site
  folder <path>            pick a folder of the selected drive
  save-target <label>      add a target from the resolved location
";

/// Console state between commands.
pub struct Workspace {
    client: TaggingClient,
    session: Arc<PromptSession>,
    user: UserState,
    document: Option<Document>,
    options: TagOptions,
    tags: TagSet,
    location: Option<ResolvedLocation>,
}

impl Workspace {
    pub fn new(client: TaggingClient, session: Arc<PromptSession>, user: UserState) -> Self {
        Self {
            client,
            session,
            user,
            document: None,
            options: TagOptions::default(),
            tags: TagSet::new(),
            location: None,
        }
    }

    /// Run one command line.
    pub async fn dispatch(&mut self, line: &str) -> Result<()> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        let result = match command {
            "help" => {
                print!("{HELP}");
                Ok(())
            }
            "whoami" => self.whoami(),
            "logout" => self.logout().await,
            "open" => self.open(rest).await,
            "mode" => self.set_mode(rest),
            "count" => self.set_count(rest),
            "tag" => self.tag().await,
            "tags" => {
                self.print_tags();
                Ok(())
            }
            "addtag" => {
                if !self.tags.add(rest) {
                    println!("Tag not added (empty or already present).");
                }
                self.print_tags();
                Ok(())
            }
            "rmtag" => self.remove_tag(rest),
            "upload" => self.upload(rest).await,
            "feedback" => self.feedback(rest).await,
            "targets" => self.targets().await,
            "status" => self.status().await,
            "feedback-list" => self.feedback_list().await,
            "target-add" => self.target_add(rest).await,
            "target-rm" => self.target_rm(rest).await,
            "enable" => self.set_enabled(rest, true).await,
            "disable" => self.set_enabled(rest, false).await,
            "resolve" => self.resolve(rest).await,
            "drive" => self.select_drive(rest).await,
            "folder" => self.select_folder(rest),
            "save-target" => self.save_target(rest).await,
            other => Err(anyhow!("unknown command '{other}', try 'help'")),
        };

        self.after_failure(&result);
        result
    }

    /// A rejected token is dropped so the next command signs in again.
    fn after_failure(&self, result: &Result<()>) {
        let Err(e) = result else { return };
        if let Some(ApiError::Api { status: 401, .. }) = e.downcast_ref::<ApiError>() {
            if let Some(account) = self.session.active_account() {
                self.session.forget_token(&account);
                println!("Your sign-in was rejected; you will be asked to sign in again.");
            }
        }
    }

    fn require_admin(&self) -> Result<()> {
        if !self.user.is_admin() {
            bail!("admin access required");
        }
        Ok(())
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .context("no document open, use 'open <path>'")
    }

    fn whoami(&self) -> Result<()> {
        match &self.user.user {
            Some(user) => println!("{}", serde_json::to_string_pretty(user)?),
            None => println!("Not signed in."),
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        bootstrap::sign_out(self.session.as_ref()).await?;
        self.user = UserState::default();
        println!("Signed out.");
        Ok(())
    }

    async fn open(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            bail!("usage: open <path>");
        }
        let document = Document::from_path(path).await?;
        println!("Opened {} ({} bytes).", document.filename, document.bytes.len());
        self.document = Some(document);
        self.tags = TagSet::new();
        Ok(())
    }

    fn set_mode(&mut self, args: &str) -> Result<()> {
        self.options.mode = parse_mode(args)?;
        println!("Mode: {}", self.options.mode.form_value());
        Ok(())
    }

    fn set_count(&mut self, args: &str) -> Result<()> {
        self.options.num_tags = parse_count(args)?;
        println!("Tag count: {}", self.options.num_tags);
        Ok(())
    }

    async fn tag(&mut self) -> Result<()> {
        let result = self
            .client
            .tag_document(self.document()?, &self.options)
            .await
            .map(Some)
            .or_else(skip_pending)?;
        let Some(result) = result else { return Ok(()) };

        if let Some(text) = &result.text {
            let preview: String = text.chars().take(200).collect();
            println!("Text: {preview}");
        }
        self.tags = TagSet::from(result);
        self.print_tags();
        Ok(())
    }

    fn print_tags(&self) {
        if self.tags.is_empty() {
            println!("No tags.");
            return;
        }
        for (i, tag) in self.tags.as_slice().iter().enumerate() {
            println!("  {}. {}", i + 1, tag);
        }
    }

    fn remove_tag(&mut self, args: &str) -> Result<()> {
        let number: usize = args.parse().context("usage: rmtag <n>")?;
        let removed = number
            .checked_sub(1)
            .and_then(|index| self.tags.remove(index))
            .with_context(|| format!("no tag number {number}"))?;
        println!("Removed '{removed}'.");
        self.print_tags();
        Ok(())
    }

    async fn upload(&self, label: &str) -> Result<()> {
        let result = self
            .client
            .upload_to_sharepoint(self.document()?, &self.tags, label)
            .await
            .map(Some)
            .or_else(skip_pending)?;
        if let Some(result) = result {
            match result.web_url() {
                Some(url) => println!("Uploaded: {url}"),
                None => println!("Uploaded."),
            }
        }
        Ok(())
    }

    async fn feedback(&self, args: &str) -> Result<()> {
        let (rating, comment) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let rating: u8 = rating.parse().context("usage: feedback <1-5> [comment]")?;
        let submission =
            FeedbackSubmission::new(&self.document()?.filename, rating, comment.trim());

        if self
            .client
            .submit_feedback(&submission)
            .await
            .map(Some)
            .or_else(skip_pending)?
            .is_some()
        {
            println!("Thanks for the feedback.");
        }
        Ok(())
    }

    async fn targets(&self) -> Result<()> {
        self.require_admin()?;
        let Some(targets) = self
            .client
            .list_upload_targets()
            .await
            .map(Some)
            .or_else(skip_pending)?
        else {
            return Ok(());
        };
        if targets.is_empty() {
            println!("No upload targets.");
        }
        for target in targets {
            println!("  {target}");
        }
        Ok(())
    }

    async fn status(&self) -> Result<()> {
        self.require_admin()?;
        let Some(status) = self
            .client
            .daemon_status()
            .await
            .map(Some)
            .or_else(skip_pending)?
        else {
            return Ok(());
        };
        let mut labels: Vec<_> = status.keys().collect();
        labels.sort();
        for label in labels {
            let entry = &status[label];
            println!(
                "  {label}: last run {}, last success {}, {} files{}",
                entry.last_run.as_deref().unwrap_or("never"),
                entry.last_success.as_deref().unwrap_or("never"),
                entry.files_processed.unwrap_or(0),
                entry
                    .last_error
                    .as_ref()
                    .map(|e| format!(", last error: {e}"))
                    .unwrap_or_default()
            );
        }
        Ok(())
    }

    async fn feedback_list(&self) -> Result<()> {
        self.require_admin()?;
        let Some(entries) = self
            .client
            .list_feedback()
            .await
            .map(Some)
            .or_else(skip_pending)?
        else {
            return Ok(());
        };
        for entry in entries {
            let rating = entry
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} {} {} [{rating}] {}",
                entry.timestamp, entry.user, entry.filename, entry.comment
            );
        }
        Ok(())
    }

    async fn target_add(&self, args: &str) -> Result<()> {
        self.require_admin()?;
        self.add_target(parse_target(args)?).await
    }

    async fn add_target(&self, target: UploadTarget) -> Result<()> {
        if let Some(message) = self
            .client
            .add_upload_target(&target)
            .await
            .map(Some)
            .or_else(skip_pending)?
        {
            println!("{}", message.message);
        }
        Ok(())
    }

    async fn target_rm(&self, label: &str) -> Result<()> {
        self.require_admin()?;
        if let Some(message) = self
            .client
            .delete_upload_target(label)
            .await
            .map(Some)
            .or_else(skip_pending)?
        {
            println!("{}", message.message);
        }
        Ok(())
    }

    async fn set_enabled(&self, label: &str, enabled: bool) -> Result<()> {
        self.require_admin()?;
        if let Some(message) = self
            .client
            .set_upload_target_enabled(label, enabled)
            .await
            .map(Some)
            .or_else(skip_pending)?
        {
            println!("{}", message.message);
        }
        Ok(())
    }

    async fn resolve(&mut self, site_url: &str) -> Result<()> {
        self.require_admin()?;
        let Some(location) = resolve_location(&self.client, site_url)
            .await
            .map(Some)
            .or_else(skip_pending)?
        else {
            return Ok(());
        };
        print_location(&location);
        self.location = Some(location);
        Ok(())
    }

    fn location(&mut self) -> Result<&mut ResolvedLocation> {
        self.location
            .as_mut()
            .context("no site resolved, use 'resolve <site url>'")
    }

    async fn select_drive(&mut self, drive_id: &str) -> Result<()> {
        self.require_admin()?;
        let client = self.client.clone();
        let location = self.location()?;
        location
            .select_drive(&client, drive_id)
            .await
            .map(Some)
            .or_else(skip_pending)?;
        print_location(location);
        Ok(())
    }

    fn select_folder(&mut self, path: &str) -> Result<()> {
        self.require_admin()?;
        let path = if path == "/" { "" } else { path };
        self.location()?.select_folder(path)?;
        println!("Folder: {}", if path.is_empty() { "/" } else { path });
        Ok(())
    }

    async fn save_target(&mut self, label: &str) -> Result<()> {
        self.require_admin()?;
        let target = self
            .location()?
            .draft_target(label)
            .context("the resolved site has no drive to upload to")?;
        self.add_target(target).await
    }
}

/// A pending sign-in skips the command instead of failing it.
fn skip_pending<T>(error: ApiError) -> std::result::Result<Option<T>, ApiError> {
    if error.is_sign_in_pending() {
        println!("Sign-in in progress; try again once it completes.");
        Ok(None)
    } else {
        Err(error)
    }
}

fn print_location(location: &ResolvedLocation) {
    println!(
        "Site: {}",
        location.site.name.as_deref().unwrap_or(&location.site.id)
    );
    for drive in &location.drives {
        let selected = location.drive_id.as_deref() == Some(drive.id.as_str());
        let marker = if selected { "*" } else { " " };
        println!(
            "  {marker} drive {} {}",
            drive.id,
            drive.name.as_deref().unwrap_or("")
        );
    }
    for folder in &location.folders {
        let selected = location.folder.as_deref() == Some(folder.path.as_str());
        let marker = if selected { "*" } else { " " };
        println!("    {marker} {}", folder.name);
    }
}

fn parse_mode(args: &str) -> Result<TagMode> {
    let (mode, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
    match mode.to_lowercase().as_str() {
        "keywords" => Ok(TagMode::Keywords),
        "topics" => Ok(TagMode::Topics),
        "prompt" if !rest.trim().is_empty() => Ok(TagMode::CustomPrompt(rest.trim().to_string())),
        "prompt" => bail!("usage: mode prompt <text>"),
        _ => bail!("usage: mode keywords|topics|prompt <text>"),
    }
}

fn parse_count(args: &str) -> Result<u32> {
    let count: u32 = args.parse().context("usage: count <n>")?;
    if !TAG_COUNT_CHOICES.contains(&count) {
        bail!("tag count must be one of {:?}", TAG_COUNT_CHOICES);
    }
    Ok(count)
}

fn parse_target(args: &str) -> Result<UploadTarget> {
    let fields: Vec<&str> = args.split('|').map(str::trim).collect();
    let [label, site_id, drive_id, folder] = fields.as_slice() else {
        bail!("usage: target-add <label>|<siteId>|<driveId>|<folder>");
    };
    let target = UploadTarget::new(*label, *site_id, *drive_id, *folder);
    target.validate()?;
    Ok(target)
}
