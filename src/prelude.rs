// ABOUTME: Prelude module - the client, coordinator, and wire types in one import.
// ABOUTME: Use `use doctagger::prelude::*;` to get started quickly.

pub use crate::api::{
    ApiMessage, CurrentUser, DaemonStatus, Document, Drive, FeedbackEntry, FeedbackSubmission,
    Folder, ResolvedLocation, Site, TagMode, TagOptions, TagResult, TagSet, TaggingClient,
    UploadResult, UploadTarget, resolve_location,
};
pub use crate::auth::bootstrap::{self, Startup};
pub use crate::auth::{
    AccessToken, Account, IdentitySession, InteractionMode, TokenCoordinator, TokenOutcome,
    TokenRequest,
};
pub use crate::config::ClientConfig;
pub use crate::error::{ApiError, AuthError, ConfigError, DocTaggerError, IdentityError};
pub use crate::user::{UserState, load_current_user};
