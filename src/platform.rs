//! Remote interfaces used by the backup workflow
use std::{fmt, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::errors::BackupError;

/// One page of repository names
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepositoryPage {
    /// Repository names, in server order
    pub names: Vec<String>,

    /// Cursor to pass to get the next page
    pub end_cursor: Option<String>,

    /// Whether there is another page after this one
    pub has_next_page: bool,
}

/// Paginated listing of an organization's repositories
pub trait RepositoryLister: Sync + Send {
    /// Fetch the page that starts after `after` (`None` for the first page)
    fn list_page(
        &self,
        organization: &str,
        after: Option<String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<RepositoryPage, BackupError>> + Send + '_>>;
}

/// Migration state as reported by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationState {
    /// Queued
    Pending,
    /// Archive is being built
    Exporting,
    /// Archive is ready to download
    Exported,
    /// The server gave up
    Failed,
    /// Any state string this client doesn't know, treated as in progress
    Unknown(String),
}

impl MigrationState {
    /// Whether polling should stop on this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, MigrationState::Exported | MigrationState::Failed)
    }
}

impl From<&str> for MigrationState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => MigrationState::Pending,
            "exporting" => MigrationState::Exporting,
            "exported" => MigrationState::Exported,
            "failed" => MigrationState::Failed,
            other => MigrationState::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Exporting => write!(f, "exporting"),
            MigrationState::Exported => write!(f, "exported"),
            MigrationState::Failed => write!(f, "failed"),
            MigrationState::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// A migration handle issued by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationJob {
    /// Migration id
    pub id: u64,

    /// Last observed state
    pub state: MigrationState,
}

/// Body of the "start migration" call
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Repositories to include
    pub repositories: Vec<String>,

    /// Lock the repositories while exporting
    pub lock_repositories: bool,

    /// Leave issue and pull request attachments out of the archive
    pub exclude_attachments: bool,
}

/// Organization migration operations
pub trait MigrationApi: Sync + Send {
    /// Start a migration
    fn start_migration(
        &self,
        organization: &str,
        options: MigrationOptions,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<MigrationJob, BackupError>> + Send + '_>>;

    /// Get the current state of a migration
    fn migration_status(
        &self,
        organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<MigrationState, BackupError>> + Send + '_>>;

    /// Get the URL of the archive of an exported migration
    fn archive_url(
        &self,
        organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<String, BackupError>> + Send + '_>>;

    /// Unlock one repository locked by a migration
    fn unlock_repo(
        &self,
        organization: &str,
        id: u64,
        repo_name: &str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), BackupError>> + Send + '_>>;

    /// Delete the archive of a migration
    fn delete_migration(
        &self,
        organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), BackupError>> + Send + '_>>;
}
