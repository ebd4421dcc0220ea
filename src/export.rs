//! Lifecycle of one organization migration
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::sleep;

use crate::errors::{BackupError, BackupErrorKind};
use crate::platform::{MigrationApi, MigrationJob, MigrationOptions, MigrationState};

/// Delay between two status polls, kept under the API rate limit
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3600);

/// What to back up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    /// Organization login
    pub organization: String,

    /// Repositories to include, empty for all of them
    pub repositories: Vec<String>,

    /// Lock the repositories during the backup
    pub lock_repositories: bool,
}

/// How the migration status is polled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollStrategy {
    /// Fixed delay between two polls
    pub interval: Duration,

    /// Give up after this many polls, poll forever if `None`
    pub max_attempts: Option<u32>,
}

impl Default for PollStrategy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Drives a migration: submit, wait, unlock, delete
pub struct ExportCoordinator<'a> {
    /// Migration API
    api: &'a dyn MigrationApi,

    /// Poll policy
    poll: PollStrategy,
}

impl<'a> ExportCoordinator<'a> {
    /// Create a new coordinator
    pub fn new(api: &'a dyn MigrationApi, poll: PollStrategy) -> Self {
        Self { api, poll }
    }

    /// Start the migration of `request`, whose repository list is already resolved
    ///
    /// Attachments are always left out of the archive.
    /// # Errors
    /// Error if the repository list is empty or the server refuses the migration
    pub async fn submit(&self, request: &BackupRequest) -> Result<MigrationJob, BackupError> {
        if request.repositories.is_empty() {
            return Err(BackupError::new(BackupErrorKind::Submission)
                .with_text(&format!("no repository to back up in {}", request.organization)));
        }
        let options = MigrationOptions {
            repositories: request.repositories.clone(),
            lock_repositories: request.lock_repositories,
            exclude_attachments: true,
        };
        let job = self
            .api
            .start_migration(&request.organization, options)
            .await
            .map_err(|e| e.with_kind(BackupErrorKind::Submission))?;
        info!(
            "Started migration {} of {} repositories",
            job.id,
            request.repositories.len()
        );
        Ok(job)
    }

    /// Poll migration `id` until it is exported, then return the archive url
    ///
    /// `on_tick` is called after every successful poll.
    /// # Errors
    /// Error if a poll fails, the migration fails, or the poll budget is spent
    pub async fn await_export(
        &self,
        organization: &str,
        id: u64,
        mut on_tick: impl FnMut(&MigrationState),
    ) -> Result<String, BackupError> {
        let mut attempts: u32 = 0;
        loop {
            let state = self
                .api
                .migration_status(organization, id)
                .await
                .map_err(|e| e.with_kind(BackupErrorKind::Poll))?;
            attempts += 1;
            on_tick(&state);
            match state {
                MigrationState::Exported => break,
                MigrationState::Failed => {
                    return Err(BackupError::new(BackupErrorKind::ExportFailed)
                        .with_text(&format!("migration {id} of {organization} failed")));
                }
                other => debug!("Migration {id} is {other} (poll {attempts})"),
            }
            if let Some(max_attempts) = self.poll.max_attempts {
                if attempts >= max_attempts {
                    return Err(BackupError::new(BackupErrorKind::Poll).with_text(&format!(
                        "migration {id} not exported after {attempts} polls"
                    )));
                }
            }
            sleep(self.poll.interval).await;
        }
        self.api
            .archive_url(organization, id)
            .await
            .map_err(|e| e.with_kind(BackupErrorKind::Poll))
    }

    /// Unlock every repository of migration `id`
    ///
    /// A failure doesn't stop the remaining repositories from being unlocked.
    /// # Errors
    /// Error naming every repository that couldn't be unlocked
    pub async fn unlock(
        &self,
        organization: &str,
        id: u64,
        repositories: &[String],
    ) -> Result<(), BackupError> {
        let mut failed = vec![];
        for repo in repositories {
            match self.api.unlock_repo(organization, id, repo).await {
                Ok(()) => println!("{organization}/{repo} unlocked"),
                Err(e) => {
                    warn!("Unable to unlock {organization}/{repo}: {e}");
                    failed.push(repo.as_str());
                }
            }
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(BackupError::new(BackupErrorKind::Unlock).with_text(&format!(
                "unable to unlock {}/{{{}}}",
                organization,
                failed.join(", ")
            )))
        }
    }

    /// Delete the archive of migration `id` on the server
    /// # Errors
    /// Error if the server refuses the deletion
    pub async fn cleanup(&self, organization: &str, id: u64) -> Result<(), BackupError> {
        self.api
            .delete_migration(organization, id)
            .await
            .map_err(|e| e.with_kind(BackupErrorKind::Cleanup))
    }
}
