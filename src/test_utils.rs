//! In-memory doubles of the remote APIs
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::errors::{BackupError, BackupErrorKind};
use crate::platform::{
    MigrationApi, MigrationJob, MigrationOptions, MigrationState, RepositoryLister, RepositoryPage,
};

/// Scripted migration API recording every call
pub(crate) struct FakeMigrationApi {
    /// Id given to the started migration
    pub job_id: u64,
    /// States returned by successive status polls
    pub states: Mutex<VecDeque<String>>,
    /// Archive url of the exported migration
    pub archive_url: String,
    /// Fail the start call
    pub fail_start: bool,
    /// Repositories that fail to unlock
    pub fail_unlock: Vec<String>,
    /// Fail the delete call
    pub fail_delete: bool,
    /// Options of every start call
    pub started: Mutex<Vec<MigrationOptions>>,
    /// Calls other than start, in order
    pub log: Mutex<Vec<String>>,
}

impl FakeMigrationApi {
    /// New fake answering `states` to the status polls
    pub fn new(job_id: u64, states: &[&str]) -> Self {
        Self {
            job_id,
            states: Mutex::new(states.iter().map(|s| s.to_string()).collect()),
            archive_url: "https://x/archive.tar.gz".to_string(),
            fail_start: false,
            fail_unlock: vec![],
            fail_delete: false,
            started: Mutex::new(vec![]),
            log: Mutex::new(vec![]),
        }
    }

    /// Recorded calls
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Record a call
    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }
}

impl MigrationApi for FakeMigrationApi {
    fn start_migration(
        &self,
        _organization: &str,
        options: MigrationOptions,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<MigrationJob, BackupError>> + Send + '_>>
    {
        Box::pin(async move {
            self.started.lock().unwrap().push(options);
            if self.fail_start {
                return Err(BackupError::new(BackupErrorKind::Reqwest).with_text("Forbidden"));
            }
            Ok(MigrationJob {
                id: self.job_id,
                state: MigrationState::Pending,
            })
        })
    }

    fn migration_status(
        &self,
        _organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<MigrationState, BackupError>> + Send + '_>>
    {
        Box::pin(async move {
            self.record(format!("status {id}"));
            match self.states.lock().unwrap().pop_front() {
                Some(state) => Ok(MigrationState::from(state.as_str())),
                None => Err(BackupError::new(BackupErrorKind::Reqwest).with_text("no more states")),
            }
        })
    }

    fn archive_url(
        &self,
        _organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<String, BackupError>> + Send + '_>> {
        Box::pin(async move {
            self.record(format!("archive_url {id}"));
            Ok(self.archive_url.clone())
        })
    }

    fn unlock_repo(
        &self,
        _organization: &str,
        id: u64,
        repo_name: &str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), BackupError>> + Send + '_>> {
        let repo_name = repo_name.to_string();
        Box::pin(async move {
            self.record(format!("unlock {id} {repo_name}"));
            if self.fail_unlock.contains(&repo_name) {
                return Err(BackupError::new(BackupErrorKind::Unlock).with_text("Not Found"));
            }
            Ok(())
        })
    }

    fn delete_migration(
        &self,
        _organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), BackupError>> + Send + '_>> {
        Box::pin(async move {
            self.record(format!("delete {id}"));
            if self.fail_delete {
                return Err(BackupError::new(BackupErrorKind::Cleanup).with_text("Gone"));
            }
            Ok(())
        })
    }
}

/// Single page lister counting its calls
pub(crate) struct CountingLister {
    /// Names returned
    pub names: Vec<String>,
    /// Number of calls
    pub calls: AtomicUsize,
}

impl CountingLister {
    /// New lister returning `names`
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RepositoryLister for CountingLister {
    fn list_page(
        &self,
        _organization: &str,
        _after: Option<String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<RepositoryPage, BackupError>> + Send + '_>>
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = RepositoryPage {
            names: self.names.clone(),
            end_cursor: None,
            has_next_page: false,
        };
        Box::pin(async move { Ok(page) })
    }
}
