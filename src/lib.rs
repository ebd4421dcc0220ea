//! # ghec-backup
//!
//! Backup the repositories of a GitHub organization with the migrations API
//!
//! Starts an organization migration, waits for the archive, downloads it to
//! `backup.<unix-seconds>.tar.gz`, unlocks the repositories if they were
//! locked, then deletes the migration archive on GitHub.
//!
//! ## Usage
//!
//! ```txt
//! Usage: ghec-backup [OPTIONS]
//!
//! Options:
//!   -c, --config <CONFIG>              Path to the config file (default: .ghec-backup.toml in the current directory)
//!   -o, --organization <ORGANIZATION>  Organization to backup
//!   -r, --repository <REPOSITORY>      Repository to backup, can be provided multiple times (default: all repositories)
//!   -l, --lock                         Lock repositories while backing up
//!   -t, --token <TOKEN>                Access token (default: `token` from the config file, or GITHUB_TOKEN)
//!   -d, --output-dir <OUTPUT_DIR>      Directory where the archive is written
//!       --max-polls <MAX_POLLS>        Give up after this many status polls
//!       --show-config-path             Show the current config path
//!   -v, --verbose...                   Verbose mode (-v, -vv)
//!   -h, --help                         Print help
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![deny(
    missing_docs,
    clippy::all,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![warn(clippy::multiple_crate_versions)]

pub(crate) mod backup;
pub(crate) mod cli;
pub(crate) mod config;
pub(crate) mod download;
pub(crate) mod enumerate;
pub(crate) mod errors;
pub(crate) mod export;
pub(crate) mod platform;
pub(crate) mod utils;

mod github;

#[cfg(test)]
pub(crate) mod test_utils;

pub use backup::main_backup;
pub use cli::{ghec_backup_main, GhecBackupCli};
pub use config::{BackupConfig, ConfigData};
pub use download::{download, DownloadProgress};
pub use enumerate::enumerate_repositories;
pub use errors::{BackupError, BackupErrorKind};
pub use export::{BackupRequest, ExportCoordinator, PollStrategy, DEFAULT_POLL_INTERVAL};
pub use github::GithubClient;
pub use platform::{
    MigrationApi, MigrationJob, MigrationOptions, MigrationState, RepositoryLister, RepositoryPage,
};
