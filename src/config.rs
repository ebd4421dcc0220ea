//! Configuration handling
use std::{
    fmt,
    fs::read_to_string,
    io::IsTerminal,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    cli::GhecBackupCli,
    errors::{BackupError, BackupErrorKind},
    export::{BackupRequest, PollStrategy},
    github::GITHUB_API_URL,
    utils::get_password,
};

/// Config file looked up in the current directory
const DEFAULT_CONFIG_FILE: &str = ".ghec-backup.toml";

/// Environment variable holding the token
const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Content of the configuration file
#[derive(Deserialize, Serialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct ConfigData {
    /// Access token
    pub token: Option<String>,

    /// Organization to back up
    pub organization: Option<String>,

    /// Repositories to back up, all of them if empty
    pub repositories: Option<Vec<String>>,

    /// Lock the repositories while backing up
    pub lock: Option<bool>,

    /// Directory receiving the archive
    pub output_dir: Option<PathBuf>,

    /// API base url, for GitHub Enterprise Server
    pub api_url: Option<String>,
}

/// Validated configuration of one backup run
#[derive(Clone)]
pub struct BackupConfig {
    /// path to the configuration file
    pub config_path: PathBuf,

    /// Access token
    token: String,

    /// What to back up
    pub request: BackupRequest,

    /// Directory receiving the archive
    pub output_dir: PathBuf,

    /// API base url
    pub api_url: Url,

    /// Status poll policy
    pub poll: PollStrategy,
}

impl fmt::Debug for BackupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackupConfig")
            .field("config_path", &self.config_path)
            .field("token", &"***")
            .field("request", &self.request)
            .field("output_dir", &self.output_dir)
            .field("api_url", &self.api_url.as_str())
            .field("poll", &self.poll)
            .finish()
    }
}

impl BackupConfig {
    /// Build the configuration from the CLI, the config file and the environment
    ///
    /// Prompts for the token when none is configured and stdin is a terminal.
    /// # Errors
    /// Error if the config file can't be read or a required value is missing
    pub fn try_new(cli_args: GhecBackupCli) -> Result<Self, BackupError> {
        let config_path = Self::get_config_path(&cli_args);
        let config_data = Self::read_config(&config_path, cli_args.config.is_some())?;
        dotenv::dotenv().ok();
        let mut token = cli_args
            .token
            .clone()
            .or_else(|| config_data.token.clone())
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|t| !t.is_empty());
        if token.is_none() && std::io::stdin().is_terminal() {
            println!("Please enter your github token:");
            token = Some(get_password()?);
        }
        Self::from_parts(cli_args, config_path, config_data, token)
    }

    /// Path of the config file, from the CLI or the current directory
    pub fn get_config_path(cli_args: &GhecBackupCli) -> PathBuf {
        match &cli_args.config {
            Some(path) => path.clone(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Read the config file
    ///
    /// A missing default file is an empty configuration, a missing explicit one an error.
    fn read_config(path: &Path, explicit: bool) -> Result<ConfigData, BackupError> {
        if !explicit && !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(ConfigData::default());
        }
        let contents = read_to_string(path)
            .map_err(|e| BackupError::from(e).with_kind(BackupErrorKind::Configuration))?;
        let config_data = toml::from_str(&contents)?;
        debug!("Loaded config from {}", path.display());
        Ok(config_data)
    }

    /// Merge the CLI over the file and validate
    pub(crate) fn from_parts(
        cli_args: GhecBackupCli,
        config_path: PathBuf,
        config_data: ConfigData,
        token: Option<String>,
    ) -> Result<Self, BackupError> {
        let token = match token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                return Err(BackupError::new(BackupErrorKind::Configuration).with_text(&format!(
                    "token missing (--token, `token` in the config file or {TOKEN_ENV})"
                )))
            }
        };
        let organization = match cli_args
            .organization
            .or(config_data.organization)
            .filter(|o| !o.is_empty())
        {
            Some(organization) => organization,
            None => {
                return Err(BackupError::new(BackupErrorKind::Configuration)
                    .with_text("organization is required"))
            }
        };
        let repositories = if cli_args.repository.is_empty() {
            config_data.repositories.unwrap_or_default()
        } else {
            cli_args.repository
        };
        let api_url = config_data
            .api_url
            .unwrap_or_else(|| GITHUB_API_URL.to_string());
        let api_url = Url::parse(&api_url).map_err(|e| {
            BackupError::new(BackupErrorKind::Configuration)
                .with_text(&format!("invalid api_url '{api_url}': {e}"))
        })?;
        Ok(BackupConfig {
            config_path,
            token,
            request: BackupRequest {
                organization,
                repositories,
                lock_repositories: cli_args.lock || config_data.lock.unwrap_or(false),
            },
            output_dir: cli_args
                .output_dir
                .or(config_data.output_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            api_url,
            poll: PollStrategy {
                max_attempts: cli_args.max_polls,
                ..PollStrategy::default()
            },
        })
    }

    /// Access token
    pub fn token(&self) -> &str {
        &self.token
    }
}
