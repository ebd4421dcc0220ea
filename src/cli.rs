//! Command line options for the ghec-backup tool
use crate::{
    backup::main_backup, config::BackupConfig, errors::BackupError, github::GithubClient,
};
use clap::Parser;
use std::path::PathBuf;

/// ghec-backup - Backup the repositories of a GitHub organization
#[derive(Parser, Default, Clone, Debug)]
pub struct GhecBackupCli {
    /// Path to the config file (default: .ghec-backup.toml in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Organization to backup
    #[arg(short, long)]
    pub organization: Option<String>,

    /// Repository to backup, can be provided multiple times (default: all repositories)
    #[arg(short, long)]
    pub repository: Vec<String>,

    /// Lock repositories while backing up
    #[arg(short, long)]
    pub lock: bool,

    /// Access token (default: `token` from the config file, or GITHUB_TOKEN)
    #[arg(short, long)]
    pub token: Option<String>,

    /// Directory where the archive is written
    #[arg(short = 'd', long)]
    pub output_dir: Option<PathBuf>,

    /// Give up after this many status polls
    #[arg(long)]
    pub max_polls: Option<u32>,

    /// Show the current config path
    #[arg(long)]
    pub show_config_path: bool,

    /// Verbose mode (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl GhecBackupCli {
    /// Log level matching the verbosity
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Run the ghec-backup tool with the provided command line options
/// # Errors
/// Error if the configuration is invalid or any step of the backup fails
pub async fn ghec_backup_main(args: GhecBackupCli) -> Result<(), BackupError> {
    if args.show_config_path {
        println!("{}", BackupConfig::get_config_path(&args).display());
        return Ok(());
    }
    let config = BackupConfig::try_new(args)?;
    log::debug!("{config:?}");
    let client = GithubClient::new(config.token().to_string(), config.api_url.clone())?;
    let archive = main_backup(&config, &client, &client, client.http()).await?;
    println!("Backup saved to {}", archive.display());
    Ok(())
}
