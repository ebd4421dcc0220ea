//! Run one organization backup from start to cleanup
use std::io::{stdout, Write};
use std::path::PathBuf;

use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{info, warn};

use crate::config::BackupConfig;
use crate::download::{download, DownloadProgress};
use crate::enumerate::enumerate_repositories;
use crate::errors::BackupError;
use crate::export::{BackupRequest, ExportCoordinator};
use crate::platform::{MigrationApi, RepositoryLister};
use crate::utils::{archive_name, unix_timestamp};

/// Fill in the repository list, listing the organization if it is empty
///
/// An explicit list is used as is, without checking the repositories exist.
pub(crate) async fn resolve_request(
    request: &BackupRequest,
    lister: &dyn RepositoryLister,
) -> Result<BackupRequest, BackupError> {
    if !request.repositories.is_empty() {
        return Ok(request.clone());
    }
    let repositories = enumerate_repositories(lister, &request.organization).await?;
    info!(
        "Number of repos in {}: {}",
        request.organization,
        repositories.len()
    );
    Ok(BackupRequest {
        repositories,
        ..request.clone()
    })
}

/// get ProgressBar for the archive download
fn download_progress_bar() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
    if let Ok(style) = ProgressStyle::with_template("Downloading {bytes} ({bytes_per_sec})") {
        pb.set_style(style);
    }
    pb
}

/// Print without a newline
fn print_flush(text: &str) {
    print!("{text}");
    let _ = stdout().flush();
}

/// Main function to backup an organization
///
/// Steps run in order and the first failure stops the run, except for
/// unlocking: the migration is deleted even if some repositories couldn't be
/// unlocked, and the unlock error is returned afterwards.
/// # Errors
/// Error of the first step that failed
pub async fn main_backup(
    config: &BackupConfig,
    lister: &dyn RepositoryLister,
    api: &dyn MigrationApi,
    http: &reqwest::Client,
) -> Result<PathBuf, BackupError> {
    let started_at = unix_timestamp();
    let request = resolve_request(&config.request, lister).await?;
    let organization = request.organization.as_str();
    let coordinator = ExportCoordinator::new(api, config.poll.clone());

    let job = coordinator.submit(&request).await?;
    print_flush(&format!("Creating backup archive ({}) ", job.id));
    let archive_url = coordinator
        .await_export(organization, job.id, |_| print_flush("."))
        .await?;
    println!(" complete");

    let destination = config.output_dir.join(archive_name(started_at));
    let pb = download_progress_bar();
    let downloaded = download(http, &destination, &archive_url, |p: &DownloadProgress| {
        pb.set_position(p.bytes_written)
    })
    .await;
    let bytes = match downloaded {
        Ok(bytes) => {
            pb.finish();
            bytes
        }
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };
    info!("Saved {} ({})", destination.display(), HumanBytes(bytes));

    let unlocked = if request.lock_repositories {
        coordinator
            .unlock(organization, job.id, &request.repositories)
            .await
    } else {
        Ok(())
    };

    print_flush(&format!("Cleaning up ({})", job.id));
    if let Err(e) = coordinator.cleanup(organization, job.id).await {
        println!();
        warn!(
            "Migration {} was not deleted, the archive is still at {}",
            job.id,
            destination.display()
        );
        return Err(e);
    }
    println!(" complete");
    unlocked?;
    Ok(destination)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cli::GhecBackupCli;
    use crate::config::ConfigData;
    use crate::errors::BackupErrorKind;
    use crate::test_utils::{CountingLister, FakeMigrationApi};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Config writing to `output_dir`, polling without delay
    fn config(repositories: &[&str], lock: bool, output_dir: &Path) -> BackupConfig {
        let cli = GhecBackupCli {
            organization: Some("acme".into()),
            repository: repositories.iter().map(|r| r.to_string()).collect(),
            lock,
            output_dir: Some(output_dir.to_path_buf()),
            ..Default::default()
        };
        let mut config = BackupConfig::from_parts(
            cli,
            PathBuf::from(".ghec-backup.toml"),
            ConfigData::default(),
            Some("token".into()),
        )
        .unwrap();
        config.poll.interval = Duration::ZERO;
        config
    }

    /// Archive server answering `status` with `body`
    async fn archive_server(status: u16, body: &[u8], expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/archive.tar.gz"))
            .respond_with(ResponseTemplate::new(status).set_body_bytes(body.to_vec()))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    /// Files in `dir`
    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn backup_with_lock() {
        let server = archive_server(200, b"archive bytes", 1).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(42, &["exporting", "exporting", "exported"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());
        let lister = CountingLister::new(&["unused"]);

        let archive = main_backup(
            &config(&["r1", "r2"], true, temp_dir.path()),
            &lister,
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap();

        assert_eq!(lister.call_count(), 0);
        let started = api.started.lock().unwrap().clone();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].repositories, vec!["r1", "r2"]);
        assert!(started[0].lock_repositories);
        assert!(started[0].exclude_attachments);
        assert_eq!(
            api.calls(),
            vec![
                "status 42",
                "status 42",
                "status 42",
                "archive_url 42",
                "unlock 42 r1",
                "unlock 42 r2",
                "delete 42"
            ]
        );
        let name = archive.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("backup.") && name.ends_with(".tar.gz"));
        assert_eq!(tokio::fs::read(&archive).await.unwrap(), b"archive bytes");
        assert_eq!(files_in(temp_dir.path()), vec![name]);
    }

    #[tokio::test]
    async fn empty_list_enumerates_organization() {
        let server = archive_server(200, b"x", 1).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(1, &["exported"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());
        let lister = CountingLister::new(&["a", "b", "c"]);

        main_backup(
            &config(&[], false, temp_dir.path()),
            &lister,
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap();

        assert_eq!(lister.call_count(), 1);
        let started = api.started.lock().unwrap().clone();
        assert_eq!(started[0].repositories, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn organization_without_repositories_is_not_submitted() {
        let temp_dir = TempDir::new().unwrap();
        let api = FakeMigrationApi::new(1, &["exported"]);
        let lister = CountingLister::new(&[]);

        let err = main_backup(
            &config(&[], false, temp_dir.path()),
            &lister,
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), &BackupErrorKind::Submission);
        assert!(api.started.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_unlock_without_lock() {
        let server = archive_server(200, b"x", 1).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(3, &["pending", "exported"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());

        main_backup(
            &config(&["r1", "r2"], false, temp_dir.path()),
            &CountingLister::new(&[]),
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap();

        assert!(api.calls().iter().all(|c| !c.starts_with("unlock")));
        assert_eq!(api.calls().last().map(String::as_str), Some("delete 3"));
    }

    #[tokio::test]
    async fn failed_export_skips_download() {
        let server = archive_server(200, b"x", 0).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(42, &["pending", "failed"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());

        let err = main_backup(
            &config(&["r1"], true, temp_dir.path()),
            &CountingLister::new(&[]),
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), &BackupErrorKind::ExportFailed);
        assert_eq!(api.calls(), vec!["status 42", "status 42"]);
        assert!(files_in(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn download_failure_skips_unlock_and_cleanup() {
        let server = archive_server(500, b"", 1).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(42, &["exported"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());

        let err = main_backup(
            &config(&["r1"], true, temp_dir.path()),
            &CountingLister::new(&[]),
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), &BackupErrorKind::Download);
        assert_eq!(api.calls(), vec!["status 42", "archive_url 42"]);
        let files = files_in(temp_dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(".tar.gz.part"));
    }

    #[tokio::test]
    async fn unlock_failure_still_cleans_up() {
        let server = archive_server(200, b"x", 1).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(42, &["exported"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());
        api.fail_unlock = vec!["r1".into()];

        let err = main_backup(
            &config(&["r1", "r2"], true, temp_dir.path()),
            &CountingLister::new(&[]),
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), &BackupErrorKind::Unlock);
        assert_eq!(
            api.calls(),
            vec![
                "status 42",
                "archive_url 42",
                "unlock 42 r1",
                "unlock 42 r2",
                "delete 42"
            ]
        );
        assert_eq!(files_in(temp_dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn cleanup_failure_keeps_archive() {
        let server = archive_server(200, b"x", 1).await;
        let temp_dir = TempDir::new().unwrap();
        let mut api = FakeMigrationApi::new(42, &["exported"]);
        api.archive_url = format!("{}/archive.tar.gz", server.uri());
        api.fail_delete = true;

        let err = main_backup(
            &config(&["r1"], false, temp_dir.path()),
            &CountingLister::new(&[]),
            &api,
            &reqwest::Client::new(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), &BackupErrorKind::Cleanup);
        let files = files_in(temp_dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(".tar.gz"));
    }
}
