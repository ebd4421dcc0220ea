//! Stream an archive to disk
//!
//! Bytes land in `<destination>.part`, which is renamed to `destination` once
//! the whole body has been written. A failed transfer leaves the `.part` file
//! behind and never creates `destination`.
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use log::debug;
use tokio::fs::{rename, File};
use tokio::io::AsyncWriteExt;

use crate::errors::{BackupError, BackupErrorKind};

/// Suffix of the file being written
const PART_SUFFIX: &str = ".part";

/// Progress of one download
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes written so far
    pub bytes_written: u64,

    /// Announced size of the body, if any
    pub total: Option<u64>,
}

/// Path of the provisional file for `destination`
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

/// Map any error to a download error
fn download_error(e: impl Into<BackupError>) -> BackupError {
    e.into().with_kind(BackupErrorKind::Download)
}

/// Download `url` to `destination`, calling `on_progress` after every chunk
/// # Errors
/// Error if the request fails, the server doesn't answer with a success, or
/// the file can't be written
pub async fn download(
    client: &reqwest::Client,
    destination: &Path,
    url: &str,
    on_progress: impl FnMut(&DownloadProgress),
) -> Result<u64, BackupError> {
    let part = part_path(destination);
    let file = File::create(&part).await.map_err(download_error)?;
    debug!("GET {url} -> {}", part.display());
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(download_error)?;
    let total = response.content_length();
    write_archive(
        file,
        &part,
        destination,
        response.bytes_stream(),
        total,
        on_progress,
    )
    .await
}

/// Copy `stream` into `file` (opened at `part`), then rename it to `destination`
pub(crate) async fn write_archive<S, E>(
    mut file: File,
    part: &Path,
    destination: &Path,
    stream: S,
    total: Option<u64>,
    on_progress: impl FnMut(&DownloadProgress),
) -> Result<u64, BackupError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BackupError>,
{
    let copied = copy_chunks(&mut file, stream, total, on_progress).await;
    // flush even on failure so the part file holds what was received
    file.flush().await.map_err(download_error)?;
    let bytes_written = copied?;
    file.sync_all().await.map_err(download_error)?;
    drop(file);
    rename(part, destination).await.map_err(download_error)?;
    Ok(bytes_written)
}

/// Write every chunk of `stream` to `file`
async fn copy_chunks<S, E>(
    file: &mut File,
    stream: S,
    total: Option<u64>,
    mut on_progress: impl FnMut(&DownloadProgress),
) -> Result<u64, BackupError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BackupError>,
{
    let mut stream = std::pin::pin!(stream);
    let mut progress = DownloadProgress {
        bytes_written: 0,
        total,
    };
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(download_error)?;
        file.write_all(&chunk).await.map_err(download_error)?;
        progress.bytes_written += chunk.len() as u64;
        on_progress(&progress);
    }
    Ok(progress.bytes_written)
}
