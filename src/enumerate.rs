//! Enumerate all the repositories of an organization
use log::info;

use crate::errors::{BackupError, BackupErrorKind};
use crate::platform::RepositoryLister;

/// List every repository of `organization`, in server order
///
/// Follows the end cursor of each page until the server reports no next page.
/// An unknown organization or one without repositories gives an empty list.
/// # Errors
/// Error if any page can't be fetched
pub async fn enumerate_repositories(
    lister: &dyn RepositoryLister,
    organization: &str,
) -> Result<Vec<String>, BackupError> {
    let mut all_repos = vec![];
    let mut cursor: Option<String> = None;
    let mut page_number: usize = 1;
    loop {
        let page = lister
            .list_page(organization, cursor.take())
            .await
            .map_err(|e| e.with_kind(BackupErrorKind::Enumeration))?;
        info!(
            "Requested github (page {}): {}",
            page_number,
            page.names.len()
        );
        all_repos.extend(page.names);
        if !page.has_next_page {
            break;
        }
        match page.end_cursor {
            Some(end_cursor) => cursor = Some(end_cursor),
            None => {
                return Err(BackupError::new(BackupErrorKind::Enumeration)
                    .with_text("next page announced without a cursor"))
            }
        }
        page_number += 1;
    }
    Ok(all_repos)
}
