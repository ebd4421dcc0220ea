//! Organization repositories, listed through the GraphQL API
use super::{platform::GithubClient, GRAPHQL_PAGE_SIZE};
use crate::{
    errors::{BackupError, BackupErrorKind},
    platform::{RepositoryLister, RepositoryPage},
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::pin::Pin;

/// Query for one page of the organization repositories
const REPOSITORIES_QUERY: &str = "query($login: String!, $page: String, $first: Int!) {
  organization(login: $login) {
    repositories(first: $first, after: $page) {
      pageInfo { endCursor hasNextPage }
      nodes { name }
    }
  }
}";

/// GraphQL response envelope
#[derive(Deserialize, Debug)]
struct GraphqlResponse {
    /// Query data
    data: Option<QueryData>,

    /// Query errors
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

/// GraphQL error entry
#[derive(Deserialize, Debug)]
struct GraphqlError {
    /// Error message
    message: String,
}

/// Root of the query data
#[derive(Deserialize, Debug)]
struct QueryData {
    /// `None` when the login doesn't match any organization
    organization: Option<Organization>,
}

/// Organization node
#[derive(Deserialize, Debug)]
struct Organization {
    /// Repositories connection
    repositories: Repositories,
}

/// Repositories connection
#[derive(Deserialize, Debug)]
struct Repositories {
    /// Pagination info
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,

    /// Repositories of this page
    nodes: Vec<RepositoryNode>,
}

/// Pagination info of a connection
#[derive(Deserialize, Debug)]
struct PageInfo {
    /// Cursor of the last node
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,

    /// Whether more pages exist
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
}

/// Github Repository, as listed in the GraphQL connection
#[derive(Deserialize, Serialize, Default, Debug, Clone)]
pub struct RepositoryNode {
    /// Repository name
    pub name: String,
}

impl GraphqlResponse {
    /// Turn the response into a page, failing on any GraphQL error
    fn into_page(self) -> Result<RepositoryPage, BackupError> {
        if !self.errors.is_empty() {
            let messages = self
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(BackupError::new(BackupErrorKind::Enumeration).with_text(&messages));
        }
        let repositories = match self.data.and_then(|d| d.organization) {
            Some(organization) => organization.repositories,
            None => return Ok(RepositoryPage::default()),
        };
        Ok(RepositoryPage {
            names: repositories.nodes.into_iter().map(|n| n.name).collect(),
            end_cursor: repositories.page_info.end_cursor,
            has_next_page: repositories.page_info.has_next_page,
        })
    }
}

impl RepositoryLister for GithubClient {
    fn list_page(
        &self,
        organization: &str,
        after: Option<String>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<RepositoryPage, BackupError>> + Send + '_>>
    {
        let url = self.graphql_endpoint();
        let body = json!({
            "query": REPOSITORIES_QUERY,
            "variables": {
                "login": organization,
                "page": after,
                "first": GRAPHQL_PAGE_SIZE,
            }
        });
        Box::pin(async move {
            debug!("POST {url}");
            let request = self.github_headers(self.http().post(&url)).json(&body).send();
            let response = request.await?;
            if !response.status().is_success() {
                let text = response.text().await?;
                return Err(BackupError::new(BackupErrorKind::Enumeration).with_text(&text));
            }
            let text = response.text().await?;
            let response: GraphqlResponse = serde_json::from_str(&text)?;
            response.into_page()
        })
    }
}
