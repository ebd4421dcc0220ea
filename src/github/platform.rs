//! Github Platform
use super::{migration::MigrationGithub, GITHUB_API_HEADER, GITHUB_API_VERSION};
use crate::{
    errors::{BackupError, BackupErrorKind},
    platform::{MigrationApi, MigrationJob, MigrationOptions, MigrationState},
};
use log::debug;
use reqwest::{
    header::{ACCEPT, AUTHORIZATION, LOCATION, USER_AGENT},
    redirect::Policy,
    RequestBuilder,
};
use std::pin::Pin;
use url::Url;
use urlencoding::encode;

/// User agent sent to the API
const USER_AGENT_VALUE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Github client for the REST and GraphQL APIs
#[derive(Clone)]
pub struct GithubClient {
    /// Github token
    token: String,

    /// API base url, `https://api.github.com` unless on an Enterprise Server
    api_url: Url,

    /// Reqwest client
    client: reqwest::Client,

    /// Reqwest client that returns redirects instead of following them
    no_redirect_client: reqwest::Client,
}

impl GithubClient {
    /// Create a new GithubClient
    /// # Errors
    /// Error if the http client can't be built
    pub fn new(token: String, api_url: Url) -> Result<Self, BackupError> {
        let no_redirect_client = reqwest::Client::builder()
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            token,
            api_url,
            client: reqwest::Client::new(),
            no_redirect_client,
        })
    }

    /// Plain http client, without the GitHub credentials
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Full url of a REST endpoint
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.as_str().trim_end_matches('/'), path)
    }

    /// Url of the GraphQL endpoint
    ///
    /// Enterprise Servers serve REST under `/api/v3` and GraphQL under `/api/graphql`.
    pub(crate) fn graphql_endpoint(&self) -> String {
        let base = self.api_url.as_str().trim_end_matches('/');
        match base.strip_suffix("/v3") {
            Some(prefix) => format!("{prefix}/graphql"),
            None => format!("{base}/graphql"),
        }
    }

    /// Add the authentication and API headers
    pub(crate) fn github_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(GITHUB_API_HEADER, GITHUB_API_VERSION)
    }

    /// Url of one migration
    fn migration_url(&self, organization: &str, id: u64) -> String {
        self.endpoint(&format!("/orgs/{}/migrations/{}", encode(organization), id))
    }
}

impl MigrationApi for GithubClient {
    fn start_migration(
        &self,
        organization: &str,
        options: MigrationOptions,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<MigrationJob, BackupError>> + Send + '_>>
    {
        let url = self.endpoint(&format!("/orgs/{}/migrations", encode(organization)));
        Box::pin(async move {
            debug!("POST {url}");
            let request = self
                .github_headers(self.client.post(&url))
                .json(&options)
                .send();
            let response = request.await?;
            if !response.status().is_success() {
                let text = response.text().await?;
                return Err(BackupError::new(BackupErrorKind::Submission).with_text(&text));
            }
            let text = response.text().await?;
            let migration: MigrationGithub = serde_json::from_str(&text)?;
            Ok(migration.into())
        })
    }

    fn migration_status(
        &self,
        organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<MigrationState, BackupError>> + Send + '_>>
    {
        let url = self.migration_url(organization, id);
        Box::pin(async move {
            debug!("GET {url}");
            let request = self.github_headers(self.client.get(&url)).send();
            let response = request.await?;
            if !response.status().is_success() {
                let text = response.text().await?;
                return Err(BackupError::new(BackupErrorKind::Poll).with_text(&text));
            }
            let text = response.text().await?;
            let migration: MigrationGithub = serde_json::from_str(&text)?;
            Ok(MigrationState::from(migration.state.as_str()))
        })
    }

    fn archive_url(
        &self,
        organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<String, BackupError>> + Send + '_>> {
        let url = format!("{}/archive", self.migration_url(organization, id));
        Box::pin(async move {
            debug!("GET {url}");
            let request = self
                .github_headers(self.no_redirect_client.get(&url))
                .send();
            let response = request.await?;
            let status = response.status();
            if !status.is_redirection() {
                let text = response.text().await?;
                return Err(BackupError::new(BackupErrorKind::Poll)
                    .with_text(&format!("expected a redirect, got {status}: {text}")));
            }
            match response
                .headers()
                .get(LOCATION)
                .and_then(|location| location.to_str().ok())
            {
                Some(location) => Ok(location.to_string()),
                None => Err(BackupError::new(BackupErrorKind::Poll)
                    .with_text("archive redirect without a location")),
            }
        })
    }

    fn unlock_repo(
        &self,
        organization: &str,
        id: u64,
        repo_name: &str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), BackupError>> + Send + '_>> {
        let url = format!(
            "{}/repos/{}/lock",
            self.migration_url(organization, id),
            encode(repo_name)
        );
        Box::pin(async move {
            debug!("DELETE {url}");
            let request = self.github_headers(self.client.delete(&url)).send();
            let response = request.await?;
            if !response.status().is_success() {
                let text = response.text().await?;
                return Err(BackupError::new(BackupErrorKind::Unlock).with_text(&text));
            }
            Ok(())
        })
    }

    fn delete_migration(
        &self,
        organization: &str,
        id: u64,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), BackupError>> + Send + '_>> {
        let url = format!("{}/archive", self.migration_url(organization, id));
        Box::pin(async move {
            debug!("DELETE {url}");
            let request = self.github_headers(self.client.delete(&url)).send();
            let response = request.await?;
            if !response.status().is_success() {
                let text = response.text().await?;
                return Err(BackupError::new(BackupErrorKind::Cleanup).with_text(&text));
            }
            Ok(())
        })
    }
}
