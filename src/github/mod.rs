//! GitHub API module.
pub(crate) mod migration;
pub(crate) mod platform;
pub(crate) mod repositories;

pub use platform::GithubClient;

/// GitHub API URL
pub(crate) const GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub API Header
const GITHUB_API_HEADER: &str = "X-GitHub-Api-Version";

/// GitHub API Version
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Maximum page size of the GraphQL connections
const GRAPHQL_PAGE_SIZE: usize = 100;
