//! GitHub API client implementation

use gitloc_core::{ErrorContext, GitlocError, GitlocResult, RepositoryRef};
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;

use super::{HttpTransport, API_ACCEPT};

/// Repository metadata relevant to archive download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryMetadata {
    pub name: String,
    /// Default branch name
    pub default_branch: String,
    /// Repository size in KB as reported by GitHub; zero means empty
    pub size: Option<u64>,
    pub private: bool,
}

impl RepositoryMetadata {
    pub fn is_empty(&self) -> bool {
        self.size == Some(0)
    }
}

/// GitHub repository response
#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    default_branch: String,
    size: Option<u64>,
    #[serde(default)]
    private: bool,
}

/// GitHub API client
pub struct GitHubApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!("Created GitHub API client for {}", base_url);
        Self {
            transport,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /repos/{owner}/{repo}`
    pub async fn get_repository_metadata(
        &self,
        repo: &RepositoryRef,
    ) -> GitlocResult<RepositoryMetadata> {
        let url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.name);
        debug!("Making GitHub API request to: {}", url);

        let response = self
            .transport
            .get(&url, API_ACCEPT)
            .await
            .map_err(|e| GitlocError::MetadataFetch {
                message: format!("request for {} failed: {}", repo, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_api_client")
                    .with_operation("get_repository_metadata")
                    .with_suggestion("Check network connectivity and API status"),
            })?;

        match response.status {
            404 => {
                return Err(GitlocError::NotFound {
                    resource: repo.to_string(),
                    context: ErrorContext::new("github_api_client")
                        .with_operation("get_repository_metadata")
                        .with_suggestion("Repository not found or not accessible"),
                })
            }
            403 => {
                return Err(GitlocError::Forbidden {
                    message: format!(
                        "{} for {} (API rate limit exceeded or access denied)",
                        response.status_line(),
                        repo
                    ),
                    context: ErrorContext::new("github_api_client")
                        .with_operation("get_repository_metadata")
                        .with_suggestion("Check repository permissions or rate limits"),
                })
            }
            _ if !response.is_success() => {
                return Err(GitlocError::MetadataFetch {
                    message: format!("{} for {}", response.status_line(), repo),
                    source: None,
                    context: ErrorContext::new("github_api_client")
                        .with_operation("get_repository_metadata"),
                })
            }
            _ => {}
        }

        let github_repo: GitHubRepository =
            serde_json::from_slice(&response.body).map_err(|e| GitlocError::MetadataFetch {
                message: format!("Failed to parse repository metadata: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("github_api_client")
                    .with_operation("get_repository_metadata"),
            })?;

        Ok(RepositoryMetadata {
            name: github_repo.name,
            default_branch: github_repo.default_branch,
            size: github_repo.size,
            private: github_repo.private,
        })
    }

    /// Get the default branch name
    pub async fn get_default_branch(&self, repo: &RepositoryRef) -> GitlocResult<String> {
        let metadata = self.get_repository_metadata(repo).await?;
        Ok(metadata.default_branch)
    }
}
