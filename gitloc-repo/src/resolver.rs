//! Archive resolver
//!
//! Turns a repository reference into archive bytes. The default branch comes
//! from the metadata API; every candidate archive URL is then tried in a fixed
//! order, optionally through a relay, until one answers with a 2xx.

use crate::api::{GitHubApiClient, HttpTransport, ARCHIVE_ACCEPT};
use gitloc_core::{ErrorContext, GitHubConfig, GitlocError, GitlocResult, RepositoryRef};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Branches tried after the default one
pub const FALLBACK_BRANCHES: [&str; 2] = ["main", "master"];

/// Hosts used to build candidate archive URLs
#[derive(Debug, Clone)]
pub struct ArchiveHosts {
    pub api_base_url: String,
    pub codeload_base_url: String,
    pub web_base_url: String,
    pub mirrors: Vec<String>,
}

impl Default for ArchiveHosts {
    fn default() -> Self {
        Self::from(&GitHubConfig::default())
    }
}

impl From<&GitHubConfig> for ArchiveHosts {
    fn from(config: &GitHubConfig) -> Self {
        let trim = |url: &str| url.trim_end_matches('/').to_string();
        Self {
            api_base_url: trim(&config.api_base_url),
            codeload_base_url: trim(&config.codeload_base_url),
            web_base_url: trim(&config.web_base_url),
            mirrors: config.archive_mirrors.iter().map(|m| trim(m)).collect(),
        }
    }
}

/// Archive bytes plus where they came from
#[derive(Debug, Clone)]
pub struct ResolvedArchive {
    pub payload: Vec<u8>,
    pub url: String,
    pub branch: String,
    /// Attempts made, including the successful one
    pub attempts: usize,
}

/// One download attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub url: String,
    pub branch: String,
}

/// Default branch first, then `main` and `master`, without duplicates
pub fn branch_candidates(default_branch: &str) -> Vec<String> {
    let mut branches: Vec<String> = Vec::with_capacity(3);
    for branch in std::iter::once(default_branch).chain(FALLBACK_BRANCHES) {
        let branch = branch.trim();
        if !branch.is_empty() && !branches.iter().any(|b| b == branch) {
            branches.push(branch.to_string());
        }
    }
    branches
}

/// Archive URL variants for one branch, in attempt order
pub fn archive_urls(hosts: &ArchiveHosts, repo: &RepositoryRef, branch: &str) -> Vec<String> {
    let (owner, name) = (&repo.owner, &repo.name);
    let mut urls = vec![
        format!(
            "{}/{}/{}/zip/refs/heads/{}",
            hosts.codeload_base_url, owner, name, branch
        ),
        format!("{}/{}/{}/zip/{}", hosts.codeload_base_url, owner, name, branch),
        format!(
            "{}/repos/{}/{}/zipball/{}",
            hosts.api_base_url, owner, name, branch
        ),
    ];

    for web in std::iter::once(&hosts.web_base_url).chain(&hosts.mirrors) {
        urls.push(format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            web, owner, name, branch
        ));
        urls.push(format!("{}/{}/{}/archive/{}.zip", web, owner, name, branch));
    }

    urls
}

/// Ensure a scheme and drop one trailing slash. Blank input means no relay.
pub fn normalize_relay(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut relay = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    if relay.ends_with('/') {
        relay.pop();
    }
    Some(relay)
}

fn strip_scheme(url: &str) -> &str {
    url.split_once("://").map(|(_, rest)| rest).unwrap_or(url)
}

/// Forms tried for one candidate when a relay is configured: full URL
/// appended, scheme-less URL appended, `/proxy/` prefixed, then direct.
pub fn relay_variants(relay: &str, url: &str) -> Vec<String> {
    vec![
        format!("{}/{}", relay, url),
        format!("{}/{}", relay, strip_scheme(url)),
        format!("{}/proxy/{}", relay, url),
        url.to_string(),
    ]
}

/// Flat attempt list. Branch order outranks URL variant order, and relay
/// forms of a URL come before the next URL.
pub fn build_attempts(
    hosts: &ArchiveHosts,
    repo: &RepositoryRef,
    branches: &[String],
    relay: Option<&str>,
) -> Vec<Attempt> {
    let mut attempts = Vec::new();
    for branch in branches {
        for url in archive_urls(hosts, repo, branch) {
            match relay {
                Some(relay) => attempts.extend(relay_variants(relay, &url).into_iter().map(
                    |url| Attempt {
                        url,
                        branch: branch.clone(),
                    },
                )),
                None => attempts.push(Attempt {
                    url,
                    branch: branch.clone(),
                }),
            }
        }
    }
    attempts
}

/// Resolves repositories to archive payloads
pub struct ArchiveResolver {
    transport: Arc<dyn HttpTransport>,
    api: GitHubApiClient,
    hosts: ArchiveHosts,
}

impl ArchiveResolver {
    pub fn new(transport: Arc<dyn HttpTransport>, hosts: ArchiveHosts) -> Self {
        let api = GitHubApiClient::new(transport.clone(), hosts.api_base_url.clone());
        Self {
            transport,
            api,
            hosts,
        }
    }

    pub fn hosts(&self) -> &ArchiveHosts {
        &self.hosts
    }

    /// Download the archive for `repo`, trying every candidate in order.
    ///
    /// `relay` is the raw setting value; it is normalized here.
    pub async fn resolve(
        &self,
        repo: &RepositoryRef,
        relay: Option<&str>,
    ) -> GitlocResult<ResolvedArchive> {
        let metadata = self.api.get_repository_metadata(repo).await?;
        if metadata.is_empty() {
            return Err(GitlocError::EmptyRepository {
                repository: repo.to_string(),
                context: ErrorContext::new("archive_resolver")
                    .with_operation("resolve")
                    .with_suggestion("There is nothing to count until the first commit"),
            });
        }

        let branches = branch_candidates(&metadata.default_branch);
        let relay = relay.and_then(normalize_relay);
        let attempts = build_attempts(&self.hosts, repo, &branches, relay.as_deref());

        info!(
            repository = %repo,
            default_branch = %metadata.default_branch,
            candidates = attempts.len(),
            relay = relay.as_deref().unwrap_or("none"),
            "Resolving repository archive"
        );

        self.download_first(repo, &attempts).await
    }

    /// Try `attempts` strictly in order and return the first 2xx body
    pub async fn download_first(
        &self,
        repo: &RepositoryRef,
        attempts: &[Attempt],
    ) -> GitlocResult<ResolvedArchive> {
        let mut last_error = String::from("no download candidates");
        let mut last_status = None;

        for (index, attempt) in attempts.iter().enumerate() {
            debug!(attempt = index + 1, url = %attempt.url, "Trying archive source");

            match self.transport.get(&attempt.url, ARCHIVE_ACCEPT).await {
                Ok(response) if response.is_success() => {
                    if response.body.is_empty() {
                        return Err(GitlocError::CorruptedPayload {
                            message: format!("{} returned an empty archive", attempt.url),
                            context: ErrorContext::new("archive_resolver")
                                .with_operation("download")
                                .with_metadata("repository", &repo.to_string())
                                .with_suggestion("Retry, or configure a different relay"),
                        });
                    }

                    info!(
                        repository = %repo,
                        url = %attempt.url,
                        bytes = response.body.len(),
                        attempts = index + 1,
                        "Downloaded repository archive"
                    );
                    return Ok(ResolvedArchive {
                        payload: response.body,
                        url: attempt.url.clone(),
                        branch: attempt.branch.clone(),
                        attempts: index + 1,
                    });
                }
                Ok(response) => {
                    last_status = Some(response.status);
                    last_error = format!("{} from {}", response.status_line(), attempt.url);
                    warn!("Archive download failed: {}", last_error);
                }
                Err(e) => {
                    last_status = None;
                    last_error = format!("{} ({})", e, attempt.url);
                    warn!("Archive download failed: {}", last_error);
                }
            }
        }

        Err(GitlocError::DownloadExhausted {
            attempts: attempts.len(),
            last_status,
            last_error,
            context: ErrorContext::new("archive_resolver")
                .with_operation("download")
                .with_metadata("repository", &repo.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{metadata_json, ScriptedTransport};

    fn repo() -> RepositoryRef {
        RepositoryRef::new("o", "r")
    }

    fn resolver(transport: Arc<ScriptedTransport>) -> ArchiveResolver {
        ArchiveResolver::new(transport, ArchiveHosts::default())
    }

    #[test]
    fn test_branch_candidates_order_and_dedup() {
        assert_eq!(branch_candidates("feature-x"), vec!["feature-x", "main", "master"]);
        assert_eq!(branch_candidates("main"), vec!["main", "master"]);
        assert_eq!(branch_candidates("master"), vec!["master", "main"]);
        assert_eq!(branch_candidates(""), vec!["main", "master"]);
    }

    #[test]
    fn test_archive_url_block() {
        let urls = archive_urls(&ArchiveHosts::default(), &repo(), "main");
        assert_eq!(
            urls,
            vec![
                "https://codeload.github.com/o/r/zip/refs/heads/main",
                "https://codeload.github.com/o/r/zip/main",
                "https://api.github.com/repos/o/r/zipball/main",
                "https://github.com/o/r/archive/refs/heads/main.zip",
                "https://github.com/o/r/archive/main.zip",
            ]
        );
    }

    #[test]
    fn test_mirrors_extend_the_block() {
        let hosts = ArchiveHosts {
            mirrors: vec!["https://mirror.example.com".to_string()],
            ..Default::default()
        };
        let urls = archive_urls(&hosts, &repo(), "main");
        assert_eq!(urls.len(), 7);
        assert_eq!(
            urls[5],
            "https://mirror.example.com/o/r/archive/refs/heads/main.zip"
        );
    }

    #[test]
    fn test_branch_blocks_stay_contiguous() {
        let branches = branch_candidates("feature-x");
        let attempts = build_attempts(&ArchiveHosts::default(), &repo(), &branches, None);
        assert_eq!(attempts.len(), 15);

        let order: Vec<&str> = attempts.iter().map(|a| a.branch.as_str()).collect();
        assert!(order[..5].iter().all(|b| *b == "feature-x"));
        assert!(order[5..10].iter().all(|b| *b == "main"));
        assert!(order[10..].iter().all(|b| *b == "master"));
    }

    #[test]
    fn test_normalize_relay() {
        assert_eq!(normalize_relay("example.com"), Some("http://example.com".to_string()));
        assert_eq!(
            normalize_relay("https://relay.example.com/"),
            Some("https://relay.example.com".to_string())
        );
        assert_eq!(
            normalize_relay("  example.com//  "),
            Some("http://example.com/".to_string())
        );
        assert_eq!(normalize_relay("   "), None);
    }

    #[test]
    fn test_relay_rewriting_order() {
        let relay = normalize_relay("example.com").unwrap();
        let variants = relay_variants(&relay, "https://codeload.github.com/o/r/zip/main");
        assert_eq!(
            variants,
            vec![
                "http://example.com/https://codeload.github.com/o/r/zip/main",
                "http://example.com/codeload.github.com/o/r/zip/main",
                "http://example.com/proxy/https://codeload.github.com/o/r/zip/main",
                "https://codeload.github.com/o/r/zip/main",
            ]
        );
    }

    #[test]
    fn test_relay_forms_precede_next_candidate() {
        let attempts = build_attempts(
            &ArchiveHosts::default(),
            &repo(),
            &["main".to_string()],
            Some("http://example.com"),
        );
        assert_eq!(attempts.len(), 20);
        assert_eq!(
            attempts[0].url,
            "http://example.com/https://codeload.github.com/o/r/zip/refs/heads/main"
        );
        assert_eq!(
            attempts[3].url,
            "https://codeload.github.com/o/r/zip/refs/heads/main"
        );
        assert_eq!(
            attempts[4].url,
            "http://example.com/https://codeload.github.com/o/r/zip/main"
        );
    }

    #[tokio::test]
    async fn test_empty_repository_short_circuits() {
        let transport = Arc::new(
            ScriptedTransport::new().respond(
                "https://api.github.com/repos/o/r",
                200,
                metadata_json("r", "main", 0),
            ),
        );

        let error = resolver(transport.clone())
            .resolve(&repo(), None)
            .await
            .unwrap_err();
        assert!(matches!(error, GitlocError::EmptyRepository { .. }));
        assert_eq!(transport.requests(), vec!["https://api.github.com/repos/o/r"]);
    }

    #[tokio::test]
    async fn test_metadata_status_mapping() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("https://api.github.com/repos/o/forbidden", 403, "rate limited")
                .respond("https://api.github.com/repos/o/broken", 500, "oops")
                .respond("https://api.github.com/repos/o/garbled", 200, "not json"),
        );
        let resolver = resolver(transport);

        let missing = resolver
            .resolve(&RepositoryRef::new("o", "missing"), None)
            .await
            .unwrap_err();
        assert!(matches!(missing, GitlocError::NotFound { .. }));

        let forbidden = resolver
            .resolve(&RepositoryRef::new("o", "forbidden"), None)
            .await
            .unwrap_err();
        assert!(matches!(forbidden, GitlocError::Forbidden { .. }));

        let broken = resolver
            .resolve(&RepositoryRef::new("o", "broken"), None)
            .await
            .unwrap_err();
        assert!(matches!(broken, GitlocError::MetadataFetch { .. }));
        assert!(broken.to_string().contains("HTTP 500"));

        let garbled = resolver
            .resolve(&RepositoryRef::new("o", "garbled"), None)
            .await
            .unwrap_err();
        assert!(matches!(garbled, GitlocError::MetadataFetch { .. }));
    }

    #[tokio::test]
    async fn test_falls_back_to_later_candidates() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    "https://api.github.com/repos/o/r",
                    200,
                    metadata_json("r", "feature-x", 42),
                )
                .respond(
                    "https://codeload.github.com/o/r/zip/refs/heads/feature-x",
                    500,
                    "",
                )
                .fail(
                    "https://codeload.github.com/o/r/zip/feature-x",
                    "connection reset",
                )
                .respond(
                    "https://api.github.com/repos/o/r/zipball/feature-x",
                    200,
                    b"PK\x05\x06".to_vec(),
                ),
        );

        let resolved = resolver(transport.clone())
            .resolve(&repo(), None)
            .await
            .unwrap();
        assert_eq!(resolved.attempts, 3);
        assert_eq!(resolved.branch, "feature-x");
        assert_eq!(resolved.url, "https://api.github.com/repos/o/r/zipball/feature-x");
        assert_eq!(resolved.payload, b"PK\x05\x06".to_vec());
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_relay_is_tried_first() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    "https://api.github.com/repos/o/r",
                    200,
                    metadata_json("r", "main", 42),
                )
                .respond(
                    "http://example.com/https://codeload.github.com/o/r/zip/refs/heads/main",
                    200,
                    b"zipbytes".to_vec(),
                ),
        );

        let resolved = resolver(transport.clone())
            .resolve(&repo(), Some("example.com/"))
            .await
            .unwrap();
        assert_eq!(resolved.attempts, 1);
        assert_eq!(
            transport.requests()[1],
            "http://example.com/https://codeload.github.com/o/r/zip/refs/heads/main"
        );
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_failure() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    "https://api.github.com/repos/o/r",
                    200,
                    metadata_json("r", "main", 42),
                )
                .respond("https://github.com/o/r/archive/master.zip", 400, ""),
        );

        let error = resolver(transport.clone())
            .resolve(&repo(), None)
            .await
            .unwrap_err();
        match &error {
            GitlocError::DownloadExhausted {
                attempts,
                last_status,
                last_error,
                ..
            } => {
                assert_eq!(*attempts, 10);
                assert_eq!(*last_status, Some(400));
                assert_eq!(
                    last_error,
                    "HTTP 400 Bad Request from https://github.com/o/r/archive/master.zip"
                );
            }
            other => panic!("Expected DownloadExhausted, got {:?}", other),
        }
        assert!(error.to_string().contains("likely private, nonexistent"));
        // metadata + 2 branches x 5 variants
        assert_eq!(transport.requests().len(), 11);
    }

    #[tokio::test]
    async fn test_guidance_follows_status_not_repository_name() {
        let transport = Arc::new(ScriptedTransport::new().respond(
            "https://api.github.com/repos/o/r400",
            200,
            metadata_json("r400", "main", 42),
        ));

        let error = resolver(transport)
            .resolve(&RepositoryRef::new("o", "r400"), None)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            GitlocError::DownloadExhausted {
                last_status: Some(404),
                ..
            }
        ));
        let message = error.to_string();
        assert!(message.contains("archive not found"));
        assert!(!message.contains("likely private"));
    }

    #[tokio::test]
    async fn test_transport_failure_clears_status() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    "https://api.github.com/repos/x404/r",
                    200,
                    metadata_json("r", "main", 42),
                )
                .fail("https://github.com/x404/r/archive/master.zip", "connection reset"),
        );

        let error = resolver(transport)
            .resolve(&RepositoryRef::new("x404", "r"), None)
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            GitlocError::DownloadExhausted {
                last_status: None,
                ..
            }
        ));
        assert!(!error.to_string().contains("archive not found"));
    }

    #[tokio::test]
    async fn test_empty_payload_is_corrupted() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond(
                    "https://api.github.com/repos/o/r",
                    200,
                    metadata_json("r", "main", 42),
                )
                .respond(
                    "https://codeload.github.com/o/r/zip/refs/heads/main",
                    200,
                    Vec::<u8>::new(),
                ),
        );

        let error = resolver(transport).resolve(&repo(), None).await.unwrap_err();
        assert!(matches!(error, GitlocError::CorruptedPayload { .. }));
    }
}
