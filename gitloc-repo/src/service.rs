//! Line-count service: cache lookup, archive download, analysis, cache write

use crate::analyzer;
use crate::api::{ApiClientConfig, HttpTransport, ReqwestTransport};
use crate::cache::{FileCache, MemoryCache};
use crate::resolver::{ArchiveHosts, ArchiveResolver};
use crate::settings::{load_proxy, FileSettingsStore};
use gitloc_core::logging::performance::{measure_async, measure_sync};
use gitloc_core::{
    AnalysisResult, CachePolicy, ErrorContext, GitlocConfig, GitlocError, GitlocResult,
    RepositoryRef, Request, ResultCache, SettingsStore, Response, FETCH_LINES_ACTION,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-call knobs for [`LineCountService::count_with`]
#[derive(Debug, Clone, Default)]
pub struct CountOptions {
    /// Skip the cache read; the fresh result is still written back
    pub refresh: bool,
    /// Relay used for this call instead of the stored setting
    pub relay_override: Option<String>,
}

pub struct LineCountService {
    resolver: ArchiveResolver,
    cache: Arc<dyn ResultCache>,
    settings: Arc<dyn SettingsStore>,
    policy: CachePolicy,
    cache_enabled: bool,
}

impl LineCountService {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        hosts: ArchiveHosts,
        cache: Arc<dyn ResultCache>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            resolver: ArchiveResolver::new(transport, hosts),
            cache,
            settings,
            policy: CachePolicy::default(),
            cache_enabled: true,
        }
    }

    /// Wire up the production stack from configuration
    pub fn from_config(config: &GitlocConfig) -> GitlocResult<Self> {
        let transport = ReqwestTransport::new(&ApiClientConfig::from_github_config(&config.github))?;
        let settings = FileSettingsStore::new(config.settings_path()?);

        let cache: Arc<dyn ResultCache> = if config.cache.enabled {
            Arc::new(FileCache::with_cache_dir(config.cache_directory()?))
        } else {
            Arc::new(MemoryCache::new())
        };

        Ok(Self::new(
            Arc::new(transport),
            ArchiveHosts::from(&config.github),
            cache,
            Arc::new(settings),
        )
        .with_policy(CachePolicy::new(Duration::from_secs(config.cache.ttl_seconds)))
        .with_cache_enabled(config.cache.enabled))
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    /// Count lines, serving a fresh cached result when there is one
    pub async fn count_lines(&self, repo: &RepositoryRef) -> GitlocResult<AnalysisResult> {
        self.count_with(repo, &CountOptions::default()).await
    }

    /// Count lines without consulting the cache
    pub async fn refresh(&self, repo: &RepositoryRef) -> GitlocResult<AnalysisResult> {
        self.count_with(
            repo,
            &CountOptions {
                refresh: true,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn count_with(
        &self,
        repo: &RepositoryRef,
        options: &CountOptions,
    ) -> GitlocResult<AnalysisResult> {
        let key = repo.cache_key();

        if self.cache_enabled && !options.refresh {
            if let Some(result) = self.cached(&key).await {
                return Ok(result);
            }
        }

        let relay = match &options.relay_override {
            Some(relay) => Some(relay.clone()),
            None => load_proxy(self.settings.as_ref()).await?,
        };

        let archive = measure_async(
            "resolve_archive",
            self.resolver.resolve(repo, relay.as_deref()),
        )
        .await?;

        let result = measure_sync("analyze_archive", || analyzer::analyze(&archive.payload))?;

        info!(
            repository = %repo,
            branch = %archive.branch,
            total_lines = result.total_lines,
            "Counted repository lines"
        );

        if self.cache_enabled {
            if let Err(e) = self.cache.put(&key, &result).await {
                warn!("Failed to cache result for {}: {}", key, e);
            }
        }

        Ok(result)
    }

    async fn cached(&self, key: &str) -> Option<AnalysisResult> {
        match self.cache.get(key).await {
            Ok(Some(entry)) if self.policy.is_fresh_now(&entry) => {
                debug!("Serving cached result for {}", key);
                Some(entry.result)
            }
            Ok(Some(_)) => {
                debug!("Cached result for {} is stale", key);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache lookup for {} failed, recounting: {}", key, e);
                None
            }
        }
    }

    /// Answer one request envelope. Never fails: errors become `{error}`.
    pub async fn handle_request(&self, request: Request) -> Response {
        match self.dispatch(&request).await {
            Ok(result) => Response::Success(result),
            Err(e) => {
                e.log();
                Response::Failure {
                    error: e.user_message(),
                }
            }
        }
    }

    async fn dispatch(&self, request: &Request) -> GitlocResult<AnalysisResult> {
        if request.action != FETCH_LINES_ACTION {
            return Err(GitlocError::UnsupportedAction {
                action: request.action.clone(),
                context: ErrorContext::new("line_count_service")
                    .with_operation("handle_request")
                    .with_suggestion("Use the fetchLines action"),
            });
        }

        let repo = request.repository();
        for (field, value) in [("owner", &repo.owner), ("repo", &repo.name)] {
            if !is_path_segment(value) {
                return Err(GitlocError::Validation {
                    message: format!("Invalid {} in request: {:?}", field, value),
                    field: Some(field.to_string()),
                    context: ErrorContext::new("line_count_service")
                        .with_operation("handle_request")
                        .with_suggestion("owner and repo must each be a single path segment"),
                });
            }
        }

        self.count_lines(&repo).await
    }
}

/// Non-blank, no `/`, and not a `.` or `..` segment
fn is_path_segment(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.contains('/') && value != "." && value != ".."
}
