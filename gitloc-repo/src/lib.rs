//! gitloc repository analysis
//!
//! Resolves a hosted repository to its source archive, counts lines per
//! language and caches the result.

pub mod analyzer;
pub mod api;
pub mod cache;
pub mod filter;
pub mod languages;
pub mod resolver;
pub mod service;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use analyzer::{analyze, classify_entry, count_lines, EntryOutcome, SkipReason};
pub use api::{
    ApiClientConfig, GitHubApiClient, HttpResponse, HttpTransport, RepositoryMetadata,
    ReqwestTransport,
};
pub use cache::{FileCache, MemoryCache};
pub use languages::language_for_extension;
pub use resolver::{ArchiveHosts, ArchiveResolver, Attempt, ResolvedArchive};
pub use service::{CountOptions, LineCountService};
pub use settings::{
    load_proxy, save_proxy, FileSettingsStore, MemorySettingsStore, ProxyUpdate,
};
