//! Core data type definitions

use crate::error::{ErrorContext, GitlocError, GitlocResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Repository identity - owner plus repository name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/repo`, a page path such as `/owner/repo/tree/main`,
    /// or a full repository URL.
    pub fn parse(input: &str) -> GitlocResult<Self> {
        let trimmed = input.trim();
        let path = match trimmed.find("://") {
            Some(scheme_end) => {
                let after_scheme = &trimmed[scheme_end + 3..];
                // Drop the host
                after_scheme
                    .split_once('/')
                    .map(|(_, path)| path)
                    .unwrap_or("")
            }
            // `github.com/owner/repo`: owners never contain a dot, so a
            // dotted first segment is a host
            None => match trimmed.split_once('/') {
                Some((host, path)) if host.contains('.') => path,
                _ => trimmed,
            },
        };

        let mut segments = path
            .split(['?', '#'])
            .next()
            .unwrap_or("")
            .split('/')
            .filter(|segment| !segment.is_empty());

        match (segments.next(), segments.next()) {
            (Some(owner), Some(name)) => {
                let name = name.trim_end_matches(".git");
                if name.is_empty() {
                    return Err(invalid_reference(input));
                }
                Ok(Self::new(owner, name))
            }
            _ => Err(invalid_reference(input)),
        }
    }

    /// Key used by the result cache: `owner/name`
    pub fn cache_key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

fn invalid_reference(input: &str) -> GitlocError {
    GitlocError::Validation {
        message: format!("'{}' does not name a repository", input),
        field: Some("repository".to_string()),
        context: ErrorContext::new("repository_ref")
            .with_operation("parse")
            .with_suggestion("Use the form owner/repo or https://github.com/owner/repo"),
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Line count summary for one repository archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub total_lines: u64,
    pub file_count: u64,
    pub skipped_files: u64,
    pub language_stats: BTreeMap<String, u64>,
}

impl AnalysisResult {
    /// Largest languages by line count, ties broken by name
    pub fn top_languages(&self, limit: usize) -> Vec<(&str, u64)> {
        let mut languages: Vec<(&str, u64)> = self
            .language_stats
            .iter()
            .map(|(language, lines)| (language.as_str(), *lines))
            .collect();
        languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        languages.truncate(limit);
        languages
    }
}

/// Cached result with the epoch-millisecond time it was stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: AnalysisResult,
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(result: AnalysisResult, timestamp: i64) -> Self {
        Self { result, timestamp }
    }

    /// Entry stamped with the current time
    pub fn now(result: AnalysisResult) -> Self {
        Self::new(result, chrono::Utc::now().timestamp_millis())
    }
}

/// Action name understood by the request handler
pub const FETCH_LINES_ACTION: &str = "fetchLines";

/// Inbound request envelope: `{action, data: {owner, repo}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub action: String,
    pub data: RequestData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestData {
    pub owner: String,
    pub repo: String,
}

impl Request {
    pub fn fetch_lines(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            action: FETCH_LINES_ACTION.to_string(),
            data: RequestData {
                owner: owner.into(),
                repo: repo.into(),
            },
        }
    }

    pub fn repository(&self) -> RepositoryRef {
        RepositoryRef::new(&self.data.owner, &self.data.repo)
    }
}

/// Outbound response: either the result itself or `{error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success(AnalysisResult),
    Failure { error: String },
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Failure { .. })
    }
}
