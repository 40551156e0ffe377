//! Configuration management

use crate::error::{ErrorContext, GitlocError, GitlocResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GitlocConfig {
    pub github: GitHubConfig,
    pub cache: CacheConfig,
    pub settings: SettingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API root used for metadata and zipball downloads
    pub api_base_url: String,
    /// codeload-style archive host
    pub codeload_base_url: String,
    /// Web host serving `/archive/` downloads
    pub web_base_url: String,
    /// Additional hosts mirroring the web archive paths
    pub archive_mirrors: Vec<String>,
    pub user_agent: String,
    /// Per-request timeout; `None` leaves it to the transport
    pub timeout_seconds: Option<u64>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            codeload_base_url: "https://codeload.github.com".to_string(),
            web_base_url: "https://github.com".to_string(),
            archive_mirrors: Vec::new(),
            user_agent: format!("gitloc/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    /// Defaults to `<user cache dir>/gitloc`
    pub directory: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Defaults to `<user config dir>/gitloc/settings.json`
    pub path: Option<String>,
}

impl GitlocConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GitlocResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GitlocError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GitlocConfig = toml::from_str(&content).map_err(|e| GitlocError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GitlocResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| GitlocError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content).map_err(|e| GitlocError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> GitlocResult<()> {
        let mut urls = vec![
            ("github.api_base_url", &self.github.api_base_url),
            ("github.codeload_base_url", &self.github.codeload_base_url),
            ("github.web_base_url", &self.github.web_base_url),
        ];
        for mirror in &self.github.archive_mirrors {
            urls.push(("github.archive_mirrors", mirror));
        }

        for (field, value) in urls {
            if let Err(e) = url::Url::parse(value) {
                return Err(GitlocError::Config {
                    message: format!("{} is not a valid URL ('{}'): {}", field, value, e),
                    source: Some(Box::new(e)),
                    context: ErrorContext::new("config")
                        .with_operation("validate")
                        .with_suggestion("Use an absolute URL such as https://api.github.com"),
                });
            }
        }

        if self.github.user_agent.trim().is_empty() {
            return Err(GitlocError::Config {
                message: "github.user_agent must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("GitHub rejects requests without a User-Agent"),
            });
        }

        if self.cache.ttl_seconds == 0 {
            return Err(GitlocError::Config {
                message: "cache.ttl_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set cache.enabled = false to turn caching off"),
            });
        }

        Ok(())
    }

    /// Directory holding cached results
    pub fn cache_directory(&self) -> GitlocResult<PathBuf> {
        if let Some(dir) = &self.cache.directory {
            return Ok(expand_home(dir));
        }

        dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|d| d.join(".cache")))
            .map(|d| d.join("gitloc"))
            .ok_or_else(|| GitlocError::Config {
                message: "Could not determine cache directory".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("cache_directory")
                    .with_suggestion("Set cache.directory explicitly"),
            })
    }

    /// File backing the settings store
    pub fn settings_path(&self) -> GitlocResult<PathBuf> {
        if let Some(path) = &self.settings.path {
            return Ok(expand_home(path));
        }

        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
            .map(|d| d.join("gitloc").join("settings.json"))
            .ok_or_else(|| GitlocError::Config {
                message: "Could not determine settings location".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("settings_path")
                    .with_suggestion("Set settings.path explicitly"),
            })
    }

    /// Candidate config files, in lookup order
    pub fn default_locations() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|d| d.join("gitloc").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".gitloc").join("config.toml")),
            Some(PathBuf::from("gitloc.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = GitlocConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_seconds, 3600);
        assert!(config.github.timeout_seconds.is_none());
        assert!(config.github.user_agent.starts_with("gitloc/"));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("gitloc.toml");

        let mut config = GitlocConfig::default();
        config.github.archive_mirrors = vec!["https://mirror.example.com".to_string()];
        config.cache.ttl_seconds = 120;
        config.save_to_file(&path).unwrap();

        let loaded = GitlocConfig::from_file(&path).unwrap();
        assert_eq!(loaded.github.archive_mirrors, config.github.archive_mirrors);
        assert_eq!(loaded.cache.ttl_seconds, 120);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gitloc.toml");
        std::fs::write(&path, "[cache]\nttl_seconds = 60\n").unwrap();

        let loaded = GitlocConfig::from_file(&path).unwrap();
        assert_eq!(loaded.cache.ttl_seconds, 60);
        assert!(loaded.cache.enabled);
        assert_eq!(loaded.github.api_base_url, "https://api.github.com");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = GitlocConfig::default();
        config.cache.ttl_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = GitlocConfig::default();
        config.github.codeload_base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = GitlocConfig::default();
        config.github.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_directories() {
        let mut config = GitlocConfig::default();
        config.cache.directory = Some("/tmp/gitloc-cache".to_string());
        config.settings.path = Some("/tmp/gitloc-settings.json".to_string());

        assert_eq!(
            config.cache_directory().unwrap(),
            PathBuf::from("/tmp/gitloc-cache")
        );
        assert_eq!(
            config.settings_path().unwrap(),
            PathBuf::from("/tmp/gitloc-settings.json")
        );
    }
}
