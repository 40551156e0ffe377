//! Integration tests for gitloc-core infrastructure

use gitloc_core::{
    config_error, init_logging, storage_error, validation_error, AnalysisResult, CacheEntry,
    CachePolicy, ErrorContext, GitlocConfig, GitlocError, LogFormat, LoggingConfig,
    RepositoryRef, Request, Response,
};

#[test]
fn test_error_handling() {
    let error = storage_error!("Test storage error", "test_component");

    match &error {
        GitlocError::Storage {
            message, context, ..
        } => {
            assert_eq!(message, "Test storage error");
            assert_eq!(context.component, "test_component");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Storage error"),
    }

    // Should not panic without a subscriber
    error.log();

    let network_error = GitlocError::Network {
        message: "Connection failed".to_string(),
        source: None,
        context: ErrorContext::new("test"),
    };
    assert!(network_error.is_recoverable());

    let config_error = config_error!("Invalid config", "test");
    assert!(!config_error.is_recoverable());
    assert!(config_error
        .context()
        .unwrap()
        .recovery_suggestions
        .iter()
        .any(|s| s.contains("gitloc config --init")));

    let validation = validation_error!("Bad owner", "owner", "test");
    match validation {
        GitlocError::Validation { field, .. } => assert_eq!(field.as_deref(), Some("owner")),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        include_thread: false,
        log_to_file: false,
        log_file_path: None,
        enable_performance_monitoring: false,
        filter_directives: vec!["gitloc_core=debug".to_string()],
    };

    // A global subscriber can only be installed once per process, so a second
    // call must fail cleanly instead of panicking.
    let _ = init_logging(&config);
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_log_to_file_requires_path() {
    let config = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..Default::default()
    };
    assert!(init_logging(&config).is_err());
}

#[test]
fn test_cache_entry_freshness_with_config_ttl() {
    let mut config = GitlocConfig::default();
    config.cache.ttl_seconds = 60;
    let policy = CachePolicy::new(std::time::Duration::from_secs(config.cache.ttl_seconds));

    let entry = CacheEntry::new(AnalysisResult::default(), 0);
    assert!(policy.is_fresh(&entry, 59_000));
    assert!(!policy.is_fresh(&entry, 61_000));

    let fresh = CacheEntry::now(AnalysisResult::default());
    assert!(policy.is_fresh_now(&fresh));
}

#[test]
fn test_request_response_envelope() {
    let request = Request::fetch_lines("octocat", "hello-world");
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["action"], "fetchLines");
    assert_eq!(json["data"]["owner"], "octocat");
    assert_eq!(json["data"]["repo"], "hello-world");
    assert_eq!(
        request.repository(),
        RepositoryRef::new("octocat", "hello-world")
    );

    let response = Response::Failure {
        error: "Repository not found: octocat/hello-world".to_string(),
    };
    assert!(response.is_error());
}
