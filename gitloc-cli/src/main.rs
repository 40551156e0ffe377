//! gitloc CLI - count lines of code in hosted repositories
//!
//! Downloads the repository archive, counts lines per language and caches the
//! result for an hour.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gitloc_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success,
    AnalysisResult, ErrorContext, GitlocConfig, GitlocError, GitlocResult, LoggingConfig,
    RepositoryRef, Request, Response,
};
use gitloc_repo::{
    load_proxy, save_proxy, CountOptions, FileSettingsStore, LineCountService, ProxyUpdate,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

/// Number of languages listed in the human summary
const TOP_LANGUAGES: usize = 3;

#[derive(Parser)]
#[command(name = "gitloc")]
#[command(about = "Count lines of code in a hosted Git repository")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Count lines of a repository
    Count {
        /// owner/repo, or a repository URL
        repo: String,

        /// Relay to use for this run instead of the saved one
        #[arg(long)]
        proxy: Option<String>,

        /// Ignore any cached result
        #[arg(long)]
        refresh: bool,

        /// Print the raw JSON result
        #[arg(long)]
        json: bool,
    },

    /// Answer one JSON request read from stdin
    Message,

    /// Manage the saved relay
    Proxy {
        /// Save a relay base URL (blank removes it)
        #[arg(long, conflicts_with = "remove")]
        set: Option<String>,

        /// Remove the saved relay
        #[arg(long)]
        remove: bool,

        /// Show the saved relay
        #[arg(long)]
        show: bool,
    },

    /// Manage configuration
    Config {
        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<GitlocError>() {
            Some(error) => {
                error.log();
                eprintln!("Error: {}", error.user_message());
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };

    init_logging(&logging_config).map_err(|e| GitlocError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the RUST_LOG filter"),
    })?;

    info!("Starting gitloc v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Count {
            repo,
            proxy,
            refresh,
            json,
        } => handle_count(&repo, proxy, refresh, json, &config).await?,
        Commands::Message => handle_message(&config).await?,
        Commands::Proxy { set, remove, show } => handle_proxy(set, remove, show, &config).await?,
        Commands::Config {
            init,
            show,
            validate,
        } => handle_config(init, show, validate, cli.config.as_ref(), &config)?,
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> GitlocResult<GitlocConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return GitlocConfig::from_file(path);
    }

    for path in GitlocConfig::default_locations() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return GitlocConfig::from_file(&path);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(GitlocConfig::default())
}

async fn handle_count(
    repo: &str,
    proxy: Option<String>,
    refresh: bool,
    json: bool,
    config: &GitlocConfig,
) -> GitlocResult<()> {
    log_operation_start!("count_lines", repo = %repo);

    let repository = RepositoryRef::parse(repo)?;
    let service = LineCountService::from_config(config)?;
    let options = CountOptions {
        refresh,
        relay_override: proxy,
    };

    let result = service
        .count_with(&repository, &options)
        .await
        .map_err(|e| {
            log_operation_error!("count_lines", e, repo = %repository);
            e
        })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&repository, &result);
    }

    log_operation_success!("count_lines",
        repo = %repository,
        total_lines = result.total_lines
    );
    Ok(())
}

fn print_summary(repository: &RepositoryRef, result: &AnalysisResult) {
    println!("{}: {} lines", repository, result.total_lines);
    println!(
        "Files: {} counted, {} skipped",
        result.file_count, result.skipped_files
    );

    let top = result.top_languages(TOP_LANGUAGES);
    if !top.is_empty() {
        println!("Top languages:");
        for (language, lines) in top {
            println!("  {:<16} {}", language, lines);
        }
    }
}

async fn handle_message(config: &GitlocConfig) -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")?;

    let response = match serde_json::from_str::<Request>(&input) {
        Ok(request) => {
            let service = LineCountService::from_config(config)?;
            service.handle_request(request).await
        }
        Err(e) => Response::Failure {
            error: format!("Invalid request: {}", e),
        },
    };

    println!(
        "{}",
        serde_json::to_string(&response).context("Failed to encode response")?
    );
    Ok(())
}

async fn handle_proxy(
    set: Option<String>,
    remove: bool,
    show: bool,
    config: &GitlocConfig,
) -> GitlocResult<()> {
    let store = FileSettingsStore::new(config.settings_path()?);

    let update = match (set, remove) {
        (Some(raw), _) => Some(save_proxy(&store, &raw).await?),
        (None, true) => Some(save_proxy(&store, "").await?),
        (None, false) => None,
    };

    match &update {
        Some(ProxyUpdate::Saved(proxy)) => println!("Proxy saved: {}", proxy),
        Some(ProxyUpdate::Removed) => println!("Proxy removed"),
        None => {}
    }

    if show || update.is_none() {
        match load_proxy(&store).await? {
            Some(proxy) => println!("Proxy: {}", proxy),
            None => println!("No proxy configured"),
        }
    }

    Ok(())
}

fn handle_config(
    init: bool,
    show: bool,
    validate: bool,
    config_path: Option<&PathBuf>,
    config: &GitlocConfig,
) -> GitlocResult<()> {
    if init {
        let path = match config_path {
            Some(path) => path.clone(),
            None => GitlocConfig::default_locations()
                .into_iter()
                .next()
                .ok_or_else(|| GitlocError::Config {
                    message: "Could not determine a configuration location".to_string(),
                    source: None,
                    context: ErrorContext::new("config_init")
                        .with_suggestion("Pass --config <path> explicitly"),
                })?,
        };

        GitlocConfig::default().save_to_file(&path)?;
        println!("Configuration initialized at: {:?}", path);
    }

    if show {
        let rendered = toml::to_string_pretty(config).map_err(|e| GitlocError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config_show"),
        })?;
        println!("{}", rendered);
    }

    if validate {
        match config.validate() {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => {
                println!("Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}
