// Command-line interface.
// Clap definitions and handlers for listing pull requests, rate limits, the cache, the server and the doctor.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::cache::TtlCache;
use crate::config::Settings;
use crate::doctor;
use crate::error::Result;
use crate::github::{GitHubClient, ListPullRequestsOptions};
use crate::render::{ListingDocument, render_table};
use crate::server::{self, AppState};

#[derive(Debug, Parser)]
#[command(name = "pr-status")]
#[command(version, about = "Fetch and display open GitHub pull requests with pagination and a local cache", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Commands for pull requests
    #[command(name = "pull-requests", visible_alias = "prs")]
    PullRequests {
        #[command(subcommand)]
        command: PullRequestCommands,
    },

    /// Show the current GitHub rate limit status
    RateLimit,

    /// Clear the local cache
    CacheClear,

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },

    /// Check configuration, connectivity, pagination and caching
    Doctor,
}

#[derive(Debug, Subcommand)]
pub enum PullRequestCommands {
    /// Fetch open pull requests and display them as a table
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Repository in owner/name format
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Items per page (1..100)
    #[arg(long, default_value_t = 50)]
    pub items_per_page: u32,

    /// Max pages to fetch (default: all)
    #[arg(long)]
    pub maximum_pages_to_fetch: Option<u32>,

    /// Limit displayed rows after fetching
    #[arg(long)]
    pub maximum_rows_to_display: Option<usize>,

    /// Ignore the cache and fetch live
    #[arg(long)]
    pub bypass_cache: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    pub output_json: bool,
}

/// Execute a parsed command line. Errors are reported by the caller.
pub async fn run(cli: Cli, settings: Settings) -> Result<ExitCode> {
    match cli.command {
        Commands::PullRequests {
            command: PullRequestCommands::List(args),
        } => list_pull_requests(&settings, args).await?,
        Commands::RateLimit => rate_limit(&settings).await?,
        Commands::CacheClear => cache_clear(&settings),
        Commands::Serve { bind } => server::serve(AppState::new(settings), bind).await?,
        Commands::Doctor => return Ok(run_doctor(&settings).await),
    }
    Ok(ExitCode::SUCCESS)
}

async fn list_pull_requests(settings: &Settings, args: ListArgs) -> Result<()> {
    settings.require_token()?;
    let repository = args
        .repository
        .as_deref()
        .unwrap_or(&settings.default_repository)
        .trim()
        .to_string();

    let mut client = GitHubClient::from_settings(settings);
    let options = ListPullRequestsOptions::default()
        .page_size(args.items_per_page)
        .max_pages(args.maximum_pages_to_fetch)
        .bypass_cache(args.bypass_cache);
    let result = client.list_open_pull_requests(&repository, &options).await?;

    if args.output_json {
        let document = ListingDocument::new(&repository, &result, args.maximum_rows_to_display);
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        println!(
            "{}",
            render_table(&repository, &result, args.maximum_rows_to_display, Utc::now())
        );
    }
    Ok(())
}

async fn rate_limit(settings: &Settings) -> Result<()> {
    let mut client = GitHubClient::from_settings(settings);
    let payload = client.fetch_rate_limit_status().await?;
    println!("GitHub Rate Limit\n{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn cache_clear(settings: &Settings) {
    let mut cache = TtlCache::new(&settings.cache_dir, settings.cache_ttl);
    cache.clear();
    info!(path = %cache.file_path().display(), "cache cleared");
    println!("Cache cleared.");
}

async fn run_doctor(settings: &Settings) -> ExitCode {
    let report = doctor::run(settings, Some(Path::new(".env"))).await;
    println!("{}", report.render());
    if report.has_critical_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["pr-status", "pull-requests", "list"]).unwrap();
        let Commands::PullRequests {
            command: PullRequestCommands::List(args),
        } = cli.command
        else {
            panic!("expected pull-requests list");
        };
        assert_eq!(args.repository, None);
        assert_eq!(args.items_per_page, 50);
        assert_eq!(args.maximum_pages_to_fetch, None);
        assert!(!args.bypass_cache);
        assert!(!args.output_json);
    }

    #[test]
    fn test_prs_alias_and_options() {
        let cli = Cli::try_parse_from([
            "pr-status",
            "--verbose",
            "prs",
            "list",
            "-r",
            "rust-lang/rust",
            "--items-per-page",
            "10",
            "--maximum-pages-to-fetch",
            "2",
            "--maximum-rows-to-display",
            "5",
            "--bypass-cache",
            "--output-json",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::PullRequests {
            command: PullRequestCommands::List(args),
        } = cli.command
        else {
            panic!("expected pull-requests list");
        };
        assert_eq!(args.repository.as_deref(), Some("rust-lang/rust"));
        assert_eq!(args.items_per_page, 10);
        assert_eq!(args.maximum_pages_to_fetch, Some(2));
        assert_eq!(args.maximum_rows_to_display, Some(5));
        assert!(args.bypass_cache && args.output_json);
    }

    #[test]
    fn test_top_level_commands() {
        assert!(matches!(
            Cli::try_parse_from(["pr-status", "rate-limit"]).unwrap().command,
            Commands::RateLimit
        ));
        assert!(matches!(
            Cli::try_parse_from(["pr-status", "cache-clear"]).unwrap().command,
            Commands::CacheClear
        ));
        assert!(matches!(
            Cli::try_parse_from(["pr-status", "doctor"]).unwrap().command,
            Commands::Doctor
        ));
        let Commands::Serve { bind } = Cli::try_parse_from(["pr-status", "serve"]).unwrap().command else {
            panic!("expected serve");
        };
        assert_eq!(bind.to_string(), "127.0.0.1:8000");
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["pr-status"]).is_err());
        assert!(Cli::try_parse_from(["pr-status", "pull-requests"]).is_err());
    }

    #[tokio::test]
    async fn test_list_requires_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            cache_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let cli = Cli::try_parse_from(["pr-status", "prs", "list"]).unwrap();
        let err = run(cli, settings).await.unwrap_err();
        assert!(matches!(err, crate::error::PrStatusError::MissingToken));
        assert!(!err.is_github_error());
    }

    #[tokio::test]
    async fn test_cache_clear_empties_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            cache_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let mut cache = TtlCache::new(dir.path(), settings.cache_ttl);
        cache.set("k", serde_json::json!(1), None);

        let cli = Cli::try_parse_from(["pr-status", "cache-clear"]).unwrap();
        run(cli, settings).await.unwrap();

        let mut reopened = TtlCache::new(dir.path(), crate::cache::DEFAULT_TTL);
        assert!(reopened.get("k").is_none());
    }
}
