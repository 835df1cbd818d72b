//! mangareader-dl main entry point
//!
//! This is the command-line interface for downloading a series from the source site.

use clap::Parser;
use mangareader_dl::config::{load_config_with_hash, Config};
use mangareader_dl::crawler::{crawl, RunOptions};
use mangareader_dl::storage::index_path;
use mangareader_dl::Series;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// mangareader-dl: a polite, resumable comic downloader
///
/// Discovers every chapter of a series, remembers the chapter list next to
/// the downloads, and fetches each page image that is not on disk yet.
/// Requests are paced and retried so the site is never hammered.
#[derive(Parser, Debug)]
#[command(name = "mangareader-dl")]
#[command(version)]
#[command(about = "A polite, resumable comic downloader", long_about = None)]
struct Cli {
    /// Series URL, e.g. http://www.mangareader.net/onepunch-man
    #[arg(value_name = "SERIES_URL")]
    series_url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Directory the chapters are saved to (overrides the config file)
    #[arg(short = 'o', long, value_name = "TARGET_DIR")]
    target_dir: Option<PathBuf>,

    /// Only download these chapters (repeatable)
    #[arg(long = "chapter", value_name = "N")]
    chapters: Vec<u32>,

    /// Ignore the saved chapter list and discover chapters again
    #[arg(long)]
    fresh: bool,

    /// Validate config and URL and show what would be crawled
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the saved chapter list and run history, then exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    (cfg, hash)
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => (Config::default(), "defaults".to_string()),
    };

    if let Some(target_dir) = &cli.target_dir {
        config.output.target_dir = target_dir.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&cli, &config)?;
    } else if cli.stats {
        handle_stats(&cli, &config)?;
    } else {
        handle_crawl(&cli, &config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mangareader_dl=info,warn"),
            1 => EnvFilter::new("mangareader_dl=debug,info"),
            2 => EnvFilter::new("mangareader_dl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn parse_series(cli: &Cli, config: &Config) -> Result<Series, Box<dyn std::error::Error>> {
    mangareader_dl::config::validate(config)?;
    let base = url::Url::parse(&config.source.base_url)?;
    Ok(Series::parse(&cli.series_url, &base)?)
}

/// Handles the --dry-run mode: validates config and URL and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== mangareader-dl Dry Run ===\n");

    let series = parse_series(cli, config)?;

    println!("Series:");
    println!("  Name: {}", series.name);
    println!("  URL: {}", series.url);

    println!("\nCrawler Configuration:");
    println!("  Source site: {}", config.source.base_url);
    println!("  Wait time: {}s", config.crawler.wait_time);
    println!("  Timeout: {}s", config.crawler.timeout);
    println!("  Retries: {}", config.crawler.retries);
    println!("  Retry after: {}s", config.crawler.retry_after);

    let target = PathBuf::from(&config.output.target_dir);
    println!("\nOutput:");
    println!("  Directory: {}", target.display());
    println!("  Chapter list: {}", index_path(&target, &series.name).display());

    println!("\n✓ Configuration is valid");
    if cli.chapters.is_empty() {
        println!("✓ Would download every chapter of {}", series.name);
    } else {
        println!("✓ Would download chapters {:?} of {}", cli.chapters, series.name);
    }

    Ok(())
}

/// Handles the --stats mode: shows what the progress database knows
fn handle_stats(cli: &Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use mangareader_dl::output::{load_statistics, print_statistics};
    use mangareader_dl::storage::SqliteStorage;

    let series = parse_series(cli, config)?;
    let path = index_path(&PathBuf::from(&config.output.target_dir), &series.name);

    println!("Database: {}\n", path.display());
    if !path.exists() {
        println!("No chapter list saved for {} yet.", series.name);
        return Ok(());
    }

    let storage = SqliteStorage::new(&path)?;
    let stats = load_statistics(&storage, &series.name)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    cli: &Cli,
    config: &Config,
    config_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if cli.fresh {
        tracing::info!("Starting fresh crawl (ignoring saved chapter list)");
    } else {
        tracing::info!("Starting crawl (will reuse saved chapter list if present)");
    }

    let options = RunOptions {
        fresh: cli.fresh,
        chapters: cli.chapters.clone(),
    };

    match crawl(&cli.series_url, config, config_hash, &options).await {
        Ok(stats) => {
            tracing::info!(
                "Crawl completed: {} images saved, {} failed",
                stats.images_saved,
                stats.images_failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
