//! # News Digest
//!
//! Scrapes the headline sections of Naver News, asks an OpenAI-compatible
//! LLM for a Korean digest of each section, and writes one Markdown report.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... news_digest -c 정치 경제
//! ```
//!
//! ## Architecture
//!
//! The run is a three-stage pipeline with a barrier between stages:
//! 1. **Collect**: fetch and parse each category's section page
//! 2. **Summarize**: one LLM call per category that found articles
//! 3. **Format**: render the report and run statistics
//!
//! Per-category failures never abort the run; they show up in the report and
//! in the exit code (0 success, 2 degraded, 1 fatal).

use clap::Parser;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod category;
mod cli;
mod collector;
mod config;
mod error;
mod formatter;
mod models;
mod outputs;
mod pipeline;
mod retry;
mod scrapers;
mod summarizer;
#[cfg(test)]
mod testing;
mod utils;

use api::ChatClient;
use category::Category;
use cli::Cli;
use config::PipelineConfig;
use error::NewsError;
use outputs::{indexes, json, reports};
use pipeline::run_pipeline;
use scrapers::HttpFetcher;
use utils::ensure_writable_dir;

const EXIT_DEGRADED: u8 = 2;
/// HTTP client internals stay at warn unless RUST_LOG says otherwise.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn";

/// Build the log filter directives.
///
/// # Arguments
///
/// * `args` - Parsed CLI arguments (`--debug`, `--log-level`)
/// * `rust_log` - The `RUST_LOG` value, if set
///
/// # Returns
///
/// `--debug` wins, then `--log-level`, then `RUST_LOG`, then `info`.
fn log_directives(args: &Cli, rust_log: Option<String>) -> String {
    let level = if args.debug {
        Some("debug")
    } else {
        args.log_level.map(|l| l.directive())
    };
    match (level, rust_log) {
        (Some(level), _) => format!("{},{}", level, QUIET_DEPENDENCIES),
        (None, Some(env)) if !env.trim().is_empty() => env,
        (None, _) => format!("info,{}", QUIET_DEPENDENCIES),
    }
}

/// Open `path` for appending, creating parent directories first.
fn open_log_file(path: &str) -> std::io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber: stderr always, plus `--log-file` when given.
fn init_tracing(args: &Cli) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_new(log_directives(args, std::env::var("RUST_LOG").ok()))?;

    let file_layer = match &args.log_file {
        Some(path) => Some(
            tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();
    Ok(())
}

/// Layer CLI flags over the config file and environment, then validate.
fn build_config<F>(args: &Cli, env: F) -> error::Result<PipelineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    config.apply_env(env)?;

    if !args.categories.is_empty() {
        config.categories = Category::parse_list(&args.categories)?;
    }
    if let Some(key) = &args.api_key {
        config.llm.api_key = key.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.output_dir = dir.clone();
    }
    if let Some(dir) = &args.json_output_dir {
        config.output.json_output_dir = Some(dir.clone());
    }
    if args.no_save {
        config.output.save_file = false;
    }

    config.validate()?;
    Ok(config)
}

async fn ensure_output_dir(path: &str) -> error::Result<()> {
    ensure_writable_dir(path).await.map_err(|e| {
        error!(%path, error = %e, "Output directory is not writable (fix perms or choose a different path)");
        NewsError::Config(format!("output directory {} is not writable: {}", path, e))
    })
}

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let args = Cli::parse();

    // --- Tracing init ---
    init_tracing(&args)?;

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");
    debug!(?args.categories, ?args.output_dir, ?args.config, ?args.log_file, "Parsed CLI arguments");

    if args.list_categories {
        for category in Category::ALL {
            println!("{} {}\t{}", category.glyph(), category.name(), category.section_url());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = match build_config(&args, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    debug!(?config, "Configuration resolved");

    // Early check: ensure output dirs are writable
    if config.output.save_file {
        ensure_output_dir(&config.output.output_dir).await?;
    }
    if let Some(dir) = &config.output.json_output_dir {
        ensure_output_dir(dir).await?;
    }

    let fetcher = HttpFetcher::new(&config.scraping)?;
    let client = ChatClient::new(config.llm.clone())?;

    let outcome = run_pipeline(&config, &fetcher, &client).await;
    let state = &outcome.state;

    // ---- Markdown output ----
    if config.output.save_file {
        let output_dir = &config.output.output_dir;
        let path = reports::save_markdown_report(
            output_dir,
            args.filename.as_deref(),
            &state.final_report,
            &state.started_at,
        )
        .await?;
        println!("{}", path.display());

        if let Some(filename) = path.file_name().and_then(|n| n.to_str()) {
            if let Err(e) = indexes::update_report_index(output_dir, &state.started_at, filename).await {
                error!(error = %e, "Failed to update reports index");
            }
        }

        if config.output.auto_cleanup_days > 0 {
            match reports::cleanup_old_reports(output_dir, config.output.auto_cleanup_days).await {
                Ok(removed) => {
                    if let Err(e) = indexes::prune_report_index(output_dir, &removed).await {
                        error!(error = %e, "Failed to prune reports index");
                    }
                }
                Err(e) => warn!(error = %e, "Report cleanup failed"),
            }
        }

        if let Ok(latest) = reports::latest_reports(output_dir, 5).await {
            debug!(?latest, "Latest reports");
        }
    } else {
        println!("{}", state.final_report);
    }

    // ---- JSON output ----
    if let Some(dir) = &config.output.json_output_dir {
        if let Err(e) = json::write_run_summary(&outcome, dir).await {
            error!(error = %e, "Failed to write JSON run summary");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        total_articles = outcome.stats.total_articles,
        succeeded = outcome.stats.succeeded,
        partial = outcome.stats.partial,
        failed = outcome.stats.failed,
        "Execution complete"
    );

    if outcome.success {
        Ok(ExitCode::SUCCESS)
    } else {
        for (i, e) in state.errors.iter().enumerate() {
            warn!(index = i + 1, error = %e, "Run error");
        }
        Ok(ExitCode::from(EXIT_DEGRADED))
    }
}
