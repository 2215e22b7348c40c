//! Command-line interface definitions for the news digest.
//!
//! Flags override values from the config file and the environment.

use clap::{Parser, ValueEnum};

/// Log verbosity accepted by `--log-level`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The matching `tracing` directive.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Every category, report saved under ./output/reports
/// news_digest
///
/// # Only politics and economy, printed instead of saved
/// news_digest -c 정치 경제 --no-save
///
/// # Custom config, output directory and JSON summary
/// news_digest --config config.yaml -o ./reports --json-output-dir ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about = "네이버 뉴스 헤드라인 요약")]
pub struct Cli {
    /// Categories to summarize (default: all)
    #[arg(short = 'c', long, num_args = 1..)]
    pub categories: Vec<String>,

    /// Enable debug logging (same as --log-level debug)
    #[arg(long)]
    pub debug: bool,

    /// Log level; RUST_LOG is used when neither this nor --debug is set
    #[arg(long, value_enum, ignore_case = true)]
    pub log_level: Option<LogLevel>,

    /// Also append logs to this file (parent directories are created)
    #[arg(long)]
    pub log_file: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(long)]
    pub config: Option<String>,

    /// Output directory for Markdown reports
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Report file name (default: generated from the run time)
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Also write a JSON run summary to this directory
    #[arg(long)]
    pub json_output_dir: Option<String>,

    /// Print the report to stdout instead of saving it
    #[arg(long)]
    pub no_save: bool,

    /// List supported categories and exit
    #[arg(long)]
    pub list_categories: bool,

    /// API key for the OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_digest"]);
        assert!(cli.categories.is_empty());
        assert!(!cli.debug);
        assert!(!cli.no_save);
        assert!(cli.output_dir.is_none());
        assert!(cli.log_level.is_none());
        assert!(cli.log_file.is_none());
    }

    #[test]
    fn test_cli_log_options() {
        let cli = Cli::parse_from([
            "news_digest",
            "--log-level",
            "WARNING",
            "--log-file",
            "logs/run.log",
        ]);
        assert_eq!(cli.log_level, Some(LogLevel::Warning));
        assert_eq!(cli.log_level.unwrap().directive(), "warn");
        assert_eq!(cli.log_file.as_deref(), Some("logs/run.log"));

        assert!(Cli::try_parse_from(["news_digest", "--log-level", "TRACE"]).is_err());
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_digest",
            "--categories",
            "정치",
            "경제",
            "--output-dir",
            "./reports",
            "--json-output-dir",
            "./json",
            "--no-save",
            "--debug",
        ]);

        assert_eq!(cli.categories, vec!["정치", "경제"]);
        assert_eq!(cli.output_dir.as_deref(), Some("./reports"));
        assert_eq!(cli.json_output_dir.as_deref(), Some("./json"));
        assert!(cli.no_save);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_digest",
            "-c",
            "IT/과학",
            "-o",
            "/tmp/reports",
            "-f",
            "today.md",
        ]);

        assert_eq!(cli.categories, vec!["IT/과학"]);
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/reports"));
        assert_eq!(cli.filename.as_deref(), Some("today.md"));
    }

    #[test]
    fn test_cli_list_categories() {
        let cli = Cli::parse_from(["news_digest", "--list-categories"]);
        assert!(cli.list_categories);
    }
}
