//! Runtime configuration.
//!
//! [`PipelineConfig`] is a plain structure with named fields. It is built in
//! three layers: serde defaults, an optional YAML file, then environment
//! variable overrides. The pipeline itself never loads anything; it only
//! receives a validated value.
//!
//! ```yaml
//! categories: ["정치", "경제"]
//! scraping:
//!   request_delay_ms: 1500
//!   concurrency: 3
//! llm:
//!   model: gpt-4o-mini
//!   temperature: 0.3
//! output:
//!   output_dir: ./output/reports
//! ```

use crate::category::Category;
use crate::error::{NewsError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    pub user_agent: String,
    /// Minimum gap between any two requests to the source.
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    /// Total attempts per category page.
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
    pub max_articles_per_category: usize,
    pub concurrency: usize,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            request_delay_ms: 1000,
            timeout_secs: 30,
            max_attempts: 3,
            retry_delay_ms: 1000,
            max_articles_per_category: 15,
            concurrency: 3,
        }
    }
}

impl ScrapingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    /// OpenAI-compatible base URL, without the `/chat/completions` suffix.
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Random extra delay added to each backoff, up to this many milliseconds.
    pub retry_jitter_ms: u64,
    pub concurrency: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            timeout_secs: 60,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 30_000,
            retry_jitter_ms: 250,
            concurrency: 2,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
        .with_jitter(self.retry_jitter_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: String,
    /// Also write a JSON run summary here when set.
    pub json_output_dir: Option<String>,
    pub include_metadata: bool,
    pub include_stats: bool,
    pub save_file: bool,
    /// Delete saved reports older than this many days; 0 disables cleanup.
    pub auto_cleanup_days: u64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "./output/reports".to_string(),
            json_output_dir: None,
            include_metadata: true,
            include_stats: true,
            save_file: true,
            auto_cleanup_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub categories: Vec<Category>,
    /// Hard deadline for the whole run; unfinished categories are cancelled.
    pub run_timeout_secs: Option<u64>,
    pub scraping: ScrapingConfig,
    pub llm: LlmConfig,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: Category::ALL.to_vec(),
            run_timeout_secs: None,
            scraping: ScrapingConfig::default(),
            llm: LlmConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| NewsError::Config(format!("{} has an invalid value: '{}'", key, raw)))
}

impl PipelineConfig {
    /// Load from a YAML file, falling back to defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No config file given; using defaults");
            return Ok(Self::default());
        };
        if !Path::new(path).exists() {
            return Err(NewsError::Config(format!("config file not found: {}", path)));
        }
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&raw)?;
        info!(path, "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| NewsError::Config(format!("invalid config file: {}", e)))
    }

    /// Apply environment overrides using `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("OPENAI_API_BASE") {
            self.llm.api_base = v;
        }
        if let Some(v) = lookup("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("OPENAI_TEMPERATURE") {
            self.llm.temperature = parse_env("OPENAI_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("OPENAI_MAX_TOKENS") {
            self.llm.max_tokens = parse_env("OPENAI_MAX_TOKENS", &v)?;
        }
        if let Some(v) = lookup("OPENAI_TIMEOUT") {
            self.llm.timeout_secs = parse_env("OPENAI_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("OPENAI_MAX_RETRIES") {
            self.llm.max_attempts = parse_env("OPENAI_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("OPENAI_CONCURRENT_REQUESTS") {
            self.llm.concurrency = parse_env("OPENAI_CONCURRENT_REQUESTS", &v)?;
        }
        if let Some(v) = lookup("USER_AGENT") {
            self.scraping.user_agent = v;
        }
        if let Some(v) = lookup("REQUEST_DELAY_MS") {
            self.scraping.request_delay_ms = parse_env("REQUEST_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("SCRAPING_TIMEOUT") {
            self.scraping.timeout_secs = parse_env("SCRAPING_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("SCRAPING_MAX_ATTEMPTS") {
            self.scraping.max_attempts = parse_env("SCRAPING_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("MAX_ARTICLES_PER_CATEGORY") {
            self.scraping.max_articles_per_category = parse_env("MAX_ARTICLES_PER_CATEGORY", &v)?;
        }
        if let Some(v) = lookup("SCRAPING_CONCURRENT_REQUESTS") {
            self.scraping.concurrency = parse_env("SCRAPING_CONCURRENT_REQUESTS", &v)?;
        }
        if let Some(v) = lookup("OUTPUT_DIR") {
            self.output.output_dir = v;
        }
        if let Some(v) = lookup("AUTO_CLEANUP_DAYS") {
            self.output.auto_cleanup_days = parse_env("AUTO_CLEANUP_DAYS", &v)?;
        }
        if let Some(v) = lookup("RUN_TIMEOUT") {
            self.run_timeout_secs = Some(parse_env("RUN_TIMEOUT", &v)?);
        }
        Ok(())
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.llm.api_key.trim().is_empty() {
            problems.push("OPENAI_API_KEY is not set".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            problems.push(format!(
                "llm.temperature must be within 0.0-2.0 (got {})",
                self.llm.temperature
            ));
        }
        if self.llm.max_tokens < 100 {
            problems.push(format!("llm.max_tokens must be at least 100 (got {})", self.llm.max_tokens));
        }
        if self.llm.concurrency == 0 || self.scraping.concurrency == 0 {
            problems.push("concurrency limits must be at least 1".to_string());
        }
        if self.llm.max_attempts == 0 || self.scraping.max_attempts == 0 {
            problems.push("max_attempts must be at least 1".to_string());
        }
        if self.llm.timeout_secs == 0 || self.scraping.timeout_secs == 0 {
            problems.push("timeouts must be at least 1 second".to_string());
        }
        if self.scraping.max_articles_per_category == 0 {
            problems.push("scraping.max_articles_per_category must be at least 1".to_string());
        }
        if self.categories.is_empty() {
            problems.push("at least one category is required".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(NewsError::Config(problems.join("; ")))
        }
    }
}
