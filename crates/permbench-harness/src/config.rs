//! Configuration management for permbench.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use permbench_harness::config::AppConfig;
//!
//! // Load from file with env overrides
//! let config = AppConfig::load("permbench.yaml")?;
//!
//! // Or load from environment only
//! let config = AppConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use permbench_domain::resolver::ResolverConfig;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Fixture corpus size and shape
    #[serde(default)]
    pub corpus: CorpusSettings,

    /// Benchmark run settings
    #[serde(default)]
    pub benchmark: BenchmarkSettings,

    /// Tuple engine resolver settings
    #[serde(default)]
    pub resolver: ResolverSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Output locations
    #[serde(default)]
    pub output: OutputSettings,
}

/// Fixture corpus settings.
///
/// These settings can be overridden via environment variables with the
/// `PERMBENCH_` prefix and `__` as the nested key separator, e.g.
/// `PERMBENCH_CORPUS__USERS=5000`.
///
/// # Example YAML Configuration
///
/// ```yaml
/// corpus:
///   users: 2000
///   departments: 100
///   customers: 10000
///   documents: 50000
///   max_depth: 5
///   max_department_size: 40
///   max_followers: 20
///   customer_owned_ratio: 0.5
///   batch_size: 1000
///   seed: 42
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CorpusSettings {
    #[serde(default = "default_users")]
    pub users: u64,

    #[serde(default = "default_departments")]
    pub departments: u64,

    #[serde(default = "default_customers")]
    pub customers: u64,

    #[serde(default = "default_documents")]
    pub documents: u64,

    /// Deepest level of any department tree (roots are level 1).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Most direct members one department may have.
    #[serde(default = "default_max_department_size")]
    pub max_department_size: u64,

    /// Most followers one customer may have.
    #[serde(default = "default_max_followers")]
    pub max_followers: u64,

    /// Fraction of documents owned by a customer rather than a department.
    #[serde(default = "default_customer_owned_ratio")]
    pub customer_owned_ratio: f64,

    /// Tuples or rows per load batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_corpus_seed")]
    pub seed: u64,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            users: default_users(),
            departments: default_departments(),
            customers: default_customers(),
            documents: default_documents(),
            max_depth: default_max_depth(),
            max_department_size: default_max_department_size(),
            max_followers: default_max_followers(),
            customer_owned_ratio: default_customer_owned_ratio(),
            batch_size: default_batch_size(),
            seed: default_corpus_seed(),
        }
    }
}

fn default_users() -> u64 {
    2_000
}

fn default_departments() -> u64 {
    100
}

fn default_customers() -> u64 {
    10_000
}

fn default_documents() -> u64 {
    50_000
}

fn default_max_depth() -> u32 {
    5
}

fn default_max_department_size() -> u64 {
    40
}

fn default_max_followers() -> u64 {
    20
}

fn default_customer_owned_ratio() -> f64 {
    0.5
}

fn default_batch_size() -> usize {
    1_000
}

fn default_corpus_seed() -> u64 {
    42
}

/// Benchmark scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Read path: `document#viewer` checks.
    Check,
    /// Write path: membership add/remove pairs.
    Mutation,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Check => "check",
            Scenario::Mutation => "mutation",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Benchmark run settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BenchmarkSettings {
    /// Scenarios to run, in order
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<Scenario>,

    /// Rounds run first and discarded
    #[serde(default = "default_warmup_rounds")]
    pub warmup_rounds: u32,

    /// Rounds whose samples are reported
    #[serde(default = "default_measured_rounds")]
    pub measured_rounds: u32,

    /// Concurrent workers per round
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Size of the fixed check request corpus (one round issues all of them)
    #[serde(default = "default_requests")]
    pub requests: usize,

    /// Fraction of check requests drawn from known-visible pairs
    #[serde(default = "default_allowed_ratio")]
    pub allowed_ratio: f64,

    /// Membership add/remove pairs per mutation round
    #[serde(default = "default_mutations")]
    pub mutations: usize,

    /// Requests whose answers are compared across engines
    #[serde(default = "default_cross_check_samples")]
    pub cross_check_samples: usize,

    /// Deadline for each engine's run of one scenario, in milliseconds
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,

    #[serde(default = "default_request_seed")]
    pub seed: u64,

    /// Retry policy for mutations
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            warmup_rounds: default_warmup_rounds(),
            measured_rounds: default_measured_rounds(),
            concurrency: default_concurrency(),
            requests: default_requests(),
            allowed_ratio: default_allowed_ratio(),
            mutations: default_mutations(),
            cross_check_samples: default_cross_check_samples(),
            deadline_ms: default_deadline_ms(),
            seed: default_request_seed(),
            retry: RetrySettings::default(),
        }
    }
}

impl BenchmarkSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

fn default_scenarios() -> Vec<Scenario> {
    vec![Scenario::Check, Scenario::Mutation]
}

fn default_warmup_rounds() -> u32 {
    1
}

fn default_measured_rounds() -> u32 {
    3
}

fn default_concurrency() -> usize {
    8
}

fn default_requests() -> usize {
    10_000
}

fn default_allowed_ratio() -> f64 {
    0.5
}

fn default_mutations() -> usize {
    200
}

fn default_cross_check_samples() -> usize {
    1_000
}

fn default_deadline_ms() -> u64 {
    300_000
}

fn default_request_seed() -> u64 {
    7
}

/// Bounded exponential backoff for mutations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RetrySettings {
    /// Attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_backoff_ms() -> u64 {
    10
}

fn default_max_backoff_ms() -> u64 {
    500
}

/// Graph resolver settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ResolverSettings {
    /// Traversal depth limit; derived from the benchmarked corpus when unset
    pub max_depth: Option<u32>,

    /// Per-check timeout in milliseconds
    #[serde(default = "default_check_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_depth: None,
            timeout_ms: default_check_timeout_ms(),
        }
    }
}

fn default_check_timeout_ms() -> u64 {
    30_000
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,

    /// Log span close events with their timings (loader, resolver checks)
    #[serde(default)]
    pub spans: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            spans: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Output locations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OutputSettings {
    /// Where `generate` writes the corpus and `bench` reads it
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Where `bench` writes the JSON report
    #[serde(default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            report_path: default_report_path(),
        }
    }
}

fn default_corpus_path() -> String {
    "corpus.json".to_string()
}

fn default_report_path() -> String {
    "report.json".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn invalid(message: impl Into<String>) -> ConfigLoadError {
    ConfigLoadError::Invalid {
        message: message.into(),
    }
}

impl AppConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `PERMBENCH_` and use `__` as
    /// separator. For example:
    /// - `PERMBENCH_BENCHMARK__CONCURRENCY=16` overrides `benchmark.concurrency`
    /// - `PERMBENCH_CORPUS__SEED=7` overrides `corpus.seed`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            // PERMBENCH_CORPUS__USERS -> corpus.users
            .add_source(
                Environment::with_prefix("PERMBENCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(
                Environment::with_prefix("PERMBENCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Resolver configuration for a corpus whose department trees may reach
    /// `department_levels`. An explicit `resolver.max_depth` wins.
    ///
    /// Pass the depth bound of the corpus actually benchmarked: a corpus file
    /// may have been generated with deeper settings than `corpus.max_depth`.
    pub fn resolver_config(&self, department_levels: u32) -> ResolverConfig {
        let max_depth = self
            .resolver
            .max_depth
            .unwrap_or_else(|| ResolverConfig::depth_for_hierarchy(department_levels));
        ResolverConfig::default()
            .with_max_depth(max_depth)
            .with_timeout(Duration::from_millis(self.resolver.timeout_ms))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let corpus = &self.corpus;
        if corpus.max_depth == 0 {
            return Err(invalid("corpus.max_depth must be greater than 0"));
        }
        if corpus.departments == 0 && (corpus.users > 0 || corpus.documents > 0) {
            return Err(invalid(
                "corpus.departments must be greater than 0 when users or documents are generated",
            ));
        }
        if corpus.users > corpus.departments.saturating_mul(corpus.max_department_size) {
            return Err(invalid(format!(
                "corpus.users ({}) exceeds departments ({}) x max_department_size ({})",
                corpus.users, corpus.departments, corpus.max_department_size
            )));
        }
        if !(0.0..=1.0).contains(&corpus.customer_owned_ratio) {
            return Err(invalid(format!(
                "corpus.customer_owned_ratio must be within 0..=1, got: {}",
                corpus.customer_owned_ratio
            )));
        }
        if corpus.customer_owned_ratio > 0.0 && corpus.documents > 0 && corpus.customers == 0 {
            return Err(invalid(
                "corpus.customers must be greater than 0 when customers own documents",
            ));
        }
        if corpus.customer_owned_ratio < 1.0 && corpus.documents > 0 && corpus.departments == 0 {
            return Err(invalid(
                "corpus.departments must be greater than 0 when departments own documents",
            ));
        }
        if corpus.batch_size == 0 {
            return Err(invalid("corpus.batch_size must be greater than 0"));
        }

        let benchmark = &self.benchmark;
        if benchmark.concurrency == 0 {
            return Err(invalid("benchmark.concurrency must be greater than 0"));
        }
        if benchmark.measured_rounds == 0 {
            return Err(invalid("benchmark.measured_rounds must be greater than 0"));
        }
        if benchmark.requests == 0 {
            return Err(invalid("benchmark.requests must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&benchmark.allowed_ratio) {
            return Err(invalid(format!(
                "benchmark.allowed_ratio must be within 0..=1, got: {}",
                benchmark.allowed_ratio
            )));
        }
        if benchmark.deadline_ms == 0 {
            return Err(invalid("benchmark.deadline_ms must be greater than 0"));
        }
        if benchmark.retry.max_attempts == 0 {
            return Err(invalid("benchmark.retry.max_attempts must be greater than 0"));
        }
        if benchmark.retry.initial_backoff_ms > benchmark.retry.max_backoff_ms {
            return Err(invalid(
                "benchmark.retry.initial_backoff_ms must not exceed max_backoff_ms",
            ));
        }

        if self.resolver.max_depth == Some(0) {
            return Err(invalid("resolver.max_depth must be greater than 0"));
        }
        if self.resolver.timeout_ms == 0 {
            return Err(invalid("resolver.timeout_ms must be greater than 0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "logging.level must be one of: {:?}, got: {}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }
}
