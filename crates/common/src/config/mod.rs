//! Configuration management for CredRank
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with CREDRANK__)
//! - Configuration files (config/default, config/{env}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// PageRank run options
    #[serde(default)]
    pub pagerank: PagerankConfig,

    /// Node and edge weight tables
    #[serde(default)]
    pub weights: WeightsConfig,

    /// Ranked table output
    #[serde(default)]
    pub report: ReportConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PagerankConfig {
    /// Weight of the synthetic self loop added to every node
    #[serde(default = "default_self_loop_weight")]
    pub self_loop_weight: f64,

    /// L1 distance below which the solver stops
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Iteration budget for the solver
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Log every solver iteration
    #[serde(default)]
    pub verbose: bool,
}

/// Weight tables keyed by address prefix, in log2 space
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WeightsConfig {
    #[serde(default)]
    pub nodes: Vec<NodeWeightConfig>,

    #[serde(default)]
    pub edges: Vec<EdgeWeightConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeWeightConfig {
    /// Node address prefix parts
    pub prefix: Vec<String>,

    /// Weight exponent, effective weight is 2^log_weight
    #[serde(default)]
    pub log_weight: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeWeightConfig {
    /// Edge address prefix parts
    pub prefix: Vec<String>,

    /// Weight exponent, effective weight is 2^log_weight
    #[serde(default)]
    pub log_weight: f64,

    /// Share of the weight flowing src -> dst, in [0, 1]
    #[serde(default = "default_directionality")]
    pub directionality: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Maximum rows printed by the ranked table
    #[serde(default = "default_report_limit")]
    pub limit: usize,

    /// Offset added to ln(score) for display
    #[serde(default = "default_log_score_offset")]
    pub log_score_offset: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,
}

// Default value functions
fn default_self_loop_weight() -> f64 { 1e-3 }
fn default_convergence_threshold() -> f64 { 1e-7 }
fn default_max_iterations() -> usize { 255 }
fn default_directionality() -> f64 { 0.5 }
fn default_report_limit() -> usize { 100 }
fn default_log_score_offset() -> f64 { 10.0 }
fn default_log_level() -> String { "info".to_string() }

impl Default for PagerankConfig {
    fn default() -> Self {
        Self {
            self_loop_weight: default_self_loop_weight(),
            convergence_threshold: default_convergence_threshold(),
            max_iterations: default_max_iterations(),
            verbose: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            limit: default_report_limit(),
            log_score_offset: default_log_score_offset(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("CREDRANK_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with CREDRANK__ prefix
            // e.g., CREDRANK__PAGERANK__MAX_ITERATIONS=50
            .add_source(
                Environment::with_prefix("CREDRANK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific configuration file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("CREDRANK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pagerank: PagerankConfig::default(),
            weights: WeightsConfig::default(),
            report: ReportConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pagerank.self_loop_weight, 1e-3);
        assert_eq!(config.pagerank.convergence_threshold, 1e-7);
        assert_eq!(config.pagerank.max_iterations, 255);
        assert!(!config.pagerank.verbose);
        assert_eq!(config.report.limit, 100);
        assert!(config.weights.nodes.is_empty());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let json = r#"{
            "pagerank": { "max_iterations": 10 },
            "weights": {
                "edges": [{ "prefix": ["git", "hasParent"], "log_weight": 1.0 }]
            }
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pagerank.max_iterations, 10);
        assert_eq!(config.pagerank.self_loop_weight, 1e-3);
        assert_eq!(config.weights.edges.len(), 1);
        assert_eq!(config.weights.edges[0].directionality, 0.5);
        assert_eq!(config.observability.log_level, "info");
    }
}
