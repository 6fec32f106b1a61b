pub mod simulation;
pub use simulation::SimulationConfig;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Complete loadcheck configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadcheckConfig {
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub resources: ResourceManifest,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Response-shape constants of the target's API contract
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyConfig {
    /// Page size used by the target when a list query has no `limit`
    #[serde(default = "default_condition_limit")]
    pub condition_limit: usize,
    /// Number of buckets in one graph response
    #[serde(default = "default_graph_buckets")]
    pub graph_buckets: usize,
    /// Width of one graph bucket (seconds)
    #[serde(default = "default_bucket_seconds")]
    pub bucket_seconds: i64,
    /// Expected Content-Type prefix of JSON responses
    #[serde(default = "default_json_content_type")]
    pub json_content_type: String,
}

fn default_condition_limit() -> usize {
    20
}

fn default_graph_buckets() -> usize {
    24
}

fn default_bucket_seconds() -> i64 {
    3600
}

fn default_json_content_type() -> String {
    "application/json".to_string()
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            condition_limit: default_condition_limit(),
            graph_buckets: default_graph_buckets(),
            bucket_seconds: default_bucket_seconds(),
            json_content_type: default_json_content_type(),
        }
    }
}

/// Graph scoring constants, pinned to the target's published formula
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScoringConfig {
    /// Deduction when any record in the bucket is dirty
    #[serde(default = "default_dirty_penalty")]
    pub dirty_penalty: i64,
    /// Deduction when any record in the bucket is overweight
    #[serde(default = "default_overweight_penalty")]
    pub overweight_penalty: i64,
    /// Deduction when any record in the bucket is broken
    #[serde(default = "default_broken_penalty")]
    pub broken_penalty: i64,
    /// Buckets with fewer records report `missing_data`
    #[serde(default = "default_min_samples_per_bucket")]
    pub min_samples_per_bucket: usize,
}

fn default_dirty_penalty() -> i64 {
    25
}

fn default_overweight_penalty() -> i64 {
    25
}

fn default_broken_penalty() -> i64 {
    50
}

fn default_min_samples_per_bucket() -> usize {
    50
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            dirty_penalty: default_dirty_penalty(),
            overweight_penalty: default_overweight_penalty(),
            broken_penalty: default_broken_penalty(),
            min_samples_per_bucket: default_min_samples_per_bucket(),
        }
    }
}

/// Static assets every page must load, and their reference digests.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceManifest {
    /// Path prefix the assets are served under
    #[serde(default = "default_asset_prefix")]
    pub asset_prefix: String,
    /// Logical asset name -> served file name (e.g. "/index.js" -> "/index.4f2a.js")
    #[serde(default = "default_files")]
    pub files: HashMap<String, String>,
    /// Served URL path -> lowercase hex MD5 of the expected content.
    /// Paths without an entry are not checksummed.
    #[serde(default)]
    pub digests: HashMap<String, String>,
    /// Page path -> logical asset names the page must load
    #[serde(default = "default_pages")]
    pub pages: HashMap<String, Vec<String>>,
}

const DEFAULT_ASSETS: [&str; 4] = ["/favicon.svg", "/index.css", "/index.js", "/vendor.js"];

const DEFAULT_PAGES: [&str; 5] = ["/signup", "/condition", "/isu", "/register", "/login"];

fn default_asset_prefix() -> String {
    "/assets".to_string()
}

fn default_files() -> HashMap<String, String> {
    DEFAULT_ASSETS
        .iter()
        .map(|name| (name.to_string(), name.to_string()))
        .collect()
}

fn default_pages() -> HashMap<String, Vec<String>> {
    DEFAULT_PAGES
        .iter()
        .map(|page| {
            (
                page.to_string(),
                DEFAULT_ASSETS.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for ResourceManifest {
    fn default() -> Self {
        Self {
            asset_prefix: default_asset_prefix(),
            files: default_files(),
            digests: HashMap::new(),
            pages: default_pages(),
        }
    }
}

impl ResourceManifest {
    /// Served path (prefix included) of a logical asset name
    pub fn served_path(&self, logical: &str) -> Option<String> {
        self.files
            .get(logical)
            .map(|file| format!("{}{}", self.asset_prefix, file))
    }

    pub fn digest(&self, served_path: &str) -> Option<&str> {
        self.digests.get(served_path).map(String::as_str)
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<LoadcheckConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: LoadcheckConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}
