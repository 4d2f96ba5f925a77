//! Analysis configuration loaded from TOML. Every field has a default, so an
//! empty file (or no file) yields the stock pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;
use crate::quality::DEFAULT_LOW_COVERAGE_THRESHOLD;
use crate::retrieval::DEFAULT_BUDGET_CHUNKS;

pub const DEFAULT_PIPELINE_VERSION: &str = "analysis_v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Recorded on every analysis run.
    #[serde(default = "default_pipeline_version")]
    pub pipeline_version: String,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub quality: QualityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_budget_chunks")]
    pub budget_chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Page coverage below this ratio raises `low_page_coverage`.
    #[serde(default = "default_low_coverage_threshold")]
    pub low_coverage_threshold: f64,
}

fn default_pipeline_version() -> String {
    DEFAULT_PIPELINE_VERSION.to_string()
}

fn default_budget_chunks() -> usize {
    DEFAULT_BUDGET_CHUNKS
}

fn default_low_coverage_threshold() -> f64 {
    DEFAULT_LOW_COVERAGE_THRESHOLD
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pipeline_version: default_pipeline_version(),
            retrieval: RetrievalConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            budget_chunks: default_budget_chunks(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            low_coverage_threshold: default_low_coverage_threshold(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded analysis config");
        Ok(config)
    }
}
