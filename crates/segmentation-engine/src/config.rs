//! Engine configuration

use crate::error::{Result, SegmentationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

const DEFAULT_THRESHOLD: u32 = 1;
const DEFAULT_LAYOUT_SEED: u64 = 42;
const DEFAULT_LAYOUT_ITERATIONS: usize = 50;
const DEFAULT_MODULE_ID: &str = "segmentation";

/// Tunables for one segmentation exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Largest level gap an edge may span without being a violation
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Seed for the spring layout, fixed so re-renders are stable
    #[serde(default = "default_layout_seed")]
    pub layout_seed: u64,
    #[serde(default = "default_layout_iterations")]
    pub layout_iterations: usize,
    #[serde(default = "default_delimiter")]
    pub csv_delimiter: char,
    /// Module identifier written into progress records
    #[serde(default = "default_module_id")]
    pub module_id: String,
    /// Pseudo-random links added on top of the reference plant
    #[serde(default)]
    pub sample_extra_links: usize,
    #[serde(default = "default_layout_seed")]
    pub sample_seed: u64,
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

fn default_layout_seed() -> u64 {
    DEFAULT_LAYOUT_SEED
}

fn default_layout_iterations() -> usize {
    DEFAULT_LAYOUT_ITERATIONS
}

fn default_delimiter() -> char {
    ','
}

fn default_module_id() -> String {
    DEFAULT_MODULE_ID.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            layout_seed: DEFAULT_LAYOUT_SEED,
            layout_iterations: DEFAULT_LAYOUT_ITERATIONS,
            csv_delimiter: ',',
            module_id: DEFAULT_MODULE_ID.to_string(),
            sample_extra_links: 0,
            sample_seed: DEFAULT_LAYOUT_SEED,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `SEGMENTATION_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Values that fail to
    /// parse are ignored with a warning.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "SEGMENTATION_THRESHOLD") {
            self.threshold = v;
        }
        if let Some(v) = parse_var(&lookup, "SEGMENTATION_LAYOUT_SEED") {
            self.layout_seed = v;
        }
        if let Some(v) = parse_var(&lookup, "SEGMENTATION_LAYOUT_ITERATIONS") {
            self.layout_iterations = v;
        }
        if let Some(v) = parse_var::<char, _>(&lookup, "SEGMENTATION_CSV_DELIMITER") {
            if v.is_ascii() {
                self.csv_delimiter = v;
            } else {
                warn!(value = %v, "Ignoring non-ASCII SEGMENTATION_CSV_DELIMITER");
            }
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.csv_delimiter.is_ascii() {
            return Err(SegmentationError::Config(format!(
                "csv_delimiter must be a single ASCII character, got {:?}",
                self.csv_delimiter
            )));
        }
        if self.module_id.trim().is_empty() {
            return Err(SegmentationError::Config("module_id must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        if self.csv_delimiter.is_ascii() {
            self.csv_delimiter as u8
        } else {
            b','
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable configuration override");
            None
        }
    }
}
