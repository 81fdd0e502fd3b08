//! Search configuration.

use crate::access::DataType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables shared by every search executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// Path segment marking a response wrapper; everything up to it is stripped
    pub wrapper_marker: String,
    /// Page size used when a page number is requested without a size
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Key type for identifier type parameters bound nowhere in the hierarchy
    pub fallback_key_type: Option<DataType>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            wrapper_marker: "data".to_string(),
            default_page_size: 20,
            max_page_size: 1000,
            fallback_key_type: Some(DataType::Int64),
        }
    }
}

impl SearchConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: SearchConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::debug!("Loaded search config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
