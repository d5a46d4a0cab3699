use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Settings shared by the decoder, the writer and the CSV pipeline.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Bound of the decoder output channel. The producer runs at most this
    /// many results ahead of the consumer.
    pub channel_capacity: usize,
    /// Lines starting with any of these prefixes are skipped by the decoder.
    pub comment_prefixes: Vec<String>,
    pub csv: CsvConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvConfig {
    pub has_header: bool,
    /// Use the `csv` crate reader/writer instead of the line splitter.
    pub rfc4180: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            comment_prefixes: vec!["//".to_string(), "#".to_string()],
            csv: CsvConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::invalid(
                "channel_capacity",
                "must be at least 1",
            ));
        }
        if self.comment_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::invalid(
                "comment_prefixes",
                "an empty prefix would match every line",
            ));
        }
        Ok(())
    }

    pub fn is_comment(&self, line: &str) -> bool {
        self.comment_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
    }
}
