use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vector::DEFAULT_MAX_FEATURES;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Tunables of a persona analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Ranked sections handed to sentence extraction.
    pub top_sections: usize,
    /// Minimum (exclusive) keyword overlap for a sentence to be kept.
    pub jaccard_threshold: f64,
    /// Character budget of the refined text of one section.
    pub refined_char_budget: usize,
    /// Vocabulary cap of the vector space.
    pub max_features: usize,
    /// Extra stopwords, one per line.
    pub extra_stopwords: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            top_sections: 5,
            jaccard_threshold: 0.05,
            refined_char_budget: 1000,
            max_features: DEFAULT_MAX_FEATURES,
            extra_stopwords: None,
        }
    }
}

impl AnalysisConfig {
    /// Read a TOML file. Relative paths inside it are taken relative to the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if let Some(words) = self.extra_stopwords.as_mut() {
            if words.is_relative() {
                *words = base.join(&*words);
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
