use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::normalizer::NormalizerConfig;

/// Limits for the `analyze` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub keywords: usize,
    pub summary_sentences: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keywords: 10,
            summary_sentences: 3,
        }
    }
}

/// Top-level config file; every table and field may be omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub normalizer: NormalizerConfig,
    pub analysis: AnalysisConfig,
    /// Prompt catalogue used when `--catalogue` is not given
    pub catalogue: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Load config from file, or defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::PunctuationSet;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = AppConfig::from_toml_str(
            r#"
catalogue = "data/prompts.toml"

[normalizer]
punctuation = "extended"
protected_terms = ["Mr. Khan"]

[analysis]
keywords = 5
"#,
        )
        .unwrap();

        assert_eq!(config.normalizer.punctuation, PunctuationSet::Extended);
        assert_eq!(config.normalizer.protected_terms, vec!["Mr. Khan"]);
        assert_eq!(config.normalizer.max_quote_depth, 8);
        assert_eq!(config.analysis.keywords, 5);
        assert_eq!(config.analysis.summary_sentences, 3);
        assert_eq!(config.catalogue, Some(PathBuf::from("data/prompts.toml")));
    }

    #[test]
    fn test_unknown_punctuation_rejected() {
        assert!(AppConfig::from_toml_str("[normalizer]\npunctuation = \"all\"").is_err());
    }

    #[tokio::test]
    async fn test_load_without_path() {
        assert_eq!(AppConfig::load(None).await.unwrap(), AppConfig::default());
    }
}
