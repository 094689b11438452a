//! Application configuration.
//!
//! Settings are read from a TOML file; every field has a default so an
//! empty or partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::{Contamination, IsolationForest};

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "pra-outliers.toml";

/// Seed of the isolation forest. Identical input and seed give identical flags.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Isolation forest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: u64,
    pub contamination: Contamination,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: DEFAULT_SEED,
            contamination: Contamination::Auto,
        }
    }
}

impl ForestConfig {
    /// Build the model described by these settings.
    pub fn build(&self) -> IsolationForest {
        IsolationForest::new(self.seed)
            .with_trees(self.n_trees)
            .with_max_samples(self.max_samples)
            .with_contamination(self.contamination)
    }
}

/// Top-level settings shared by the CLI and the GUI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub sheet: Option<String>,
    pub years: Vec<i64>,
    pub default_columns: Vec<String>,
    pub forest: ForestConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("PRA.xlsx"),
            sheet: None,
            years: vec![2016, 2017, 2018, 2019, 2020],
            default_columns: vec![
                "NWP (£m)".to_string(),
                "SCR coverage ratio".to_string(),
                "Gross claims incurred (£m)".to_string(),
                "Net combined ratio".to_string(),
            ],
            forest: ForestConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Resolve settings: explicit path, then `pra-outliers.toml` in the
    /// working directory, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.is_file() {
            log::debug!("Using config file {}", fallback.display());
            return Self::from_file(fallback);
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_selection() {
        let config = AppConfig::default();
        assert_eq!(config.years, vec![2016, 2017, 2018, 2019, 2020]);
        assert_eq!(config.default_columns.len(), 4);
        assert!(config.default_columns.contains(&"NWP (£m)".to_string()));
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.forest.contamination, Contamination::Auto);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            data_path = "returns.csv"

            [forest]
            seed = 28
            "#,
        )
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("returns.csv"));
        assert_eq!(config.forest.seed, 28);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.years.len(), 5);
    }

    #[test]
    fn test_fraction_contamination() {
        let config = AppConfig::from_toml(
            r#"
            [forest]
            contamination = { fraction = 0.1 }
            "#,
        )
        .unwrap();

        assert_eq!(config.forest.contamination, Contamination::Fraction(0.1));
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml("years = \"2018\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
