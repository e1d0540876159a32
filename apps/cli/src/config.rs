//! YAML configuration for the CLI. Every field is optional.

use agro_core::Sliders;
use agro_runtime::SessionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use weather::WeatherConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Seed, year, regeneration policy and model coefficients.
    #[serde(flatten)]
    pub session: SessionSettings,
    /// Initial slider positions.
    pub sliders: Sliders,
    pub weather: WeatherConfig,
}

impl FarmConfig {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = FarmConfig::from_yaml("{}", Path::new("inline")).unwrap();
        assert_eq!(cfg, FarmConfig::default());
    }

    #[test]
    fn partial_overrides_keep_other_defaults() {
        let yaml = "seed: 7\ncoefficients:\n  base_yield: 120.0\nsliders:\n  irrigation: 1500.0\nweather:\n  timeout_secs: 5\n";
        let cfg = FarmConfig::from_yaml(yaml, Path::new("inline")).unwrap();
        assert_eq!(cfg.session.seed, Some(7));
        assert_eq!(cfg.session.coefficients.base_yield, 120.0);
        assert_eq!(cfg.session.coefficients.fertilizer_unit_cost, 10.0);
        assert_eq!(cfg.sliders.irrigation, 1500.0);
        assert_eq!(cfg.sliders.temperature, 25.0);
        assert_eq!(cfg.weather.timeout_secs, 5);
        assert!(cfg.weather.archive_url.contains("open-meteo"));
    }

    #[test]
    fn bad_yaml_names_the_file() {
        let err = FarmConfig::from_yaml("seed: [", Path::new("broken.yaml")).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn example_config_loads() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/farmsim.example.yaml");
        let cfg = FarmConfig::load(&path).unwrap();
        assert_eq!(cfg.session.seed, Some(42));
        assert!(!cfg.session.regenerate_on_apply);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            FarmConfig::load(Path::new("/nonexistent/farmsim.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
