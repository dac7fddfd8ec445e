//! Configuration loading for the Andry engine.
//!
//! Configuration is loaded from TOML files with environment variable
//! overrides: `ANDRY_CANVAS__WIDTH=800` sets `canvas.width`.

use crate::params::{CategoryWeights, DEFAULT_ALGORITHM_VERSION};
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_size")]
    pub width: u32,

    #[serde(default = "default_size")]
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
        }
    }
}

fn default_size() -> u32 {
    400
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Also write the full artwork record as JSON next to each SVG.
    #[serde(default)]
    pub save_artwork: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            save_artwork: false,
        }
    }
}

fn default_directory() -> String {
    "output".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    /// Pause between exports.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            max_items: default_max_items(),
        }
    }
}

fn default_delay_ms() -> u64 {
    250
}

fn default_max_items() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_algorithm_version")]
    pub algorithm_version: String,

    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            algorithm_version: default_algorithm_version(),
            weights: WeightsConfig::default(),
        }
    }
}

fn default_algorithm_version() -> String {
    DEFAULT_ALGORITHM_VERSION.to_string()
}

/// Term significance multipliers per category.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_weight")]
    pub procedures: f64,

    #[serde(default = "default_anatomy_weight")]
    pub anatomy: f64,

    #[serde(default = "default_weight")]
    pub outcomes: f64,

    #[serde(default = "default_weight")]
    pub research: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            procedures: default_weight(),
            anatomy: default_anatomy_weight(),
            outcomes: default_weight(),
            research: default_weight(),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_anatomy_weight() -> f64 {
    0.8
}

impl From<&WeightsConfig> for CategoryWeights {
    fn from(w: &WeightsConfig) -> Self {
        CategoryWeights {
            procedures: w.procedures,
            anatomy: w.anatomy,
            outcomes: w.outcomes,
            research: w.research,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("ANDRY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let engine_config: EngineConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        engine_config.validate()?;
        Ok(engine_config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.canvas.width > 0 && self.canvas.height > 0,
            "canvas must be at least 1x1, got {}x{}",
            self.canvas.width,
            self.canvas.height
        );
        let w = &self.generator.weights;
        ensure!(
            [w.procedures, w.anatomy, w.outcomes, w.research]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0),
            "category weights must be finite and non-negative"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_match_reference_canvas() {
        let config = EngineConfig::default();
        assert_eq!(config.canvas.width, 400);
        assert_eq!(config.canvas.height, 400);
        assert_eq!(config.batch.delay_ms, 250);
        assert_eq!(config.generator.algorithm_version, "1.0.0");
        assert_eq!(
            CategoryWeights::from(&config.generator.weights),
            CategoryWeights::default()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let dir = std::env::temp_dir().join(format!("andry-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("andry.toml");
        fs::write(
            &path,
            "[canvas]\nwidth = 800\n\n[batch]\nmax_items = 3\n\n[generator.weights]\nanatomy = 0.5\n",
        )
        .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.canvas.height, 400);
        assert_eq!(config.batch.max_items, 3);
        assert_eq!(config.batch.delay_ms, 250);
        assert_eq!(config.generator.weights.anatomy, 0.5);
        assert_eq!(config.generator.weights.procedures, 1.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let mut config = EngineConfig::default();
        config.canvas.width = 0;
        assert!(config.validate().is_err());
    }
}
