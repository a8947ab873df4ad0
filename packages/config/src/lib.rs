#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis configuration for the ground-motion pipeline.
//!
//! Everything that used to be a constant (input files, buffer radii, the
//! metric CRS, the stability band, risk thresholds and the output folder)
//! lives in one [`AnalysisConfig`] that is loaded from TOML and passed into
//! each stage. Every field has a default, so an empty file is a valid
//! configuration.

pub mod paths;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use infra_motion_analytics_models::StatisticsParams;
use infra_motion_crs::{Crs, CrsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use paths::OutputLayout;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Reading the file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A CRS identifier could not be resolved.
    #[error("CRS error: {0}")]
    Crs(#[from] CrsError),

    /// A value is out of range or inconsistent.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// One infrastructure class to buffer and analyse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraClassConfig {
    /// Class label, used as `infra_type` and in output file names.
    pub name: String,
    /// Vector file holding the class geometries.
    pub input: PathBuf,
    /// Buffer radius in meters. Zero uses the footprint as-is.
    pub buffer_m: f64,
}

impl InfraClassConfig {
    /// Creates a class entry.
    #[must_use]
    pub fn new(name: impl Into<String>, input: impl Into<PathBuf>, buffer_m: f64) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            buffer_m,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Metric CRS every layer is reprojected into.
    pub target_crs: String,
    /// CRS of CSV point inputs, which carry no CRS of their own.
    pub points_crs: String,
    /// Ground-motion measurement points.
    pub points: PathBuf,
    /// Baseline point set. Defaults to `points`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<PathBuf>,
    /// Label of the baseline row in the statistics tables.
    pub baseline_label: String,
    /// Root of all generated files.
    pub output_dir: PathBuf,
    /// Union per-feature buffers into one zone per class.
    pub dissolve: bool,
    /// Stability band and risk thresholds.
    #[serde(flatten)]
    pub statistics: StatisticsParams,
    /// Infrastructure classes, in report order.
    pub classes: Vec<InfraClassConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            target_crs: "EPSG:2157".to_string(),
            points_crs: "EPSG:4326".to_string(),
            points: PathBuf::from("data/points/egms_points.geojson"),
            baseline: None,
            baseline_label: "All Points (Baseline)".to_string(),
            output_dir: PathBuf::from("results"),
            dissolve: true,
            statistics: StatisticsParams::default(),
            classes: vec![
                InfraClassConfig::new("Railways", "data/infrastructure/railways.geojson", 50.0),
                InfraClassConfig::new("Roads", "data/infrastructure/roads.geojson", 30.0),
                InfraClassConfig::new("Harbour", "data/infrastructure/harbour.geojson", 0.0),
            ],
        }
    }
}

impl AnalysisConfig {
    /// Loads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed, or
    /// fails [`AnalysisConfig::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::info!(
            "Loaded configuration from {} ({} classes)",
            path.display(),
            config.classes.len()
        );
        Ok(config)
    }

    /// Parses and validates a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks ranges and consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for negative or non-finite radii and
    /// thresholds, empty or duplicate class names, or an empty class list,
    /// and [`ConfigError::Crs`] if a CRS cannot be resolved or the target
    /// is not metric.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target_crs()?;
        self.points_crs()?;

        if self.classes.is_empty() {
            return Err(invalid("at least one infrastructure class is required"));
        }

        let mut seen = BTreeSet::new();
        for class in &self.classes {
            if class.name.trim().is_empty() {
                return Err(invalid("infrastructure class with empty name"));
            }
            if !seen.insert(paths::slug(&class.name)) {
                return Err(invalid(format!(
                    "duplicate infrastructure class '{}'",
                    class.name
                )));
            }
            if !class.buffer_m.is_finite() || class.buffer_m < 0.0 {
                return Err(invalid(format!(
                    "buffer_m for '{}' must be a finite value >= 0, got {}",
                    class.name, class.buffer_m
                )));
            }
        }

        let params = &self.statistics;
        let risk = &params.risk;
        let values = [
            ("stability_half_width_mm", params.stability_half_width_mm),
            ("risk.low_max_abs_mean", risk.low_max_abs_mean),
            ("risk.low_min_pct_stable", risk.low_min_pct_stable),
            ("risk.moderate_max_abs_mean", risk.moderate_max_abs_mean),
            ("risk.moderate_min_pct_stable", risk.moderate_min_pct_stable),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{name} must be a finite value >= 0, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// The resolved metric target CRS.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is unknown or geographic.
    pub fn target_crs(&self) -> Result<Crs, ConfigError> {
        Ok(self.target_crs.parse::<Crs>()?.require_metric()?)
    }

    /// The resolved CRS for CSV point inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is unknown.
    pub fn points_crs(&self) -> Result<Crs, ConfigError> {
        Ok(self.points_crs.parse()?)
    }

    /// The baseline point file (`points` unless overridden).
    #[must_use]
    pub fn baseline_path(&self) -> &Path {
        self.baseline.as_deref().unwrap_or(&self.points)
    }

    /// Output layout rooted at `output_dir`.
    #[must_use]
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir)
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_default() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.classes.len(), 3);
        assert_eq!(config.target_crs().unwrap(), Crs::itm());
    }

    #[test]
    fn default_round_trips_through_toml() {
        let config = AnalysisConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed = AnalysisConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn parses_classes_and_thresholds() {
        let config = AnalysisConfig::from_toml_str(
            r#"
target_crs = "EPSG:32629"
points = "pts.csv"
baseline = "all.csv"
stability_half_width_mm = 1.0

[risk]
low_min_pct_stable = 97.5

[[classes]]
name = "Rail"
input = "rail.geojson"
buffer_m = 50.0
"#,
        )
        .unwrap();

        assert_eq!(config.target_crs().unwrap().epsg(), 32629);
        assert_eq!(config.baseline_path(), Path::new("all.csv"));
        assert_eq!(config.classes, vec![InfraClassConfig::new("Rail", "rail.geojson", 50.0)]);
        assert!((config.statistics.stability_half_width_mm - 1.0).abs() < f64::EPSILON);
        assert!((config.statistics.risk.low_min_pct_stable - 97.5).abs() < f64::EPSILON);
        assert!((config.statistics.risk.moderate_min_pct_stable - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn baseline_defaults_to_points() {
        let config = AnalysisConfig::default();
        assert_eq!(config.baseline_path(), config.points.as_path());
    }

    #[test]
    fn rejects_negative_radius() {
        let err = AnalysisConfig::from_toml_str(
            "[[classes]]\nname = \"Rail\"\ninput = \"r.geojson\"\nbuffer_m = -5.0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_duplicate_classes() {
        let mut config = AnalysisConfig::default();
        config.classes.push(InfraClassConfig::new("railways", "x.geojson", 10.0));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn rejects_geographic_target() {
        let err = AnalysisConfig::from_toml_str("target_crs = \"EPSG:4326\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Crs(CrsError::NotMetric { epsg: 4326 })));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalysisConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        std::fs::write(&path, "output_dir = \"out\"\ndissolve = false\n").unwrap();
        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.dissolve);
    }
}
