#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types of the statistics and risk engine.
//!
//! A [`ZoneStatistics`] record summarizes the velocities of one zone (or of
//! the unfiltered baseline). [`BaselineComparison`] and [`RiskAssessment`]
//! are derived from it. The thresholds that drive classification live in
//! [`StatisticsParams`] so they can come from configuration.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Thresholds of the three-tier zone risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Largest `|mean velocity|` (mm/yr) still rated LOW.
    pub low_max_abs_mean: f64,
    /// Smallest stable share (%) still rated LOW.
    pub low_min_pct_stable: f64,
    /// Largest `|mean velocity|` (mm/yr) still rated MODERATE.
    pub moderate_max_abs_mean: f64,
    /// Smallest stable share (%) still rated MODERATE.
    pub moderate_min_pct_stable: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_max_abs_mean: 2.0,
            low_min_pct_stable: 95.0,
            moderate_max_abs_mean: 5.0,
            moderate_min_pct_stable: 90.0,
        }
    }
}

/// Parameters of the statistics stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsParams {
    /// Half-width of the stability band: a point is stable when
    /// `-w <= velocity <= w`.
    pub stability_half_width_mm: f64,
    /// Risk classification thresholds.
    pub risk: RiskThresholds,
}

impl Default for StatisticsParams {
    fn default() -> Self {
        Self {
            stability_half_width_mm: 2.0,
            risk: RiskThresholds::default(),
        }
    }
}

/// Counts of per-point risk labels within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskCounts {
    /// Points labelled `Stable`.
    pub n_stable: usize,
    /// Points labelled `Low Risk`.
    pub n_low_risk: usize,
    /// Points labelled `Medium Risk`.
    pub n_medium_risk: usize,
    /// Points labelled `High Risk`.
    pub n_high_risk: usize,
    /// Points with a missing or unrecognised label.
    pub n_other: usize,
    /// `n_high_risk / n_points * 100`.
    pub pct_high_risk: f64,
}

/// Velocity summary of one zone.
///
/// The three percentage bands are independent: `pct_stable` overlaps both
/// `pct_subsiding` and `pct_uplifting`, so they do not sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatistics {
    /// Zone label.
    pub infrastructure: String,
    /// Number of points.
    pub n_points: usize,
    /// Arithmetic mean velocity (mm/yr).
    pub mean_velocity: f64,
    /// Median velocity (mm/yr).
    pub median_velocity: f64,
    /// Sample standard deviation (ddof = 1). `None` for a single point.
    pub std_velocity: Option<f64>,
    /// Smallest velocity.
    pub min_velocity: f64,
    /// Largest velocity.
    pub max_velocity: f64,
    /// `max_velocity - min_velocity`.
    pub range: f64,
    /// Share of points with `velocity < 0` (%).
    pub pct_subsiding: f64,
    /// Share of points inside the stability band (%).
    pub pct_stable: f64,
    /// Share of points with `velocity > 0` (%).
    pub pct_uplifting: f64,
    /// Label counts, present when any point carried a risk label.
    pub risk_counts: Option<RiskCounts>,
}

/// How a zone's mean velocity compares with the baseline mean.
///
/// A lower signed mean counts as more stable regardless of whether the
/// motion is subsidence or uplift.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Assessment {
    /// Zone mean below the baseline mean.
    #[strum(serialize = "more stable")]
    #[serde(rename = "more stable")]
    MoreStable,
    /// Zone mean above the baseline mean.
    #[strum(serialize = "less stable")]
    #[serde(rename = "less stable")]
    LessStable,
    /// Zone mean equal to the baseline mean.
    #[strum(serialize = "same as baseline")]
    #[serde(rename = "same as baseline")]
    SameAsBaseline,
}

/// Comparison of one zone against the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    /// Zone label.
    pub infrastructure: String,
    /// Zone mean velocity (mm/yr).
    pub mean_velocity: f64,
    /// Baseline mean velocity (mm/yr).
    pub baseline_mean: f64,
    /// `mean_velocity - baseline_mean`.
    pub difference: f64,
    /// `difference / |baseline_mean| * 100`.
    pub pct_difference: f64,
    /// Qualitative verdict derived from the sign of `difference`.
    pub assessment: Assessment,
}

/// Zone-level risk tier.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    /// Stable zone.
    Low,
    /// Mostly stable zone with some motion.
    Moderate,
    /// Zone needing investigation.
    Elevated,
}

impl RiskTier {
    /// The action recommended for this tier.
    #[must_use]
    pub const fn recommended_action(self) -> &'static str {
        match self {
            Self::Low => "continue routine monitoring",
            Self::Moderate => "increased monitoring recommended",
            Self::Elevated => "detailed investigation required",
        }
    }
}

/// Risk classification of one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Zone label.
    pub infrastructure: String,
    /// Zone mean velocity (mm/yr).
    pub mean_velocity: f64,
    /// Zone maximum velocity (mm/yr).
    pub max_velocity: f64,
    /// Stable share (%).
    pub pct_stable: f64,
    /// Assigned tier.
    pub risk_level: RiskTier,
}

impl RiskAssessment {
    /// The action recommended for the assigned tier.
    #[must_use]
    pub const fn recommended_action(&self) -> &'static str {
        self.risk_level.recommended_action()
    }
}

/// Everything the statistics stage produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Statistics of the unfiltered baseline set.
    pub baseline: ZoneStatistics,
    /// Statistics per zone, in zone order.
    pub zones: Vec<ZoneStatistics>,
    /// Baseline comparison per zone.
    pub comparisons: Vec<BaselineComparison>,
    /// Risk classification per zone.
    pub risks: Vec<RiskAssessment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds() {
        let params = StatisticsParams::default();
        assert!((params.stability_half_width_mm - 2.0).abs() < f64::EPSILON);
        assert!((params.risk.low_max_abs_mean - 2.0).abs() < f64::EPSILON);
        assert!((params.risk.low_min_pct_stable - 95.0).abs() < f64::EPSILON);
        assert!((params.risk.moderate_max_abs_mean - 5.0).abs() < f64::EPSILON);
        assert!((params.risk.moderate_min_pct_stable - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_params_fill_defaults() {
        let params: StatisticsParams = toml::from_str(
            "stability_half_width_mm = 1.5\n[risk]\nmoderate_max_abs_mean = 4.0\n",
        )
        .unwrap();
        assert!((params.stability_half_width_mm - 1.5).abs() < f64::EPSILON);
        assert!((params.risk.moderate_max_abs_mean - 4.0).abs() < f64::EPSILON);
        assert!((params.risk.low_min_pct_stable - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tier_labels_and_actions() {
        assert_eq!(RiskTier::Low.to_string(), "LOW");
        assert_eq!(RiskTier::Elevated.as_ref(), "ELEVATED");
        assert_eq!(
            RiskTier::Moderate.recommended_action(),
            "increased monitoring recommended"
        );
    }

    #[test]
    fn assessment_labels() {
        assert_eq!(Assessment::LessStable.to_string(), "less stable");
        assert_eq!(
            "same as baseline".parse::<Assessment>().unwrap(),
            Assessment::SameAsBaseline
        );
    }
}
