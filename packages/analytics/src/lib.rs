#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistics and risk engine.
//!
//! Summarizes the velocities of each zone and of the unfiltered baseline,
//! compares every zone mean against the baseline mean, and assigns each
//! zone a risk tier. Everything here is a pure function of the input
//! velocities and [`StatisticsParams`]; file handling is left to callers.

pub mod risk;
pub mod stats;
pub mod tables;

use infra_motion_analytics_models::{AnalysisReport, StatisticsParams};
use infra_motion_models::{MeasurementPoint, ZonePointSet};
use thiserror::Error;

pub use risk::{assess, classify, compare_to_baseline};
pub use stats::zone_statistics;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A zone or the baseline has no points.
    #[error("Empty set: '{zone}' has no points")]
    EmptySet {
        /// Zone label.
        zone: String,
    },

    /// The baseline mean is exactly zero, so a relative difference is
    /// undefined.
    #[error("Division by zero: baseline mean is 0, cannot compute relative difference for '{zone}'")]
    DivisionByZero {
        /// Zone being compared.
        zone: String,
    },

    /// CSV rendering failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Runs the full statistics stage.
///
/// Produces baseline statistics, per-zone statistics, a baseline comparison
/// and a risk assessment for every zone, in zone order.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptySet`] if the baseline or any zone is
/// empty and [`AnalyticsError::DivisionByZero`] if the baseline mean is 0.
pub fn analyze(
    baseline_label: &str,
    baseline: &[MeasurementPoint],
    zones: &[ZonePointSet],
    params: &StatisticsParams,
) -> Result<AnalysisReport, AnalyticsError> {
    let half_width = params.stability_half_width_mm;

    let baseline = zone_statistics(baseline_label, baseline, half_width)?;
    log::info!(
        "{}: {} points, mean {:.2} mm/yr",
        baseline.infrastructure,
        baseline.n_points,
        baseline.mean_velocity
    );

    let mut stats = Vec::with_capacity(zones.len());
    let mut comparisons = Vec::with_capacity(zones.len());
    let mut risks = Vec::with_capacity(zones.len());

    for zone in zones {
        let record = zone_statistics(&zone.infrastructure, &zone.points, half_width)?;
        let comparison = compare_to_baseline(&record, &baseline)?;
        let risk = assess(&record, &params.risk);

        log::info!(
            "{}: {} points, mean {:.2} mm/yr ({}), risk {}",
            record.infrastructure,
            record.n_points,
            record.mean_velocity,
            comparison.assessment,
            risk.risk_level
        );

        stats.push(record);
        comparisons.push(comparison);
        risks.push(risk);
    }

    Ok(AnalysisReport {
        baseline,
        zones: stats,
        comparisons,
        risks,
    })
}

#[cfg(test)]
mod tests {
    use geo::point;
    use infra_motion_analytics_models::{Assessment, RiskTier};
    use infra_motion_crs::Crs;

    use super::*;

    fn pts(velocities: &[f64]) -> Vec<MeasurementPoint> {
        velocities
            .iter()
            .map(|&v| MeasurementPoint::new(point!(x: 0.0, y: 0.0), v))
            .collect()
    }

    fn zone(label: &str, velocities: &[f64]) -> ZonePointSet {
        ZonePointSet {
            infrastructure: label.to_string(),
            crs: Crs::itm(),
            points: pts(velocities),
        }
    }

    #[test]
    fn full_report_in_zone_order() {
        let baseline = pts(&[-1.0, -0.5, 0.2, -0.3]);
        let zones = [zone("Railways", &[-1.0, -3.0, 0.0, 2.0, 5.0]), zone("Roads", &[-0.1, 0.1])];
        let report = analyze("Baseline", &baseline, &zones, &StatisticsParams::default()).unwrap();

        assert_eq!(report.baseline.infrastructure, "Baseline");
        assert_eq!(report.zones.len(), 2);
        assert_eq!(report.comparisons[1].infrastructure, "Roads");
        assert_eq!(report.risks[0].risk_level, RiskTier::Elevated);
        assert_eq!(report.risks[1].risk_level, RiskTier::Low);
        assert_eq!(report.comparisons[0].assessment, Assessment::LessStable);
    }

    #[test]
    fn empty_zone_aborts_the_stage() {
        let err = analyze(
            "Baseline",
            &pts(&[1.0]),
            &[zone("Harbour", &[])],
            &StatisticsParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptySet { ref zone } if zone == "Harbour"));
    }

    #[test]
    fn zero_baseline_mean_aborts_the_stage() {
        let err = analyze(
            "Baseline",
            &pts(&[-1.0, 1.0]),
            &[zone("Roads", &[0.5])],
            &StatisticsParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::DivisionByZero { .. }));
    }
}
