//! Velocity summary statistics.

use infra_motion_analytics_models::{RiskCounts, ZoneStatistics};
use infra_motion_models::{MeasurementPoint, RiskLabel};

use crate::AnalyticsError;

/// Computes the statistics record of one zone.
///
/// `half_width` sets the stability band `[-half_width, half_width]`
/// (inclusive). Label counts are only reported when at least one point
/// carries a `risk_level`.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptySet`] if `points` is empty.
#[allow(clippy::cast_precision_loss)]
pub fn zone_statistics(
    name: &str,
    points: &[MeasurementPoint],
    half_width: f64,
) -> Result<ZoneStatistics, AnalyticsError> {
    if points.is_empty() {
        return Err(AnalyticsError::EmptySet {
            zone: name.to_string(),
        });
    }

    let mut velocities: Vec<f64> = points.iter().map(|p| p.velocity).collect();
    velocities.sort_by(f64::total_cmp);

    let n = velocities.len();
    let count = n as f64;
    let mean = velocities.iter().sum::<f64>() / count;
    let min = velocities[0];
    let max = velocities[n - 1];

    let pct = |pred: &dyn Fn(f64) -> bool| {
        velocities.iter().filter(|&&v| pred(v)).count() as f64 / count * 100.0
    };

    Ok(ZoneStatistics {
        infrastructure: name.to_string(),
        n_points: n,
        mean_velocity: mean,
        median_velocity: median(&velocities),
        std_velocity: sample_std(&velocities, mean),
        min_velocity: min,
        max_velocity: max,
        range: max - min,
        pct_subsiding: pct(&|v| v < 0.0),
        pct_stable: pct(&|v| (-half_width..=half_width).contains(&v)),
        pct_uplifting: pct(&|v| v > 0.0),
        risk_counts: risk_counts(points),
    })
}

/// Median of sorted, non-empty values. Even counts average the middle pair.
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        f64::midpoint(sorted[n / 2 - 1], sorted[n / 2])
    } else {
        sorted[n / 2]
    }
}

/// Sample standard deviation (ddof = 1). Undefined below two values.
#[allow(clippy::cast_precision_loss)]
fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

#[allow(clippy::cast_precision_loss)]
fn risk_counts(points: &[MeasurementPoint]) -> Option<RiskCounts> {
    if points.iter().all(|p| p.risk_level.is_none()) {
        return None;
    }

    let mut counts = RiskCounts {
        n_stable: 0,
        n_low_risk: 0,
        n_medium_risk: 0,
        n_high_risk: 0,
        n_other: 0,
        pct_high_risk: 0.0,
    };
    for point in points {
        match point.risk_label() {
            Some(RiskLabel::Stable) => counts.n_stable += 1,
            Some(RiskLabel::LowRisk) => counts.n_low_risk += 1,
            Some(RiskLabel::MediumRisk) => counts.n_medium_risk += 1,
            Some(RiskLabel::HighRisk) => counts.n_high_risk += 1,
            None => counts.n_other += 1,
        }
    }
    counts.pct_high_risk = counts.n_high_risk as f64 / points.len() as f64 * 100.0;
    Some(counts)
}

#[cfg(test)]
mod tests {
    use geo::point;

    use super::*;

    fn pts(velocities: &[f64]) -> Vec<MeasurementPoint> {
        velocities
            .iter()
            .map(|&v| MeasurementPoint::new(point!(x: 0.0, y: 0.0), v))
            .collect()
    }

    #[test]
    fn five_point_zone() {
        let s = zone_statistics("Zone", &pts(&[-1.0, -3.0, 0.0, 2.0, 5.0]), 2.0).unwrap();
        assert_eq!(s.n_points, 5);
        assert!((s.mean_velocity - 0.6).abs() < 1e-12);
        assert!(s.median_velocity.abs() < f64::EPSILON);
        assert!((s.pct_stable - 60.0).abs() < 1e-9);
        assert!((s.pct_subsiding - 40.0).abs() < 1e-9);
        assert!((s.pct_uplifting - 40.0).abs() < 1e-9);
        assert!((s.min_velocity - -3.0).abs() < f64::EPSILON);
        assert!((s.max_velocity - 5.0).abs() < f64::EPSILON);
        // sum of squared deviations = 37.2, / 4
        assert!((s.std_velocity.unwrap() - 9.3_f64.sqrt()).abs() < 1e-9);
        assert_eq!(s.risk_counts, None);
    }

    #[test]
    fn range_is_exactly_max_minus_min() {
        let s = zone_statistics("Zone", &pts(&[-0.37, 1.13, 0.01]), 2.0).unwrap();
        assert_eq!(s.range.to_bits(), (s.max_velocity - s.min_velocity).to_bits());
    }

    #[test]
    fn bands_overlap_and_never_exceed_100() {
        let s = zone_statistics("Zone", &pts(&[-2.0, 2.0, 0.0, -2.5, 2.5]), 2.0).unwrap();
        assert!(s.pct_subsiding + s.pct_uplifting <= 100.0);
        // band edges are inclusive
        assert!((s.pct_stable - 60.0).abs() < 1e-9);
        assert!((s.pct_subsiding + s.pct_stable + s.pct_uplifting - 140.0).abs() < 1e-9);
    }

    #[test]
    fn band_width_is_configurable() {
        let s = zone_statistics("Zone", &pts(&[-1.5, 0.5, 3.0]), 1.0).unwrap();
        assert!((s.pct_stable - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn even_median_and_single_point_std() {
        let s = zone_statistics("Zone", &pts(&[4.0, 1.0, 3.0, 2.0]), 2.0).unwrap();
        assert!((s.median_velocity - 2.5).abs() < f64::EPSILON);

        let single = zone_statistics("Zone", &pts(&[1.0]), 2.0).unwrap();
        assert_eq!(single.std_velocity, None);
        assert!(single.range.abs() < f64::EPSILON);
    }

    #[test]
    fn label_counts() {
        let mut points = pts(&[0.0, 1.0, 2.0, 3.0]);
        points[0].risk_level = Some("Stable".to_string());
        points[1].risk_level = Some("High Risk".to_string());
        points[2].risk_level = Some("bogus".to_string());

        let counts = zone_statistics("Zone", &points, 2.0)
            .unwrap()
            .risk_counts
            .unwrap();
        assert_eq!(counts.n_stable, 1);
        assert_eq!(counts.n_high_risk, 1);
        assert_eq!(counts.n_other, 2);
        assert!((counts.pct_high_risk - 25.0).abs() < 1e-9);
    }

    #[test]
    fn empty_set_is_an_error() {
        assert!(matches!(
            zone_statistics("Harbour", &[], 2.0),
            Err(AnalyticsError::EmptySet { .. })
        ));
    }
}
