//! Baseline comparison and zone risk classification.

use infra_motion_analytics_models::{
    Assessment, BaselineComparison, RiskAssessment, RiskThresholds, RiskTier, ZoneStatistics,
};

use crate::AnalyticsError;

/// Compares a zone mean with the baseline mean.
///
/// A negative difference is "more stable". The relative difference is taken
/// against `|baseline mean|`.
///
/// # Errors
///
/// Returns [`AnalyticsError::DivisionByZero`] if the baseline mean is
/// exactly zero.
pub fn compare_to_baseline(
    zone: &ZoneStatistics,
    baseline: &ZoneStatistics,
) -> Result<BaselineComparison, AnalyticsError> {
    let baseline_mean = baseline.mean_velocity;
    if baseline_mean == 0.0 {
        return Err(AnalyticsError::DivisionByZero {
            zone: zone.infrastructure.clone(),
        });
    }

    let difference = zone.mean_velocity - baseline_mean;
    let assessment = if difference < 0.0 {
        Assessment::MoreStable
    } else if difference > 0.0 {
        Assessment::LessStable
    } else {
        Assessment::SameAsBaseline
    };

    Ok(BaselineComparison {
        infrastructure: zone.infrastructure.clone(),
        mean_velocity: zone.mean_velocity,
        baseline_mean,
        difference,
        pct_difference: difference / baseline_mean.abs() * 100.0,
        assessment,
    })
}

/// Assigns a risk tier from a zone's mean velocity and stable share.
///
/// First match wins: LOW, then MODERATE, otherwise ELEVATED.
#[must_use]
pub fn classify(mean_velocity: f64, pct_stable: f64, thresholds: &RiskThresholds) -> RiskTier {
    let magnitude = mean_velocity.abs();
    if magnitude <= thresholds.low_max_abs_mean && pct_stable >= thresholds.low_min_pct_stable {
        RiskTier::Low
    } else if magnitude <= thresholds.moderate_max_abs_mean
        && pct_stable >= thresholds.moderate_min_pct_stable
    {
        RiskTier::Moderate
    } else {
        RiskTier::Elevated
    }
}

/// Builds the risk assessment row of a zone.
#[must_use]
pub fn assess(zone: &ZoneStatistics, thresholds: &RiskThresholds) -> RiskAssessment {
    RiskAssessment {
        infrastructure: zone.infrastructure.clone(),
        mean_velocity: zone.mean_velocity,
        max_velocity: zone.max_velocity,
        pct_stable: zone.pct_stable,
        risk_level: classify(zone.mean_velocity, zone.pct_stable, thresholds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(name: &str, mean: f64, pct_stable: f64) -> ZoneStatistics {
        ZoneStatistics {
            infrastructure: name.to_string(),
            n_points: 10,
            mean_velocity: mean,
            median_velocity: mean,
            std_velocity: None,
            min_velocity: mean - 1.0,
            max_velocity: mean + 1.0,
            range: 2.0,
            pct_subsiding: 0.0,
            pct_stable,
            pct_uplifting: 0.0,
            risk_counts: None,
        }
    }

    #[test]
    fn zone_above_baseline_is_less_stable() {
        let cmp =
            compare_to_baseline(&stats("Rail", -0.2, 100.0), &stats("Base", -0.53, 100.0)).unwrap();
        assert!((cmp.difference - 0.33).abs() < 1e-9);
        assert_eq!(cmp.assessment, Assessment::LessStable);
        assert!((cmp.pct_difference - 0.33 / 0.53 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn zone_below_baseline_is_more_stable() {
        let cmp =
            compare_to_baseline(&stats("Roads", -0.8, 100.0), &stats("Base", 0.4, 100.0)).unwrap();
        assert_eq!(cmp.assessment, Assessment::MoreStable);
        assert!((cmp.pct_difference - -300.0).abs() < 1e-9);
    }

    #[test]
    fn equal_means_are_same_as_baseline() {
        let cmp =
            compare_to_baseline(&stats("Roads", 1.5, 100.0), &stats("Base", 1.5, 100.0)).unwrap();
        assert_eq!(cmp.assessment, Assessment::SameAsBaseline);
        assert!(cmp.pct_difference.abs() < f64::EPSILON);
    }

    #[test]
    fn zero_baseline_mean_is_an_error() {
        let err = compare_to_baseline(&stats("Roads", 1.0, 100.0), &stats("Base", 0.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::DivisionByZero { ref zone } if zone == "Roads"));
    }

    #[test]
    fn classification_tiers() {
        let t = RiskThresholds::default();
        assert_eq!(classify(0.6, 60.0, &t), RiskTier::Elevated);
        assert_eq!(classify(-2.0, 95.0, &t), RiskTier::Low);
        assert_eq!(classify(2.5, 99.0, &t), RiskTier::Moderate);
        assert_eq!(classify(-5.0, 90.0, &t), RiskTier::Moderate);
        assert_eq!(classify(1.0, 94.9, &t), RiskTier::Moderate);
        assert_eq!(classify(5.01, 100.0, &t), RiskTier::Elevated);
        assert_eq!(classify(0.0, 89.9, &t), RiskTier::Elevated);
    }

    #[test]
    fn classification_depends_only_on_mean_and_stable_share() {
        let t = RiskThresholds::default();
        let mut a = stats("A", -1.2, 96.0);
        let mut b = stats("B", -1.2, 96.0);
        a.max_velocity = 30.0;
        b.n_points = 2;
        assert_eq!(assess(&a, &t).risk_level, assess(&b, &t).risk_level);
        assert_eq!(assess(&a, &t).recommended_action(), "continue routine monitoring");
    }

    #[test]
    fn thresholds_are_configurable() {
        let strict = RiskThresholds {
            low_max_abs_mean: 0.5,
            ..RiskThresholds::default()
        };
        assert_eq!(classify(1.0, 100.0, &strict), RiskTier::Moderate);
    }
}
