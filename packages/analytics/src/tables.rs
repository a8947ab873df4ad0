//! Tabular views of an [`AnalysisReport`].
//!
//! The CSV layouts keep the column names used by downstream spreadsheets:
//! statistics are rounded to 2 decimals, `Difference` to 2 and
//! `Pct_Difference` to 1. The console layout is a right-aligned text table.

use infra_motion_analytics_models::{AnalysisReport, ZoneStatistics};

use crate::AnalyticsError;

const SUMMARY_COLUMNS: [&str; 11] = [
    "Infrastructure",
    "N_Points",
    "Mean_Velocity",
    "Median_Velocity",
    "Std_Velocity",
    "Min_Velocity",
    "Max_Velocity",
    "Range",
    "Pct_Subsiding",
    "Pct_Stable",
    "Pct_Uplifting",
];

const RISK_COUNT_COLUMNS: [&str; 6] = [
    "N_Stable",
    "N_Low_Risk",
    "N_Medium_Risk",
    "N_High_Risk",
    "N_Other",
    "Pct_High_Risk",
];

const COMPARISON_COLUMNS: [&str; 6] = [
    "Infrastructure",
    "Mean_Velocity",
    "Baseline_Mean",
    "Difference",
    "Pct_Difference",
    "Assessment",
];

const RISK_COLUMNS: [&str; 6] = [
    "Infrastructure",
    "Mean_Velocity_mm/yr",
    "Max_Velocity_mm/yr",
    "Pct_Stable",
    "Risk_Level",
    "Recommended_Action",
];

/// A header row plus formatted data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names.
    pub headers: Vec<String>,
    /// Cells, one `Vec` per row, aligned with `headers`.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// Keeps only the named columns, in the given order.
    #[must_use]
    pub fn select(&self, columns: &[&str]) -> Self {
        let idx: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.headers.iter().position(|h| h == c))
            .collect();
        Self {
            headers: idx.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| idx.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Renders the table as CSV.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV writer fails.
    pub fn to_csv(&self) -> Result<String, AnalyticsError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AnalyticsError::Conversion {
                message: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| AnalyticsError::Conversion {
            message: e.to_string(),
        })
    }

    /// Renders the table as right-aligned text columns.
    #[must_use]
    pub fn to_text(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:>w$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut out = line(&self.headers);
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

fn summary_row(stats: &ZoneStatistics, with_risk: bool) -> Vec<String> {
    let mut row = vec![
        stats.infrastructure.clone(),
        stats.n_points.to_string(),
        fixed(stats.mean_velocity, 2),
        fixed(stats.median_velocity, 2),
        stats.std_velocity.map(|s| fixed(s, 2)).unwrap_or_default(),
        fixed(stats.min_velocity, 2),
        fixed(stats.max_velocity, 2),
        fixed(stats.range, 2),
        fixed(stats.pct_subsiding, 2),
        fixed(stats.pct_stable, 2),
        fixed(stats.pct_uplifting, 2),
    ];

    if with_risk {
        match &stats.risk_counts {
            Some(c) => row.extend([
                c.n_stable.to_string(),
                c.n_low_risk.to_string(),
                c.n_medium_risk.to_string(),
                c.n_high_risk.to_string(),
                c.n_other.to_string(),
                fixed(c.pct_high_risk, 2),
            ]),
            None => row.extend(std::iter::repeat_n(String::new(), RISK_COUNT_COLUMNS.len())),
        }
    }
    row
}

/// Baseline first, then every zone. Label-count columns appear when any
/// record has them.
#[must_use]
pub fn summary_table(report: &AnalysisReport) -> Table {
    let records: Vec<&ZoneStatistics> = std::iter::once(&report.baseline)
        .chain(&report.zones)
        .collect();
    let with_risk = records.iter().any(|s| s.risk_counts.is_some());

    let mut headers = SUMMARY_COLUMNS.to_vec();
    if with_risk {
        headers.extend(RISK_COUNT_COLUMNS);
    }

    let mut table = Table::new(&headers);
    table.rows = records
        .into_iter()
        .map(|s| summary_row(s, with_risk))
        .collect();
    table
}

/// One row per zone.
#[must_use]
pub fn comparison_table(report: &AnalysisReport) -> Table {
    let mut table = Table::new(&COMPARISON_COLUMNS);
    table.rows = report
        .comparisons
        .iter()
        .map(|c| {
            vec![
                c.infrastructure.clone(),
                fixed(c.mean_velocity, 2),
                fixed(c.baseline_mean, 2),
                fixed(c.difference, 2),
                fixed(c.pct_difference, 1),
                c.assessment.to_string(),
            ]
        })
        .collect();
    table
}

/// One row per zone.
#[must_use]
pub fn risk_table(report: &AnalysisReport) -> Table {
    let mut table = Table::new(&RISK_COLUMNS);
    table.rows = report
        .risks
        .iter()
        .map(|r| {
            vec![
                r.infrastructure.clone(),
                fixed(r.mean_velocity, 2),
                fixed(r.max_velocity, 2),
                fixed(r.pct_stable, 2),
                r.risk_level.to_string(),
                r.recommended_action().to_string(),
            ]
        })
        .collect();
    table
}

/// The console summary: velocity statistics, baseline comparison and risk
/// assessment.
#[must_use]
pub fn render_summary(report: &AnalysisReport) -> String {
    let rule = "-".repeat(70);
    let velocity = summary_table(report).select(&[
        "Infrastructure",
        "N_Points",
        "Mean_Velocity",
        "Median_Velocity",
        "Pct_Stable",
    ]);
    let comparison = comparison_table(report).select(&[
        "Infrastructure",
        "Mean_Velocity",
        "Difference",
        "Assessment",
    ]);

    format!(
        "VELOCITY STATISTICS\n{rule}\n{}\n\nCOMPARISON WITH BASELINE\n{rule}\n{}\n\nRISK ASSESSMENT\n{rule}\n{}\n",
        velocity.to_text(),
        comparison.to_text(),
        risk_table(report).to_text(),
    )
}
