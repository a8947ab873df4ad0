//! Canonical output file paths.
//!
//! All paths are relative to the configured `output_dir`.

use std::path::{Path, PathBuf};

/// File layout of everything the pipeline writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `buffers/` directory.
    #[must_use]
    pub fn buffers_dir(&self) -> PathBuf {
        self.root.join("buffers")
    }

    /// Returns the `spatial_analysis/` directory.
    #[must_use]
    pub fn spatial_dir(&self) -> PathBuf {
        self.root.join("spatial_analysis")
    }

    /// Returns the `statistics/` directory.
    #[must_use]
    pub fn statistics_dir(&self) -> PathBuf {
        self.root.join("statistics")
    }

    /// Returns the `maps/` directory.
    #[must_use]
    pub fn maps_dir(&self) -> PathBuf {
        self.root.join("maps")
    }

    /// Per-feature (undissolved) buffers of a class.
    ///
    /// Zero-radius classes are written as `{slug}_boundary.geojson`.
    #[must_use]
    pub fn feature_buffers_path(&self, class: &str, buffer_m: f64) -> PathBuf {
        let name = if buffer_m > 0.0 {
            format!("{}_buffer_{}m.geojson", slug(class), format_radius(buffer_m))
        } else {
            format!("{}_boundary.geojson", slug(class))
        };
        self.buffers_dir().join(name)
    }

    /// The zone of a class, as consumed by the join stage.
    ///
    /// Dissolved zones are `{slug}_buffer_dissolved.geojson`; undissolved
    /// ones, which keep one member per feature, are `{slug}_buffer_zone.geojson`.
    #[must_use]
    pub fn zone_path(&self, class: &str, dissolved: bool) -> PathBuf {
        let suffix = if dissolved { "dissolved" } else { "zone" };
        self.buffers_dir()
            .join(format!("{}_buffer_{suffix}.geojson", slug(class)))
    }

    /// Points inside a class zone, as CSV.
    #[must_use]
    pub fn zone_points_csv(&self, class: &str) -> PathBuf {
        self.spatial_dir().join(format!("{}_points.csv", slug(class)))
    }

    /// Points inside a class zone, with geometry.
    #[must_use]
    pub fn zone_points_geojson(&self, class: &str) -> PathBuf {
        self.spatial_dir()
            .join(format!("{}_points.geojson", slug(class)))
    }

    /// Summary statistics table.
    #[must_use]
    pub fn summary_csv(&self) -> PathBuf {
        self.statistics_dir().join("infrastructure_summary.csv")
    }

    /// Baseline comparison table.
    #[must_use]
    pub fn comparison_csv(&self) -> PathBuf {
        self.statistics_dir().join("infrastructure_comparison.csv")
    }

    /// Risk assessment table.
    #[must_use]
    pub fn risk_csv(&self) -> PathBuf {
        self.statistics_dir()
            .join("infrastructure_risk_assessment.csv")
    }

    /// Map of the `index`-th class (1-based).
    #[must_use]
    pub fn map_path(&self, index: usize, class: &str) -> PathBuf {
        self.maps_dir()
            .join(format!("map_{index:02}_{}_analysis.png", slug(class)))
    }
}

/// Lowercase file-name stem for a class label.
///
/// Runs of non-alphanumeric characters collapse to a single `_`.
#[must_use]
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Whole radii print without a fractional part.
fn format_radius(buffer_m: f64) -> String {
    if buffer_m.fract() == 0.0 {
        format!("{buffer_m:.0}")
    } else {
        format!("{buffer_m}")
    }
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slug("Railways"), "railways");
        assert_eq!(slug("Dublin Port / Harbour"), "dublin_port_harbour");
        assert_eq!(slug("  Roads  "), "roads");
    }

    #[test]
    fn buffer_file_names_follow_radius() {
        let layout = OutputLayout::new(Path::new("out"));
        assert_eq!(
            layout.feature_buffers_path("Railways", 50.0),
            Path::new("out/buffers/railways_buffer_50m.geojson")
        );
        assert_eq!(
            layout.feature_buffers_path("Roads", 12.5),
            Path::new("out/buffers/roads_buffer_12.5m.geojson")
        );
        assert_eq!(
            layout.feature_buffers_path("Harbour", 0.0),
            Path::new("out/buffers/harbour_boundary.geojson")
        );
        assert_eq!(
            layout.zone_path("Harbour", true),
            Path::new("out/buffers/harbour_buffer_dissolved.geojson")
        );
        assert_eq!(
            layout.zone_path("Harbour", false),
            Path::new("out/buffers/harbour_buffer_zone.geojson")
        );
    }

    #[test]
    fn report_and_map_names() {
        let layout = OutputLayout::new(Path::new("out"));
        assert_eq!(
            layout.risk_csv(),
            Path::new("out/statistics/infrastructure_risk_assessment.csv")
        );
        assert_eq!(
            layout.map_path(2, "Roads"),
            Path::new("out/maps/map_02_roads_analysis.png")
        );
        assert_eq!(
            layout.zone_points_csv("Roads"),
            Path::new("out/spatial_analysis/roads_points.csv")
        );
    }
}
