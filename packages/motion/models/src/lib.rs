#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ground-motion measurement points, infrastructure layers and buffer zones.
//!
//! These types flow between the pipeline stages. Points are immutable once
//! loaded: later stages filter and label them but never change a velocity
//! or a location.

use geo::{Geometry, MultiPolygon, Point};
use infra_motion_crs::Crs;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Per-point risk label carried by some ground-motion products.
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
#[strum(ascii_case_insensitive)]
pub enum RiskLabel {
    /// Within the stability band.
    #[strum(serialize = "Stable")]
    #[serde(rename = "Stable")]
    Stable,
    /// Slow motion.
    #[strum(serialize = "Low Risk")]
    #[serde(rename = "Low Risk")]
    LowRisk,
    /// Moderate motion.
    #[strum(serialize = "Medium Risk")]
    #[serde(rename = "Medium Risk")]
    MediumRisk,
    /// Fast motion.
    #[strum(serialize = "High Risk")]
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl RiskLabel {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Stable, Self::LowRisk, Self::MediumRisk, Self::HighRisk]
    }
}

/// A single ground-motion measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementPoint {
    /// Source identifier, if the input had one.
    pub id: Option<String>,
    /// Location in the owning set's CRS.
    pub location: Point<f64>,
    /// Signed vertical velocity in mm/yr. Negative is subsidence.
    pub velocity: f64,
    /// Raw risk label as loaded.
    pub risk_level: Option<String>,
}

impl MeasurementPoint {
    /// Creates a point with no id and no risk label.
    #[must_use]
    pub const fn new(location: Point<f64>, velocity: f64) -> Self {
        Self {
            id: None,
            location,
            velocity,
            risk_level: None,
        }
    }

    /// Parses the raw label. Unknown labels return `None`.
    #[must_use]
    pub fn risk_label(&self) -> Option<RiskLabel> {
        self.risk_level.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// A set of measurement points sharing one CRS.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    /// CRS of every point location.
    pub crs: Crs,
    /// The points.
    pub points: Vec<MeasurementPoint>,
}

impl PointSet {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Dominant geometry type of an infrastructure layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GeometryKind {
    /// Linear features (rail, road centerlines).
    Line,
    /// Areal features (harbour footprint).
    Polygon,
}

impl GeometryKind {
    /// Classifies a geometry. Points and empty collections return `None`.
    #[must_use]
    pub fn of(geometry: &Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(Self::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(Self::Polygon),
            Geometry::GeometryCollection(gc) => gc.iter().find_map(Self::of),
            Geometry::Point(_) | Geometry::MultiPoint(_) => None,
        }
    }
}

/// All features of one infrastructure class.
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureLayer {
    /// Class label (e.g. `"Railways"`).
    pub class: String,
    /// CRS of the feature coordinates.
    pub crs: Crs,
    /// Feature geometries.
    pub features: Vec<Geometry<f64>>,
}

impl InfrastructureLayer {
    /// The geometry kind of the first classifiable feature.
    #[must_use]
    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.features.iter().find_map(GeometryKind::of)
    }
}

/// One infrastructure feature expanded by the class radius.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBuffer {
    /// Class label.
    pub infra_type: String,
    /// Radius used, in meters.
    pub buffer_m: f64,
    /// Buffered polygon in the metric CRS.
    pub geometry: MultiPolygon<f64>,
}

/// The analysis zone of one infrastructure class.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferZone {
    /// Class label.
    pub infra_type: String,
    /// Radius used, in meters. Zero means the raw footprint.
    pub buffer_m: f64,
    /// Metric CRS of `geometry`.
    pub crs: Crs,
    /// Zone polygons. A single unioned shape when `dissolved`, otherwise one
    /// member per input feature (members may overlap).
    pub geometry: MultiPolygon<f64>,
    /// True if per-feature buffers were unioned.
    pub dissolved: bool,
    /// Planar area in square meters.
    pub area_m2: f64,
}

/// Points that fall inside one [`BufferZone`].
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePointSet {
    /// Label of the owning zone. Every point in the set carries it.
    pub infrastructure: String,
    /// CRS of the point locations (the zone's metric CRS).
    pub crs: Crs,
    /// Retained points, in input order.
    pub points: Vec<MeasurementPoint>,
}

impl ZonePointSet {
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no points fell in the zone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon, line_string, point, polygon};

    use super::*;

    #[test]
    fn parses_risk_labels_case_insensitively() {
        assert_eq!("High Risk".parse::<RiskLabel>().unwrap(), RiskLabel::HighRisk);
        assert_eq!("high risk".parse::<RiskLabel>().unwrap(), RiskLabel::HighRisk);
        assert_eq!("STABLE".parse::<RiskLabel>().unwrap(), RiskLabel::Stable);
        assert!("Extreme".parse::<RiskLabel>().is_err());
        assert_eq!(RiskLabel::MediumRisk.to_string(), "Medium Risk");
    }

    #[test]
    fn point_label_lookup() {
        let mut p = MeasurementPoint::new(point!(x: 0.0, y: 0.0), -1.5);
        assert_eq!(p.risk_label(), None);
        p.risk_level = Some(" Low Risk ".to_string());
        assert_eq!(p.risk_label(), Some(RiskLabel::LowRisk));
        p.risk_level = Some("unknown".to_string());
        assert_eq!(p.risk_label(), None);
    }

    #[test]
    fn classifies_geometry_kind() {
        let line: LineString<f64> = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        let poly: Polygon<f64> = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert_eq!(GeometryKind::of(&line.into()), Some(GeometryKind::Line));
        assert_eq!(GeometryKind::of(&poly.into()), Some(GeometryKind::Polygon));
        assert_eq!(GeometryKind::of(&point!(x: 0.0, y: 0.0).into()), None);
    }
}
