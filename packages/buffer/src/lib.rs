#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Buffer zones around infrastructure.
//!
//! Each class layer is reprojected into the metric target CRS, every feature
//! is expanded by the class radius, and the expanded features are unioned
//! into one zone per class. A zero radius skips expansion: the polygon
//! footprints are used as-is (the harbour boundary case), which only works
//! for areal input.

use geo::{Area, Buffer, Geometry, MultiPolygon, unary_union};
use infra_motion_crs::{Crs, CrsError, Reprojector};
use infra_motion_models::{BufferZone, FeatureBuffer, InfrastructureLayer};
use thiserror::Error;

/// Errors that can occur while building buffer zones.
#[derive(Debug, Error)]
pub enum BufferError {
    /// The class layer has no features to buffer.
    #[error("Geometry error: class '{class}' has no input features")]
    NoFeatures {
        /// Class label.
        class: String,
    },

    /// The input cannot produce an areal zone.
    #[error("Geometry error: class '{class}': {reason}")]
    Degenerate {
        /// Class label.
        class: String,
        /// Why the geometry was rejected.
        reason: String,
    },

    /// The radius is negative or not finite.
    #[error("Invalid buffer radius {buffer_m} for class '{class}'")]
    InvalidRadius {
        /// Class label.
        class: String,
        /// The rejected radius.
        buffer_m: f64,
    },

    /// Reprojection into the metric CRS is impossible.
    #[error("Reprojection error: {0}")]
    Crs(#[from] CrsError),
}

/// Per-feature buffers and the resulting zone of one class.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferOutput {
    /// One buffer per input feature, in input order.
    pub features: Vec<FeatureBuffer>,
    /// The class zone.
    pub zone: BufferZone,
}

/// Builds the buffer zone of one infrastructure class.
///
/// When `dissolve` is false the zone keeps one member polygon per feature;
/// members may overlap.
///
/// # Errors
///
/// Returns [`BufferError::NoFeatures`] for an empty layer,
/// [`BufferError::Degenerate`] if nothing areal results (for example line
/// features with a zero radius), [`BufferError::InvalidRadius`] for a
/// negative radius and [`BufferError::Crs`] if `target` is not metric.
pub fn build_zone(
    layer: &InfrastructureLayer,
    buffer_m: f64,
    target: Crs,
    dissolve: bool,
) -> Result<BufferOutput, BufferError> {
    let class = &layer.class;

    if !buffer_m.is_finite() || buffer_m < 0.0 {
        return Err(BufferError::InvalidRadius {
            class: class.clone(),
            buffer_m,
        });
    }
    let target = target.require_metric()?;

    if layer.features.is_empty() {
        return Err(BufferError::NoFeatures {
            class: class.clone(),
        });
    }

    let reprojector = Reprojector::new(layer.crs, target);
    if !reprojector.is_identity() {
        log::info!("Reprojecting {class} from {} to {target}", layer.crs);
    }

    let mut features = Vec::with_capacity(layer.features.len());
    for (index, geometry) in layer.features.iter().enumerate() {
        let projected = reprojector.geometry(geometry);
        let expanded = if buffer_m > 0.0 {
            projected.buffer(buffer_m)
        } else {
            footprint(&projected).ok_or_else(|| BufferError::Degenerate {
                class: class.clone(),
                reason: format!(
                    "feature {index} is not a polygon and cannot be used without a buffer"
                ),
            })?
        };

        if expanded.0.is_empty() {
            log::warn!("{class} feature {index} produced an empty buffer; skipping");
            continue;
        }

        features.push(FeatureBuffer {
            infra_type: class.clone(),
            buffer_m,
            geometry: expanded,
        });
    }

    if features.is_empty() {
        return Err(BufferError::Degenerate {
            class: class.clone(),
            reason: "every feature produced an empty buffer".to_string(),
        });
    }

    let geometry = if dissolve {
        unary_union(features.iter().map(|f| &f.geometry))
    } else {
        MultiPolygon(
            features
                .iter()
                .flat_map(|f| f.geometry.0.iter().cloned())
                .collect(),
        )
    };

    let area_m2 = geometry.unsigned_area();
    if area_m2 <= 0.0 {
        return Err(BufferError::Degenerate {
            class: class.clone(),
            reason: "zone has zero area".to_string(),
        });
    }

    if buffer_m > 0.0 {
        log::info!(
            "Created {buffer_m}m buffer around {} {class} features",
            features.len()
        );
    } else {
        log::info!("Using {class} boundary as-is (no additional buffer)");
    }
    if dissolve {
        log::info!(
            "{class}: {} features -> 1 dissolved zone ({} parts, {:.0} m2)",
            features.len(),
            geometry.0.len(),
            area_m2
        );
    }

    Ok(BufferOutput {
        features,
        zone: BufferZone {
            infra_type: class.clone(),
            buffer_m,
            crs: target,
            geometry,
            dissolved: dissolve,
            area_m2,
        },
    })
}

/// Areal part of a geometry, used unchanged for zero-radius classes.
fn footprint(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let polygons: Vec<_> = gc
                .iter()
                .filter_map(footprint)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then(|| MultiPolygon(polygons))
        }
        Geometry::Point(_)
        | Geometry::MultiPoint(_)
        | Geometry::Line(_)
        | Geometry::LineString(_)
        | Geometry::MultiLineString(_) => None,
    }
}
