#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone join: which measurement points fall inside which buffer zone.
//!
//! Points are reprojected once into the zones' metric CRS and bulk-loaded
//! into an R-tree. Each zone then queries the tree with its bounding box and
//! keeps the candidates strictly inside its polygon. A point on a zone
//! boundary is not inside it.

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use infra_motion_crs::{Crs, CrsError, Reprojector};
use infra_motion_models::{BufferZone, MeasurementPoint, PointSet, ZonePointSet};
use rstar::{AABB, RTree, primitives::GeomWithData};
use thiserror::Error;

/// Errors that can occur while joining points to zones.
#[derive(Debug, Error)]
pub enum JoinError {
    /// A zone is not in the CRS the points are being joined in.
    #[error("CRS mismatch: zone '{zone}' is in {found}, expected {expected}")]
    CrsMismatch {
        /// The join CRS.
        expected: Crs,
        /// The zone's CRS.
        found: Crs,
        /// Zone label.
        zone: String,
    },

    /// The join CRS cannot be used.
    #[error("Reprojection error: {0}")]
    Crs(#[from] CrsError),
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Measurement points in a metric CRS, indexed for envelope queries.
pub struct PointIndex {
    crs: Crs,
    points: Vec<MeasurementPoint>,
    tree: RTree<IndexedPoint>,
}

impl PointIndex {
    /// Reprojects `set` into `target` and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::Crs`] if `target` is not metric.
    pub fn build(set: &PointSet, target: Crs) -> Result<Self, JoinError> {
        let target = target.require_metric()?;
        let reprojector = Reprojector::new(set.crs, target);
        if !reprojector.is_identity() {
            log::info!(
                "Reprojecting {} points from {} to {target}",
                set.len(),
                set.crs
            );
        }

        let points: Vec<MeasurementPoint> = set
            .points
            .iter()
            .map(|p| MeasurementPoint {
                location: Point::from(reprojector.coord(p.location.0)),
                ..p.clone()
            })
            .collect();

        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.location.x(), p.location.y()], i))
            .collect();

        Ok(Self {
            crs: target,
            points,
            tree: RTree::bulk_load(entries),
        })
    }

    /// CRS of the indexed locations.
    #[must_use]
    pub const fn crs(&self) -> Crs {
        self.crs
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices of the points strictly inside `polygon`, ascending.
    #[must_use]
    pub fn within(&self, polygon: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = polygon.bounding_rect() else {
            return Vec::new();
        };
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .filter(|&i| polygon.contains(&self.points[i].location))
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Points strictly inside `zone`, tagged with its label.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::CrsMismatch`] if the zone is in another CRS.
    pub fn join(&self, zone: &BufferZone) -> Result<ZonePointSet, JoinError> {
        if !zone.crs.is_equivalent(&self.crs) {
            return Err(JoinError::CrsMismatch {
                expected: self.crs,
                found: zone.crs,
                zone: zone.infra_type.clone(),
            });
        }

        let points = self
            .within(&zone.geometry)
            .into_iter()
            .map(|i| self.points[i].clone())
            .collect();

        Ok(ZonePointSet {
            infrastructure: zone.infra_type.clone(),
            crs: self.crs,
            points,
        })
    }
}

/// Joins `points` against every zone, in zone order.
///
/// A point inside several zones appears in each of their sets. Zones that
/// catch nothing yield an empty set; callers decide whether to skip them.
///
/// # Errors
///
/// Returns [`JoinError::CrsMismatch`] if a zone is not in `target`, and
/// [`JoinError::Crs`] if `target` is not metric.
pub fn join_zones(
    points: &PointSet,
    zones: &[BufferZone],
    target: Crs,
) -> Result<Vec<ZonePointSet>, JoinError> {
    for zone in zones {
        if !zone.crs.is_equivalent(&target) {
            return Err(JoinError::CrsMismatch {
                expected: target,
                found: zone.crs,
                zone: zone.infra_type.clone(),
            });
        }
    }

    let index = PointIndex::build(points, target)?;
    log::info!("Indexed {} points in {target}", index.len());

    let mut sets = Vec::with_capacity(zones.len());
    for zone in zones {
        let set = index.join(zone)?;
        log_zone(&set);
        sets.push(set);
    }

    let total: usize = sets.iter().map(ZonePointSet::len).sum();
    log::info!(
        "Joined {total} point memberships across {} zones",
        sets.len()
    );
    Ok(sets)
}

fn log_zone(set: &ZonePointSet) {
    if set.is_empty() {
        log::warn!("No points found within {} zone", set.infrastructure);
        return;
    }

    let mut velocities: Vec<f64> = set.points.iter().map(|p| p.velocity).collect();
    velocities.sort_by(f64::total_cmp);
    let n = velocities.len();
    #[allow(clippy::cast_precision_loss)]
    let mean = velocities.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 0 {
        f64::midpoint(velocities[n / 2 - 1], velocities[n / 2])
    } else {
        velocities[n / 2]
    };

    log::info!("{}: {n} points", set.infrastructure);
    log::info!("  Mean velocity: {mean:.2} mm/yr");
    log::info!("  Median velocity: {median:.2} mm/yr");
    log::info!(
        "  Range: {:.2} to {:.2} mm/yr",
        velocities[0],
        velocities[n - 1]
    );
}
