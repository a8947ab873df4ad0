//! CSV point tables.
//!
//! Input rows need `x`, `y` and `velocity` columns (`lon`/`lat`,
//! `longitude`/`latitude` and `easting`/`northing` are accepted for the
//! coordinates); `id` and `risk_level` are optional.

use std::path::Path;

use geo::Point;
use infra_motion_crs::Crs;
use infra_motion_models::{MeasurementPoint, PointSet, ZonePointSet};
use serde::{Deserialize, Serialize};

use crate::{IoError, ensure_input, write_atomic};

#[derive(Debug, Deserialize)]
struct PointRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "lon", alias = "longitude", alias = "easting")]
    x: f64,
    #[serde(alias = "lat", alias = "latitude", alias = "northing")]
    y: f64,
    velocity: f64,
    #[serde(default)]
    risk_level: Option<String>,
}

#[derive(Debug, Serialize)]
struct ZonePointRow<'a> {
    id: Option<&'a str>,
    x: f64,
    y: f64,
    velocity: f64,
    risk_level: Option<&'a str>,
    infrastructure: &'a str,
}

/// Reads a CSV point table whose coordinates are in `crs`.
///
/// # Errors
///
/// Returns an error if the file is missing, a row fails to parse, or a
/// coordinate or velocity is not finite.
pub fn read_points_csv(path: &Path, crs: Crs) -> Result<PointSet, IoError> {
    ensure_input(path)?;

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
    let mut points = Vec::new();

    for (index, row) in reader.deserialize::<PointRow>().enumerate() {
        let row = row?;
        if !(row.x.is_finite() && row.y.is_finite() && row.velocity.is_finite()) {
            return Err(IoError::InvalidFeature {
                path: path.to_path_buf(),
                index,
                message: "non-finite coordinate or velocity".to_string(),
            });
        }
        points.push(MeasurementPoint {
            id: row.id.filter(|s| !s.is_empty()),
            location: Point::new(row.x, row.y),
            velocity: row.velocity,
            risk_level: row.risk_level.filter(|s| !s.is_empty()),
        });
    }

    log::info!("Loaded {} points from {} ({crs})", points.len(), path.display());
    Ok(PointSet { crs, points })
}

/// Writes the points of a zone as CSV, one row per point.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_zone_points_csv(path: &Path, set: &ZonePointSet) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in &set.points {
        writer.serialize(ZonePointRow {
            id: point.id.as_deref(),
            x: point.location.x(),
            y: point.location.y(),
            velocity: point.velocity,
            risk_level: point.risk_level.as_deref(),
            infrastructure: &set.infrastructure,
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| IoError::Io(e.into_error()))?;
    write_atomic(path, &bytes)
}
