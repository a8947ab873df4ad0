//! `GeoJSON` readers and writers.
//!
//! A collection without a `crs` member is WGS84 (RFC 7946). Projected
//! outputs carry `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::n"}}`.

use std::path::Path;

use geo::{Geometry, MultiPolygon};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use infra_motion_crs::{Crs, CrsError};
use infra_motion_models::{
    BufferZone, FeatureBuffer, InfrastructureLayer, MeasurementPoint, PointSet, ZonePointSet,
};

use crate::{IoError, ensure_input, write_atomic};

/// Reads a feature collection and its declared CRS.
///
/// # Errors
///
/// Returns an error if the file is missing, is not a feature collection,
/// or declares an unresolvable CRS.
pub fn read_collection(path: &Path) -> Result<(Crs, FeatureCollection), IoError> {
    ensure_input(path)?;
    let content = std::fs::read_to_string(path)?;
    let geojson: GeoJson = content.parse()?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(f) => FeatureCollection {
            bbox: None,
            features: vec![f],
            foreign_members: None,
        },
        GeoJson::Geometry(_) => {
            return Err(IoError::InvalidFeature {
                path: path.to_path_buf(),
                index: 0,
                message: "expected a FeatureCollection, found a bare geometry".to_string(),
            });
        }
    };

    let crs = declared_crs(collection.foreign_members.as_ref(), path)?;
    Ok((crs, collection))
}

/// Resolves the legacy `crs` member, defaulting to WGS84.
fn declared_crs(members: Option<&JsonObject>, path: &Path) -> Result<Crs, IoError> {
    let Some(crs) = members.and_then(|m| m.get("crs")) else {
        return Ok(Crs::wgs84());
    };

    if crs.is_null() {
        return Err(CrsError::Undefined {
            context: path.display().to_string(),
        }
        .into());
    }

    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| CrsError::Undefined {
            context: path.display().to_string(),
        })?;

    Ok(name.parse()?)
}

fn crs_member(crs: Crs) -> Option<JsonObject> {
    if crs.is_equivalent(&Crs::wgs84()) {
        return None;
    }
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        serde_json::json!({
            "type": "name",
            "properties": { "name": crs.urn() },
        }),
    );
    Some(members)
}

fn invalid(path: &Path, index: usize, message: impl Into<String>) -> IoError {
    IoError::InvalidFeature {
        path: path.to_path_buf(),
        index,
        message: message.into(),
    }
}

/// Reads the geometries of one infrastructure class.
///
/// Features without geometry are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a geometry cannot be
/// converted.
pub fn read_infrastructure(path: &Path, class: &str) -> Result<InfrastructureLayer, IoError> {
    let (crs, collection) = read_collection(path)?;

    let mut features = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping {class} feature {index} without geometry");
            continue;
        };
        let geometry = Geometry::<f64>::try_from(geometry)
            .map_err(|e| invalid(path, index, e.to_string()))?;
        features.push(geometry);
    }

    log::info!(
        "Loaded {} {class} features from {} ({crs})",
        features.len(),
        path.display()
    );

    Ok(InfrastructureLayer {
        class: class.to_string(),
        crs,
        features,
    })
}

/// Reads measurement points.
///
/// Each feature needs a `Point` geometry and a numeric `velocity`
/// property (numeric strings are accepted). `risk_level` and an id (the
/// feature id or an `id` property) are optional.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a feature is malformed.
pub fn read_points(path: &Path) -> Result<PointSet, IoError> {
    let (crs, collection) = read_collection(path)?;

    let mut points = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        points.push(point_from_feature(feature, path, index)?);
    }

    log::info!("Loaded {} points from {} ({crs})", points.len(), path.display());
    Ok(PointSet { crs, points })
}

fn point_from_feature(feature: Feature, path: &Path, index: usize) -> Result<MeasurementPoint, IoError> {
    let geometry = feature
        .geometry
        .ok_or_else(|| invalid(path, index, "missing geometry"))?;
    let location = match Geometry::<f64>::try_from(geometry)
        .map_err(|e| invalid(path, index, e.to_string()))?
    {
        Geometry::Point(p) => p,
        _ => return Err(invalid(path, index, "expected Point geometry")),
    };

    let props = feature.properties.unwrap_or_default();

    let velocity = props
        .get("velocity")
        .and_then(json_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(path, index, "missing or non-numeric 'velocity'"))?;

    let risk_level = props
        .get("risk_level")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty());

    let id = feature
        .id
        .map(|id| match id {
            Id::String(s) => s,
            Id::Number(n) => n.to_string(),
        })
        .or_else(|| props.get("id").and_then(json_id));

    Ok(MeasurementPoint {
        id,
        location,
        velocity,
        risk_level,
    })
}

fn json_f64(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_id(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads the points of one zone written by [`write_zone_points`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or a feature is malformed.
pub fn read_zone_points(path: &Path, infrastructure: &str) -> Result<ZonePointSet, IoError> {
    let set = read_points(path)?;
    Ok(ZonePointSet {
        infrastructure: infrastructure.to_string(),
        crs: set.crs,
        points: set.points,
    })
}

/// Reads a zone written by [`write_zone`].
///
/// # Errors
///
/// Returns an error if the file cannot be read, holds no feature, or the
/// geometry is not polygonal.
pub fn read_zone(path: &Path) -> Result<BufferZone, IoError> {
    use geo::Area as _;

    let (crs, collection) = read_collection(path)?;
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| invalid(path, 0, "zone file holds no feature"))?;

    let props = feature.properties.unwrap_or_default();
    let geometry = feature
        .geometry
        .ok_or_else(|| invalid(path, 0, "missing geometry"))?;
    let geometry = match Geometry::<f64>::try_from(geometry)
        .map_err(|e| invalid(path, 0, e.to_string()))?
    {
        Geometry::MultiPolygon(mp) => mp,
        Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => return Err(invalid(path, 0, "zone geometry is not polygonal")),
    };

    let infra_type = props
        .get("infra_type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| invalid(path, 0, "missing 'infra_type'"))?
        .to_string();
    let buffer_m = props.get("buffer_m").and_then(json_f64).unwrap_or(0.0);
    let dissolved = props
        .get("dissolved")
        .and_then(JsonValue::as_bool)
        .unwrap_or(true);
    let area_m2 = props
        .get("area_m2")
        .and_then(json_f64)
        .unwrap_or_else(|| geometry.unsigned_area());

    Ok(BufferZone {
        infra_type,
        buffer_m,
        crs,
        geometry,
        dissolved,
        area_m2,
    })
}

fn zone_properties(infra_type: &str, buffer_m: f64) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("infra_type".to_string(), infra_type.into());
    props.insert("buffer_m".to_string(), buffer_m.into());
    props
}

fn polygon_feature(geometry: &MultiPolygon<f64>, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(geometry))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn write_collection(path: &Path, crs: Crs, features: Vec<Feature>) -> Result<(), IoError> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: crs_member(crs),
    };
    let text = GeoJson::from(collection).to_string();
    write_atomic(path, text.as_bytes())
}

/// Writes a class zone as a single-feature collection.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_zone(path: &Path, zone: &BufferZone) -> Result<(), IoError> {
    let mut props = zone_properties(&zone.infra_type, zone.buffer_m);
    props.insert("dissolved".to_string(), zone.dissolved.into());
    props.insert("area_m2".to_string(), zone.area_m2.into());
    write_collection(path, zone.crs, vec![polygon_feature(&zone.geometry, props)])
}

/// Writes per-feature buffers of one class.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_feature_buffers(path: &Path, crs: Crs, buffers: &[FeatureBuffer]) -> Result<(), IoError> {
    let features = buffers
        .iter()
        .map(|b| polygon_feature(&b.geometry, zone_properties(&b.infra_type, b.buffer_m)))
        .collect();
    write_collection(path, crs, features)
}

/// Writes the points of a zone with their geometry and zone label.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_zone_points(path: &Path, set: &ZonePointSet) -> Result<(), IoError> {
    let features = set
        .points
        .iter()
        .map(|p| point_feature(p, Some(&set.infrastructure)))
        .collect();
    write_collection(path, set.crs, features)
}

/// Writes a plain point set.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_points(path: &Path, set: &PointSet) -> Result<(), IoError> {
    let features = set.points.iter().map(|p| point_feature(p, None)).collect();
    write_collection(path, set.crs, features)
}

fn point_feature(point: &MeasurementPoint, infrastructure: Option<&str>) -> Feature {
    let mut props = JsonObject::new();
    props.insert("velocity".to_string(), point.velocity.into());
    if let Some(risk) = &point.risk_level {
        props.insert("risk_level".to_string(), risk.clone().into());
    }
    if let Some(label) = infrastructure {
        props.insert("infrastructure".to_string(), label.into());
    }

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(&point.location))),
        id: point.id.clone().map(Id::String),
        properties: Some(props),
        foreign_members: None,
    }
}
