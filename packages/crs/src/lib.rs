#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate reference systems for the infrastructure ground-motion
//! pipeline.
//!
//! Buffers and containment tests only make sense in a metric projection, so
//! every input layer is moved into one projected CRS before any geometry
//! work happens. The supported systems are the geographic datums the inputs
//! arrive in (WGS84, ETRS89, `CRS84`) and transverse Mercator projections
//! on the GRS80/WGS84 ellipsoid: Irish Transverse Mercator and the UTM
//! zones. No libproj is involved.

pub mod reproject;
pub mod tm;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use reproject::Reprojector;
pub use tm::TransverseMercator;

/// EPSG code of WGS84 geographic coordinates.
pub const EPSG_WGS84: u32 = 4326;
/// EPSG code of ETRS89 geographic coordinates.
pub const EPSG_ETRS89: u32 = 4258;
/// EPSG code of Irish Transverse Mercator.
pub const EPSG_ITM: u32 = 2157;

/// Errors raised while resolving or applying a coordinate reference system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrsError {
    /// The input carried no usable CRS identifier.
    #[error("Coordinate reference system is undefined for {context}")]
    Undefined {
        /// What was being loaded when the CRS turned out to be missing.
        context: String,
    },

    /// The identifier could not be parsed.
    #[error("Unrecognised CRS identifier '{identifier}'")]
    Parse {
        /// The raw identifier string.
        identifier: String,
    },

    /// The EPSG code parsed but has no projection definition here.
    #[error("Unsupported CRS EPSG:{epsg}")]
    Unsupported {
        /// The EPSG code.
        epsg: u32,
    },

    /// A metric CRS was required but a geographic one was supplied.
    #[error("CRS EPSG:{epsg} is geographic; a projected metric CRS is required")]
    NotMetric {
        /// The EPSG code.
        epsg: u32,
    },
}

/// How coordinates in a [`Crs`] are expressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrsKind {
    /// Longitude/latitude in degrees.
    Geographic,
    /// Easting/northing in meters from a transverse Mercator projection.
    Projected(TransverseMercator),
}

/// A resolved coordinate reference system.
///
/// Serialized as its `EPSG:n` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u32,
    kind: CrsKind,
}

impl Crs {
    /// Resolves an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`CrsError::Unsupported`] if the code has no definition.
    pub fn from_epsg(epsg: u32) -> Result<Self, CrsError> {
        let kind = match epsg {
            EPSG_WGS84 | EPSG_ETRS89 => CrsKind::Geographic,
            EPSG_ITM => CrsKind::Projected(TransverseMercator::irish()),
            32601..=32660 => CrsKind::Projected(TransverseMercator::utm(epsg - 32600, true)),
            32701..=32760 => CrsKind::Projected(TransverseMercator::utm(epsg - 32700, false)),
            25801..=25860 => CrsKind::Projected(TransverseMercator::utm(epsg - 25800, true)),
            _ => return Err(CrsError::Unsupported { epsg }),
        };
        Ok(Self { epsg, kind })
    }

    /// WGS84 longitude/latitude.
    #[must_use]
    pub const fn wgs84() -> Self {
        Self {
            epsg: EPSG_WGS84,
            kind: CrsKind::Geographic,
        }
    }

    /// Irish Transverse Mercator (EPSG:2157).
    #[must_use]
    pub const fn itm() -> Self {
        Self {
            epsg: EPSG_ITM,
            kind: CrsKind::Projected(TransverseMercator::irish()),
        }
    }

    /// Returns the EPSG code.
    #[must_use]
    pub const fn epsg(&self) -> u32 {
        self.epsg
    }

    /// Returns how coordinates are expressed.
    #[must_use]
    pub const fn kind(&self) -> CrsKind {
        self.kind
    }

    /// True if planar distances in this CRS are meters.
    #[must_use]
    pub const fn is_metric(&self) -> bool {
        matches!(self.kind, CrsKind::Projected(_))
    }

    /// Returns `self` if it is metric.
    ///
    /// # Errors
    ///
    /// Returns [`CrsError::NotMetric`] for geographic systems.
    pub const fn require_metric(self) -> Result<Self, CrsError> {
        if self.is_metric() {
            Ok(self)
        } else {
            Err(CrsError::NotMetric { epsg: self.epsg })
        }
    }

    /// Two systems are equivalent when they describe the same coordinates.
    ///
    /// WGS84 and ETRS89 differ by well under a meter across Europe and are
    /// treated as the same datum.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (CrsKind::Geographic, CrsKind::Geographic) => true,
            (CrsKind::Projected(a), CrsKind::Projected(b)) => a == b,
            _ => false,
        }
    }

    /// OGC URN used when writing a legacy `GeoJSON` `crs` member.
    #[must_use]
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl FromStr for Crs {
    type Err = CrsError;

    /// Accepts `EPSG:2157`, `epsg:2157`, `2157`,
    /// `urn:ogc:def:crs:EPSG::2157` and `urn:ogc:def:crs:OGC:1.3:CRS84`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse_err = || CrsError::Parse {
            identifier: trimmed.to_string(),
        };

        if trimmed.is_empty() {
            return Err(parse_err());
        }

        let upper = trimmed.to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }

        let code = upper
            .strip_prefix("URN:OGC:DEF:CRS:EPSG:")
            .map(|rest| rest.trim_start_matches(':'))
            .or_else(|| upper.strip_prefix("EPSG:"))
            .unwrap_or(&upper);

        // URNs may carry a version between the authority and the code.
        let code = code.rsplit(':').next().unwrap_or(code);

        let epsg: u32 = code.parse().map_err(|_| parse_err())?;
        Self::from_epsg(epsg)
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}
