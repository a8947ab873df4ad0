//! Coordinate transformation between two [`Crs`] values.
//!
//! Projected-to-projected transforms go through geographic coordinates.
//! Geometries are transformed vertex by vertex with [`MapCoords`].

use geo::{Coord, MapCoords};

use crate::{Crs, CrsKind};

/// A resolved source → target coordinate transformation.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector {
    source: Crs,
    target: Crs,
    identity: bool,
}

impl Reprojector {
    /// Builds a transformation from `source` to `target`.
    #[must_use]
    pub fn new(source: Crs, target: Crs) -> Self {
        let identity = source.is_equivalent(&target);
        if !identity {
            log::debug!("Reprojecting {source} -> {target}");
        }
        Self {
            source,
            target,
            identity,
        }
    }

    /// The source system.
    #[must_use]
    pub const fn source(&self) -> Crs {
        self.source
    }

    /// The target system.
    #[must_use]
    pub const fn target(&self) -> Crs {
        self.target
    }

    /// True if coordinates pass through unchanged.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        self.identity
    }

    /// Transforms a single coordinate.
    #[must_use]
    pub fn coord(&self, c: Coord<f64>) -> Coord<f64> {
        if self.identity {
            return c;
        }

        let (lon, lat) = match self.source.kind() {
            CrsKind::Geographic => (c.x, c.y),
            CrsKind::Projected(tm) => tm.inverse(c.x, c.y),
        };

        let (x, y) = match self.target.kind() {
            CrsKind::Geographic => (lon, lat),
            CrsKind::Projected(tm) => tm.forward(lon, lat),
        };

        Coord { x, y }
    }

    /// Transforms every vertex of a geometry.
    #[must_use]
    pub fn geometry<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        if self.identity {
            return geometry.clone();
        }
        geometry.map_coords(|c| self.coord(c))
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point, line_string};

    use super::*;

    #[test]
    fn identity_between_equivalent_systems() {
        let r = Reprojector::new(Crs::wgs84(), Crs::from_epsg(4258).unwrap());
        assert!(r.is_identity());
        let c = Coord { x: -6.2, y: 53.3 };
        assert_eq!(r.coord(c), c);
    }

    #[test]
    fn wgs84_to_itm_and_back() {
        let there = Reprojector::new(Crs::wgs84(), Crs::itm());
        let back = Reprojector::new(Crs::itm(), Crs::wgs84());

        let p = Point::new(-6.2603, 53.3498);
        let projected = there.geometry(&p);
        assert!(projected.x() > 700_000.0);
        let restored = back.geometry(&projected);
        assert!((restored.x() - p.x()).abs() < 1e-8);
        assert!((restored.y() - p.y()).abs() < 1e-8);
    }

    #[test]
    fn projected_to_projected_goes_through_geographic() {
        let utm29 = Crs::from_epsg(32629).unwrap();
        let itm_to_utm = Reprojector::new(Crs::itm(), utm29);
        let utm_to_itm = Reprojector::new(utm29, Crs::itm());

        let c = Coord {
            x: 715_000.0,
            y: 734_000.0,
        };
        let round = utm_to_itm.coord(itm_to_utm.coord(c));
        assert!((round.x - c.x).abs() < 1e-3);
        assert!((round.y - c.y).abs() < 1e-3);
    }

    #[test]
    fn transforms_every_vertex() {
        let r = Reprojector::new(Crs::wgs84(), Crs::itm());
        let line: LineString<f64> = line_string![(x: -6.3, y: 53.3), (x: -6.2, y: 53.4)];
        let projected = r.geometry(&line);
        assert_eq!(projected.0.len(), 2);
        assert!(projected.0[1].x > projected.0[0].x);
        assert!(projected.0[1].y > projected.0[0].y);
    }
}
