//! Transverse Mercator projection on the GRS80/WGS84 ellipsoid.
//!
//! Series expansions from Snyder, *Map Projections: A Working Manual*
//! (USGS 1987), pp. 61-64. Accurate to millimeters within a few degrees of
//! the central meridian, which covers a national grid or a UTM zone.

// ── GRS80 ellipsoid ─────────────────────────────────────────────────────

/// Semi-major axis (m).
const A: f64 = 6_378_137.0;
/// Flattening. WGS84 differs in the ninth significant digit.
const F: f64 = 1.0 / 298.257_222_101;
/// First eccentricity squared.
const E2: f64 = 2.0 * F - F * F;
/// Second eccentricity squared.
const EP2: f64 = E2 / (1.0 - E2);

/// Parameters of one transverse Mercator projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    /// Latitude of origin (degrees).
    pub lat0: f64,
    /// Central meridian (degrees).
    pub lon0: f64,
    /// Scale factor on the central meridian.
    pub k0: f64,
    /// False easting (m).
    pub false_easting: f64,
    /// False northing (m).
    pub false_northing: f64,
}

impl TransverseMercator {
    /// Irish Transverse Mercator (EPSG:2157).
    #[must_use]
    pub const fn irish() -> Self {
        Self {
            lat0: 53.5,
            lon0: -8.0,
            k0: 0.999_820,
            false_easting: 600_000.0,
            false_northing: 750_000.0,
        }
    }

    /// Universal Transverse Mercator zone `zone` (1-60).
    #[must_use]
    pub fn utm(zone: u32, north: bool) -> Self {
        Self {
            lat0: 0.0,
            lon0: f64::from(zone) * 6.0 - 183.0,
            k0: 0.9996,
            false_easting: 500_000.0,
            false_northing: if north { 0.0 } else { 10_000_000.0 },
        }
    }

    /// Projects longitude/latitude (degrees) to easting/northing (m).
    #[must_use]
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let dlam = (lon - self.lon0).to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = A / (1.0 - E2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = EP2 * cos_phi * cos_phi;
        let a = dlam * cos_phi;

        let m = meridian_arc(phi);
        let m0 = meridian_arc(self.lat0.to_radians());

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * EP2) * a5 / 120.0);

        let y = self.k0
            * (m - m0
                + n * tan_phi
                    * (a2 / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * EP2) * a6 / 720.0));

        (x + self.false_easting, y + self.false_northing)
    }

    /// Unprojects easting/northing (m) to longitude/latitude (degrees).
    #[must_use]
    pub fn inverse(&self, easting: f64, northing: f64) -> (f64, f64) {
        let x = easting - self.false_easting;
        let y = northing - self.false_northing;

        let m = meridian_arc(self.lat0.to_radians()) + y / self.k0;
        let e4 = E2 * E2;
        let e6 = e4 * E2;
        let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1me2 = (1.0 - E2).sqrt();
        let e1 = (1.0 - sqrt_1me2) / (1.0 + sqrt_1me2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();

        let c1 = EP2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - E2 * sin_phi1 * sin_phi1;
        let n1 = A / denom.sqrt();
        let r1 = A * (1.0 - E2) / denom.powf(1.5);
        let d = x / (n1 * self.k0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * EP2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * EP2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lam = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * EP2 + 24.0 * t1 * t1) * d5
                / 120.0)
            / cos_phi1;

        (self.lon0 + lam.to_degrees(), phi.to_degrees())
    }
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}
