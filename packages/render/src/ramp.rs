//! Red-yellow-green velocity color ramp.
//!
//! Subsidence maps to red, zero to the yellow-green midpoint and uplift to
//! green. The domain is symmetric around zero so the same color always
//! means the same speed in either direction.

/// RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Creates a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` notation.
    #[must_use]
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        Self([c.r, c.g, c.b])
    }
}

/// A color stop: position in [0, 1] mapped to a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the ramp.
    pub t: f64,
    /// Color at `t`.
    pub color: Rgb,
}

impl ColorStop {
    const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// `#d73027 #fc8d59 #fee08b #d9ef8b #91cf60 #1a9850`, evenly spaced.
pub const VELOCITY_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0xd7, 0x30, 0x27),
    ColorStop::new(0.2, 0xfc, 0x8d, 0x59),
    ColorStop::new(0.4, 0xfe, 0xe0, 0x8b),
    ColorStop::new(0.6, 0xd9, 0xef, 0x8b),
    ColorStop::new(0.8, 0x91, 0xcf, 0x60),
    ColorStop::new(1.0, 0x1a, 0x98, 0x50),
];

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(b) - f64::from(a))
        .mul_add(t, f64::from(a))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Evaluates the ramp at `t`, clamped to [0, 1].
#[must_use]
pub fn evaluate(t: f64) -> Rgb {
    let stops = VELOCITY_STOPS;
    let last = stops[stops.len() - 1];
    if t.is_nan() || t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let ratio = (t - lo.t) / (hi.t - lo.t);
            return Rgb::new(
                lerp(lo.color.r, hi.color.r, ratio),
                lerp(lo.color.g, hi.color.g, ratio),
                lerp(lo.color.b, hi.color.b, ratio),
            );
        }
    }
    last.color
}

/// Maps velocities onto the ramp over `[-limit, limit]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityScale {
    limit: f64,
}

impl VelocityScale {
    /// Symmetric scale wide enough for every value. An all-zero input gets
    /// a 1 mm/yr domain.
    #[must_use]
    pub fn symmetric(velocities: impl IntoIterator<Item = f64>) -> Self {
        let limit = velocities
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        Self {
            limit: if limit > 0.0 { limit } else { 1.0 },
        }
    }

    /// Upper bound of the domain. The lower bound is its negation.
    #[must_use]
    pub const fn limit(&self) -> f64 {
        self.limit
    }

    /// Ramp position of `velocity`.
    #[must_use]
    pub fn position(&self, velocity: f64) -> f64 {
        ((velocity + self.limit) / (2.0 * self.limit)).clamp(0.0, 1.0)
    }

    /// Color of `velocity`.
    #[must_use]
    pub fn color(&self, velocity: f64) -> Rgb {
        evaluate(self.position(velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_and_stops() {
        assert_eq!(evaluate(0.0).hex(), "#d73027");
        assert_eq!(evaluate(0.4).hex(), "#fee08b");
        assert_eq!(evaluate(1.0).hex(), "#1a9850");
        assert_eq!(evaluate(-3.0), evaluate(0.0));
        assert_eq!(evaluate(7.0), evaluate(1.0));
    }

    #[test]
    fn interpolates_between_stops() {
        // halfway between #fee08b and #d9ef8b
        assert_eq!(evaluate(0.5), Rgb::new(0xec, 0xe8, 0x8b));
    }

    #[test]
    fn symmetric_scale() {
        let scale = VelocityScale::symmetric([-3.0, 1.0, 5.0]);
        assert!((scale.limit() - 5.0).abs() < f64::EPSILON);
        assert!((scale.position(0.0) - 0.5).abs() < f64::EPSILON);
        assert_eq!(scale.color(-5.0).hex(), "#d73027");
        assert_eq!(scale.color(5.0).hex(), "#1a9850");
    }

    #[test]
    fn flat_input_gets_unit_domain() {
        let scale = VelocityScale::symmetric([0.0, 0.0]);
        assert!((scale.limit() - 1.0).abs() < f64::EPSILON);
    }
}
