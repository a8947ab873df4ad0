//! Pixel drawing on an RGB image.
//!
//! Coordinates are page pixels as floats; a pixel is covered when its
//! center is. There is no anti-aliasing.

use image::{Rgb, RgbImage};

use crate::font;

/// A page position in pixels.
pub type PagePoint = (f64, f64);

/// Drawing surface backed by an [`RgbImage`].
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbImage,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mix(dst: u8, src: u8, alpha: f64) -> u8 {
    (f64::from(src) - f64::from(dst))
        .mul_add(alpha, f64::from(dst))
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Pixel indices in `[0, max)` whose centers may fall in `[lo, hi]`.
#[allow(clippy::cast_possible_truncation)]
fn span(lo: f64, hi: f64, max: u32) -> std::ops::Range<i64> {
    if !(lo.is_finite() && hi.is_finite()) {
        return 0..0;
    }
    let start = (lo.floor() as i64).max(0);
    let end = (hi.ceil() as i64 + 1).min(i64::from(max));
    start..end.max(start)
}

#[allow(clippy::cast_precision_loss)]
fn center(i: i64) -> f64 {
    i as f64 + 0.5
}

fn distance_to_segment(p: PagePoint, a: PagePoint, b: PagePoint) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx.mul_add(dx, dy * dy);
    let t = if len2 > 0.0 {
        ((p.0 - a.0).mul_add(dx, (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p.0 - t.mul_add(dx, a.0)).hypot(p.1 - t.mul_add(dy, a.1))
}

fn lerp_point(a: PagePoint, b: PagePoint, t: f64) -> PagePoint {
    ((b.0 - a.0).mul_add(t, a.0), (b.1 - a.1).mul_add(t, a.1))
}

impl Canvas {
    /// A `width` x `height` canvas filled with `background`.
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    /// The pixels drawn so far.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the canvas.
    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Blends `color` over one pixel. Off-page pixels are ignored.
    pub fn blend(&mut self, x: i64, y: i64, color: Rgb<u8>, alpha: f64) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }
        let pixel = self.image.get_pixel_mut(x, y);
        if alpha >= 1.0 {
            *pixel = color;
            return;
        }
        for (dst, src) in pixel.0.iter_mut().zip(color.0) {
            *dst = mix(*dst, src, alpha);
        }
    }

    /// Fills the axis-aligned box with top-left corner (`x`, `y`).
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgb<u8>, alpha: f64) {
        for py in span(y, y + height, self.image.height()) {
            let cy = center(py);
            if cy < y || cy >= y + height {
                continue;
            }
            for px in span(x, x + width, self.image.width()) {
                let cx = center(px);
                if cx >= x && cx < x + width {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    /// Outlines the axis-aligned box with top-left corner (`x`, `y`).
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, line: f64, color: Rgb<u8>) {
        let corners = [
            (x, y),
            (x + width, y),
            (x + width, y + height),
            (x, y + height),
            (x, y),
        ];
        self.polyline(&corners, line, color, None);
    }

    /// Draws a straight segment `width` pixels wide.
    pub fn segment(&mut self, a: PagePoint, b: PagePoint, width: f64, color: Rgb<u8>) {
        let half = width / 2.0;
        let rows = span(a.1.min(b.1) - half, a.1.max(b.1) + half, self.image.height());
        let cols = span(a.0.min(b.0) - half, a.0.max(b.0) + half, self.image.width());
        for py in rows {
            for px in cols.clone() {
                if distance_to_segment((center(px), center(py)), a, b) <= half {
                    self.blend(px, py, color, 1.0);
                }
            }
        }
    }

    /// Draws connected segments. `dash` is `(on, off)` in pixels, measured
    /// along the whole line.
    pub fn polyline(&mut self, points: &[PagePoint], width: f64, color: Rgb<u8>, dash: Option<(f64, f64)>) {
        let mut travelled = 0.0;
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let len = (b.0 - a.0).hypot(b.1 - a.1);
            match dash {
                Some((on, off)) if on > 0.0 && len > 0.0 => {
                    let period = on + off.max(0.0);
                    let mut t = 0.0;
                    while t < len {
                        let phase = (travelled + t) % period;
                        if phase < on {
                            let end = (t + on - phase).min(len);
                            self.segment(lerp_point(a, b, t / len), lerp_point(a, b, end / len), width, color);
                            t = end;
                        } else {
                            t = (t + period - phase).min(len);
                        }
                    }
                }
                _ => self.segment(a, b, width, color),
            }
            travelled += len;
        }
    }

    /// Fills the area enclosed by `rings` with the even-odd rule, so inner
    /// rings cut holes.
    pub fn fill_polygon(&mut self, rings: &[Vec<PagePoint>], color: Rgb<u8>, alpha: f64) {
        let ys = rings.iter().flatten().map(|p| p.1);
        let (lo, hi) = ys.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| (lo.min(y), hi.max(y)));
        let mut crossings = Vec::new();
        for py in span(lo, hi, self.image.height()) {
            let cy = center(py);
            crossings.clear();
            for ring in rings {
                let Some(&last) = ring.last() else {
                    continue;
                };
                let mut prev = last;
                for &p in ring {
                    if (prev.1 <= cy) != (p.1 <= cy) {
                        crossings.push((cy - prev.1).mul_add((p.0 - prev.0) / (p.1 - prev.1), prev.0));
                    }
                    prev = p;
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                for px in span(pair[0] - 1.0, pair[1], self.image.width()) {
                    let cx = center(px);
                    if cx >= pair[0] && cx < pair[1] {
                        self.blend(px, py, color, alpha);
                    }
                }
            }
        }
    }

    /// Fills a disc.
    pub fn fill_circle(&mut self, c: PagePoint, radius: f64, color: Rgb<u8>, alpha: f64) {
        self.disc(c, 0.0, radius, color, alpha);
    }

    /// Draws a circle outline `width` pixels wide, inside `radius`.
    pub fn stroke_circle(&mut self, c: PagePoint, radius: f64, width: f64, color: Rgb<u8>) {
        self.disc(c, (radius - width).max(0.0), radius, color, 1.0);
    }

    fn disc(&mut self, c: PagePoint, inner: f64, outer: f64, color: Rgb<u8>, alpha: f64) {
        for py in span(c.1 - outer, c.1 + outer, self.image.height()) {
            for px in span(c.0 - outer, c.0 + outer, self.image.width()) {
                let d = (center(px) - c.0).hypot(center(py) - c.1);
                if d <= outer && (inner <= 0.0 || d >= inner) {
                    self.blend(px, py, color, alpha);
                }
            }
        }
    }

    /// Draws `text` with its top-left corner at (`x`, `y`), each font pixel
    /// `scale` page pixels square. `bold` doubles every stroke sideways.
    pub fn text(&mut self, x: f64, y: f64, text: &str, scale: u32, bold: bool, color: Rgb<u8>) {
        let size = f64::from(scale);
        let mut left = x;
        for c in text.chars() {
            for col in 0..font::GLYPH_WIDTH {
                for row in 0..font::GLYPH_HEIGHT {
                    if font::is_set(c, col, row) {
                        let gx = f64::from(col).mul_add(size, left);
                        let gy = f64::from(row).mul_add(size, y);
                        self.fill_rect(gx, gy, size, size, color, 1.0);
                        if bold {
                            self.fill_rect(gx + 1.0, gy, size, size, color, 1.0);
                        }
                    }
                }
            }
            left = f64::from(font::ADVANCE).mul_add(size, left);
        }
    }

    /// Draws `text` horizontally centered on `cx`.
    pub fn text_centered(&mut self, cx: f64, y: f64, text: &str, scale: u32, bold: bool, color: Rgb<u8>) {
        let x = cx - font::text_width(text, scale) / 2.0;
        self.text(x, y, text, scale, bold, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn count(canvas: &Canvas, color: Rgb<u8>) -> usize {
        canvas.image().pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn blends_and_clips() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        canvas.blend(1, 1, BLACK, 0.5);
        canvas.blend(-1, 2, BLACK, 1.0);
        canvas.blend(2, 9, BLACK, 1.0);
        assert_eq!(*canvas.image().get_pixel(1, 1), Rgb([128, 128, 128]));
        assert_eq!(count(&canvas, BLACK), 0);
    }

    #[test]
    fn square_covers_its_pixels() {
        let mut canvas = Canvas::new(20, 20, WHITE);
        let square = vec![(2.0, 2.0), (12.0, 2.0), (12.0, 12.0), (2.0, 12.0)];
        canvas.fill_polygon(&[square], BLACK, 1.0);
        assert_eq!(count(&canvas, BLACK), 100);
        assert_eq!(*canvas.image().get_pixel(2, 2), BLACK);
        assert_eq!(*canvas.image().get_pixel(12, 12), WHITE);
    }

    #[test]
    fn inner_ring_is_a_hole() {
        let mut canvas = Canvas::new(20, 20, WHITE);
        let outer = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let inner = vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)];
        canvas.fill_polygon(&[outer, inner], BLACK, 1.0);
        assert_eq!(count(&canvas, BLACK), 96);
        assert_eq!(*canvas.image().get_pixel(5, 5), WHITE);
    }

    #[test]
    fn dashed_line_has_gaps() {
        let mut solid = Canvas::new(40, 5, WHITE);
        solid.polyline(&[(0.0, 2.5), (40.0, 2.5)], 1.0, BLACK, None);
        let mut dashed = Canvas::new(40, 5, WHITE);
        dashed.polyline(&[(0.0, 2.5), (40.0, 2.5)], 1.0, BLACK, Some((5.0, 5.0)));

        let solid_count = count(&solid, BLACK);
        let dashed_count = count(&dashed, BLACK);
        assert!(solid_count >= 40, "{solid_count}");
        assert!(dashed_count < solid_count, "{dashed_count}");
        assert_eq!(*dashed.image().get_pixel(2, 2), BLACK);
        assert_eq!(*dashed.image().get_pixel(7, 2), WHITE);
    }

    #[test]
    fn circle_fill_and_outline() {
        let mut canvas = Canvas::new(21, 21, WHITE);
        canvas.fill_circle((10.5, 10.5), 5.0, BLACK, 1.0);
        assert_eq!(*canvas.image().get_pixel(10, 10), BLACK);
        assert_eq!(*canvas.image().get_pixel(10, 17), WHITE);

        let mut ring = Canvas::new(21, 21, WHITE);
        ring.stroke_circle((10.5, 10.5), 5.0, 1.0, BLACK);
        assert_eq!(*ring.image().get_pixel(10, 10), WHITE);
        assert_eq!(*ring.image().get_pixel(10, 15), BLACK);
    }

    #[test]
    fn text_draws_glyph_pixels() {
        let mut canvas = Canvas::new(20, 20, WHITE);
        canvas.text(0.0, 0.0, "-", 2, false, BLACK);
        // the minus bar is font row 3: page rows 6 and 7, columns 0..10
        assert_eq!(count(&canvas, BLACK), 20);
        assert_eq!(*canvas.image().get_pixel(0, 6), BLACK);
        assert_eq!(*canvas.image().get_pixel(9, 7), BLACK);
        assert_eq!(*canvas.image().get_pixel(0, 5), WHITE);
    }
}
