//! World-to-page transform.

use geo::{Coord, Geometry, LineString, Polygon, Rect};

use crate::canvas::PagePoint;

/// Maps metric world coordinates into a page rectangle, keeping aspect
/// ratio and flipping the y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    world: Rect<f64>,
    left: f64,
    top: f64,
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl Viewport {
    /// Fits `world` into the page box `(left, top, width, height)`.
    ///
    /// The world extent is padded by 5% on each side. Degenerate extents
    /// are widened to 1 m.
    #[must_use]
    pub fn fit(world: Rect<f64>, left: f64, top: f64, width: f64, height: f64) -> Self {
        let w = world.width().max(1.0);
        let h = world.height().max(1.0);
        let margin = w.max(h) * 0.05;
        let center = world.center();
        let world = Rect::new(
            Coord {
                x: center.x - w / 2.0 - margin,
                y: center.y - h / 2.0 - margin,
            },
            Coord {
                x: center.x + w / 2.0 + margin,
                y: center.y + h / 2.0 + margin,
            },
        );

        let scale = (width / world.width()).min(height / world.height());
        Self {
            world,
            left,
            top,
            scale,
            pad_x: world.width().mul_add(-scale, width) / 2.0,
            pad_y: world.height().mul_add(-scale, height) / 2.0,
        }
    }

    /// Page position of a world coordinate.
    #[must_use]
    pub fn project(&self, c: Coord<f64>) -> (f64, f64) {
        (
            (c.x - self.world.min().x).mul_add(self.scale, self.left + self.pad_x),
            (self.world.max().y - c.y).mul_add(self.scale, self.top + self.pad_y),
        )
    }
}

/// A geometry part projected onto the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// An open line.
    Line(Vec<PagePoint>),
    /// A polygon: exterior ring first, then holes. Rings are closed.
    Area(Vec<Vec<PagePoint>>),
}

fn project_line(line: &LineString<f64>, viewport: &Viewport) -> Vec<PagePoint> {
    line.coords().map(|c| viewport.project(*c)).collect()
}

fn project_polygon(p: &Polygon<f64>, viewport: &Viewport) -> Shape {
    let mut rings = vec![project_line(p.exterior(), viewport)];
    rings.extend(p.interiors().iter().map(|r| project_line(r, viewport)));
    Shape::Area(rings)
}

/// Projects the linear and areal parts of a geometry. Points are skipped.
#[must_use]
pub fn shapes(geometry: &Geometry<f64>, viewport: &Viewport) -> Vec<Shape> {
    let mut out = Vec::new();
    append(geometry, viewport, &mut out);
    out
}

fn append(geometry: &Geometry<f64>, viewport: &Viewport, out: &mut Vec<Shape>) {
    match geometry {
        Geometry::Line(l) => out.push(Shape::Line(project_line(&LineString::from(*l), viewport))),
        Geometry::LineString(ls) => out.push(Shape::Line(project_line(ls, viewport))),
        Geometry::MultiLineString(mls) => {
            out.extend(mls.iter().map(|ls| Shape::Line(project_line(ls, viewport))));
        }
        Geometry::Polygon(p) => out.push(project_polygon(p, viewport)),
        Geometry::MultiPolygon(mp) => {
            out.extend(mp.iter().map(|p| project_polygon(p, viewport)));
        }
        Geometry::Rect(r) => out.push(project_polygon(&r.to_polygon(), viewport)),
        Geometry::Triangle(t) => out.push(project_polygon(&t.to_polygon(), viewport)),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                append(g, viewport, out);
            }
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
    }
}
