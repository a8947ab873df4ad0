#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static analysis maps.
//!
//! One PNG per zone: the dashed zone outline, the infrastructure itself,
//! the zone's points colored by velocity, a color bar, a statistics box and
//! a north arrow. Everything is drawn in the zone's metric CRS.

pub mod canvas;
pub mod font;
pub mod ramp;
pub mod viewport;

use geo::{BoundingRect, Coord, Geometry, Rect};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use infra_motion_analytics_models::ZoneStatistics;
use infra_motion_crs::Reprojector;
use infra_motion_models::{BufferZone, GeometryKind, InfrastructureLayer, ZonePointSet};
use thiserror::Error;

use crate::canvas::Canvas;
use crate::ramp::{VelocityScale, evaluate};
use crate::viewport::{Shape, Viewport, shapes};

const PAGE_WIDTH: u32 = 1200;
const PAGE_HEIGHT: u32 = 1000;
const PLOT_LEFT: f64 = 60.0;
const PLOT_TOP: f64 = 110.0;
const PLOT_WIDTH: f64 = 1080.0;
const PLOT_HEIGHT: f64 = 720.0;
const POINT_RADIUS: f64 = 4.5;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const FRAME: Rgb<u8> = Rgb([0x44, 0x44, 0x44]);
const BOX_EDGE: Rgb<u8> = Rgb([0x88, 0x88, 0x88]);
const RAIL_RED: Rgb<u8> = Rgb([255, 0, 0]);
const LIGHT_BLUE: Rgb<u8> = Rgb([173, 216, 230]);
const DARK_BLUE: Rgb<u8> = Rgb([0, 0, 139]);

/// Errors that can occur while rendering a map.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The zone has no points to draw.
    #[error("Zone '{zone}' has no points to render")]
    EmptyZone {
        /// Zone label.
        zone: String,
    },

    /// The zone has no drawable extent.
    #[error("Zone '{zone}' has an empty extent")]
    EmptyExtent {
        /// Zone label.
        zone: String,
    },

    /// PNG encoding failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Everything needed to draw one zone map.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest<'a> {
    /// Heading line. The point count is added underneath.
    pub title: &'a str,
    /// The zone outline.
    pub zone: &'a BufferZone,
    /// The infrastructure the zone was built from, in any CRS.
    pub infrastructure: &'a InfrastructureLayer,
    /// Points inside the zone.
    pub points: &'a ZonePointSet,
    /// Statistics of `points`.
    pub stats: &'a ZoneStatistics,
    /// Stability band half-width (mm/yr), shown in the statistics box.
    pub stability_half_width_mm: f64,
}

/// Renders a zone map.
///
/// # Errors
///
/// Returns [`RenderError::EmptyZone`] if there are no points and
/// [`RenderError::EmptyExtent`] if the zone has no geometry.
pub fn render_map(request: &MapRequest<'_>) -> Result<RgbImage, RenderError> {
    let zone = request.zone;
    if request.points.is_empty() {
        return Err(RenderError::EmptyZone {
            zone: zone.infra_type.clone(),
        });
    }

    let infra_to_zone = Reprojector::new(request.infrastructure.crs, zone.crs);
    let infrastructure: Vec<Geometry<f64>> = request
        .infrastructure
        .features
        .iter()
        .map(|g| infra_to_zone.geometry(g))
        .collect();

    let points_to_zone = Reprojector::new(request.points.crs, zone.crs);
    let points: Vec<(Coord<f64>, f64)> = request
        .points
        .points
        .iter()
        .map(|p| (points_to_zone.coord(p.location.0), p.velocity))
        .collect();

    let extent = zone
        .geometry
        .bounding_rect()
        .map(|r| points.iter().fold(r, |acc, (c, _)| extend(acc, *c)))
        .ok_or_else(|| RenderError::EmptyExtent {
            zone: zone.infra_type.clone(),
        })?;
    let viewport = Viewport::fit(extent, PLOT_LEFT, PLOT_TOP, PLOT_WIDTH, PLOT_HEIGHT);
    let scale = VelocityScale::symmetric(points.iter().map(|(_, v)| *v));

    let mut canvas = Canvas::new(PAGE_WIDTH, PAGE_HEIGHT, WHITE);

    let center = f64::from(PAGE_WIDTH) / 2.0;
    canvas.text_centered(center, 28.0, request.title, 3, true, BLACK);
    canvas.text_centered(center, 72.0, &subtitle(request.points.len()), 2, false, BLACK);
    canvas.stroke_rect(PLOT_LEFT, PLOT_TOP, PLOT_WIDTH, PLOT_HEIGHT, 1.0, FRAME);

    for shape in shapes(&Geometry::MultiPolygon(zone.geometry.clone()), &viewport) {
        if let Shape::Area(rings) = shape {
            for ring in &rings {
                canvas.polyline(ring, 1.5, BLACK, Some((8.0, 5.0)));
            }
        }
    }

    let areal = matches!(
        request.infrastructure.geometry_kind(),
        Some(GeometryKind::Polygon)
    );
    for geometry in &infrastructure {
        for shape in shapes(geometry, &viewport) {
            draw_infrastructure(&mut canvas, &shape, areal);
        }
    }

    for (c, velocity) in &points {
        let at = viewport.project(*c);
        canvas.fill_circle(at, POINT_RADIUS, scale.color(*velocity).into(), 0.8);
        canvas.stroke_circle(at, POINT_RADIUS, 0.6, BLACK);
    }

    draw_stats_box(
        &mut canvas,
        &stats_lines(request.stats, request.stability_half_width_mm),
    );
    draw_north_arrow(&mut canvas);
    draw_color_bar(&mut canvas, &scale);

    log::debug!(
        "Rendered {} map: {} points, {} infrastructure features",
        zone.infra_type,
        points.len(),
        infrastructure.len()
    );
    Ok(canvas.into_image())
}

/// Encodes a rendered map as PNG.
///
/// # Errors
///
/// Returns [`RenderError::Image`] if encoding fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

fn extend(rect: Rect<f64>, c: Coord<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: rect.min().x.min(c.x),
            y: rect.min().y.min(c.y),
        },
        Coord {
            x: rect.max().x.max(c.x),
            y: rect.max().y.max(c.y),
        },
    )
}

/// Lines in red; areas filled light blue with a dark-blue edge.
fn draw_infrastructure(canvas: &mut Canvas, shape: &Shape, areal: bool) {
    match shape {
        Shape::Line(line) => canvas.polyline(line, 2.0, RAIL_RED, None),
        Shape::Area(rings) if areal => {
            canvas.fill_polygon(rings, LIGHT_BLUE, 0.3);
            for ring in rings {
                canvas.polyline(ring, 1.5, DARK_BLUE, None);
            }
        }
        Shape::Area(rings) => {
            for ring in rings {
                canvas.polyline(ring, 2.0, RAIL_RED, None);
            }
        }
    }
}

/// `"{n} Measurement Points"` with grouped thousands.
#[must_use]
pub fn subtitle(n_points: usize) -> String {
    format!("{} Measurement Points", group_thousands(n_points))
}

/// Text of the statistics box, heading first.
#[must_use]
pub fn stats_lines(stats: &ZoneStatistics, half_width: f64) -> Vec<String> {
    vec![
        "Analysis Results:".to_string(),
        format!("Points: {}", group_thousands(stats.n_points)),
        format!("Mean: {:.2} mm/yr", stats.mean_velocity),
        format!("Median: {:.2} mm/yr", stats.median_velocity),
        format!(
            "Stable (\u{b1}{}mm/yr): {:.1}%",
            trim_number(half_width),
            stats.pct_stable
        ),
    ]
}

fn draw_stats_box(canvas: &mut Canvas, lines: &[String]) {
    let x = PLOT_LEFT + 14.0;
    let y = PLOT_TOP + 14.0;
    let width = lines
        .iter()
        .map(|l| font::text_width(l, 2))
        .fold(0.0, f64::max)
        + 24.0;
    #[allow(clippy::cast_precision_loss)]
    let height = 24.0_f64.mul_add(lines.len() as f64, 16.0);

    canvas.fill_rect(x, y, width, height, WHITE, 0.85);
    canvas.stroke_rect(x, y, width, height, 1.0, BOX_EDGE);
    for (i, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let line_y = 24.0_f64.mul_add(i as f64, y + 12.0);
        canvas.text(x + 12.0, line_y, line, 2, i == 0, BLACK);
    }
}

fn draw_north_arrow(canvas: &mut Canvas) {
    let x = PLOT_LEFT + PLOT_WIDTH - 40.0;
    let y = PLOT_TOP + 20.0;
    let arrow = vec![(x, y), (x - 10.0, y + 40.0), (x, y + 30.0), (x + 10.0, y + 40.0)];
    canvas.fill_polygon(&[arrow], BLACK, 1.0);
    canvas.text_centered(x, y + 46.0, "N", 3, true, BLACK);
}

fn draw_color_bar(canvas: &mut Canvas, scale: &VelocityScale) {
    let width = PLOT_WIDTH * 0.8;
    let left = PLOT_LEFT + (PLOT_WIDTH - width) / 2.0;
    let top = PLOT_TOP + PLOT_HEIGHT + 50.0;
    let height = 22.0;

    let mut x = left;
    while x < left + width {
        let t = (x + 0.5 - left) / width;
        canvas.fill_rect(x, top, 1.0, height, evaluate(t).into(), 1.0);
        x += 1.0;
    }
    canvas.stroke_rect(left, top, width, height, 1.0, BLACK);

    let limit = scale.limit();
    for value in [-limit, -limit / 2.0, 0.0, limit / 2.0, limit] {
        let tick = scale.position(value).mul_add(width, left);
        canvas.segment((tick, top + height), (tick, top + height + 6.0), 1.0, BLACK);
        canvas.text_centered(tick, top + height + 10.0, &format!("{value:.1}"), 2, false, BLACK);
    }
    canvas.text_centered(
        f64::from(PAGE_WIDTH) / 2.0,
        top + height + 40.0,
        "Velocity (mm/yr)",
        2,
        false,
        BLACK,
    );
}

/// `1234567` → `1,234,567`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use geo::{LineString, MultiPolygon, Polygon, coord, line_string, point};
    use infra_motion_crs::Crs;
    use infra_motion_models::MeasurementPoint;

    use super::*;
    use crate::canvas::PagePoint;

    fn stats(n: usize) -> ZoneStatistics {
        ZoneStatistics {
            infrastructure: "Railways".to_string(),
            n_points: n,
            mean_velocity: -0.534,
            median_velocity: -0.4,
            std_velocity: None,
            min_velocity: -3.0,
            max_velocity: 5.0,
            range: 8.0,
            pct_subsiding: 50.0,
            pct_stable: 50.0,
            pct_uplifting: 50.0,
            risk_counts: None,
        }
    }

    fn fixtures() -> (BufferZone, InfrastructureLayer, ZonePointSet) {
        let line: LineString<f64> = line_string![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0)];
        let outline = geo::Rect::new(coord! { x: -10.0, y: -10.0 }, coord! { x: 110.0, y: 10.0 })
            .to_polygon();
        let zone = BufferZone {
            infra_type: "Railways".to_string(),
            buffer_m: 10.0,
            crs: Crs::itm(),
            geometry: MultiPolygon(vec![outline]),
            dissolved: true,
            area_m2: 2400.0,
        };
        let layer = InfrastructureLayer {
            class: "Railways".to_string(),
            crs: Crs::itm(),
            features: vec![line.into()],
        };
        let points = ZonePointSet {
            infrastructure: "Railways".to_string(),
            crs: Crs::itm(),
            points: vec![
                MeasurementPoint::new(point!(x: 10.0, y: 5.0), -3.0),
                MeasurementPoint::new(point!(x: 90.0, y: -5.0), 5.0),
            ],
        };
        (zone, layer, points)
    }

    fn viewport_of(zone: &BufferZone) -> Viewport {
        let extent = zone.geometry.bounding_rect().unwrap();
        Viewport::fit(extent, PLOT_LEFT, PLOT_TOP, PLOT_WIDTH, PLOT_HEIGHT)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn pixel(image: &RgbImage, at: PagePoint) -> Rgb<u8> {
        *image.get_pixel(at.0.floor() as u32, at.1.floor() as u32)
    }

    #[test]
    fn draws_points_in_ramp_colors() {
        let (zone, layer, points) = fixtures();
        let stats = stats(2);
        let image = render_map(&MapRequest {
            title: "Railways - Ground Motion Analysis",
            zone: &zone,
            infrastructure: &layer,
            points: &points,
            stats: &stats,
            stability_half_width_mm: 2.0,
        })
        .unwrap();
        assert_eq!(image.dimensions(), (PAGE_WIDTH, PAGE_HEIGHT));

        let vp = viewport_of(&zone);
        // -3 on a +-5 domain is 0.2 along the ramp (#fc8d59), at 80% over white
        let subsiding = pixel(&image, vp.project(coord! { x: 10.0, y: 5.0 }));
        assert_eq!(subsiding, Rgb([253, 164, 122]));
        // +5 is the green end (#1a9850)
        let uplifting = pixel(&image, vp.project(coord! { x: 90.0, y: -5.0 }));
        assert_eq!(uplifting, Rgb([72, 173, 115]));
    }

    #[test]
    fn line_infrastructure_is_red_and_zone_outline_dashed() {
        let (zone, layer, points) = fixtures();
        let stats = stats(2);
        let image = render_map(&MapRequest {
            title: "Railways",
            zone: &zone,
            infrastructure: &layer,
            points: &points,
            stats: &stats,
            stability_half_width_mm: 2.0,
        })
        .unwrap();

        let vp = viewport_of(&zone);
        assert_eq!(pixel(&image, vp.project(coord! { x: 50.0, y: 0.0 })), RAIL_RED);

        // walk the bottom zone edge: some pixels are dash, some are gap
        let (x0, y) = vp.project(coord! { x: -10.0, y: -10.0 });
        let (x1, _) = vp.project(coord! { x: 110.0, y: -10.0 });
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let edge: Vec<Rgb<u8>> = ((x0 as u32 + 2)..(x1 as u32 - 2))
            .map(|x| *image.get_pixel(x, y.floor() as u32))
            .collect();
        assert!(edge.contains(&BLACK));
        assert!(edge.contains(&WHITE));
    }

    #[test]
    fn polygon_infrastructure_is_filled() {
        let (zone, mut layer, points) = fixtures();
        let footprint: Polygon<f64> =
            geo::Rect::new(coord! { x: 0.0, y: -5.0 }, coord! { x: 100.0, y: 5.0 }).to_polygon();
        layer.features = vec![footprint.into()];
        let stats = stats(2);
        let image = render_map(&MapRequest {
            title: "Harbour & Port",
            zone: &zone,
            infrastructure: &layer,
            points: &points,
            stats: &stats,
            stability_half_width_mm: 1.5,
        })
        .unwrap();

        let vp = viewport_of(&zone);
        let inside = pixel(&image, vp.project(coord! { x: 50.0, y: 2.0 }));
        assert_ne!(inside, WHITE);
        assert!(inside.0[2] > inside.0[0], "{inside:?}");
        let edge = pixel(&image, vp.project(coord! { x: 50.0, y: 5.0 }));
        assert_eq!(edge, DARK_BLUE);
    }

    #[test]
    fn png_bytes_carry_the_signature() {
        let (zone, layer, points) = fixtures();
        let stats = stats(2);
        let image = render_map(&MapRequest {
            title: "Railways",
            zone: &zone,
            infrastructure: &layer,
            points: &points,
            stats: &stats,
            stability_half_width_mm: 2.0,
        })
        .unwrap();
        let bytes = encode_png(&image).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));
    }

    #[test]
    fn empty_zone_is_rejected() {
        let (zone, layer, mut points) = fixtures();
        points.points.clear();
        let stats = stats(0);
        let err = render_map(&MapRequest {
            title: "Railways",
            zone: &zone,
            infrastructure: &layer,
            points: &points,
            stats: &stats,
            stability_half_width_mm: 2.0,
        })
        .unwrap_err();
        assert!(matches!(err, RenderError::EmptyZone { .. }));
    }

    #[test]
    fn labels() {
        assert_eq!(subtitle(3964), "3,964 Measurement Points");
        let lines = stats_lines(&stats(2), 1.5);
        assert_eq!(lines[0], "Analysis Results:");
        assert_eq!(lines[2], "Mean: -0.53 mm/yr");
        assert_eq!(lines[4], "Stable (\u{b1}1.5mm/yr): 50.0%");
        assert_eq!(stats_lines(&stats(2), 2.0)[4], "Stable (\u{b1}2mm/yr): 50.0%");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(719), "719");
        assert_eq!(group_thousands(3964), "3,964");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
