//! Scanline region algebra.
//!
//! A [`Region`] is a set of pixels stored as sorted, disjoint spans per row.
//! Shapes are sampled at pixel centres under their fill rule, so a region
//! matches what a non-antialiased renderer would cover. Union, intersection
//! and difference are exact on spans; no polygon clipping is involved.
//!
//! ## Rust Lesson #15: Slices and Iterators
//!
//! Every row is a `Vec<Span>`, and every operation is a merge over two
//! sorted slices. Nothing allocates per pixel, so a 4k x 4k region with a
//! few thousand shapes stays cheap.

use std::collections::HashMap;

use log::warn;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Outcome};
use crate::document::{Document, Element, FillLevel, FillRule, Mask, MaskLayer};
use crate::geometry::{Canvas, Point};
use crate::shape::{Geometry, Shape};

/// Segments used to approximate a circle or ellipse outline for strokes.
const ELLIPSE_SEGMENTS: usize = 64;

/// Maps document coordinates onto a pixel grid.
///
/// Scale and translate only. Each axis has its own scale, so a viewport
/// whose aspect differs from the grid stretches rather than letterboxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelGrid {
    pub width: u32,
    pub height: u32,
    origin: Point,
    scale_x: f64,
    scale_y: f64,
}

impl PixelGrid {
    pub fn new(canvas: &Canvas, width: u32, height: u32) -> Self {
        let scale = |pixels: u32, extent: f64| {
            if extent > 0.0 { pixels as f64 / extent } else { 1.0 }
        };
        Self {
            width,
            height,
            origin: Point::new(canvas.x, canvas.y),
            scale_x: scale(width, canvas.width),
            scale_y: scale(height, canvas.height),
        }
    }

    #[inline]
    pub fn to_pixel(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.origin.x) * self.scale_x,
            (p.y - self.origin.y) * self.scale_y,
        )
    }

    /// A document-space length in pixels (mean of the two axis scales).
    pub fn length_to_pixels(&self, length: f64) -> f64 {
        length * (self.scale_x + self.scale_y) / 2.0
    }
}

/// Half-open pixel range `[start, end)` within one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A set of pixels on a fixed-size grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    width: u32,
    height: u32,
    rows: Vec<Vec<Span>>,
}

impl Region {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rows: vec![Vec::new(); height as usize],
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        let row = if width > 0 { vec![Span { start: 0, end: width }] } else { Vec::new() };
        Self {
            width,
            height,
            rows: vec![row; height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn row(&self, y: u32) -> &[Span] {
        self.rows.get(y as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of covered pixels.
    pub fn area(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.iter())
            .map(|s| s.len() as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.row(y).iter().any(|s| s.start <= x && x < s.end)
    }

    pub fn union(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a || b)
    }

    pub fn intersect(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a && b)
    }

    pub fn difference(&self, other: &Region) -> Region {
        self.combine(other, |a, b| a && !b)
    }

    /// Row-by-row boundary sweep over both span lists.
    fn combine(&self, other: &Region, op: impl Fn(bool, bool) -> bool) -> Region {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        let rows = self
            .rows
            .iter()
            .zip(&other.rows)
            .map(|(a, b)| combine_row(a, b, &op))
            .collect();
        Region {
            width: self.width,
            height: self.height,
            rows,
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Fill closed rings (document coordinates) under `rule`.
    ///
    /// Every ring is closed implicitly, as a renderer does when filling.
    pub fn from_rings(grid: &PixelGrid, rings: &[Vec<Point>], rule: FillRule) -> Region {
        let mut crossings: Vec<Vec<(f64, i32)>> = vec![Vec::new(); grid.height as usize];

        for ring in rings {
            if ring.len() < 2 {
                continue;
            }
            let pixels: Vec<Point> = ring.iter().map(|p| grid.to_pixel(*p)).collect();
            for i in 0..pixels.len() {
                let p0 = pixels[i];
                let p1 = pixels[(i + 1) % pixels.len()];
                add_edge(&mut crossings, p0, p1);
            }
        }

        let rows = crossings
            .into_iter()
            .map(|mut row| {
                row.sort_by(|a, b| a.0.total_cmp(&b.0));
                sweep_row(&row, rule, grid.width)
            })
            .collect();

        Region {
            width: grid.width,
            height: grid.height,
            rows,
        }
    }

    /// Axis-aligned ellipse (document coordinates).
    pub fn from_ellipse(grid: &PixelGrid, center: Point, rx: f64, ry: f64) -> Region {
        let mut region = Region::empty(grid.width, grid.height);
        let c = grid.to_pixel(center);
        let rx = rx * grid.scale_x;
        let ry = ry * grid.scale_y;
        if !(rx > 0.0 && ry > 0.0) {
            return region;
        }

        let (first, last) = row_range(c.y - ry, c.y + ry, grid.height);
        for y in first..last {
            let dy = (y as f64 + 0.5 - c.y) / ry;
            if dy.abs() >= 1.0 {
                continue;
            }
            let half = rx * (1.0 - dy * dy).sqrt();
            if let Some(span) = pixel_span(c.x - half, c.x + half, grid.width) {
                region.rows[y as usize].push(span);
            }
        }
        region
    }

    /// Stroke polylines (document coordinates) `width_px` pixels wide.
    ///
    /// Each segment becomes a quad with square ends, all wound the same
    /// way, so filling them together under nonzero gives their union.
    pub fn stroke(grid: &PixelGrid, lines: &[Vec<Point>], closed: bool, width_px: f64) -> Region {
        let hw = width_px / 2.0;
        let mut quads: Vec<Vec<Point>> = Vec::new();

        for line in lines {
            let pixels: Vec<Point> = line.iter().map(|p| grid.to_pixel(*p)).collect();
            let mut segments: Vec<(Point, Point)> = pixels.windows(2).map(|w| (w[0], w[1])).collect();
            if closed && pixels.len() > 2 {
                segments.push((pixels[pixels.len() - 1], pixels[0]));
            }
            if pixels.len() == 1 {
                segments.push((pixels[0], pixels[0]));
            }
            for (p0, p1) in segments {
                quads.push(segment_quad(p0, p1, hw));
            }
        }

        // Quads are already in pixel space.
        let identity = PixelGrid {
            width: grid.width,
            height: grid.height,
            origin: Point::new(0.0, 0.0),
            scale_x: 1.0,
            scale_y: 1.0,
        };
        Region::from_rings(&identity, &quads, FillRule::NonZero)
    }

    /// Region of one shape.
    ///
    /// Lines and polylines are stroked `line_width_px` wide; everything else
    /// is filled under `rule`.
    pub fn from_shape(grid: &PixelGrid, shape: &Shape, rule: FillRule, line_width_px: f64) -> Region {
        if shape.is_degenerate() {
            return Region::empty(grid.width, grid.height);
        }
        match &shape.geometry {
            Geometry::Circle { cx, cy, r } => Region::from_ellipse(grid, Point::new(*cx, *cy), *r, *r),
            Geometry::Ellipse { cx, cy, rx, ry } => {
                Region::from_ellipse(grid, Point::new(*cx, *cy), *rx, *ry)
            }
            Geometry::Line { from, to } => Region::stroke(grid, &[vec![*from, *to]], false, line_width_px),
            Geometry::Polyline { points } => Region::stroke(grid, &[points.clone()], false, line_width_px),
            _ => Region::from_rings(grid, &outline(shape), rule),
        }
    }
}

// ============================================================================
// Scanline helpers
// ============================================================================

/// Rows whose centres fall in `[y0, y1)`.
fn row_range(y0: f64, y1: f64, height: u32) -> (u32, u32) {
    let clamp = |v: f64| v.max(0.0).min(height as f64) as u32;
    (clamp((y0 - 0.5).ceil()), clamp((y1 - 0.5).ceil()))
}

/// Pixels whose centres fall in `[x0, x1)`.
fn pixel_span(x0: f64, x1: f64, width: u32) -> Option<Span> {
    let clamp = |v: f64| v.max(0.0).min(width as f64) as u32;
    let span = Span {
        start: clamp((x0 - 0.5).ceil()),
        end: clamp((x1 - 0.5).ceil()),
    };
    if span.is_empty() { None } else { Some(span) }
}

/// Record where an edge crosses each row centre, with its winding direction.
fn add_edge(crossings: &mut [Vec<(f64, i32)>], p0: Point, p1: Point) {
    if p0.y == p1.y || !(p0.y.is_finite() && p1.y.is_finite()) {
        return;
    }
    let (dir, top, bottom) = if p0.y < p1.y { (1, p0, p1) } else { (-1, p1, p0) };
    let (first, last) = row_range(top.y, bottom.y, crossings.len() as u32);
    let slope = (bottom.x - top.x) / (bottom.y - top.y);
    for y in first..last {
        let yc = y as f64 + 0.5;
        crossings[y as usize].push((top.x + (yc - top.y) * slope, dir));
    }
}

/// Turn sorted crossings into covered spans.
fn sweep_row(crossings: &[(f64, i32)], rule: FillRule, width: u32) -> Vec<Span> {
    let inside = |w: i32| match rule {
        FillRule::NonZero => w != 0,
        FillRule::EvenOdd => w.rem_euclid(2) == 1,
    };

    let mut spans = Vec::new();
    let mut winding = 0;
    let mut start = 0.0;
    for &(x, dir) in crossings {
        let was = inside(winding);
        winding += dir;
        let now = inside(winding);
        if !was && now {
            start = x;
        } else if was && !now {
            if let Some(span) = pixel_span(start, x, width) {
                spans.push(span);
            }
        }
    }
    normalize(spans)
}

/// Sort and merge overlapping or touching spans.
fn normalize(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by_key(|s| s.start);
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match out.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => out.push(span),
        }
    }
    out
}

fn combine_row(a: &[Span], b: &[Span], op: &impl Fn(bool, bool) -> bool) -> Vec<Span> {
    // (x, which, entering)
    let mut events: Vec<(u32, bool, bool)> = Vec::with_capacity(2 * (a.len() + b.len()));
    for s in a {
        events.push((s.start, true, true));
        events.push((s.end, true, false));
    }
    for s in b {
        events.push((s.start, false, true));
        events.push((s.end, false, false));
    }
    events.sort_by_key(|e| e.0);

    let mut out = Vec::new();
    let (mut in_a, mut in_b) = (false, false);
    let mut open: Option<u32> = None;
    let mut i = 0;
    while i < events.len() {
        let x = events[i].0;
        while i < events.len() && events[i].0 == x {
            let (_, is_a, entering) = events[i];
            if is_a {
                in_a = entering;
            } else {
                in_b = entering;
            }
            i += 1;
        }
        match (open, op(in_a, in_b)) {
            (None, true) => open = Some(x),
            (Some(start), false) => {
                out.push(Span { start, end: x });
                open = None;
            }
            _ => {}
        }
    }
    normalize(out)
}

fn segment_quad(p0: Point, p1: Point, hw: f64) -> Vec<Point> {
    let len = p0.distance(p1);
    let (dx, dy) = if len > 0.0 {
        ((p1.x - p0.x) / len * hw, (p1.y - p0.y) / len * hw)
    } else {
        (hw, 0.0)
    };
    let (nx, ny) = (-dy, dx);
    vec![
        Point::new(p0.x - dx + nx, p0.y - dy + ny),
        Point::new(p1.x + dx + nx, p1.y + dy + ny),
        Point::new(p1.x + dx - nx, p1.y + dy - ny),
        Point::new(p0.x - dx - nx, p0.y - dy - ny),
    ]
}

/// Outline rings of a shape in document coordinates.
///
/// Curved primitives are sampled as polygons. Used for filling paths and
/// polygons and for stroking mask layers.
pub fn outline(shape: &Shape) -> Vec<Vec<Point>> {
    match &shape.geometry {
        Geometry::Path { parsed, .. } => parsed
            .subpaths
            .iter()
            .map(|s| s.points.clone())
            .filter(|p| !p.is_empty())
            .collect(),
        Geometry::Polygon { points } | Geometry::Polyline { points } => vec![points.clone()],
        Geometry::Rect { .. } => shape.primary_outline().into_iter().collect(),
        Geometry::Line { from, to } => vec![vec![*from, *to]],
        Geometry::Circle { cx, cy, r } => vec![sample_ellipse(*cx, *cy, *r, *r)],
        Geometry::Ellipse { cx, cy, rx, ry } => vec![sample_ellipse(*cx, *cy, *rx, *ry)],
    }
}

fn sample_ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Point> {
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
            Point::new(cx + rx * t.cos(), cy + ry * t.sin())
        })
        .collect()
}

// ============================================================================
// Document evaluation
// ============================================================================

/// Region a mask layer paints: its fill, plus its outline if stroked.
pub fn layer_region(grid: &PixelGrid, layer: &MaskLayer) -> Region {
    let fill = match layer.shape.geometry {
        // Mask layers are filled like any SVG shape, lines included.
        Geometry::Polyline { ref points } => Region::from_rings(grid, &[points.clone()], layer.fill_rule),
        _ => Region::from_shape(grid, &layer.shape, layer.fill_rule, 0.0),
    };
    match layer.stroke {
        Some(width) if width > 0.0 && !layer.shape.is_degenerate() => {
            let closed = layer.shape.is_closed();
            let stroke = Region::stroke(grid, &outline(&layer.shape), closed, grid.length_to_pixels(width));
            fill.union(&stroke)
        }
        _ => fill,
    }
}

/// Visible region of a mask: layers painted in order, included layers
/// adding and excluded layers removing.
pub fn mask_region(grid: &PixelGrid, mask: &Mask) -> Region {
    mask.layers
        .iter()
        .fold(Region::empty(grid.width, grid.height), |acc, layer| {
            let painted = layer_region(grid, layer);
            match layer.level {
                FillLevel::Included => acc.union(&painted),
                FillLevel::Excluded => acc.difference(&painted),
            }
        })
}

/// Every pixel a document shows.
///
/// Each element covers its own region cut down by every mask it sits
/// under. A reference to a missing mask is reported and ignored.
pub fn document_region(doc: &Document, grid: &PixelGrid, line_width_px: f64) -> Outcome<Region> {
    let mut cache: HashMap<&str, Region> = HashMap::new();
    let mut diagnostics = Vec::new();
    let mut total = Region::empty(grid.width, grid.height);

    for (index, element) in doc.elements.iter().enumerate() {
        let visible = element_region(doc, grid, element, line_width_px, &mut cache, |id| {
            warn!("element {} references missing mask #{}", index, id);
            diagnostics.push(Diagnostic::shape(
                index,
                element.shape.id.clone(),
                DiagnosticKind::MissingMaskReference { id: id.to_string() },
            ));
        });
        total = total.union(&visible);
    }

    Outcome::new(total, diagnostics)
}

fn element_region<'d>(
    doc: &'d Document,
    grid: &PixelGrid,
    element: &'d Element,
    line_width_px: f64,
    cache: &mut HashMap<&'d str, Region>,
    mut on_missing: impl FnMut(&str),
) -> Region {
    let mut region = Region::from_shape(grid, &element.shape, element.fill_rule, line_width_px);
    for id in &element.masks {
        if region.is_empty() {
            break;
        }
        let Some(mask) = doc.mask(id) else {
            on_missing(id.as_str());
            continue;
        };
        let mask_area = cache
            .entry(mask.id.as_str())
            .or_insert_with(|| mask_region(grid, mask));
        region = region.intersect(mask_area);
    }
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(size: u32) -> PixelGrid {
        PixelGrid::new(&Canvas::new(0.0, 0.0, size as f64, size as f64), size, size)
    }

    fn square(x: f64, y: f64, s: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + s, y),
            Point::new(x + s, y + s),
            Point::new(x, y + s),
        ]
    }

    #[test]
    fn square_covers_exact_pixels() {
        let r = Region::from_rings(&grid(10), &[square(2.0, 3.0, 4.0)], FillRule::NonZero);
        assert_eq!(r.area(), 16);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 6));
        assert!(!r.contains(6, 6));
        assert!(!r.contains(1, 3));
    }

    #[test]
    fn fill_rules_differ_on_nested_rings() {
        // Outer and inner rings wound the same way.
        let rings = vec![square(0.0, 0.0, 10.0), square(3.0, 3.0, 4.0)];
        let g = grid(10);
        assert_eq!(Region::from_rings(&g, &rings, FillRule::NonZero).area(), 100);
        assert_eq!(Region::from_rings(&g, &rings, FillRule::EvenOdd).area(), 84);
    }

    #[test]
    fn boolean_operations() {
        let g = grid(10);
        let a = Region::from_rings(&g, &[square(0.0, 0.0, 6.0)], FillRule::NonZero);
        let b = Region::from_rings(&g, &[square(4.0, 4.0, 6.0)], FillRule::NonZero);
        assert_eq!(a.intersect(&b).area(), 4);
        assert_eq!(a.union(&b).area(), 68);
        assert_eq!(a.difference(&b).area(), 32);
        assert!(a.difference(&a).is_empty());
    }

    #[test]
    fn circle_area_is_close_to_pi_r_squared() {
        let r = Region::from_ellipse(&grid(100), Point::new(50.0, 50.0), 20.0, 20.0);
        let expected = std::f64::consts::PI * 400.0;
        assert!((r.area() as f64 - expected).abs() < expected * 0.02);
    }

    #[test]
    fn stroke_has_width() {
        let g = grid(20);
        let r = Region::stroke(&g, &[vec![Point::new(2.0, 10.0), Point::new(18.0, 10.0)]], false, 2.0);
        // 16 long plus square caps of 1 on each end, 2 rows tall.
        assert_eq!(r.area(), 36);
        assert!(r.contains(10, 9));
        assert!(r.contains(10, 10));
        assert!(!r.contains(10, 11));
    }

    #[test]
    fn scale_maps_viewport_to_grid() {
        let g = PixelGrid::new(&Canvas::new(10.0, 10.0, 5.0, 5.0), 50, 100);
        assert_eq!(g.to_pixel(Point::new(12.5, 12.5)), Point::new(25.0, 50.0));
        let r = Region::from_shape(&g, &Shape::rect(10.0, 10.0, 5.0, 5.0), FillRule::NonZero, 1.0);
        assert_eq!(r.area(), 5000);
    }

    #[test]
    fn mask_layers_paint_in_order() {
        let canvas = Canvas::new(0.0, 0.0, 10.0, 10.0);
        let g = PixelGrid::new(&canvas, 10, 10);
        let mut mask = Mask::new("m");
        mask.layers.push(MaskLayer::new(Shape::canvas_rect(&canvas), FillLevel::Included));
        mask.layers.push(MaskLayer::new(Shape::rect(0.0, 0.0, 5.0, 10.0), FillLevel::Excluded));
        mask.layers.push(MaskLayer::new(Shape::rect(0.0, 0.0, 2.0, 2.0), FillLevel::Included));
        assert_eq!(mask_region(&g, &mask).area(), 54);
    }

    #[test]
    fn missing_mask_is_reported_and_ignored() {
        let canvas = Canvas::new(0.0, 0.0, 10.0, 10.0);
        let mut doc = Document::new(canvas);
        doc.elements.push(Element::new(Shape::canvas_rect(&canvas)).with_mask("gone"));
        let out = document_region(&doc, &PixelGrid::new(&canvas, 10, 10), 1.0);
        assert_eq!(out.value.area(), 100);
        assert!(out.has(|k| *k == DiagnosticKind::MissingMaskReference { id: "gone".into() }));
    }

    fn arb_region() -> impl Strategy<Value = Region> {
        prop::collection::vec((0f64..16.0, 0f64..16.0, 0f64..8.0, 0f64..8.0), 0..5).prop_map(|boxes| {
            let rings: Vec<Vec<Point>> = boxes
                .into_iter()
                .map(|(x, y, w, h)| {
                    vec![
                        Point::new(x, y),
                        Point::new(x + w, y),
                        Point::new(x + w, y + h),
                        Point::new(x, y + h),
                    ]
                })
                .collect();
            Region::from_rings(&grid(16), &rings, FillRule::EvenOdd)
        })
    }

    proptest! {
        #[test]
        fn inclusion_exclusion(a in arb_region(), b in arb_region()) {
            prop_assert_eq!(a.union(&b).area() + a.intersect(&b).area(), a.area() + b.area());
            prop_assert_eq!(a.difference(&b).area(), a.area() - a.intersect(&b).area());
            prop_assert!(a.difference(&b).intersect(&b).is_empty());
        }
    }
}
