//! Core geometry types for hollow.
//!
//! Everything here is a pure function of coordinates: bounding boxes and
//! dimensions are recomputed from vertices every time, never cached and
//! patched up afterwards.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! `#[derive(...)]` generates the boilerplate:
//! - `Debug` = printable with `{:?}`
//! - `Clone`/`Copy` = small stack values that copy implicitly
//! - `PartialEq` = comparable with `==`
//! - `Serialize` = can be written out by serde (used by the analysis report)

use serde::Serialize;

/// Two points closer than this on both axes are treated as the same vertex.
pub const POINT_EPSILON: f64 = 1e-9;

/// A 2D point in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// The same point shifted by (dx, dy).
    #[inline]
    pub fn translate(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// True when both coordinates agree within [`POINT_EPSILON`].
    #[inline]
    pub fn coincides(&self, other: Point) -> bool {
        (self.x - other.x).abs() <= POINT_EPSILON && (self.y - other.y).abs() <= POINT_EPSILON
    }
}

/// Axis-aligned bounding box.
///
/// Always derived from a shape's geometry; there is no setter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Box spanning two corners given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;

        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };

        Some(iter.fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn dimension(&self) -> Dimension {
        Dimension {
            width: self.width(),
            height: self.height(),
        }
    }

    /// True when `other` lies entirely inside this box (edges included).
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }
}

/// Width and height of a shape's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    /// Dimension of a degenerate shape.
    pub const ZERO: Dimension = Dimension { width: 0.0, height: 0.0 };

    /// The smaller of the two sides.
    #[inline]
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// The document viewport (`viewBox`).
///
/// This is the source of truth for every boundary-touch test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    /// Fallback viewport for documents without a usable `viewBox`.
    pub const DEFAULT: Canvas = Canvas { x: 0.0, y: 0.0, width: 100.0, height: 100.0 };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(self.x, self.y, self.max_x(), self.max_y())
    }

    /// Corners in drawing order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.max_x(), self.y),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.x, self.max_y()),
        ]
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas::DEFAULT
    }
}

/// Thin along either axis.
///
/// Disjunctive: a 10 x 0.3 sliver is thin even though one side is
/// large. See [`crate::policy::ThinnessRule`] for the configurable form.
#[inline]
pub fn is_thin(dimension: Dimension, min_dimension: f64) -> bool {
    dimension.width < min_dimension || dimension.height < min_dimension
}

/// True if any edge of `bbox` lies within `margin` of the matching canvas edge.
pub fn touches_boundary(bbox: &BoundingBox, canvas: &Canvas, margin: f64) -> bool {
    bbox.min_x <= canvas.x + margin
        || bbox.min_y <= canvas.y + margin
        || bbox.max_x >= canvas.max_x() - margin
        || bbox.max_y >= canvas.max_y() - margin
}

/// Detect the fixed-width connector artifact: a closed quad with one edge of
/// a known length.
///
/// Only closed 4-vertex outlines qualify. A trailing vertex that repeats the
/// first (what an explicit close produces) is ignored.
pub fn is_thin_quad(points: &[Point], target_edge_length: f64, tolerance: f64) -> bool {
    let quad = match points {
        [a, b, c, d] => [*a, *b, *c, *d],
        [a, b, c, d, e] if e.coincides(*a) => [*a, *b, *c, *d],
        _ => return false,
    };

    (0..4).any(|i| {
        let edge = quad[i].distance(quad[(i + 1) % 4]);
        (edge - target_edge_length).abs() < tolerance
    })
}

/// Signed area by the shoelace formula (positive for counter-clockwise).
pub fn signed_area_of_points(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

// ============================================================================
// TESTS
// ============================================================================
