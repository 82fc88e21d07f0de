//! The typed shape every stage works on.
//!
//! The reader turns each drawable element into one [`Shape`]; nothing
//! downstream looks at XML again. Derived values (bounding box, dimension,
//! thin/boundary flags) are computed on demand by [`Shape::annotate`] and
//! returned as a fresh [`Annotations`] value, never stored on the shape.

use serde::Serialize;

use crate::diagnostics::DiagnosticKind;
use crate::geometry::{touches_boundary, BoundingBox, Canvas, Dimension, Point};
use crate::path::{parse_path_data, PathData};
use crate::policy::ClassificationPolicy;

/// Element kinds the reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Path,
    Circle,
    Rect,
    Polygon,
    Polyline,
    Line,
    Ellipse,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Path,
        ShapeKind::Circle,
        ShapeKind::Rect,
        ShapeKind::Polygon,
        ShapeKind::Polyline,
        ShapeKind::Line,
        ShapeKind::Ellipse,
    ];

    /// SVG element name.
    pub fn tag(self) -> &'static str {
        match self {
            ShapeKind::Path => "path",
            ShapeKind::Circle => "circle",
            ShapeKind::Rect => "rect",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Line => "line",
            ShapeKind::Ellipse => "ellipse",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ShapeKind> {
        ShapeKind::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// Raw geometry: a vertex list or primitive parameters.
///
/// ## Rust Lesson #11: Enums with Data
///
/// Each variant carries exactly the fields that kind of shape needs, so a
/// circle can never be asked for its `points` by mistake. `match` forces
/// every kind to be handled wherever geometry is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Keeps the `d` string verbatim next to its parsed form.
    Path { data: String, parsed: PathData },
    Circle { cx: f64, cy: f64, r: f64 },
    Rect { x: f64, y: f64, width: f64, height: f64 },
    Polygon { points: Vec<Point> },
    Polyline { points: Vec<Point> },
    Line { from: Point, to: Point },
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: Option<String>,
    pub geometry: Geometry,
    /// Presentation attributes (class, style, stroke, ...) in source order.
    /// Geometry attributes are not stored here.
    pub attributes: Vec<(String, String)>,
}

/// Derived values for one shape under a canvas and policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Annotations {
    pub bbox: Option<BoundingBox>,
    pub dimension: Dimension,
    pub closed: bool,
    pub degenerate: bool,
    pub is_thin: bool,
    pub touches_boundary: bool,
}

impl Shape {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry,
            attributes: Vec::new(),
        }
    }

    /// Path shape from a `d` string.
    pub fn path(d: &str) -> Self {
        Self::new(Geometry::Path {
            data: d.to_string(),
            parsed: parse_path_data(d),
        })
    }

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Geometry::Rect { x, y, width, height })
    }

    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self::new(Geometry::Circle { cx, cy, r })
    }

    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self::new(Geometry::Ellipse { cx, cy, rx, ry })
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        Self::new(Geometry::Polygon { points })
    }

    pub fn polyline(points: Vec<Point>) -> Self {
        Self::new(Geometry::Polyline { points })
    }

    pub fn line(from: Point, to: Point) -> Self {
        Self::new(Geometry::Line { from, to })
    }

    /// Rectangle covering the whole canvas.
    pub fn canvas_rect(canvas: &Canvas) -> Self {
        Self::rect(canvas.x, canvas.y, canvas.width, canvas.height)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Look up a presentation attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn kind(&self) -> ShapeKind {
        match &self.geometry {
            Geometry::Path { .. } => ShapeKind::Path,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Rect { .. } => ShapeKind::Rect,
            Geometry::Polygon { .. } => ShapeKind::Polygon,
            Geometry::Polyline { .. } => ShapeKind::Polyline,
            Geometry::Line { .. } => ShapeKind::Line,
            Geometry::Ellipse { .. } => ShapeKind::Ellipse,
        }
    }

    /// No usable geometry: fewer than two coordinate pairs, or negative
    /// primitive sizes.
    pub fn is_degenerate(&self) -> bool {
        match &self.geometry {
            Geometry::Path { parsed, .. } => parsed.is_degenerate(),
            Geometry::Polygon { points } | Geometry::Polyline { points } => points.len() < 2,
            Geometry::Circle { cx, cy, r } => !(cx.is_finite() && cy.is_finite()) || !(*r >= 0.0),
            Geometry::Rect { x, y, width, height } => {
                !(x.is_finite() && y.is_finite()) || !(*width >= 0.0) || !(*height >= 0.0)
            }
            Geometry::Ellipse { cx, cy, rx, ry } => {
                !(cx.is_finite() && cy.is_finite()) || !(*rx >= 0.0) || !(*ry >= 0.0)
            }
            Geometry::Line { .. } => false,
        }
    }

    /// Bounding box, or `None` for a degenerate shape.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.is_degenerate() {
            return None;
        }
        match &self.geometry {
            Geometry::Path { parsed, .. } => parsed.bounding_box(),
            Geometry::Polygon { points } | Geometry::Polyline { points } => {
                BoundingBox::from_points(points.iter().copied())
            }
            Geometry::Circle { cx, cy, r } => {
                Some(BoundingBox::from_corners(cx - r, cy - r, cx + r, cy + r))
            }
            Geometry::Rect { x, y, width, height } => {
                Some(BoundingBox::from_corners(*x, *y, x + width, y + height))
            }
            Geometry::Ellipse { cx, cy, rx, ry } => {
                Some(BoundingBox::from_corners(cx - rx, cy - ry, cx + rx, cy + ry))
            }
            Geometry::Line { from, to } => Some(BoundingBox::from_corners(from.x, from.y, to.x, to.y)),
        }
    }

    /// Bounding-box width and height; zero for degenerate shapes.
    pub fn dimension(&self) -> Dimension {
        self.bounding_box()
            .map(|b| b.dimension())
            .unwrap_or(Dimension::ZERO)
    }

    /// Whether the outline encloses an area.
    ///
    /// Polygons and primitives are closed by definition. A polyline is closed
    /// only if it ends where it starts. A path looks at its primary sub-path.
    pub fn is_closed(&self) -> bool {
        match &self.geometry {
            Geometry::Polygon { .. }
            | Geometry::Rect { .. }
            | Geometry::Circle { .. }
            | Geometry::Ellipse { .. } => true,
            Geometry::Line { .. } => false,
            Geometry::Polyline { points } => match (points.first(), points.last()) {
                (Some(a), Some(b)) if points.len() > 2 => a.coincides(*b),
                _ => false,
            },
            Geometry::Path { parsed, .. } => match parsed.primary() {
                Some(sub) if sub.points.len() > 2 => {
                    sub.closed || sub.points[0].coincides(sub.points[sub.points.len() - 1])
                }
                _ => false,
            },
        }
    }

    /// Vertex outline used by the connector test: the primary sub-path of
    /// a path, or the corner list of a polygon/polyline/rect.
    pub fn primary_outline(&self) -> Option<Vec<Point>> {
        match &self.geometry {
            Geometry::Path { parsed, .. } => parsed.primary().map(|s| s.points.clone()),
            Geometry::Polygon { points } | Geometry::Polyline { points } => Some(points.clone()),
            Geometry::Rect { x, y, width, height } => Some(vec![
                Point::new(*x, *y),
                Point::new(x + width, *y),
                Point::new(x + width, y + height),
                Point::new(*x, y + height),
            ]),
            _ => None,
        }
    }

    /// Same shape shifted by (dx, dy); id and attributes carry over.
    pub fn translate(&self, dx: f64, dy: f64) -> Shape {
        let geometry = match &self.geometry {
            Geometry::Path { data, parsed } => {
                if dx == 0.0 && dy == 0.0 {
                    Geometry::Path {
                        data: data.clone(),
                        parsed: parsed.clone(),
                    }
                } else {
                    let moved = parsed.translate(dx, dy);
                    Geometry::Path {
                        data: moved.to_path_string(),
                        parsed: moved,
                    }
                }
            }
            Geometry::Circle { cx, cy, r } => Geometry::Circle { cx: cx + dx, cy: cy + dy, r: *r },
            Geometry::Rect { x, y, width, height } => Geometry::Rect {
                x: x + dx,
                y: y + dy,
                width: *width,
                height: *height,
            },
            Geometry::Polygon { points } => Geometry::Polygon {
                points: points.iter().map(|p| p.translate(dx, dy)).collect(),
            },
            Geometry::Polyline { points } => Geometry::Polyline {
                points: points.iter().map(|p| p.translate(dx, dy)).collect(),
            },
            Geometry::Line { from, to } => Geometry::Line {
                from: from.translate(dx, dy),
                to: to.translate(dx, dy),
            },
            Geometry::Ellipse { cx, cy, rx, ry } => Geometry::Ellipse {
                cx: cx + dx,
                cy: cy + dy,
                rx: *rx,
                ry: *ry,
            },
        };
        Shape {
            id: self.id.clone(),
            geometry,
            attributes: self.attributes.clone(),
        }
    }

    /// Problems found while building this shape.
    pub fn issues(&self) -> Vec<DiagnosticKind> {
        let mut issues = match &self.geometry {
            Geometry::Path { parsed, .. } => parsed.issues.clone(),
            _ => Vec::new(),
        };
        if self.is_degenerate() {
            issues.push(DiagnosticKind::DegenerateShape);
        }
        issues
    }

    /// Compute every derived value under `canvas` and `policy`.
    ///
    /// Degenerate shapes get a zero dimension (so they read as thin) and
    /// never touch the boundary, since they have no box to test.
    pub fn annotate(&self, canvas: &Canvas, policy: &ClassificationPolicy) -> Annotations {
        let bbox = self.bounding_box();
        let dimension = bbox.map(|b| b.dimension()).unwrap_or(Dimension::ZERO);
        Annotations {
            bbox,
            dimension,
            closed: self.is_closed(),
            degenerate: bbox.is_none(),
            is_thin: policy.is_thin(dimension),
            touches_boundary: bbox
                .map(|b| touches_boundary(&b, canvas, policy.boundary_margin))
                .unwrap_or(false),
        }
    }
}
