//! Shape classification: valid/invalid, then outer/inner.
//!
//! Classification reads one shape at a time plus the canvas and policy.
//! No adjacency between shapes is built; enclosure is approximated by the
//! boundary test on bounding boxes.

use log::debug;

use crate::geometry::{is_thin_quad, Canvas};
use crate::policy::ClassificationPolicy;
use crate::shape::{Annotations, Geometry, Shape};

/// Height of a `<rect>` connector. The exporter rounds rect attributes to
/// three decimals, so this differs from the path edge length.
pub const CONNECTOR_RECT_HEIGHT: f64 = 0.406;

/// A rect this close to [`CONNECTOR_RECT_HEIGHT`] is a connector.
pub const CONNECTOR_RECT_TOLERANCE: f64 = 1e-3;

/// Index sets over a shape list.
///
/// `valid` and `invalid` cover every index once. `outer` and `inner` split
/// `valid` with no overlap. `connectors` is independent of validity: a
/// connector wide enough to pass the thinness test is still valid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Classification {
    /// One entry per input shape, same order.
    pub annotations: Vec<Annotations>,
    pub valid: Vec<usize>,
    pub invalid: Vec<usize>,
    /// Valid shapes touching the canvas boundary.
    pub outer: Vec<usize>,
    /// Valid shapes clear of the canvas boundary.
    pub inner: Vec<usize>,
    /// Non-degenerate thin shapes, for stages that target them.
    pub thin: Vec<usize>,
    /// Fixed-width connector artifacts.
    pub connectors: Vec<usize>,
}

impl Classification {
    pub fn is_outer(&self, index: usize) -> bool {
        self.outer.binary_search(&index).is_ok()
    }

    pub fn is_thin(&self, index: usize) -> bool {
        self.thin.binary_search(&index).is_ok()
    }
}

/// Closed, has geometry, and not thin.
pub fn is_valid(annotations: &Annotations) -> bool {
    annotations.closed && !annotations.degenerate && !annotations.is_thin
}

/// The fixed-width connector artifact left by the board exporter.
///
/// Paths and polygons qualify when their outline is a closed quad with one
/// edge of the configured length; rects when their height is
/// [`CONNECTOR_RECT_HEIGHT`].
pub fn is_connector(shape: &Shape, policy: &ClassificationPolicy) -> bool {
    match &shape.geometry {
        Geometry::Rect { height, .. } => {
            (height - CONNECTOR_RECT_HEIGHT).abs() < CONNECTOR_RECT_TOLERANCE
        }
        Geometry::Path { .. } | Geometry::Polygon { .. } => shape
            .primary_outline()
            .map(|outline| {
                is_thin_quad(
                    &outline,
                    policy.thin_rectangle_edge_length,
                    policy.thin_rectangle_tolerance,
                )
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// Annotate every shape. Each result depends only on its own shape.
pub fn annotate(shapes: &[Shape], canvas: &Canvas, policy: &ClassificationPolicy) -> Vec<Annotations> {
    shapes.iter().map(|s| s.annotate(canvas, policy)).collect()
}

/// Partition `shapes` under `policy`.
pub fn classify(shapes: &[Shape], canvas: &Canvas, policy: &ClassificationPolicy) -> Classification {
    let annotations = annotate(shapes, canvas, policy);
    let mut out = Classification::default();

    for (i, (shape, a)) in shapes.iter().zip(&annotations).enumerate() {
        if is_connector(shape, policy) {
            out.connectors.push(i);
        }
        if a.is_thin && !a.degenerate {
            out.thin.push(i);
        }

        if is_valid(a) {
            out.valid.push(i);
            if a.touches_boundary {
                out.outer.push(i);
            } else {
                out.inner.push(i);
            }
        } else {
            out.invalid.push(i);
        }
    }

    debug!(
        "classified {} shapes: {} valid ({} outer, {} inner), {} thin, {} connectors",
        shapes.len(),
        out.valid.len(),
        out.outer.len(),
        out.inner.len(),
        out.thin.len(),
        out.connectors.len()
    );

    out.annotations = annotations;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use proptest::prelude::*;

    fn square(x: f64, y: f64, size: f64) -> Shape {
        Shape::path(&format!("M{},{} h{} v{} h-{} Z", x, y, size, size, size))
    }

    #[test]
    fn splits_outer_and_inner() {
        let shapes = vec![
            square(0.0, 10.0, 5.0),   // touches the left edge
            square(10.0, 10.0, 10.0), // interior
            Shape::path("M 0,0 L 10,0 L 10,0.3 L 0,0.3 Z"),
            Shape::path("M 20,20 L 30,30"), // open
        ];
        let c = classify(&shapes, &Canvas::DEFAULT, &ClassificationPolicy::default());
        assert_eq!(c.valid, vec![0, 1]);
        assert_eq!(c.outer, vec![0]);
        assert_eq!(c.inner, vec![1]);
        assert_eq!(c.invalid, vec![2, 3]);
        assert_eq!(c.thin, vec![2]);
        assert!(c.is_outer(0));
        assert!(!c.is_outer(1));
    }

    #[test]
    fn connector_quad_and_rect() {
        let policy = ClassificationPolicy::default();
        let quad = Shape::path("M 40,40 L 40.4064,40 L 40.4064,45 L 40,45 Z");
        assert!(is_connector(&quad, &policy));

        let rect = Shape::rect(10.0, 10.0, 3.0, 0.406);
        assert!(is_connector(&rect, &policy));
        assert!(!is_connector(&Shape::rect(10.0, 10.0, 3.0, 0.5), &policy));

        let poly = Shape::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]);
        assert!(!is_connector(&poly, &policy));
        assert!(!is_connector(&Shape::circle(5.0, 5.0, 0.2032), &policy));
    }

    #[test]
    fn rect_connector_height_is_rounded() {
        let policy = ClassificationPolicy::default();
        assert!(is_connector(&Shape::rect(0.0, 0.0, 3.0, 0.4052), &policy));
        assert!(is_connector(&Shape::rect(0.0, 0.0, 3.0, 0.4064), &policy));
        assert!(!is_connector(&Shape::rect(0.0, 0.0, 3.0, 0.408), &policy));
    }

    #[test]
    fn wide_connectors_stay_valid() {
        // Under the extract threshold a connector is not thin, so it still
        // bounds enclosed regions.
        let policy = ClassificationPolicy::default().with_min_dimension(0.3);
        let shapes = vec![
            Shape::path("M 0,50 L 27,50 L 27,50.4064 L 0,50.4064 Z"),
            Shape::rect(30.0, 30.0, 5.0, 0.4064),
        ];
        let c = classify(&shapes, &Canvas::DEFAULT, &policy);
        assert_eq!(c.connectors, vec![0, 1]);
        assert_eq!(c.valid, vec![0, 1]);
        assert_eq!(c.outer, vec![0]);
        assert_eq!(c.inner, vec![1]);
        assert!(c.thin.is_empty());
    }

    #[test]
    fn thin_connectors_are_invalid() {
        let shapes = vec![Shape::path("M 0,50 L 27,50 L 27,50.4064 L 0,50.4064 Z")];
        let c = classify(&shapes, &Canvas::DEFAULT, &ClassificationPolicy::default());
        assert_eq!(c.connectors, vec![0]);
        assert_eq!(c.invalid, vec![0]);
        assert_eq!(c.thin, vec![0]);
    }

    #[test]
    fn degenerate_shapes_are_invalid_but_not_thin_targets() {
        let c = classify(&[Shape::path("M 1,1")], &Canvas::DEFAULT, &ClassificationPolicy::default());
        assert_eq!(c.invalid, vec![0]);
        assert!(c.thin.is_empty());
    }

    proptest! {
        #[test]
        fn valid_partitions_into_outer_and_inner(
            boxes in prop::collection::vec((0f64..100.0, 0f64..100.0, 0f64..20.0, 0f64..20.0), 0..40),
            margin in 0f64..5.0,
        ) {
            let shapes: Vec<Shape> = boxes
                .iter()
                .map(|&(x, y, w, h)| Shape::rect(x, y, w, h))
                .collect();
            let policy = ClassificationPolicy::default().with_boundary_margin(margin);
            let c = classify(&shapes, &Canvas::DEFAULT, &policy);

            let mut split: Vec<usize> = c.outer.iter().chain(&c.inner).copied().collect();
            split.sort_unstable();
            prop_assert_eq!(&split, &c.valid);
            prop_assert!(c.outer.iter().all(|i| !c.inner.contains(i)));

            let mut all: Vec<usize> = c.valid.iter().chain(&c.invalid).copied().collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..shapes.len()).collect::<Vec<_>>());
        }
    }
}
