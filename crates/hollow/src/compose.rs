//! Mask compositor.
//!
//! Masks are how produced documents express set operations:
//!
//! - level 1, the shape mask: canvas included, every shape excluded. A
//!   canvas fill under it shows exactly the space no shape covers.
//! - level 2, the interior mask: canvas excluded, boundary-touching shapes
//!   included. Stacked on level 1 it keeps only the gaps inside them.
//!
//! [`crate::region`] evaluates the same layers exactly, so what a document
//! shows and what the region algebra computes agree.

use crate::document::{Element, FillLevel, FillRule, Mask, MaskLayer};
use crate::geometry::Canvas;
use crate::policy::ClassificationPolicy;
use crate::shape::{Geometry, Shape};

/// Id of the level-1 mask.
pub const SHAPE_MASK_ID: &str = "inverted-mask";

/// Id of the level-2 mask.
pub const INTERIOR_MASK_ID: &str = "boundary-interior-mask";

/// Shapes that can't contribute area to a mask: no geometry, or a circle
/// with zero radius.
pub fn is_maskable(shape: &Shape) -> bool {
    if shape.is_degenerate() {
        return false;
    }
    !matches!(shape.geometry, Geometry::Circle { r, .. } if r <= 0.0)
}

/// Strip a shape down to geometry for use as a mask layer.
fn bare(shape: &Shape) -> Shape {
    Shape {
        id: None,
        geometry: shape.geometry.clone(),
        attributes: Vec::new(),
    }
}

/// Level 1: canvas included, each shape excluded.
pub fn shape_mask<'a, I>(canvas: &Canvas, shapes: I) -> Mask
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut mask = Mask::new(SHAPE_MASK_ID);
    mask.layers
        .push(MaskLayer::new(Shape::canvas_rect(canvas), FillLevel::Included));
    mask.layers.extend(
        shapes
            .into_iter()
            .filter(|s| is_maskable(s))
            .map(|s| MaskLayer::new(bare(s), FillLevel::Excluded)),
    );
    mask
}

/// Level 2: canvas excluded, each outer shape included.
pub fn interior_mask<'a, I>(canvas: &Canvas, outer: I) -> Mask
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut mask = Mask::new(INTERIOR_MASK_ID);
    mask.layers
        .push(MaskLayer::new(Shape::canvas_rect(canvas), FillLevel::Excluded));
    mask.layers.extend(
        outer
            .into_iter()
            .filter(|s| is_maskable(s))
            .map(|s| MaskLayer::new(bare(s), FillLevel::Included)),
    );
    mask
}

/// Append `shapes` to a mask as excluded layers filled under `fill_rule`.
pub fn append_excluded<'a, I>(mask: &Mask, shapes: I, fill_rule: FillRule) -> Mask
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut out = mask.clone();
    out.layers.extend(
        shapes
            .into_iter()
            .filter(|s| is_maskable(s))
            .map(|s| MaskLayer::new(bare(s), FillLevel::Excluded).with_fill_rule(fill_rule)),
    );
    out
}

/// Add `region` to a mask as excluded layers.
///
/// The layers use the alternate fill rule (evenodd), so composite shapes
/// with holes subtract their filled part rather than their whole outline.
pub fn subtract_layers<'a, I>(mask: &Mask, region: I) -> Mask
where
    I: IntoIterator<Item = &'a Shape>,
{
    append_excluded(mask, region, FillRule::NonZero.alternate())
}

/// Widen thin excluded layers with an outline of `stroke_close_width`.
///
/// This closes hairline gaps in the rendered mask. It is a rendering
/// heuristic, not a geometric offset.
pub fn close_gap_layers(mask: &Mask, canvas: &Canvas, policy: &ClassificationPolicy) -> (Mask, usize) {
    let mut out = mask.clone();
    let mut widened = 0;
    for layer in &mut out.layers {
        if layer.level != FillLevel::Excluded || layer.stroke.is_some() {
            continue;
        }
        let a = layer.shape.annotate(canvas, policy);
        if a.is_thin && !a.degenerate {
            layer.stroke = Some(policy.stroke_close_width);
            widened += 1;
        }
    }
    (out, widened)
}

/// A canvas-sized rect in `fill`, masked outermost-first by `masks`.
pub fn canvas_fill(canvas: &Canvas, fill: &str, masks: &[&str]) -> Element {
    let mut element = Element::new(Shape::canvas_rect(canvas).with_attribute("fill", fill));
    for id in masks {
        element = element.with_mask(*id);
    }
    element
}

/// Inversion as a single evenodd path: the canvas outline followed by the
/// outline of every shape.
///
/// Paths contribute their data verbatim; polygons and rects their corners.
/// Circles, ellipses, lines and polylines have no straight closed outline
/// and are left out.
pub fn compound_inversion<'a, I>(canvas: &Canvas, shapes: I, fill: &str) -> Element
where
    I: IntoIterator<Item = &'a Shape>,
{
    let [a, b, c, d] = canvas.corners();
    let mut parts = vec![format!(
        "M{},{} L{},{} L{},{} L{},{} Z",
        a.x, a.y, b.x, b.y, c.x, c.y, d.x, d.y
    )];

    for shape in shapes {
        if shape.is_degenerate() {
            continue;
        }
        match &shape.geometry {
            Geometry::Path { data, .. } => parts.push(data.trim().to_string()),
            Geometry::Polygon { .. } | Geometry::Rect { .. } => {
                if let Some(outline) = shape.primary_outline() {
                    let mut d: Vec<String> = outline
                        .iter()
                        .enumerate()
                        .map(|(i, p)| format!("{}{},{}", if i == 0 { 'M' } else { 'L' }, p.x, p.y))
                        .collect();
                    d.push("Z".to_string());
                    parts.push(d.join(" "));
                }
            }
            _ => {}
        }
    }

    Element::new(Shape::path(&parts.join(" ")).with_attribute("fill", fill))
        .with_fill_rule(FillRule::EvenOdd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mask_skips_zero_radius_and_degenerate() {
        let canvas = Canvas::DEFAULT;
        let shapes = vec![
            Shape::circle(1.0, 1.0, 0.0),
            Shape::path("M 5,5"),
            Shape::circle(1.0, 1.0, 0.5).with_id("keep").with_attribute("class", "x"),
        ];
        let mask = shape_mask(&canvas, &shapes);
        assert_eq!(mask.id, SHAPE_MASK_ID);
        assert_eq!(mask.layers.len(), 2);
        assert_eq!(mask.layers[0].level, FillLevel::Included);
        assert_eq!(mask.layers[1].shape, Shape::circle(1.0, 1.0, 0.5));
        assert_eq!(mask.layers[1].level, FillLevel::Excluded);
    }

    #[test]
    fn interior_mask_inverts_levels() {
        let outer = vec![Shape::rect(0.0, 0.0, 10.0, 10.0)];
        let mask = interior_mask(&Canvas::DEFAULT, &outer);
        assert_eq!(mask.id, INTERIOR_MASK_ID);
        assert_eq!(mask.layers[0].level, FillLevel::Excluded);
        assert_eq!(mask.layers[1].level, FillLevel::Included);
    }

    #[test]
    fn subtraction_uses_evenodd() {
        let base = shape_mask(&Canvas::DEFAULT, &Vec::<Shape>::new());
        let out = subtract_layers(&base, &[Shape::rect(1.0, 1.0, 2.0, 2.0)]);
        assert_eq!(out.layers.len(), 2);
        assert_eq!(out.layers[1].fill_rule, FillRule::EvenOdd);

        let unchanged = subtract_layers(&base, &Vec::<Shape>::new());
        assert_eq!(unchanged, base);
    }

    #[test]
    fn close_gaps_only_touches_thin_excluded_layers() {
        let shapes = vec![Shape::rect(10.0, 10.0, 5.0, 0.2), Shape::rect(20.0, 20.0, 5.0, 5.0)];
        let mask = shape_mask(&Canvas::DEFAULT, &shapes);
        let (out, widened) = close_gap_layers(&mask, &Canvas::DEFAULT, &ClassificationPolicy::default());
        assert_eq!(widened, 1);
        assert_eq!(out.layers[0].stroke, None);
        assert_eq!(out.layers[1].stroke, Some(0.5));
        assert_eq!(out.layers[2].stroke, None);
    }

    #[test]
    fn compound_path_starts_with_canvas() {
        let shapes = vec![
            Shape::path("M 1,1 L 2,1 L 2,2 Z"),
            Shape::rect(5.0, 5.0, 1.0, 1.0),
            Shape::circle(3.0, 3.0, 1.0),
        ];
        let element = compound_inversion(&Canvas::new(0.0, 0.0, 10.0, 10.0), &shapes, "#000");
        assert_eq!(element.fill_rule, FillRule::EvenOdd);
        match &element.shape.geometry {
            Geometry::Path { data, parsed } => {
                assert_eq!(
                    data,
                    "M0,0 L10,0 L10,10 L0,10 Z M 1,1 L 2,1 L 2,2 Z M5,5 L6,5 L6,6 L5,6 Z"
                );
                assert_eq!(parsed.subpaths.len(), 3);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
