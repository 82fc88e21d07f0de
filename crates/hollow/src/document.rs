//! The document model: canvas, drawn elements, masks, passthrough.
//!
//! A [`Document`] is a plain value. Stages take one by reference and build
//! a new one; none of them edit their input.

use serde::Serialize;

use crate::geometry::Canvas;
use crate::shape::{Geometry, Shape};

/// Inside/outside resolution for composite or self-intersecting outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn as_str(self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }

    /// Parse a `fill-rule` value. Anything unknown is the SVG default.
    pub fn parse(value: &str) -> FillRule {
        match value.trim() {
            "evenodd" => FillRule::EvenOdd,
            _ => FillRule::NonZero,
        }
    }

    /// The other rule.
    pub fn alternate(self) -> FillRule {
        match self {
            FillRule::NonZero => FillRule::EvenOdd,
            FillRule::EvenOdd => FillRule::NonZero,
        }
    }
}

/// Whether a mask layer adds to or removes from the visible region.
///
/// In the file this is the layer's fill colour: white includes, black
/// excludes. Any other colour counts by its brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillLevel {
    Included,
    Excluded,
}

impl FillLevel {
    pub fn color(self) -> &'static str {
        match self {
            FillLevel::Included => "white",
            FillLevel::Excluded => "black",
        }
    }

    /// Level for a mask layer's fill value. Unparseable fills exclude.
    pub fn from_fill(value: &str) -> FillLevel {
        match value.trim().parse::<svgtypes::Color>() {
            Ok(c) => {
                let luma = 0.2126 * c.red as f64 + 0.7152 * c.green as f64 + 0.0722 * c.blue as f64;
                if luma >= 128.0 && c.alpha >= 128 {
                    FillLevel::Included
                } else {
                    FillLevel::Excluded
                }
            }
            Err(_) => FillLevel::Excluded,
        }
    }
}

/// One layer of a mask.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskLayer {
    pub shape: Shape,
    pub level: FillLevel,
    pub fill_rule: FillRule,
    /// Outline width drawn in the same colour (gap closing).
    pub stroke: Option<f64>,
}

impl MaskLayer {
    pub fn new(shape: Shape, level: FillLevel) -> Self {
        Self {
            shape,
            level,
            fill_rule: FillRule::NonZero,
            stroke: None,
        }
    }

    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    pub fn with_stroke(mut self, width: f64) -> Self {
        self.stroke = Some(width);
        self
    }
}

/// A named, referenceable stack of layers, painted in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pub id: String,
    pub layers: Vec<MaskLayer>,
}

impl Mask {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layers: Vec::new(),
        }
    }
}

/// A drawn shape plus how it is filled and masked.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub shape: Shape,
    pub fill_rule: FillRule,
    /// Mask ids from the outermost group to the element itself. The visible
    /// region is the shape's region intersected with every one of them.
    pub masks: Vec<String>,
}

impl Element {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            fill_rule: FillRule::NonZero,
            masks: Vec::new(),
        }
    }

    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    pub fn with_mask(mut self, id: impl Into<String>) -> Self {
        self.masks.push(id.into());
        self
    }
}

/// A parsed or produced vector document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub canvas: Canvas,
    /// Root `width`/`height` exactly as written.
    pub width: Option<String>,
    pub height: Option<String>,
    /// Drawn elements in painter's order.
    pub elements: Vec<Element>,
    pub masks: Vec<Mask>,
    /// Raw XML for `<style>` blocks and non-shape defs, emitted verbatim.
    pub passthrough: Vec<String>,
}

impl Document {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            width: None,
            height: None,
            elements: Vec::new(),
            masks: Vec::new(),
            passthrough: Vec::new(),
        }
    }

    /// Empty document on the same canvas, keeping size and passthrough.
    pub fn derive_empty(&self) -> Self {
        Self {
            canvas: self.canvas,
            width: self.width.clone(),
            height: self.height.clone(),
            elements: Vec::new(),
            masks: Vec::new(),
            passthrough: self.passthrough.clone(),
        }
    }

    pub fn mask(&self, id: &str) -> Option<&Mask> {
        self.masks.iter().find(|m| m.id == id)
    }

    pub fn mask_mut(&mut self, id: &str) -> Option<&mut Mask> {
        self.masks.iter_mut().find(|m| m.id == id)
    }

    /// Every drawn shape, masked or not.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        self.elements.iter().map(|e| &e.shape)
    }

    /// The elements a stage should treat as the drawing's content.
    ///
    /// For a plain drawing that is every unmasked element. For a document
    /// this crate produced, the content lives in its masks as excluded
    /// layers, so those are returned as well (canvas backgrounds skipped).
    /// Running a stage on its own output therefore sees the same shapes.
    pub fn source_elements(&self) -> Vec<Element> {
        let body = self.elements.iter().filter(|e| e.masks.is_empty()).cloned();

        let layered = self
            .masks
            .iter()
            .flat_map(|m| &m.layers)
            .filter(|l| l.level == FillLevel::Excluded && !is_background(&l.shape, &self.canvas))
            .map(|l| Element::new(l.shape.clone()).with_fill_rule(l.fill_rule));

        body.chain(layered).collect()
    }

    /// Shapes of [`Document::source_elements`].
    pub fn source_shapes(&self) -> Vec<Shape> {
        self.source_elements().into_iter().map(|e| e.shape).collect()
    }
}

/// A rect covering the whole canvas.
pub fn is_background(shape: &Shape, canvas: &Canvas) -> bool {
    match shape.geometry {
        Geometry::Rect { x, y, width, height } => {
            x <= canvas.x && y <= canvas.y && x + width >= canvas.max_x() && y + height >= canvas.max_y()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_level_from_colour() {
        assert_eq!(FillLevel::from_fill("white"), FillLevel::Included);
        assert_eq!(FillLevel::from_fill("#fff"), FillLevel::Included);
        assert_eq!(FillLevel::from_fill("#000000"), FillLevel::Excluded);
        assert_eq!(FillLevel::from_fill("black"), FillLevel::Excluded);
        assert_eq!(FillLevel::from_fill("not a colour"), FillLevel::Excluded);
    }

    #[test]
    fn fill_rule_parse_and_alternate() {
        assert_eq!(FillRule::parse("evenodd"), FillRule::EvenOdd);
        assert_eq!(FillRule::parse("inherit"), FillRule::NonZero);
        assert_eq!(FillRule::NonZero.alternate(), FillRule::EvenOdd);
    }

    #[test]
    fn source_shapes_skip_masked_elements_and_backgrounds() {
        let canvas = Canvas::DEFAULT;
        let mut doc = Document::new(canvas);
        doc.elements.push(Element::new(Shape::canvas_rect(&canvas)).with_mask("m"));
        doc.elements.push(Element::new(Shape::circle(5.0, 5.0, 1.0)));

        let mut mask = Mask::new("m");
        mask.layers.push(MaskLayer::new(Shape::canvas_rect(&canvas), FillLevel::Included));
        mask.layers.push(MaskLayer::new(Shape::rect(1.0, 1.0, 2.0, 2.0), FillLevel::Excluded));
        mask.layers.push(MaskLayer::new(Shape::rect(9.0, 9.0, 2.0, 2.0), FillLevel::Included));
        doc.masks.push(mask);

        let shapes = doc.source_shapes();
        assert_eq!(
            shapes,
            vec![Shape::circle(5.0, 5.0, 1.0), Shape::rect(1.0, 1.0, 2.0, 2.0)]
        );
    }
}
