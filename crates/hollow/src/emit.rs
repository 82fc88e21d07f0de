//! SVG writing: [`Document`] out as text.
//!
//! Layout follows what the pipeline has always produced: passthrough and
//! masks inside one `<defs>`, then the drawn elements. An element with
//! several masks is wrapped in one `<g mask>` per outer mask so the
//! innermost one sits on the element itself.
//!
//! Numbers are written with `{}`, which round-trips every `f64` exactly.

use std::fs;
use std::path::Path;

use quick_xml::escape::escape;

use crate::diagnostics::HollowError;
use crate::document::{Document, Element, FillRule, Mask, MaskLayer};
use crate::geometry::Point;
use crate::shape::{Geometry, Shape};

/// Render a document as SVG text.
pub fn write_document(doc: &Document) -> String {
    let c = &doc.canvas;
    let mut svg = String::new();

    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"");
    if let Some(width) = &doc.width {
        svg.push_str(&format!(" width=\"{}\"", escape(width.as_str())));
    }
    if let Some(height) = &doc.height {
        svg.push_str(&format!(" height=\"{}\"", escape(height.as_str())));
    }
    svg.push_str(&format!(" viewBox=\"{} {} {} {}\">\n", c.x, c.y, c.width, c.height));

    if !doc.passthrough.is_empty() || !doc.masks.is_empty() {
        svg.push_str("<defs>\n");
        for raw in &doc.passthrough {
            svg.push_str(&format!("    {}\n", raw));
        }
        for mask in &doc.masks {
            write_mask(&mut svg, mask);
        }
        svg.push_str("</defs>\n");
    }

    for element in &doc.elements {
        write_element(&mut svg, element);
    }

    svg.push_str("</svg>\n");
    svg
}

/// Write a document to disk.
pub fn write_file<P: AsRef<Path>>(doc: &Document, path: P) -> Result<(), HollowError> {
    fs::write(path.as_ref(), write_document(doc))?;
    Ok(())
}

fn write_mask(svg: &mut String, mask: &Mask) {
    svg.push_str(&format!("    <mask id=\"{}\">\n", escape(mask.id.as_str())));
    for layer in &mask.layers {
        svg.push_str(&format!("        {}\n", layer_markup(layer)));
    }
    svg.push_str("    </mask>\n");
}

fn layer_markup(layer: &MaskLayer) -> String {
    let color = layer.level.color();
    let mut extra = vec![("fill", color.to_string())];
    if layer.fill_rule == FillRule::EvenOdd {
        extra.push(("fill-rule", layer.fill_rule.as_str().to_string()));
    }
    if let Some(width) = layer.stroke {
        extra.push(("stroke", color.to_string()));
        extra.push(("stroke-width", width.to_string()));
    }
    shape_markup(&layer.shape, &extra)
}

fn write_element(svg: &mut String, element: &Element) {
    let (inner, outer) = match element.masks.split_last() {
        Some((last, rest)) => (Some(last), rest),
        None => (None, &[][..]),
    };

    for id in outer {
        svg.push_str(&format!("<g mask=\"url(#{})\">\n", escape(id.as_str())));
    }

    let mut extra = Vec::new();
    if element.fill_rule == FillRule::EvenOdd {
        extra.push(("fill-rule", element.fill_rule.as_str().to_string()));
    }
    if let Some(id) = inner {
        extra.push(("mask", format!("url(#{})", id)));
    }
    svg.push_str(&shape_markup(&element.shape, &extra));
    svg.push('\n');

    for _ in outer {
        svg.push_str("</g>\n");
    }
}

/// One self-closing shape tag: geometry, id, kept attributes, then `extra`.
pub fn shape_markup(shape: &Shape, extra: &[(&str, String)]) -> String {
    let mut tag = format!("<{}", shape.kind().tag());

    if let Some(id) = &shape.id {
        tag.push_str(&format!(" id=\"{}\"", escape(id.as_str())));
    }

    match &shape.geometry {
        Geometry::Path { data, .. } => {
            tag.push_str(&format!(" d=\"{}\"", escape(data.as_str())));
        }
        Geometry::Circle { cx, cy, r } => {
            tag.push_str(&format!(" cx=\"{}\" cy=\"{}\" r=\"{}\"", cx, cy, r));
        }
        Geometry::Rect { x, y, width, height } => {
            tag.push_str(&format!(
                " x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
                x, y, width, height
            ));
        }
        Geometry::Polygon { points } | Geometry::Polyline { points } => {
            tag.push_str(&format!(" points=\"{}\"", points_attribute(points)));
        }
        Geometry::Line { from, to } => {
            tag.push_str(&format!(
                " x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"",
                from.x, from.y, to.x, to.y
            ));
        }
        Geometry::Ellipse { cx, cy, rx, ry } => {
            tag.push_str(&format!(" cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\"", cx, cy, rx, ry));
        }
    }

    for (key, value) in &shape.attributes {
        if extra.iter().any(|(k, _)| k == key) {
            continue;
        }
        tag.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
    }
    for (key, value) in extra {
        tag.push_str(&format!(" {}=\"{}\"", key, escape(value.as_str())));
    }

    tag.push_str("/>");
    tag
}

fn points_attribute(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}
