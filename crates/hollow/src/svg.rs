//! SVG reading: XML in, [`Document`] out.
//!
//! Streams the file with quick-xml instead of resolving it through a full
//! renderer tree. We need the raw attributes (the exact `d` string, mask
//! references, the fill colour of mask layers) and the verbatim text of
//! `<style>` and other defs, all of which a resolving parser throws away.
//!
//! What the reader understands:
//!
//! - root `viewBox`, `width`, `height`
//! - `path circle rect polygon polyline line ellipse`
//! - `<g>` nesting, with `mask`, `fill` and `fill-rule` inherited downward
//! - `<mask id>` blocks, whose layers become [`MaskLayer`]s
//! - `<use href="#id" x y>` pointing at a shape or `<g id>`
//!
//! `transform` attributes are kept on body shapes for re-emission but do
//! not move geometry.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::diagnostics::{Diagnostic, DiagnosticKind, HollowError, Outcome};
use crate::document::{is_background, Document, Element, FillLevel, FillRule, Mask, MaskLayer};
use crate::geometry::{Canvas, Point};
use crate::path::parse_path_data;
use crate::shape::{Geometry, Shape, ShapeKind};

/// Read a document from a file.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Outcome<Document>, HollowError> {
    let content = fs::read_to_string(path.as_ref())?;
    read_document(&content)
}

/// Parse SVG text into a document.
///
/// Only broken XML is an error. Everything else that goes wrong (bad
/// numbers, empty paths, dangling references, no viewBox) is reported in
/// the returned diagnostics and the read carries on.
pub fn read_document(content: &str) -> Result<Outcome<Document>, HollowError> {
    let mut state = ReadState::default();
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| HollowError::Xml {
            position: reader.error_position() as u64,
            message: e.to_string(),
        })?;
        let after = reader.buffer_position() as usize;

        if let Some(capture) = state.capture.as_mut() {
            match event {
                Event::Start(_) => capture.depth += 1,
                Event::End(_) => {
                    capture.depth -= 1;
                    if capture.depth == 0 {
                        let start = capture.start;
                        state.passthrough.push(content[start..after].trim().to_string());
                        state.capture = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(ref e) => state.open(e, false, &content[before..after], before)?,
            Event::Empty(ref e) => state.open(e, true, &content[before..after], before)?,
            Event::End(_) => {
                state.stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(state.finish())
}

// ============================================================================
// Reader state
// ============================================================================

#[derive(Debug, Default)]
struct GroupFrame {
    id: Option<String>,
    mask: Option<String>,
    fill: Option<String>,
    fill_rule: Option<FillRule>,
}

#[derive(Debug)]
enum Frame {
    Root,
    Group(GroupFrame),
    Defs,
    /// Index into `ReadState::masks`.
    Mask(usize),
    /// Children are ignored (shape internals, text, unknown elements).
    Skip,
}

/// An open passthrough element whose closing tag we are waiting for.
#[derive(Debug)]
struct Capture {
    start: usize,
    depth: usize,
}

#[derive(Debug)]
struct UseRef {
    href: String,
    dx: f64,
    dy: f64,
}

#[derive(Debug)]
enum BodyItem {
    /// An element and the issues found while reading it.
    Ready(Element, Vec<DiagnosticKind>),
    Use {
        target: UseRef,
        fill_rule: FillRule,
        masks: Vec<String>,
    },
}

#[derive(Debug)]
enum LayerItem {
    Ready(MaskLayer, Vec<DiagnosticKind>),
    Use {
        target: UseRef,
        level: FillLevel,
        fill_rule: FillRule,
    },
}

#[derive(Debug)]
struct MaskBuild {
    id: String,
    items: Vec<LayerItem>,
}

/// Typed attributes pulled off a shape or `use` element.
#[derive(Debug, Default)]
struct Props {
    id: Option<String>,
    fill: Option<String>,
    fill_rule: Option<FillRule>,
    mask: Option<String>,
    stroke: Option<String>,
    stroke_width: Option<f64>,
}

#[derive(Debug, Default)]
struct ReadState {
    stack: Vec<Frame>,
    capture: Option<Capture>,
    view_box: Option<String>,
    width: Option<String>,
    height: Option<String>,
    body: Vec<BodyItem>,
    masks: Vec<MaskBuild>,
    /// Shapes reachable from `use`, by element or group id.
    refs: HashMap<String, Vec<Shape>>,
    passthrough: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl ReadState {
    fn open(&mut self, e: &BytesStart, empty: bool, raw: &str, start: usize) -> Result<(), HollowError> {
        let local = e.local_name();
        let name = std::str::from_utf8(local.as_ref()).unwrap_or("");
        let attrs = collect_attributes(e)?;

        if self.stack.iter().any(|f| matches!(f, Frame::Skip)) {
            if !empty {
                self.stack.push(Frame::Skip);
            }
            return Ok(());
        }

        let frame = match name {
            "svg" if self.stack.is_empty() => {
                for (key, value) in &attrs {
                    match key.as_str() {
                        "viewBox" | "viewbox" => self.view_box = Some(value.clone()),
                        "width" => self.width = Some(value.clone()),
                        "height" => self.height = Some(value.clone()),
                        _ => {}
                    }
                }
                Frame::Root
            }
            "style" => {
                self.begin_capture(raw, start, empty);
                return Ok(());
            }
            "defs" => Frame::Defs,
            "mask" => {
                let id = attr(&attrs, "id").unwrap_or_default().to_string();
                self.masks.push(MaskBuild { id, items: Vec::new() });
                Frame::Mask(self.masks.len() - 1)
            }
            "g" | "svg" | "a" | "switch" => Frame::Group(group_frame(&attrs)),
            "use" => {
                self.read_use(&attrs);
                Frame::Skip
            }
            _ => match ShapeKind::from_tag(name) {
                Some(kind) => {
                    self.read_shape(kind, &attrs);
                    Frame::Skip
                }
                None if self.in_defs() && self.current_mask().is_none() => {
                    self.begin_capture(raw, start, empty);
                    return Ok(());
                }
                None => Frame::Skip,
            },
        };

        if !empty {
            self.stack.push(frame);
        }
        Ok(())
    }

    fn begin_capture(&mut self, raw: &str, start: usize, empty: bool) {
        if empty {
            self.passthrough.push(raw.trim().to_string());
        } else {
            self.capture = Some(Capture { start, depth: 1 });
        }
    }

    fn in_defs(&self) -> bool {
        self.stack.iter().any(|f| matches!(f, Frame::Defs))
    }

    fn current_mask(&self) -> Option<usize> {
        self.stack.iter().rev().find_map(|f| match f {
            Frame::Mask(i) => Some(*i),
            _ => None,
        })
    }

    fn groups(&self) -> impl DoubleEndedIterator<Item = &GroupFrame> {
        self.stack.iter().filter_map(|f| match f {
            Frame::Group(g) => Some(g),
            _ => None,
        })
    }

    fn inherited_fill(&self) -> Option<&str> {
        self.groups().rev().find_map(|g| g.fill.as_deref())
    }

    fn inherited_fill_rule(&self) -> Option<FillRule> {
        self.groups().rev().find_map(|g| g.fill_rule)
    }

    /// Mask ids from enclosing groups, outermost first.
    fn group_masks(&self) -> Vec<String> {
        self.groups().filter_map(|g| g.mask.clone()).collect()
    }

    fn register(&mut self, shape: &Shape) {
        if let Some(id) = &shape.id {
            self.refs.entry(id.clone()).or_default().push(shape.clone());
        }
        let group_ids: Vec<String> = self.groups().filter_map(|g| g.id.clone()).collect();
        for id in group_ids {
            self.refs.entry(id).or_default().push(shape.clone());
        }
    }

    fn read_shape(&mut self, kind: ShapeKind, attrs: &[(String, String)]) {
        let (shape, props, mut issues) = build_shape(kind, attrs);
        issues.extend(shape.issues());

        self.register(&shape);

        if let Some(mask) = self.current_mask() {
            let layer = self.mask_layer(shape, &props);
            self.masks[mask].items.push(LayerItem::Ready(layer, issues));
        } else if self.in_defs() {
            // Only reachable through `use`; no index of its own.
            self.diagnostics
                .extend(issues.into_iter().map(Diagnostic::document));
        } else {
            let fill_rule = props
                .fill_rule
                .or_else(|| self.inherited_fill_rule())
                .unwrap_or_default();
            let mut masks = self.group_masks();
            masks.extend(props.mask);
            self.body.push(BodyItem::Ready(
                Element {
                    shape,
                    fill_rule,
                    masks,
                },
                issues,
            ));
        }
    }

    fn mask_layer(&self, mut shape: Shape, props: &Props) -> MaskLayer {
        let level = self.level_for(props);
        let fill_rule = props
            .fill_rule
            .or_else(|| self.inherited_fill_rule())
            .unwrap_or_default();
        let stroke = match props.stroke.as_deref() {
            Some(s) if s != "none" => Some(props.stroke_width.unwrap_or(1.0)),
            _ => None,
        };
        shape.attributes.clear();
        MaskLayer {
            shape,
            level,
            fill_rule,
            stroke,
        }
    }

    /// Mask layer level from its own fill, then the group's. SVG's default
    /// fill is black, which excludes.
    fn level_for(&self, props: &Props) -> FillLevel {
        props
            .fill
            .as_deref()
            .or_else(|| self.inherited_fill())
            .map(FillLevel::from_fill)
            .unwrap_or(FillLevel::Excluded)
    }

    fn read_use(&mut self, attrs: &[(String, String)]) {
        let href = attrs
            .iter()
            .find(|(k, _)| k == "href" || k == "xlink:href")
            .map(|(_, v)| v.trim().trim_start_matches('#').to_string());
        let Some(href) = href else {
            return;
        };

        let mut issues = Vec::new();
        let target = UseRef {
            href,
            dx: attr(attrs, "x").map(|v| number(v, &mut issues)).unwrap_or(0.0),
            dy: attr(attrs, "y").map(|v| number(v, &mut issues)).unwrap_or(0.0),
        };
        for kind in issues {
            self.diagnostics.push(Diagnostic::document(kind));
        }
        let props = props_of(attrs);

        if let Some(mask) = self.current_mask() {
            let level = self.level_for(&props);
            let fill_rule = props
                .fill_rule
                .or_else(|| self.inherited_fill_rule())
                .unwrap_or_default();
            self.masks[mask].items.push(LayerItem::Use {
                target,
                level,
                fill_rule,
            });
        } else if !self.in_defs() {
            let fill_rule = props
                .fill_rule
                .or_else(|| self.inherited_fill_rule())
                .unwrap_or_default();
            let mut masks = self.group_masks();
            masks.extend(props.mask);
            self.body.push(BodyItem::Use {
                target,
                fill_rule,
                masks,
            });
        }
    }

    /// Look up a `use` target, reporting it if missing.
    fn instantiate(&self, target: &UseRef, diagnostics: &mut Vec<Diagnostic>) -> Vec<Shape> {
        match self.refs.get(&target.href) {
            Some(shapes) => shapes
                .iter()
                .map(|s| {
                    let mut moved = s.translate(target.dx, target.dy);
                    moved.id = None;
                    moved
                })
                .collect(),
            None => {
                warn!("use reference #{} not found", target.href);
                diagnostics.push(Diagnostic::document(DiagnosticKind::UnresolvedReference {
                    href: target.href.clone(),
                }));
                Vec::new()
            }
        }
    }

    fn finish(self) -> Outcome<Document> {
        let mut diagnostics = Vec::new();
        let canvas = resolve_canvas(
            self.view_box.as_deref(),
            self.width.as_deref(),
            self.height.as_deref(),
            &mut diagnostics,
        );

        // Shape diagnostics are indexed the way `Document::source_elements`
        // orders shapes: unmasked body elements, then excluded mask layers.
        // Anything else is reported against the document.
        let mut shape_issues = Vec::new();
        let mut source_index = 0;

        let mut elements = Vec::new();
        for item in &self.body {
            match item {
                BodyItem::Ready(element, issues) => {
                    if element.masks.is_empty() {
                        shape_issues.extend(issues.iter().map(|kind| {
                            Diagnostic::shape(source_index, element.shape.id.clone(), kind.clone())
                        }));
                        source_index += 1;
                    } else {
                        shape_issues.extend(issues.iter().cloned().map(Diagnostic::document));
                    }
                    elements.push(element.clone());
                }
                BodyItem::Use {
                    target,
                    fill_rule,
                    masks,
                } => {
                    for shape in self.instantiate(target, &mut diagnostics) {
                        if masks.is_empty() {
                            source_index += 1;
                        }
                        elements.push(Element {
                            shape,
                            fill_rule: *fill_rule,
                            masks: masks.clone(),
                        });
                    }
                }
            }
        }

        let mut masks = Vec::new();
        for build in &self.masks {
            let mut mask = Mask::new(build.id.clone());
            for item in &build.items {
                match item {
                    LayerItem::Ready(layer, issues) => {
                        if layer.level == FillLevel::Excluded && !is_background(&layer.shape, &canvas) {
                            shape_issues.extend(issues.iter().map(|kind| {
                                Diagnostic::shape(source_index, layer.shape.id.clone(), kind.clone())
                            }));
                            source_index += 1;
                        } else {
                            shape_issues.extend(issues.iter().cloned().map(Diagnostic::document));
                        }
                        mask.layers.push(layer.clone());
                    }
                    LayerItem::Use {
                        target,
                        level,
                        fill_rule,
                    } => {
                        for mut shape in self.instantiate(target, &mut diagnostics) {
                            shape.attributes.clear();
                            if *level == FillLevel::Excluded && !is_background(&shape, &canvas) {
                                source_index += 1;
                            }
                            mask.layers
                                .push(MaskLayer::new(shape, *level).with_fill_rule(*fill_rule));
                        }
                    }
                }
            }
            masks.push(mask);
        }

        diagnostics.extend(self.diagnostics);
        diagnostics.extend(shape_issues);

        Outcome::new(
            Document {
                canvas,
                width: self.width,
                height: self.height,
                elements,
                masks,
                passthrough: self.passthrough,
            },
            diagnostics,
        )
    }
}

// ============================================================================
// Attribute helpers
// ============================================================================

fn collect_attributes(e: &BytesStart) -> Result<Vec<(String, String)>, HollowError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| HollowError::Xml {
            position: 0,
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        out.push((key, value));
    }
    Ok(out)
}

fn attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// `fill`/`fill-rule` may also come from an inline `style`.
fn style_value<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attr(attrs, "style")?
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim())
}

fn presentation<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    style_value(attrs, name).or_else(|| attr(attrs, name))
}

fn props_of(attrs: &[(String, String)]) -> Props {
    let mut ignored = Vec::new();
    Props {
        id: attr(attrs, "id").map(str::to_string),
        fill: presentation(attrs, "fill").map(str::to_string),
        fill_rule: presentation(attrs, "fill-rule").map(FillRule::parse),
        mask: attr(attrs, "mask").and_then(mask_reference),
        stroke: presentation(attrs, "stroke").map(str::to_string),
        stroke_width: presentation(attrs, "stroke-width").map(|v| number(v, &mut ignored)),
    }
}

fn group_frame(attrs: &[(String, String)]) -> GroupFrame {
    let props = props_of(attrs);
    GroupFrame {
        id: props.id,
        mask: props.mask,
        fill: props.fill,
        fill_rule: props.fill_rule,
    }
}

/// `url(#id)` → `id`.
fn mask_reference(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix("url(")?.strip_suffix(')')?;
    let id = inner.trim().trim_matches(|c| c == '"' || c == '\'').trim_start_matches('#');
    if id.is_empty() { None } else { Some(id.to_string()) }
}

/// A length attribute as a plain number (units ignored). Bad values are
/// reported and read as zero.
fn number(value: &str, issues: &mut Vec<DiagnosticKind>) -> f64 {
    match svgtypes::Length::from_str(value.trim()) {
        Ok(length) if length.number.is_finite() => length.number,
        _ => {
            issues.push(DiagnosticKind::MalformedNumericToken {
                token: value.trim().to_string(),
            });
            0.0
        }
    }
}

fn points(value: &str) -> Vec<Point> {
    svgtypes::PointsParser::from(value)
        .map(|(x, y)| Point::new(x, y))
        .collect()
}

fn geometry_keys(kind: ShapeKind) -> &'static [&'static str] {
    match kind {
        ShapeKind::Path => &["d"],
        ShapeKind::Circle => &["cx", "cy", "r"],
        ShapeKind::Rect => &["x", "y", "width", "height"],
        ShapeKind::Polygon | ShapeKind::Polyline => &["points"],
        ShapeKind::Line => &["x1", "y1", "x2", "y2"],
        ShapeKind::Ellipse => &["cx", "cy", "rx", "ry"],
    }
}

/// Keys consumed into typed fields instead of kept as presentation.
const TYPED_KEYS: [&str; 3] = ["id", "fill-rule", "mask"];

fn build_shape(kind: ShapeKind, attrs: &[(String, String)]) -> (Shape, Props, Vec<DiagnosticKind>) {
    let mut issues = Vec::new();
    let mut num = |name: &str| attr(attrs, name).map(|v| number(v, &mut issues)).unwrap_or(0.0);

    let geometry = match kind {
        ShapeKind::Path => {
            let d = attr(attrs, "d").unwrap_or("");
            Geometry::Path {
                data: d.to_string(),
                parsed: parse_path_data(d),
            }
        }
        ShapeKind::Circle => Geometry::Circle {
            cx: num("cx"),
            cy: num("cy"),
            r: num("r"),
        },
        ShapeKind::Rect => Geometry::Rect {
            x: num("x"),
            y: num("y"),
            width: num("width"),
            height: num("height"),
        },
        ShapeKind::Ellipse => Geometry::Ellipse {
            cx: num("cx"),
            cy: num("cy"),
            rx: num("rx"),
            ry: num("ry"),
        },
        ShapeKind::Line => Geometry::Line {
            from: Point::new(num("x1"), num("y1")),
            to: Point::new(num("x2"), num("y2")),
        },
        ShapeKind::Polygon => Geometry::Polygon {
            points: points(attr(attrs, "points").unwrap_or("")),
        },
        ShapeKind::Polyline => Geometry::Polyline {
            points: points(attr(attrs, "points").unwrap_or("")),
        },
    };

    let keys = geometry_keys(kind);
    let props = props_of(attrs);
    let shape = Shape {
        id: props.id.clone(),
        geometry,
        attributes: attrs
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()) && !TYPED_KEYS.contains(&k.as_str()))
            .cloned()
            .collect(),
    };
    (shape, props, issues)
}

/// Canvas from `viewBox`, falling back to the display size, then 100x100.
fn resolve_canvas(
    view_box: Option<&str>,
    width: Option<&str>,
    height: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Canvas {
    if let Some(vb) = view_box.and_then(|v| svgtypes::ViewBox::from_str(v).ok()) {
        if vb.w > 0.0 && vb.h > 0.0 {
            return Canvas::new(vb.x, vb.y, vb.w, vb.h);
        }
    }

    let side = |value: Option<&str>, fallback: f64| {
        value
            .and_then(|v| svgtypes::Length::from_str(v.trim()).ok())
            .map(|l| l.number)
            .filter(|n| n.is_finite() && *n > 0.0)
            .unwrap_or(fallback)
    };
    let canvas = Canvas::new(
        0.0,
        0.0,
        side(width, Canvas::DEFAULT.width),
        side(height, Canvas::DEFAULT.height),
    );

    warn!("no usable viewBox; using {}x{} canvas", canvas.width, canvas.height);
    diagnostics.push(Diagnostic::document(DiagnosticKind::MissingViewport {
        width: canvas.width,
        height: canvas.height,
    }));
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Location;

    fn read(svg: &str) -> Outcome<Document> {
        read_document(svg).unwrap()
    }

    #[test]
    fn reads_canvas_and_shapes() {
        let out = read(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 50 40" width="50mm" height="40mm">
                <path d="M 1,1 L 5,1 L 5,5 Z" class="pad"/>
                <circle cx="10" cy="10" r="2"/>
                <rect x="1" y="2" width="3" height="4"/>
                <polygon points="0,0 1,0 1,1"/>
                <polyline points="0,0 2,2"/>
                <line x1="0" y1="0" x2="3" y2="4"/>
                <ellipse cx="5" cy="5" rx="2" ry="1"/>
            </svg>"##,
        );
        let doc = out.value;
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
        assert_eq!(doc.canvas, Canvas::new(0.0, 0.0, 50.0, 40.0));
        assert_eq!(doc.width.as_deref(), Some("50mm"));
        assert_eq!(doc.height.as_deref(), Some("40mm"));
        assert_eq!(doc.elements.len(), 7);
        assert_eq!(doc.elements[0].shape.attribute("class"), Some("pad"));
        assert_eq!(doc.elements[1].shape, Shape::circle(10.0, 10.0, 2.0));
    }

    #[test]
    fn missing_viewbox_falls_back() {
        let out = read(r#"<svg width="200" height="80"><rect width="1" height="1"/></svg>"#);
        assert_eq!(out.value.canvas, Canvas::new(0.0, 0.0, 200.0, 80.0));
        assert!(out.has(|k| matches!(k, DiagnosticKind::MissingViewport { .. })));

        let out = read(r#"<svg><rect width="1" height="1"/></svg>"#);
        assert_eq!(out.value.canvas, Canvas::DEFAULT);
    }

    #[test]
    fn per_shape_diagnostics_do_not_stop_the_read() {
        let out = read(
            r#"<svg viewBox="0 0 10 10">
                <circle id="bad" cx="abc" cy="1" r="1"/>
                <path d="M 1,1"/>
                <path d="M 0,0 C 1,1 2,2 3,3 L 4,4"/>
            </svg>"#,
        );
        assert_eq!(out.value.elements.len(), 3);
        assert!(out.diagnostics.contains(&Diagnostic::shape(
            0,
            Some("bad".to_string()),
            DiagnosticKind::MalformedNumericToken { token: "abc".to_string() }
        )));
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.location == Location::Shape { index: 1, id: None }
                && d.kind == DiagnosticKind::DegenerateShape));
        assert!(out.has(|k| *k == DiagnosticKind::UnsupportedPathCommand { command: 'C' }));
    }

    #[test]
    fn shape_diagnostics_index_source_shapes() {
        let out = read(
            r##"<svg viewBox="0 0 10 10">
                <defs>
                    <path id="stamp" d="M 3,3"/>
                    <mask id="m">
                        <rect x="0" y="0" width="10" height="10" fill="white"/>
                        <path d="M 1,1" fill="black"/>
                    </mask>
                </defs>
                <rect x="1" y="1" width="2" height="2"/>
                <path id="late" d="M 5,5"/>
            </svg>"##,
        );
        let sources = out.value.source_shapes();
        assert_eq!(sources[1].id.as_deref(), Some("late"));
        assert!(out.diagnostics.contains(&Diagnostic::shape(
            1,
            Some("late".to_string()),
            DiagnosticKind::DegenerateShape
        )));
        assert!(out.diagnostics.contains(&Diagnostic::shape(2, None, DiagnosticKind::DegenerateShape)));
        assert!(sources[2].is_degenerate());
        // the defs-only path has no source index
        assert!(out
            .diagnostics
            .contains(&Diagnostic::document(DiagnosticKind::DegenerateShape)));
    }

    #[test]
    fn masks_groups_and_levels() {
        let out = read(
            r##"<svg viewBox="0 0 10 10">
                <defs>
                    <mask id="m">
                        <rect x="0" y="0" width="10" height="10" fill="white"/>
                        <g fill="black" fill-rule="evenodd">
                            <path d="M1,1 L3,1 L3,3 Z"/>
                        </g>
                        <circle cx="5" cy="5" r="1" style="fill:#ffffff" stroke="white" stroke-width="0.5"/>
                    </mask>
                </defs>
                <g mask="url(#outer)">
                    <rect x="0" y="0" width="10" height="10" mask="url(#m)" fill="#288f28"/>
                </g>
            </svg>"##,
        );
        let doc = out.value;
        let mask = doc.mask("m").unwrap();
        assert_eq!(mask.layers.len(), 3);
        assert_eq!(mask.layers[0].level, FillLevel::Included);
        assert_eq!(mask.layers[1].level, FillLevel::Excluded);
        assert_eq!(mask.layers[1].fill_rule, FillRule::EvenOdd);
        assert_eq!(mask.layers[2].level, FillLevel::Included);
        assert_eq!(mask.layers[2].stroke, Some(0.5));
        assert!(mask.layers[2].shape.attributes.is_empty());

        assert_eq!(doc.elements.len(), 1);
        assert_eq!(doc.elements[0].masks, vec!["outer".to_string(), "m".to_string()]);
        assert_eq!(doc.elements[0].shape.attribute("fill"), Some("#288f28"));
        assert!(doc.elements[0].shape.attribute("mask").is_none());
    }

    #[test]
    fn use_instantiates_defs_group_with_offset() {
        let out = read(
            r##"<svg viewBox="0 0 100 100" xmlns:xlink="http://www.w3.org/1999/xlink">
                <defs>
                    <g id="via"><circle cx="0" cy="0" r="0.5"/></g>
                    <path id="unused" d="M0,0 L1,0 L1,1 Z"/>
                </defs>
                <use xlink:href="#via" x="10" y="20"/>
                <use href="#via" x="30" y="40"/>
                <use href="#nowhere"/>
            </svg>"##,
        );
        let doc = &out.value;
        assert_eq!(doc.elements.len(), 2);
        assert_eq!(doc.elements[0].shape.geometry, Geometry::Circle { cx: 10.0, cy: 20.0, r: 0.5 });
        assert_eq!(doc.elements[1].shape.geometry, Geometry::Circle { cx: 30.0, cy: 40.0, r: 0.5 });
        assert!(out.has(|k| *k == DiagnosticKind::UnresolvedReference { href: "nowhere".into() }));
    }

    #[test]
    fn style_and_defs_pass_through_verbatim() {
        let out = read(
            r##"<svg viewBox="0 0 10 10">
                <style>.pad { fill: red; }</style>
                <defs>
                    <linearGradient id="lg"><stop offset="0" stop-color="#fff"/></linearGradient>
                    <clipPath id="c"/>
                </defs>
                <text x="1" y="1">ignored<tspan>too</tspan></text>
                <rect width="1" height="1"/>
            </svg>"##,
        );
        let doc = out.value;
        assert_eq!(
            doc.passthrough,
            vec![
                "<style>.pad { fill: red; }</style>".to_string(),
                r##"<linearGradient id="lg"><stop offset="0" stop-color="#fff"/></linearGradient>"##.to_string(),
                r#"<clipPath id="c"/>"#.to_string(),
            ]
        );
        assert_eq!(doc.elements.len(), 1);
    }

    #[test]
    fn broken_xml_is_an_error() {
        assert!(matches!(
            read_document("<svg><path d='M0,0'></svg>"),
            Err(HollowError::Xml { .. })
        ));
    }
}
