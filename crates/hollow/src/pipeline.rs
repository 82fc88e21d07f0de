//! Region extraction stages.
//!
//! Every stage is a plain function: documents and a policy in, a new
//! document (plus diagnostics) out. Nothing is cached between calls, so
//! stages can be chained in any order the CLI or a caller likes.
//!
//! ## Rust Lesson #9: Borrowing In, Owning Out
//!
//! Stages take `&Document` and return a fresh `Document`. The caller keeps
//! its input untouched and can feed the same source into several stages
//! without cloning it first. Only the output is owned.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::classify::{classify, is_connector};
use crate::compose::{
    append_excluded, canvas_fill, close_gap_layers, compound_inversion, interior_mask, is_maskable,
    shape_mask, subtract_layers, INTERIOR_MASK_ID, SHAPE_MASK_ID,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Outcome};
use crate::document::{is_background, Document, FillLevel, FillRule, Mask};
use crate::path::normalize_path_data;
use crate::policy::{ClassificationPolicy, Config};
use crate::shape::{Geometry, Shape, ShapeKind};

/// A stage result that also says how many shapes it kept and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    pub document: Document,
    pub kept: usize,
    pub removed: usize,
}

// ============================================================================
// Inversion and enclosed regions
// ============================================================================

/// One diagnostic per shape in `indices` of `shapes`.
fn left_out<I>(shapes: &[Shape], indices: I, kind: fn(ShapeKind) -> DiagnosticKind) -> Vec<Diagnostic>
where
    I: IntoIterator<Item = usize>,
{
    indices
        .into_iter()
        .map(|i| Diagnostic::shape(i, shapes[i].id.clone(), kind(shapes[i].kind())))
        .collect()
}

/// Shapes a mask layer cannot represent: degenerate outlines and circles
/// without a radius.
fn unmaskable(shapes: &[Shape]) -> Vec<Diagnostic> {
    let indices = (0..shapes.len()).filter(|&i| !is_maskable(&shapes[i]));
    left_out(shapes, indices, |element| DiagnosticKind::LeftOutOfMask { element })
}

/// Everything not covered by any shape, as a canvas fill under the
/// level-1 mask.
pub fn invert(doc: &Document, fill: &str) -> Outcome<Document> {
    let shapes = doc.source_shapes();
    let mut out = doc.derive_empty();
    out.masks.push(shape_mask(&doc.canvas, &shapes));
    out.elements.push(canvas_fill(&doc.canvas, fill, &[SHAPE_MASK_ID]));
    info!("inverted {} shapes", shapes.len());
    Outcome::new(out, unmaskable(&shapes))
}

/// Like [`invert`], but thin shapes stay visible: they are left out of the
/// level-1 mask.
pub fn invert_filtered(doc: &Document, policy: &ClassificationPolicy, fill: &str) -> Outcome<Document> {
    let shapes = doc.source_shapes();
    let c = classify(&shapes, &doc.canvas, policy);
    let kept: Vec<&Shape> = shapes
        .iter()
        .enumerate()
        .filter(|(i, _)| !c.annotations[*i].is_thin)
        .map(|(_, s)| s)
        .collect();
    // Thin shapes stay out of the mask anyway.
    let unmasked = (0..shapes.len()).filter(|&i| !c.annotations[i].is_thin && !is_maskable(&shapes[i]));
    let diagnostics = left_out(&shapes, unmasked, |element| DiagnosticKind::LeftOutOfMask { element });

    let mut out = doc.derive_empty();
    out.masks.push(shape_mask(&doc.canvas, kept.iter().copied()));
    out.elements.push(canvas_fill(&doc.canvas, fill, &[SHAPE_MASK_ID]));
    info!(
        "inverted {} shapes, {} thin shapes left out",
        kept.len(),
        shapes.len() - kept.len()
    );
    Outcome::new(out, diagnostics)
}

/// Inversion as one evenodd compound path, with no masks at all.
///
/// Only paths, polygons and rects have a straight outline to contribute;
/// every other shape is left out and reported.
pub fn invert_evenodd(doc: &Document, fill: &str) -> Outcome<Document> {
    let shapes = doc.source_shapes();
    let skipped: Vec<usize> = (0..shapes.len())
        .filter(|&i| !matches!(shapes[i].kind(), ShapeKind::Path | ShapeKind::Polygon | ShapeKind::Rect))
        .collect();
    if !skipped.is_empty() {
        debug!("{} shapes without a straight outline left out of the compound path", skipped.len());
    }

    let mut out = doc.derive_empty();
    out.elements.push(compound_inversion(&doc.canvas, &shapes, fill));
    info!("inverted {} shapes into one compound path", shapes.len() - skipped.len());
    let diagnostics = left_out(&shapes, skipped, |element| DiagnosticKind::LeftOutOfCompoundPath { element });
    Outcome::new(out, diagnostics)
}

/// Gaps inside boundary-touching shapes: level 1 intersected with level 2.
pub fn extract_enclosed(doc: &Document, policy: &ClassificationPolicy, fill: &str) -> Outcome<Document> {
    let shapes = doc.source_shapes();
    let c = classify(&shapes, &doc.canvas, policy);
    let outer: Vec<&Shape> = c.outer.iter().map(|&i| &shapes[i]).collect();

    let mut out = doc.derive_empty();
    out.masks.push(shape_mask(&doc.canvas, &shapes));
    out.masks.push(interior_mask(&doc.canvas, outer.iter().copied()));
    out.elements.push(canvas_fill(
        &doc.canvas,
        fill,
        &[INTERIOR_MASK_ID, SHAPE_MASK_ID],
    ));
    info!(
        "extracted enclosed regions: {} outer shapes out of {}",
        outer.len(),
        shapes.len()
    );
    Outcome::new(out, unmaskable(&shapes))
}

// ============================================================================
// Working on inverted documents
// ============================================================================

fn missing_mask(id: &str) -> Diagnostic {
    Diagnostic::document(DiagnosticKind::MissingMaskReference { id: id.to_string() })
}

/// The level-1 mask of an inverted document. When it is missing, it is
/// rebuilt from the document's own shapes and the loss is reported.
fn level_one(doc: &Document, diagnostics: &mut Vec<Diagnostic>) -> Mask {
    match doc.mask(SHAPE_MASK_ID) {
        Some(mask) => mask.clone(),
        None => {
            warn!("no #{} mask; rebuilding it from the document's shapes", SHAPE_MASK_ID);
            diagnostics.push(missing_mask(SHAPE_MASK_ID));
            shape_mask(&doc.canvas, &doc.source_shapes())
        }
    }
}

/// `doc` with its level-1 mask swapped for `mask`.
///
/// A document without one gets the mask and a fresh canvas fill in `fill`;
/// everything else is left as it was.
fn with_level_one(doc: &Document, mask: Mask, fill: &str) -> Document {
    let mut out = doc.clone();
    match out.mask_mut(SHAPE_MASK_ID) {
        Some(existing) => *existing = mask,
        None => {
            out.elements.clear();
            out.masks.push(mask);
            out.elements.push(canvas_fill(&doc.canvas, fill, &[SHAPE_MASK_ID]));
        }
    }
    out
}

/// Remove the enclosed region of `enclosed` from an inverted document.
///
/// The region is the set of included layers of the enclosed document's
/// level-2 mask; each is added to level 1 as an evenodd exclusion.
pub fn subtract_enclosed(inverted: &Document, enclosed: &Document, fill: &str) -> Outcome<Document> {
    let mut diagnostics = Vec::new();
    let base = level_one(inverted, &mut diagnostics);

    let region: Vec<&Shape> = match enclosed.mask(INTERIOR_MASK_ID) {
        Some(mask) => mask
            .layers
            .iter()
            .filter(|l| l.level == FillLevel::Included && !is_background(&l.shape, &enclosed.canvas))
            .map(|l| &l.shape)
            .collect(),
        None => {
            warn!("no #{} mask in the enclosed document; nothing to subtract", INTERIOR_MASK_ID);
            diagnostics.push(missing_mask(INTERIOR_MASK_ID));
            Vec::new()
        }
    };

    info!("subtracting {} enclosed shapes", region.len());
    let mask = subtract_layers(&base, region.iter().copied());
    Outcome::new(with_level_one(inverted, mask, fill), diagnostics)
}

/// Drop thin shapes from level 1, so they show through the inversion.
pub fn filter_thin(inverted: &Document, policy: &ClassificationPolicy, fill: &str) -> Outcome<Filtered> {
    let mut diagnostics = Vec::new();
    let mut mask = level_one(inverted, &mut diagnostics);

    let before = mask.layers.len();
    let mut removed = 0;
    mask.layers.retain(|layer| {
        if layer.level != FillLevel::Excluded {
            return true;
        }
        let thin = layer.shape.annotate(&inverted.canvas, policy).is_thin;
        if thin {
            removed += 1;
        }
        !thin
    });
    let kept = before - removed - mask.layers.iter().filter(|l| l.level == FillLevel::Included).count();

    info!("filtered thin shapes: {} kept, {} removed", kept, removed);
    Outcome::new(
        Filtered {
            document: with_level_one(inverted, mask, fill),
            kept,
            removed,
        },
        diagnostics,
    )
}

/// Add the thin shapes of `original` to level 1 of an inverted document.
pub fn remove_thin_lines(
    inverted: &Document,
    original: &Document,
    policy: &ClassificationPolicy,
    fill: &str,
) -> Outcome<Document> {
    let mut diagnostics = Vec::new();
    let base = level_one(inverted, &mut diagnostics);

    let shapes = original.source_shapes();
    let c = classify(&shapes, &original.canvas, policy);
    let thin: Vec<&Shape> = c.thin.iter().map(|&i| &shapes[i]).collect();
    info!("removing {} thin lines from the inversion", thin.len());

    let mask = append_excluded(&base, thin.iter().copied(), FillRule::NonZero);
    Outcome::new(with_level_one(inverted, mask, fill), diagnostics)
}

/// Outline thin level-1 layers so hairline gaps close when rendered.
pub fn close_gaps(inverted: &Document, policy: &ClassificationPolicy, fill: &str) -> Outcome<Document> {
    let mut diagnostics = Vec::new();
    let base = level_one(inverted, &mut diagnostics);
    let (mask, widened) = close_gap_layers(&base, &inverted.canvas, policy);
    info!(
        "widened {} thin layers by {}",
        widened, policy.stroke_close_width
    );
    Outcome::new(with_level_one(inverted, mask, fill), diagnostics)
}

// ============================================================================
// Cleanup
// ============================================================================

fn is_cuttable(kind: ShapeKind) -> bool {
    matches!(
        kind,
        ShapeKind::Path | ShapeKind::Polygon | ShapeKind::Polyline | ShapeKind::Rect
    )
}

/// Remove connector artifacts and listed paths from the drawn elements.
///
/// Only paths, polygons, polylines and rects are kept. Masks and
/// passthrough content are copied unchanged. `removed` counts shapes
/// dropped as connectors or by `remove_paths`, not other kinds.
pub fn cut(doc: &Document, policy: &ClassificationPolicy, remove_paths: &[String]) -> Outcome<Filtered> {
    let listed: HashSet<String> = remove_paths.iter().map(|d| normalize_path_data(d)).collect();

    let mut out = doc.derive_empty();
    out.masks = doc.masks.clone();

    let mut removed = 0;
    let mut other = 0;
    for element in &doc.elements {
        let shape = &element.shape;
        if !is_cuttable(shape.kind()) {
            other += 1;
            continue;
        }
        let listed_path = matches!(
            &shape.geometry,
            Geometry::Path { data, .. } if listed.contains(&normalize_path_data(data))
        );
        if listed_path || is_connector(shape, policy) {
            removed += 1;
            continue;
        }
        out.elements.push(element.clone());
    }

    if other > 0 {
        debug!("dropped {} shapes of other kinds", other);
    }
    let kept = out.elements.len();
    info!("cut {} connectors, kept {} shapes", removed, kept);
    Outcome::clean(Filtered {
        document: out,
        kept,
        removed,
    })
}

/// Keep only the path content of a document, masks included.
pub fn extract_paths(doc: &Document) -> Outcome<Document> {
    let mut out = doc.derive_empty();
    out.masks = doc.masks.clone();
    out.elements = doc
        .source_elements()
        .into_iter()
        .filter(|e| e.shape.kind() == ShapeKind::Path)
        .collect();
    info!("extracted {} paths", out.elements.len());
    Outcome::clean(out)
}

// ============================================================================
// Full run
// ============================================================================

/// Documents produced by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub inverted: Document,
    pub enclosed: Document,
    pub subtracted: Document,
}

/// Invert, extract enclosed regions, then subtract them from the inversion.
pub fn run(doc: &Document, config: &Config) -> Outcome<RunOutput> {
    let mut diagnostics = Vec::new();

    let (inverted, d) = invert(doc, &config.fill).into_parts();
    diagnostics.extend(d);
    let (enclosed, d) = extract_enclosed(doc, &config.extract_policy(), &config.fill).into_parts();
    diagnostics.extend(d);
    let (subtracted, d) = subtract_enclosed(&inverted, &enclosed, &config.fill).into_parts();
    diagnostics.extend(d);

    Outcome::new(
        RunOutput {
            inverted,
            enclosed,
            subtracted,
        },
        diagnostics,
    )
}
