//! Size analysis of a drawing's shapes.
//!
//! Answers "where should the thinness threshold go?": how many shapes of
//! each size there are and which ones are the thinnest.

use serde::Serialize;

use crate::classify::classify;
use crate::document::Document;
use crate::policy::ClassificationPolicy;
use crate::shape::{Geometry, ShapeKind};

/// Lower edges of the histogram buckets. The last bucket is open-ended.
pub const BUCKET_EDGES: [f64; 10] = [0.0, 0.01, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0, 1.5, 2.0];

/// How many of the thinnest shapes to list.
pub const THINNEST_LIMIT: usize = 30;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub shapes: usize,
    pub valid: usize,
    pub outer: usize,
    pub inner: usize,
    pub thin: usize,
    pub degenerate: usize,
    pub connectors: usize,
}

/// Shapes whose smaller side falls in `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub min: f64,
    /// `None` for the open-ended last bucket.
    pub max: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThinShape {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: ShapeKind,
    pub min_side: f64,
    pub width: f64,
    pub height: f64,
    /// Start of the path data, or a short description for primitives.
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub totals: Totals,
    pub histogram: Vec<Bucket>,
    pub thinnest: Vec<ThinShape>,
}

/// Analyze the content shapes of `doc` under `policy`.
pub fn analyze(doc: &Document, policy: &ClassificationPolicy) -> Report {
    let shapes = doc.source_shapes();
    let c = classify(&shapes, &doc.canvas, policy);

    let totals = Totals {
        shapes: shapes.len(),
        valid: c.valid.len(),
        outer: c.outer.len(),
        inner: c.inner.len(),
        thin: c.thin.len(),
        degenerate: c.annotations.iter().filter(|a| a.degenerate).count(),
        connectors: c.connectors.len(),
    };

    let mut histogram: Vec<Bucket> = BUCKET_EDGES
        .iter()
        .enumerate()
        .map(|(i, &min)| Bucket {
            min,
            max: BUCKET_EDGES.get(i + 1).copied(),
            count: 0,
        })
        .collect();
    for a in &c.annotations {
        let side = a.dimension.min_side();
        if let Some(bucket) = histogram
            .iter_mut()
            .rev()
            .find(|b| side >= b.min)
        {
            bucket.count += 1;
        }
    }

    let mut thinnest: Vec<ThinShape> = shapes
        .iter()
        .zip(&c.annotations)
        .enumerate()
        .map(|(index, (shape, a))| ThinShape {
            index,
            id: shape.id.clone(),
            kind: shape.kind(),
            min_side: a.dimension.min_side(),
            width: a.dimension.width,
            height: a.dimension.height,
            preview: match &shape.geometry {
                Geometry::Path { data, .. } => data.chars().take(PREVIEW_CHARS).collect(),
                other => format!("{:?}", other).chars().take(PREVIEW_CHARS).collect(),
            },
        })
        .collect();
    thinnest.sort_by(|a, b| a.min_side.total_cmp(&b.min_side));
    thinnest.truncate(THINNEST_LIMIT);

    Report {
        totals,
        histogram,
        thinnest,
    }
}
