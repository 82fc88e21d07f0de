//! # hollow
//!
//! Shape classification and mask composition for vector drawings.
//!
//! Reads an SVG, sorts its shapes into boundary-touching and interior,
//! and produces documents whose masks show the inverse of the drawing or
//! the gaps enclosed by it. A span-based region engine evaluates the same
//! masks exactly, for rasterizing and checking the output.
//!
//! ## Rust Lesson #7: Modules
//!
//! Rust modules are like ES6 modules but more explicit:
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level
//!
//! Unlike Node.js, you must explicitly declare every module.

pub mod analysis;
pub mod classify;
pub mod compose;
pub mod diagnostics;
pub mod document;
pub mod emit;
pub mod geometry;
pub mod path;
pub mod pipeline;
pub mod policy;
pub mod raster;
pub mod region;
pub mod shape;
pub mod svg;

// Re-export common types at crate root for convenience.
pub use analysis::{analyze, Report};
pub use classify::{classify, Classification};
pub use compose::{INTERIOR_MASK_ID, SHAPE_MASK_ID};
pub use diagnostics::{Diagnostic, DiagnosticKind, HollowError, Outcome};
pub use document::{Document, Element, FillLevel, FillRule, Mask, MaskLayer};
pub use emit::{write_document, write_file};
pub use geometry::{BoundingBox, Canvas, Dimension, Point};
pub use path::{parse_path_data, PathData};
pub use pipeline::{
    close_gaps, cut, extract_enclosed, extract_paths, filter_thin, invert, invert_evenodd,
    invert_filtered, remove_thin_lines, run, subtract_enclosed, Filtered, RunOutput,
};
pub use policy::{ClassificationPolicy, Config, RasterConfig, ThinnessRule};
pub use raster::{render, subtract_bitmaps, Occupancy};
pub use region::{PixelGrid, Region};
pub use shape::{Annotations, Geometry, Shape, ShapeKind};
pub use svg::{read_document, read_file};
