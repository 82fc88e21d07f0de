//! Per-shape diagnostics and the fatal error type.
//!
//! Two separate channels:
//!
//! - [`HollowError`] is for things that stop a run: unreadable XML, I/O,
//!   a bad config file. These are returned as `Err` and bubble up with `?`.
//! - [`Diagnostic`] is for everything the pipeline shrugs off: a malformed
//!   number, a degenerate path, a mask that isn't there. These ride along
//!   with the stage result in an [`Outcome`] so callers (and tests) can
//!   inspect them instead of scraping logs.

use serde::Serialize;

use crate::shape::ShapeKind;

/// Errors that abort a run.
///
/// ## Rust Lesson #20: Error Handling
///
/// `thiserror` writes the `Display` and `std::error::Error` impls for us.
/// `#[from]` also generates a `From` impl, so `?` converts the source
/// error automatically.
#[derive(Debug, thiserror::Error)]
pub enum HollowError {
    #[error("SVG parse error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("bitmap size {width}x{height} is not usable")]
    BitmapSize { width: u32, height: u32 },

    #[error("bitmap sizes differ: {left:?} vs {right:?}")]
    BitmapMismatch { left: (u32, u32), right: (u32, u32) },
}

/// What went wrong with a shape or document, without stopping the run.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    #[error("no usable viewBox; using {width}x{height} canvas")]
    MissingViewport { width: f64, height: f64 },

    #[error("dropped malformed numeric token `{token}`")]
    MalformedNumericToken { token: String },

    #[error("fewer than two coordinate pairs; shape has no area")]
    DegenerateShape,

    #[error("unsupported path command `{command}` skipped")]
    UnsupportedPathCommand { command: char },

    #[error("mask `{id}` not found")]
    MissingMaskReference { id: String },

    #[error("`use` reference `{href}` not found")]
    UnresolvedReference { href: String },

    #[error("<{}> has no area; left out of the mask", .element.tag())]
    LeftOutOfMask { element: ShapeKind },

    #[error("<{}> has no straight outline; left out of the compound path", .element.tag())]
    LeftOutOfCompoundPath { element: ShapeKind },
}

/// Where a diagnostic applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Location {
    Document,
    Shape {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

/// One recorded outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub location: Location,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn document(kind: DiagnosticKind) -> Self {
        Self { location: Location::Document, kind }
    }

    pub fn shape(index: usize, id: Option<String>, kind: DiagnosticKind) -> Self {
        Self {
            location: Location::Shape { index, id },
            kind,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Location::Document => write!(f, "document: {}", self.kind),
            Location::Shape { index, id: Some(id) } => write!(f, "shape #{} ({}): {}", index, id, self.kind),
            Location::Shape { index, id: None } => write!(f, "shape #{}: {}", index, self.kind),
        }
    }
}

/// A stage result together with the diagnostics it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self { value, diagnostics: Vec::new() }
    }

    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Keep the diagnostics, transform the value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Split into the value and its diagnostics.
    pub fn into_parts(self) -> (T, Vec<Diagnostic>) {
        (self.value, self.diagnostics)
    }

    pub fn has(&self, pred: impl Fn(&DiagnosticKind) -> bool) -> bool {
        self.diagnostics.iter().any(|d| pred(&d.kind))
    }
}
