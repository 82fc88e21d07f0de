//! Classification thresholds and pipeline configuration.
//!
//! Every tolerance the pipeline uses lives here as a named field. Stages
//! receive a [`ClassificationPolicy`] explicitly; nothing reads a global.
//!
//! A [`Config`] is loaded from YAML, the same way pattern recipes are:
//!
//! ```yaml
//! policy:
//!   min_dimension: 0.5
//!   boundary_margin: 0.5
//! extract:
//!   min_dimension: 0.3
//! fill: "#288f28"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostics::HollowError;
use crate::geometry::Dimension;

/// How width and height combine into "thin".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinnessRule {
    /// Thin if either side is short (catches long slivers too).
    #[default]
    Either,
    /// Thin only if both sides are short.
    Both,
}

impl ThinnessRule {
    pub fn is_thin(self, dimension: Dimension, min_dimension: f64) -> bool {
        match self {
            ThinnessRule::Either => crate::geometry::is_thin(dimension, min_dimension),
            ThinnessRule::Both => dimension.width < min_dimension && dimension.height < min_dimension,
        }
    }
}

/// Named thresholds for shape classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationPolicy {
    /// Shapes with a bounding-box side below this are thin.
    pub min_dimension: f64,
    /// Distance from a canvas edge that still counts as touching it.
    pub boundary_margin: f64,
    /// Edge length of the fixed-width connector artifact.
    pub thin_rectangle_edge_length: f64,
    /// Allowed deviation from `thin_rectangle_edge_length`.
    pub thin_rectangle_tolerance: f64,
    /// Outline width added to thin shapes when closing gaps.
    pub stroke_close_width: f64,
    /// Either/both sides for the thinness test.
    pub thinness: ThinnessRule,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            min_dimension: 0.5,
            boundary_margin: 0.5,
            thin_rectangle_edge_length: 0.4064,
            thin_rectangle_tolerance: 0.01,
            stroke_close_width: 0.5,
            thinness: ThinnessRule::Either,
        }
    }
}

impl ClassificationPolicy {
    /// Same policy with a different thinness threshold.
    pub fn with_min_dimension(mut self, min_dimension: f64) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    pub fn with_boundary_margin(mut self, margin: f64) -> Self {
        self.boundary_margin = margin;
        self
    }

    pub fn is_thin(&self, dimension: Dimension) -> bool {
        self.thinness.is_thin(dimension, self.min_dimension)
    }
}

/// Partial policy: only the fields that are set replace the base policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolicyOverride {
    #[serde(default)]
    pub min_dimension: Option<f64>,
    #[serde(default)]
    pub boundary_margin: Option<f64>,
    #[serde(default)]
    pub thin_rectangle_edge_length: Option<f64>,
    #[serde(default)]
    pub thin_rectangle_tolerance: Option<f64>,
    #[serde(default)]
    pub stroke_close_width: Option<f64>,
    #[serde(default)]
    pub thinness: Option<ThinnessRule>,
}

impl PolicyOverride {
    pub fn min_dimension(value: f64) -> Self {
        Self {
            min_dimension: Some(value),
            ..Self::default()
        }
    }

    /// Apply this override on top of `base`, preferring our values.
    pub fn merge_with(&self, base: &ClassificationPolicy) -> ClassificationPolicy {
        ClassificationPolicy {
            min_dimension: self.min_dimension.unwrap_or(base.min_dimension),
            boundary_margin: self.boundary_margin.unwrap_or(base.boundary_margin),
            thin_rectangle_edge_length: self
                .thin_rectangle_edge_length
                .unwrap_or(base.thin_rectangle_edge_length),
            thin_rectangle_tolerance: self
                .thin_rectangle_tolerance
                .unwrap_or(base.thin_rectangle_tolerance),
            stroke_close_width: self.stroke_close_width.unwrap_or(base.stroke_close_width),
            thinness: self.thinness.unwrap_or(base.thinness),
        }
    }
}

/// Raster defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Output width in pixels (None = derive from the document).
    pub width: Option<u32>,
    /// Output height in pixels (None = derive from the document).
    pub height: Option<u32>,
    /// Pixel width used for polylines, lines and outlines.
    pub stroke_width: f64,
    /// Shapes dark on a white background.
    pub invert: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            stroke_width: 2.0,
            invert: true,
        }
    }
}

/// Everything a pipeline run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base classification thresholds.
    pub policy: ClassificationPolicy,
    /// Overrides for enclosed-region extraction.
    pub extract: PolicyOverride,
    /// Overrides for finding thin lines to remove from an inversion.
    pub thin_lines: PolicyOverride,
    /// Colour of the visible region in produced documents.
    pub fill: String,
    pub raster: RasterConfig,
    /// Path data removed verbatim by `cut` (compared after normalisation).
    pub remove_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: ClassificationPolicy::default(),
            extract: PolicyOverride::min_dimension(0.3),
            thin_lines: PolicyOverride::min_dimension(1.5),
            fill: default_fill(),
            raster: RasterConfig::default(),
            remove_paths: Vec::new(),
        }
    }
}

fn default_fill() -> String {
    "#288f28".to_string()
}

impl Config {
    /// Load a config from a YAML file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, HollowError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, HollowError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Policy for enclosed-region extraction.
    pub fn extract_policy(&self) -> ClassificationPolicy {
        self.extract.merge_with(&self.policy)
    }

    /// Policy for picking thin lines out of an original document.
    pub fn thin_lines_policy(&self) -> ClassificationPolicy {
        self.thin_lines.merge_with(&self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let p = ClassificationPolicy::default();
        assert_eq!(p.min_dimension, 0.5);
        assert_eq!(p.boundary_margin, 0.5);
        assert_eq!(p.thin_rectangle_edge_length, 0.4064);
        assert_eq!(p.thin_rectangle_tolerance, 0.01);
        assert_eq!(p.thinness, ThinnessRule::Either);
    }

    #[test]
    fn both_rule_is_conjunctive() {
        let sliver = Dimension { width: 10.0, height: 0.3 };
        assert!(ThinnessRule::Either.is_thin(sliver, 0.5));
        assert!(!ThinnessRule::Both.is_thin(sliver, 0.5));
        assert!(ThinnessRule::Both.is_thin(Dimension { width: 0.2, height: 0.3 }, 0.5));
    }

    #[test]
    fn override_merges_only_set_fields() {
        let base = ClassificationPolicy::default();
        let merged = PolicyOverride::min_dimension(0.3).merge_with(&base);
        assert_eq!(merged.min_dimension, 0.3);
        assert_eq!(merged.boundary_margin, base.boundary_margin);
    }

    #[test]
    fn yaml_partial_config() {
        let config = Config::from_yaml(
            "policy:\n  boundary_margin: 1.0\n  thinness: both\nextract:\n  min_dimension: 0.25\nfill: red\n",
        )
        .unwrap();
        assert_eq!(config.policy.boundary_margin, 1.0);
        assert_eq!(config.policy.min_dimension, 0.5);
        assert_eq!(config.policy.thinness, ThinnessRule::Both);
        assert_eq!(config.extract_policy().min_dimension, 0.25);
        assert_eq!(config.extract_policy().boundary_margin, 1.0);
        // Unset sections keep their own defaults, not the base policy's
        assert_eq!(config.thin_lines_policy().min_dimension, 1.5);
        assert_eq!(config.fill, "red");
        assert_eq!(config.raster.stroke_width, 2.0);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("{}").unwrap(), Config::default());
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(matches!(Config::from_yaml("policy: [1, 2"), Err(HollowError::Config(_))));
    }
}
