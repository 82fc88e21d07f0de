//! CLI command implementations.
//!
//! This module contains the implementations for the various CLI subcommands:
//! - `invert`, `extract`, `subtract`, `run` - Region extraction stages
//! - `cut`, `paths` - Connector cleanup and path extraction
//! - `filter-thin`, `thin-lines`, `close-gaps` - Thin-shape maintenance on inversions
//! - `analyze` - Shape size report
//! - `raster`, `raster-subtract` - Occupancy bitmaps
//! - `verify` - Compare the region rasterizer against resvg

pub mod analyze;
pub mod common;
pub mod harness;
pub mod raster;
pub mod stages;

pub use analyze::cmd_analyze;
pub use common::{CliError, Settings};
pub use harness::cmd_verify;
pub use raster::{cmd_raster, cmd_raster_subtract, RasterFlags};
pub use stages::{
    cmd_close_gaps, cmd_cut, cmd_extract, cmd_filter_thin, cmd_invert, cmd_paths, cmd_run,
    cmd_subtract, cmd_thin_lines, InvertMode,
};
