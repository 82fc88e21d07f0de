//! Bitmap commands: rasterize a document, or subtract one rasterized
//! document from another.

use std::path::Path;

use hollow::raster::raster_size;
use hollow::{Document, RasterConfig};

use super::common::{read_svg, report, CliError, Settings};

/// Raster options given on the command line. Unset values come from the
/// config file.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct RasterFlags {
    /// Output width in pixels
    #[arg(long)]
    pub width: Option<u32>,
    /// Output height in pixels
    #[arg(long)]
    pub height: Option<u32>,
    /// Pixel width for lines and polylines
    #[arg(long)]
    pub stroke_width: Option<f64>,
    /// Write shapes white on black instead of black on white
    #[arg(long)]
    pub no_invert: bool,
}

impl RasterFlags {
    pub fn apply(&self, base: &RasterConfig) -> RasterConfig {
        RasterConfig {
            width: self.width.or(base.width),
            height: self.height.or(base.height),
            stroke_width: self.stroke_width.unwrap_or(base.stroke_width),
            invert: base.invert && !self.no_invert,
        }
    }
}

/// Raster config pinned to the size `doc` would get, so several documents
/// rasterize onto the same grid.
pub fn pinned(doc: &Document, config: &RasterConfig) -> RasterConfig {
    let (width, height) = raster_size(doc, config.width, config.height);
    RasterConfig {
        width: Some(width),
        height: Some(height),
        ..*config
    }
}

pub fn cmd_raster(input: &Path, output: &Path, flags: &RasterFlags, settings: &Settings) -> Result<(), CliError> {
    let doc = read_svg(input)?;
    let config = flags.apply(&settings.config.raster);
    let occupancy = report(hollow::render(&doc, &config)?);
    occupancy.save(output, config.invert)?;
    eprintln!(
        "Wrote: {} ({}x{}, {} pixels occupied)",
        output.display(),
        occupancy.width(),
        occupancy.height(),
        occupancy.occupied_count()
    );
    Ok(())
}

pub fn cmd_raster_subtract(
    inverted: &Path,
    enclosed: &Path,
    output: &Path,
    flags: &RasterFlags,
    settings: &Settings,
) -> Result<(), CliError> {
    let inverted = read_svg(inverted)?;
    let enclosed = read_svg(enclosed)?;
    let config = pinned(&inverted, &flags.apply(&settings.config.raster));

    let a = report(hollow::render(&inverted, &config)?);
    let b = report(hollow::render(&enclosed, &config)?);
    let out = hollow::subtract_bitmaps(&a, &b)?;
    out.save(output, config.invert)?;
    eprintln!(
        "Wrote: {} ({} - {} = {} pixels occupied)",
        output.display(),
        a.occupied_count(),
        b.occupied_count(),
        out.occupied_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hollow::Canvas;

    #[test]
    fn flags_fill_in_over_config() {
        let base = RasterConfig {
            width: Some(100),
            ..RasterConfig::default()
        };
        let flags = RasterFlags {
            height: Some(40),
            no_invert: true,
            ..RasterFlags::default()
        };
        let config = flags.apply(&base);
        assert_eq!((config.width, config.height), (Some(100), Some(40)));
        assert_eq!(config.stroke_width, 2.0);
        assert!(!config.invert);
    }

    #[test]
    fn pinned_size_follows_the_document() {
        let doc = Document::new(Canvas::new(0.0, 0.0, 300.0, 150.0));
        let config = pinned(&doc, &RasterConfig::default());
        assert_eq!((config.width, config.height), (Some(300), Some(150)));
    }
}
