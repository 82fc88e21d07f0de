//! Verification harness: compare the region rasterizer against resvg.
//!
//! The same document is rendered twice, once by [`hollow::render`] and
//! once by resvg thresholded on alpha. Where they disagree, either the
//! document uses something the region engine skips (curves, transforms)
//! or one of the two has a bug.

use std::fs;
use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};
use resvg::usvg;
use serde::Serialize;
use tiny_skia::Pixmap;

use hollow::{Occupancy, RasterConfig};

use super::common::{report, CliError};
use super::raster::pinned;

/// Alpha at or above which a resvg pixel counts as occupied.
const ALPHA_THRESHOLD: u8 = 128;

/// Agreement below this fails the check.
const PASS_PERCENT: f64 = 99.0;

/// Pixel agreement between the two renderers.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AgreementResult {
    pub width: u32,
    pub height: u32,
    /// Pixels occupied by the region rasterizer
    pub region_pixels: u64,
    /// Pixels occupied by resvg
    pub reference_pixels: u64,
    /// Pixels occupied only by the region rasterizer
    pub only_region: u64,
    /// Pixels occupied only by resvg
    pub only_reference: u64,
    /// Share of all pixels where both agree (0-100)
    pub agreement_percent: f64,
    pub ok: bool,
}

/// Verify JSON output
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub svg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_image: Option<String>,
    pub result: AgreementResult,
}

/// Compare two occupancy grids of the same size.
pub fn compare(region: &Occupancy, reference: &Occupancy) -> AgreementResult {
    let (width, height) = (region.width(), region.height());

    let mut region_pixels = 0;
    let mut reference_pixels = 0;
    let mut only_region = 0;
    let mut only_reference = 0;

    for y in 0..height {
        for x in 0..width {
            let a = region.is_occupied(x, y);
            let b = reference.is_occupied(x, y);
            region_pixels += a as u64;
            reference_pixels += b as u64;
            match (a, b) {
                (true, false) => only_region += 1,
                (false, true) => only_reference += 1,
                _ => {}
            }
        }
    }

    let total = width as u64 * height as u64;
    let agreement_percent = if total > 0 {
        (total - only_region - only_reference) as f64 / total as f64 * 100.0
    } else {
        100.0
    };

    AgreementResult {
        width,
        height,
        region_pixels,
        reference_pixels,
        only_region,
        only_reference,
        agreement_percent,
        ok: agreement_percent >= PASS_PERCENT,
    }
}

/// Diff image of two occupancy grids.
/// - Blue = both occupied
/// - Green = region rasterizer only
/// - Red = resvg only
/// - White = neither
pub fn generate_diff_image(region: &Occupancy, reference: &Occupancy) -> DynamicImage {
    let blue = Rgba([0, 100, 255, 255]);
    let green = Rgba([0, 200, 0, 255]);
    let red = Rgba([255, 0, 0, 255]);
    let white = Rgba([255, 255, 255, 255]);

    let diff = RgbaImage::from_fn(region.width(), region.height(), |x, y| {
        match (region.is_occupied(x, y), reference.is_occupied(x, y)) {
            (true, true) => blue,
            (true, false) => green,
            (false, true) => red,
            (false, false) => white,
        }
    });
    DynamicImage::ImageRgba8(diff)
}

/// Render SVG text with resvg onto a `width` x `height` grid, stretched to
/// fill it, and threshold on alpha.
pub fn render_reference(svg: &str, width: u32, height: u32) -> Result<Occupancy, String> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| e.to_string())?;
    let mut pixmap = Pixmap::new(width, height).ok_or("could not create pixmap")?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let pixels = pixmap.pixels();
    Ok(Occupancy::from_fn(width, height, |x, y| {
        pixels[(y * width + x) as usize].alpha() >= ALPHA_THRESHOLD
    }))
}

pub fn cmd_verify(input: &Path, config: &RasterConfig, diff: Option<&Path>) -> Result<(), CliError> {
    eprintln!("Loading: {}", input.display());
    let content = fs::read_to_string(input)?;
    let doc = report(hollow::read_document(&content)?);
    let config = pinned(&doc, config);

    let region = report(hollow::render(&doc, &config)?);
    let reference = render_reference(&content, region.width(), region.height()).map_err(|message| {
        CliError::Render {
            path: input.display().to_string(),
            message,
        }
    })?;

    let result = compare(&region, &reference);
    eprintln!(
        "Agreement: {:.2}% ({} region-only, {} resvg-only pixels) {}",
        result.agreement_percent,
        result.only_region,
        result.only_reference,
        if result.ok { "OK" } else { "MISMATCH" }
    );

    let diff_image = match diff {
        Some(path) => {
            generate_diff_image(&region, &reference)
                .save(path)
                .map_err(hollow::HollowError::from)?;
            eprintln!("Wrote: {}", path.display());
            Some(path.display().to_string())
        }
        None => None,
    };

    let out = VerifyReport {
        svg: input.display().to_string(),
        diff_image,
        result,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agreement_counts_each_side() {
        let a = Occupancy::from_fn(10, 10, |x, _| x < 5);
        let b = Occupancy::from_fn(10, 10, |x, _| x < 6);
        let r = compare(&a, &b);
        assert_eq!(r.region_pixels, 50);
        assert_eq!(r.reference_pixels, 60);
        assert_eq!(r.only_region, 0);
        assert_eq!(r.only_reference, 10);
        assert_eq!(r.agreement_percent, 90.0);
        assert!(!r.ok);
    }

    #[test]
    fn diff_colours() {
        let a = Occupancy::from_fn(2, 1, |x, _| x == 0);
        let b = Occupancy::from_fn(2, 1, |_, _| true);
        let img = generate_diff_image(&a, &b).to_rgba8();
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 100, 255, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn resvg_agrees_on_aligned_rects() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" width="100" height="100">
            <rect x="0" y="0" width="50" height="100" fill="black"/>
        </svg>"#;
        let doc = hollow::read_document(svg).unwrap().value;
        let config = RasterConfig::default();
        let region = hollow::render(&doc, &config).unwrap().value;
        let reference = render_reference(svg, 100, 100).unwrap();
        let r = compare(&region, &reference);
        assert_eq!(r.region_pixels, 5000);
        assert!(r.ok, "agreement {}", r.agreement_percent);
    }
}
