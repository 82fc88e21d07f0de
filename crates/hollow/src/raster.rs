//! Rasterizer: documents to occupancy bitmaps.
//!
//! Used to check produced documents by eye and by pixel count. The bitmap
//! is a single channel: a pixel is occupied when the document shows
//! anything there. Export can flip it so shapes come out dark on white.

use std::path::Path;
use std::str::FromStr;

use image::{GrayImage, ImageFormat, Luma};
use log::debug;

use crate::diagnostics::{HollowError, Outcome};
use crate::document::Document;
use crate::policy::RasterConfig;
use crate::region::{document_region, PixelGrid, Region};

/// Size used when neither the document nor the caller gives one.
pub const FALLBACK_SIZE: u32 = 1024;

/// Largest bitmap side we agree to allocate.
pub const MAX_SIDE: u32 = 16_384;

const DPI: f64 = 96.0;

/// A display length (`12mm`, `3in`, `200`) in whole pixels at 96 DPI.
///
/// Relative units (`%`, `em`) have no fixed size and give `None`.
pub fn display_pixels(value: &str) -> Option<u32> {
    use svgtypes::LengthUnit;

    let length = svgtypes::Length::from_str(value.trim()).ok()?;
    let factor = match length.unit {
        LengthUnit::None | LengthUnit::Px => 1.0,
        LengthUnit::Pt => DPI / 72.0,
        LengthUnit::Pc => DPI / 6.0,
        LengthUnit::Mm => DPI / 25.4,
        LengthUnit::Cm => DPI / 2.54,
        LengthUnit::In => DPI,
        _ => return None,
    };
    let pixels = (length.number * factor).round();
    (pixels.is_finite() && pixels >= 0.0).then_some(pixels as u32)
}

/// Output size for a document.
///
/// Explicit sizes win. Otherwise the root display size is used; a missing
/// side follows the viewport's aspect ratio. With no size at all the
/// viewport itself is used.
pub fn raster_size(doc: &Document, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let w = width.or_else(|| doc.width.as_deref().and_then(display_pixels));
    let h = height.or_else(|| doc.height.as_deref().and_then(display_pixels));
    let (vw, vh) = (doc.canvas.width, doc.canvas.height);
    let usable = vw > 0.0 && vh > 0.0;

    let round = |v: f64| v.round().max(0.0) as u32;
    let (w, h) = match (w, h) {
        (Some(w), Some(h)) => (Some(w), Some(h)),
        (None, None) if usable => (Some(round(vw)), Some(round(vh))),
        (None, Some(h)) if usable => (Some(round(h as f64 * vw / vh)), Some(h)),
        (Some(w), None) if usable => (Some(w), Some(round(w as f64 * vh / vw))),
        other => other,
    };

    (w.unwrap_or(FALLBACK_SIZE), h.unwrap_or(FALLBACK_SIZE))
}

/// A single-channel occupancy grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Occupancy {
    image: GrayImage,
}

impl Occupancy {
    pub fn from_region(region: &Region) -> Self {
        let mut image = GrayImage::new(region.width(), region.height());
        for y in 0..region.height() {
            for span in region.row(y) {
                for x in span.start..span.end {
                    image.put_pixel(x, y, Luma([255]));
                }
            }
        }
        Self { image }
    }

    /// Build from a per-pixel predicate.
    pub fn from_fn(width: u32, height: u32, mut occupied: impl FnMut(u32, u32) -> bool) -> Self {
        let image = GrayImage::from_fn(width, height, |x, y| {
            Luma([if occupied(x, y) { 255 } else { 0 }])
        });
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_occupied(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] >= 128
    }

    pub fn occupied_count(&self) -> u64 {
        self.image.pixels().filter(|p| p.0[0] >= 128).count() as u64
    }

    /// The grid as an image: occupied white on black, or with `invert`
    /// occupied black on white.
    pub fn to_image(&self, invert: bool) -> GrayImage {
        if !invert {
            return self.image.clone();
        }
        let mut out = self.image.clone();
        for p in out.pixels_mut() {
            p.0[0] = 255 - p.0[0];
        }
        out
    }

    /// Write a PNG.
    pub fn save<P: AsRef<Path>>(&self, path: P, invert: bool) -> Result<(), HollowError> {
        self.to_image(invert)
            .save_with_format(path.as_ref(), ImageFormat::Png)?;
        Ok(())
    }
}

fn check_size(width: u32, height: u32) -> Result<(), HollowError> {
    if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
        return Err(HollowError::BitmapSize { width, height });
    }
    Ok(())
}

/// Rasterize a document.
///
/// Masks are honoured, so a produced document rasterizes to what it
/// shows, not to the outlines it happens to contain.
pub fn render(doc: &Document, config: &RasterConfig) -> Result<Outcome<Occupancy>, HollowError> {
    let (width, height) = raster_size(doc, config.width, config.height);
    check_size(width, height)?;

    let grid = PixelGrid::new(&doc.canvas, width, height);
    let out = document_region(doc, &grid, config.stroke_width);
    debug!(
        "rasterized {} elements to {}x{}, {} pixels occupied",
        doc.elements.len(),
        width,
        height,
        out.value.area()
    );
    Ok(out.map(|region| Occupancy::from_region(&region)))
}

/// Occupied in `inverted` and not occupied in `enclosed`.
pub fn subtract_bitmaps(inverted: &Occupancy, enclosed: &Occupancy) -> Result<Occupancy, HollowError> {
    let left = (inverted.width(), inverted.height());
    let right = (enclosed.width(), enclosed.height());
    if left != right {
        return Err(HollowError::BitmapMismatch { left, right });
    }
    Ok(Occupancy::from_fn(left.0, left.1, |x, y| {
        inverted.is_occupied(x, y) && !enclosed.is_occupied(x, y)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use crate::geometry::Canvas;
    use crate::shape::Shape;

    #[test]
    fn display_units_at_96_dpi() {
        assert_eq!(display_pixels("200"), Some(200));
        assert_eq!(display_pixels("200px"), Some(200));
        assert_eq!(display_pixels("1in"), Some(96));
        assert_eq!(display_pixels("25.4mm"), Some(96));
        assert_eq!(display_pixels("72pt"), Some(96));
        assert_eq!(display_pixels("2.54cm"), Some(96));
        assert_eq!(display_pixels("50%"), None);
        assert_eq!(display_pixels("wide"), None);
    }

    #[test]
    fn sizing_rules() {
        let mut doc = Document::new(Canvas::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(raster_size(&doc, None, None), (200, 100));
        assert_eq!(raster_size(&doc, Some(400), None), (400, 200));
        assert_eq!(raster_size(&doc, None, Some(50)), (100, 50));
        assert_eq!(raster_size(&doc, Some(10), Some(10)), (10, 10));

        doc.width = Some("1in".to_string());
        assert_eq!(raster_size(&doc, None, None), (96, 48));
        doc.height = Some("1in".to_string());
        assert_eq!(raster_size(&doc, None, None), (96, 96));

        let empty = Document::new(Canvas::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(raster_size(&empty, None, None), (FALLBACK_SIZE, FALLBACK_SIZE));
    }

    #[test]
    fn render_and_invert() {
        let canvas = Canvas::new(0.0, 0.0, 10.0, 10.0);
        let mut doc = Document::new(canvas);
        doc.elements.push(Element::new(Shape::rect(0.0, 0.0, 5.0, 10.0)));

        let config = RasterConfig::default();
        let out = render(&doc, &config).unwrap();
        let occ = out.value;
        assert_eq!((occ.width(), occ.height()), (10, 10));
        assert_eq!(occ.occupied_count(), 50);
        assert!(occ.is_occupied(0, 0));
        assert!(!occ.is_occupied(9, 0));

        let img = occ.to_image(true);
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(9, 0).0[0], 255);
    }

    #[test]
    fn zero_size_is_an_error() {
        let doc = Document::new(Canvas::DEFAULT);
        let config = RasterConfig {
            width: Some(0),
            ..RasterConfig::default()
        };
        assert!(matches!(render(&doc, &config), Err(HollowError::BitmapSize { .. })));
    }

    #[test]
    fn bitmap_subtraction() {
        let a = Occupancy::from_fn(4, 4, |x, _| x < 3);
        let b = Occupancy::from_fn(4, 4, |x, _| x == 1);
        let out = subtract_bitmaps(&a, &b).unwrap();
        assert_eq!(out.occupied_count(), 8);
        assert!(!out.is_occupied(1, 0));

        let c = Occupancy::from_fn(3, 4, |_, _| true);
        assert!(matches!(subtract_bitmaps(&a, &c), Err(HollowError::BitmapMismatch { .. })));
    }

    #[test]
    fn png_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occ.png");
        Occupancy::from_fn(8, 8, |x, y| x == y).save(&path, false).unwrap();
        let back = image::open(&path).unwrap().to_luma8();
        assert_eq!(back.get_pixel(3, 3).0[0], 255);
        assert_eq!(back.get_pixel(3, 4).0[0], 0);
    }
}
