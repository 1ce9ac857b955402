//! # Sheet Snapshots
//!
//! Turns composed sheets into pixel bitmaps. A snapshot is the bridge
//! between layout and PDF assembly: each sheet becomes one page image,
//! captured at a configurable scale over an opaque background so the
//! result embeds cleanly regardless of what the sheet painted.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`font`] | Spleen bitmap faces, glyph generation and scaling |
//! | [`painter`] | Element-by-element rasterization onto an RGB canvas |
//! | [`resolve`] | Data-URI decoding and HTTP download of slot images |

pub mod font;
pub mod painter;
pub mod resolve;

pub use painter::SheetPainter;
pub use resolve::AssetResolver;

use std::collections::HashMap;

use image::{RgbImage, RgbaImage};

use crate::error::FactureError;
use crate::sheet::Sheet;

/// Capture settings.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotOptions {
    /// Output pixels per sheet pixel.
    pub scale: f32,
    /// Opaque fill behind every element.
    pub background: [u8; 3],
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: [255, 255, 255],
        }
    }
}

impl SnapshotOptions {
    /// Print-quality capture at twice the sheet resolution.
    pub fn print() -> Self {
        Self::default()
    }

    /// Screen preview at native sheet resolution.
    pub fn preview() -> Self {
        Self {
            scale: 1.0,
            ..Self::default()
        }
    }
}

/// Capture a sheet as an RGB bitmap.
///
/// Output dimensions are the sheet dimensions multiplied by the scale
/// factor, rounded to whole pixels. Image slots wait up to
/// [`resolve::IMAGE_WAIT`] each; slow or broken sources are skipped so
/// a capture never hangs on a missing signature.
pub async fn capture(
    sheet: &Sheet,
    options: SnapshotOptions,
    resolver: &AssetResolver,
) -> Result<RgbImage, FactureError> {
    // Reject before resolving so a degenerate sheet never waits on the
    // image timeout.
    ensure_renderable(sheet)?;
    let images = resolver.resolve_sheet(sheet).await;
    rasterize(sheet, options, &images)
}

/// Paint a sheet whose image slots are already resolved.
///
/// This is the CPU-heavy half of [`capture`], split out so callers on an
/// async runtime can run it inside `spawn_blocking`.
pub fn rasterize(
    sheet: &Sheet,
    options: SnapshotOptions,
    images: &HashMap<String, RgbaImage>,
) -> Result<RgbImage, FactureError> {
    ensure_renderable(sheet)?;

    let mut painter = SheetPainter::new(
        sheet.width,
        sheet.height,
        options.scale,
        options.background,
    );
    painter.paint(sheet, images);

    Ok(painter.into_image())
}

fn ensure_renderable(sheet: &Sheet) -> Result<(), FactureError> {
    if sheet.width == 0 || sheet.height == 0 {
        return Err(FactureError::TargetNotFound(format!(
            "sheet has no renderable area ({}x{})",
            sheet.width, sheet.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::TextRun;
    use std::time::Instant;

    #[tokio::test]
    async fn test_capture_dimensions_follow_scale() {
        let mut sheet = Sheet::a4();
        sheet.text(TextRun::new(40.0, 40.0, "FACTURE", 32.0));
        let resolver = AssetResolver::new();

        let print = capture(&sheet, SnapshotOptions::print(), &resolver)
            .await
            .unwrap();
        assert_eq!(print.dimensions(), (1588, 2246));

        let preview = capture(&sheet, SnapshotOptions::preview(), &resolver)
            .await
            .unwrap();
        assert_eq!(preview.dimensions(), (794, 1123));
    }

    #[tokio::test]
    async fn test_zero_width_sheet_fails_fast() {
        let sheet = Sheet::new(0, 500);
        let resolver = AssetResolver::new();
        let started = Instant::now();
        let result = capture(&sheet, SnapshotOptions::default(), &resolver).await;
        assert!(matches!(result, Err(FactureError::TargetNotFound(_))));
        assert!(started.elapsed().as_millis() < 100);
    }

    #[tokio::test]
    async fn test_zero_height_sheet_fails_fast() {
        let sheet = Sheet::new(794, 0);
        let resolver = AssetResolver::new();
        let result = capture(&sheet, SnapshotOptions::default(), &resolver).await;
        assert!(matches!(result, Err(FactureError::TargetNotFound(_))));
    }

    #[tokio::test]
    async fn test_background_is_opaque_white() {
        let sheet = Sheet::new(20, 20);
        let resolver = AssetResolver::new();
        let img = capture(&sheet, SnapshotOptions::preview(), &resolver)
            .await
            .unwrap();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_rasterize_without_resolver() {
        let mut sheet = Sheet::new(100, 60);
        sheet.text(TextRun::new(10.0, 10.0, "OK", 16.0));
        let img = rasterize(&sheet, SnapshotOptions::preview(), &HashMap::new()).unwrap();
        assert_eq!(img.dimensions(), (100, 60));
        assert!(img.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[tokio::test]
    async fn test_fractional_scale_rounds_dimensions() {
        let sheet = Sheet::new(101, 77);
        let resolver = AssetResolver::new();
        let options = SnapshotOptions {
            scale: 1.5,
            ..SnapshotOptions::default()
        };
        let img = capture(&sheet, options, &resolver).await.unwrap();
        // 101 * 1.5 = 151.5 rounds to 152, 77 * 1.5 = 115.5 rounds to 116
        assert_eq!(img.dimensions(), (152, 116));
    }
}
