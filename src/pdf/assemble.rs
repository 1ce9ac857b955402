//! Page bitmaps → bound PDF.
//!
//! Each page bitmap is compressed to JPEG (pages are parallel-encoded,
//! compression dominates assembly time) and placed on its own A4 page,
//! scaled to fit without cropping. A tall bitmap from an overflowing
//! sheet shrinks until its full height fits the page.

use std::io::{BufWriter, Cursor};

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use printpdf::{
    ColorBits, ColorSpace, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use rayon::prelude::*;

use crate::error::FactureError;

use super::{RenderedDocument, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

// 1px == 1pt at 72 dpi
const PT_TO_MM: f32 = 0.352_777_78;
const IMAGE_DPI: f32 = 72.0;

/// Assembly settings.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// Document title, shown by PDF viewers.
    pub title: String,
    /// JPEG quality for page bitmaps, 1..=100.
    pub quality: u8,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self::print()
    }
}

impl PdfOptions {
    /// Print quality, low compression artifacts.
    pub fn print() -> Self {
        Self {
            title: "Facture".to_string(),
            quality: 95,
        }
    }

    /// Screen quality, smaller output.
    pub fn preview() -> Self {
        Self {
            title: "Facture".to_string(),
            quality: 50,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

struct EncodedPage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

/// Bind page bitmaps into a single PDF.
///
/// Pages that cannot be compressed (zero dimensions, encoder failure)
/// are skipped with a warning. An empty input, or an input where every
/// page had to be skipped, is an error.
pub fn assemble(pages: &[RgbImage], options: &PdfOptions) -> Result<RenderedDocument, FactureError> {
    if pages.is_empty() {
        return Err(FactureError::Pdf("document has no pages".to_string()));
    }

    let encoded: Vec<Result<EncodedPage, FactureError>> = pages
        .par_iter()
        .enumerate()
        .map(|(index, page)| encode_page(index, page, options.quality))
        .collect();

    let mut usable = Vec::new();
    for result in encoded {
        match result {
            Ok(page) => usable.push(page),
            Err(e) => println!("[pdf] skipping page: {}", e),
        }
    }

    if usable.is_empty() {
        return Err(FactureError::Pdf(
            "no renderable pages after compression".to_string(),
        ));
    }

    let (doc, first_page, first_layer) = PdfDocument::new(
        &options.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );

    for (i, page) in usable.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (new_page, new_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            doc.get_page(new_page).get_layer(new_layer)
        };

        let (ratio, translate_x, translate_y) = fit_on_page(page.width, page.height);

        let xobject = ImageXObject {
            width: Px(page.width as usize),
            height: Px(page.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: page.jpeg.clone(),
            image_filter: Some(ImageFilter::DCT),
            clipping_bbox: None,
            smask: None,
        };

        printpdf::Image::from(xobject).add_to_layer(
            layer,
            ImageTransform {
                translate_x: Some(Mm(translate_x)),
                translate_y: Some(Mm(translate_y)),
                scale_x: Some(ratio),
                scale_y: Some(ratio),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
    }

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(Cursor::new(&mut bytes));
        doc.save(&mut writer)
            .map_err(|e| FactureError::Pdf(format!("Failed to write PDF: {}", e)))?;
    }

    Ok(RenderedDocument {
        bytes,
        generated_at: chrono::Utc::now(),
    })
}

fn encode_page(index: usize, page: &RgbImage, quality: u8) -> Result<EncodedPage, FactureError> {
    if page.width() == 0 || page.height() == 0 {
        return Err(FactureError::Pdf(format!(
            "page {} has zero dimensions",
            index + 1
        )));
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode_image(page)
        .map_err(|e| FactureError::Image(format!("Failed to compress page {}: {}", index + 1, e)))?;

    Ok(EncodedPage {
        jpeg,
        width: page.width(),
        height: page.height(),
    })
}

/// Scale-to-fit placement on an A4 page.
///
/// Returns the scale ratio and the bottom-left translation in mm. The
/// bitmap is centered horizontally and flush with the top edge; it is
/// never cropped.
fn fit_on_page(img_width: u32, img_height: u32) -> (f32, f32, f32) {
    let width_mm = img_width as f32 * PT_TO_MM;
    let height_mm = img_height as f32 * PT_TO_MM;

    let ratio = (PAGE_WIDTH_MM / width_mm).min(PAGE_HEIGHT_MM / height_mm);

    let translate_x = (PAGE_WIDTH_MM - width_mm * ratio) / 2.0;
    let translate_y = PAGE_HEIGHT_MM - height_mm * ratio;

    (ratio, translate_x, translate_y)
}
