//! Sheet → pixel painting.
//!
//! Walks a sheet's elements and rasterizes them onto an RGB canvas at a
//! given scale factor. Text uses Spleen bitmap glyphs (cached per face),
//! rules and frames are plain fills, and image slots alpha-blend their
//! resolved bitmaps over the page.

use std::collections::HashMap;

use image::{imageops::FilterType, RgbImage, RgbaImage};

use crate::sheet::{Frame, ImageSlot, Rule, Sheet, SheetElement, TextAnchor, TextRun};

use super::font::{face_for_size, generate_glyph, scale_glyph, Face};

pub struct SheetPainter {
    width: u32,
    height: u32,
    scale: f32,
    buffer: RgbImage,
    glyph_cache: HashMap<(Face, char), Vec<u8>>,
}

impl SheetPainter {
    /// Create a painter for a sheet of the given dimensions.
    ///
    /// Output pixel dimensions are the sheet dimensions × scale, rounded.
    pub fn new(sheet_width: u32, sheet_height: u32, scale: f32, background: [u8; 3]) -> Self {
        let width = ((sheet_width as f32 * scale).round() as u32).max(1);
        let height = ((sheet_height as f32 * scale).round() as u32).max(1);
        let buffer = RgbImage::from_pixel(width, height, image::Rgb(background));
        Self {
            width,
            height,
            scale,
            buffer,
            glyph_cache: HashMap::new(),
        }
    }

    /// Paint every element of the sheet, in order.
    ///
    /// `images` maps image-slot sources to their resolved bitmaps;
    /// unresolved slots are left blank.
    pub fn paint(&mut self, sheet: &Sheet, images: &HashMap<String, RgbaImage>) {
        for element in &sheet.elements {
            match element {
                SheetElement::Text(run) => self.draw_text(run),
                SheetElement::Rule(rule) => self.draw_rule(rule),
                SheetElement::Frame(frame) => self.draw_frame(frame),
                SheetElement::Image(slot) => self.draw_image(slot, images),
            }
        }
    }

    /// Consume the painter, returning the finished canvas.
    pub fn into_image(self) -> RgbImage {
        self.buffer
    }

    fn set_pixel(&mut self, x: i64, y: i64, color: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.buffer.put_pixel(x as u32, y as u32, image::Rgb(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
        let x0 = (x * self.scale).round() as i64;
        let y0 = (y * self.scale).round() as i64;
        let x1 = ((x + w) * self.scale).round() as i64;
        let y1 = ((y + h) * self.scale).round() as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.set_pixel(px, py, color);
            }
        }
    }

    // ========================================================================
    // TEXT
    // ========================================================================

    fn draw_text(&mut self, run: &TextRun) {
        if run.content.is_empty() {
            return;
        }
        let px_size = run.size * self.scale;
        let (face, factor) = face_for_size(px_size);
        let char_w = (face.char_width() * factor) as i64;
        let char_h = (face.char_height() * factor) as i64;

        let chars: Vec<char> = run.content.chars().collect();
        let total_w = chars.len() as i64 * char_w;

        let anchor_x = (run.x * self.scale).round() as i64;
        let x0 = match run.anchor {
            TextAnchor::Left => anchor_x,
            TextAnchor::Center => anchor_x - total_w / 2,
            TextAnchor::Right => anchor_x - total_w,
        };
        let y0 = (run.y * self.scale).round() as i64;

        let bold = matches!(run.weight, crate::sheet::FontWeight::Bold);
        let strike_offset = factor.max(1) as i64;

        for (i, ch) in chars.iter().enumerate() {
            if *ch == ' ' || *ch == '\u{a0}' {
                continue;
            }
            let glyph = self
                .glyph_cache
                .entry((face, *ch))
                .or_insert_with(|| generate_glyph(face, *ch))
                .clone();
            let scaled = scale_glyph(&glyph, face.char_width(), face.char_height(), factor);
            let gx = x0 + i as i64 * char_w;
            self.blit_glyph(&scaled, char_w, gx, y0, run.color);
            if bold {
                self.blit_glyph(&scaled, char_w, gx + strike_offset, y0, run.color);
            }
        }

        if run.underline {
            let thickness = factor.max(1) as i64;
            for py in (y0 + char_h + 1)..(y0 + char_h + 1 + thickness) {
                for px in x0..(x0 + total_w) {
                    self.set_pixel(px, py, run.color);
                }
            }
        }
    }

    fn blit_glyph(&mut self, glyph: &[u8], glyph_w: i64, x: i64, y: i64, color: [u8; 3]) {
        for (idx, on) in glyph.iter().enumerate() {
            if *on == 0 {
                continue;
            }
            let gx = idx as i64 % glyph_w;
            let gy = idx as i64 / glyph_w;
            self.set_pixel(x + gx, y + gy, color);
        }
    }

    // ========================================================================
    // RULES, FRAMES, IMAGES
    // ========================================================================

    fn draw_rule(&mut self, rule: &Rule) {
        self.fill_rect(rule.x, rule.y, rule.width, rule.thickness.max(0.5), rule.color);
    }

    fn draw_frame(&mut self, frame: &Frame) {
        if let Some(fill) = frame.fill {
            self.fill_rect(frame.x, frame.y, frame.width, frame.height, fill);
        }
        if let Some(stroke) = frame.stroke {
            let t = frame.stroke_width.max(0.5);
            self.fill_rect(frame.x, frame.y, frame.width, t, stroke);
            self.fill_rect(frame.x, frame.y + frame.height - t, frame.width, t, stroke);
            self.fill_rect(frame.x, frame.y, t, frame.height, stroke);
            self.fill_rect(frame.x + frame.width - t, frame.y, t, frame.height, stroke);
        }
    }

    fn draw_image(&mut self, slot: &ImageSlot, images: &HashMap<String, RgbaImage>) {
        let Some(source) = images.get(&slot.source) else {
            return;
        };
        if source.width() == 0 || source.height() == 0 {
            return;
        }

        let slot_w = (slot.width * self.scale).round().max(1.0);
        let slot_h = (slot.height * self.scale).round().max(1.0);

        // aspect-fit inside the slot, centered
        let ratio = (slot_w / source.width() as f32).min(slot_h / source.height() as f32);
        let target_w = ((source.width() as f32 * ratio).round() as u32).max(1);
        let target_h = ((source.height() as f32 * ratio).round() as u32).max(1);
        let resized = image::imageops::resize(source, target_w, target_h, FilterType::Lanczos3);

        let x0 = (slot.x * self.scale).round() as i64 + ((slot_w as i64 - target_w as i64) / 2);
        let y0 = (slot.y * self.scale).round() as i64 + ((slot_h as i64 - target_h as i64) / 2);

        for (px, py, pixel) in resized.enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            let dx = x0 + px as i64;
            let dy = y0 + py as i64;
            if dx < 0 || dy < 0 || dx >= self.width as i64 || dy >= self.height as i64 {
                continue;
            }
            let dst = self.buffer.get_pixel(dx as u32, dy as u32).0;
            let alpha = a as u32;
            let blend = |s: u8, d: u8| ((s as u32 * alpha + d as u32 * (255 - alpha)) / 255) as u8;
            self.buffer.put_pixel(
                dx as u32,
                dy as u32,
                image::Rgb([blend(r, dst[0]), blend(g, dst[1]), blend(b, dst[2])]),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{FontWeight, TextRun};

    fn blank_painter(w: u32, h: u32, scale: f32) -> SheetPainter {
        SheetPainter::new(w, h, scale, [255, 255, 255])
    }

    fn ink_count(img: &RgbImage) -> usize {
        img.pixels().filter(|p| p.0 != [255, 255, 255]).count()
    }

    #[test]
    fn test_output_dimensions_scaled() {
        let painter = blank_painter(794, 1123, 2.0);
        let img = painter.into_image();
        assert_eq!(img.dimensions(), (1588, 2246));
    }

    #[test]
    fn test_fractional_scale_rounds() {
        let painter = blank_painter(100, 100, 1.5);
        assert_eq!(painter.into_image().dimensions(), (150, 150));
    }

    #[test]
    fn test_background_opaque() {
        let img = blank_painter(50, 50, 1.0).into_image();
        assert_eq!(ink_count(&img), 0);
    }

    #[test]
    fn test_text_leaves_ink() {
        let mut sheet = Sheet::new(200, 50);
        sheet.text(TextRun::new(10.0, 10.0, "TOTAL", 16.0));
        let mut painter = blank_painter(200, 50, 1.0);
        painter.paint(&sheet, &HashMap::new());
        assert!(ink_count(&painter.into_image()) > 0);
    }

    #[test]
    fn test_bold_darker_than_regular() {
        let mut regular = Sheet::new(200, 50);
        regular.text(TextRun::new(10.0, 10.0, "TOTAL", 16.0));
        let mut bold = Sheet::new(200, 50);
        let mut run = TextRun::new(10.0, 10.0, "TOTAL", 16.0);
        run.weight = FontWeight::Bold;
        bold.text(run);

        let mut p1 = blank_painter(200, 50, 1.0);
        p1.paint(&regular, &HashMap::new());
        let mut p2 = blank_painter(200, 50, 1.0);
        p2.paint(&bold, &HashMap::new());
        assert!(ink_count(&p2.into_image()) > ink_count(&p1.into_image()));
    }

    #[test]
    fn test_right_anchor_stays_left_of_anchor_point() {
        let mut sheet = Sheet::new(200, 40);
        sheet.text(TextRun::new(190.0, 8.0, "99,00", 16.0).anchored(TextAnchor::Right));
        let mut painter = blank_painter(200, 40, 1.0);
        painter.paint(&sheet, &HashMap::new());
        let img = painter.into_image();
        // nothing painted at or right of the anchor point
        for y in 0..40 {
            for x in 190..200 {
                assert_eq!(img.get_pixel(x, y).0, [255, 255, 255]);
            }
        }
    }

    #[test]
    fn test_frame_fill_color() {
        let mut sheet = Sheet::new(100, 100);
        sheet.frame(Frame {
            x: 10.0,
            y: 10.0,
            width: 30.0,
            height: 20.0,
            fill: Some([71, 122, 12]),
            stroke: None,
            stroke_width: 0.0,
        });
        let mut painter = blank_painter(100, 100, 1.0);
        painter.paint(&sheet, &HashMap::new());
        let img = painter.into_image();
        assert_eq!(img.get_pixel(20, 15).0, [71, 122, 12]);
        assert_eq!(img.get_pixel(5, 5).0, [255, 255, 255]);
    }

    #[test]
    fn test_rule_spans_width() {
        let mut sheet = Sheet::new(100, 20);
        sheet.rule(Rule {
            x: 0.0,
            y: 10.0,
            width: 100.0,
            thickness: 2.0,
            color: [0, 0, 0],
        });
        let mut painter = blank_painter(100, 20, 2.0);
        painter.paint(&sheet, &HashMap::new());
        let img = painter.into_image();
        assert_eq!(img.get_pixel(0, 21).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(199, 21).0, [0, 0, 0]);
    }

    #[test]
    fn test_image_slot_blends_over_background() {
        let mut sheet = Sheet::new(60, 60);
        sheet.image(ImageSlot {
            x: 10.0,
            y: 10.0,
            width: 40.0,
            height: 40.0,
            source: "sig".into(),
        });
        let mut images = HashMap::new();
        images.insert(
            "sig".to_string(),
            RgbaImage::from_pixel(10, 10, image::Rgba([0, 0, 255, 255])),
        );
        let mut painter = blank_painter(60, 60, 1.0);
        painter.paint(&sheet, &images);
        let img = painter.into_image();
        assert_eq!(img.get_pixel(30, 30).0, [0, 0, 255]);
    }

    #[test]
    fn test_missing_image_leaves_slot_blank() {
        let mut sheet = Sheet::new(60, 60);
        sheet.image(ImageSlot {
            x: 10.0,
            y: 10.0,
            width: 40.0,
            height: 40.0,
            source: "https://example.com/missing.png".into(),
        });
        let mut painter = blank_painter(60, 60, 1.0);
        painter.paint(&sheet, &HashMap::new());
        assert_eq!(ink_count(&painter.into_image()), 0);
    }
}
