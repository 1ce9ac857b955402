//! Font metrics and glyph generation for sheet painting.
//!
//! Uses the Spleen bitmap font family. Three faces cover the sheet text
//! sizes; anything larger is an integer upscale of the closest face, so
//! glyph aspect stays exactly 2:1 (height:width) at every size.

use spleen_font::{PSF2Font, FONT_12X24, FONT_6X12, FONT_8X16};

/// The three native Spleen faces used by the painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// 6×12, small print
    Small,
    /// 8×16, body text
    Body,
    /// 12×24, headings
    Large,
}

impl Face {
    pub fn char_width(&self) -> usize {
        match self {
            Face::Small => 6,
            Face::Body => 8,
            Face::Large => 12,
        }
    }

    pub fn char_height(&self) -> usize {
        match self {
            Face::Small => 12,
            Face::Body => 16,
            Face::Large => 24,
        }
    }

    fn data(&self) -> &'static [u8] {
        match self {
            Face::Small => FONT_6X12,
            Face::Body => FONT_8X16,
            Face::Large => FONT_12X24,
        }
    }
}

/// Pick the face and integer scale for a requested glyph height in pixels.
///
/// Exact multiples of a face height map cleanly (16 → Body×1, 32 → Body×2,
/// 48 → Large×2); other sizes floor to the largest fit so text never
/// overshoots its layout box.
pub fn face_for_size(size_px: f32) -> (Face, usize) {
    let px = size_px.round().max(8.0) as usize;
    for (face, h) in [(Face::Large, 24), (Face::Body, 16), (Face::Small, 12)] {
        if px >= h && px % h == 0 {
            return (face, px / h);
        }
    }
    if px >= 24 {
        (Face::Large, px / 24)
    } else if px >= 16 {
        (Face::Body, 1)
    } else {
        (Face::Small, 1)
    }
}

/// Generate a glyph bitmap for a character.
/// Returns a Vec<u8> of `char_width × char_height` where each byte is
/// 0 (off) or 1 (on).
pub fn generate_glyph(face: Face, ch: char) -> Vec<u8> {
    let w = face.char_width();
    let h = face.char_height();
    let mut glyph = vec![0u8; w * h];

    let mut spleen = PSF2Font::new(face.data()).unwrap();
    let utf8 = ch.to_string();

    if let Some(spleen_glyph) = spleen.glyph_for_utf8(utf8.as_bytes()) {
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                let idx = row_y * w + col_x;
                if idx < glyph.len() {
                    glyph[idx] = if on { 1 } else { 0 };
                }
            }
        }
    } else if let Some(fb) = fallback_glyph(ch, w, h) {
        glyph = fb;
    } else {
        draw_box(&mut glyph, w, h);
    }

    glyph
}

/// Scale a glyph bitmap by an integer factor (nearest neighbor).
pub fn scale_glyph(src: &[u8], src_w: usize, src_h: usize, factor: usize) -> Vec<u8> {
    if factor <= 1 {
        return src.to_vec();
    }
    let dst_w = src_w * factor;
    let dst_h = src_h * factor;
    let mut dst = vec![0u8; dst_w * dst_h];
    for dy in 0..dst_h {
        for dx in 0..dst_w {
            let sx = dx / factor;
            let sy = dy / factor;
            dst[dy * dst_w + dx] = src[sy * src_w + sx];
        }
    }
    dst
}

/// Draw a box outline in the glyph buffer.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}

/// Fill a rectangular region in a glyph buffer. Coordinates are clamped to bounds.
fn fill_rect(g: &mut [u8], stride: usize, x1: usize, y1: usize, x2: usize, y2: usize) {
    let h = g.len() / stride;
    for y in y1..y2.min(h) {
        for x in x1..x2.min(stride) {
            g[y * stride + x] = 1;
        }
    }
}

/// Procedurally draw fallback glyphs for characters missing from the
/// Spleen font. Returns None if the character has no fallback, falling
/// through to draw_box().
fn fallback_glyph(ch: char, w: usize, h: usize) -> Option<Vec<u8>> {
    let mut g = vec![0u8; w * h];
    let cy = h / 2;

    match ch {
        // € : a C shape with two horizontal bars through it
        '\u{20AC}' => {
            let left = w / 6;
            let right = w - w / 5;
            let top = h / 5;
            let bottom = h - h / 5;
            // spine
            fill_rect(&mut g, w, left, top, left + 2, bottom);
            // top and bottom arcs
            fill_rect(&mut g, w, left, top, right, top + 2);
            fill_rect(&mut g, w, left, bottom - 2, right, bottom);
            // the two bars
            let bar_right = w - w / 3;
            fill_rect(&mut g, w, 0, cy - 3, bar_right, cy - 1);
            fill_rect(&mut g, w, 0, cy + 1, bar_right, cy + 3);
        }

        // · : small filled square at center
        '\u{00B7}' => {
            let r = (w / 6).max(1);
            fill_rect(&mut g, w, w / 2 - r, cy - r, w / 2 + r, cy + r);
        }

        // degree sign, used in addresses ("N° ...") when the font lacks it
        '\u{00B0}' | '\u{00BA}' => {
            let r = (w / 4).max(2);
            let cx = w / 2;
            let top = h / 5 + r;
            fill_rect(&mut g, w, cx - r, top - r, cx + r, top - r + 2);
            fill_rect(&mut g, w, cx - r, top + r - 2, cx + r, top + r);
            fill_rect(&mut g, w, cx - r, top - r, cx - r + 2, top + r);
            fill_rect(&mut g, w, cx + r - 2, top - r, cx + r, top + r);
        }

        _ => return None,
    }

    Some(g)
}
