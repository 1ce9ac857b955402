//! # Sheet Model
//!
//! A `Sheet` is a laid-out page: a fixed pixel area plus a list of
//! positioned elements (text runs, rules, frames, image slots). It is the
//! render target handed to the snapshot renderer, which turns it into a
//! bitmap exactly as composed.
//!
//! Dimensions use CSS-like pixels at 96dpi, so an A4 page is 794×1123.
//! Positions are in sheet pixels from the top-left corner; the snapshot
//! scale factor multiplies everything at capture time.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`compose`] | Invoice → sheets layout |
//! | [`notes`] | Markdown notes → styled lines |

pub mod compose;
pub mod notes;

pub use compose::compose;

/// A4 portrait width in sheet pixels (96dpi).
pub const A4_WIDTH_PX: u32 = 794;
/// A4 portrait height in sheet pixels (96dpi).
pub const A4_HEIGHT_PX: u32 = 1123;

/// Monospace glyph aspect ratio: every face is half as wide as tall.
const GLYPH_ASPECT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Left,
    Center,
    Right,
}

/// A single line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Anchor x position (left edge, center or right edge per `anchor`).
    pub x: f32,
    /// Top of the glyph box.
    pub y: f32,
    pub content: String,
    /// Glyph height in sheet pixels.
    pub size: f32,
    pub weight: FontWeight,
    pub anchor: TextAnchor,
    pub underline: bool,
    pub color: [u8; 3],
}

impl TextRun {
    pub fn new(x: f32, y: f32, content: impl Into<String>, size: f32) -> Self {
        Self {
            x,
            y,
            content: content.into(),
            size,
            weight: FontWeight::Regular,
            anchor: TextAnchor::Left,
            underline: false,
            color: [0, 0, 0],
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = FontWeight::Bold;
        self
    }

    pub fn underlined(mut self) -> Self {
        self.underline = true;
        self
    }

    pub fn anchored(mut self, anchor: TextAnchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn colored(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }
}

/// A horizontal rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub thickness: f32,
    pub color: [u8; 3],
}

/// A rectangular frame: optional fill, optional stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Option<[u8; 3]>,
    pub stroke: Option<[u8; 3]>,
    pub stroke_width: f32,
}

/// A slot for an image resolved at capture time (URL or data-URI).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSlot {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetElement {
    Text(TextRun),
    Rule(Rule),
    Frame(Frame),
    Image(ImageSlot),
}

/// A laid-out page awaiting capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub width: u32,
    pub height: u32,
    pub elements: Vec<SheetElement>,
}

impl Sheet {
    /// Empty A4 portrait page.
    pub fn a4() -> Self {
        Self {
            width: A4_WIDTH_PX,
            height: A4_HEIGHT_PX,
            elements: Vec::new(),
        }
    }

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    pub fn push(&mut self, element: SheetElement) {
        self.elements.push(element);
    }

    pub fn text(&mut self, run: TextRun) {
        self.elements.push(SheetElement::Text(run));
    }

    pub fn rule(&mut self, rule: Rule) {
        self.elements.push(SheetElement::Rule(rule));
    }

    pub fn frame(&mut self, frame: Frame) {
        self.elements.push(SheetElement::Frame(frame));
    }

    pub fn image(&mut self, slot: ImageSlot) {
        self.elements.push(SheetElement::Image(slot));
    }
}

/// Pixel width of a text run at a given glyph size.
///
/// Exact for the monospace faces used by the painter, which keeps
/// right/center anchoring and the painter's own measurement in agreement.
pub fn text_width(content: &str, size: f32) -> f32 {
    content.chars().count() as f32 * size * GLYPH_ASPECT
}

/// Greedy word wrap to a maximum line width in sheet pixels.
///
/// Words longer than the limit are hard-split rather than overflowing.
pub fn wrap_text(content: &str, size: f32, max_width: f32) -> Vec<String> {
    let max_chars = (max_width / (size * GLYPH_ASPECT)).floor().max(1.0) as usize;
    let mut lines = Vec::new();

    for paragraph in content.split('\n') {
        if paragraph.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed <= max_chars {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(word);
            } else {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                // hard-split oversized words
                let mut rest: Vec<char> = word.chars().collect();
                while rest.len() > max_chars {
                    lines.push(rest.drain(..max_chars).collect());
                }
                line = rest.into_iter().collect();
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
