//! # PDF Assembly
//!
//! Binds captured page bitmaps into a single A4 document. Each bitmap is
//! JPEG-compressed and scaled onto its own page, so the PDF is a faithful
//! print of what the snapshot painted.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`assemble`] | Page fitting, JPEG compression, document binding |

pub mod assemble;

pub use assemble::{assemble, PdfOptions};

use chrono::{DateTime, Utc};

/// A4 portrait page width.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 portrait page height.
pub const PAGE_HEIGHT_MM: f32 = 297.0;

/// A finished PDF, ready for encoding and dispatch.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// The complete PDF file.
    pub bytes: Vec<u8>,
    /// When assembly finished.
    pub generated_at: DateTime<Utc>,
}

impl RenderedDocument {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_document_len() {
        let doc = RenderedDocument {
            bytes: vec![0x25, 0x50, 0x44, 0x46],
            generated_at: Utc::now(),
        };
        assert_eq!(doc.len(), 4);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_empty_document_reports_empty() {
        let doc = RenderedDocument {
            bytes: Vec::new(),
            generated_at: Utc::now(),
        };
        assert!(doc.is_empty());
    }
}
