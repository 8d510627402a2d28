//! Generates PDF documents from a declarative, in-memory document
//! description: pages of text, wrapped text boxes, rectangles, lines,
//! images, Code-128 barcodes and QR codes, plus the font and image
//! resources they reference.
//!
//! Build a [`model::Document`], pick [`model::RenderOptions`], and call
//! [`render`] to get back a complete, standards-conformant PDF byte
//! stream. `render` is synchronous and single-threaded; it retains no
//! state between calls (§5).

mod barcode;
mod error;
mod font;
mod image;
pub mod model;
mod pdf;
mod text;

pub use error::{Error, Result};
pub use model::{Document, RenderOptions};

/// Renders `document` to a complete PDF byte stream.
///
/// The first unrecoverable condition aborts rendering; no partial output
/// is returned (§7). The one in-band recovery is glyph substitution: a
/// code point the font can't map falls back to `.notdef` rather than
/// erroring.
pub fn render(document: &Document, options: &RenderOptions) -> Result<Vec<u8>> {
    pdf::assemble::render(document, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Page, RectElement};

    #[test]
    fn empty_page_renders_a_minimal_pdf() {
        let _ = env_logger::try_init();
        let mut document = Document::default();
        document.pages.push(Page::new(612.0, 792.0));

        let bytes = render(&document, &RenderOptions::default()).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1."));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("/MediaBox [0 0 612 792]"));
        assert_eq!(text.matches("/Type /Catalog").count(), 1);
        assert_eq!(text.matches("/Type /Pages").count(), 1);
        assert_eq!(text.matches("/Count 1").count(), 1);
    }

    #[test]
    fn rect_only_page_contains_no_font_objects() {
        let mut document = Document::default();
        let mut page = Page::new(200.0, 200.0);
        page.elements.push(Element::Rect(RectElement {
            x: 10.0,
            y: 10.0,
            w: 50.0,
            h: 50.0,
            stroke: 0.0,
            stroke_color: crate::model::Color::BLACK,
            fill_color: Some(crate::model::Color::BLACK),
            corner_radius: 0.0,
        }));
        document.pages.push(page);

        let bytes = render(&document, &RenderOptions::default()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("/FontFile2"));
        assert!(text.contains("re"));
    }

    #[test]
    fn negative_page_width_is_rejected() {
        let mut document = Document::default();
        document.pages.push(Page::new(-10.0, 100.0));
        assert!(render(&document, &RenderOptions::default()).is_err());
    }
}
