//! Integration tests exercising whole-document rendering end to end,
//! asserting on structural substrings/counts in the returned byte stream
//! rather than parsing it back with a PDF reader (no such crate is in the
//! dependency graph, and round-tripping through one would just test the
//! reader, not this renderer).

use pagesmith::model::{
    Barcode128Element, Color, Document, Element, ImageElement, ImageResource, LineElement, Page,
    QrCodeElement, RectElement, Resources, ResourceSource,
};
use pagesmith::{render, RenderOptions};

/// The smallest valid PNG: an 8-bit RGBA 1x1 transparent pixel. A known,
/// widely reproduced constant rather than a hand-built fixture, so its
/// bytes aren't a fresh source of bugs the way a hand-assembled image
/// would be.
const TINY_PNG: &[u8] = &[
    137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82, 0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0,
    0, 0, 31, 21, 196, 137, 0, 0, 0, 13, 73, 68, 65, 84, 120, 218, 99, 100, 248, 15, 0, 1, 5, 1, 1,
    39, 24, 227, 102, 0, 0, 0, 0, 73, 69, 78, 68, 174, 66, 96, 130,
];

const TINY_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
<path d="M0 0 L10 0 L10 10 L0 10 Z" fill="#ff0000"/>
</svg>"#;

/// S1: an empty page still produces a complete, well-formed file.
#[test]
fn empty_page_renders_a_complete_pdf() {
    let mut document = Document::default();
    document.pages.push(Page::new(612.0, 792.0));

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.starts_with("%PDF-1."));
    assert!(text.trim_end().ends_with("%%EOF"));
    assert!(text.contains("trailer"));
    assert!(text.contains("/Root"));
}

/// S3: a multi-page document gets one page object per page and a page
/// tree whose `/Count` matches.
#[test]
fn multi_page_document_has_matching_page_count() {
    let mut document = Document::default();
    for _ in 0..3 {
        document.pages.push(Page::new(200.0, 300.0));
    }

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert_eq!(
        text.matches("/Type /Page ").count(),
        3,
        "expected exactly 3 leaf /Page objects"
    );
    assert!(text.contains("/Count 3"));
}

/// Rects and lines need no font or image resource at all.
#[test]
fn rect_and_line_only_page_has_no_resources() {
    let mut document = Document::default();
    let mut page = Page::new(200.0, 200.0);
    page.elements.push(Element::Rect(RectElement {
        x: 10.0,
        y: 10.0,
        w: 50.0,
        h: 50.0,
        stroke: 2.0,
        stroke_color: Color::BLACK,
        fill_color: Some(Color::new(200, 0, 0, 255)),
        corner_radius: 5.0,
    }));
    page.elements.push(Element::Line(LineElement {
        x1: 0.0,
        y1: 0.0,
        x2: 100.0,
        y2: 100.0,
        stroke: 1.0,
        color: Color::BLACK,
    }));
    document.pages.push(page);

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(!text.contains("/FontFile2"));
    assert!(!text.contains("/Type0"));
    assert!(text.contains(" re"));
    assert!(text.contains(" B\n"));
}

/// S4 (raster): a page referencing a PNG resource gets a JPEG-backed
/// `/Image` XObject with a `/DCTDecode` filter, not the PNG bytes as-is
/// (the renderer re-encodes every raster source to JPEG, per its image
/// handling).
#[test]
fn raster_image_embeds_as_dct_image_xobject() {
    let mut document = Document::default();
    document.resources.images.insert(
        "logo".to_string(),
        ImageResource {
            source: ResourceSource::Bytes(TINY_PNG.to_vec()),
        },
    );
    let mut page = Page::new(100.0, 100.0);
    page.elements.push(Element::Image(ImageElement {
        x: 0.0,
        y: 0.0,
        w: 50.0,
        h: None,
        image: "logo".to_string(),
    }));
    document.pages.push(page);

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.contains("/Subtype /Image"));
    assert!(text.contains("/DCTDecode"));
    assert!(text.contains("/Do"));
}

/// S5 (vector): an SVG resource becomes a Form XObject, not an Image one.
#[test]
fn svg_image_embeds_as_form_xobject() {
    let mut document = Document::default();
    document.resources.images.insert(
        "mark".to_string(),
        ImageResource {
            source: ResourceSource::Bytes(TINY_SVG.as_bytes().to_vec()),
        },
    );
    let mut page = Page::new(100.0, 100.0);
    page.elements.push(Element::Image(ImageElement {
        x: 0.0,
        y: 0.0,
        w: 40.0,
        h: Some(40.0),
        image: "mark".to_string(),
    }));
    document.pages.push(page);

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.contains("/Subtype /Form"));
    assert!(!text.contains("/DCTDecode"));
    assert!(text.contains("/Do"));
}

/// Code-128 without `human_readable` needs no font and still produces a
/// bar pattern sized from the encoded value's module count.
#[test]
fn barcode_without_human_readable_text_needs_no_font() {
    let mut document = Document::default();
    let mut page = Page::new(300.0, 150.0);
    page.elements.push(Element::Barcode128(Barcode128Element {
        x: 10.0,
        y: 10.0,
        w: 200.0,
        h: 60.0,
        value: "PAGESMITH-42".to_string(),
        human_readable: false,
        font: None,
        font_size: 10.0,
    }));
    document.pages.push(page);

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(!text.contains("/Type0"));
    assert!(text.contains(" f\n"));
}

/// Requesting human-readable text under a barcode with no font configured
/// is rejected rather than silently skipping the caption.
#[test]
fn barcode_human_readable_without_font_is_rejected() {
    let mut document = Document::default();
    let mut page = Page::new(300.0, 150.0);
    page.elements.push(Element::Barcode128(Barcode128Element {
        x: 10.0,
        y: 10.0,
        w: 200.0,
        h: 60.0,
        value: "42".to_string(),
        human_readable: true,
        font: None,
        font_size: 10.0,
    }));
    document.pages.push(page);

    assert!(render(&document, &RenderOptions::default()).is_err());
}

/// QR codes fill their square with the background color and draw dark
/// modules in the foreground color, with no font dependency either.
#[test]
fn qr_code_renders_without_font_resources() {
    let mut document = Document::default();
    let mut page = Page::new(150.0, 150.0);
    page.elements.push(Element::QrCode(QrCodeElement {
        x: 10.0,
        y: 10.0,
        size: 100.0,
        value: "https://example.invalid/x".to_string(),
        color: Color::BLACK,
        background: Color::WHITE,
    }));
    document.pages.push(page);

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(!text.contains("/Type0"));
    assert!(text.contains(" re"));
}

/// An empty QR value is rejected rather than encoded as an empty payload.
#[test]
fn empty_qr_value_is_rejected() {
    let mut document = Document::default();
    let mut page = Page::new(100.0, 100.0);
    page.elements.push(Element::QrCode(QrCodeElement {
        x: 0.0,
        y: 0.0,
        size: 50.0,
        value: String::new(),
        color: Color::BLACK,
        background: Color::WHITE,
    }));
    document.pages.push(page);

    assert!(render(&document, &RenderOptions::default()).is_err());
}

/// S7: compression shrinks the output and swaps in `/FlateDecode` content
/// streams; the uncompressed build has neither.
#[test]
fn compression_shrinks_output_and_adds_flate_filter() {
    let build = |compress: bool| {
        let mut document = Document::default();
        document.resources.images.insert(
            "mark".to_string(),
            ImageResource {
                source: ResourceSource::Bytes(TINY_SVG.as_bytes().to_vec()),
            },
        );
        let mut page = Page::new(400.0, 400.0);
        for i in 0..20 {
            page.elements.push(Element::Rect(RectElement {
                x: i as f32 * 10.0,
                y: i as f32 * 10.0,
                w: 30.0,
                h: 30.0,
                stroke: 1.0,
                stroke_color: Color::BLACK,
                fill_color: Some(Color::new(10, 20, 30, 255)),
                corner_radius: 0.0,
            }));
        }
        page.elements.push(Element::Image(ImageElement {
            x: 0.0,
            y: 0.0,
            w: 40.0,
            h: Some(40.0),
            image: "mark".to_string(),
        }));
        document.pages.push(page);
        render(&document, &RenderOptions::default().with_compress(compress)).unwrap()
    };

    let plain = build(false);
    let compressed = build(true);

    assert!(!String::from_utf8_lossy(&plain).contains("/FlateDecode"));
    assert!(String::from_utf8_lossy(&compressed).contains("/FlateDecode"));
    assert!(compressed.len() < plain.len());
}

/// Resources can be declared and simply never referenced by any element;
/// unused entries are not an error and don't appear in any page's content.
#[test]
fn unused_resources_are_harmless() {
    let mut resources = Resources::default();
    resources.images.insert(
        "unused".to_string(),
        ImageResource {
            source: ResourceSource::Bytes(TINY_PNG.to_vec()),
        },
    );
    let mut document = Document::default();
    document.resources = resources;
    document.pages.push(Page::new(100.0, 100.0));

    let bytes = render(&document, &RenderOptions::default());
    assert!(bytes.is_ok());
}

/// Metadata fields surface as a `/Info` dictionary with text strings.
#[test]
fn metadata_populates_info_dictionary() {
    let mut document = Document::default();
    document.metadata.title = Some("Quarterly Report".to_string());
    document.metadata.author = Some("Finance".to_string());
    document.pages.push(Page::new(612.0, 792.0));

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.contains("/Title"));
    assert!(text.contains("Quarterly Report"));
    assert!(text.contains("/Author"));
}

/// A document with no metadata set at all doesn't emit a spurious empty
/// `/Info` dictionary.
#[test]
fn no_metadata_means_no_info_dictionary() {
    let mut document = Document::default();
    document.pages.push(Page::new(612.0, 792.0));

    let bytes = render(&document, &RenderOptions::default()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(!text.contains("/Title"));
    assert!(!text.contains("/Info"));
}

/// A page whose dimensions aren't finite positive numbers is rejected
/// before any content is emitted.
#[test]
fn non_finite_page_size_is_rejected() {
    let mut document = Document::default();
    document.pages.push(Page::new(f32::NAN, 100.0));
    assert!(render(&document, &RenderOptions::default()).is_err());

    let mut document = Document::default();
    document.pages.push(Page::new(100.0, 0.0));
    assert!(render(&document, &RenderOptions::default()).is_err());
}

/// Referencing an image alias that was never declared in `resources`
/// fails with the unresolved-reference error rather than panicking.
#[test]
fn unresolved_image_alias_is_an_error() {
    let mut document = Document::default();
    let mut page = Page::new(100.0, 100.0);
    page.elements.push(Element::Image(ImageElement {
        x: 0.0,
        y: 0.0,
        w: 10.0,
        h: Some(10.0),
        image: "does-not-exist".to_string(),
    }));
    document.pages.push(page);

    assert!(render(&document, &RenderOptions::default()).is_err());
}
