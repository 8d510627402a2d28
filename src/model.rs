//! The declarative document description a caller builds and hands to
//! [`crate::render`]. Generalizes `victor::display_lists::{Document, Page}`
//! (there, a bare `Vec<Page>` with fixed dimensions) into the full tagged
//! element union spec.md §3 describes, replacing victor's dynamic
//! `DisplayItem` dispatch with one `Element` enum variant per element kind
//! (see design note in §9: "Dynamic element dispatch ... is replaced by a
//! tagged union with one case per element kind").

use std::collections::HashMap;

use crate::error::{Error, Result};

/// A length in PDF points (1/72 inch).
pub type Pt = f32;

/// An RGBA color, each component 0..=255. Alpha below 255 triggers an
/// `/ExtGState` with `/CA`/`/ca` at emission time (§4.4).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Validates a 4-tuple of raw integers, as a host-language binding would
    /// hand across before this crate's typed `Color` exists (§6: "Color
    /// tuples MUST be length-4 ... integers 0..255").
    pub fn from_components(components: &[i64]) -> Result<Color> {
        if components.len() != 4 {
            return Err(Error::InvalidColor {
                component_name: "length",
                value: components.len() as i64,
            });
        }
        let names = ["r", "g", "b", "a"];
        let mut out = [0u8; 4];
        for (i, &value) in components.iter().enumerate() {
            if !(0..=255).contains(&value) {
                return Err(Error::InvalidColor {
                    component_name: names[i],
                    value,
                });
            }
            out[i] = value as u8;
        }
        Ok(Color::new(out[0], out[1], out[2], out[3]))
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Device RGB components scaled to 0.0..=1.0, as used by `rg`/`RG`.
    pub fn rgb_f32(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn alpha_f32(&self) -> f32 {
        self.a as f32 / 255.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// PDF date string, e.g. `D:20240115120000Z`. Left as a caller-supplied
    /// string rather than a parsed type: date formatting is a host-binding
    /// concern, not core assembly (see §1's Out-of-scope list).
    pub creation_date: Option<String>,
}

/// Where a font or image resource's bytes come from. Exactly one of
/// `path`/`bytes` may be set (§3 invariant); represented here as a closed
/// enum so that invariant is enforced by construction rather than by a
/// runtime "both set" check against two `Option` fields.
#[derive(Debug, Clone)]
pub enum ResourceSource {
    Path(std::path::PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct FontResource {
    pub source: ResourceSource,
}

#[derive(Debug, Clone)]
pub struct ImageResource {
    pub source: ResourceSource,
}

#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub fonts: HashMap<String, FontResource>,
    pub images: HashMap<String, ImageResource>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VerticalAnchor {
    Baseline,
    Capline,
    Center,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoxVerticalAlign {
    Top,
    Capline,
    Center,
    Baseline,
    Bottom,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoxOuterVerticalAlign {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone)]
pub struct TextElement {
    pub x: Pt,
    pub y: Pt,
    pub text: String,
    pub font: String,
    pub size: Pt,
    pub color: Color,
    pub align: HorizontalAlign,
    pub vertical_anchor: VerticalAnchor,
}

#[derive(Debug, Clone)]
pub struct TextBoxElement {
    pub x: Pt,
    pub y: Pt,
    pub w: Pt,
    pub h: Pt,
    pub text: String,
    pub font: String,
    pub size: Pt,
    pub color: Color,
    pub text_align_x: HorizontalAlign,
    pub text_align_y: BoxVerticalAlign,
    pub box_align_x: HorizontalAlign,
    pub box_align_y: BoxOuterVerticalAlign,
    pub line_height: Pt,
}

#[derive(Debug, Clone)]
pub struct RectElement {
    pub x: Pt,
    pub y: Pt,
    pub w: Pt,
    pub h: Pt,
    pub stroke: Pt,
    pub stroke_color: Color,
    pub fill_color: Option<Color>,
    pub corner_radius: Pt,
}

#[derive(Debug, Clone)]
pub struct LineElement {
    pub x1: Pt,
    pub y1: Pt,
    pub x2: Pt,
    pub y2: Pt,
    pub stroke: Pt,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct ImageElement {
    pub x: Pt,
    pub y: Pt,
    pub w: Pt,
    pub h: Option<Pt>,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct Barcode128Element {
    pub x: Pt,
    pub y: Pt,
    pub w: Pt,
    pub h: Pt,
    pub value: String,
    pub human_readable: bool,
    pub font: Option<String>,
    pub font_size: Pt,
}

#[derive(Debug, Clone)]
pub struct QrCodeElement {
    pub x: Pt,
    pub y: Pt,
    pub size: Pt,
    pub value: String,
    pub color: Color,
    pub background: Color,
}

/// One drawable item on a page, in emission order. `emit_element` (in
/// `crate::pdf::content`) pattern-matches this directly, replacing the
/// dynamic dispatch the teacher's `DisplayItem` used (§9).
#[derive(Debug, Clone)]
pub enum Element {
    Text(TextElement),
    TextBox(TextBoxElement),
    Rect(RectElement),
    Line(LineElement),
    Image(ImageElement),
    Barcode128(Barcode128Element),
    QrCode(QrCodeElement),
}

#[derive(Debug, Clone)]
pub struct Page {
    pub width: Pt,
    pub height: Pt,
    pub background: Option<Color>,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn new(width: Pt, height: Pt) -> Self {
        Page {
            width,
            height,
            background: None,
            elements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub metadata: Metadata,
    pub pages: Vec<Page>,
    pub resources: Resources,
}

/// Options recognized by [`crate::render`] (§6). The only field today is
/// `compress`; kept as a builder-style struct (the teacher's convention for
/// small value types — see `victor::primitives::RGBA`) rather than a
/// positional argument so future options don't break call sites.
#[derive(Debug, Copy, Clone, Default)]
pub struct RenderOptions {
    pub compress: bool,
}

impl RenderOptions {
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}
