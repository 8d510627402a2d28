//! Content-stream emission (§4.4, §9): `emit_page` walks one page's element
//! list in input order and writes PDF drawing operators, tracking which
//! fonts, images and alpha graphics states that page's content actually
//! referenced so `assemble.rs` can build a minimal per-page resource dict.
//!
//! Grounded on `victor::pdf::convert::InProgressPage` (the `q`/`Q`-scoped
//! color and alpha state, the `op!`-style operand writing, the
//! `alpha_states` dedup cache) generalized from the teacher's single
//! alpha value and fixed `set_color`/`paint_rectangle`/`show_text` trio to
//! the full tagged `Element` union (§9: "a central `emit_element` function
//! pattern-matches and routes to the graphics emitter").

use std::collections::BTreeSet;
use std::io::Write as _;

use crate::barcode::{code128, qr};
use crate::error::{Error, Result};
use crate::font::LoadedFont;
use crate::image::LoadedImage;
use crate::model::*;
use crate::pdf::object::write_number;
use crate::text::{self, wrap};

/// Deduplicates `(CA, ca)` alpha pairs to a shared `/ExtGState` resource
/// name across the whole document (§9: "Alpha graphics state caches
/// `(CA, ca)` pairs to a name"). `None` means that channel's alpha isn't
/// constrained by this particular use, so it's left out of the dict.
pub struct GraphicsStateCache {
    states: Vec<(Option<u8>, Option<u8>, String)>,
}

impl GraphicsStateCache {
    pub fn new() -> Self {
        GraphicsStateCache { states: Vec::new() }
    }

    fn name_for(&mut self, stroke_alpha: Option<u8>, fill_alpha: Option<u8>) -> String {
        if let Some((_, _, name)) = self
            .states
            .iter()
            .find(|(s, f, _)| *s == stroke_alpha && *f == fill_alpha)
        {
            return name.clone();
        }
        let name = format!("GS{}", self.states.len());
        self.states.push((stroke_alpha, fill_alpha, name.clone()));
        name
    }

    pub fn entries(&self) -> &[(Option<u8>, Option<u8>, String)] {
        &self.states
    }
}

pub struct PageContent {
    pub bytes: Vec<u8>,
    pub fonts_used: BTreeSet<String>,
    pub images_used: BTreeSet<String>,
    pub gs_used: BTreeSet<String>,
}

struct EmitCtx<'a> {
    out: Vec<u8>,
    page_height: f32,
    fonts: &'a std::collections::HashMap<String, LoadedFont>,
    images: &'a std::collections::HashMap<String, LoadedImage>,
    gs_cache: &'a mut GraphicsStateCache,
    fonts_used: BTreeSet<String>,
    images_used: BTreeSet<String>,
    gs_used: BTreeSet<String>,
}

pub fn emit_page(
    page: &Page,
    fonts: &std::collections::HashMap<String, LoadedFont>,
    images: &std::collections::HashMap<String, LoadedImage>,
    gs_cache: &mut GraphicsStateCache,
) -> Result<PageContent> {
    let mut ctx = EmitCtx {
        out: Vec::new(),
        page_height: page.height,
        fonts,
        images,
        gs_cache,
        fonts_used: BTreeSet::new(),
        images_used: BTreeSet::new(),
        gs_used: BTreeSet::new(),
    };

    if let Some(background) = page.background {
        ctx.fill_plain_rect(0.0, 0.0, page.width, page.height, background)?;
    }
    for element in &page.elements {
        ctx.emit_element(element)?;
    }

    Ok(PageContent {
        bytes: ctx.out,
        fonts_used: ctx.fonts_used,
        images_used: ctx.images_used,
        gs_used: ctx.gs_used,
    })
}

impl<'a> EmitCtx<'a> {
    fn push(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    fn push_num(&mut self, value: f32) {
        write_number(value, &mut self.out).expect("writing to Vec is infallible");
        self.out.push(b' ');
    }

    fn push_op(&mut self, op: &[u8]) {
        self.out.extend_from_slice(op);
        self.out.push(b'\n');
    }

    fn flip_y(&self, y_user: f32) -> f32 {
        self.page_height - y_user
    }

    fn begin_alpha_scope(&mut self, fill: Option<Color>, stroke: Option<Color>) -> bool {
        let fill_alpha = fill.filter(|c| !c.is_opaque()).map(|c| c.a);
        let stroke_alpha = stroke.filter(|c| !c.is_opaque()).map(|c| c.a);
        if fill_alpha.is_none() && stroke_alpha.is_none() {
            return false;
        }
        let name = self.gs_cache.name_for(stroke_alpha, fill_alpha);
        self.gs_used.insert(name.clone());
        self.push(b"q\n");
        self.push(b"/");
        self.push(name.as_bytes());
        self.push_op(b"gs");
        true
    }

    fn end_alpha_scope(&mut self, opened: bool) {
        if opened {
            self.push(b"Q\n");
        }
    }

    fn set_fill_color(&mut self, color: Color) {
        let (r, g, b) = color.rgb_f32();
        self.push_num(r);
        self.push_num(g);
        self.push_num(b);
        self.push_op(b"rg");
    }

    fn set_stroke_color(&mut self, color: Color) {
        let (r, g, b) = color.rgb_f32();
        self.push_num(r);
        self.push_num(g);
        self.push_num(b);
        self.push_op(b"RG");
    }

    fn set_stroke_width(&mut self, width: f32) {
        self.push_num(width);
        self.push_op(b"w");
    }

    /// `x0, y0` is the rectangle's user-space top-left; `w, h` its size.
    fn fill_plain_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) -> Result<()> {
        let opened = self.begin_alpha_scope(Some(color), None);
        self.set_fill_color(color);
        self.push_num(x);
        self.push_num(self.flip_y(y + h));
        self.push_num(w);
        self.push_num(h);
        self.push_op(b"re");
        self.push_op(b"f");
        self.end_alpha_scope(opened);
        Ok(())
    }

    fn emit_element(&mut self, element: &Element) -> Result<()> {
        log::trace!("emitting element {:?}", element_kind(element));
        match element {
            Element::Text(el) => self.emit_text(el),
            Element::TextBox(el) => self.emit_textbox(el),
            Element::Rect(el) => self.emit_rect(el),
            Element::Line(el) => self.emit_line(el),
            Element::Image(el) => self.emit_image(el),
            Element::Barcode128(el) => self.emit_barcode128(el),
            Element::QrCode(el) => self.emit_qrcode(el),
        }
    }

    fn emit_text(&mut self, el: &TextElement) -> Result<()> {
        let font = self
            .fonts
            .get(&el.font)
            .ok_or_else(|| Error::UnresolvedFont { alias: el.font.clone() })?;
        self.fonts_used.insert(el.font.clone());

        let glyphs = font.to_glyph_ids(&el.text);
        let width = text::run_width(font, el.size, &glyphs);
        let metrics = text::scaled_metrics(font, el.size);
        let origin_x = text::horizontal_origin(el.x, width, el.align);
        let baseline_y = text::anchor_baseline(el.y, metrics, el.vertical_anchor);

        let opened = self.begin_alpha_scope(Some(el.color), None);
        self.set_fill_color(el.color);
        self.show_text_run(&el.font, el.size, origin_x, baseline_y, &glyphs);
        self.end_alpha_scope(opened);
        Ok(())
    }

    fn emit_textbox(&mut self, el: &TextBoxElement) -> Result<()> {
        let font = self
            .fonts
            .get(&el.font)
            .ok_or_else(|| Error::UnresolvedFont { alias: el.font.clone() })?;
        self.fonts_used.insert(el.font.clone());

        let bx = text::horizontal_origin(el.x, el.w, el.box_align_x);
        let by = box_origin_y(el.y, el.h, el.box_align_y);

        let metrics = text::scaled_metrics(font, el.size);
        let line_height = wrap::effective_line_height(el.line_height, el.size);
        let lines = wrap::wrap(font, el.size, &el.text, el.w);
        let baselines = wrap::line_baselines(lines.len(), el.h, line_height, metrics, el.text_align_y);

        let opened = self.begin_alpha_scope(Some(el.color), None);
        self.set_fill_color(el.color);
        for (line, local_baseline) in lines.iter().zip(baselines.iter()) {
            let local_x = wrap::line_x(el.w, line.width, el.text_align_x);
            self.show_text_run(&el.font, el.size, bx + local_x, by + local_baseline, &line.glyphs);
        }
        self.end_alpha_scope(opened);
        Ok(())
    }

    /// `BT ... Tf ... Td ... Tj ... ET`, assuming the fill color and any
    /// alpha scope are already set up by the caller (§4.2).
    fn show_text_run(&mut self, font_alias: &str, size: f32, x_user: f32, baseline_user: f32, glyphs: &[u16]) {
        self.push_op(b"BT");
        self.push(b"/");
        self.push(font_alias.as_bytes());
        self.push(b" ");
        self.push_num(size);
        self.push_op(b"Tf");
        self.push_num(x_user);
        self.push_num(self.flip_y(baseline_user));
        self.push_op(b"Td");
        self.push_hex_glyphs(glyphs);
        self.push_op(b"Tj");
        self.push_op(b"ET");
    }

    fn push_hex_glyphs(&mut self, glyphs: &[u16]) {
        self.out.push(b'<');
        for &gid in glyphs {
            write!(&mut self.out, "{:04X}", gid).expect("writing to Vec is infallible");
        }
        self.out.push(b'>');
        self.out.push(b' ');
    }

    fn emit_rect(&mut self, el: &RectElement) -> Result<()> {
        let has_fill = el.fill_color.is_some();
        let has_stroke = el.stroke > 0.0;
        if !has_fill && !has_stroke {
            return Ok(());
        }

        let opened = self.begin_alpha_scope(el.fill_color, Some(el.stroke_color).filter(|_| has_stroke));
        if let Some(fill) = el.fill_color {
            self.set_fill_color(fill);
        }
        if has_stroke {
            self.set_stroke_color(el.stroke_color);
            self.set_stroke_width(el.stroke);
        }

        let x0 = el.x;
        let y0_pdf = self.flip_y(el.y + el.h);
        if el.corner_radius > 0.0 {
            let r = el.corner_radius.min(el.w.min(el.h) / 2.0);
            self.push_rounded_rect_path(x0, y0_pdf, el.w, el.h, r);
        } else {
            self.push_num(x0);
            self.push_num(y0_pdf);
            self.push_num(el.w);
            self.push_num(el.h);
            self.push_op(b"re");
        }

        let op: &[u8] = match (has_fill, has_stroke) {
            (true, true) => b"B",
            (true, false) => b"f",
            (false, true) => b"S",
            (false, false) => b"n",
        };
        self.push_op(op);
        self.end_alpha_scope(opened);
        Ok(())
    }

    /// Four-Bézier rounded rectangle (§4.4), `(x0, y0)` the PDF-space
    /// bottom-left corner, drawn clockwise starting just right of the
    /// bottom-left radius.
    fn push_rounded_rect_path(&mut self, x0: f32, y0: f32, w: f32, h: f32, r: f32) {
        let k = r * (4.0 * (std::f32::consts::SQRT_2 - 1.0) / 3.0);
        let (x1, y1) = (x0 + w, y0 + h);

        self.move_to(x0 + r, y0);
        self.line_to(x1 - r, y0);
        self.curve_to(x1 - r + k, y0, x1, y0 + r - k, x1, y0 + r);
        self.line_to(x1, y1 - r);
        self.curve_to(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1);
        self.line_to(x0 + r, y1);
        self.curve_to(x0 + r - k, y1, x0, y1 - r + k, x0, y1 - r);
        self.line_to(x0, y0 + r);
        self.curve_to(x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0);
        self.push_op(b"h");
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.push_num(x);
        self.push_num(y);
        self.push_op(b"m");
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push_num(x);
        self.push_num(y);
        self.push_op(b"l");
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.push_num(x1);
        self.push_num(y1);
        self.push_num(x2);
        self.push_num(y2);
        self.push_num(x3);
        self.push_num(y3);
        self.push_op(b"c");
    }

    fn emit_line(&mut self, el: &LineElement) -> Result<()> {
        let opened = self.begin_alpha_scope(None, Some(el.color));
        self.set_stroke_color(el.color);
        self.set_stroke_width(el.stroke);
        self.move_to(el.x1, self.flip_y(el.y1));
        self.line_to(el.x2, self.flip_y(el.y2));
        self.push_op(b"S");
        self.end_alpha_scope(opened);
        Ok(())
    }

    fn emit_image(&mut self, el: &ImageElement) -> Result<()> {
        let image = self
            .images
            .get(&el.image)
            .ok_or_else(|| Error::UnresolvedImage { alias: el.image.clone() })?;
        self.images_used.insert(el.image.clone());

        let (bbox_w, bbox_h) = image_dimensions(image);
        let h = el.h.unwrap_or_else(|| el.w * (bbox_h / bbox_w));

        self.push(b"q\n");
        self.push_num(el.w);
        self.push_num(0.0);
        self.push_num(0.0);
        self.push_num(h);
        self.push_num(el.x);
        self.push_num(self.flip_y(el.y + h));
        self.push_op(b"cm");
        self.push(b"/");
        self.push(el.image.as_bytes());
        self.push_op(b"Do");
        self.push_op(b"Q");
        Ok(())
    }

    fn emit_barcode128(&mut self, el: &Barcode128Element) -> Result<()> {
        if el.human_readable && el.font.is_none() {
            return Err(Error::BarcodeMissingFont);
        }
        let symbol = code128::encode(&el.value);
        let total_modules = symbol.total_modules() as f32;
        let module_width = el.w / total_modules;

        let text_band = if el.human_readable { el.font_size * 1.3 } else { 0.0 };
        let bars_height = el.h - text_band;

        let opened = self.begin_alpha_scope(Some(Color::BLACK), None);
        self.set_fill_color(Color::BLACK);
        let mut cursor = el.x;
        for (i, &width) in symbol.widths.iter().enumerate() {
            let module_span = width as f32 * module_width;
            if i % 2 == 0 {
                self.push_num(cursor);
                self.push_num(self.flip_y(el.y + bars_height));
                self.push_num(module_span);
                self.push_num(bars_height);
                self.push_op(b"re");
                self.push_op(b"f");
            }
            cursor += module_span;
        }
        self.end_alpha_scope(opened);

        if el.human_readable {
            let font_alias = el.font.as_ref().expect("checked above");
            let font = self
                .fonts
                .get(font_alias)
                .ok_or_else(|| Error::UnresolvedFont { alias: font_alias.clone() })?;
            self.fonts_used.insert(font_alias.clone());

            let glyphs = font.to_glyph_ids(&el.value);
            let width = text::run_width(font, el.font_size, &glyphs);
            let metrics = text::scaled_metrics(font, el.font_size);
            let origin_x = text::horizontal_origin(el.x + el.w / 2.0, width, HorizontalAlign::Center);
            let baseline_y = text::anchor_baseline(el.y + bars_height + text_band / 2.0, metrics, VerticalAnchor::Center);

            let opened = self.begin_alpha_scope(Some(Color::BLACK), None);
            self.set_fill_color(Color::BLACK);
            self.show_text_run(font_alias, el.font_size, origin_x, baseline_y, &glyphs);
            self.end_alpha_scope(opened);
        }
        Ok(())
    }

    fn emit_qrcode(&mut self, el: &QrCodeElement) -> Result<()> {
        let code = qr::encode(&el.value)?;
        let module_size = el.size / code.size as f32;

        self.fill_plain_rect(el.x, el.y, el.size, el.size, el.background)?;

        let opened = self.begin_alpha_scope(Some(el.color), None);
        self.set_fill_color(el.color);
        for row in 0..code.size {
            for col in 0..code.size {
                if !code.is_dark(row, col) {
                    continue;
                }
                let module_x = el.x + col as f32 * module_size;
                let module_y = el.y + row as f32 * module_size;
                self.push_num(module_x);
                self.push_num(self.flip_y(module_y + module_size));
                self.push_num(module_size);
                self.push_num(module_size);
                self.push_op(b"re");
                self.push_op(b"f");
            }
        }
        self.end_alpha_scope(opened);
        Ok(())
    }
}

fn element_kind(element: &Element) -> &'static str {
    match element {
        Element::Text(_) => "text",
        Element::TextBox(_) => "textbox",
        Element::Rect(_) => "rect",
        Element::Line(_) => "line",
        Element::Image(_) => "image",
        Element::Barcode128(_) => "barcode128",
        Element::QrCode(_) => "qrcode",
    }
}

fn box_origin_y(y: f32, h: f32, align: BoxOuterVerticalAlign) -> f32 {
    match align {
        BoxOuterVerticalAlign::Top => y,
        BoxOuterVerticalAlign::Center => y - h / 2.0,
        BoxOuterVerticalAlign::Bottom => y - h,
    }
}

fn image_dimensions(image: &LoadedImage) -> (f32, f32) {
    match image {
        LoadedImage::Raster(raster) => (raster.width as f32, raster.height as f32),
        LoadedImage::Vector(vector) => (vector.width, vector.height),
    }
}
