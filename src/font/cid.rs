//! Builds the `/Type0` composite font dictionary and its `/CIDFontType2`
//! descendant: font descriptor, `/W` widths array, `/FontFile2` (or
//! `/FontFile3` for CFF-flavored fonts) and `/ToUnicode` CMap stream.
//!
//! Grounded on `victor::pdf::convert::add_font`'s boilerplate for the
//! same set of dictionaries, generalized from a single hardcoded font to
//! any subset produced by [`super::subset`], and with the `ToUnicode`
//! CMap generation (there, a fixed small table) extended to chunk at 100
//! `beginbfchar` entries per PDF's limit and to widen to an ordinary
//! scalar rather than assume one UTF-16 code unit per glyph.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::error::Result;
use crate::pdf::object::dict;
use crate::pdf::writer::ObjectTable;

use super::LoadedFont;

/// Registers a font's subset and descriptor objects, returning the
/// `/Type0` object id to reference from a page's `/Font` resource dict.
pub fn embed(
    objects: &mut ObjectTable,
    font: &LoadedFont,
) -> Result<crate::pdf::writer::ObjectId> {
    let used = font.used_glyph_ids();
    let postscript_name = sanitize_postscript_name(&font.postscript_name);
    log::debug!("embedding font {:?}: {} glyph(s) used", font.alias(), used.len());

    let (file_bytes, tag, subtype) = if font.is_cff {
        // CFF-flavored fonts are embedded whole; see subset.rs's module
        // docs for why real CFF subsetting is out of scope here. They
        // still get a composite BaseFont tag, hashed from the whole
        // embedded font (there's no glyph subset to key on instead).
        let tag = super::subset::whole_font_tag(font.bytes(), &postscript_name);
        (font.bytes().to_vec(), tag, "FontFile3")
    } else {
        let subset = super::subset::subset_truetype(
            font.alias(),
            font.bytes(),
            &used,
            &postscript_name,
        )?;
        (subset.bytes, subset.tag, "FontFile2")
    };

    let base_font = if tag.is_empty() {
        postscript_name.clone()
    } else {
        format!("{}+{}", tag, postscript_name)
    };

    let font_file_extra = if subtype == "FontFile3" {
        dict! { "Subtype" => "CIDFontType0C" }
    } else {
        dict! {}
    };
    let font_file = objects.add_stream(font_file_extra, &file_bytes);

    let descriptor = objects.add_dictionary(dict! {
        "Type" => "FontDescriptor",
        "FontName" => base_font.as_str(),
        "Flags" => 4i64,
        "FontBBox" => vec![0i64, font.descender as i64, font.units_per_em as i64, font.ascender as i64],
        "ItalicAngle" => 0i64,
        "Ascent" => font.ascender as i64,
        "Descent" => font.descender as i64,
        "CapHeight" => font.cap_height as i64,
        "StemV" => 80i64,
        subtype => font_file,
    });

    let widths = width_array(font, &used);
    let descendant = objects.add_dictionary(dict! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => base_font.as_str(),
        "CIDSystemInfo" => dict! {
            "Registry" => crate::pdf::object::Object::text_string("Adobe"),
            "Ordering" => crate::pdf::object::Object::text_string("Identity"),
            "Supplement" => 0i64,
        },
        "FontDescriptor" => descriptor,
        "DW" => 1000i64,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let to_unicode = objects.add_stream(dict! {}, &to_unicode_cmap(font, &used));

    Ok(objects.add_dictionary(dict! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => base_font.as_str(),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![crate::pdf::object::Object::Reference(descendant)],
        "ToUnicode" => to_unicode,
    }))
}

/// `/W` entries grouped as `[ first [w0 w1 ...] ]` runs of consecutive
/// glyph ids, the compact form the spec favors over one triple per glyph.
fn width_array(font: &LoadedFont, used: &BTreeSet<u16>) -> Vec<crate::pdf::object::Object> {
    use crate::pdf::object::Object;

    let mut out = Vec::new();
    let mut iter = used.iter().copied().peekable();
    while let Some(first) = iter.next() {
        let mut widths = vec![Object::Int(font.advance_width_1000(first) as i64)];
        let mut last = first;
        while let Some(&next) = iter.peek() {
            if next == last + 1 {
                widths.push(Object::Int(font.advance_width_1000(next) as i64));
                last = next;
                iter.next();
            } else {
                break;
            }
        }
        out.push(Object::Int(first as i64));
        out.push(Object::Array(widths));
    }
    out
}

/// A `/ToUnicode` CMap mapping each used glyph id back to the Unicode
/// scalar(s) it renders, chunked at 100 `beginbfchar` entries (the
/// informal but widely-honored PDF limit on CMap operator batch size).
fn to_unicode_cmap(font: &LoadedFont, used: &BTreeSet<u16>) -> Vec<u8> {
    let entries: Vec<(u16, String)> = used
        .iter()
        .filter_map(|&gid| font.unicode_for_glyph(gid).map(|scalar| (gid, encode_utf16_hex(scalar))))
        .collect();

    let mut text = String::new();
    text.push_str(CMAP_HEADER);
    for chunk in entries.chunks(100) {
        let _ = writeln!(text, "{} beginbfchar", chunk.len());
        for (gid, hex) in chunk {
            let _ = writeln!(text, "<{:04X}> <{}>", gid, hex);
        }
        text.push_str("endbfchar\n");
    }
    text.push_str(CMAP_FOOTER);
    text.into_bytes()
}

fn encode_utf16_hex(scalar: u32) -> String {
    let ch = char::from_u32(scalar).unwrap_or('\u{FFFD}');
    let mut units = [0u16; 2];
    let mut out = String::new();
    for unit in ch.encode_utf16(&mut units).iter() {
        let _ = write!(out, "{:04X}", unit);
    }
    out
}

const CMAP_HEADER: &str = "/CIDInit /ProcSet findresource begin\n\
12 dict begin\n\
begincmap\n\
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
/CMapName /Adobe-Identity-UCS def\n\
/CMapType 2 def\n\
1 begincodespacerange\n\
<0000> <FFFF>\n\
endcodespacerange\n";

const CMAP_FOOTER: &str = "endcmap\n\
CMapName currentdict /CMap defineresource pop\n\
end\nend\n";

fn sanitize_postscript_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}
