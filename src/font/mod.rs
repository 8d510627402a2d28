//! Font loading, glyph lookup and usage tracking.
//!
//! Grounded on `victor::fonts::cmap` (glyph lookup) and `victor::fonts2`
//! (the hand-rolled, zero-dependency generation of the same idea), but
//! reading via the `ttf-parser` crate instead of re-deriving cmap/hmtx
//! parsing by hand: the teacher wrote its own sfnt reader because no
//! suitable crate existed at the time, but `ttf-parser` is exactly that
//! crate today, and the corpus's other examples reach for an ecosystem
//! crate over hand-rolled parsing whenever one exists (§: ambient stack).
//! `subset` still reads raw table bytes directly (see its own docs) since
//! glyph-preserving subsetting needs byte-level splicing `ttf-parser`
//! doesn't expose.

pub mod cid;
pub mod subset;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use ttf_parser::{Face, GlyphId};

use crate::error::{Error, Result};

/// A parsed font resource plus the set of glyphs the document's content
/// streams have asked for so far. Parsing is immutable once done; `used`
/// is the one piece of interior-mutable state, populated during content
/// emission and read back (frozen) when the font is serialized (§4.8).
pub struct LoadedFont {
    alias: String,
    bytes: Vec<u8>,
    pub postscript_name: String,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    pub is_cff: bool,
    /// Glyph id -> the first Unicode scalar that mapped to it, recorded
    /// alongside the lookup so `/ToUnicode` never needs a reverse scan
    /// over the font's whole cmap.
    used: RefCell<BTreeMap<u16, u32>>,
}

impl LoadedFont {
    pub fn parse(alias: &str, bytes: Vec<u8>) -> Result<Self> {
        let (postscript_name, units_per_em, ascender, descender, cap_height) = {
            let face = Face::parse(&bytes, 0).map_err(|err| Error::FontParse {
                alias: alias.to_string(),
                message: err.to_string(),
            })?;
            let postscript_name = face
                .names()
                .into_iter()
                .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
                .and_then(|name| name.to_string())
                .unwrap_or_else(|| alias.to_string());
            let cap_height = face.capital_height().unwrap_or_else(|| {
                (f32::from(face.ascender()) * 0.7) as i16
            });
            (
                postscript_name,
                face.units_per_em(),
                face.ascender(),
                face.descender(),
                cap_height,
            )
        };

        if !matches!(&bytes.get(0..4), Some(b"\x00\x01\x00\x00") | Some(b"true") | Some(b"OTTO")) {
            return Err(Error::UnsupportedFontFlavor {
                alias: alias.to_string(),
            });
        }

        Ok(LoadedFont {
            alias: alias.to_string(),
            is_cff: subset::is_cff_flavored(&bytes),
            bytes,
            postscript_name,
            units_per_em,
            ascender,
            descender,
            cap_height,
            used: RefCell::new(BTreeMap::new()),
        })
    }

    fn with_face<R>(&self, f: impl FnOnce(&Face) -> R) -> R {
        let face = Face::parse(&self.bytes, 0).expect("validated in LoadedFont::parse");
        f(&face)
    }

    /// Maps one Unicode scalar value to a glyph id, recording the lookup
    /// in the usage set (missing glyphs fall back to `.notdef`, glyph 0,
    /// which is always retained anyway).
    pub fn glyph_for_char(&self, ch: char) -> u16 {
        let id = self.with_face(|face| face.glyph_index(ch)).map(|g| g.0).unwrap_or(0);
        self.used.borrow_mut().entry(id).or_insert(ch as u32);
        id
    }

    /// Glyph ids for a run of text, in iteration order. `char` already
    /// represents a combined Unicode scalar value, so surrogate pairs
    /// from a UTF-16-based caller are recombined before a `str` ever
    /// reaches this function (§9 Open Question resolution).
    pub fn to_glyph_ids(&self, text: &str) -> Vec<u16> {
        text.chars().map(|ch| self.glyph_for_char(ch)).collect()
    }

    /// Horizontal advance for one glyph, in thousandths of an em (the
    /// `/W` array's unit, and `ttf-parser`'s `glyph_hor_advance` is in
    /// font design units).
    pub fn advance_width_1000(&self, gid: u16) -> u16 {
        self.with_face(|face| {
            let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0) as f32;
            ((advance / self.units_per_em as f32) * 1000.0).round() as u16
        })
    }

    pub fn ascent_em(&self) -> f32 {
        self.ascender as f32 / self.units_per_em as f32
    }

    pub fn descent_em(&self) -> f32 {
        self.descender as f32 / self.units_per_em as f32
    }

    pub fn cap_height_em(&self) -> f32 {
        self.cap_height as f32 / self.units_per_em as f32
    }

    /// Glyph ids referenced so far, plus glyph 0 (`.notdef`), sorted and
    /// deduplicated — ready to hand to [`subset::subset_truetype`].
    pub fn used_glyph_ids(&self) -> BTreeSet<u16> {
        let mut set: BTreeSet<u16> = self.used.borrow().keys().copied().collect();
        set.insert(0);
        set
    }

    /// The Unicode scalar that first produced `gid`, if any (glyph 0 and
    /// glyphs only ever reached via a composite-glyph closure have none).
    pub fn unicode_for_glyph(&self, gid: u16) -> Option<u32> {
        self.used.borrow().get(&gid).copied()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}
