//! Produces a font subset containing only the glyphs a document's content
//! streams actually reference, by the glyph-id-preserving technique real
//! PDF producers use: glyph indices are never renumbered. Unused `glyf`
//! entries are zeroed out so `glyf`/`loca` shrink while `hmtx`/`cmap`/
//! `post`/`name` stay byte-for-byte unchanged and still agree with every
//! other glyph id in the font (§4.2's "subset's glyph indices are
//! identical to the original's").
//!
//! Grounded on `victor::fonts::cmap`'s table-record walk and
//! `victor::fonts2::parsing`'s big-endian reads, extended here to rewrite
//! rather than just read. CFF-flavored (`OTTO`) fonts are embedded whole
//! rather than glyph-subsetted (see `DESIGN.md`): a correct CFF subset
//! needs charstring-index surgery that TrueType's index-preserving
//! zero-fill trick has no equivalent for, and no crate in the retrieval
//! pack did it for us.

use std::collections::BTreeSet;

use crate::error::{Error, Result};

fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

fn i16_at(data: &[u8], offset: usize) -> i16 {
    u16_at(data, offset) as i16
}

fn font_err(alias: &str, message: &str) -> Error {
    Error::FontParse {
        alias: alias.to_string(),
        message: message.to_string(),
    }
}

struct TableDirectory {
    records: Vec<([u8; 4], u32, u32)>,
}

impl TableDirectory {
    fn parse(data: &[u8], alias: &str) -> Result<Self> {
        if data.len() < 12 {
            return Err(font_err(alias, "truncated sfnt header"));
        }
        let num_tables = u16_at(data, 4) as usize;
        let mut records = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let rec = 12 + i * 16;
            if rec + 16 > data.len() {
                return Err(font_err(alias, "truncated table directory"));
            }
            let tag = [data[rec], data[rec + 1], data[rec + 2], data[rec + 3]];
            let offset = u32_at(data, rec + 8);
            let length = u32_at(data, rec + 12);
            records.push((tag, offset, length));
        }
        Ok(TableDirectory { records })
    }

    fn find(&self, tag: &[u8; 4]) -> Option<(u32, u32)> {
        self.records.iter().find(|r| &r.0 == tag).map(|r| (r.1, r.2))
    }

    fn table<'a>(&self, data: &'a [u8], tag: &[u8; 4]) -> Option<&'a [u8]> {
        let (offset, length) = self.find(tag)?;
        data.get(offset as usize..(offset + length) as usize)
    }
}

/// Glyph indices a composite glyph references, per the `glyf` composite
/// glyph flags (no dependency on `ttf-parser` here since we need the raw
/// bytes to splice, not just the parsed shape).
fn component_glyphs(entry: &[u8]) -> Vec<u16> {
    if entry.len() < 10 {
        return Vec::new();
    }
    let number_of_contours = i16_at(entry, 0);
    if number_of_contours >= 0 {
        return Vec::new(); // simple glyph, no components
    }
    const ARG_WORDS: u16 = 0x0001;
    const HAVE_SCALE: u16 = 0x0008;
    const MORE_COMPONENTS: u16 = 0x0020;
    const HAVE_XY_SCALE: u16 = 0x0040;
    const HAVE_2X2: u16 = 0x0080;

    let mut out = Vec::new();
    let mut pos = 10usize;
    loop {
        if pos + 4 > entry.len() {
            break;
        }
        let flags = u16_at(entry, pos);
        let glyph_index = u16_at(entry, pos + 2);
        out.push(glyph_index);
        pos += 4;
        pos += if flags & ARG_WORDS != 0 { 4 } else { 2 };
        if flags & HAVE_SCALE != 0 {
            pos += 2;
        } else if flags & HAVE_XY_SCALE != 0 {
            pos += 4;
        } else if flags & HAVE_2X2 != 0 {
            pos += 8;
        }
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    out
}

fn read_loca(loca: &[u8], num_glyphs: u16, long_format: bool) -> Vec<u32> {
    let n = num_glyphs as usize + 1;
    let mut out = Vec::with_capacity(n);
    if long_format {
        for i in 0..n {
            out.push(u32_at(loca, i * 4));
        }
    } else {
        for i in 0..n {
            out.push(u16_at(loca, i * 2) as u32 * 2);
        }
    }
    out
}

pub struct Subset {
    pub bytes: Vec<u8>,
    pub tag: String,
}

/// Whether `data` is a CFF-flavored (`OTTO`) OpenType font rather than a
/// `glyf`-outline TrueType one.
pub fn is_cff_flavored(data: &[u8]) -> bool {
    data.len() >= 4 && &data[0..4] == b"OTTO"
}

pub fn subset_truetype(
    alias: &str,
    original: &[u8],
    used_glyphs: &BTreeSet<u16>,
    postscript_name: &str,
) -> Result<Subset> {
    let dir = TableDirectory::parse(original, alias)?;
    let head = dir
        .table(original, b"head")
        .ok_or_else(|| font_err(alias, "missing head table"))?;
    let maxp = dir
        .table(original, b"maxp")
        .ok_or_else(|| font_err(alias, "missing maxp table"))?;
    let loca_raw = dir
        .table(original, b"loca")
        .ok_or_else(|| font_err(alias, "missing loca table"))?;
    let glyf_raw = dir
        .table(original, b"glyf")
        .ok_or_else(|| font_err(alias, "missing glyf table"))?;

    if head.len() < 52 || maxp.len() < 6 {
        return Err(font_err(alias, "truncated head/maxp table"));
    }
    let long_format = i16_at(head, 50) != 0;
    let num_glyphs = u16_at(maxp, 4);
    let loca = read_loca(loca_raw, num_glyphs, long_format);

    let mut used: BTreeSet<u16> = used_glyphs.clone();
    used.insert(0);
    loop {
        let mut additions = Vec::new();
        for &gid in &used {
            let gid = gid as usize;
            if gid + 1 >= loca.len() {
                continue;
            }
            let (start, end) = (loca[gid] as usize, loca[gid + 1] as usize);
            if end <= start || end > glyf_raw.len() {
                continue;
            }
            for component in component_glyphs(&glyf_raw[start..end]) {
                if !used.contains(&component) {
                    additions.push(component);
                }
            }
        }
        if additions.is_empty() {
            break;
        }
        used.extend(additions);
    }

    let mut new_glyf = Vec::new();
    let mut new_loca = Vec::with_capacity(loca.len());
    for gid in 0..num_glyphs {
        new_loca.push(new_glyf.len() as u32);
        if used.contains(&gid) {
            let (start, end) = (loca[gid as usize] as usize, loca[gid as usize + 1] as usize);
            if end > start && end <= glyf_raw.len() {
                new_glyf.extend_from_slice(&glyf_raw[start..end]);
                if new_glyf.len() % 2 != 0 {
                    new_glyf.push(0);
                }
            }
        }
    }
    new_loca.push(new_glyf.len() as u32);

    let mut new_loca_bytes = Vec::new();
    if long_format {
        for &offset in &new_loca {
            new_loca_bytes.extend_from_slice(&offset.to_be_bytes());
        }
    } else {
        for &offset in &new_loca {
            new_loca_bytes.extend_from_slice(&((offset / 2) as u16).to_be_bytes());
        }
    }

    let mut tables: Vec<([u8; 4], Vec<u8>)> = Vec::with_capacity(dir.records.len());
    for &(tag, offset, length) in &dir.records {
        let bytes = if &tag == b"glyf" {
            new_glyf.clone()
        } else if &tag == b"loca" {
            new_loca_bytes.clone()
        } else {
            original[offset as usize..(offset + length) as usize].to_vec()
        };
        tables.push((tag, bytes));
    }

    let tag = subset_tag(&used, postscript_name);
    log::debug!("subset {:?}: {} glyph(s), tag {}", alias, used.len(), tag);
    Ok(Subset {
        bytes: write_sfnt(&tables),
        tag,
    })
}

fn table_checksum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    for chunk in data.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum = sum.wrapping_add(u32::from_be_bytes(word));
    }
    sum
}

fn write_sfnt(tables: &[([u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut sorted = tables.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let num_tables = sorted.len() as u16;
    let mut entry_selector = 0u16;
    while (1u16 << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;

    let header_len = 12 + 16 * sorted.len();
    let mut offsets = Vec::with_capacity(sorted.len());
    let mut cursor = header_len;
    let mut padded = Vec::with_capacity(sorted.len());
    for (tag, data) in &sorted {
        offsets.push(cursor as u32);
        let mut bytes = data.clone();
        let original_len = bytes.len() as u32;
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        cursor += bytes.len();
        padded.push((*tag, bytes, original_len));
    }

    let mut out = Vec::with_capacity(cursor);
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut head_checksum_offset = None;
    for (i, (tag, bytes, original_len)) in padded.iter().enumerate() {
        out.extend_from_slice(tag);
        out.extend_from_slice(&table_checksum(bytes).to_be_bytes());
        out.extend_from_slice(&offsets[i].to_be_bytes());
        out.extend_from_slice(&original_len.to_be_bytes());
        if tag == b"head" {
            head_checksum_offset = Some(offsets[i] as usize + 8);
        }
    }
    for (_, bytes, _) in &padded {
        out.extend_from_slice(bytes);
    }

    if let Some(offset) = head_checksum_offset {
        out[offset..offset + 4].copy_from_slice(&[0, 0, 0, 0]);
        let total = table_checksum(&out);
        let adjustment = 0xB1B0_AFBAu32.wrapping_sub(total);
        out[offset..offset + 4].copy_from_slice(&adjustment.to_be_bytes());
    }

    out
}

/// Deterministic 6-letter uppercase subset tag (e.g. `ABCDEF+Helvetica`'s
/// `ABCDEF`), hashed from the final glyph set and PostScript name with
/// FNV-1a rather than `std`'s `DefaultHasher` (unstable across Rust
/// releases, so two builds of the same document could otherwise tag the
/// same subset differently).
fn subset_tag(glyphs: &BTreeSet<u16>, postscript_name: &str) -> String {
    let mut hasher = Fnv1a::new();
    for &gid in glyphs {
        hasher.feed_bytes(&gid.to_be_bytes());
    }
    hasher.feed_bytes(postscript_name.as_bytes());
    hasher.into_tag()
}

/// Same deterministic tag scheme as [`subset_tag`], but for fonts that are
/// embedded whole rather than glyph-subsetted (CFF-flavored fonts, see
/// `cid.rs`): hashed from the full embedded font bytes and PostScript name
/// instead of a glyph-id set, since there's no subset to key on.
pub fn whole_font_tag(font_bytes: &[u8], postscript_name: &str) -> String {
    let mut hasher = Fnv1a::new();
    hasher.feed_bytes(font_bytes);
    hasher.feed_bytes(postscript_name.as_bytes());
    hasher.into_tag()
}

struct Fnv1a {
    hash: u64,
}

impl Fnv1a {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Fnv1a { hash: Self::OFFSET }
    }

    fn feed_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash ^= byte as u64;
            self.hash = self.hash.wrapping_mul(Self::PRIME);
        }
    }

    fn into_tag(self) -> String {
        let mut hash = self.hash;
        let mut letters = [b'A'; 6];
        for letter in letters.iter_mut() {
            *letter = b'A' + (hash % 26) as u8;
            hash /= 26;
        }
        String::from_utf8(letters.to_vec()).expect("ASCII uppercase letters are valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_tag_is_deterministic_and_shaped() {
        let mut glyphs = BTreeSet::new();
        glyphs.insert(0);
        glyphs.insert(12);
        glyphs.insert(57);
        let a = subset_tag(&glyphs, "Helvetica");
        let b = subset_tag(&glyphs, "Helvetica");
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert!(a.bytes().all(|byte| byte.is_ascii_uppercase()));

        let mut other = glyphs.clone();
        other.insert(99);
        assert_ne!(a, subset_tag(&other, "Helvetica"));
    }

    #[test]
    fn whole_font_tag_is_deterministic_and_differs_by_content() {
        let a = whole_font_tag(b"fake cff bytes one", "MyFont");
        let b = whole_font_tag(b"fake cff bytes one", "MyFont");
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert!(a.bytes().all(|byte| byte.is_ascii_uppercase()));
        assert_ne!(a, whole_font_tag(b"fake cff bytes two", "MyFont"));
    }

    #[test]
    fn component_glyphs_of_simple_glyph_is_empty() {
        let mut entry = vec![0u8; 10];
        entry[1] = 1; // numberOfContours = 1 (simple glyph)
        assert!(component_glyphs(&entry).is_empty());
    }
}
