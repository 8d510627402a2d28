//! QR code encoding (§4.7): byte mode, quartile error correction,
//! automatic version selection, mask selection by penalty score,
//! rendered as a square bit matrix.
//!
//! Scope: versions 1-4, the range in which quartile-level error
//! correction splits data into at most two *equal*-sized Reed-Solomon
//! blocks (version 5 and up mix differently-sized block groups within
//! the same symbol, a second axis of bookkeeping this crate doesn't
//! carry). `encode` picks the smallest of these four versions whose
//! byte-mode capacity fits the value; payloads past version 4's ~46-byte
//! quartile capacity raise [`Error::QrValueTooLong`].

use crate::error::{Error, Result};

/// One entry per supported version: module count per side, total data
/// codewords (pre error-correction), and how those codewords split into
/// equal-sized Reed-Solomon blocks at quartile error correction.
struct VersionSpec {
    version: u32,
    size: usize,
    data_codewords: usize,
    ec_codewords_total: usize,
    num_blocks: usize,
    /// Alignment pattern center coordinate along each axis, `None` for
    /// version 1 which has no alignment pattern at all.
    alignment_center: Option<usize>,
}

const VERSIONS: [VersionSpec; 4] = [
    VersionSpec { version: 1, size: 21, data_codewords: 13, ec_codewords_total: 13, num_blocks: 1, alignment_center: None },
    VersionSpec { version: 2, size: 25, data_codewords: 22, ec_codewords_total: 22, num_blocks: 1, alignment_center: Some(18) },
    VersionSpec { version: 3, size: 29, data_codewords: 34, ec_codewords_total: 36, num_blocks: 2, alignment_center: Some(22) },
    VersionSpec { version: 4, size: 33, data_codewords: 48, ec_codewords_total: 52, num_blocks: 2, alignment_center: Some(26) },
];

/// Usable byte-mode payload capacity for a version: total data codewords
/// minus the 4-bit mode indicator, 8-bit character count (versions 1-9
/// use an 8-bit length field), rounded down to whole bytes.
fn byte_capacity(spec: &VersionSpec) -> usize {
    (spec.data_codewords * 8 - 12) / 8
}

pub struct QrCode {
    pub size: usize,
    /// Row-major, `true` meaning a dark module.
    pub modules: Vec<bool>,
}

impl QrCode {
    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.modules[row * self.size + col]
    }
}

pub fn encode(value: &str) -> Result<QrCode> {
    if value.is_empty() {
        return Err(Error::EmptyQrValue);
    }
    let bytes = value.as_bytes();

    let spec = VERSIONS
        .iter()
        .find(|spec| bytes.len() <= byte_capacity(spec))
        .ok_or_else(|| Error::QrValueTooLong {
            max_bytes: byte_capacity(VERSIONS.last().unwrap()),
            actual_bytes: bytes.len(),
        })?;

    let data = build_data_codewords(spec, bytes);
    let codewords = interleave_with_error_correction(spec, &data);

    let mut bits = Vec::with_capacity(codewords.len() * 8);
    for byte in &codewords {
        for bit in (0..8).rev() {
            bits.push((byte >> bit) & 1 == 1);
        }
    }

    let mut matrix = Matrix::new(spec);
    matrix.place_function_patterns();
    matrix.place_data(&bits);

    let mask = matrix.choose_mask();
    matrix.apply_mask(mask);
    matrix.place_format_info(mask);

    Ok(QrCode {
        size: spec.size,
        modules: matrix.dark,
    })
}

fn build_data_codewords(spec: &VersionSpec, bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(spec.data_codewords * 8);
    push_bits(&mut bits, 0b0100, 4); // byte mode indicator
    push_bits(&mut bits, bytes.len() as u32, 8); // character count (v1-9)
    for &byte in bytes {
        push_bits(&mut bits, byte as u32, 8);
    }

    let capacity_bits = spec.data_codewords * 8;
    let terminator_len = (capacity_bits - bits.len()).min(4);
    push_bits(&mut bits, 0, terminator_len);
    while bits.len() % 8 != 0 {
        bits.push(false);
    }

    let mut codewords: Vec<u8> = bits
        .chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8))
        .collect();

    let pad = [0xECu8, 0x11u8];
    let mut i = 0;
    while codewords.len() < spec.data_codewords {
        codewords.push(pad[i % 2]);
        i += 1;
    }
    codewords
}

fn push_bits(bits: &mut Vec<bool>, value: u32, count: usize) {
    for i in (0..count).rev() {
        bits.push((value >> i) & 1 == 1);
    }
}

/// Splits `data` into `spec.num_blocks` equal-sized chunks, Reed-Solomon
/// encodes each independently, then interleaves data codewords
/// round-robin across blocks followed by error-correction codewords
/// round-robin across blocks — the standard's codeword ordering for a
/// symbol whose blocks are all the same size.
fn interleave_with_error_correction(spec: &VersionSpec, data: &[u8]) -> Vec<u8> {
    let data_per_block = spec.data_codewords / spec.num_blocks;
    let ec_per_block = spec.ec_codewords_total / spec.num_blocks;
    let blocks: Vec<&[u8]> = data.chunks(data_per_block).collect();
    let ec_blocks: Vec<Vec<u8>> = blocks.iter().map(|block| reed_solomon(block, ec_per_block)).collect();

    let mut out = Vec::with_capacity(spec.data_codewords + spec.ec_codewords_total);
    for i in 0..data_per_block {
        for block in &blocks {
            out.push(block[i]);
        }
    }
    for i in 0..ec_per_block {
        for ec in &ec_blocks {
            out.push(ec[i]);
        }
    }
    out
}

// --- GF(256) Reed-Solomon, primitive polynomial x^8+x^4+x^3+x^2+1 (0x11D) ---

fn gf_tables() -> ([u8; 256], [u8; 256]) {
    let mut exp = [0u8; 256];
    let mut log = [0u8; 256];
    let mut x = 1u16;
    for i in 0..255usize {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= 0x11D;
        }
    }
    exp[255] = exp[0];
    (exp, log)
}

fn gf_mul(a: u8, b: u8, exp: &[u8; 256], log: &[u8; 256]) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let sum = log[a as usize] as u16 + log[b as usize] as u16;
    exp[(sum % 255) as usize]
}

fn reed_solomon(data: &[u8], ec_len: usize) -> Vec<u8> {
    let (exp, log) = gf_tables();

    // Generator polynomial: product of (x - alpha^i) for i in 0..ec_len.
    let mut generator = vec![1u8];
    for i in 0..ec_len {
        let root = exp[i % 255];
        let mut next = vec![0u8; generator.len() + 1];
        for (j, &coeff) in generator.iter().enumerate() {
            next[j] ^= gf_mul(coeff, root, &exp, &log);
            next[j + 1] ^= coeff;
        }
        generator = next;
    }

    let mut remainder = data.to_vec();
    remainder.resize(data.len() + ec_len, 0);
    for i in 0..data.len() {
        let factor = remainder[i];
        if factor == 0 {
            continue;
        }
        for (j, &g) in generator.iter().enumerate() {
            remainder[i + j] ^= gf_mul(g, factor, &exp, &log);
        }
    }
    remainder[data.len()..].to_vec()
}

// --- Matrix construction ---

struct Matrix {
    size: usize,
    version: u32,
    alignment_center: Option<usize>,
    dark: Vec<bool>,
    reserved: Vec<bool>,
}

impl Matrix {
    fn new(spec: &VersionSpec) -> Self {
        Matrix {
            size: spec.size,
            version: spec.version,
            alignment_center: spec.alignment_center,
            dark: vec![false; spec.size * spec.size],
            reserved: vec![false; spec.size * spec.size],
        }
    }

    fn idx(&self, r: usize, c: usize) -> usize {
        r * self.size + c
    }

    fn set(&mut self, r: usize, c: usize, dark: bool) {
        let i = self.idx(r, c);
        self.dark[i] = dark;
        self.reserved[i] = true;
    }

    fn reserve(&mut self, r: usize, c: usize) {
        let i = self.idx(r, c);
        self.reserved[i] = true;
    }

    fn place_finder(&mut self, top: i32, left: i32) {
        for dr in -1i32..=7 {
            for dc in -1i32..=7 {
                let r = top + dr;
                let c = left + dc;
                if r < 0 || c < 0 || r as usize >= self.size || c as usize >= self.size {
                    continue;
                }
                let dark = (0..7).contains(&dr)
                    && (0..7).contains(&dc)
                    && (dr == 0 || dr == 6 || dc == 0 || dc == 6 || ((2..=4).contains(&dr) && (2..=4).contains(&dc)));
                self.set(r as usize, c as usize, dark);
            }
        }
    }

    fn place_alignment(&mut self, center: usize) {
        for dr in -2i32..=2 {
            for dc in -2i32..=2 {
                let r = (center as i32 + dr) as usize;
                let c = (center as i32 + dc) as usize;
                let dark = dr == -2 || dr == 2 || dc == -2 || dc == 2 || (dr == 0 && dc == 0);
                self.set(r, c, dark);
            }
        }
    }

    fn place_function_patterns(&mut self) {
        self.place_finder(0, 0);
        self.place_finder(0, self.size as i32 - 7);
        self.place_finder(self.size as i32 - 7, 0);

        if let Some(center) = self.alignment_center {
            self.place_alignment(center);
        }

        for i in 8..self.size - 8 {
            let dark = i % 2 == 0;
            self.set(6, i, dark);
            self.set(i, 6, dark);
        }

        self.set(4 * self.version as usize + 9, 8, true); // dark module

        for i in 0..9 {
            if i != 6 {
                self.reserve(8, i);
                self.reserve(i, 8);
            }
        }
        for i in 0..8 {
            self.reserve(8, self.size - 1 - i);
        }
        for i in 0..7 {
            self.reserve(self.size - 1 - i, 8);
        }
    }

    fn place_data(&mut self, bits: &[bool]) {
        let mut bit_iter = bits.iter();
        let mut upward = true;
        let mut col = self.size as isize - 1;
        while col > 0 {
            if col == 6 {
                col -= 1;
            }
            let rows: Vec<usize> = if upward { (0..self.size).rev().collect() } else { (0..self.size).collect() };
            for r in rows {
                for &c in &[col as usize, col as usize - 1] {
                    let i = self.idx(r, c);
                    if !self.reserved[i] {
                        let bit = bit_iter.next().copied().unwrap_or(false);
                        self.set(r, c, bit);
                    }
                }
            }
            upward = !upward;
            col -= 2;
        }
    }

    fn mask_condition(mask: u8, r: usize, c: usize) -> bool {
        let (r, c) = (r as i64, c as i64);
        match mask {
            0 => (r + c) % 2 == 0,
            1 => r % 2 == 0,
            2 => c % 3 == 0,
            3 => (r + c) % 3 == 0,
            4 => (r / 2 + c / 3) % 2 == 0,
            5 => (r * c) % 2 + (r * c) % 3 == 0,
            6 => ((r * c) % 2 + (r * c) % 3) % 2 == 0,
            _ => ((r + c) % 2 + (r * c) % 3) % 2 == 0,
        }
    }

    fn apply_mask(&mut self, mask: u8) {
        for r in 0..self.size {
            for c in 0..self.size {
                if self.is_data_module(r, c) && Self::mask_condition(mask, r, c) {
                    let i = self.idx(r, c);
                    self.dark[i] = !self.dark[i];
                }
            }
        }
    }

    /// A module counts as data if it falls outside every finder,
    /// alignment, separator, timing, dark-module and format-info region
    /// — the mask must never touch those (`place_function_patterns` and
    /// `place_data` already mark every non-data cell `reserved`, so
    /// position alone is what distinguishes them here).
    fn is_data_module(&self, r: usize, c: usize) -> bool {
        !self.is_function_position(r, c)
    }

    fn is_function_position(&self, r: usize, c: usize) -> bool {
        let in_finder = |top: i32, left: i32| {
            let r = r as i32 - top;
            let c = c as i32 - left;
            (-1..=7).contains(&r) && (-1..=7).contains(&c)
        };
        if in_finder(0, 0) || in_finder(0, self.size as i32 - 7) || in_finder(self.size as i32 - 7, 0) {
            return true;
        }
        if let Some(center) = self.alignment_center {
            let dr = r as i32 - center as i32;
            let dc = c as i32 - center as i32;
            if (-2..=2).contains(&dr) && (-2..=2).contains(&dc) {
                return true;
            }
        }
        if r == 6 || c == 6 {
            return true;
        }
        if r == 4 * self.version as usize + 9 && c == 8 {
            return true;
        }
        let near_format = (r < 9 && c < 9) || (r < 9 && c >= self.size - 8) || (r >= self.size - 7 && c < 9);
        near_format
    }

    fn penalty(&self) -> u32 {
        let mut score = 0u32;

        // Rule 1: runs of 5+ same-color modules, per row and column.
        for r in 0..self.size {
            score += run_penalty((0..self.size).map(|c| self.dark[self.idx(r, c)]));
        }
        for c in 0..self.size {
            score += run_penalty((0..self.size).map(|r| self.dark[self.idx(r, c)]));
        }

        // Rule 2: 2x2 blocks of one color.
        for r in 0..self.size - 1 {
            for c in 0..self.size - 1 {
                let v = self.dark[self.idx(r, c)];
                if self.dark[self.idx(r, c + 1)] == v
                    && self.dark[self.idx(r + 1, c)] == v
                    && self.dark[self.idx(r + 1, c + 1)] == v
                {
                    score += 3;
                }
            }
        }

        // Rule 3: finder-like 1:1:3:1:1 run, light-padded, in rows/cols.
        for r in 0..self.size {
            score += finder_pattern_penalty((0..self.size).map(|c| self.dark[self.idx(r, c)]));
        }
        for c in 0..self.size {
            score += finder_pattern_penalty((0..self.size).map(|r| self.dark[self.idx(r, c)]));
        }

        // Rule 4: deviation of dark-module percentage from 50%.
        let dark_count = self.dark.iter().filter(|&&d| d).count();
        let percent = dark_count * 100 / (self.size * self.size);
        let deviation = percent.abs_diff(50);
        score += (deviation / 5) as u32 * 10;

        score
    }

    fn choose_mask(&mut self) -> u8 {
        let unmasked = self.dark.clone();
        let mut best = (0u8, u32::MAX);
        for mask in 0..8u8 {
            self.dark = unmasked.clone();
            self.apply_mask(mask);
            let score = self.penalty();
            if score < best.1 {
                best = (mask, score);
            }
        }
        self.dark = unmasked;
        best.0
    }

    fn place_format_info(&mut self, mask: u8) {
        const EC_QUARTILE: u16 = 0b11;
        let format_data = (EC_QUARTILE << 3) | mask as u16;
        let bits = bch_format_bits(format_data);
        let size = self.size;

        // Around the top-left finder.
        for i in 0..6 {
            self.set(i, 8, (bits >> i) & 1 == 1);
        }
        self.set(7, 8, (bits >> 6) & 1 == 1);
        self.set(8, 8, (bits >> 7) & 1 == 1);
        self.set(8, 7, (bits >> 8) & 1 == 1);
        for i in 9..15 {
            self.set(8, 14 - i, (bits >> i) & 1 == 1);
        }

        // Split copy near the other two finders.
        for i in 0..8 {
            self.set(8, size - 1 - i, (bits >> i) & 1 == 1);
        }
        for i in 8..15 {
            self.set(size - 15 + i, 8, (bits >> i) & 1 == 1);
        }
    }
}

fn run_penalty(values: impl Iterator<Item = bool>) -> u32 {
    let mut score = 0;
    let mut run = 0u32;
    let mut current = None;
    for v in values {
        if Some(v) == current {
            run += 1;
        } else {
            current = Some(v);
            run = 1;
        }
        if run == 5 {
            score += 3;
        } else if run > 5 {
            score += 1;
        }
    }
    score
}

fn finder_pattern_penalty(values: impl Iterator<Item = bool>) -> u32 {
    let bits: Vec<bool> = values.collect();
    let pattern_dark_light = [true, false, true, true, true, false, true, false, false, false, false];
    let pattern_light_dark = [false, false, false, false, true, false, true, true, true, false, true];
    let mut score = 0;
    if bits.len() >= pattern_dark_light.len() {
        for window in bits.windows(pattern_dark_light.len()) {
            if window == pattern_dark_light || window == pattern_light_dark {
                score += 40;
            }
        }
    }
    score
}

/// BCH(15,5) error-correction bits for the 5-bit format data, XORed with
/// the fixed mask `0x5412` (the standard's format-info mask).
fn bch_format_bits(format_data: u16) -> u32 {
    let full = ((format_data as u32) << 10) | bch_remainder(format_data);
    full ^ 0x5412
}

fn bch_remainder(format_data: u16) -> u32 {
    let mut value = (format_data as u32) << 10;
    const GENERATOR: u32 = 0b10100110111;
    for i in (10..15).rev() {
        if value & (1 << i) != 0 {
            value ^= GENERATOR << (i - 10);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_value_is_an_error() {
        assert!(matches!(encode(""), Err(Error::EmptyQrValue)));
    }

    #[test]
    fn overlong_value_is_an_error() {
        let value = "x".repeat(64);
        assert!(matches!(encode(&value), Err(Error::QrValueTooLong { .. })));
    }

    #[test]
    fn short_value_encodes_to_the_smallest_fitting_version() {
        let qr = encode("HELLO").unwrap();
        assert_eq!(qr.size, 21); // fits version 1's 11-byte capacity
        assert_eq!(qr.modules.len(), qr.size * qr.size);
        // Top-left finder's center module is always dark.
        assert!(qr.is_dark(3, 3));
    }

    #[test]
    fn value_past_version_one_capacity_escalates_version() {
        let qr = encode("https://example.invalid/x").unwrap(); // 25 bytes
        assert_eq!(qr.size, 29); // needs version 3's 32-byte capacity
    }

    #[test]
    fn value_at_each_version_boundary_picks_that_version() {
        assert_eq!(encode(&"x".repeat(11)).unwrap().size, 21);
        assert_eq!(encode(&"x".repeat(12)).unwrap().size, 25);
        assert_eq!(encode(&"x".repeat(20)).unwrap().size, 25);
        assert_eq!(encode(&"x".repeat(21)).unwrap().size, 29);
        assert_eq!(encode(&"x".repeat(32)).unwrap().size, 29);
        assert_eq!(encode(&"x".repeat(33)).unwrap().size, 33);
        assert_eq!(encode(&"x".repeat(46)).unwrap().size, 33);
        assert!(encode(&"x".repeat(47)).is_err());
    }

    #[test]
    fn reed_solomon_remainder_has_requested_length() {
        let ec = reed_solomon(&[1, 2, 3, 4, 5], 6);
        assert_eq!(ec.len(), 6);
    }
}
