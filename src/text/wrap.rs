//! Greedy word-wrap and `textbox` vertical/horizontal placement (§4.3).

use crate::font::LoadedFont;
use crate::model::{BoxVerticalAlign, HorizontalAlign};

use super::{run_width, ScaledMetrics};

/// One already-shaped, already-measured line of a wrapped paragraph.
pub struct Line {
    pub glyphs: Vec<u16>,
    pub width: f32,
}

/// Tokenizes on spaces, treats `\n` as a hard break, and greedily packs
/// words into lines no wider than `max_width`. A single token wider than
/// `max_width` on its own is emitted unbroken, per §4.3.
pub fn wrap(font: &LoadedFont, size: f32, text: &str, max_width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            let candidate_width = measure(font, size, &candidate);
            if !current.is_empty() && candidate_width > max_width {
                lines.push(build_line(font, size, &current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        lines.push(build_line(font, size, &current));
    }
    lines
}

fn measure(font: &LoadedFont, size: f32, text: &str) -> f32 {
    run_width(font, size, &font.to_glyph_ids(text))
}

fn build_line(font: &LoadedFont, size: f32, text: &str) -> Line {
    let glyphs = font.to_glyph_ids(text);
    let width = run_width(font, size, &glyphs);
    Line { glyphs, width }
}

/// Effective line height: the caller's explicit value, or the spec's
/// `1.2 × size` default when none was given (a `0.0` line_height stands
/// in for "unset", avoiding an `Option` field on a plain data struct).
pub fn effective_line_height(line_height: f32, size: f32) -> f32 {
    if line_height > 0.0 {
        line_height
    } else {
        1.2 * size
    }
}

/// Baselines (in the box's local user-space, i.e. relative to the box's
/// top edge `by`) for each wrapped line, per `align` (§4.3's five
/// `text_align_y` formulas, expressed in the top-left/y-down convention
/// §3 uses for all user coordinates).
pub fn line_baselines(
    line_count: usize,
    box_height: f32,
    line_height: f32,
    metrics: ScaledMetrics,
    align: BoxVerticalAlign,
) -> Vec<f32> {
    if line_count == 0 {
        return Vec::new();
    }
    let n = line_count as f32;
    let block_height = n * line_height;
    let first = match align {
        BoxVerticalAlign::Top => metrics.ascent,
        BoxVerticalAlign::Bottom => box_height - metrics.descent.abs() - (n - 1.0) * line_height,
        BoxVerticalAlign::Center => (box_height - block_height) / 2.0 + metrics.ascent,
        BoxVerticalAlign::Capline => metrics.cap_height,
        BoxVerticalAlign::Baseline => 0.0,
    };
    (0..line_count).map(|i| first + i as f32 * line_height).collect()
}

/// Left edge (relative to the box's left edge `bx`) of a line's text run.
pub fn line_x(box_width: f32, line_width: f32, align: HorizontalAlign) -> f32 {
    match align {
        HorizontalAlign::Left => 0.0,
        HorizontalAlign::Center => (box_width - line_width) / 2.0,
        HorizontalAlign::Right => box_width - line_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_line_height_defaults_to_1_2x_size() {
        assert_eq!(effective_line_height(0.0, 10.0), 12.0);
        assert_eq!(effective_line_height(20.0, 10.0), 20.0);
    }

    #[test]
    fn line_x_matches_alignment() {
        assert_eq!(line_x(200.0, 40.0, HorizontalAlign::Left), 0.0);
        assert_eq!(line_x(200.0, 40.0, HorizontalAlign::Center), 80.0);
        assert_eq!(line_x(200.0, 40.0, HorizontalAlign::Right), 160.0);
    }
}
