//! Single-line run measurement and vertical/horizontal anchoring (§4.2).
//! Word-wrap and box placement for `textbox` elements live in `wrap.rs`.

pub mod wrap;

use crate::font::LoadedFont;
use crate::model::{HorizontalAlign, VerticalAnchor};

/// Font metrics scaled to a point size: ascent `A_s` and cap-height `C_s`
/// are positive, descent `D_s` is negative, matching the font's own sign
/// convention (descender below the baseline).
#[derive(Debug, Clone, Copy)]
pub struct ScaledMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
}

pub fn scaled_metrics(font: &LoadedFont, size: f32) -> ScaledMetrics {
    ScaledMetrics {
        ascent: font.ascent_em() * size,
        descent: font.descent_em() * size,
        cap_height: font.cap_height_em() * size,
    }
}

/// Sum of glyph advances, in points, for an already-shaped run.
pub fn run_width(font: &LoadedFont, size: f32, glyphs: &[u16]) -> f32 {
    glyphs
        .iter()
        .map(|&gid| font.advance_width_1000(gid) as f32 / 1000.0 * size)
        .sum()
}

/// Left edge of a run of the given width, per `align`, relative to anchor
/// `x` (§4.2: left at `x`, center at `x - W/2`, right at `x - W`).
pub fn horizontal_origin(x: f32, width: f32, align: HorizontalAlign) -> f32 {
    match align {
        HorizontalAlign::Left => x,
        HorizontalAlign::Center => x - width / 2.0,
        HorizontalAlign::Right => x - width,
    }
}

/// Baseline position in user space for a `text` element anchored at
/// `y_user` (§4.2's three anchor formulas).
pub fn anchor_baseline(y_user: f32, metrics: ScaledMetrics, anchor: VerticalAnchor) -> f32 {
    match anchor {
        VerticalAnchor::Baseline => y_user,
        VerticalAnchor::Capline => y_user + metrics.cap_height,
        VerticalAnchor::Center => {
            y_user + (metrics.ascent + metrics.descent) / 2.0 + metrics.descent.abs()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_origin_matches_alignment() {
        assert_eq!(horizontal_origin(100.0, 40.0, HorizontalAlign::Left), 100.0);
        assert_eq!(horizontal_origin(100.0, 40.0, HorizontalAlign::Center), 80.0);
        assert_eq!(horizontal_origin(100.0, 40.0, HorizontalAlign::Right), 60.0);
    }

    #[test]
    fn anchor_baseline_matches_formulas() {
        let metrics = ScaledMetrics {
            ascent: 10.0,
            descent: -3.0,
            cap_height: 7.0,
        };
        assert_eq!(anchor_baseline(50.0, metrics, VerticalAnchor::Baseline), 50.0);
        assert_eq!(anchor_baseline(50.0, metrics, VerticalAnchor::Capline), 57.0);
        assert_eq!(anchor_baseline(50.0, metrics, VerticalAnchor::Center), 56.5);
    }
}
