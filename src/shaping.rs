//
// Copyright 2023-Present (c) Raja Lehtihet & Wael El Oraiby
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice,
// this list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
// this list of conditions and the following disclaimer in the documentation
// and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors
// may be used to endorse or promote products derived from this software without
// specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE
// ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE
// LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR
// CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF
// SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS
// INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN
// CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE)
// ARISING IN ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE
// POSSIBILITY OF SUCH DAMAGE.
//

//! Shaping turns a string into a reusable batch of textured quads. The pass
//! walks codepoints left to right, pulls each glyph through the cache, and
//! emits one quad per visible glyph in the font's atlas coordinates. Pulling
//! glyphs can grow the atlas mid-pass, which silently invalidates the UVs of
//! quads already emitted; a pass that observed a side change therefore throws
//! its geometry away and shapes again, converging once every glyph is cached.

use crate::*;

/// Upper bound on atlas-growth restarts for one string. A single pass can
/// at most double the atlas a handful of times, so hitting this means the
/// cache is thrashing.
pub const MAX_SHAPING_ATTEMPTS: usize = 8;

/// Shaped, reusable quad batch for one string.
///
/// Four vertices per visible glyph, six indices per quad. Positions are in
/// pixels relative to the text origin (top-left of the first line); UVs are
/// valid for the atlas at side [`side`](PrerenderedString::side) and go stale
/// if the atlas grows afterwards, which the renderer detects by comparing
/// sides and reshaping.
pub struct PrerenderedString {
    /// Quad corner positions, four per glyph.
    pub positions: Vec<Vec3f>,
    /// Texture coordinates, one per position.
    pub uvs: Vec<Vec2f>,
    /// Triangle indices, six per glyph.
    pub indices: Vec<u32>,
    /// Pixel width of the widest line.
    pub width: f32,
    /// Atlas side the UVs were computed against.
    pub side: i32,
    /// The shaped text, kept for reshaping.
    pub text: String,
    /// Style the text was shaped with.
    pub style: FontStyle,
}

fn line_height(font: &Font, style: &FontStyle) -> i32 {
    (font.ascender_height(style.size) * (1.0 + style.line_spacing)) as i32
}

fn shape_pass(font: &mut Font, text: &str, style: &FontStyle) -> PrerenderedString {
    let size = style.size;
    let rendering = style.rendering;
    let has_kerning = font.has_kerning();

    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    let mut advance = 0f32;
    let mut pen_y = 0i32;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            advance += Font::fallback_advance(size);
            continue;
        }
        if c == '\n' {
            advance = 0.0;
            pen_y += line_height(font, style);
            continue;
        }
        let glyph = match font.get_character(size, rendering, c) {
            Some(glyph) => glyph,
            None => {
                advance += Font::fallback_advance(size);
                continue;
            }
        };

        if (0.0..=99999.0).contains(&advance) {
            let base = positions.len() as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);

            let pos_x = (advance + glyph.bearing_x) as i32;
            let top = glyph.advance_y as i32 + pen_y;
            let bottom = top + glyph.height;
            positions.push(Vec3f::new(pos_x as f32, bottom as f32, 0.0));
            positions.push(Vec3f::new((pos_x + glyph.width) as f32, bottom as f32, 0.0));
            positions.push(Vec3f::new(pos_x as f32, top as f32, 0.0));
            positions.push(Vec3f::new((pos_x + glyph.width) as f32, top as f32, 0.0));

            let uv = *glyph.uv.borrow();
            uvs.push(Vec2f::new(uv.x, uv.w));
            uvs.push(Vec2f::new(uv.z, uv.w));
            uvs.push(Vec2f::new(uv.x, uv.y));
            uvs.push(Vec2f::new(uv.z, uv.y));
        }

        if has_kerning {
            if let Some(&next) = chars.peek() {
                if let Some(kerning) = font.kerning(c, next, size) {
                    advance += kerning.x;
                }
            }
        }

        advance += glyph.advance_x;
        advance = advance.floor();
    }

    // Width comes from the measurement path so geometry-free layout and
    // shaped batches report the same number. Every glyph is cached by now,
    // so this cannot grow the atlas.
    let width = font.measure_width(text, size, rendering);

    PrerenderedString {
        positions,
        uvs,
        indices,
        width,
        side: font.atlas_side(size, rendering),
        text: text.to_string(),
        style: *style,
    }
}

/// Shapes `text` into a quad batch, retrying whenever pulling a glyph grew
/// the atlas mid-pass. Converges in two passes in practice: the first pass
/// warms the cache, the second emits against a stable atlas.
pub fn shape_with(font: &mut Font, text: &str, style: &FontStyle) -> PrerenderedString {
    for _ in 0..MAX_SHAPING_ATTEMPTS {
        let side_before = font.atlas_side(style.size, style.rendering);
        let batch = shape_pass(font, text, style);
        if batch.side == side_before {
            return batch;
        }
    }
    log::error!("shaping did not converge after {} attempts", MAX_SHAPING_ATTEMPTS);
    debug_assert!(false, "atlas kept growing while shaping one string");
    shape_pass(font, text, style)
}

/// Shapes `text` against a shared font.
pub fn shape(font: &FontHandle, text: &str, style: &FontStyle) -> PrerenderedString {
    font.scope_mut(|font| shape_with(font, text, style))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_support::ScriptedRasterizer;

    const AA: FontRendering = FontRendering::ANTIALIASING;

    fn style(size: u32) -> FontStyle {
        FontStyle { size, ..Default::default() }
    }

    fn test_font(glyph_side: i32, advance: f32) -> Font {
        Font::new(Box::new(ScriptedRasterizer::new(glyph_side, advance)))
    }

    #[test]
    fn whitespace_produces_width_but_no_geometry() {
        let mut font = test_font(8, 9.0);
        let batch = shape_with(&mut font, "  ", &style(23));
        assert!(batch.positions.is_empty());
        assert!(batch.indices.is_empty());
        assert_eq!(batch.width, 20.0);
    }

    #[test]
    fn one_quad_per_visible_glyph() {
        let mut font = test_font(8, 9.0);
        let batch = shape_with(&mut font, "ab c", &style(14));
        assert_eq!(batch.positions.len(), 12);
        assert_eq!(batch.uvs.len(), 12);
        assert_eq!(batch.indices.len(), 18);
        assert_eq!(&batch.indices[..12], &[0, 1, 2, 2, 1, 3, 4, 5, 6, 6, 5, 7]);
    }

    #[test]
    fn pen_advances_by_floored_glyph_advances() {
        let mut font = test_font(8, 9.5);
        let batch = shape_with(&mut font, "aa", &style(14));
        // bearing_x is 1 in the stub; the second glyph starts at floor(9.5) + 1.
        assert_eq!(batch.positions[0].x, 1.0);
        assert_eq!(batch.positions[4].x, 10.0);
        assert_eq!(batch.width, 18.0);
    }

    #[test]
    fn kerning_shifts_the_following_glyph() {
        let mut rasterizer = ScriptedRasterizer::new(8, 9.0);
        rasterizer.kern = Some(2.0);
        let mut font = Font::new(Box::new(rasterizer));
        let batch = shape_with(&mut font, "aa", &style(14));
        // advance = floor(9 + 2) = 11, plus bearing 1.
        assert_eq!(batch.positions[4].x, 12.0);
        // Width is measured without kerning.
        assert_eq!(batch.width, 18.0);
    }

    #[test]
    fn newline_resets_the_pen_and_tracks_the_widest_line() {
        let mut font = test_font(8, 9.0);
        let batch = shape_with(&mut font, "a\nbb", &style(14));
        assert_eq!(batch.width, 18.0);
        // Ascender is 0.8 * size in the stub, so the second line sits 11px lower.
        let first_top = batch.positions[2].y;
        let second_top = batch.positions[6].y;
        assert_eq!(second_top - first_top, 11.0);
        assert_eq!(batch.positions[4].x, 1.0);
    }

    #[test]
    fn glyph_tops_sit_at_size_minus_bearing() {
        let mut font = test_font(8, 9.0);
        let batch = shape_with(&mut font, "a", &style(14));
        // advance_y = 14 - 8 = 6, height 8.
        assert_eq!(batch.positions[2].y, 6.0);
        assert_eq!(batch.positions[0].y, 14.0);
    }

    #[test]
    fn reshaping_after_mid_pass_growth_yields_consistent_uvs() {
        // 40px glyphs: the first fills 64x64, the second forces 128.
        let mut font = test_font(40, 41.0);
        let batch = shape_with(&mut font, "abc", &style(48));
        assert_eq!(batch.side, 128);
        assert_eq!(font.atlas_side(48, AA), 128);

        let side = batch.side as f32;
        for uv in &batch.uvs {
            assert!(uv.x >= 0.0 && uv.x <= 1.0);
            assert!(uv.y >= 0.0 && uv.y <= 1.0);
            // UVs land on whole texel boundaries of the final atlas.
            let tx = uv.x * side;
            let ty = uv.y * side;
            assert!((tx - tx.round()).abs() < 1e-3);
            assert!((ty - ty.round()).abs() < 1e-3);
        }
    }

    #[test]
    fn shaping_is_idempotent_once_the_cache_is_warm() {
        let mut font = test_font(8, 9.0);
        let first = shape_with(&mut font, "abc", &style(14));
        let second = shape_with(&mut font, "abc", &style(14));
        assert_eq!(first.side, second.side);
        assert_eq!(first.positions.len(), second.positions.len());
        for (a, b) in first.uvs.iter().zip(second.uvs.iter()) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }
    }

    #[test]
    fn missing_glyphs_advance_by_the_fallback_width() {
        let mut font = test_font(8, 9.0);
        let batch = shape_with(&mut font, "~", &style(23));
        assert!(batch.positions.is_empty());
        assert_eq!(batch.width, 10.0);
    }
}
