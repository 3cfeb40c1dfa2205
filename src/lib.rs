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
#![deny(missing_docs)]
//! `glyphbatch` is a dynamic glyph atlas and text shaping pipeline. Fonts are
//! rasterized one glyph at a time into a growable square atlas texture, and
//! strings are shaped into reusable textured quad batches that a render
//! backend draws with two blending strategies (grayscale and RGB subpixel).
//! The crate stays backend-agnostic: rasterization and GPU textures sit
//! behind traits, with a `fontdue` rasterizer and a `glow` renderer bundled
//! behind feature gates.

mod atlas;
mod font;
mod font_manager;
mod image;
mod rasterizer;
mod rect_packer;
mod shaping;
mod text_layout;

#[cfg(feature = "gl")]
mod render_gl;

pub use atlas::*;
pub use font::*;
pub use font_manager::*;
pub use image::*;
pub use rasterizer::*;
pub use rect_packer::*;
pub use rs_math3d::*;
pub use shaping::*;
pub use text_layout::*;

#[cfg(feature = "gl")]
pub use render_gl::*;

use bitflags::*;

bitflags! {
    /// Anti-aliasing strategy used when rasterizing glyphs.
    ///
    /// Subpixel rendering implies anti-aliasing, so the subpixel flag carries
    /// the anti-aliasing bit with it. An empty set nominally means unfiltered
    /// (nearest) rendering, but `fontdue` always antialiases, so it
    /// rasterizes the same as [`FontRendering::ANTIALIASING`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FontRendering : u32 {
        /// Grayscale coverage, one byte per pixel.
        const ANTIALIASING = 1 << 0;
        /// RGB subpixel coverage, three bytes per pixel.
        const SUBPIXEL = (1 << 1) | (1 << 0);
    }
}

impl FontRendering {
    /// Returns whether glyphs render with per-channel subpixel coverage.
    pub fn is_subpixel(self) -> bool {
        self.contains(FontRendering::SUBPIXEL)
    }
}

/// Horizontal placement of shaped text relative to the draw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// The draw position is the left edge of the text.
    #[default]
    Left,
    /// The draw position is the horizontal center of the text.
    Center,
    /// The draw position is the right edge of the text.
    Right,
}

/// Visual parameters a string is shaped and drawn with.
///
/// Glyph caches are keyed on `(size, rendering)`; the remaining fields only
/// affect drawing and never invalidate shaped geometry.
#[derive(Debug, Clone, Copy)]
pub struct FontStyle {
    /// Font size in pixels.
    pub size: u32,
    /// Rasterization strategy.
    pub rendering: FontRendering,
    /// Text color the quads are modulated with.
    pub color: Color4b,
    /// Extra line spacing as a fraction of the ascender height.
    pub line_spacing: f32,
    /// Horizontal alignment at draw time.
    pub align: TextAlign,
}

impl Default for FontStyle {
    fn default() -> Self {
        Self {
            size: 14,
            rendering: FontRendering::ANTIALIASING,
            color: color4b(0xFF, 0xFF, 0xFF, 0xFF),
            line_spacing: 0.0,
            align: TextAlign::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subpixel_implies_antialiasing() {
        assert!(FontRendering::SUBPIXEL.contains(FontRendering::ANTIALIASING));
        assert!(FontRendering::SUBPIXEL.is_subpixel());
        assert!(!FontRendering::ANTIALIASING.is_subpixel());
    }

    #[test]
    fn default_style_is_left_aligned_grayscale() {
        let style = FontStyle::default();
        assert_eq!(style.size, 14);
        assert_eq!(style.rendering, FontRendering::ANTIALIASING);
        assert_eq!(style.align, TextAlign::Left);
        assert_eq!(style.line_spacing, 0.0);
        // Color channels live in the vector's x/y/z/w fields.
        assert_eq!(style.color.x, 0xFF);
        assert_eq!(style.color.y, 0xFF);
        assert_eq!(style.color.z, 0xFF);
        assert_eq!(style.color.w, 0xFF);
    }
}
