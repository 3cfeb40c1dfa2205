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

//! Seam to the external font rasterization library. The pipeline only ever
//! talks to [`GlyphRasterizer`]; the bundled implementation wraps `fontdue`
//! behind the default `fontdue` feature. Metrics cross the seam already
//! converted to pixel floats.

use crate::*;

/// Coverage bitmap and layout metrics for one freshly rasterized glyph.
pub struct RasterizedGlyph {
    /// Bitmap width in pixels.
    pub width: i32,
    /// Bitmap height in pixels.
    pub height: i32,
    /// Bytes per source row; may exceed `width * bytes_per_pixel` when the
    /// rasterizer pads rows.
    pub pitch: usize,
    /// Left side bearing: pen position to the bitmap's left edge.
    pub bearing_x: f32,
    /// Baseline to the bitmap's top edge.
    pub bearing_y: f32,
    /// Horizontal pen advance after this glyph.
    pub advance_x: f32,
    /// Coverage format: grayscale or RGB subpixel.
    pub format: PixelFormat,
    /// Row-major coverage bytes, `pitch` bytes per row.
    pub data: Vec<u8>,
}

impl RasterizedGlyph {
    /// Re-packs the possibly padded rows into a tight coverage image,
    /// dropping any per-row pitch padding.
    pub fn into_image(self) -> GlyphImage {
        let row = self.width as usize * self.format.bytes_per_pixel();
        if self.pitch == row {
            return GlyphImage::new(self.data, self.width, self.height, self.format)
                .unwrap_or_else(|_| GlyphImage::blank(self.width, self.height, self.format));
        }
        let mut tight = Vec::with_capacity(row * self.height as usize);
        for r in 0..self.height as usize {
            let from = r * self.pitch;
            tight.extend_from_slice(&self.data[from..from + row]);
        }
        GlyphImage::new(tight, self.width, self.height, self.format)
            .unwrap_or_else(|_| GlyphImage::blank(self.width, self.height, self.format))
    }
}

/// Interface to the external library that loads a font program and renders
/// single glyphs. One implementor wraps one loaded face.
pub trait GlyphRasterizer {
    /// Rasterizes `codepoint` at `size` pixels. Returns `None` when the font
    /// has no visible glyph for the codepoint (whitespace included).
    fn render_glyph(&mut self, codepoint: char, size: u32, rendering: FontRendering) -> Option<RasterizedGlyph>;

    /// Returns the kerning adjustment for a glyph pair in pixels, or `None`
    /// when the font defines none for the pair.
    fn kerning(&self, left: char, right: char, size: u32) -> Option<Vec2f>;

    /// Returns whether the face carries a kerning table at all.
    fn has_kerning(&self) -> bool;

    /// Returns the ascender height in pixels at the given size.
    fn ascender_height(&self, size: u32) -> f32;

    /// Returns the descender depth in pixels at the given size (positive).
    fn descender_height(&self, size: u32) -> f32;
}

#[cfg(feature = "fontdue")]
mod fontdue_impl {
    use std::io::{Error, ErrorKind};

    use super::*;

    /// [`GlyphRasterizer`] implementation backed by `fontdue`.
    pub struct FontdueRasterizer {
        font: fontdue::Font,
    }

    impl FontdueRasterizer {
        /// Loads a face from font program bytes (TTF/OTF).
        pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
            let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
                .map_err(|e| Error::new(ErrorKind::InvalidData, format!("Could not load font: {}", e)))?;
            Ok(Self { font })
        }

        /// Loads a face from a font file on disk.
        pub fn from_file(path: &str) -> std::io::Result<Self> {
            let bytes = std::fs::read(path)
                .map_err(|e| Error::new(e.kind(), format!("Cannot open font file '{}': {}", path, e)))?;
            Self::from_bytes(&bytes)
        }
    }

    impl GlyphRasterizer for FontdueRasterizer {
        fn render_glyph(&mut self, codepoint: char, size: u32, rendering: FontRendering) -> Option<RasterizedGlyph> {
            // Glyph index 0 is the .notdef glyph: the font is missing this codepoint.
            if self.font.lookup_glyph_index(codepoint) == 0 {
                return None;
            }
            let px = size as f32;
            let subpixel = rendering.is_subpixel();
            let (metrics, data) = if subpixel {
                self.font.rasterize_subpixel(codepoint, px)
            } else {
                self.font.rasterize(codepoint, px)
            };
            if metrics.width == 0 || metrics.height == 0 {
                return None;
            }
            let format = if subpixel { PixelFormat::Rgb8 } else { PixelFormat::R8 };
            Some(RasterizedGlyph {
                width: metrics.width as i32,
                height: metrics.height as i32,
                pitch: metrics.width * format.bytes_per_pixel(),
                bearing_x: metrics.xmin as f32,
                bearing_y: (metrics.ymin + metrics.height as i32) as f32,
                advance_x: metrics.advance_width,
                format,
                data,
            })
        }

        fn kerning(&self, left: char, right: char, size: u32) -> Option<Vec2f> {
            self.font.horizontal_kern(left, right, size as f32).map(|x| Vec2f::new(x, 0.0))
        }

        fn has_kerning(&self) -> bool {
            true
        }

        fn ascender_height(&self, size: u32) -> f32 {
            self.font
                .horizontal_line_metrics(size as f32)
                .map(|m| m.ascent)
                .unwrap_or(size as f32)
        }

        fn descender_height(&self, size: u32) -> f32 {
            self.font
                .horizontal_line_metrics(size as f32)
                .map(|m| -m.descent)
                .unwrap_or(0.0)
        }
    }
}

#[cfg(feature = "fontdue")]
pub use fontdue_impl::FontdueRasterizer;
