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

//! Font resource: one loaded face plus per-`(size, rendering)` glyph caches.
//! Each cache owns its own atlas, a sparse codepoint-indexed glyph array, and
//! a lazily created GPU texture that is re-uploaded only when the atlas image
//! changed since the last draw.

use crate::*;

/// GPU-side mirror of one atlas image. Implemented by the render backend.
pub trait GlyphTexture {
    /// Selects nearest-neighbor filtering; glyph quads are drawn at a 1:1
    /// texel mapping and must not be smoothed.
    fn set_filter_nearest(&mut self);

    /// Replaces the texture content with `image`, reallocating if the side
    /// changed.
    fn upload(&mut self, image: &GlyphImage);

    /// Binds the texture for the next draw call.
    fn bind(&self);
}

/// Cached layout and placement data of one rasterized glyph.
///
/// `uv` is shared with the atlas and rescales in place when the atlas grows,
/// so a cached glyph never holds stale texture coordinates.
#[derive(Clone)]
pub struct Glyph {
    /// Codepoint this glyph renders.
    pub codepoint: char,
    /// Bitmap width in pixels.
    pub width: i32,
    /// Bitmap height in pixels.
    pub height: i32,
    /// Pen position to the bitmap's left edge.
    pub bearing_x: f32,
    /// Horizontal pen advance after this glyph.
    pub advance_x: f32,
    /// Distance from the line top to the bitmap's top edge.
    pub advance_y: f32,
    /// Texture coordinates of the glyph inside its atlas.
    pub uv: SharedUv,
}

/// Cache slot for one codepoint.
enum GlyphSlot {
    /// Never requested.
    Vacant,
    /// Requested before; the face has no visible glyph for it.
    Missing,
    /// Rasterized and placed in the atlas.
    Present(Glyph),
}

/// Glyph cache for one `(size, rendering)` combination.
struct FontData {
    size: u32,
    rendering: FontRendering,
    atlas: GlyphAtlas,
    glyphs: Vec<GlyphSlot>,
    texture: Option<Box<dyn GlyphTexture>>,
    dirty: bool,
}

impl FontData {
    fn new(size: u32, rendering: FontRendering) -> Self {
        Self {
            size,
            rendering,
            atlas: Atlas::new(ImageBacking::new()),
            glyphs: Vec::new(),
            texture: None,
            dirty: false,
        }
    }
}

/// A loaded font face with its glyph caches.
///
/// Caches are created on demand the first time a `(size, rendering)`
/// combination is used and live for the lifetime of the font.
pub struct Font {
    rasterizer: Box<dyn GlyphRasterizer>,
    data: Vec<FontData>,
}

impl Font {
    /// Wraps a rasterizer into a font with no caches yet.
    pub fn new(rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        Self { rasterizer, data: Vec::new() }
    }

    /// Loads a font face from TTF/OTF bytes using the bundled rasterizer.
    #[cfg(feature = "fontdue")]
    pub fn from_bytes(bytes: &[u8]) -> std::io::Result<Self> {
        Ok(Self::new(Box::new(FontdueRasterizer::from_bytes(bytes)?)))
    }

    /// Loads a font face from a file using the bundled rasterizer.
    #[cfg(feature = "fontdue")]
    pub fn from_file(path: &str) -> std::io::Result<Self> {
        Ok(Self::new(Box::new(FontdueRasterizer::from_file(path)?)))
    }

    /// Pen advance used for spaces and missing glyphs.
    pub fn fallback_advance(size: u32) -> f32 {
        size as f32 / 2.3
    }

    fn bucket_index(&mut self, size: u32, rendering: FontRendering) -> usize {
        match self.data.iter().position(|d| d.size == size && d.rendering == rendering) {
            Some(i) => i,
            None => {
                self.data.push(FontData::new(size, rendering));
                self.data.len() - 1
            }
        }
    }

    /// Returns the cached glyph for `codepoint`, rasterizing it on first
    /// request. Returns `None` for codepoints the face cannot render; the
    /// outcome is remembered either way, so the rasterizer is consulted at
    /// most once per codepoint per cache.
    pub fn get_character(&mut self, size: u32, rendering: FontRendering, codepoint: char) -> Option<Glyph> {
        let i = self.bucket_index(size, rendering);
        let id = codepoint as usize;
        if id >= self.data[i].glyphs.len() {
            self.data[i].glyphs.resize_with(id + 1, || GlyphSlot::Vacant);
        }
        if let GlyphSlot::Vacant = self.data[i].glyphs[id] {
            let slot = match self.rasterizer.render_glyph(codepoint, size, rendering) {
                Some(raster) => {
                    let bucket = &mut self.data[i];
                    let glyph = Glyph {
                        codepoint,
                        width: raster.width,
                        height: raster.height,
                        bearing_x: raster.bearing_x,
                        advance_x: raster.advance_x,
                        advance_y: size as f32 - raster.bearing_y,
                        uv: {
                            let image = raster.into_image();
                            bucket.atlas.insert(&image, image.width(), image.height())
                        },
                    };
                    bucket.dirty = true;
                    GlyphSlot::Present(glyph)
                }
                None => GlyphSlot::Missing,
            };
            self.data[i].glyphs[id] = slot;
        }
        match &self.data[i].glyphs[id] {
            GlyphSlot::Present(glyph) => Some(glyph.clone()),
            _ => None,
        }
    }

    /// Returns the current atlas side for a cache; 0 before any glyph landed.
    pub fn atlas_side(&mut self, size: u32, rendering: FontRendering) -> i32 {
        let i = self.bucket_index(size, rendering);
        self.data[i].atlas.side()
    }

    /// Returns the CPU-side atlas image of a cache, if allocated.
    pub fn atlas_image(&mut self, size: u32, rendering: FontRendering) -> Option<&GlyphImage> {
        let i = self.bucket_index(size, rendering);
        self.data[i].atlas.backing().image()
    }

    /// Returns the GPU texture for a cache, creating it with `create` on
    /// first use and re-uploading the atlas image if glyphs were added or the
    /// atlas grew since the last call. `None` until a first glyph exists.
    pub fn texture_of(
        &mut self,
        size: u32,
        rendering: FontRendering,
        create: impl FnOnce() -> Box<dyn GlyphTexture>,
    ) -> Option<&mut dyn GlyphTexture> {
        let i = self.bucket_index(size, rendering);
        let bucket = &mut self.data[i];
        bucket.atlas.backing().image()?;
        if bucket.texture.is_none() {
            let mut texture = create();
            texture.set_filter_nearest();
            bucket.texture = Some(texture);
            bucket.dirty = true;
        }
        let FontData { atlas, texture, dirty, .. } = bucket;
        let texture = texture.as_mut()?;
        if *dirty {
            if let Some(image) = atlas.backing().image() {
                texture.upload(image);
            }
            *dirty = false;
        }
        Some(texture.as_mut())
    }

    /// Returns the kerning adjustment for a pair, in pixels.
    pub fn kerning(&self, left: char, right: char, size: u32) -> Option<Vec2f> {
        self.rasterizer.kerning(left, right, size)
    }

    /// Returns whether the face carries kerning data.
    pub fn has_kerning(&self) -> bool {
        self.rasterizer.has_kerning()
    }

    /// Returns the ascender height in pixels at `size`.
    pub fn ascender_height(&self, size: u32) -> f32 {
        self.rasterizer.ascender_height(size)
    }

    /// Returns the descender depth in pixels at `size` (positive).
    pub fn descender_height(&self, size: u32) -> f32 {
        self.rasterizer.descender_height(size)
    }

    /// Measures the pixel width of `text`; for multi-line text the widest
    /// line wins. Advances are floored per glyph like the shaping pass does;
    /// kerning is not applied here.
    pub fn measure_width(&mut self, text: &str, size: u32, rendering: FontRendering) -> f32 {
        let mut advance = 0f32;
        let mut widest = 0f32;
        for c in text.chars() {
            if c == '\n' {
                widest = widest.max(advance);
                advance = 0.0;
                continue;
            }
            if c == ' ' {
                advance += Self::fallback_advance(size);
                continue;
            }
            match self.get_character(size, rendering, c) {
                Some(glyph) => {
                    advance += glyph.advance_x;
                    advance = advance.floor();
                }
                None => advance += Self::fallback_advance(size),
            }
        }
        widest.max(advance)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    /// Rasterizer stub producing square glyphs for alphanumeric codepoints
    /// and counting how often it is consulted.
    pub struct ScriptedRasterizer {
        pub calls: Rc<Cell<usize>>,
        pub glyph_side: i32,
        pub advance: f32,
        pub kern: Option<f32>,
    }

    impl ScriptedRasterizer {
        pub fn new(glyph_side: i32, advance: f32) -> Self {
            Self {
                calls: Rc::new(Cell::new(0)),
                glyph_side,
                advance,
                kern: None,
            }
        }
    }

    impl GlyphRasterizer for ScriptedRasterizer {
        fn render_glyph(&mut self, codepoint: char, _size: u32, rendering: FontRendering) -> Option<RasterizedGlyph> {
            self.calls.set(self.calls.get() + 1);
            if !codepoint.is_alphanumeric() {
                return None;
            }
            let format = if rendering.is_subpixel() { PixelFormat::Rgb8 } else { PixelFormat::R8 };
            let side = self.glyph_side;
            Some(RasterizedGlyph {
                width: side,
                height: side,
                pitch: side as usize * format.bytes_per_pixel(),
                bearing_x: 1.0,
                bearing_y: side as f32,
                advance_x: self.advance,
                format,
                data: vec![0xFF; (side * side) as usize * format.bytes_per_pixel()],
            })
        }

        fn kerning(&self, _left: char, _right: char, _size: u32) -> Option<Vec2f> {
            self.kern.map(|x| Vec2f::new(x, 0.0))
        }

        fn has_kerning(&self) -> bool {
            self.kern.is_some()
        }

        fn ascender_height(&self, size: u32) -> f32 {
            size as f32 * 0.8
        }

        fn descender_height(&self, size: u32) -> f32 {
            size as f32 * 0.2
        }
    }

    /// Texture stub counting uploads and remembering the last uploaded side.
    #[derive(Default)]
    pub struct RecordingTexture {
        pub uploads: Rc<Cell<usize>>,
        pub last_side: Rc<Cell<i32>>,
    }

    impl GlyphTexture for RecordingTexture {
        fn set_filter_nearest(&mut self) {}

        fn upload(&mut self, image: &GlyphImage) {
            self.uploads.set(self.uploads.get() + 1);
            self.last_side.set(image.width());
        }

        fn bind(&self) {}
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    const AA: FontRendering = FontRendering::ANTIALIASING;

    fn test_font(glyph_side: i32, advance: f32) -> (Font, std::rc::Rc<std::cell::Cell<usize>>) {
        let rasterizer = ScriptedRasterizer::new(glyph_side, advance);
        let calls = rasterizer.calls.clone();
        (Font::new(Box::new(rasterizer)), calls)
    }

    #[test]
    fn glyphs_are_rasterized_once_per_cache() {
        let (mut font, calls) = test_font(8, 9.0);
        let a = font.get_character(14, AA, 'a').unwrap();
        let b = font.get_character(14, AA, 'a').unwrap();
        assert_eq!(calls.get(), 1);
        assert!(std::rc::Rc::ptr_eq(&a.uv, &b.uv));

        // A different size is a different cache.
        font.get_character(20, AA, 'a').unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn missing_glyphs_are_remembered() {
        let (mut font, calls) = test_font(8, 9.0);
        assert!(font.get_character(14, AA, '~').is_none());
        assert!(font.get_character(14, AA, '~').is_none());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fallback_advance_scales_with_size() {
        assert_eq!(Font::fallback_advance(23), 10.0);
        let (mut font, _) = test_font(8, 9.0);
        assert_eq!(font.measure_width(" ", 23, AA), 10.0);
    }

    #[test]
    fn measure_width_takes_the_widest_line() {
        let (mut font, _) = test_font(8, 9.0);
        // "abc" = 27, "ab" = 18
        assert_eq!(font.measure_width("ab\nabc", 14, AA), 27.0);
        assert_eq!(font.measure_width("abc\nab", 14, AA), 27.0);
    }

    #[test]
    fn measure_width_floors_per_glyph() {
        let (mut font, _) = test_font(8, 9.5);
        assert_eq!(font.measure_width("aa", 14, AA), 18.0);
    }

    #[test]
    fn texture_uploads_only_when_the_atlas_changed() {
        let (mut font, _) = test_font(8, 9.0);
        let uploads = std::rc::Rc::new(std::cell::Cell::new(0));

        // No glyphs yet: no image to mirror.
        let u = uploads.clone();
        assert!(
            font.texture_of(14, AA, move || Box::new(RecordingTexture { uploads: u, ..Default::default() }))
                .is_none()
        );

        font.get_character(14, AA, 'a').unwrap();
        let u = uploads.clone();
        let create = move || -> Box<dyn GlyphTexture> { Box::new(RecordingTexture { uploads: u, ..Default::default() }) };
        assert!(font.texture_of(14, AA, create).is_some());
        assert_eq!(uploads.get(), 1);

        // Clean cache: bind again without re-upload.
        assert!(font.texture_of(14, AA, || unreachable!()).is_some());
        assert_eq!(uploads.get(), 1);

        // New glyph dirties the cache.
        font.get_character(14, AA, 'b').unwrap();
        assert!(font.texture_of(14, AA, || unreachable!()).is_some());
        assert_eq!(uploads.get(), 2);
    }

    #[test]
    fn advance_y_is_size_minus_bearing() {
        let (mut font, _) = test_font(8, 9.0);
        let glyph = font.get_character(14, AA, 'a').unwrap();
        // bearing_y equals the glyph side in the stub.
        assert_eq!(glyph.advance_y, 14.0 - 8.0);
    }
}
