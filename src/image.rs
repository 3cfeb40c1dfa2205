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

//! CPU-side pixel buffers holding glyph coverage. Grayscale glyphs use one
//! byte per pixel, subpixel glyphs three (one per RGB channel). The atlas
//! treats these as opaque canvases: growth is a canvas resize that preserves
//! content at the top-left origin, never a stretch.

use std::io::{Error, ErrorKind};

use crate::*;

/// Storage format of glyph coverage pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Single-channel grayscale coverage.
    R8,
    /// Per-channel RGB subpixel coverage.
    Rgb8,
}

impl PixelFormat {
    /// Returns the number of bytes one pixel occupies.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }
}

/// Tightly packed pixel buffer with an explicit format tag.
#[derive(Clone)]
pub struct GlyphImage {
    width: i32,
    height: i32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl GlyphImage {
    /// Wraps an existing byte buffer. The buffer length must match
    /// `width * height * bytes_per_pixel` exactly.
    pub fn new(data: Vec<u8>, width: i32, height: i32, format: PixelFormat) -> std::io::Result<Self> {
        if width < 0 || height < 0 {
            return Err(Error::new(ErrorKind::Other, "Image dimensions must not be negative"));
        }
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::new(
                ErrorKind::Other,
                format!("Expected {} bytes, found {}", expected, data.len()),
            ));
        }
        Ok(Self { width, height, format, data })
    }

    /// Creates a zero-filled image.
    pub fn blank(width: i32, height: i32, format: PixelFormat) -> Self {
        let len = width.max(0) as usize * height.max(0) as usize * format.bytes_per_pixel();
        Self {
            width: width.max(0),
            height: height.max(0),
            format,
            data: vec![0; len],
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Returns the pixel format.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the raw pixel bytes, row-major, tightly packed.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns a copy of this image on a larger (or equal) canvas of the same
    /// format. Existing content stays at its prior offsets from the top-left
    /// origin; new area is zero.
    pub fn resized_canvas(&self, width: i32, height: i32) -> GlyphImage {
        let mut dst = GlyphImage::blank(width, height, self.format);
        dst.blit(self, 0, 0);
        dst
    }

    /// Copies `src` into this image with its top-left corner at `(x, y)`,
    /// row by row. Formats must match; the source must fit entirely.
    pub fn blit(&mut self, src: &GlyphImage, x: i32, y: i32) {
        debug_assert_eq!(self.format, src.format);
        debug_assert!(x >= 0 && y >= 0);
        debug_assert!(x + src.width <= self.width && y + src.height <= self.height);

        let bpp = self.format.bytes_per_pixel();
        let src_row = src.width as usize * bpp;
        let dst_row = self.width as usize * bpp;
        for row in 0..src.height as usize {
            let from = row * src_row;
            let to = (y as usize + row) * dst_row + x as usize * bpp;
            self.data[to..to + src_row].copy_from_slice(&src.data[from..from + src_row]);
        }
    }

    /// Writes the image to disk as a grayscale or RGB PNG.
    #[cfg(feature = "png-export")]
    pub fn save_png(&self, path: &str) -> std::io::Result<()> {
        use std::fs::File;
        use std::io::BufWriter;

        let file = File::create(path)?;
        let w = BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, self.width as u32, self.height as u32);
        encoder.set_color(match self.format {
            PixelFormat::R8 => png::ColorType::Grayscale,
            PixelFormat::Rgb8 => png::ColorType::Rgb,
        });
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        Ok(())
    }
}

/// Lazily allocated canvas a [`GlyphAtlas`](crate::GlyphAtlas) copies glyphs
/// into. The pixel format is fixed by the first glyph ever inserted.
#[derive(Default)]
pub struct ImageBacking {
    image: Option<GlyphImage>,
}

impl ImageBacking {
    /// Creates an unallocated backing; the canvas appears on first resize.
    pub fn new() -> Self {
        Self { image: None }
    }

    /// Returns the canvas, if any glyph has been inserted yet.
    pub fn image(&self) -> Option<&GlyphImage> {
        self.image.as_ref()
    }
}

impl AtlasBacking for ImageBacking {
    type Item = GlyphImage;

    fn resize(&mut self, item: &GlyphImage, new_side: i32) {
        let next = match &self.image {
            Some(image) => image.resized_canvas(new_side, new_side),
            None => GlyphImage::blank(new_side, new_side, item.format()),
        };
        self.image = Some(next);
    }

    fn insert_at(&mut self, item: &GlyphImage, x: i32, y: i32) {
        debug_assert!(self.image.is_some(), "insert before the canvas was allocated");
        if let Some(image) = &mut self.image {
            image.blit(item, x, y);
        }
    }
}
