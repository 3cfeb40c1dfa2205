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

//! OpenGL ES 2 text renderer on top of `glow`. Draws shaped batches with one
//! draw call for grayscale text and a two-pass blend for subpixel text:
//! first pass darkens the destination by per-channel coverage, second pass
//! adds the tinted coverage on top.

use std::io;
use std::sync::Arc;

use glow::*;

use crate::*;

const VERTEX_SHADER: &str = "#version 100
uniform highp mat4 uTransform;
uniform highp vec2 uOffset;
attribute highp vec3 vertexPosition;
attribute highp vec2 vertexTexCoord;
varying highp vec2 vTexCoord;
void main()
{
    vTexCoord = vertexTexCoord;
    highp vec4 pos = vec4(vertexPosition.xy + uOffset, 0.0, 1.0);
    gl_Position = uTransform * pos;
}";

const FRAGMENT_SHADER_GRAYSCALE: &str = "#version 100
varying highp vec2 vTexCoord;
uniform sampler2D uTexture;
uniform lowp vec4 uColor;
void main()
{
    lowp float coverage = texture2D(uTexture, vTexCoord).r;
    gl_FragColor = vec4(uColor.rgb, uColor.a * coverage);
}";

const FRAGMENT_SHADER_SUBPIXEL: &str = "#version 100
varying highp vec2 vTexCoord;
uniform sampler2D uTexture;
uniform lowp vec4 uColor;
void main()
{
    lowp vec3 coverage = texture2D(uTexture, vTexCoord).rgb;
    gl_FragColor = vec4(uColor.rgb * coverage * uColor.a, 1.0);
}";

fn create_program(gl: &glow::Context, vertex_shader_source: &str, fragment_shader_source: &str) -> Result<NativeProgram, io::Error> {
    unsafe {
        let program = gl.create_program().expect("Cannot create program");

        let shader_sources = [(glow::VERTEX_SHADER, vertex_shader_source), (glow::FRAGMENT_SHADER, fragment_shader_source)];

        let mut shaders = Vec::with_capacity(shader_sources.len());

        for (shader_type, shader_source) in shader_sources.iter() {
            let shader = gl.create_shader(*shader_type).expect("Cannot create shader");
            gl.shader_source(shader, shader_source);
            gl.compile_shader(shader);
            if !gl.get_shader_compile_status(shader) {
                let error_string = format!("{}", gl.get_shader_info_log(shader));
                for shader in shaders {
                    gl.delete_shader(shader);
                }
                gl.delete_program(program);
                return Err(io::Error::new(io::ErrorKind::Other, error_string));
            }
            gl.attach_shader(program, shader);
            shaders.push(shader);
        }

        gl.link_program(program);
        if !gl.get_program_link_status(program) {
            let error_string = format!("{}", gl.get_program_info_log(program));
            for shader in shaders {
                gl.delete_shader(shader);
            }
            gl.delete_program(program);
            return Err(io::Error::new(io::ErrorKind::Other, error_string));
        }

        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        Ok(program)
    }
}

fn modulate(a: Color4b, b: Color4b) -> Color4b {
    color4b(
        ((a.x as u32 * b.x as u32) / 255) as u8,
        ((a.y as u32 * b.y as u32) / 255) as u8,
        ((a.z as u32 * b.z as u32) / 255) as u8,
        ((a.w as u32 * b.w as u32) / 255) as u8,
    )
}

/// GPU mirror of one glyph atlas image.
pub struct GlTexture {
    gl: Arc<glow::Context>,
    tex: NativeTexture,
}

impl GlTexture {
    /// Creates an empty texture object.
    pub fn new(gl: Arc<glow::Context>) -> Self {
        let tex = unsafe {
            let tex = gl.create_texture().expect("Cannot create texture");
            debug_assert!(gl.get_error() == 0);
            tex
        };
        Self { gl, tex }
    }
}

impl GlyphTexture for GlTexture {
    fn set_filter_nearest(&mut self) {
        let gl = &self.gl;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, 0);
            debug_assert!(gl.get_error() == 0);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn upload(&mut self, image: &GlyphImage) {
        let gl = &self.gl;
        let format = match image.format() {
            PixelFormat::R8 => glow::LUMINANCE,
            PixelFormat::Rgb8 => glow::RGB,
        };
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            debug_assert!(gl.get_error() == 0);
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                image.width(),
                image.height(),
                0,
                format,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(image.data())),
            );
            debug_assert!(gl.get_error() == 0);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    fn bind(&self) {
        let gl = &self.gl;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.tex));
            gl.active_texture(glow::TEXTURE0);
            debug_assert!(gl.get_error() == 0);
        }
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_texture(self.tex);
        }
    }
}

/// Draws shaped text batches into the current GL framebuffer.
pub struct TextRenderer {
    gl: Arc<glow::Context>,
    program: NativeProgram,
    subpixel_program: NativeProgram,
    vbo_pos: NativeBuffer,
    vbo_uv: NativeBuffer,
    ibo: NativeBuffer,
    width: u32,
    height: u32,
}

impl TextRenderer {
    /// Compiles the shader pair and allocates the streaming buffers.
    pub fn new(gl: Arc<glow::Context>, width: u32, height: u32) -> io::Result<Self> {
        let program = create_program(&gl, VERTEX_SHADER, FRAGMENT_SHADER_GRAYSCALE)?;
        let subpixel_program = create_program(&gl, VERTEX_SHADER, FRAGMENT_SHADER_SUBPIXEL)?;
        let (vbo_pos, vbo_uv, ibo) = unsafe {
            let vbo_pos = gl.create_buffer().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let vbo_uv = gl.create_buffer().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let ibo = gl.create_buffer().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            (vbo_pos, vbo_uv, ibo)
        };
        Ok(Self {
            gl,
            program,
            subpixel_program,
            vbo_pos,
            vbo_uv,
            ibo,
            width,
            height,
        })
    }

    /// Updates the viewport size the orthographic projection maps to.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Draws a shaped batch at `pos` (the text origin on the first line's
    /// top-left), modulating the style color by `color`.
    ///
    /// If the font's atlas grew since the batch was shaped, its UVs point at
    /// the wrong texels; the batch is reshaped in place first. Alignment
    /// offsets `pos` by the measured width.
    pub fn draw(&mut self, font: &FontHandle, batch: &mut PrerenderedString, pos: Vec2i, color: Color4b) {
        let size = batch.style.size;
        let rendering = batch.style.rendering;

        let side = font.scope_mut(|f| f.atlas_side(size, rendering));
        if side == 0 {
            return;
        }
        if side != batch.side {
            *batch = shape(font, &batch.text, &batch.style);
        }
        if batch.positions.is_empty() {
            return;
        }

        let mut x = pos.x;
        match batch.style.align {
            TextAlign::Left => (),
            TextAlign::Center => x -= batch.width as i32 / 2,
            TextAlign::Right => x -= batch.width as i32,
        }

        let gl_for_texture = self.gl.clone();
        let bound = font.scope_mut(move |f| {
            let gl = gl_for_texture.clone();
            match f.texture_of(size, rendering, move || Box::new(GlTexture::new(gl))) {
                Some(texture) => {
                    texture.bind();
                    true
                }
                None => false,
            }
        });
        if !bound {
            return;
        }

        let final_color = modulate(color, batch.style.color);
        let subpixel = rendering.is_subpixel();
        let program = if subpixel { self.subpixel_program } else { self.program };

        let gl = &self.gl;
        unsafe {
            gl.enable(glow::BLEND);
            gl.disable(glow::CULL_FACE);
            gl.disable(glow::DEPTH_TEST);
            debug_assert!(gl.get_error() == 0);

            gl.use_program(Some(program));
            debug_assert!(gl.get_error() == 0);

            let tex_uniform_id = gl.get_uniform_location(program, "uTexture").unwrap();
            gl.uniform_1_i32(Some(&tex_uniform_id), 0);
            debug_assert_eq!(gl.get_error(), 0);

            let transform = gl.get_uniform_location(program, "uTransform").unwrap();
            let tm = ortho4(0.0, self.width as f32, self.height as f32, 0.0, -1.0, 1.0);
            let tm_ptr = tm.col.as_ptr() as *const _ as *const f32;
            let slice = std::slice::from_raw_parts(tm_ptr, 16);
            gl.uniform_matrix_4_f32_slice(Some(&transform), false, slice);
            debug_assert_eq!(gl.get_error(), 0);

            let offset = gl.get_uniform_location(program, "uOffset").unwrap();
            gl.uniform_2_f32(Some(&offset), x as f32, pos.y as f32);
            debug_assert_eq!(gl.get_error(), 0);

            let pos_attrib_id = gl.get_attrib_location(program, "vertexPosition").unwrap();
            let tex_attrib_id = gl.get_attrib_location(program, "vertexTexCoord").unwrap();

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo_pos));
            let positions_u8: &[u8] =
                core::slice::from_raw_parts(batch.positions.as_ptr() as *const u8, batch.positions.len() * core::mem::size_of::<Vec3f>());
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, positions_u8, glow::DYNAMIC_DRAW);
            gl.enable_vertex_attrib_array(pos_attrib_id);
            gl.vertex_attrib_pointer_f32(pos_attrib_id, 3, glow::FLOAT, false, 12, 0);
            debug_assert!(gl.get_error() == 0);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo_uv));
            let uvs_u8: &[u8] = core::slice::from_raw_parts(batch.uvs.as_ptr() as *const u8, batch.uvs.len() * core::mem::size_of::<Vec2f>());
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, uvs_u8, glow::DYNAMIC_DRAW);
            gl.enable_vertex_attrib_array(tex_attrib_id);
            gl.vertex_attrib_pointer_f32(tex_attrib_id, 2, glow::FLOAT, false, 8, 0);
            debug_assert!(gl.get_error() == 0);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.ibo));
            let indices_u8: &[u8] = core::slice::from_raw_parts(batch.indices.as_ptr() as *const u8, batch.indices.len() * core::mem::size_of::<u32>());
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, indices_u8, glow::DYNAMIC_DRAW);
            debug_assert!(gl.get_error() == 0);

            let color_uniform_id = gl.get_uniform_location(program, "uColor").unwrap();
            if subpixel {
                // Pass one darkens the destination by coverage.
                gl.uniform_4_f32(Some(&color_uniform_id), 1.0, 1.0, 1.0, final_color.w as f32 / 255.0);
                gl.blend_func(glow::ZERO, glow::ONE_MINUS_SRC_COLOR);
                gl.draw_elements(glow::TRIANGLES, batch.indices.len() as i32, glow::UNSIGNED_INT, 0);
                debug_assert!(gl.get_error() == 0);

                // Pass two adds the tinted coverage.
                gl.uniform_4_f32(
                    Some(&color_uniform_id),
                    final_color.x as f32 / 255.0,
                    final_color.y as f32 / 255.0,
                    final_color.z as f32 / 255.0,
                    final_color.w as f32 / 255.0,
                );
                gl.blend_func(glow::ONE, glow::ONE);
                gl.draw_elements(glow::TRIANGLES, batch.indices.len() as i32, glow::UNSIGNED_INT, 0);
                debug_assert!(gl.get_error() == 0);

                gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
                gl.uniform_4_f32(
                    Some(&color_uniform_id),
                    final_color.x as f32 / 255.0,
                    final_color.y as f32 / 255.0,
                    final_color.z as f32 / 255.0,
                    final_color.w as f32 / 255.0,
                );
                gl.draw_elements(glow::TRIANGLES, batch.indices.len() as i32, glow::UNSIGNED_INT, 0);
                debug_assert!(gl.get_error() == 0);
            }

            gl.disable_vertex_attrib_array(pos_attrib_id);
            gl.disable_vertex_attrib_array(tex_attrib_id);
            gl.use_program(None);
            debug_assert!(gl.get_error() == 0);
        }
    }

    /// Shapes and draws `text` in one call; prefer shaping once and reusing
    /// the batch for text that repeats across frames.
    pub fn draw_string(&mut self, font: &FontHandle, text: &str, style: &FontStyle, pos: Vec2i, color: Color4b) {
        let mut batch = shape(font, text, style);
        self.draw(font, &mut batch, pos, color);
    }
}

impl Drop for TextRenderer {
    fn drop(&mut self) {
        let gl = &self.gl;
        unsafe {
            gl.delete_program(self.program);
            gl.delete_program(self.subpixel_program);
            gl.delete_buffer(self.vbo_pos);
            gl.delete_buffer(self.vbo_uv);
            gl.delete_buffer(self.ibo);
        }
    }
}
