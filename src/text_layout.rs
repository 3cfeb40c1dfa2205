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

//! Width-constrained text helpers built on the font's measurement: greedy
//! word wrapping to a pixel width and hit-testing a pixel position back to a
//! character index. All of them pull glyphs through the cache, so they warm
//! the atlas as a side effect.

use crate::*;

/// Returns the longest prefix of `text` that fits in `max_width` pixels.
///
/// Wrapping is word-greedy: a word that would overflow the width is left out
/// entirely, except when the word alone is wider than `max_width`, in which
/// case it is broken character by character. A newline ends the prefix.
pub fn trim_to_width(font: &mut Font, text: &str, max_width: f32, size: u32, rendering: FontRendering) -> String {
    let mut s = String::new();
    let mut length = 0f32;
    let space_width = font.measure_width(" ", size, rendering);

    for word in text.split(' ') {
        if word.is_empty() {
            if !s.is_empty() {
                s.push(' ');
            }
            continue;
        }
        let mut l = font.measure_width(word, size, rendering);
        if !s.is_empty() {
            l += size as f32;
        }

        if length + l > max_width && l <= max_width {
            return s;
        }

        if !s.is_empty() {
            s.push(' ');
            length += space_width;
        }
        for c in word.chars() {
            if length > max_width {
                return s;
            }
            if c == '\n' {
                return s;
            }
            s.push(c);
            length += font.measure_width(&c.to_string(), size, rendering);
        }
    }
    s
}

/// Wraps `text` into lines no wider than `max_width` pixels.
///
/// Repeatedly takes the widest fitting prefix and skips the separator that
/// followed it. Lines are characters, not glyph geometry; shape each one
/// separately to draw them.
pub fn trim_to_multiline(font: &mut Font, text: &str, max_width: f32, size: u32, rendering: FontRendering) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest: Vec<char> = text.chars().collect();
    while !rest.is_empty() {
        let current: String = rest.iter().collect();
        let line = trim_to_width(font, &current, max_width, size, rendering);
        let len = line.chars().count();
        lines.push(line);
        if len + 1 >= rest.len() {
            break;
        }
        rest.drain(..len + 1);
    }
    lines
}

/// Hit-tests a pixel offset `x` back to a character index in `text`.
///
/// A character counts as hit while `x` lies past its horizontal midpoint;
/// characters the face cannot render are skipped without advancing. Spaces
/// advance by the fallback width.
pub fn index_of_x(font: &mut Font, text: &str, x: f32, size: u32, rendering: FontRendering) -> usize {
    let mut advance = 0f32;
    let mut index = 0;

    for c in text.chars() {
        let width_of_char = if c == ' ' {
            Font::fallback_advance(size)
        } else {
            match font.get_character(size, rendering, c) {
                Some(glyph) => glyph.advance_x,
                None => continue,
            }
        };

        if advance + width_of_char / 2.0 > x {
            break;
        }
        advance += width_of_char;
        advance = advance.floor();
        index += 1;
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::test_support::ScriptedRasterizer;

    const AA: FontRendering = FontRendering::ANTIALIASING;

    // 9px advance per glyph, size 14, so "hello" measures 45px.
    fn test_font() -> Font {
        Font::new(Box::new(ScriptedRasterizer::new(8, 9.0)))
    }

    #[test]
    fn wrapping_drops_the_word_that_would_overflow() {
        let mut font = test_font();
        assert_eq!(trim_to_width(&mut font, "hello world", 100.0, 14, AA), "hello");
    }

    #[test]
    fn fitting_text_passes_through_whole() {
        let mut font = test_font();
        assert_eq!(trim_to_width(&mut font, "hello world", 500.0, 14, AA), "hello world");
    }

    #[test]
    fn over_wide_word_breaks_character_wise() {
        let mut font = test_font();
        // 12 chars at 9px each; the 50px budget holds six (the check runs
        // before each append).
        assert_eq!(trim_to_width(&mut font, "abcdefghijkl", 50.0, 14, AA), "abcdef");
    }

    #[test]
    fn newline_ends_the_prefix() {
        let mut font = test_font();
        assert_eq!(trim_to_width(&mut font, "ab\ncd", 500.0, 14, AA), "ab");
    }

    #[test]
    fn multiline_covers_the_whole_text() {
        let mut font = test_font();
        let lines = trim_to_multiline(&mut font, "hello world", 100.0, 14, AA);
        assert_eq!(lines, vec!["hello".to_string(), "world".to_string()]);
    }

    #[test]
    fn multiline_of_fitting_text_is_one_line() {
        let mut font = test_font();
        let lines = trim_to_multiline(&mut font, "hello world", 500.0, 14, AA);
        assert_eq!(lines, vec!["hello world".to_string()]);
    }

    #[test]
    fn index_of_x_snaps_at_character_midpoints() {
        let mut font = test_font();
        assert_eq!(index_of_x(&mut font, "abcd", 0.0, 14, AA), 0);
        // Past the midpoint of 'c' (18 + 4.5 > 20).
        assert_eq!(index_of_x(&mut font, "abcd", 20.0, 14, AA), 2);
        assert_eq!(index_of_x(&mut font, "abcd", 1000.0, 14, AA), 4);
    }

    #[test]
    fn index_of_x_advances_over_spaces() {
        let mut font = test_font();
        // Space advances by 14 / 2.3 ~ 6.09px.
        assert_eq!(index_of_x(&mut font, " a", 4.0, 14, AA), 1);
    }
}
