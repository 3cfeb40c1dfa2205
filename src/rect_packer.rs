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

//! Online greedy rectangle placement. The packer keeps every rectangle it has
//! placed so far and answers new requests by probing a handful of candidate
//! positions around each of them. It is deliberately not optimal: placement
//! failure is the ordinary signal for the owning atlas to grow and retry.

use crate::*;

/// Returns whether two placed rectangles overlap.
///
/// Both rectangles are expanded by a factor of two around their own centers so
/// the test works in doubled coordinates and never divides (rect centers would
/// otherwise be fractional). Touching edges do not count as a collision.
fn collides(a: &Recti, b: &Recti) -> bool {
    let a_center_x = 2 * a.x + a.width;
    let a_center_y = 2 * a.y + a.height;
    let b_center_x = 2 * b.x + b.width;
    let b_center_y = 2 * b.y + b.height;

    (a_center_x - b_center_x).abs() < a.width + b.width && (a_center_y - b_center_y).abs() < a.height + b.height
}

fn fits(r: &Recti, side: i32) -> bool {
    r.x >= 0 && r.y >= 0 && r.x + r.width <= side && r.y + r.height <= side
}

/// Incremental rectangle packer backing a glyph atlas.
///
/// Placed rectangles are never removed; their coordinates stay valid when the
/// enclosing square grows because growth only extends the right/bottom edges.
#[derive(Default, Clone)]
pub struct Packer {
    rects: Vec<Recti>,
}

impl Packer {
    /// Creates an empty packer.
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Returns all rectangles placed so far, in insertion order.
    pub fn rects(&self) -> &[Recti] {
        &self.rects
    }

    /// Returns the number of placed rectangles.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns whether nothing has been placed yet.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Finds a non-overlapping position for a `width` × `height` rectangle
    /// inside a `side` × `side` square.
    ///
    /// The first rectangle lands at the origin. Every later request walks the
    /// placed rectangles in insertion order and probes six candidate positions
    /// around each one (right, below, left flush with the bottom, above
    /// right-aligned, left, above), accepting the first candidate that is in
    /// bounds and collides with nothing. Returns `None` when no candidate
    /// fits; the caller is expected to grow the square and try again.
    pub fn pack(&mut self, width: i32, height: i32, side: i32) -> Option<Recti> {
        if width <= 0 || height <= 0 {
            return None;
        }

        if self.rects.is_empty() {
            let r = Recti::new(0, 0, width, height);
            if fits(&r, side) {
                self.rects.push(r);
                return Some(r);
            }
            return None;
        }

        for i in 0..self.rects.len() {
            let r = self.rects[i];
            let candidates = [
                (r.x + r.width, r.y),
                (r.x, r.y + r.height),
                (r.x - width, r.y + r.height - height),
                (r.x + r.width - width, r.y - height),
                (r.x - width, r.y),
                (r.x, r.y - height),
            ];
            for (x, y) in candidates {
                let candidate = Recti::new(x, y, width, height);
                if fits(&candidate, side) && !self.rects.iter().any(|placed| collides(placed, &candidate)) {
                    self.rects.push(candidate);
                    return Some(candidate);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rect_is_placed_at_origin() {
        let mut packer = Packer::new();
        let r = packer.pack(10, 12, 64).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height), (0, 0, 10, 12));
    }

    #[test]
    fn second_rect_is_placed_to_the_right() {
        let mut packer = Packer::new();
        packer.pack(10, 12, 64).unwrap();
        let g = packer.pack(11, 14, 64).unwrap();
        assert_eq!((g.x, g.y), (10, 0));
    }

    #[test]
    fn zero_sized_request_is_rejected() {
        let mut packer = Packer::new();
        assert!(packer.pack(0, 5, 64).is_none());
        assert!(packer.pack(5, 0, 64).is_none());
        assert!(packer.is_empty());
    }

    #[test]
    fn oversized_request_fails_without_side_effects() {
        let mut packer = Packer::new();
        packer.pack(10, 10, 64).unwrap();
        assert!(packer.pack(60, 60, 64).is_none());
        assert_eq!(packer.len(), 1);
    }

    #[test]
    fn touching_rects_do_not_collide() {
        let a = Recti::new(0, 0, 10, 12);
        let b = Recti::new(10, 0, 11, 14);
        assert!(!collides(&a, &b));
        let c = Recti::new(9, 0, 11, 14);
        assert!(collides(&a, &c));
    }

    #[test]
    fn packed_rects_never_overlap_and_stay_in_bounds() {
        let side = 128;
        let mut packer = Packer::new();
        let sizes = [
            (10, 12),
            (11, 14),
            (30, 7),
            (7, 30),
            (25, 25),
            (3, 3),
            (40, 9),
            (9, 40),
            (16, 16),
            (5, 21),
        ];
        for (w, h) in sizes {
            packer.pack(w, h, side).unwrap();
        }
        let rects: Vec<Recti> = packer.rects().to_vec();
        for r in &rects {
            assert!(fits(r, side), "rect {:?} escaped the atlas", (r.x, r.y, r.width, r.height));
        }
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                assert!(!collides(&rects[i], &rects[j]), "rects {} and {} overlap", i, j);
            }
        }
    }

    #[test]
    fn falls_back_to_lower_rows_when_the_top_row_is_full() {
        let mut packer = Packer::new();
        packer.pack(32, 8, 64).unwrap();
        packer.pack(32, 8, 64).unwrap();
        let below = packer.pack(32, 8, 64).unwrap();
        assert_eq!((below.x, below.y), (0, 8));
    }
}
