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

//! Growable square atlas generic over its backing store. The atlas owns the
//! rectangle packer and a list of UV cells it has handed out; when packing
//! fails it doubles its side, asks the backing to grow its canvas, and
//! rescales every previously issued UV cell in place so all holders observe
//! the new coordinates through their shared reference.

use std::{cell::RefCell, rc::Rc};

use crate::*;

/// Side length the atlas allocates on first insert.
pub const INITIAL_ATLAS_SIDE: i32 = 64;

/// Normalized UV rectangle `(u0, v0, u1, v1)` with `v` growing downward.
///
/// Shared between the atlas and every glyph placed in it; the atlas mutates
/// the cell in place when it grows, so holders always see coordinates valid
/// for the current side.
pub type SharedUv = Rc<RefCell<Vec4f>>;

/// Mutation hooks a backing store must provide so the atlas can stay a pure
/// geometry container.
pub trait AtlasBacking {
    /// Payload copied into the backing store.
    type Item;

    /// Grows the store to `new_side` × `new_side`, preserving existing
    /// content at its prior offsets from the top-left origin. `item` is the
    /// insertion that triggered the growth, available for format decisions
    /// on first allocation.
    fn resize(&mut self, item: &Self::Item, new_side: i32);

    /// Copies the item's content into the store at `(x, y)`.
    fn insert_at(&mut self, item: &Self::Item, x: i32, y: i32);
}

/// Growable atlas owning a packer, a backing store, and all issued UV cells.
pub struct Atlas<B: AtlasBacking> {
    side: i32,
    packer: Packer,
    uvs: Vec<SharedUv>,
    backing: B,
}

/// Atlas specialized to glyph coverage images.
pub type GlyphAtlas = Atlas<ImageBacking>;

impl<B: AtlasBacking> Atlas<B> {
    /// Creates an unallocated atlas (side 0) around a backing store.
    pub fn new(backing: B) -> Self {
        Self {
            side: 0,
            packer: Packer::new(),
            uvs: Vec::new(),
            backing,
        }
    }

    /// Returns the current side length in pixels; 0 before the first insert.
    pub fn side(&self) -> i32 {
        self.side
    }

    /// Returns the backing store.
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Returns the pixel rectangles packed so far, in insertion order.
    pub fn rects(&self) -> &[Recti] {
        self.packer.rects()
    }

    /// Packs a `width` × `height` item into the atlas and returns its UV cell.
    ///
    /// Allocates the backing at [`INITIAL_ATLAS_SIDE`] on first use. When the
    /// packer reports no space, the side doubles (rescaling every issued UV
    /// cell in place) and packing retries; doubling always succeeds
    /// eventually, so the loop has no artificial bound.
    pub fn insert(&mut self, item: &B::Item, width: i32, height: i32) -> SharedUv {
        debug_assert!(width > 0 && height > 0);

        if self.side == 0 {
            self.side = INITIAL_ATLAS_SIDE;
            self.backing.resize(item, self.side);
        }

        let rect = loop {
            match self.packer.pack(width, height, self.side) {
                Some(rect) => break rect,
                None => self.grow(item),
            }
        };
        self.backing.insert_at(item, rect.x, rect.y);

        let side = self.side as f32;
        let uv = Rc::new(RefCell::new(Vec4f::new(
            rect.x as f32 / side,
            rect.y as f32 / side,
            (rect.x + rect.width) as f32 / side,
            (rect.y + rect.height) as f32 / side,
        )));
        self.uvs.push(uv.clone());
        uv
    }

    fn grow(&mut self, item: &B::Item) {
        let old_side = self.side;
        self.side *= 2;
        log::debug!("atlas grew from {0}x{0} to {1}x{1}", old_side, self.side);
        self.backing.resize(item, self.side);

        let scale = old_side as f32 / self.side as f32;
        for uv in &self.uvs {
            let mut uv = uv.borrow_mut();
            uv.x *= scale;
            uv.y *= scale;
            uv.z *= scale;
            uv.w *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backing that records hook invocations and tracks its allocated side.
    #[derive(Default)]
    struct RecordingBacking {
        side: i32,
        resizes: Vec<i32>,
        inserts: Vec<(i32, i32)>,
    }

    impl AtlasBacking for RecordingBacking {
        type Item = ();

        fn resize(&mut self, _item: &(), new_side: i32) {
            assert!(new_side >= self.side);
            self.side = new_side;
            self.resizes.push(new_side);
        }

        fn insert_at(&mut self, _item: &(), x: i32, y: i32) {
            self.inserts.push((x, y));
        }
    }

    fn uv_of(atlas: &Atlas<RecordingBacking>, i: usize) -> (f32, f32, f32, f32) {
        let uv = atlas.uvs[i].borrow();
        (uv.x, uv.y, uv.z, uv.w)
    }

    #[test]
    fn first_insert_allocates_the_initial_side() {
        let mut atlas = Atlas::new(RecordingBacking::default());
        assert_eq!(atlas.side(), 0);
        atlas.insert(&(), 10, 12);
        assert_eq!(atlas.side(), INITIAL_ATLAS_SIDE);
        assert_eq!(atlas.backing().resizes, vec![INITIAL_ATLAS_SIDE]);
        assert_eq!(atlas.backing().inserts, vec![(0, 0)]);
    }

    #[test]
    fn uv_equals_rect_over_side() {
        let mut atlas = Atlas::new(RecordingBacking::default());
        atlas.insert(&(), 10, 12);
        let uv = atlas.insert(&(), 11, 14);
        let uv = uv.borrow();
        assert_eq!(uv.x, 10.0 / 64.0);
        assert_eq!(uv.y, 0.0);
        assert_eq!(uv.z, 21.0 / 64.0);
        assert_eq!(uv.w, 14.0 / 64.0);
    }

    #[test]
    fn growth_doubles_the_side_and_rescales_issued_uvs() {
        let mut atlas = Atlas::new(RecordingBacking::default());
        atlas.insert(&(), 10, 12);
        atlas.insert(&(), 11, 14);
        let before_a = uv_of(&atlas, 0);
        let before_g = uv_of(&atlas, 1);

        // Nothing 60x60 fits next to the two glyphs inside 64x64.
        atlas.insert(&(), 60, 60);
        assert_eq!(atlas.side(), 128);
        assert_eq!(atlas.backing().resizes, vec![64, 128]);

        let after_a = uv_of(&atlas, 0);
        let after_g = uv_of(&atlas, 1);
        assert_eq!(after_a, (before_a.0 / 2.0, before_a.1 / 2.0, before_a.2 / 2.0, before_a.3 / 2.0));
        assert_eq!(after_g, (before_g.0 / 2.0, before_g.1 / 2.0, before_g.2 / 2.0, before_g.3 / 2.0));
    }

    #[test]
    fn uvs_match_rects_after_any_growth() {
        let mut atlas = Atlas::new(RecordingBacking::default());
        for (w, h) in [(10, 12), (11, 14), (60, 60), (50, 33), (100, 100)] {
            atlas.insert(&(), w, h);
        }
        let side = atlas.side() as f32;
        for (i, rect) in atlas.rects().iter().enumerate() {
            let uv = atlas.uvs[i].borrow();
            assert!((uv.x - rect.x as f32 / side).abs() < 1e-6);
            assert!((uv.y - rect.y as f32 / side).abs() < 1e-6);
            assert!((uv.z - (rect.x + rect.width) as f32 / side).abs() < 1e-6);
            assert!((uv.w - (rect.y + rect.height) as f32 / side).abs() < 1e-6);
        }
    }

    #[test]
    fn holders_observe_rescale_through_their_shared_reference() {
        let mut atlas = Atlas::new(RecordingBacking::default());
        let held = atlas.insert(&(), 10, 12);
        let before = held.borrow().z;
        atlas.insert(&(), 60, 60);
        let after = held.borrow().z;
        assert_eq!(after, before / 2.0);
    }

    #[test]
    fn oversized_first_insert_grows_until_it_fits() {
        let mut atlas = Atlas::new(RecordingBacking::default());
        atlas.insert(&(), 300, 300);
        assert_eq!(atlas.side(), 512);
    }
}
