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

//! Shared font handles and a name-keyed registry. Shaped batches, the shaping
//! pass, and the renderer all hold the same font through a [`FontHandle`], so
//! glyph caches are shared rather than duplicated per consumer.

use std::{cell::RefCell, rc::Rc};
use std::io::{Error, ErrorKind};

use crate::*;

/// Handle that shares ownership of a [`Font`].
pub struct FontHandle {
    handle: Rc<RefCell<Font>>,
}

impl Clone for FontHandle {
    fn clone(&self) -> Self {
        Self { handle: self.handle.clone() }
    }
}

impl FontHandle {
    /// Wraps a font inside an [`Rc<RefCell<...>>`] so it can be shared.
    pub fn new(font: Font) -> Self {
        Self { handle: Rc::new(RefCell::new(font)) }
    }

    /// Executes the provided closure with a shared reference to the font.
    pub fn scope<Res, F: Fn(&Font) -> Res>(&self, f: F) -> Res {
        f(&self.handle.borrow())
    }

    /// Executes the provided closure with a mutable reference to the font.
    pub fn scope_mut<Res, F: FnMut(&mut Font) -> Res>(&self, mut f: F) -> Res {
        f(&mut self.handle.borrow_mut())
    }
}

/// Name-keyed collection of loaded fonts with a default face.
///
/// The first registered font becomes the default until
/// [`set_default`](FontRegistry::set_default) overrides it.
#[derive(Default)]
pub struct FontRegistry {
    fonts: Vec<(String, FontHandle)>,
    default: Option<FontHandle>,
}

impl FontRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font under `name`, replacing any previous entry with the
    /// same name. Returns a handle to the registered font.
    pub fn register(&mut self, name: &str, font: Font) -> FontHandle {
        let handle = FontHandle::new(font);
        match self.fonts.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = handle.clone(),
            None => self.fonts.push((name.to_string(), handle.clone())),
        }
        if self.default.is_none() {
            self.default = Some(handle.clone());
        }
        handle
    }

    /// Loads a font file and registers it under `name`.
    #[cfg(feature = "fontdue")]
    pub fn load_from_file(&mut self, name: &str, path: &str) -> std::io::Result<FontHandle> {
        Ok(self.register(name, Font::from_file(path)?))
    }

    /// Loads font bytes and registers them under `name`.
    #[cfg(feature = "fontdue")]
    pub fn load_from_bytes(&mut self, name: &str, bytes: &[u8]) -> std::io::Result<FontHandle> {
        Ok(self.register(name, Font::from_bytes(bytes)?))
    }

    /// Looks a font up by name.
    pub fn get(&self, name: &str) -> Option<FontHandle> {
        self.fonts.iter().find(|(n, _)| n == name).map(|(_, h)| h.clone())
    }

    /// Returns the default font, if any font was registered.
    pub fn default_font(&self) -> Option<FontHandle> {
        self.default.clone()
    }

    /// Makes a registered font the default.
    pub fn set_default(&mut self, name: &str) -> std::io::Result<()> {
        match self.get(name) {
            Some(handle) => {
                self.default = Some(handle);
                Ok(())
            }
            None => Err(Error::new(ErrorKind::NotFound, format!("No font named '{}'", name))),
        }
    }
}
