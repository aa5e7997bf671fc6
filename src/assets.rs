use std::collections::HashMap;

use crate::scale::Size;

/// Natural size of a loaded sprite texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    pub width: i32,
    pub height: i32,
    pub disposed: bool,
}

impl Texture {
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            disposed: false,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Source of sprite textures.
///
/// Window sprites (backgrounds, eye frames) are gumps; item sprites are art.
pub trait TextureProvider {
    fn gump(&self, id: u16) -> Option<Texture>;
    fn art(&self, id: u16) -> Option<Texture>;

    /// Natural size of a gump that is loaded and not disposed.
    fn gump_size(&self, id: u16) -> Option<Size> {
        self.gump(id).filter(|t| !t.disposed).map(|t| t.size())
    }

    /// Natural size of an art sprite that is loaded and not disposed.
    fn art_size(&self, id: u16) -> Option<Size> {
        self.art(id).filter(|t| !t.disposed).map(|t| t.size())
    }
}

/// In-memory texture sizes, keyed by sprite id.
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    gumps: HashMap<u16, Texture>,
    art: HashMap<u16, Texture>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gump(mut self, id: u16, width: i32, height: i32) -> Self {
        self.gumps.insert(id, Texture::new(width, height));
        self
    }

    pub fn with_art(mut self, id: u16, width: i32, height: i32) -> Self {
        self.art.insert(id, Texture::new(width, height));
        self
    }

    pub fn insert_gump(&mut self, id: u16, texture: Texture) {
        self.gumps.insert(id, texture);
    }

    pub fn insert_art(&mut self, id: u16, texture: Texture) {
        self.art.insert(id, texture);
    }

    /// Mark an art texture as disposed; lookups still return it.
    pub fn dispose_art(&mut self, id: u16) {
        if let Some(texture) = self.art.get_mut(&id) {
            texture.disposed = true;
        }
    }
}

impl TextureProvider for TextureTable {
    fn gump(&self, id: u16) -> Option<Texture> {
        self.gumps.get(&id).copied()
    }

    fn art(&self, id: u16) -> Option<Texture> {
        self.art.get(&id).copied()
    }
}
