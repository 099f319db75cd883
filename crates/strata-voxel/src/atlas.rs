//! Texture-atlas tile bookkeeping.
//!
//! Image packing happens elsewhere; this only hands out tile offsets so that
//! every block face group maps to a distinct cell of a square atlas.

use crate::registry::FaceTiles;

/// Atlas edge length in pixels.
pub const ATLAS_SIZE: u32 = 256;
/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 16;

/// Row-major allocator of atlas tiles.
#[derive(Clone, Debug)]
pub struct AtlasLayout {
    tiles_per_row: u32,
    next: u32,
}

impl AtlasLayout {
    /// Creates a layout for an atlas of `atlas_size` pixels with `tile_size` tiles.
    pub fn new(atlas_size: u32, tile_size: u32) -> Self {
        Self {
            tiles_per_row: (atlas_size / tile_size.max(1)).max(1),
            next: 0,
        }
    }

    /// Total number of tiles the atlas can hold.
    pub fn capacity(&self) -> u32 {
        self.tiles_per_row * self.tiles_per_row
    }

    /// Number of tiles handed out so far.
    pub fn used(&self) -> u32 {
        self.next
    }

    /// Reserves three consecutive tiles (top, bottom, side) for one block.
    ///
    /// Returns `None` once the atlas is full.
    pub fn allocate(&mut self) -> Option<FaceTiles> {
        if self.next + 3 > self.capacity() {
            return None;
        }
        let top = self.tile_at(self.next);
        let bottom = self.tile_at(self.next + 1);
        let side = self.tile_at(self.next + 2);
        self.next += 3;
        Some(FaceTiles { top, bottom, side })
    }

    fn tile_at(&self, slot: u32) -> (u16, u16) {
        ((slot % self.tiles_per_row) as u16, (slot / self.tiles_per_row) as u16)
    }
}

impl Default for AtlasLayout {
    fn default() -> Self {
        Self::new(ATLAS_SIZE, TILE_SIZE)
    }
}
