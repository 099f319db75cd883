//! Atlas UVs for one block face.

use strata_voxel::{ATLAS_SIZE, TILE_SIZE};

/// Inset applied to every tile edge so sampling never bleeds into the next tile.
pub const ATLAS_UV_EPSILON: f32 = 0.001;

/// UVs of the tile at integer offset `tile`, one per quad corner.
///
/// The order pairs with [`FaceDirection::quad_corners`](crate::FaceDirection::quad_corners):
/// `(right, bottom)`, `(right, top)`, `(left, top)`, `(left, bottom)`.
pub fn tile_uvs(tile: (u16, u16)) -> [[f32; 2]; 4] {
    let scale = TILE_SIZE as f32 / ATLAS_SIZE as f32;
    let e = ATLAS_UV_EPSILON;
    let tx = scale * tile.0 as f32;
    let ty = scale * tile.1 as f32;
    [
        [tx + scale - e, ty + e],
        [tx + scale - e, ty + scale - e],
        [tx + e, ty + scale - e],
        [tx + e, ty + e],
    ]
}
