//! Face culling: decides, per block face, whether it is emitted and into
//! which buffer, then assembles the chunk mesh.

use strata_voxel::{BlockDef, BlockRegistry};

use crate::error::MeshError;
use crate::face_direction::FaceDirection;
use crate::mesh_data::ChunkMesh;
use crate::neighborhood::ChunkNeighborhood;

/// Where a single face goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceTarget {
    /// No geometry: occluded, or the neighbour is unknown.
    Skip,
    Transparent,
    Opaque,
}

/// Classifies the face of `block` that looks at `neighbor`.
///
/// `None` is an unloaded neighbour; the face is skipped rather than guessed,
/// so unloaded chunks never cause seams or walls. A transparent block next to
/// a non-solid neighbour goes to the transparent pass. An opaque block shows
/// its face to anything non-solid or transparent.
pub fn classify_face(block: &BlockDef, neighbor: Option<&BlockDef>) -> FaceTarget {
    let Some(neighbor) = neighbor else {
        return FaceTarget::Skip;
    };
    if block.transparent && !neighbor.solid {
        return FaceTarget::Transparent;
    }
    if !neighbor.solid || (!block.transparent && neighbor.transparent) {
        return FaceTarget::Opaque;
    }
    FaceTarget::Skip
}

/// Builds the opaque, transparent and collider buffers of the centre chunk.
///
/// Vertex positions are chunk-local, with each block centred on its integer
/// coordinate. Faces of collidable blocks are copied into the collider
/// buffers whichever visual pass they land in.
pub fn build_chunk_mesh(
    neighborhood: &ChunkNeighborhood,
    registry: &BlockRegistry,
) -> Result<ChunkMesh, MeshError> {
    let mut mesh = ChunkMesh::new();

    for (local, id) in neighborhood.center().iter() {
        if id.is_air() {
            continue;
        }
        let def = registry.data_of(id)?;
        let Some(tiles) = def.tiles.as_ref() else {
            continue;
        };
        let center = local.as_vec3();

        for direction in FaceDirection::ALL {
            let neighbor = match neighborhood.get(local + direction.offset()) {
                Some(neighbor_id) => Some(registry.data_of(neighbor_id)?),
                None => None,
            };
            let buffers = match classify_face(def, neighbor) {
                FaceTarget::Skip => continue,
                FaceTarget::Transparent => &mut mesh.transparent,
                FaceTarget::Opaque => &mut mesh.opaque,
            };
            buffers.push_face(direction, center, direction.tile(tiles));
            if def.collidable {
                mesh.collider.push_face(direction, center);
            }
        }
    }

    tracing::trace!(
        opaque = mesh.opaque.face_count(),
        transparent = mesh.transparent.face_count(),
        collider = mesh.collider.face_count(),
        "Chunk mesh built"
    );
    Ok(mesh)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
