//! Mesh cache invalidation: tracks chunk data versions and determines which
//! chunks need remeshing after block edits.

use glam::IVec3;
use strata_voxel::{ChunkDims, ChunkPos};

use crate::face_direction::FaceDirection;

/// Mesh cache state of one rendered chunk.
#[derive(Clone, Debug, Default)]
pub struct ChunkMeshState {
    /// Data version the current mesh was built from.
    pub meshed_version: u64,
    /// A rebuild is already queued.
    pub remesh_pending: bool,
}

impl ChunkMeshState {
    pub fn new(meshed_version: u64) -> Self {
        Self {
            meshed_version,
            remesh_pending: false,
        }
    }

    /// Returns `true` if the mesh was built from older data.
    pub fn is_stale(&self, current_data_version: u64) -> bool {
        self.meshed_version != current_data_version
    }

    /// Returns `true` if this chunk needs a rebuild queued.
    pub fn needs_remesh(&self, current_data_version: u64) -> bool {
        self.is_stale(current_data_version) && !self.remesh_pending
    }
}

/// Determines which chunks need remeshing after a block edit.
pub struct MeshInvalidator;

impl MeshInvalidator {
    /// Chunks to rebuild after the block at `local` inside `edited` changed.
    ///
    /// The edited chunk always comes first. A face neighbour is added when
    /// the edit sits on the boundary they share, since its culling depends
    /// on the edited block.
    pub fn invalidate(edited: ChunkPos, local: IVec3, dims: ChunkDims) -> Vec<ChunkPos> {
        let mut dirty = vec![edited];
        let (s, h) = (dims.size(), dims.height());

        let touching = [
            (local.x == 0, FaceDirection::West),
            (local.x == s - 1, FaceDirection::East),
            (local.y == 0, FaceDirection::Down),
            (local.y == h - 1, FaceDirection::Up),
            (local.z == 0, FaceDirection::South),
            (local.z == s - 1, FaceDirection::North),
        ];
        for (on_boundary, side) in touching {
            if on_boundary {
                let step = side.offset();
                let neighbor = edited.step(step.x, step.y, step.z, dims);
                if !dirty.contains(&neighbor) {
                    dirty.push(neighbor);
                }
            }
        }
        dirty
    }
}
