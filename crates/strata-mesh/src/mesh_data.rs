//! Mesh buffers produced for one chunk.

use glam::Vec3;

use crate::atlas_uv::tile_uvs;
use crate::face_direction::FaceDirection;

/// Positions, normals, UVs and triangle indices for one material pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Three indices per triangle, two triangles per face.
    pub triangles: Vec<u32>,
}

impl MeshBuffers {
    /// Appends the `direction` face of the block centred on `center`.
    pub fn push_face(&mut self, direction: FaceDirection, center: Vec3, tile: (u16, u16)) {
        let normal = direction.normal();
        self.positions.extend(direction.quad_corners(center));
        self.normals.extend([normal; 4]);
        self.uvs.extend(tile_uvs(tile));
        push_quad_triangles(&mut self.triangles, self.positions.len());
    }

    /// Number of emitted faces.
    pub fn face_count(&self) -> usize {
        self.positions.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Empties the buffers, keeping their allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.uvs.clear();
        self.triangles.clear();
    }
}

/// Geometry-only buffers for physical collision.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColliderBuffers {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<u32>,
}

impl ColliderBuffers {
    pub fn push_face(&mut self, direction: FaceDirection, center: Vec3) {
        self.positions.extend(direction.quad_corners(center));
        push_quad_triangles(&mut self.triangles, self.positions.len());
    }

    pub fn face_count(&self) -> usize {
        self.positions.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.triangles.clear();
    }
}

/// Two triangles over the last four vertices: `{0,1,2}` and `{0,2,3}`.
fn push_quad_triangles(triangles: &mut Vec<u32>, vertex_count: usize) {
    let n = vertex_count as u32;
    triangles.extend_from_slice(&[n - 4, n - 3, n - 2, n - 4, n - 2, n - 1]);
}

/// Everything the mesh builder produces for one chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub opaque: MeshBuffers,
    pub transparent: MeshBuffers,
    pub collider: ColliderBuffers,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible faces across both material passes.
    pub fn face_count(&self) -> usize {
        self.opaque.face_count() + self.transparent.face_count()
    }

    /// `true` when no pass has any geometry.
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty() && self.collider.is_empty()
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
        self.collider.clear();
    }
}
