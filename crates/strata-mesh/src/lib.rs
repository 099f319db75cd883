//! Face-culling mesh builder: neighbourhood snapshots, per-face emission rules,
//! opaque/transparent/collider buffers, and remesh invalidation after edits.

pub mod atlas_uv;
pub mod error;
pub mod face_direction;
pub mod invalidation;
pub mod mesh_data;
pub mod neighborhood;
pub mod visibility;

pub use atlas_uv::{ATLAS_UV_EPSILON, tile_uvs};
pub use error::MeshError;
pub use face_direction::FaceDirection;
pub use invalidation::{ChunkMeshState, MeshInvalidator};
pub use mesh_data::{ChunkMesh, ColliderBuffers, MeshBuffers};
pub use neighborhood::{ChunkBoundarySlice, ChunkNeighborhood};
pub use visibility::{FaceTarget, build_chunk_mesh, classify_face};
