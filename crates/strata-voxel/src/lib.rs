//! Block registry, dense chunk storage, and the shared chunk map with world/local coordinate math.

pub mod atlas;
pub mod chunk;
pub mod chunk_api;
pub mod chunk_map;
pub mod registry;

pub use atlas::{ATLAS_SIZE, AtlasLayout, TILE_SIZE};
pub use chunk::{ChunkData, ChunkDims};
pub use chunk_api::{BlockLookup, Chunk, TreeColumns, WriteOutcome};
pub use chunk_map::{BlockSource, ChunkMap, ChunkPos, NoNeighbors, PendingWrite};
pub use registry::{AIR_NAME, BlockDef, BlockId, BlockRegistry, FaceTiles, RegistryError};
