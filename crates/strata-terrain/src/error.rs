//! Terrain generator construction errors.

use strata_voxel::RegistryError;

/// Errors raised while building a [`TerrainGenerator`](crate::TerrainGenerator).
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// A block named by the terrain config is not registered.
    #[error("terrain block lookup failed: {0}")]
    Registry(#[from] RegistryError),
}
