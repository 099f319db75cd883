use strata_config::ConfigError;
use strata_mesh::MeshError;
use strata_terrain::TerrainError;
use strata_voxel::RegistryError;

/// Errors surfaced by the streaming world.
///
/// A superseded streaming cycle is not an error and never shows up here.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A required collaborator was not supplied to the builder.
    #[error("world is missing its {0}")]
    MissingCollaborator(&'static str),
    #[error("invalid world configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("terrain generation failed: {0}")]
    Terrain(#[from] TerrainError),
    #[error("meshing failed: {0}")]
    Mesh(#[from] MeshError),
    /// An edit or query arrived before the first batch finished loading.
    #[error("world is not loaded yet")]
    NotLoaded,
    #[error("failed to spawn streaming thread: {0}")]
    Spawn(#[from] std::io::Error),
}
