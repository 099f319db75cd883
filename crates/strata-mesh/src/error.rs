use strata_voxel::RegistryError;

/// Errors raised while building a chunk mesh.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// The chunk holds a block id the registry does not know.
    #[error("mesh block lookup failed: {0}")]
    Registry(#[from] RegistryError),
}
