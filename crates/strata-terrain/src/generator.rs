//! Chunk generation: ground height per column, then the layer chain per block.

use glam::IVec2;
use strata_config::Config;
use strata_voxel::{BlockRegistry, BlockSource, Chunk, NoNeighbors, PendingWrite};

use crate::domain_warp::DomainWarp;
use crate::error::TerrainError;
use crate::ground::{GroundHeight, WarpedGround};
use crate::layers::{ColumnState, LayerContext, LayerRule};
use crate::tree::TreePlacer;

/// Fills chunks from the configured layer chains.
///
/// Generation is pure with respect to the chunk: writes that leave it are
/// returned as [`PendingWrite`]s for the caller to route.
pub struct TerrainGenerator {
    seed: i32,
    ground: Box<dyn GroundHeight>,
    trees: TreePlacer,
    layers: Vec<LayerRule>,
    additional: Vec<LayerRule>,
}

impl TerrainGenerator {
    /// Builds the generator, resolving every configured block name up front.
    pub fn from_config(config: &Config, registry: &BlockRegistry) -> Result<Self, TerrainError> {
        let terrain = &config.terrain;
        let seed = config.world.seed;
        let warp = DomainWarp::from_config(&terrain.warp);

        let ground = WarpedGround::new(
            warp.clone(),
            terrain.biome_noise,
            seed,
            config.world.chunk_height as i32,
        );
        let trees = TreePlacer::new(warp, terrain.tree_noise, seed);
        let layers = LayerRule::resolve_chain(&terrain.layers, terrain, registry)?;
        let additional = LayerRule::resolve_chain(&terrain.additional_layers, terrain, registry)?;

        tracing::debug!(
            seed,
            layers = layers.len(),
            additional = additional.len(),
            "Terrain generator ready"
        );

        Ok(Self {
            seed,
            ground: Box::new(ground),
            trees,
            layers,
            additional,
        })
    }

    /// Replaces the ground height source.
    pub fn with_ground(mut self, ground: impl GroundHeight + 'static) -> Self {
        self.ground = Box::new(ground);
        self
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Ground height of world column `(x, z)` as seen from a chunk row at `origin_y`.
    ///
    /// Rows below the origin row see the surface shifted up by their depth, so
    /// they generate as solid underground.
    pub fn ground_height(&self, x: i32, z: i32, origin_y: i32) -> i32 {
        self.ground.surface_height(x, z) + origin_y.abs()
    }

    /// First pass: places tree columns and runs the main chain over every
    /// block, bottom to top. Neighbouring chunks are not consulted.
    pub fn generate(&self, chunk: &mut Chunk) -> Vec<PendingWrite> {
        let dims = chunk.dims();
        let origin = chunk.origin();
        chunk.set_tree_columns(self.trees.place(chunk.pos(), dims.size()));

        let mut pending = Vec::new();
        for z in 0..dims.size() {
            for x in 0..dims.size() {
                let ground = self.ground_height(origin.x + x, origin.z + z, origin.y);
                let mut state = ColumnState::default();
                for y in origin.y..origin.y + dims.height() {
                    let mut ctx = LayerContext::new(
                        chunk,
                        &NoNeighbors,
                        &mut pending,
                        &mut state,
                        IVec2::new(x, z),
                        y,
                        ground,
                        self.seed,
                    );
                    for rule in &self.layers {
                        if rule.apply(&mut ctx).is_some() {
                            break;
                        }
                    }
                }
            }
        }

        tracing::trace!(pos = ?chunk.pos(), pending = pending.len(), "Chunk generated");
        pending
    }

    /// Second pass: runs every additional rule once per column, with
    /// `source` answering reads that leave the chunk.
    pub fn generate_additional(&self, chunk: &mut Chunk, source: &dyn BlockSource) -> Vec<PendingWrite> {
        let mut pending = Vec::new();
        if self.additional.is_empty() {
            return pending;
        }

        let dims = chunk.dims();
        let origin = chunk.origin();
        for z in 0..dims.size() {
            for x in 0..dims.size() {
                let ground = self.ground_height(origin.x + x, origin.z + z, origin.y);
                let mut state = ColumnState::default();
                let mut ctx = LayerContext::new(
                    chunk,
                    source,
                    &mut pending,
                    &mut state,
                    IVec2::new(x, z),
                    origin.y,
                    ground,
                    self.seed,
                );
                for rule in &self.additional {
                    rule.apply(&mut ctx);
                }
            }
        }
        pending
    }
}
