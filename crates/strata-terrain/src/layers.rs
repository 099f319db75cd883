//! Ordered layer rules deciding the block at each position of a column.
//!
//! A chain is evaluated once per `y`. The first rule that returns
//! `Some(Applied)` claims that position and the rest of the chain is skipped
//! for it; the next `y` starts again from the top of the chain.

use glam::{IVec2, IVec3};
use strata_config::{LayerKind, NoiseSettings, TerrainConfig};
use strata_voxel::{
    BlockId, BlockLookup, BlockRegistry, BlockSource, Chunk, PendingWrite, WriteOutcome,
};

use crate::domain_warp::DomainWarp;
use crate::error::TerrainError;
use crate::tree::{TRUNK_HEIGHT, canopy_offsets};

/// What a rule did when it claimed a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// Wrote a single block at the position.
    Block(BlockId),
    /// Wrote (or previously wrote) a vertical span covering the position.
    Span(BlockId),
    /// Stamped a tree on the column.
    Tree,
}

/// Per-column scratch shared by every `y` of one column.
#[derive(Clone, Debug, Default)]
pub struct ColumnState {
    stone_sample: Option<f32>,
    stone_filled: bool,
}

/// Everything a rule may look at or touch for one position.
pub struct LayerContext<'a> {
    chunk: &'a mut Chunk,
    source: &'a dyn BlockSource,
    pending: &'a mut Vec<PendingWrite>,
    column_state: &'a mut ColumnState,
    /// Local `(x, z)` of the column.
    pub column: IVec2,
    /// World y being decided.
    pub y: i32,
    /// World ground height of the column.
    pub ground: i32,
    pub seed: i32,
}

impl<'a> LayerContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chunk: &'a mut Chunk,
        source: &'a dyn BlockSource,
        pending: &'a mut Vec<PendingWrite>,
        column_state: &'a mut ColumnState,
        column: IVec2,
        y: i32,
        ground: i32,
        seed: i32,
    ) -> Self {
        Self {
            chunk,
            source,
            pending,
            column_state,
            column,
            y,
            ground,
            seed,
        }
    }

    pub fn chunk_origin(&self) -> IVec3 {
        self.chunk.origin()
    }

    /// Local position of world height `y` in this column.
    fn local_at(&self, y: i32) -> IVec3 {
        IVec3::new(self.column.x, y - self.chunk.origin().y, self.column.y)
    }

    /// Reads a local position, asking the neighbour source when it leaves the chunk.
    fn block(&self, local: IVec3) -> Option<BlockId> {
        match self.chunk.block(local) {
            BlockLookup::Inside(block) => Some(block),
            BlockLookup::Outside(world) => self.source.block_at(world),
        }
    }

    /// Writes a local position; writes leaving the chunk are queued.
    fn set(&mut self, local: IVec3, block: BlockId, replace: bool) {
        if let WriteOutcome::Outside(write) = self.chunk.set_block(local, block, replace) {
            self.pending.push(write);
        }
    }
}

/// Noise-driven stone outcrop.
#[derive(Clone)]
pub struct StoneRule {
    pub stone: BlockId,
    pub threshold: f32,
    pub noise: NoiseSettings,
    pub warp: DomainWarp,
}

/// Tree stamping on columns flagged by placement.
#[derive(Clone, Copy, Debug)]
pub struct TreeRule {
    pub trunk: BlockId,
    pub leaves: BlockId,
    pub surface: BlockId,
    pub subsurface: BlockId,
    pub height_limit: i32,
    /// Columns whose ground sits below this are underwater and never grow trees.
    pub sea_level: i32,
}

/// One resolved rule of the chain.
#[derive(Clone)]
pub enum LayerRule {
    Air {
        air: BlockId,
        sea_level: i32,
    },
    Stone(StoneRule),
    Surface {
        surface: BlockId,
        subsurface: BlockId,
        depth: i32,
    },
    Tree(TreeRule),
    Water {
        water: BlockId,
        shore: BlockId,
        sea_level: i32,
        shore_depth: i32,
    },
    Underground {
        underground: BlockId,
        bedrock: BlockId,
        bedrock_height: i32,
    },
}

impl LayerRule {
    /// Resolves a configured rule against the registry.
    pub fn resolve(
        kind: LayerKind,
        config: &TerrainConfig,
        registry: &BlockRegistry,
    ) -> Result<Self, TerrainError> {
        let blocks = &config.blocks;
        let rule = match kind {
            LayerKind::Air => LayerRule::Air {
                air: BlockId::AIR,
                sea_level: config.sea_level,
            },
            LayerKind::Stone => LayerRule::Stone(StoneRule {
                stone: registry.id_of(&blocks.underground)?,
                threshold: config.stone_threshold,
                noise: config.stone_noise,
                warp: DomainWarp::from_config(&config.warp),
            }),
            LayerKind::Surface => LayerRule::Surface {
                surface: registry.id_of(&blocks.surface)?,
                subsurface: registry.id_of(&blocks.subsurface)?,
                depth: config.surface_depth,
            },
            LayerKind::Tree => LayerRule::Tree(TreeRule {
                trunk: registry.id_of(&blocks.trunk)?,
                leaves: registry.id_of(&blocks.leaves)?,
                surface: registry.id_of(&blocks.surface)?,
                subsurface: registry.id_of(&blocks.subsurface)?,
                height_limit: config.tree_height_limit,
                sea_level: config.sea_level,
            }),
            LayerKind::Water => LayerRule::Water {
                water: registry.id_of(&blocks.water)?,
                shore: registry.id_of(&blocks.shore)?,
                sea_level: config.sea_level,
                shore_depth: config.shore_depth,
            },
            LayerKind::Underground => LayerRule::Underground {
                underground: registry.id_of(&blocks.underground)?,
                bedrock: registry.id_of(&blocks.bedrock)?,
                bedrock_height: config.bedrock_height,
            },
        };
        Ok(rule)
    }

    /// Resolves a whole chain, preserving order.
    pub fn resolve_chain(
        kinds: &[LayerKind],
        config: &TerrainConfig,
        registry: &BlockRegistry,
    ) -> Result<Vec<Self>, TerrainError> {
        kinds
            .iter()
            .map(|&kind| Self::resolve(kind, config, registry))
            .collect()
    }

    pub fn kind(&self) -> LayerKind {
        match self {
            LayerRule::Air { .. } => LayerKind::Air,
            LayerRule::Stone(_) => LayerKind::Stone,
            LayerRule::Surface { .. } => LayerKind::Surface,
            LayerRule::Tree(_) => LayerKind::Tree,
            LayerRule::Water { .. } => LayerKind::Water,
            LayerRule::Underground { .. } => LayerKind::Underground,
        }
    }

    /// Decides the position in `ctx`. `None` passes it to the next rule.
    pub fn apply(&self, ctx: &mut LayerContext<'_>) -> Option<Applied> {
        let (y, ground) = (ctx.y, ctx.ground);
        match self {
            // Positions at or below sea level are left for the water rule.
            LayerRule::Air { air, sea_level } => {
                if y > ground && y > *sea_level {
                    ctx.set(ctx.local_at(y), *air, true);
                    return Some(Applied::Block(*air));
                }
                None
            }
            LayerRule::Stone(rule) => rule.apply(ctx),
            LayerRule::Surface {
                surface,
                subsurface,
                depth,
            } => {
                let block = if y == ground {
                    *surface
                } else if y < ground && y >= ground - depth {
                    *subsurface
                } else {
                    return None;
                };
                ctx.set(ctx.local_at(y), block, true);
                Some(Applied::Block(block))
            }
            LayerRule::Tree(rule) => rule.apply(ctx),
            LayerRule::Water {
                water,
                shore,
                sea_level,
                shore_depth,
            } => {
                let block = if y > ground && y <= *sea_level {
                    if y == ground + 1 { *shore } else { *water }
                } else if y <= *sea_level && y >= ground - shore_depth {
                    *shore
                } else {
                    return None;
                };
                ctx.set(ctx.local_at(y), block, true);
                Some(Applied::Block(block))
            }
            LayerRule::Underground {
                underground,
                bedrock,
                bedrock_height,
            } => {
                let block = if y == *bedrock_height {
                    *bedrock
                } else if y < ground {
                    *underground
                } else {
                    return None;
                };
                ctx.set(ctx.local_at(y), block, true);
                Some(Applied::Block(block))
            }
        }
    }
}

impl StoneRule {
    fn apply(&self, ctx: &mut LayerContext<'_>) -> Option<Applied> {
        let origin = ctx.chunk_origin();
        if origin.y > ctx.ground {
            return None;
        }

        let sample = match ctx.column_state.stone_sample {
            Some(sample) => sample,
            None => {
                let wx = (origin.x + ctx.column.x) as f32;
                let wz = (origin.z + ctx.column.y) as f32;
                let sample = self.warp.warped(wx, wz, &self.noise, ctx.seed);
                ctx.column_state.stone_sample = Some(sample);
                sample
            }
        };
        if sample <= self.threshold {
            return None;
        }

        // Rows below the origin fill to their own top; the origin row stops at the ground.
        let end = if origin.y < 0 {
            origin.y + ctx.chunk.dims().height() - 1
        } else {
            ctx.ground
        };
        if ctx.y < origin.y || ctx.y > end {
            return None;
        }

        if !ctx.column_state.stone_filled {
            for y in origin.y..=end {
                ctx.set(ctx.local_at(y), self.stone, true);
            }
            ctx.column_state.stone_filled = true;
        }
        Some(Applied::Span(self.stone))
    }
}

impl TreeRule {
    fn apply(&self, ctx: &mut LayerContext<'_>) -> Option<Applied> {
        if ctx.chunk_origin().y < 0 || ctx.ground > self.height_limit {
            return None;
        }
        if ctx.ground < self.sea_level {
            return None;
        }
        if !ctx.chunk.has_tree_column(ctx.column) {
            return None;
        }

        // Only claims once the ground block is resolved, so an early visit in
        // the first pass cannot leave an unset hole in the column.
        let ground_local = ctx.local_at(ctx.ground);
        let ground_block = ctx.block(ground_local)?;
        if ground_block != self.surface && ground_block != self.subsurface {
            return None;
        }

        ctx.chunk.take_tree_column(ctx.column);
        ctx.set(ground_local, self.subsurface, true);
        for dy in 1..=TRUNK_HEIGHT {
            ctx.set(ground_local + IVec3::new(0, dy, 0), self.trunk, false);
        }
        for offset in canopy_offsets() {
            ctx.set(ground_local + offset, self.leaves, false);
        }
        Some(Applied::Tree)
    }
}
