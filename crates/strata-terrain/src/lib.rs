//! Procedural terrain: octave noise with domain warping, ground height, the
//! ordered layer-rule chain, and local-maxima tree placement.

mod domain_warp;
mod error;
mod generator;
mod ground;
mod layers;
mod local_maxima;
mod noise_field;
mod tree;

pub use domain_warp::DomainWarp;
pub use error::TerrainError;
pub use generator::TerrainGenerator;
pub use ground::{FlatGround, GroundHeight, WarpedGround};
pub use layers::{Applied, ColumnState, LayerContext, LayerRule, StoneRule, TreeRule};
pub use local_maxima::{NoiseGrid, find_local_maxima};
pub use noise_field::{NoiseField, redistribute, remap, remap01};
pub use tree::{TRUNK_HEIGHT, TreePlacer};
