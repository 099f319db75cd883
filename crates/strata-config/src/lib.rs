//! Configuration system for the Strata voxel world.
//!
//! Settings persist to disk as a RON file, tolerate missing or unknown fields,
//! and can be overridden from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BlockNames, Config, DebugConfig, LayerKind, MAX_RENDER_DISTANCE, NoiseSettings,
    StreamingConfig, TerrainConfig, WarpConfig, WorldConfig, default_config_dir,
};
pub use error::ConfigError;
