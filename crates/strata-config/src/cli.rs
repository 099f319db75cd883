//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "strata", about = "Streaming voxel world")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<i32>,

    /// Render distance in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Worker threads per pipeline stage.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of chunk widths the demo observer walks.
    #[arg(long, default_value_t = 4)]
    pub steps: u32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(rd) = args.render_distance {
            self.world.render_distance = rd;
        }
        if let Some(workers) = args.workers {
            self.streaming.worker_threads = workers;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
