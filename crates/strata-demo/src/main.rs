//! Headless demo: streams a world around an observer walking along +X.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --steps 6 --render-distance 4`.

mod game_loop;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use glam::{IVec3, Vec3};
use strata_config::{CliArgs, Config, ConfigError, default_config_dir};
use strata_terrain::{TerrainError, TerrainGenerator};
use strata_voxel::BlockRegistry;
use strata_world::{MemorySink, World, WorldError, WorldEvent};
use tracing::info;

use crate::game_loop::GameLoop;

/// Simulated seconds allowed for the first batch to load.
const LOAD_TIMEOUT_SECS: f64 = 120.0;

/// Observer speed in chunk widths per second.
const WALK_SPEED_CHUNKS: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("world did not load within {0} simulated seconds")]
    LoadTimeout(f64),
}

fn main() {
    let args = CliArgs::parse();
    if let Err(err) = run(&args) {
        tracing::error!("{err}");
        eprintln!("strata-demo: {err}");
        std::process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), DemoError> {
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(args);
    config.validate()?;

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let registry = Arc::new(BlockRegistry::with_default_blocks());
    let generator = Arc::new(TerrainGenerator::from_config(&config, &registry)?);
    let chunk_size = config.world.chunk_size as f32;
    let start = Vec3::new(0.0, config.terrain.sea_level as f32 + 2.0, 0.0);

    let mut world = World::builder()
        .config(config)
        .registry(registry)
        .generator(generator)
        .sink(MemorySink::new())
        .build()?;

    let mut game_loop = GameLoop::new();
    world.generate_world(start)?;
    while !world.is_loaded() {
        game_loop.tick(|_| {
            world.tick();
            Ok::<_, DemoError>(())
        })?;
        if game_loop.total_sim_time() > LOAD_TIMEOUT_SECS {
            return Err(DemoError::LoadTimeout(LOAD_TIMEOUT_SECS));
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    log_events(&mut world);
    info!(stats = ?world.stats(), "Initial area loaded");

    let target_x = args.steps as f32 * chunk_size;
    let mut observer = start;
    loop {
        game_loop.tick(|dt| {
            let dt = dt as f32;
            observer.x = (observer.x + WALK_SPEED_CHUNKS * chunk_size * dt).min(target_x);
            world.update_observer(dt, observer)?;
            world.tick();
            Ok::<_, DemoError>(())
        })?;
        log_events(&mut world);

        let stats = world.stats();
        if observer.x >= target_x && stats.running_cycles == 0 && stats.queued_activations == 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }

    // Catch the last stretch the tracker has not sampled yet.
    if world.load_chunks_around(observer)? {
        while world.stats().running_cycles > 0 || world.stats().queued_activations > 0 {
            world.tick();
            std::thread::sleep(Duration::from_millis(1));
        }
        log_events(&mut world);
    }

    edit_under_observer(&mut world, observer)?;

    let stats = world.stats();
    let sink = world.sink().stats();
    info!(
        data_chunks = stats.data_chunks,
        modified_chunks = stats.modified_chunks,
        rendered_chunks = stats.rendered_chunks,
        pool_size = sink.pool_size,
        pool_free = sink.free,
        pool_reused = sink.reused,
        mesh_updates = sink.mesh_updates,
        sim_secs = game_loop.total_sim_time(),
        "Demo finished"
    );
    world.close();
    Ok(())
}

/// Drops a stone block on the first solid block below the observer.
fn edit_under_observer(world: &mut World<MemorySink>, observer: Vec3) -> Result<(), DemoError> {
    let height = world.config().world.chunk_height as i32;
    let column = observer.floor().as_ivec3();
    let top = (0..height)
        .rev()
        .find(|&y| {
            world
                .block_at(IVec3::new(column.x, y, column.z))
                .ok()
                .flatten()
                .is_some_and(|id| !id.is_air())
        });
    let Some(top) = top else {
        info!(?column, "No ground under the observer to edit");
        return Ok(());
    };

    let target = IVec3::new(column.x, top + 1, column.z);
    let placed = world.set_block(target, "stone")?;
    info!(
        ?target,
        placed,
        now = world.block_name_at(target)?.unwrap_or("unloaded"),
        "Edited block under observer"
    );
    Ok(())
}

fn log_events(world: &mut World<MemorySink>) {
    for event in world.drain_events() {
        match event {
            WorldEvent::WorldLoaded => info!("World loaded"),
            WorldEvent::ChunksLoaded { count } => info!(count, "Chunks loaded"),
        }
    }
}
