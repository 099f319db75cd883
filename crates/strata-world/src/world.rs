//! The streaming world: owns chunk data and render handles, runs streaming
//! cycles in the background and activates their results from `tick`.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use glam::{IVec3, Vec3};
use rustc_hash::{FxHashMap, FxHashSet};
use strata_config::Config;
use strata_mesh::{ChunkMesh, ChunkMeshState, ChunkNeighborhood, MeshInvalidator, build_chunk_mesh};
use strata_terrain::TerrainGenerator;
use strata_voxel::{BlockId, BlockRegistry, BlockSource, ChunkDims, ChunkMap, ChunkPos};

use crate::activation::{ActivationQueue, ReadyMesh};
use crate::cancel::CancellationToken;
use crate::cycle::{CycleReport, CycleRequest, Pipeline, run_cycle_and_report};
use crate::error::WorldError;
use crate::observer::ObserverTracker;
use crate::sink::RenderSink;
use crate::stage::worker_count;
use crate::wanted::{StreamingPlan, wanted_positions};

/// Lifecycle of one chunk coordinate as seen by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    Absent,
    DataGenerating,
    DataReady,
    MeshGenerating,
    MeshReady,
    Active,
}

/// Notifications collected by [`World::drain_events`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    /// The first batch after `generate_world` is fully active.
    WorldLoaded,
    /// A later batch is fully active.
    ChunksLoaded { count: usize },
}

/// Counters for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub data_chunks: usize,
    pub modified_chunks: usize,
    pub rendered_chunks: usize,
    pub queued_activations: usize,
    pub running_cycles: usize,
}

#[derive(Debug)]
struct RenderedChunk<H> {
    handle: H,
    mesh: ChunkMeshState,
}

/// Assembles a [`World`] from its collaborators.
pub struct WorldBuilder<S> {
    config: Config,
    registry: Option<Arc<BlockRegistry>>,
    generator: Option<Arc<TerrainGenerator>>,
    sink: Option<S>,
}

impl<S> Default for WorldBuilder<S> {
    fn default() -> Self {
        Self {
            config: Config::default(),
            registry: None,
            generator: None,
            sink: None,
        }
    }
}

impl<S: RenderSink> WorldBuilder<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: Arc<BlockRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn generator(mut self, generator: Arc<TerrainGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Validates the config and checks every collaborator was supplied.
    pub fn build(self) -> Result<World<S>, WorldError> {
        self.config.validate()?;
        let registry = self
            .registry
            .ok_or(WorldError::MissingCollaborator("block registry"))?;
        let generator = self
            .generator
            .ok_or(WorldError::MissingCollaborator("terrain generator"))?;
        let sink = self
            .sink
            .ok_or(WorldError::MissingCollaborator("render sink"))?;

        let dims = ChunkDims::new(self.config.world.chunk_size, self.config.world.chunk_height);
        let workers = worker_count(self.config.streaming.worker_threads);
        let tracker = ObserverTracker::new(
            dims,
            self.config.streaming.load_check_interval_secs,
            Vec3::ZERO,
        );
        let (reports_tx, reports_rx) = unbounded();

        tracing::info!(
            size = dims.size(),
            height = dims.height(),
            render_distance = self.config.world.render_distance,
            workers,
            "World created"
        );

        Ok(World {
            pipeline: Arc::new(Pipeline {
                map: Arc::new(ChunkMap::new(dims)),
                generator,
                registry,
                workers,
            }),
            config: self.config,
            sink,
            rendered: FxHashMap::default(),
            activation: ActivationQueue::new(),
            cancel: CancellationToken::new(),
            reports_tx,
            reports_rx,
            cycles: Vec::new(),
            tracker,
            generating: FxHashSet::default(),
            meshing: FxHashSet::default(),
            batch: None,
            loaded: false,
            events: Vec::new(),
        })
    }
}

/// A streaming voxel world around one observer.
pub struct World<S: RenderSink> {
    config: Config,
    pipeline: Arc<Pipeline>,
    sink: S,
    rendered: FxHashMap<ChunkPos, RenderedChunk<S::Handle>>,
    activation: ActivationQueue,
    cancel: CancellationToken,
    reports_tx: Sender<CycleReport>,
    reports_rx: Receiver<CycleReport>,
    /// Cycle threads not yet joined, with their epochs.
    cycles: Vec<(u64, JoinHandle<()>)>,
    tracker: ObserverTracker,
    /// In flight for the current cycle.
    generating: FxHashSet<ChunkPos>,
    meshing: FxHashSet<ChunkPos>,
    /// Activations so far in the batch being drained, if one is.
    batch: Option<usize>,
    loaded: bool,
    events: Vec<WorldEvent>,
}

impl<S: RenderSink> World<S> {
    pub fn builder() -> WorldBuilder<S> {
        WorldBuilder::new()
    }

    // --- Streaming ---

    /// Starts the initial streaming cycle around `observer`.
    ///
    /// The world reports [`WorldEvent::WorldLoaded`] once every chunk of
    /// that first batch has been activated by [`World::tick`].
    pub fn generate_world(&mut self, observer: Vec3) -> Result<(), WorldError> {
        self.tracker.recenter(observer);
        self.start_cycle(observer)
    }

    /// Starts a streaming cycle around `observer`, superseding any cycle
    /// still running. Returns `false` if the world has not loaded yet.
    pub fn load_chunks_around(&mut self, observer: Vec3) -> Result<bool, WorldError> {
        if !self.loaded {
            tracing::warn!("Ignoring chunk load request: world is not loaded yet");
            return Ok(false);
        }
        self.start_cycle(observer)?;
        Ok(true)
    }

    /// Feeds the observer position; starts a new cycle when it has moved far
    /// enough since the last one.
    pub fn update_observer(&mut self, dt: f32, observer: Vec3) -> Result<bool, WorldError> {
        if !self.loaded || !self.tracker.should_reload(dt, observer) {
            return Ok(false);
        }
        self.tracker.recenter(observer);
        self.load_chunks_around(observer)
    }

    /// Collects finished cycles and activates up to `activations_per_tick`
    /// ready chunks. Returns the number activated.
    pub fn tick(&mut self) -> usize {
        self.reap_cycles();
        self.collect_reports();

        let budget = self.config.streaming.activations_per_tick;
        let mut activated = 0;
        while activated < budget {
            let Some(ready) = self.activation.pop() else {
                break;
            };
            if self.activate(ready) {
                activated += 1;
            }
        }

        if let Some(count) = self.batch.as_mut() {
            *count += activated;
            if self.activation.is_empty() {
                let count = *count;
                self.batch = None;
                self.finish_batch(count);
            }
        }
        activated
    }

    fn start_cycle(&mut self, observer: Vec3) -> Result<(), WorldError> {
        let token = self.cancel.begin_cycle();
        let epoch = token.epoch();
        let map = &self.pipeline.map;

        let wanted = wanted_positions(
            observer,
            self.config.world.render_distance,
            map.dims(),
            self.config.streaming.vertical_rows,
        );
        let rendered_now: FxHashSet<ChunkPos> = self.rendered.keys().copied().collect();
        let plan = StreamingPlan::diff(wanted, map, &rendered_now);

        for pos in &plan.to_destroy_rendered {
            if let Some(rendered) = self.rendered.remove(pos) {
                self.sink.deactivate(rendered.handle);
            }
        }
        for pos in &plan.to_destroy_data {
            map.remove(pos);
        }
        let wanted_set: FxHashSet<ChunkPos> = plan.wanted.iter().copied().collect();
        self.activation.retain(|pos| wanted_set.contains(pos));

        tracing::info!(
            epoch,
            wanted = plan.wanted.len(),
            generate = plan.to_generate.len(),
            mesh = plan.to_mesh.len(),
            evicted_rendered = plan.to_destroy_rendered.len(),
            evicted_data = plan.to_destroy_data.len(),
            "Starting streaming cycle"
        );

        self.generating = plan.to_generate.iter().copied().collect();
        self.meshing = plan.to_mesh.iter().copied().collect();
        let request = CycleRequest {
            token,
            observer,
            to_generate: plan.to_generate,
            to_mesh: plan.to_mesh,
            rendered: self.rendered.keys().copied().collect(),
        };
        let pipeline = Arc::clone(&self.pipeline);
        let reports = self.reports_tx.clone();
        let handle = std::thread::Builder::new()
            .name(format!("strata-cycle-{epoch}"))
            .spawn(move || run_cycle_and_report(&pipeline, request, &reports))?;
        self.cycles.push((epoch, handle));
        Ok(())
    }

    fn reap_cycles(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) = self
            .cycles
            .drain(..)
            .partition(|(_, handle)| handle.is_finished());
        self.cycles = running;
        for (epoch, handle) in done {
            if handle.join().is_err() {
                tracing::error!(epoch, "Streaming cycle thread panicked");
                if epoch == self.cancel.current_epoch() {
                    self.clear_in_flight();
                }
            }
        }
    }

    fn collect_reports(&mut self) {
        let current = self.cancel.current_epoch();
        while let Ok(report) = self.reports_rx.try_recv() {
            match report {
                CycleReport::Finished {
                    epoch,
                    generated,
                    meshes,
                } if epoch == current => {
                    tracing::debug!(epoch, generated, ready = meshes.len(), "Cycle results received");
                    for ready in &meshes {
                        if let Some(rendered) = self.rendered.get_mut(&ready.pos) {
                            rendered.mesh.remesh_pending = true;
                        }
                    }
                    self.activation.extend(meshes);
                    self.clear_in_flight();
                    self.batch.get_or_insert(0);
                }
                CycleReport::Finished { epoch, .. } => {
                    tracing::debug!(epoch, current, "Discarding results of superseded cycle");
                }
                CycleReport::Cancelled { epoch } => {
                    tracing::debug!(epoch, "Streaming cycle cancelled");
                    if epoch == current {
                        self.clear_in_flight();
                    }
                }
                CycleReport::Failed { epoch, error } => {
                    tracing::error!(epoch, "Streaming cycle failed: {error}");
                    if epoch == current {
                        self.clear_in_flight();
                    }
                }
            }
        }
    }

    fn clear_in_flight(&mut self) {
        self.generating.clear();
        self.meshing.clear();
    }

    /// Hands one ready mesh to the sink. Returns `false` if it was dropped.
    fn activate(&mut self, ready: ReadyMesh) -> bool {
        let ReadyMesh { pos, mut mesh, version } = ready;
        let Some(current) = self.pipeline.map.get(&pos).map(|chunk| chunk.version()) else {
            tracing::trace!(?pos, "Dropping mesh of evicted chunk");
            return false;
        };
        if current != version {
            match self.build_mesh(pos) {
                Ok(Some(rebuilt)) => mesh = rebuilt,
                Ok(None) => return false,
                Err(err) => {
                    tracing::warn!(?pos, "Rebuilding stale mesh failed: {err}");
                    return false;
                }
            }
        }

        match self.rendered.get_mut(&pos) {
            Some(rendered) => {
                self.sink.apply_mesh(rendered.handle, mesh);
                rendered.mesh = ChunkMeshState::new(current);
            }
            None => {
                let handle = self.sink.activate(pos, mesh);
                self.rendered.insert(
                    pos,
                    RenderedChunk {
                        handle,
                        mesh: ChunkMeshState::new(current),
                    },
                );
            }
        }
        true
    }

    fn finish_batch(&mut self, count: usize) {
        if self.loaded {
            tracing::debug!(count, "Chunk batch active");
            self.events.push(WorldEvent::ChunksLoaded { count });
        } else {
            self.loaded = true;
            tracing::info!(chunks = self.rendered.len(), "World loaded");
            self.events.push(WorldEvent::WorldLoaded);
        }
    }

    fn build_mesh(&self, pos: ChunkPos) -> Result<Option<ChunkMesh>, WorldError> {
        let Some(neighborhood) = ChunkNeighborhood::capture(&self.pipeline.map, pos) else {
            return Ok(None);
        };
        Ok(Some(build_chunk_mesh(&neighborhood, &self.pipeline.registry)?))
    }

    // --- Edits and queries ---

    /// Places the block named `name` at world position `world`.
    ///
    /// Returns `Ok(false)` if the containing chunk is not rendered. The
    /// chunk is marked modified and it, plus every rendered neighbour whose
    /// boundary the edit touches, is remeshed before this returns.
    pub fn set_block(&mut self, world: IVec3, name: &str) -> Result<bool, WorldError> {
        if !self.loaded {
            tracing::warn!(?world, "Block edit before the world is loaded");
            return Err(WorldError::NotLoaded);
        }
        let block = self.pipeline.registry.id_of(name)?;
        let map = &self.pipeline.map;
        let dims = map.dims();
        let pos = ChunkPos::containing(world, dims);
        if !self.rendered.contains_key(&pos) {
            return Ok(false);
        }
        if map.edit(world, block).is_none() {
            return Ok(false);
        }

        let local = world - pos.origin();
        for dirty in MeshInvalidator::invalidate(pos, local, dims) {
            if !self.rendered.contains_key(&dirty) {
                continue;
            }
            let Some(version) = self.pipeline.map.get(&dirty).map(|chunk| chunk.version()) else {
                continue;
            };
            let Some(mesh) = self.build_mesh(dirty)? else {
                continue;
            };
            if let Some(rendered) = self.rendered.get_mut(&dirty) {
                self.sink.apply_mesh(rendered.handle, mesh);
                rendered.mesh = ChunkMeshState::new(version);
            }
        }
        tracing::debug!(?world, block = name, "Block edited");
        Ok(true)
    }

    /// Block at `world`, or `None` if its chunk has no data.
    pub fn block_at(&self, world: IVec3) -> Result<Option<BlockId>, WorldError> {
        if !self.loaded {
            return Err(WorldError::NotLoaded);
        }
        Ok(self.pipeline.map.block_at(world))
    }

    /// Registry name of the block at `world`.
    pub fn block_name_at(&self, world: IVec3) -> Result<Option<&str>, WorldError> {
        let Some(id) = self.block_at(world)? else {
            return Ok(None);
        };
        Ok(Some(self.pipeline.registry.data_of(id)?.name.as_str()))
    }

    // --- State ---

    pub fn chunk_state(&self, pos: ChunkPos) -> ChunkState {
        let has_data = self.pipeline.map.contains(&pos);
        if self.rendered.contains_key(&pos) {
            ChunkState::Active
        } else if self.activation.contains(&pos) {
            ChunkState::MeshReady
        } else if has_data && self.meshing.contains(&pos) {
            ChunkState::MeshGenerating
        } else if has_data {
            ChunkState::DataReady
        } else if self.generating.contains(&pos) {
            ChunkState::DataGenerating
        } else {
            ChunkState::Absent
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Events since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            data_chunks: self.pipeline.map.len(),
            modified_chunks: self.pipeline.map.modified_positions().len(),
            rendered_chunks: self.rendered.len(),
            queued_activations: self.activation.len(),
            running_cycles: self.cycles.len(),
        }
    }

    pub fn chunk_map(&self) -> &ChunkMap {
        &self.pipeline.map
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.pipeline.registry
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // --- Teardown ---

    /// Cancels the running cycle and drops every chunk and render handle.
    pub fn destroy_world(&mut self) {
        self.cancel.cancel_current();
        for (_, rendered) in self.rendered.drain() {
            self.sink.deactivate(rendered.handle);
        }
        self.pipeline.map.clear();
        self.activation.clear();
        self.clear_in_flight();
        self.batch = None;
        self.loaded = false;
        tracing::info!("World destroyed");
    }

    /// Cancels all background work and waits for cycle threads to exit.
    pub fn close(&mut self) {
        self.cancel.close();
        for (epoch, handle) in self.cycles.drain(..) {
            if handle.join().is_err() {
                tracing::error!(epoch, "Streaming cycle thread panicked");
            }
        }
    }
}

impl<S: RenderSink> Drop for World<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::time::Duration;
    use strata_terrain::FlatGround;

    const SIZE: i32 = 8;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.chunk_size = SIZE as u32;
        config.world.chunk_height = 32;
        config.world.render_distance = 1;
        config.terrain.sea_level = 0;
        config.terrain.bedrock_height = 0;
        config.terrain.stone_threshold = 1.0;
        config.terrain.additional_layers.clear();
        config.streaming.worker_threads = 2;
        config.streaming.activations_per_tick = 4;
        config.streaming.load_check_interval_secs = 0.1;
        config
    }

    fn world_with(config: Config) -> World<MemorySink> {
        let registry = Arc::new(BlockRegistry::with_default_blocks());
        let generator = TerrainGenerator::from_config(&config, &registry)
            .unwrap()
            .with_ground(FlatGround(10));
        World::builder()
            .config(config)
            .registry(registry)
            .generator(Arc::new(generator))
            .sink(MemorySink::new())
            .build()
            .unwrap()
    }

    fn world() -> World<MemorySink> {
        world_with(test_config())
    }

    /// Ticks until `done` holds, failing after a bounded wait.
    fn tick_until(world: &mut World<MemorySink>, mut done: impl FnMut(&World<MemorySink>) -> bool) {
        for _ in 0..2000 {
            world.tick();
            if done(world) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("world did not settle: {:?}", world.stats());
    }

    fn loaded_world() -> World<MemorySink> {
        let mut world = world();
        world.generate_world(Vec3::ZERO).unwrap();
        tick_until(&mut world, World::is_loaded);
        world
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let result = World::<MemorySink>::builder()
            .registry(Arc::new(BlockRegistry::with_default_blocks()))
            .sink(MemorySink::new())
            .build();
        assert!(matches!(
            result,
            Err(WorldError::MissingCollaborator("terrain generator"))
        ));
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = test_config();
        config.world.chunk_size = 0;
        let result = World::<MemorySink>::builder().config(config).build();
        assert!(matches!(result, Err(WorldError::Config(_))));
    }

    #[test]
    fn test_generate_world_loads_wanted_grid() {
        let mut world = loaded_world();
        assert_eq!(world.drain_events(), vec![WorldEvent::WorldLoaded]);
        assert!(world.drain_events().is_empty());

        let stats = world.stats();
        assert_eq!(stats.data_chunks, 9);
        assert_eq!(stats.rendered_chunks, 9);
        assert_eq!(world.sink().stats().active, 9);
        for dx in -1..=1 {
            for dz in -1..=1 {
                let pos = ChunkPos::new(dx * SIZE, 0, dz * SIZE);
                assert_eq!(world.chunk_state(pos), ChunkState::Active);
            }
        }
        assert_eq!(world.chunk_state(ChunkPos::new(16, 0, 0)), ChunkState::Absent);
    }

    #[test]
    fn test_activation_is_rate_limited() {
        let mut config = test_config();
        config.streaming.activations_per_tick = 1;
        let mut world = world_with(config);
        world.generate_world(Vec3::ZERO).unwrap();
        tick_until(&mut world, |w| w.stats().queued_activations > 0 || w.is_loaded());

        let mut ticks = 0;
        while !world.is_loaded() {
            assert!(world.tick() <= 1);
            ticks += 1;
            assert!(ticks < 10_000);
        }
        assert_eq!(world.stats().rendered_chunks, 9);
    }

    #[test]
    fn test_load_before_loaded_is_refused() {
        let mut world = world();
        assert!(!world.load_chunks_around(Vec3::ZERO).unwrap());
        assert!(matches!(
            world.set_block(IVec3::ZERO, "stone"),
            Err(WorldError::NotLoaded)
        ));
        assert!(matches!(world.block_at(IVec3::ZERO), Err(WorldError::NotLoaded)));
    }

    #[test]
    fn test_queries_after_load() {
        let world = loaded_world();
        assert_eq!(world.block_name_at(IVec3::new(3, 10, 3)).unwrap(), Some("grass"));
        assert_eq!(world.block_name_at(IVec3::new(3, 0, -3)).unwrap(), Some("bedrock"));
        assert_eq!(world.block_at(IVec3::new(100, 10, 0)).unwrap(), None);
    }

    #[test]
    fn test_edit_marks_modified_and_remeshes_neighbor() {
        let mut world = loaded_world();
        let west = ChunkPos::new(-SIZE, 0, 0);
        let before = world.sink().stats().mesh_updates;

        // x = 0 sits on the boundary shared with the western chunk.
        assert!(world.set_block(IVec3::new(0, 10, 3), "air").unwrap());
        assert_eq!(world.block_name_at(IVec3::new(0, 10, 3)).unwrap(), Some("air"));
        assert!(world.chunk_map().is_modified(&ChunkPos::new(0, 0, 0)));
        assert!(!world.chunk_map().is_modified(&west));
        assert_eq!(world.sink().stats().mesh_updates, before + 2);

        assert!(world.set_block(IVec3::new(4, 10, 4), "stone").unwrap());
        assert_eq!(world.sink().stats().mesh_updates, before + 3);
    }

    #[test]
    fn test_edit_outside_rendered_area_is_refused() {
        let mut world = loaded_world();
        assert!(!world.set_block(IVec3::new(200, 10, 0), "stone").unwrap());
        assert!(matches!(
            world.set_block(IVec3::new(0, 10, 0), "no_such_block"),
            Err(WorldError::Registry(_))
        ));
    }

    #[test]
    fn test_moving_observer_streams_and_keeps_edits() {
        let mut world = loaded_world();
        world.drain_events();
        world.set_block(IVec3::new(-5, 10, 0), "stone").unwrap();

        let far = Vec3::new(10.0 * SIZE as f32, 10.0, 0.0);
        assert!(world.load_chunks_around(far).unwrap());
        tick_until(&mut world, |w| {
            w.chunk_state(ChunkPos::new(10 * SIZE, 0, 0)) == ChunkState::Active
                && w.stats().queued_activations == 0
                && w.stats().running_cycles == 0
        });
        world.tick();

        assert!(
            world
                .drain_events()
                .contains(&WorldEvent::ChunksLoaded { count: 9 })
        );
        let stats = world.stats();
        assert_eq!(stats.rendered_chunks, 9);
        // The edited chunk survives eviction; the rest of the old grid is gone.
        assert_eq!(stats.data_chunks, 10);
        assert_eq!(world.chunk_state(ChunkPos::new(-SIZE, 0, 0)), ChunkState::DataReady);
        assert_eq!(world.chunk_state(ChunkPos::new(0, 0, 0)), ChunkState::Absent);
        assert_eq!(world.sink().stats().reused, 9);

        // Walking back brings the edit back with it.
        world.load_chunks_around(Vec3::ZERO).unwrap();
        tick_until(&mut world, |w| {
            w.chunk_state(ChunkPos::new(0, 0, 0)) == ChunkState::Active
                && w.stats().queued_activations == 0
        });
        assert_eq!(world.block_name_at(IVec3::new(-5, 10, 0)).unwrap(), Some("stone"));
    }

    #[test]
    fn test_update_observer_triggers_cycle() {
        let mut world = loaded_world();
        assert!(!world.update_observer(0.05, Vec3::new(100.0, 10.0, 0.0)).unwrap());
        assert!(!world.update_observer(0.1, Vec3::new(2.0, 10.0, 2.0)).unwrap());
        assert!(world.update_observer(0.1, Vec3::new(100.0, 10.0, 0.0)).unwrap());
    }

    #[test]
    fn test_superseded_cycle_results_are_discarded() {
        let mut world = loaded_world();
        world.drain_events();
        world.load_chunks_around(Vec3::new(80.0, 0.0, 0.0)).unwrap();
        world.load_chunks_around(Vec3::ZERO).unwrap();
        tick_until(&mut world, |w| w.stats().running_cycles == 0);
        for _ in 0..10 {
            world.tick();
        }
        let rendered = world.sink().active_positions();
        assert!(rendered.iter().all(|pos| pos.x.abs() <= SIZE && pos.z.abs() <= SIZE));
        assert_eq!(world.stats().rendered_chunks, 9);
    }

    #[test]
    fn test_destroy_world_clears_everything() {
        let mut world = loaded_world();
        world.destroy_world();
        let stats = world.stats();
        assert_eq!(stats.data_chunks, 0);
        assert_eq!(stats.rendered_chunks, 0);
        assert_eq!(world.sink().stats().active, 0);
        assert_eq!(world.sink().stats().free, 9);
        assert!(!world.is_loaded());

        world.generate_world(Vec3::ZERO).unwrap();
        tick_until(&mut world, World::is_loaded);
        assert_eq!(world.sink().stats().pool_size, 9);
    }

    #[test]
    fn test_vertical_rows_are_streamed() {
        let mut config = test_config();
        config.streaming.vertical_rows = 1;
        let mut world = world_with(config);
        world.generate_world(Vec3::ZERO).unwrap();
        tick_until(&mut world, World::is_loaded);
        assert_eq!(world.stats().data_chunks, 9 + 9);
        assert_eq!(
            world.chunk_state(ChunkPos::new(0, -32, 0)),
            ChunkState::Active
        );
        assert_eq!(
            world.block_name_at(IVec3::new(0, -32 + 20, 0)).unwrap(),
            Some("stone")
        );
    }

    #[test]
    fn test_close_joins_cycle_threads() {
        let mut world = world();
        world.generate_world(Vec3::ZERO).unwrap();
        world.close();
        assert_eq!(world.stats().running_cycles, 0);
    }
}
