//! One streaming cycle: generate, second pass, mesh.
//!
//! A cycle runs on its own background thread and reports back over a
//! channel. The three stages are strictly sequenced; pending writes from a
//! stage are applied on the cycle thread between stages, never from a worker.

use std::sync::Arc;

use crossbeam_channel::Sender;
use glam::Vec3;
use rustc_hash::FxHashSet;
use strata_mesh::{ChunkNeighborhood, FaceDirection, build_chunk_mesh};
use strata_terrain::TerrainGenerator;
use strata_voxel::{BlockRegistry, Chunk, ChunkMap, ChunkPos, PendingWrite};

use crate::activation::ReadyMesh;
use crate::cancel::CycleToken;
use crate::error::WorldError;
use crate::stage::{StageOutcome, run_stage};

/// Shared state every cycle works against.
pub(crate) struct Pipeline {
    pub map: Arc<ChunkMap>,
    pub generator: Arc<TerrainGenerator>,
    pub registry: Arc<BlockRegistry>,
    pub workers: usize,
}

/// What the controller asked one cycle to do.
pub(crate) struct CycleRequest {
    pub token: CycleToken,
    pub observer: Vec3,
    /// Nearest first.
    pub to_generate: Vec<ChunkPos>,
    /// Nearest first.
    pub to_mesh: Vec<ChunkPos>,
    /// Chunks rendered when the cycle started.
    pub rendered: FxHashSet<ChunkPos>,
}

/// What a completed cycle produced.
pub(crate) struct CycleSummary {
    /// Chunks this cycle inserted.
    pub generated: usize,
    /// Nearest first.
    pub meshes: Vec<ReadyMesh>,
}

/// Sent back to the controller when a cycle ends.
pub(crate) enum CycleReport {
    Finished {
        epoch: u64,
        generated: usize,
        meshes: Vec<ReadyMesh>,
    },
    Cancelled {
        epoch: u64,
    },
    Failed {
        epoch: u64,
        error: WorldError,
    },
}

/// Runs `request` to completion and reports the outcome on `reports`.
pub(crate) fn run_cycle_and_report(
    pipeline: &Pipeline,
    request: CycleRequest,
    reports: &Sender<CycleReport>,
) {
    let epoch = request.token.epoch();
    let report = match run_cycle(pipeline, &request) {
        Ok(Some(summary)) => CycleReport::Finished {
            epoch,
            generated: summary.generated,
            meshes: summary.meshes,
        },
        Ok(None) => CycleReport::Cancelled { epoch },
        Err(error) => CycleReport::Failed { epoch, error },
    };
    // The world may already be gone; nobody is left to tell.
    let _ = reports.send(report);
}

type Generated = (Chunk, Vec<PendingWrite>);

/// Returns `None` if the cycle was cancelled between or during stages.
fn run_cycle(pipeline: &Pipeline, request: &CycleRequest) -> Result<Option<CycleSummary>, WorldError> {
    let map = pipeline.map.as_ref();
    let dims = map.dims();
    let token = &request.token;
    let observer = request.observer;

    // Stage 1: first pass over every missing chunk.
    let StageOutcome::Completed(generated) = run_stage(
        "chunk-gen",
        request.to_generate.clone(),
        pipeline.workers,
        token,
        |pos: ChunkPos| -> Result<Option<Generated>, WorldError> {
            if map.contains(&pos) {
                return Ok(None);
            }
            let mut chunk = Chunk::new(pos, dims);
            let pending = pipeline.generator.generate(&mut chunk);
            Ok(Some((chunk, pending)))
        },
    )?
    else {
        return Ok(None);
    };

    let mut fresh = Vec::with_capacity(generated.len());
    let mut pending = Vec::new();
    for (chunk, writes) in generated.into_iter().flatten() {
        let pos = chunk.pos();
        if map.insert_if_absent(chunk) {
            fresh.push(pos);
        }
        pending.extend(writes);
    }
    let mut touched = map.apply_pending(pending);
    fresh.sort_by(|a, b| a.distance_to(observer).total_cmp(&b.distance_to(observer)));

    // Stage 2: second pass over the fresh chunks, each on a private copy.
    let StageOutcome::Completed(additional) = run_stage(
        "chunk-decorate",
        fresh.clone(),
        pipeline.workers,
        token,
        |pos: ChunkPos| -> Result<Option<(Generated, u64)>, WorldError> {
            let Some(mut chunk) = map.cloned(&pos) else {
                return Ok(None);
            };
            let base_version = chunk.version();
            let pending = pipeline.generator.generate_additional(&mut chunk, map);
            Ok(Some(((chunk, pending), base_version)))
        },
    )?
    else {
        return Ok(None);
    };

    let mut pending = Vec::new();
    for ((chunk, writes), base_version) in additional.into_iter().flatten() {
        let pos = chunk.pos();
        if let Some(mut current) = map.get_mut(&pos) {
            if current.version() == base_version {
                *current = chunk;
            } else {
                tracing::debug!(?pos, "Chunk changed during second pass, keeping current data");
            }
        }
        pending.extend(writes);
    }
    touched.extend(map.apply_pending(pending));

    // Stage 3: mesh the wanted set plus rendered chunks whose neighbourhood changed.
    let mut to_mesh = request.to_mesh.clone();
    let mut queued: FxHashSet<ChunkPos> = to_mesh.iter().copied().collect();
    let neighbors = fresh.iter().flat_map(|pos| {
        FaceDirection::ALL.map(|side| {
            let step = side.offset();
            pos.step(step.x, step.y, step.z, dims)
        })
    });
    for pos in neighbors.chain(touched) {
        if request.rendered.contains(&pos) && queued.insert(pos) {
            to_mesh.push(pos);
        }
    }

    let registry = pipeline.registry.as_ref();
    let StageOutcome::Completed(meshed) = run_stage(
        "chunk-mesh",
        to_mesh,
        pipeline.workers,
        token,
        |pos: ChunkPos| -> Result<Option<ReadyMesh>, WorldError> {
            let Some(version) = map.get(&pos).map(|chunk| chunk.version()) else {
                return Ok(None);
            };
            let Some(neighborhood) = ChunkNeighborhood::capture(map, pos) else {
                return Ok(None);
            };
            let mesh = build_chunk_mesh(&neighborhood, registry)?;
            Ok(Some(ReadyMesh { pos, mesh, version }))
        },
    )?
    else {
        return Ok(None);
    };

    let mut meshes: Vec<ReadyMesh> = meshed.into_iter().flatten().collect();
    meshes.sort_by(|a, b| {
        a.pos
            .distance_to(observer)
            .total_cmp(&b.pos.distance_to(observer))
    });

    tracing::debug!(
        epoch = token.epoch(),
        generated = fresh.len(),
        meshed = meshes.len(),
        "Streaming cycle finished"
    );
    Ok(Some(CycleSummary {
        generated: fresh.len(),
        meshes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use glam::IVec3;
    use strata_config::Config;
    use strata_terrain::FlatGround;
    use strata_voxel::{BlockId, BlockSource, ChunkDims};

    fn pipeline(additional: bool) -> Pipeline {
        let mut config = Config::default();
        config.world.chunk_size = 8;
        config.world.chunk_height = 32;
        config.terrain.sea_level = 0;
        config.terrain.bedrock_height = 0;
        config.terrain.stone_threshold = 1.0;
        if !additional {
            config.terrain.additional_layers.clear();
        }
        let registry = Arc::new(BlockRegistry::with_default_blocks());
        let generator = TerrainGenerator::from_config(&config, &registry)
            .unwrap()
            .with_ground(FlatGround(10));
        Pipeline {
            map: Arc::new(ChunkMap::new(ChunkDims::new(8, 32))),
            generator: Arc::new(generator),
            registry,
            workers: 2,
        }
    }

    fn request(token: CycleToken, positions: Vec<ChunkPos>) -> CycleRequest {
        CycleRequest {
            token,
            observer: Vec3::ZERO,
            to_generate: positions.clone(),
            to_mesh: positions,
            rendered: FxHashSet::default(),
        }
    }

    fn grid() -> Vec<ChunkPos> {
        let dims = ChunkDims::new(8, 32);
        let mut positions = Vec::new();
        for dx in -1..=1 {
            for dz in -1..=1 {
                positions.push(ChunkPos::new(0, 0, 0).step(dx, 0, dz, dims));
            }
        }
        positions
    }

    #[test]
    fn test_cycle_generates_and_meshes() {
        let pipeline = pipeline(false);
        let token = CancellationToken::new().begin_cycle();
        let summary = run_cycle(&pipeline, &request(token, grid()))
            .unwrap()
            .expect("cycle should complete");
        assert_eq!(summary.generated, 9);
        assert_eq!(summary.meshes.len(), 9);
        assert_eq!(summary.meshes[0].pos, ChunkPos::new(0, 0, 0));
        assert_eq!(pipeline.map.len(), 9);
        assert!(summary.meshes.iter().all(|m| !m.mesh.is_empty()));
    }

    #[test]
    fn test_present_chunks_are_not_regenerated() {
        let pipeline = pipeline(false);
        let pos = ChunkPos::new(0, 0, 0);
        pipeline.map.insert_if_absent(Chunk::new(pos, pipeline.map.dims()));
        let token = CancellationToken::new().begin_cycle();
        let summary = run_cycle(&pipeline, &request(token, vec![pos]))
            .unwrap()
            .expect("cycle should complete");
        assert_eq!(summary.generated, 0);
        assert_eq!(summary.meshes.len(), 1);
        assert_eq!(pipeline.map.block_at(IVec3::ZERO), Some(BlockId::AIR));
    }

    #[test]
    fn test_cancelled_cycle_reports_cancelled() {
        let pipeline = pipeline(false);
        let owner = CancellationToken::new();
        let token = owner.begin_cycle();
        owner.begin_cycle();
        let (tx, rx) = crossbeam_channel::unbounded();
        run_cycle_and_report(&pipeline, request(token, grid()), &tx);
        assert!(matches!(rx.recv().unwrap(), CycleReport::Cancelled { epoch: 1 }));
        assert!(pipeline.map.is_empty());
    }

    #[test]
    fn test_rendered_neighbors_of_fresh_chunks_are_remeshed() {
        let pipeline = pipeline(false);
        let token = CancellationToken::new().begin_cycle();
        let center = ChunkPos::new(0, 0, 0);
        let east = ChunkPos::new(8, 0, 0);
        let far = ChunkPos::new(80, 0, 0);
        for pos in [center, far] {
            let mut chunk = Chunk::new(pos, pipeline.map.dims());
            pipeline.generator.generate(&mut chunk);
            pipeline.map.insert_if_absent(chunk);
        }
        let mut req = request(token, vec![east]);
        req.rendered = [center, far].into_iter().collect();

        let summary = run_cycle(&pipeline, &req).unwrap().expect("cycle should complete");
        let meshed: Vec<ChunkPos> = summary.meshes.into_iter().map(|m| m.pos).collect();
        assert!(meshed.contains(&east));
        assert!(meshed.contains(&center));
        assert!(!meshed.contains(&far));
    }

    #[test]
    fn test_second_pass_plants_trees() {
        let pipeline = pipeline(true);
        let token = CancellationToken::new().begin_cycle();
        let dims = pipeline.map.dims();
        let mut positions = Vec::new();
        for dx in -3..=3 {
            for dz in -3..=3 {
                positions.push(ChunkPos::new(0, 0, 0).step(dx, 0, dz, dims));
            }
        }
        run_cycle(&pipeline, &request(token, positions)).unwrap();

        let log = pipeline.registry.id_of("log").unwrap();
        let trunks = pipeline
            .map
            .positions()
            .into_iter()
            .filter_map(|pos| pipeline.map.snapshot(&pos))
            .map(|data| data.count(log))
            .sum::<usize>();
        assert!(trunks > 0, "some trees should be planted");
    }
}
