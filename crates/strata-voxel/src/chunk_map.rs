//! The world's chunk-data arena: a concurrent map from chunk origin to [`Chunk`].
//!
//! Chunks are addressed by coordinate, never by reference, so render state and
//! chunk data live in separate maps with no back-pointers between them.
//! Worker stages insert into the map concurrently; all world-space reads and
//! writes resolve their owning chunk through [`ChunkDims::chunk_origin`].

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::{Ref, RefMut};
use glam::{IVec3, Vec3};
use rustc_hash::FxHashSet;

use crate::chunk::{ChunkData, ChunkDims};
use crate::chunk_api::{Chunk, WriteOutcome};
use crate::registry::BlockId;

/// World-space origin of a chunk (a multiple of the chunk dimensions).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    /// Creates a position from an already-aligned origin.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The chunk containing the world block position `world`.
    pub fn containing(world: IVec3, dims: ChunkDims) -> Self {
        Self::from_origin(dims.chunk_origin(world))
    }

    pub fn from_origin(origin: IVec3) -> Self {
        Self::new(origin.x, origin.y, origin.z)
    }

    pub fn origin(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// The chunk `dx`, `dy`, `dz` whole chunks away.
    pub fn step(self, dx: i32, dy: i32, dz: i32, dims: ChunkDims) -> Self {
        Self::new(
            self.x + dx * dims.size(),
            self.y + dy * dims.height(),
            self.z + dz * dims.size(),
        )
    }

    /// Euclidean distance from the chunk origin to `point`.
    pub fn distance_to(self, point: Vec3) -> f32 {
        self.origin().as_vec3().distance(point)
    }
}

/// A write that landed outside the chunk being generated, to be applied to
/// its owning chunk once the stage that produced it has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingWrite {
    /// World block position.
    pub world: IVec3,
    pub block: BlockId,
    /// `false` only overwrites air.
    pub replace: bool,
}

/// Read access to blocks by world position.
///
/// `None` means "unknown": the owning chunk is not loaded.
pub trait BlockSource {
    fn block_at(&self, world: IVec3) -> Option<BlockId>;
}

/// A source that knows nothing; every query is unknown.
pub struct NoNeighbors;

impl BlockSource for NoNeighbors {
    fn block_at(&self, _world: IVec3) -> Option<BlockId> {
        None
    }
}

/// Concurrent map of loaded chunk data.
pub struct ChunkMap {
    dims: ChunkDims,
    chunks: DashMap<ChunkPos, Chunk>,
}

impl ChunkMap {
    pub fn new(dims: ChunkDims) -> Self {
        Self {
            dims,
            chunks: DashMap::new(),
        }
    }

    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn contains(&self, pos: &ChunkPos) -> bool {
        self.chunks.contains_key(pos)
    }

    /// Inserts `chunk` unless its coordinate is already present.
    ///
    /// Returns `true` if the chunk was inserted. A second insert for the same
    /// coordinate is a no-op, which keeps overlapping cycles idempotent.
    pub fn insert_if_absent(&self, chunk: Chunk) -> bool {
        match self.chunks.entry(chunk.pos()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(chunk);
                true
            }
        }
    }

    /// Stores `chunk`, replacing whatever was at its coordinate.
    pub fn replace(&self, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(chunk.pos(), chunk)
    }

    pub fn remove(&self, pos: &ChunkPos) -> Option<Chunk> {
        self.chunks.remove(pos).map(|(_, chunk)| chunk)
    }

    /// Shared access to one chunk. Do not hold across other map calls.
    pub fn get(&self, pos: &ChunkPos) -> Option<Ref<'_, ChunkPos, Chunk>> {
        self.chunks.get(pos)
    }

    /// Exclusive access to one chunk. Do not hold across other map calls.
    pub fn get_mut(&self, pos: &ChunkPos) -> Option<RefMut<'_, ChunkPos, Chunk>> {
        self.chunks.get_mut(pos)
    }

    /// Copies the block array of one chunk.
    pub fn snapshot(&self, pos: &ChunkPos) -> Option<ChunkData> {
        self.chunks.get(pos).map(|chunk| chunk.data().clone())
    }

    /// Copies a whole chunk, flags and tree columns included.
    pub fn cloned(&self, pos: &ChunkPos) -> Option<Chunk> {
        self.chunks.get(pos).map(|chunk| chunk.clone())
    }

    /// All loaded coordinates.
    pub fn positions(&self) -> Vec<ChunkPos> {
        self.chunks.iter().map(|entry| *entry.key()).collect()
    }

    /// Coordinates whose chunk carries the `modified` flag.
    pub fn modified_positions(&self) -> FxHashSet<ChunkPos> {
        self.chunks
            .iter()
            .filter(|entry| entry.value().is_modified())
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn is_modified(&self, pos: &ChunkPos) -> bool {
        self.chunks.get(pos).is_some_and(|chunk| chunk.is_modified())
    }

    /// Writes through to the owning chunk.
    ///
    /// Returns `true` only if the owning chunk is loaded and the write landed.
    pub fn set_block(&self, world: IVec3, block: BlockId, replace: bool) -> bool {
        let pos = ChunkPos::containing(world, self.dims);
        let Some(mut chunk) = self.chunks.get_mut(&pos) else {
            return false;
        };
        let local = chunk.world_to_local(world);
        matches!(chunk.set_block(local, block, replace), WriteOutcome::Written)
    }

    /// Applies an external edit and marks the owning chunk modified.
    ///
    /// Returns the owning chunk, or `None` if it is not loaded.
    pub fn edit(&self, world: IVec3, block: BlockId) -> Option<ChunkPos> {
        let pos = ChunkPos::containing(world, self.dims);
        let mut chunk = self.chunks.get_mut(&pos)?;
        let local = chunk.world_to_local(world);
        chunk.edit(local, block);
        // Rewriting the same block still counts as a player edit.
        chunk.mark_modified();
        Some(pos)
    }

    /// Applies writes produced outside their chunk during generation.
    ///
    /// Writes aimed at unloaded chunks are dropped. Returns the chunks that changed.
    pub fn apply_pending(
        &self,
        writes: impl IntoIterator<Item = PendingWrite>,
    ) -> FxHashSet<ChunkPos> {
        let mut touched = FxHashSet::default();
        let mut dropped = 0usize;
        for write in writes {
            if self.set_block(write.world, write.block, write.replace) {
                touched.insert(ChunkPos::containing(write.world, self.dims));
            } else if !self.contains(&ChunkPos::containing(write.world, self.dims)) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::trace!(dropped, "pending writes aimed at unloaded chunks");
        }
        touched
    }

    /// Keeps only the chunks for which `keep` returns `true`.
    pub fn retain(&self, mut keep: impl FnMut(&ChunkPos, &Chunk) -> bool) {
        self.chunks.retain(|pos, chunk| keep(pos, chunk));
    }

    pub fn clear(&self) {
        self.chunks.clear();
    }
}

impl BlockSource for ChunkMap {
    fn block_at(&self, world: IVec3) -> Option<BlockId> {
        let pos = ChunkPos::containing(world, self.dims);
        let chunk = self.chunks.get(&pos)?;
        chunk.data().get(chunk.world_to_local(world))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ChunkDims {
        ChunkDims::new(16, 100)
    }

    fn map_with(positions: &[ChunkPos]) -> ChunkMap {
        let map = ChunkMap::new(dims());
        for &pos in positions {
            map.insert_if_absent(Chunk::new(pos, dims()));
        }
        map
    }

    #[test]
    fn test_containing_and_step() {
        let pos = ChunkPos::containing(IVec3::new(-1, 5, 17), dims());
        assert_eq!(pos, ChunkPos::new(-16, 0, 16));
        assert_eq!(pos.step(1, -1, 0, dims()), ChunkPos::new(0, -100, 16));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let map = ChunkMap::new(dims());
        let pos = ChunkPos::new(0, 0, 0);
        let mut first = Chunk::new(pos, dims());
        first.set_block(IVec3::ZERO, BlockId(1), true);

        assert!(map.insert_if_absent(first));
        assert!(!map.insert_if_absent(Chunk::new(pos, dims())));
        assert_eq!(map.len(), 1);
        assert_eq!(map.block_at(IVec3::ZERO), Some(BlockId(1)));
    }

    #[test]
    fn test_block_at_unknown_when_unloaded() {
        let map = map_with(&[ChunkPos::new(0, 0, 0)]);
        assert_eq!(map.block_at(IVec3::new(15, 99, 15)), Some(BlockId::AIR));
        assert_eq!(map.block_at(IVec3::new(16, 0, 0)), None);
        assert_eq!(map.block_at(IVec3::new(0, -1, 0)), None);
    }

    #[test]
    fn test_set_block_resolves_owning_chunk() {
        let map = map_with(&[ChunkPos::new(0, 0, 0), ChunkPos::new(-16, 0, 0)]);
        assert!(map.set_block(IVec3::new(-3, 10, 4), BlockId(2), true));
        let chunk = map.get(&ChunkPos::new(-16, 0, 0)).unwrap();
        assert_eq!(chunk.block_or_air(IVec3::new(13, 10, 4)), BlockId(2));
        assert!(!chunk.is_modified());
        drop(chunk);

        assert!(!map.set_block(IVec3::new(40, 0, 0), BlockId(2), true));
    }

    #[test]
    fn test_edit_marks_modified() {
        let map = map_with(&[ChunkPos::new(16, 0, 0)]);
        assert_eq!(
            map.edit(IVec3::new(20, 1, 1), BlockId(5)),
            Some(ChunkPos::new(16, 0, 0))
        );
        assert!(map.is_modified(&ChunkPos::new(16, 0, 0)));
        assert_eq!(
            map.modified_positions().into_iter().collect::<Vec<_>>(),
            vec![ChunkPos::new(16, 0, 0)]
        );
        assert_eq!(map.edit(IVec3::new(0, 1, 1), BlockId(5)), None);
    }

    #[test]
    fn test_apply_pending_respects_replace_and_drops_unloaded() {
        let map = map_with(&[ChunkPos::new(16, 0, 0)]);
        map.set_block(IVec3::new(16, 0, 0), BlockId(1), true);

        let touched = map.apply_pending([
            PendingWrite {
                world: IVec3::new(16, 0, 0),
                block: BlockId(7),
                replace: false,
            },
            PendingWrite {
                world: IVec3::new(17, 0, 0),
                block: BlockId(7),
                replace: false,
            },
            PendingWrite {
                world: IVec3::new(-1, 0, 0),
                block: BlockId(7),
                replace: true,
            },
        ]);

        assert_eq!(map.block_at(IVec3::new(16, 0, 0)), Some(BlockId(1)));
        assert_eq!(map.block_at(IVec3::new(17, 0, 0)), Some(BlockId(7)));
        assert_eq!(touched.len(), 1);
        assert!(touched.contains(&ChunkPos::new(16, 0, 0)));
    }

    #[test]
    fn test_retain_and_remove() {
        let map = map_with(&[
            ChunkPos::new(0, 0, 0),
            ChunkPos::new(16, 0, 0),
            ChunkPos::new(32, 0, 0),
        ]);
        map.retain(|pos, _| pos.x < 32);
        assert_eq!(map.len(), 2);
        assert!(map.remove(&ChunkPos::new(0, 0, 0)).is_some());
        assert!(map.remove(&ChunkPos::new(0, 0, 0)).is_none());
        let mut left = map.positions();
        left.sort();
        assert_eq!(left, vec![ChunkPos::new(16, 0, 0)]);
    }

    #[test]
    fn test_cloned_chunk_replaces_original() {
        let pos = ChunkPos::new(0, 0, 0);
        let map = map_with(&[pos]);
        let mut copy = map.cloned(&pos).unwrap();
        copy.set_block(IVec3::new(1, 2, 3), BlockId(4), true);
        assert_eq!(map.block_at(IVec3::new(1, 2, 3)), Some(BlockId::AIR));

        let old = map.replace(copy).unwrap();
        assert_eq!(old.version(), 0);
        assert_eq!(map.block_at(IVec3::new(1, 2, 3)), Some(BlockId(4)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_concurrent_inserts_keep_one_entry() {
        let map = std::sync::Arc::new(ChunkMap::new(dims()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let map = std::sync::Arc::clone(&map);
                std::thread::spawn(move || {
                    (0..8)
                        .filter(|&i| {
                            map.insert_if_absent(Chunk::new(ChunkPos::new(i * 16, 0, 0), dims()))
                        })
                        .count()
                })
            })
            .collect();
        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 8);
        assert_eq!(map.len(), 8);
    }
}
