//! High-level chunk wrapper: world placement, edit tracking, and versioning.
//!
//! [`Chunk`] wraps [`ChunkData`] with its world origin. Reads and writes that
//! fall outside the chunk are not errors: they come back as
//! [`BlockLookup::Outside`] / [`WriteOutcome::Outside`] carrying the world
//! position, so the caller can delegate to whichever chunk owns it.

use glam::{IVec2, IVec3};
use rustc_hash::FxHashSet;

use crate::chunk::{ChunkData, ChunkDims};
use crate::chunk_map::{ChunkPos, PendingWrite};
use crate::registry::BlockId;

/// Local `(x, z)` columns flagged to host a tree.
pub type TreeColumns = FxHashSet<IVec2>;

/// Result of reading a local position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockLookup {
    /// The position lies in this chunk.
    Inside(BlockId),
    /// The position lies in another chunk; carries the world position.
    Outside(IVec3),
}

/// Result of writing a local position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The cell now holds the new block.
    Written,
    /// A non-replacing write found a non-air block and left it alone.
    Kept,
    /// The position lies in another chunk; the write is handed back.
    Outside(PendingWrite),
}

/// A chunk with world placement, a `modified` flag, and a data version.
#[derive(Clone, Debug)]
pub struct Chunk {
    pos: ChunkPos,
    data: ChunkData,
    /// Set by externally triggered edits; modified chunks are never evicted.
    modified: bool,
    /// Incremented on every successful write.
    version: u64,
    tree_columns: Option<TreeColumns>,
}

impl Chunk {
    /// Creates an all-air chunk at `pos`.
    pub fn new(pos: ChunkPos, dims: ChunkDims) -> Self {
        Self::from_data(pos, ChunkData::new_air(dims))
    }

    /// Wraps existing data.
    pub fn from_data(pos: ChunkPos, data: ChunkData) -> Self {
        Self {
            pos,
            data,
            modified: false,
            version: 0,
            tree_columns: None,
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn origin(&self) -> IVec3 {
        self.pos.origin()
    }

    pub fn dims(&self) -> ChunkDims {
        self.data.dims()
    }

    pub fn data(&self) -> &ChunkData {
        &self.data
    }

    /// Converts a local position to a world block position.
    pub fn local_to_world(&self, local: IVec3) -> IVec3 {
        self.origin() + local
    }

    /// Converts a world block position to this chunk's local frame.
    ///
    /// The result may lie outside the chunk.
    pub fn world_to_local(&self, world: IVec3) -> IVec3 {
        world - self.origin()
    }

    /// Reads `local`, delegating out-of-chunk positions to the caller.
    pub fn block(&self, local: IVec3) -> BlockLookup {
        match self.data.get(local) {
            Some(block) => BlockLookup::Inside(block),
            None => BlockLookup::Outside(self.local_to_world(local)),
        }
    }

    /// Reads `local`, or air when it lies outside the chunk.
    pub fn block_or_air(&self, local: IVec3) -> BlockId {
        self.data.get(local).unwrap_or(BlockId::AIR)
    }

    /// Writes `block` at `local`.
    ///
    /// With `replace == false` the write only lands on air. Generation writes
    /// go through here and do not mark the chunk modified.
    pub fn set_block(&mut self, local: IVec3, block: BlockId, replace: bool) -> WriteOutcome {
        let Some(current) = self.data.get(local) else {
            return WriteOutcome::Outside(PendingWrite {
                world: self.local_to_world(local),
                block,
                replace,
            });
        };
        if !replace && !current.is_air() {
            return WriteOutcome::Kept;
        }
        self.data.set(local, block);
        self.version += 1;
        WriteOutcome::Written
    }

    /// Applies an externally triggered edit and marks the chunk modified.
    ///
    /// Returns `false` when `local` lies outside the chunk.
    pub fn edit(&mut self, local: IVec3, block: BlockId) -> bool {
        match self.set_block(local, block, true) {
            WriteOutcome::Written => {
                self.modified = true;
                true
            }
            WriteOutcome::Kept | WriteOutcome::Outside(_) => false,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Data version, bumped on every write.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stores the tree-placement result for this chunk.
    pub fn set_tree_columns(&mut self, columns: TreeColumns) {
        self.tree_columns = Some(columns);
    }

    /// Returns `true` if `column` is flagged and not yet consumed.
    pub fn has_tree_column(&self, column: IVec2) -> bool {
        self.tree_columns
            .as_ref()
            .is_some_and(|columns| columns.contains(&column))
    }

    /// Consumes the flag for `column`. Returns `true` if it was set.
    pub fn take_tree_column(&mut self, column: IVec2) -> bool {
        self.tree_columns
            .as_mut()
            .is_some_and(|columns| columns.remove(&column))
    }

    /// Remaining flagged tree columns, if placement ran.
    pub fn tree_columns(&self) -> Option<&TreeColumns> {
        self.tree_columns.as_ref()
    }
}
