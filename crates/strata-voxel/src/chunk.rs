//! Dense chunk storage and the coordinate math shared by every chunk.
//!
//! A chunk holds exactly `size · height · size` block ids laid out with x
//! fastest, then y, then z: `index = x + size·y + size·height·z`. The array is
//! allocated once and never resized.

use glam::IVec3;

use crate::registry::BlockId;

/// Chunk footprint: `size` blocks along x and z, `height` blocks along y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkDims {
    size: i32,
    height: i32,
}

impl ChunkDims {
    /// Creates chunk dimensions. Zero extents are raised to one.
    pub fn new(size: u32, height: u32) -> Self {
        debug_assert!(size > 0 && height > 0, "chunk dimensions must be non-zero");
        Self {
            size: size.clamp(1, i32::MAX as u32) as i32,
            height: height.clamp(1, i32::MAX as u32) as i32,
        }
    }

    /// Width and depth in blocks.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Height in blocks.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of cells in one chunk.
    pub fn volume(&self) -> usize {
        self.size as usize * self.height as usize * self.size as usize
    }

    /// Returns `true` if `local` lies inside `[0,size) × [0,height) × [0,size)`.
    pub fn contains(&self, local: IVec3) -> bool {
        (0..self.size).contains(&local.x)
            && (0..self.height).contains(&local.y)
            && (0..self.size).contains(&local.z)
    }

    /// Linear index of an in-bounds local position.
    pub fn index(&self, local: IVec3) -> Option<usize> {
        if !self.contains(local) {
            return None;
        }
        let (s, h) = (self.size as usize, self.height as usize);
        Some(local.x as usize + s * local.y as usize + s * h * local.z as usize)
    }

    /// Local position of a linear index, the inverse of [`index`](Self::index).
    pub fn local_from_index(&self, index: usize) -> Option<IVec3> {
        if index >= self.volume() {
            return None;
        }
        let (s, h) = (self.size as usize, self.height as usize);
        let layer = s * h;
        let z = index / layer;
        let rem = index % layer;
        Some(IVec3::new((rem % s) as i32, (rem / s) as i32, z as i32))
    }

    /// Origin of the chunk containing the world block position `world`.
    ///
    /// Floors toward negative infinity, so `-1` belongs to the chunk at `-size`.
    pub fn chunk_origin(&self, world: IVec3) -> IVec3 {
        IVec3::new(
            world.x.div_euclid(self.size) * self.size,
            world.y.div_euclid(self.height) * self.height,
            world.z.div_euclid(self.size) * self.size,
        )
    }
}

/// Dense block-id array for one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkData {
    dims: ChunkDims,
    blocks: Vec<BlockId>,
}

impl ChunkData {
    /// Creates a chunk filled with air.
    pub fn new_air(dims: ChunkDims) -> Self {
        Self::new_filled(dims, BlockId::AIR)
    }

    /// Creates a chunk filled with `block`.
    pub fn new_filled(dims: ChunkDims, block: BlockId) -> Self {
        Self {
            dims,
            blocks: vec![block; dims.volume()],
        }
    }

    /// Chunk dimensions.
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// Block at `local`, or `None` outside the chunk.
    pub fn get(&self, local: IVec3) -> Option<BlockId> {
        self.dims.index(local).map(|i| self.blocks[i])
    }

    /// Writes `block` at `local`. Returns `false` outside the chunk.
    pub fn set(&mut self, local: IVec3, block: BlockId) -> bool {
        match self.dims.index(local) {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    /// Overwrites every cell with `block`.
    pub fn fill(&mut self, block: BlockId) {
        self.blocks.fill(block);
    }

    /// Number of cells holding `block`.
    pub fn count(&self, block: BlockId) -> usize {
        self.blocks.iter().filter(|&&b| b == block).count()
    }

    /// Returns `true` if every cell is air.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|b| b.is_air())
    }

    /// Raw cells in index order.
    pub fn as_slice(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Iterates `(local, block)` over every cell in index order.
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, BlockId)> + '_ {
        let (s, h) = (self.dims.size, self.dims.height);
        self.blocks.iter().enumerate().map(move |(i, &block)| {
            let i = i as i32;
            let local = IVec3::new(i % s, (i / s) % h, i / (s * h));
            (local, block)
        })
    }
}
