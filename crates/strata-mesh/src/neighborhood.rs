//! Cross-chunk neighbour access for face culling.
//!
//! [`ChunkNeighborhood`] aggregates a centre chunk and the boundary layer of
//! up to six face-adjacent chunks into an owned snapshot, so meshing can run
//! on a worker thread without holding any lock on the chunk map.

use glam::IVec3;
use strata_voxel::{BlockId, ChunkData, ChunkDims, ChunkMap, ChunkPos};

use crate::face_direction::FaceDirection;

// ---------------------------------------------------------------------------
// Boundary slices
// ---------------------------------------------------------------------------

/// The single layer of a neighbour chunk that touches the centre chunk.
///
/// Stored as a 2D grid over the two axes that span the shared face, in
/// ascending axis order (x before y before z), first axis fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBoundarySlice {
    data: Vec<BlockId>,
    /// Extent of the first (fastest) axis.
    width: usize,
}

impl ChunkBoundarySlice {
    /// Extracts from `neighbor` the layer facing back toward the centre chunk.
    ///
    /// `side` is the direction from the centre chunk to `neighbor`.
    pub fn extract(neighbor: &ChunkData, side: FaceDirection) -> Self {
        let dims = neighbor.dims();
        let (s, h) = (dims.size(), dims.height());
        // The neighbour's face that touches us is the opposite one.
        let (data, width) = match side.opposite() {
            FaceDirection::East | FaceDirection::West => {
                let x = if side == FaceDirection::West { s - 1 } else { 0 };
                let data = (0..s)
                    .flat_map(|z| (0..h).map(move |y| IVec3::new(x, y, z)))
                    .map(|p| neighbor.get(p).unwrap_or(BlockId::AIR))
                    .collect();
                (data, h as usize)
            }
            FaceDirection::Up | FaceDirection::Down => {
                let y = if side == FaceDirection::Down { h - 1 } else { 0 };
                let data = (0..s)
                    .flat_map(|z| (0..s).map(move |x| IVec3::new(x, y, z)))
                    .map(|p| neighbor.get(p).unwrap_or(BlockId::AIR))
                    .collect();
                (data, s as usize)
            }
            FaceDirection::North | FaceDirection::South => {
                let z = if side == FaceDirection::South { s - 1 } else { 0 };
                let data = (0..h)
                    .flat_map(|y| (0..s).map(move |x| IVec3::new(x, y, z)))
                    .map(|p| neighbor.get(p).unwrap_or(BlockId::AIR))
                    .collect();
                (data, s as usize)
            }
        };
        Self { data, width }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Block at `(a, b)` on the two axes spanning the face.
    pub fn get(&self, a: usize, b: usize) -> Option<BlockId> {
        if a >= self.width {
            return None;
        }
        self.data.get(b * self.width + a).copied()
    }
}

// ---------------------------------------------------------------------------
// ChunkNeighborhood
// ---------------------------------------------------------------------------

/// A centre chunk plus the boundary layers of its face neighbours.
///
/// A missing slice means the neighbour is not loaded; lookups into it report
/// unknown rather than guessing air or solid.
#[derive(Clone, Debug)]
pub struct ChunkNeighborhood {
    center: ChunkData,
    faces: [Option<ChunkBoundarySlice>; 6],
}

impl ChunkNeighborhood {
    /// A neighbourhood with no neighbours loaded.
    pub fn from_center_only(center: ChunkData) -> Self {
        Self {
            center,
            faces: Default::default(),
        }
    }

    /// Snapshots `pos` and its loaded face neighbours from `map`.
    ///
    /// Each chunk is read under its own short-lived guard; no two guards are
    /// held at once. Returns `None` if `pos` itself is not loaded.
    pub fn capture(map: &ChunkMap, pos: ChunkPos) -> Option<Self> {
        let dims = map.dims();
        let center = map.snapshot(&pos)?;
        let mut neighborhood = Self::from_center_only(center);
        for side in FaceDirection::ALL {
            let step = side.offset();
            let neighbor_pos = pos.step(step.x, step.y, step.z, dims);
            let slice = map
                .get(&neighbor_pos)
                .map(|chunk| ChunkBoundarySlice::extract(chunk.data(), side));
            if let Some(slice) = slice {
                neighborhood.faces[side.index()] = Some(slice);
            }
        }
        Some(neighborhood)
    }

    /// Installs the boundary layer of `neighbor`, which lies toward `side`.
    pub fn set_face_neighbor(&mut self, side: FaceDirection, neighbor: &ChunkData) {
        self.faces[side.index()] = Some(ChunkBoundarySlice::extract(neighbor, side));
    }

    pub fn center(&self) -> &ChunkData {
        &self.center
    }

    pub fn dims(&self) -> ChunkDims {
        self.center.dims()
    }

    pub fn has_neighbor(&self, side: FaceDirection) -> bool {
        self.faces[side.index()].is_some()
    }

    /// Block at a position relative to the centre chunk's origin.
    ///
    /// Positions one step beyond a single face are served from that face's
    /// slice. Anything else outside the centre, or any unloaded neighbour,
    /// is unknown.
    pub fn get(&self, local: IVec3) -> Option<BlockId> {
        if let Some(block) = self.center.get(local) {
            return Some(block);
        }

        let dims = self.dims();
        let (s, h) = (dims.size(), dims.height());
        let side = match (local.x, local.y, local.z) {
            (x, y, z) if x == -1 && in_range(y, h) && in_range(z, s) => FaceDirection::West,
            (x, y, z) if x == s && in_range(y, h) && in_range(z, s) => FaceDirection::East,
            (x, y, z) if y == -1 && in_range(x, s) && in_range(z, s) => FaceDirection::Down,
            (x, y, z) if y == h && in_range(x, s) && in_range(z, s) => FaceDirection::Up,
            (x, y, z) if z == -1 && in_range(x, s) && in_range(y, h) => FaceDirection::South,
            (x, y, z) if z == s && in_range(x, s) && in_range(y, h) => FaceDirection::North,
            _ => return None,
        };

        let slice = self.faces[side.index()].as_ref()?;
        let (a, b) = match side {
            FaceDirection::East | FaceDirection::West => (local.y, local.z),
            FaceDirection::Up | FaceDirection::Down => (local.x, local.z),
            FaceDirection::North | FaceDirection::South => (local.x, local.y),
        };
        slice.get(a as usize, b as usize)
    }
}

fn in_range(v: i32, extent: i32) -> bool {
    (0..extent).contains(&v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_voxel::Chunk;

    fn dims() -> ChunkDims {
        ChunkDims::new(4, 6)
    }

    fn marked(value: u16, at: IVec3) -> ChunkData {
        let mut data = ChunkData::new_air(dims());
        data.set(at, BlockId(value));
        data
    }

    #[test]
    fn test_center_lookup() {
        let n = ChunkNeighborhood::from_center_only(marked(7, IVec3::new(1, 2, 3)));
        assert_eq!(n.get(IVec3::new(1, 2, 3)), Some(BlockId(7)));
        assert_eq!(n.get(IVec3::new(0, 0, 0)), Some(BlockId::AIR));
    }

    #[test]
    fn test_missing_neighbor_is_unknown() {
        let n = ChunkNeighborhood::from_center_only(ChunkData::new_air(dims()));
        for dir in FaceDirection::ALL {
            assert!(!n.has_neighbor(dir));
        }
        assert_eq!(n.get(IVec3::new(-1, 0, 0)), None);
        assert_eq!(n.get(IVec3::new(0, 6, 0)), None);
    }

    #[test]
    fn test_each_face_reads_touching_layer() {
        let center = ChunkData::new_air(dims());
        let cases = [
            // (side, cell in neighbour, query relative to centre)
            (FaceDirection::East, IVec3::new(0, 5, 2), IVec3::new(4, 5, 2)),
            (FaceDirection::West, IVec3::new(3, 1, 3), IVec3::new(-1, 1, 3)),
            (FaceDirection::Up, IVec3::new(2, 0, 1), IVec3::new(2, 6, 1)),
            (FaceDirection::Down, IVec3::new(1, 5, 3), IVec3::new(1, -1, 3)),
            (FaceDirection::North, IVec3::new(3, 4, 0), IVec3::new(3, 4, 4)),
            (FaceDirection::South, IVec3::new(0, 2, 3), IVec3::new(0, 2, -1)),
        ];
        for (side, cell, query) in cases {
            let mut n = ChunkNeighborhood::from_center_only(center.clone());
            n.set_face_neighbor(side, &marked(9, cell));
            assert_eq!(n.get(query), Some(BlockId(9)), "{side:?}");
        }
    }

    #[test]
    fn test_two_axes_out_is_unknown() {
        let mut n = ChunkNeighborhood::from_center_only(ChunkData::new_air(dims()));
        n.set_face_neighbor(FaceDirection::East, &ChunkData::new_air(dims()));
        n.set_face_neighbor(FaceDirection::Up, &ChunkData::new_air(dims()));
        assert_eq!(n.get(IVec3::new(4, 6, 0)), None);
        assert_eq!(n.get(IVec3::new(5, 0, 0)), None);
    }

    #[test]
    fn test_capture_from_map() {
        let map = ChunkMap::new(dims());
        let center = ChunkPos::new(0, 0, 0);
        let east = ChunkPos::new(4, 0, 0);
        map.insert_if_absent(Chunk::new(center, dims()));
        let mut neighbor = Chunk::new(east, dims());
        neighbor.set_block(IVec3::new(0, 3, 1), BlockId(2), true);
        map.insert_if_absent(neighbor);

        let n = ChunkNeighborhood::capture(&map, center).unwrap();
        assert!(n.has_neighbor(FaceDirection::East));
        assert!(!n.has_neighbor(FaceDirection::West));
        assert_eq!(n.get(IVec3::new(4, 3, 1)), Some(BlockId(2)));
        assert!(ChunkNeighborhood::capture(&map, ChunkPos::new(8, 0, 0)).is_none());
    }
}
