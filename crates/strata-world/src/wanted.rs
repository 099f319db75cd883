//! Which chunks should exist around an observer, and what a cycle must do
//! to get there from the current state.

use glam::{IVec3, Vec3};
use rustc_hash::FxHashSet;
use strata_voxel::{ChunkDims, ChunkMap, ChunkPos};

/// Chunk positions wanted around `observer`, nearest first.
///
/// The base grid is the `(2r+1)²` square of row-zero chunks centred on the
/// observer's column. With `vertical_rows > 0`, the 3×3 columns nearest the
/// observer also get that many rows stacked below row zero.
pub fn wanted_positions(
    observer: Vec3,
    render_distance: u32,
    dims: ChunkDims,
    vertical_rows: u32,
) -> Vec<ChunkPos> {
    let block = observer.floor().as_ivec3();
    let center = ChunkPos::containing(IVec3::new(block.x, 0, block.z), dims);
    let r = render_distance as i32;

    let mut wanted = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for dx in -r..=r {
        for dz in -r..=r {
            wanted.push(center.step(dx, 0, dz, dims));
            if dx.abs() <= 1 && dz.abs() <= 1 {
                for k in 1..=vertical_rows as i32 {
                    wanted.push(center.step(dx, -k, dz, dims));
                }
            }
        }
    }

    wanted.sort_by(|a, b| {
        a.distance_to(observer)
            .total_cmp(&b.distance_to(observer))
            .then_with(|| a.cmp(b))
    });
    wanted
}

/// The work one streaming cycle has to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamingPlan {
    /// Wanted set, nearest first.
    pub wanted: Vec<ChunkPos>,
    /// Rendered chunks that fell out of the wanted set.
    pub to_destroy_rendered: Vec<ChunkPos>,
    /// Unmodified data chunks that fell out of the wanted set.
    pub to_destroy_data: Vec<ChunkPos>,
    /// Wanted chunks with no data yet, nearest first.
    pub to_generate: Vec<ChunkPos>,
    /// Wanted chunks with no render handle yet, nearest first.
    pub to_mesh: Vec<ChunkPos>,
}

impl StreamingPlan {
    /// Diffs `wanted` against what is loaded and rendered.
    ///
    /// Modified chunks are never scheduled for data destruction, so player
    /// edits survive the observer walking away and back.
    pub fn diff(wanted: Vec<ChunkPos>, data: &ChunkMap, rendered: &FxHashSet<ChunkPos>) -> Self {
        let wanted_set: FxHashSet<ChunkPos> = wanted.iter().copied().collect();

        let mut to_destroy_rendered: Vec<ChunkPos> = rendered
            .iter()
            .filter(|pos| !wanted_set.contains(pos))
            .copied()
            .collect();
        to_destroy_rendered.sort();

        let mut to_destroy_data: Vec<ChunkPos> = data
            .positions()
            .into_iter()
            .filter(|pos| !wanted_set.contains(pos) && !data.is_modified(pos))
            .collect();
        to_destroy_data.sort();

        let to_generate = wanted
            .iter()
            .filter(|pos| !data.contains(pos))
            .copied()
            .collect();
        let to_mesh = wanted
            .iter()
            .filter(|pos| !rendered.contains(pos))
            .copied()
            .collect();

        Self {
            wanted,
            to_destroy_rendered,
            to_destroy_data,
            to_generate,
            to_mesh,
        }
    }

    /// `true` when the world already matches the wanted set.
    pub fn is_settled(&self) -> bool {
        self.to_destroy_rendered.is_empty()
            && self.to_destroy_data.is_empty()
            && self.to_generate.is_empty()
            && self.to_mesh.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_voxel::{BlockId, Chunk};

    fn dims() -> ChunkDims {
        ChunkDims::new(16, 100)
    }

    #[test]
    fn test_grid_size_and_row() {
        let wanted = wanted_positions(Vec3::ZERO, 2, dims(), 0);
        assert_eq!(wanted.len(), 25);
        assert!(wanted.iter().all(|p| p.y == 0));
        assert!(wanted.contains(&ChunkPos::new(-32, 0, 32)));
        assert!(!wanted.contains(&ChunkPos::new(48, 0, 0)));
    }

    #[test]
    fn test_zero_radius_is_observer_chunk() {
        let wanted = wanted_positions(Vec3::new(-1.0, 250.0, 17.5), 0, dims(), 0);
        assert_eq!(wanted, vec![ChunkPos::new(-16, 0, 16)]);
    }

    #[test]
    fn test_sorted_nearest_first() {
        let observer = Vec3::new(40.0, 0.0, 8.0);
        let wanted = wanted_positions(observer, 3, dims(), 0);
        for pair in wanted.windows(2) {
            assert!(pair[0].distance_to(observer) <= pair[1].distance_to(observer));
        }
        assert_eq!(wanted[0], ChunkPos::new(32, 0, 0));
    }

    #[test]
    fn test_vertical_rows_only_near_observer() {
        let wanted = wanted_positions(Vec3::ZERO, 2, dims(), 2);
        assert_eq!(wanted.len(), 25 + 9 * 2);
        assert!(wanted.contains(&ChunkPos::new(16, -200, -16)));
        assert!(!wanted.contains(&ChunkPos::new(32, -100, 0)));
    }

    #[test]
    fn test_diff_against_empty_world() {
        let map = ChunkMap::new(dims());
        let wanted = wanted_positions(Vec3::ZERO, 1, dims(), 0);
        let plan = StreamingPlan::diff(wanted.clone(), &map, &FxHashSet::default());
        assert_eq!(plan.to_generate, wanted);
        assert_eq!(plan.to_mesh, wanted);
        assert!(plan.to_destroy_data.is_empty());
        assert!(!plan.is_settled());
    }

    #[test]
    fn test_diff_keeps_modified_chunks() {
        let map = ChunkMap::new(dims());
        let far = ChunkPos::new(160, 0, 0);
        let edited = ChunkPos::new(-160, 0, 0);
        let kept = ChunkPos::new(0, 0, 0);
        for pos in [far, edited, kept] {
            map.insert_if_absent(Chunk::new(pos, dims()));
        }
        map.edit(IVec3::new(-150, 5, 5), BlockId(1));
        let rendered: FxHashSet<ChunkPos> = [kept, far].into_iter().collect();

        let plan = StreamingPlan::diff(wanted_positions(Vec3::ZERO, 1, dims(), 0), &map, &rendered);
        assert_eq!(plan.to_destroy_rendered, vec![far]);
        assert_eq!(plan.to_destroy_data, vec![far]);
        assert!(!plan.to_generate.contains(&kept));
        assert!(!plan.to_mesh.contains(&kept));
        assert_eq!(plan.to_generate.len(), 8);
    }

    #[test]
    fn test_settled_world_has_nothing_to_do() {
        let map = ChunkMap::new(dims());
        let wanted = wanted_positions(Vec3::ZERO, 1, dims(), 0);
        for pos in &wanted {
            map.insert_if_absent(Chunk::new(*pos, dims()));
        }
        let rendered = wanted.iter().copied().collect();
        assert!(StreamingPlan::diff(wanted, &map, &rendered).is_settled());
    }
}
