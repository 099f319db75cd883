//! Tree placement: local maxima of a warped noise field over the chunk footprint.

use glam::IVec3;
use strata_config::NoiseSettings;
use strata_voxel::{ChunkPos, TreeColumns};

use crate::domain_warp::DomainWarp;
use crate::local_maxima::{NoiseGrid, find_local_maxima};

/// Trunk length in blocks.
pub const TRUNK_HEIGHT: i32 = 5;

/// Picks the columns of a chunk that should host a tree.
#[derive(Clone)]
pub struct TreePlacer {
    warp: DomainWarp,
    noise: NoiseSettings,
    seed: i32,
}

impl TreePlacer {
    pub fn new(warp: DomainWarp, noise: NoiseSettings, seed: i32) -> Self {
        Self { warp, noise, seed }
    }

    /// Samples the `size × size` footprint of `pos` and returns its local maxima
    /// as local `(x, z)` columns.
    pub fn place(&self, pos: ChunkPos, size: i32) -> TreeColumns {
        let size = size.max(0) as usize;
        let grid = NoiseGrid::from_fn(size, size, |x, z| {
            let wx = (pos.x + x as i32) as f32;
            let wz = (pos.z + z as i32) as f32;
            self.warp.warped(wx, wz, &self.noise, self.seed)
        });
        find_local_maxima(&grid).into_iter().collect()
    }
}

/// Block offsets of the canopy relative to the ground block, lower rings first.
pub(crate) fn canopy_offsets() -> impl Iterator<Item = IVec3> {
    let lower = (TRUNK_HEIGHT - 2..TRUNK_HEIGHT).flat_map(|y| {
        (-2i32..=2).flat_map(move |x| (-2i32..=2).map(move |z| (x, y, z)))
    });
    let lower = lower.filter(|&(x, _, z)| {
        let center = x == 0 && z == 0;
        let corner = x.abs() == 2 && z.abs() == 2;
        !center && !corner
    });

    let upper = (TRUNK_HEIGHT..TRUNK_HEIGHT + 2).flat_map(|y| {
        (-1i32..=1).flat_map(move |x| (-1i32..=1).map(move |z| (x, y, z)))
    });
    let upper = upper.filter(|&(x, y, z)| {
        let plus = x == 0 || z == 0;
        let trunk_cell = x == 0 && z == 0 && y < TRUNK_HEIGHT + 1;
        plus && !trunk_cell
    });

    lower
        .chain(upper)
        .map(|(x, y, z)| IVec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_config::TerrainConfig;

    fn placer() -> TreePlacer {
        let config = TerrainConfig::default();
        TreePlacer::new(
            DomainWarp::from_config(&config.warp),
            config.tree_noise,
            1,
        )
    }

    #[test]
    fn test_placement_is_deterministic_and_in_footprint() {
        let pos = ChunkPos::new(32, 0, -16);
        let a = placer().place(pos, 16);
        let b = placer().place(pos, 16);
        assert_eq!(a, b);
        assert!(!a.is_empty(), "default tree noise should yield some trees");
        for c in &a {
            assert!((0..16).contains(&c.x) && (0..16).contains(&c.y));
        }
    }

    #[test]
    fn test_canopy_shape() {
        let cells: Vec<_> = canopy_offsets().collect();
        // Two 5×5 rings minus centre and corners, then a plus with and without centre.
        assert_eq!(cells.len(), 2 * (25 - 1 - 4) + 4 + 5);
        assert!(!cells.contains(&IVec3::new(2, 3, 2)));
        assert!(!cells.contains(&IVec3::new(0, TRUNK_HEIGHT, 0)));
        assert!(cells.contains(&IVec3::new(0, TRUNK_HEIGHT + 1, 0)));
        assert!(!cells.contains(&IVec3::new(1, TRUNK_HEIGHT, 1)));
    }
}
