//! Column ground height sources.

use strata_config::NoiseSettings;

use crate::domain_warp::DomainWarp;
use crate::noise_field::{redistribute, remap01};

/// Maps a world column to its surface elevation.
///
/// Implementations must be pure: the same column always yields the same height.
pub trait GroundHeight: Send + Sync {
    /// Surface height, in blocks, of world column `(x, z)`.
    fn surface_height(&self, x: i32, z: i32) -> i32;
}

/// Warped, redistributed noise remapped to `[0, chunk_height]` and clamped so
/// the surface block always lands inside the origin row.
pub struct WarpedGround {
    warp: DomainWarp,
    noise: NoiseSettings,
    seed: i32,
    chunk_height: i32,
}

impl WarpedGround {
    pub fn new(warp: DomainWarp, noise: NoiseSettings, seed: i32, chunk_height: i32) -> Self {
        Self {
            warp,
            noise,
            seed,
            chunk_height,
        }
    }
}

impl GroundHeight for WarpedGround {
    fn surface_height(&self, x: i32, z: i32) -> i32 {
        let value = self.warp.warped(x as f32, z as f32, &self.noise, self.seed);
        let value = redistribute(value, &self.noise);
        // Truncation toward zero, like a plain float-to-int cast.
        let height = remap01(value, 0.0, self.chunk_height as f32) as i32;
        height.clamp(0, self.chunk_height - 1)
    }
}

/// The same height everywhere.
#[derive(Clone, Copy, Debug)]
pub struct FlatGround(pub i32);

impl GroundHeight for FlatGround {
    fn surface_height(&self, _x: i32, _z: i32) -> i32 {
        self.0
    }
}
