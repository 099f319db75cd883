//! Domain warping: displace sample coordinates by two independent noise
//! fields before evaluating the main field, so features stop lining up with
//! the block grid.

use glam::{IVec2, Vec2};
use strata_config::{NoiseSettings, WarpConfig};

use crate::noise_field::NoiseField;

/// Two displacement fields and a per-axis amplitude in blocks.
#[derive(Clone)]
pub struct DomainWarp {
    field: NoiseField,
    x: NoiseSettings,
    z: NoiseSettings,
    amplitude: IVec2,
}

impl DomainWarp {
    pub fn new(x: NoiseSettings, z: NoiseSettings, amplitude: IVec2) -> Self {
        Self {
            field: NoiseField::new(),
            x,
            z,
            amplitude,
        }
    }

    pub fn from_config(config: &WarpConfig) -> Self {
        Self::new(
            config.x,
            config.z,
            IVec2::new(config.amplitude.0, config.amplitude.1),
        )
    }

    /// Displacement applied to the sample point `(x, z)`.
    pub fn offset(&self, x: f32, z: f32, seed: i32) -> Vec2 {
        Vec2::new(
            self.field.octave(x, z, &self.x, seed) * self.amplitude.x as f32,
            self.field.octave(x, z, &self.z, seed) * self.amplitude.y as f32,
        )
    }

    /// Evaluates `settings` at the warped position of `(x, z)`.
    pub fn warped(&self, x: f32, z: f32, settings: &NoiseSettings, seed: i32) -> f32 {
        let offset = self.offset(x, z, seed);
        self.field.octave(x + offset.x, z + offset.y, settings, seed)
    }
}
