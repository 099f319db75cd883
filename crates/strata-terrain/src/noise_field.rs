//! Octave-summed 2D Perlin noise normalized to `[0, 1]`, plus the reshaping
//! helpers used to turn a noise value into a block height.

use noise::{NoiseFn, Perlin};
use strata_config::NoiseSettings;

/// Permutation seed of the underlying Perlin table. The world seed enters as
/// a coordinate offset instead, so one table serves every world.
const PERMUTATION_SEED: u32 = 0;

/// Deterministic coherent-noise evaluator. Stateless after construction, so
/// it can be shared freely across worker threads.
#[derive(Clone)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    pub fn new() -> Self {
        Self {
            perlin: Perlin::new(PERMUTATION_SEED),
        }
    }

    /// Single Perlin sample remapped from `[-1, 1]` to `[0, 1]`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        ((self.perlin.get([x, z]) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Sums `settings.octaves` layers at `(x·scale + offset + seed, z·scale + offset + seed)`.
    ///
    /// Layer `i` is sampled at frequency `2^i` with weight `persistence^i`; the
    /// sum is divided by the total weight, so the result stays in `[0, 1]`.
    pub fn octave(&self, x: f32, z: f32, settings: &NoiseSettings, seed: i32) -> f32 {
        let sx = f64::from(x) * f64::from(settings.scale)
            + f64::from(settings.offset.0)
            + f64::from(seed);
        let sz = f64::from(z) * f64::from(settings.scale)
            + f64::from(settings.offset.1)
            + f64::from(seed);

        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut amplitude_sum = 0.0;

        for _ in 0..settings.octaves {
            total += self.sample(sx * frequency, sz * frequency) * amplitude;
            amplitude_sum += amplitude;
            amplitude *= f64::from(settings.persistence);
            frequency *= 2.0;
        }

        if amplitude_sum <= 0.0 {
            return 0.0;
        }
        (total / amplitude_sum) as f32
    }
}

impl Default for NoiseField {
    fn default() -> Self {
        Self::new()
    }
}

/// `(value · redistribution_modifier) ^ exponent`.
pub fn redistribute(value: f32, settings: &NoiseSettings) -> f32 {
    (value * settings.redistribution_modifier).powf(settings.exponent)
}

/// Linear remap of `value` from `[in_min, in_max]` to `[out_min, out_max]`.
pub fn remap(value: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Remap from `[0, 1]` to `[out_min, out_max]`.
pub fn remap01(value: f32, out_min: f32, out_max: f32) -> f32 {
    remap(value, 0.0, 1.0, out_min, out_max)
}
