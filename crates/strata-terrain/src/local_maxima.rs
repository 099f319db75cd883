//! Strict local-maxima extraction over a 2D grid of noise values.

use glam::IVec2;

/// The eight compass neighbours, diagonals included.
const NEIGHBORS: [IVec2; 8] = [
    IVec2::new(0, 1),
    IVec2::new(1, 1),
    IVec2::new(1, 0),
    IVec2::new(1, -1),
    IVec2::new(0, -1),
    IVec2::new(-1, -1),
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
];

/// Row-major `width × depth` grid of samples, addressed as `(x, z)`.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseGrid {
    width: usize,
    depth: usize,
    values: Vec<f32>,
}

impl NoiseGrid {
    /// Builds a grid by evaluating `sample(x, z)` for every cell.
    pub fn from_fn(width: usize, depth: usize, mut sample: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(width * depth);
        for z in 0..depth {
            for x in 0..width {
                values.push(sample(x, z));
            }
        }
        Self {
            width,
            depth,
            values,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Value at `(x, z)`, or `None` outside the grid.
    pub fn get(&self, x: i32, z: i32) -> Option<f32> {
        if x < 0 || z < 0 || x as usize >= self.width || z as usize >= self.depth {
            return None;
        }
        Some(self.values[z as usize * self.width + x as usize])
    }
}

/// Returns every cell strictly greater than all of its in-bounds neighbours.
///
/// Equal neighbours suppress a maximum. Neighbours outside the grid are
/// skipped rather than compared, so border cells only have to beat the cells
/// that exist; edge cells therefore qualify more easily than interior ones.
pub fn find_local_maxima(grid: &NoiseGrid) -> Vec<IVec2> {
    let mut maxima = Vec::new();
    for z in 0..grid.depth as i32 {
        for x in 0..grid.width as i32 {
            let Some(center) = grid.get(x, z) else {
                continue;
            };
            let is_max = NEIGHBORS.iter().all(|d| match grid.get(x + d.x, z + d.y) {
                Some(neighbor) => neighbor < center,
                None => true,
            });
            if is_max {
                maxima.push(IVec2::new(x, z));
            }
        }
    }
    maxima
}
