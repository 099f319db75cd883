//! Periodic observer sampling.

use glam::{IVec3, Vec3};
use strata_voxel::{ChunkDims, ChunkPos};

/// Decides when the observer has moved far enough for a new streaming cycle.
///
/// The position is only looked at once per interval. A cycle is warranted
/// when the observer is more than one chunk width from the centre of the
/// chunk it was in at the last recentre, or more than one chunk height from
/// that chunk's origin row.
#[derive(Clone, Debug)]
pub struct ObserverTracker {
    dims: ChunkDims,
    interval: f32,
    elapsed: f32,
    chunk: ChunkPos,
    center: Vec3,
}

impl ObserverTracker {
    pub fn new(dims: ChunkDims, interval_secs: f32, observer: Vec3) -> Self {
        let mut tracker = Self {
            dims,
            interval: interval_secs,
            elapsed: 0.0,
            chunk: ChunkPos::new(0, 0, 0),
            center: Vec3::ZERO,
        };
        tracker.recenter(observer);
        tracker
    }

    /// Re-anchors on the chunk containing `observer`.
    pub fn recenter(&mut self, observer: Vec3) {
        let block: IVec3 = observer.round().as_ivec3();
        self.chunk = ChunkPos::containing(block, self.dims);
        let half = self.dims.size() as f32 / 2.0;
        let origin = self.chunk.origin().as_vec3();
        self.center = Vec3::new(origin.x + half, origin.y, origin.z + half);
        self.elapsed = 0.0;
    }

    /// Advances the sampling clock by `dt` and, if a sample is due, reports
    /// whether `observer` has left the anchored area.
    pub fn should_reload(&mut self, dt: f32, observer: Vec3) -> bool {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = 0.0;

        let size = self.dims.size() as f32;
        let height = self.dims.height() as f32;
        (self.center.x - observer.x).abs() > size
            || (self.center.z - observer.z).abs() > size
            || (self.chunk.y as f32 - observer.y).abs() > height
    }

    /// Chunk anchored at the last recentre.
    pub fn anchor(&self) -> ChunkPos {
        self.chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ObserverTracker {
        ObserverTracker::new(ChunkDims::new(16, 100), 1.0, Vec3::new(4.0, 50.0, 4.0))
    }

    #[test]
    fn test_anchor_centre() {
        let t = tracker();
        assert_eq!(t.anchor(), ChunkPos::new(0, 0, 0));
        assert_eq!(t.center, Vec3::new(8.0, 0.0, 8.0));
    }

    #[test]
    fn test_not_sampled_before_interval() {
        let mut t = tracker();
        let far = Vec3::new(500.0, 50.0, 0.0);
        assert!(!t.should_reload(0.5, far));
        assert!(t.should_reload(0.5, far));
    }

    #[test]
    fn test_small_moves_do_not_trigger() {
        let mut t = tracker();
        assert!(!t.should_reload(1.0, Vec3::new(24.0, 90.0, -8.0)));
    }

    #[test]
    fn test_each_axis_threshold() {
        for observer in [
            Vec3::new(24.5, 50.0, 8.0),
            Vec3::new(8.0, 50.0, -8.5),
            Vec3::new(8.0, -100.5, 8.0),
        ] {
            let mut t = tracker();
            assert!(t.should_reload(1.0, observer), "{observer:?}");
        }
    }

    #[test]
    fn test_recenter_resets_anchor() {
        let mut t = tracker();
        t.recenter(Vec3::new(40.0, 10.0, -3.0));
        assert_eq!(t.anchor(), ChunkPos::new(32, 0, -16));
        assert!(!t.should_reload(1.0, Vec3::new(40.0, 10.0, -3.0)));
    }
}
