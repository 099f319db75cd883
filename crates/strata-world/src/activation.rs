//! Meshes waiting to be handed to the render sink.

use std::collections::VecDeque;

use strata_mesh::ChunkMesh;
use strata_voxel::ChunkPos;

/// A mesh built by a streaming cycle.
#[derive(Clone, Debug)]
pub struct ReadyMesh {
    pub pos: ChunkPos,
    pub mesh: ChunkMesh,
    /// Data version the mesh was built from.
    pub version: u64,
}

/// FIFO of ready meshes, at most one entry per chunk.
#[derive(Debug, Default)]
pub struct ActivationQueue {
    queue: VecDeque<ReadyMesh>,
}

impl ActivationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `ready`. A queued mesh for the same chunk is replaced in place,
    /// keeping its turn.
    pub fn push(&mut self, ready: ReadyMesh) {
        if let Some(queued) = self.queue.iter_mut().find(|q| q.pos == ready.pos) {
            *queued = ready;
        } else {
            self.queue.push_back(ready);
        }
    }

    pub fn extend(&mut self, batch: impl IntoIterator<Item = ReadyMesh>) {
        for ready in batch {
            self.push(ready);
        }
    }

    pub fn pop(&mut self) -> Option<ReadyMesh> {
        self.queue.pop_front()
    }

    pub fn contains(&self, pos: &ChunkPos) -> bool {
        self.queue.iter().any(|q| q.pos == *pos)
    }

    /// Drops queued meshes for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&ChunkPos) -> bool) {
        self.queue.retain(|q| keep(&q.pos));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(x: i32, version: u64) -> ReadyMesh {
        ReadyMesh {
            pos: ChunkPos::new(x, 0, 0),
            mesh: ChunkMesh::new(),
            version,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ActivationQueue::new();
        queue.extend([ready(0, 1), ready(16, 1), ready(32, 1)]);
        let order: Vec<i32> = std::iter::from_fn(|| queue.pop()).map(|r| r.pos.x).collect();
        assert_eq!(order, vec![0, 16, 32]);
    }

    #[test]
    fn test_duplicate_replaces_in_place() {
        let mut queue = ActivationQueue::new();
        queue.extend([ready(0, 1), ready(16, 1), ready(0, 2)]);
        assert_eq!(queue.len(), 2);
        let first = queue.pop().unwrap();
        assert_eq!((first.pos.x, first.version), (0, 2));
    }

    #[test]
    fn test_retain_drops_evicted() {
        let mut queue = ActivationQueue::new();
        queue.extend([ready(0, 1), ready(16, 1)]);
        queue.retain(|pos| pos.x == 16);
        assert!(!queue.contains(&ChunkPos::new(0, 0, 0)));
        assert!(queue.contains(&ChunkPos::new(16, 0, 0)));
        queue.clear();
        assert!(queue.is_empty());
    }
}
