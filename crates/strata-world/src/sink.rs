//! Where activated chunk geometry goes.

use std::fmt::Debug;

use strata_mesh::ChunkMesh;
use strata_voxel::ChunkPos;

/// Receives chunk geometry from the world's controller thread.
///
/// Handles are issued by the sink and only ever passed back to it.
pub trait RenderSink {
    type Handle: Copy + Eq + Debug;

    /// Makes a chunk visible and solid, returning its handle.
    fn activate(&mut self, pos: ChunkPos, mesh: ChunkMesh) -> Self::Handle;

    /// Releases a chunk. The sink may keep the slot around for reuse.
    fn deactivate(&mut self, handle: Self::Handle);

    /// Swaps the geometry of an active chunk in place.
    fn apply_mesh(&mut self, handle: Self::Handle, mesh: ChunkMesh);
}

/// Index into a [`MemorySink`]'s slot table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle(usize);

#[derive(Debug, Default)]
struct Slot {
    pos: Option<ChunkPos>,
    mesh: ChunkMesh,
}

/// Counters reported by [`MemorySink::stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub active: usize,
    /// Slots ever allocated.
    pub pool_size: usize,
    /// Released slots waiting for reuse.
    pub free: usize,
    /// Activations served from the free list.
    pub reused: usize,
    pub mesh_updates: usize,
}

/// Keeps geometry in memory. Released slots go to a free list and are handed
/// out again before any new slot is allocated.
#[derive(Debug, Default)]
pub struct MemorySink {
    slots: Vec<Slot>,
    free: Vec<usize>,
    reused: usize,
    mesh_updates: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, handle: SlotHandle) -> Option<&ChunkMesh> {
        let slot = self.slots.get(handle.0)?;
        slot.pos.map(|_| &slot.mesh)
    }

    pub fn position(&self, handle: SlotHandle) -> Option<ChunkPos> {
        self.slots.get(handle.0)?.pos
    }

    /// Positions of every active slot, in slot order.
    pub fn active_positions(&self) -> Vec<ChunkPos> {
        self.slots.iter().filter_map(|slot| slot.pos).collect()
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            active: self.slots.len() - self.free.len(),
            pool_size: self.slots.len(),
            free: self.free.len(),
            reused: self.reused,
            mesh_updates: self.mesh_updates,
        }
    }
}

impl RenderSink for MemorySink {
    type Handle = SlotHandle;

    fn activate(&mut self, pos: ChunkPos, mesh: ChunkMesh) -> SlotHandle {
        let slot = Slot {
            pos: Some(pos),
            mesh,
        };
        if let Some(index) = self.free.pop() {
            self.reused += 1;
            self.slots[index] = slot;
            SlotHandle(index)
        } else {
            self.slots.push(slot);
            SlotHandle(self.slots.len() - 1)
        }
    }

    fn deactivate(&mut self, handle: SlotHandle) {
        let Some(slot) = self.slots.get_mut(handle.0) else {
            tracing::warn!(?handle, "Deactivating unknown render slot");
            return;
        };
        if slot.pos.take().is_some() {
            slot.mesh.clear();
            self.free.push(handle.0);
        }
    }

    fn apply_mesh(&mut self, handle: SlotHandle, mesh: ChunkMesh) {
        match self.slots.get_mut(handle.0) {
            Some(slot) if slot.pos.is_some() => {
                slot.mesh = mesh;
                self.mesh_updates += 1;
            }
            _ => tracing::warn!(?handle, "Mesh update for inactive render slot"),
        }
    }
}
