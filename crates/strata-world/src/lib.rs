//! Streaming voxel world: keeps a window of generated, meshed and active
//! chunks around a moving observer.
//!
//! Each streaming cycle diffs the wanted set against what is loaded, evicts
//! on the caller's thread, then generates, decorates and meshes on a
//! background thread in three strictly sequenced stages. Finished meshes are
//! activated a few per [`World::tick`].

pub mod activation;
pub mod cancel;
mod cycle;
pub mod error;
pub mod observer;
pub mod sink;
pub mod stage;
pub mod wanted;
pub mod world;

pub use activation::{ActivationQueue, ReadyMesh};
pub use cancel::{CancellationToken, CycleToken};
pub use error::WorldError;
pub use observer::ObserverTracker;
pub use sink::{MemorySink, RenderSink, SinkStats, SlotHandle};
pub use stage::{StageOutcome, run_stage, worker_count};
pub use wanted::{StreamingPlan, wanted_positions};
pub use world::{ChunkState, World, WorldBuilder, WorldEvent, WorldStats};
