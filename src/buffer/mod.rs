//! Buffer pool management: frames, partitions, Clock-Sweep eviction, and
//! the pool façade built on top of them.
//!
//! - [`BufferPool`] - the public façade (open/create/close, alloc/release,
//!   pin/unpin, checkpoint, statistics, consistency check).
//! - [`PinGuard`] - the RAII pin handle returned by `pin`/`alloc`.
//! - `frame` - per-frame descriptors and their page buffers.
//! - `partition` - the sharded allocation metadata that lets disjoint
//!   pages be operated on concurrently.
//! - `replacer::clock` - the partitioned Clock-Sweep victim picker.
//! - `stats` - `getStatistics()`'s return type plus ambient operational
//!   telemetry.

mod frame;
mod guard;
mod partition;
pub(crate) mod pool;
mod replacer;
mod stats;

pub use frame::Frame;
pub use guard::{PageBytesRead, PageBytesWrite, PinGuard};
pub use partition::Partition;
pub use pool::BufferPool;
pub use replacer::ClockSweep;
pub use stats::{BufferPoolStats, Statistics, StatsSnapshot};
