//! Record store abstraction over an eventually consistent replicated substrate.
//!
//! Backends:
//! - [`MemoryNetwork`] / [`MemoryPeerStore`]: several peers sharing a simulated
//!   network with configurable replication delay and an explicit `sync` barrier
//! - [`FileRecordStore`]: a single peer's durable local view on disk

mod disk;
mod error;
mod memory;
mod traits;

pub use disk::FileRecordStore;
pub use error::StoreError;
pub use memory::{MemoryNetwork, MemoryPeerStore, ReplicationMode};
pub use traits::{Record, RecordHandle, RecordStore};
