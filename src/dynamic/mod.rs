//! Dynamic levels for non-player actors: registry, strategies and snapshot.

pub mod compute;
pub mod mode;
pub mod record;
pub mod registry;
pub mod snapshot;
pub mod system;

pub use compute::*;
pub use mode::LevelMode;
pub use record::*;
pub use registry::*;
pub use snapshot::SnapshotStore;
pub use system::*;
