//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the patch engine and an external
//! system (time, filesystem, upstream git, issue tracker, IDs).
//! Implementations live in `src/adapters/`.

pub mod filesystem;
pub mod notifier;
pub mod stamps;
pub mod upstream;

pub use filesystem::{FileSystem, PortError};
pub use notifier::{CompatibilityEvent, Notifier, NotifyFuture};
pub use stamps::{Clock, IdGenerator};
pub use upstream::{FetchFuture, UpstreamSource};
