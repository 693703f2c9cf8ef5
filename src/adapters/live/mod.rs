//! Live adapters for real external interactions.

pub mod filesystem;
pub mod notifier;
pub mod stamps;
pub mod upstream;
