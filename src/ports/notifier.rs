//! Notifier port for compatibility events.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filesystem::PortError;

/// Boxed future type alias used by [`Notifier`] to keep the trait dyn-compatible.
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PortError>> + Send + 'a>>;

/// Raised when an upstream revision no longer accepts every unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityEvent {
    /// The upstream revision that was checked.
    pub revision: String,
    /// Names of the units that conflicted, in application order.
    pub failed_units: Vec<String>,
    /// When the check finished.
    pub timestamp: DateTime<Utc>,
}

/// Delivers compatibility events to an external issue tracker.
pub trait Notifier: Send + Sync {
    /// Sends the event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be delivered.
    fn notify<'a>(&'a self, event: &'a CompatibilityEvent) -> NotifyFuture<'a>;
}
