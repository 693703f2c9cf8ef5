//! Ports that stamp each drift check: when it finished and which run it was.

use chrono::{DateTime, Utc};

/// Source of check timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Source of run identifiers.
///
/// A revision can be checked many times; the id tells its ledger entries apart.
pub trait IdGenerator: Send + Sync {
    /// Returns an identifier not handed out before.
    fn generate_id(&self) -> String;
}
