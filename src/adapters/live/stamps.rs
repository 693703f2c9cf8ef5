//! System clock and UUID run ids.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ports::{Clock, IdGenerator};

/// Reads the system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Issues random (v4) UUIDs as run ids.
pub struct UuidRunIds;

impl IdGenerator for UuidRunIds {
    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_distinct_v4_uuids() {
        let first = UuidRunIds.generate_id();
        let parsed = Uuid::parse_str(&first).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_ne!(first, UuidRunIds.generate_id());
    }

    #[test]
    fn system_clock_does_not_go_backwards() {
        let earlier = SystemClock.now();
        assert!(SystemClock.now() >= earlier);
    }
}
