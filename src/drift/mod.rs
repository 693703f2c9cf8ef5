//! Drift monitor: dry-runs the unit set against a fresh upstream snapshot.
//!
//! A check never touches an operator's tree. It fetches the requested ref into
//! a temporary directory, classifies every unit there, records the verdict in
//! the ledger, and raises a compatibility event when anything conflicts. A
//! fetch that fails or times out leaves the ledger untouched: the revision is
//! unknown, not conflicted.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::context::ServiceContext;
use crate::engine::{Engine, Mode};
use crate::error::{Error, Result};
use crate::ledger::{LedgerEntry, Verdict, VersionLedger};
use crate::ports::CompatibilityEvent;
use crate::probe::Direction;
use crate::tree::TreeRoot;
use crate::unit::ModificationUnit;

/// Where and how to fetch upstream snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    /// Git URL of the upstream tree.
    pub url: String,
    /// Marker subdirectory the snapshot must contain.
    pub marker_dir: String,
    /// Upper bound on the fetch.
    pub timeout: Duration,
}

/// Delivery state of the compatibility event for one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum NotificationStatus {
    /// The verdict was Clean; nothing to send.
    NotNeeded,
    /// The event reached the notifier.
    Delivered,
    /// Delivery failed; the ledger entry is still recorded.
    Failed(String),
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNeeded => write!(f, "not needed"),
            Self::Delivered => write!(f, "delivered"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Result of a completed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// The entry written to the ledger.
    pub entry: LedgerEntry,
    /// What happened to the compatibility event.
    pub notification: NotificationStatus,
}

/// Runs compatibility checks against upstream refs.
pub struct DriftMonitor<'a> {
    ctx: &'a ServiceContext,
    units: &'a [ModificationUnit],
    ledger: &'a VersionLedger<'a>,
    target: UpstreamTarget,
}

impl<'a> DriftMonitor<'a> {
    /// Creates a monitor for `units` that records into `ledger`.
    #[must_use]
    pub fn new(
        ctx: &'a ServiceContext,
        units: &'a [ModificationUnit],
        ledger: &'a VersionLedger<'a>,
        target: UpstreamTarget,
    ) -> Self {
        Self { ctx, units, ledger, target }
    }

    /// Checks `upstream_ref` and records the verdict.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] or [`Error::Fetch`] if the snapshot cannot
    /// be obtained, and [`Error::Configuration`] if it does not have the
    /// expected shape; none of these record a ledger entry. Returns
    /// [`Error::Aborted`] if a snapshot file cannot be read, and
    /// [`Error::Environment`] if the ledger cannot be read or written.
    pub async fn check(&self, upstream_ref: &str) -> Result<CheckOutcome> {
        let clone = tempfile::Builder::new()
            .prefix("chainpatch-upstream-")
            .tempdir()
            .map_err(|e| Error::environment("creating snapshot directory", Box::new(e)))?;

        tracing::info!(url = %self.target.url, upstream_ref, "checking upstream");
        let fetch = self.ctx.upstream.fetch(&self.target.url, upstream_ref, clone.path());
        let revision = match tokio::time::timeout(self.target.timeout, fetch).await {
            Err(_) => {
                tracing::warn!(
                    upstream_ref,
                    limit = ?self.target.timeout,
                    "upstream fetch timed out"
                );
                return Err(Error::Timeout {
                    reference: upstream_ref.to_string(),
                    limit: self.target.timeout,
                });
            }
            Ok(Err(e)) => {
                return Err(Error::Fetch {
                    reference: upstream_ref.to_string(),
                    message: e.to_string(),
                });
            }
            Ok(Ok(revision)) => revision,
        };

        let root = TreeRoot::open(self.ctx.fs.as_ref(), clone.path(), &self.target.marker_dir)?;
        let summary = Engine::new(self.ctx.fs.as_ref()).run(
            &root,
            self.units,
            Mode::DryRun(Direction::Forward),
        )?;

        let verdict = Verdict::of(&summary);
        let entry = LedgerEntry {
            run_id: self.ctx.id_gen.generate_id(),
            revision,
            upstream_ref: upstream_ref.to_string(),
            timestamp: self.ctx.clock.now(),
            verdict,
            failed_units: summary.failed_units(),
            summary,
        };
        self.ledger.record(&entry)?;

        let notification = match verdict {
            Verdict::Clean => NotificationStatus::NotNeeded,
            Verdict::Conflict => self.notify(&entry).await,
        };
        Ok(CheckOutcome { entry, notification })
    }

    async fn notify(&self, entry: &LedgerEntry) -> NotificationStatus {
        let event = CompatibilityEvent {
            revision: entry.revision.clone(),
            failed_units: entry.failed_units.clone(),
            timestamp: entry.timestamp,
        };
        match self.ctx.notifier.notify(&event).await {
            Ok(()) => NotificationStatus::Delivered,
            Err(e) => {
                tracing::warn!(
                    revision = %event.revision,
                    error = %e,
                    "compatibility event not delivered"
                );
                NotificationStatus::Failed(e.to_string())
            }
        }
    }
}

/// Formats a check outcome as a human-readable string.
#[must_use]
pub fn format_check_report(outcome: &CheckOutcome) -> String {
    let entry = &outcome.entry;
    let mut lines =
        vec![format!("{} ({}): {}", entry.upstream_ref, entry.revision, entry.verdict)];
    for name in &entry.failed_units {
        lines.push(format!("  [CONFLICT] {name}"));
    }
    if outcome.notification != NotificationStatus::NotNeeded {
        lines.push(format!("notification {}", outcome.notification));
    }
    lines.join("\n")
}
