//! Lifecycle engine: probes and applies the ordered unit set.
//!
//! Units are processed strictly one at a time because later units may anchor
//! on text inserted by earlier ones: set order when applying, reverse set
//! order when reversing. A conflicted unit is recorded and the run moves on;
//! earlier successful writes are never rolled back.

pub mod report;
pub mod summary;

use std::collections::HashMap;
use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::ports::FileSystem;
use crate::probe::{inspect, read_target, Direction, Inspection, ProbeResult};
use crate::tree::TreeRoot;
use crate::unit::ModificationUnit;

pub use report::{format_outcome, format_summary};
pub use summary::{Action, Counts, Mode, RunStatus, RunSummary, UnitOutcome};

/// Runs unit sets against a tree through the filesystem port.
///
/// The engine assumes exclusive access to the tree for the duration of a run;
/// callers serialize runs that target the same root.
pub struct Engine<'a> {
    fs: &'a dyn FileSystem,
    cancel: CancellationToken,
}

impl<'a> Engine<'a> {
    /// Creates an engine that is never cancelled.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs, cancel: CancellationToken::new() }
    }

    /// Uses `token` to stop between units.
    ///
    /// Cancelling never interrupts a write in progress; the run stops before
    /// the next unit and is reported as incomplete.
    #[must_use]
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Processes every unit in order under `mode`.
    ///
    /// Dry runs keep simulated contents in memory so later units are probed
    /// against the tree as a real run would have left it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Aborted`] if a target cannot be read or written. It
    /// carries the summary of the units handled before the failure, which keep
    /// their changes.
    pub fn run(
        &self,
        root: &TreeRoot,
        units: &[ModificationUnit],
        mode: Mode,
    ) -> Result<RunSummary> {
        let mut overlay: HashMap<PathBuf, String> = HashMap::new();
        let mut outcomes = Vec::with_capacity(units.len());
        let mut status = RunStatus::Completed;

        // Undo later units while the text they anchor on is still present.
        let ordered: Vec<&ModificationUnit> = match mode.direction() {
            Direction::Forward => units.iter().collect(),
            Direction::Reverse => units.iter().rev().collect(),
        };

        tracing::info!(%mode, root = %root.path().display(), units = units.len(), "run started");

        for unit in ordered {
            if self.cancel.is_cancelled() {
                tracing::warn!(processed = outcomes.len(), "run cancelled");
                status = RunStatus::Incomplete;
                break;
            }

            match self.step(root, unit, mode, &mut overlay) {
                Ok(outcome) => outcomes.push(outcome),
                Err(source) => {
                    tracing::error!(
                        unit = unit.name(),
                        processed = outcomes.len(),
                        error = %source,
                        "run aborted"
                    );
                    let summary =
                        RunSummary::finish(mode, RunStatus::Aborted, units.len(), outcomes);
                    return Err(Error::aborted(summary, source));
                }
            }
        }

        let summary = RunSummary::finish(mode, status, units.len(), outcomes);
        tracing::info!(
            applied = summary.counts.applied,
            skipped = summary.counts.skipped,
            failed = summary.counts.failed,
            "run finished"
        );
        Ok(summary)
    }

    /// Probes one unit and performs (or simulates) its action.
    fn step(
        &self,
        root: &TreeRoot,
        unit: &ModificationUnit,
        mode: Mode,
        overlay: &mut HashMap<PathBuf, String>,
    ) -> Result<UnitOutcome> {
        let direction = mode.direction();
        let path = root.resolve(unit.target());
        let on_disk;
        let content = if let Some(simulated) = overlay.get(&path) {
            Some(simulated.as_str())
        } else {
            on_disk = read_target(self.fs, &path)?;
            on_disk.as_deref()
        };
        let Inspection { result, patched } = inspect(content, unit);
        let action = Action::decide(direction, &result);

        if action.writes() {
            if let Some(patched) = patched {
                if mode.is_dry_run() {
                    overlay.insert(path, patched);
                } else {
                    self.fs.write_atomic(&path, &patched).map_err(|e| {
                        Error::environment(format!("writing {}", path.display()), e)
                    })?;
                    tracing::info!(unit = unit.name(), path = %path.display(), ?action, "wrote");
                }
            }
        }

        if let ProbeResult::Conflicted { reason } = &result {
            tracing::warn!(unit = unit.name(), %reason, "unit conflicted");
        } else {
            tracing::debug!(unit = unit.name(), probed = %result, ?action, "unit processed");
        }

        Ok(UnitOutcome {
            index: unit.index(),
            name: unit.name().to_string(),
            target: unit.target().to_path_buf(),
            probed: result,
            action,
        })
    }
}

/// Convenience wrapper for a single uncancellable run.
///
/// # Errors
///
/// See [`Engine::run`].
pub fn run(
    fs: &dyn FileSystem,
    root: &TreeRoot,
    units: &[ModificationUnit],
    mode: Mode,
) -> Result<RunSummary> {
    Engine::new(fs).run(root, units, mode)
}
