//! Run modes, per-unit outcomes, and the aggregated run summary.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::probe::{Direction, ProbeResult};

/// What a run does to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Write forward changes for unapplied units.
    Apply,
    /// Write reverse changes for applied units.
    Reverse,
    /// Classify as the given direction would, without writing.
    DryRun(Direction),
}

impl Mode {
    /// The direction whose branch logic this mode follows.
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Self::Apply => Direction::Forward,
            Self::Reverse => Direction::Reverse,
            Self::DryRun(direction) => direction,
        }
    }

    /// Returns `true` if this mode never writes.
    #[must_use]
    pub fn is_dry_run(self) -> bool {
        matches!(self, Self::DryRun(_))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apply => write!(f, "apply"),
            Self::Reverse => write!(f, "reverse"),
            Self::DryRun(Direction::Forward) => write!(f, "dry-run"),
            Self::DryRun(Direction::Reverse) => write!(f, "dry-run reverse"),
        }
    }
}

/// What the engine did (or, in a dry run, would do) for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Forward change written.
    Applied,
    /// Reverse change written.
    Reversed,
    /// Already in the requested state.
    Skipped,
    /// Conflicted; nothing written.
    Failed,
}

impl Action {
    /// Chooses the action for a probe result under the given direction.
    #[must_use]
    pub fn decide(direction: Direction, probed: &ProbeResult) -> Self {
        match (direction, probed) {
            (_, ProbeResult::Conflicted { .. }) => Self::Failed,
            (Direction::Forward, ProbeResult::Unapplied) => Self::Applied,
            (Direction::Reverse, ProbeResult::Applied) => Self::Reversed,
            (Direction::Forward, ProbeResult::Applied)
            | (Direction::Reverse, ProbeResult::Unapplied) => Self::Skipped,
        }
    }

    /// Returns `true` if the action changes the target file.
    #[must_use]
    pub fn writes(self) -> bool {
        matches!(self, Self::Applied | Self::Reversed)
    }

    /// Label for reports, phrased conditionally for dry runs.
    #[must_use]
    pub fn label(self, dry_run: bool) -> &'static str {
        match (self, dry_run) {
            (Self::Applied, false) => "applied",
            (Self::Applied, true) => "would apply",
            (Self::Reversed, false) => "reversed",
            (Self::Reversed, true) => "would reverse",
            (Self::Skipped, _) => "skipped",
            (Self::Failed, _) => "failed",
        }
    }
}

/// Result for one unit within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutcome {
    /// Position in the unit set.
    pub index: usize,
    /// Unit name.
    pub name: String,
    /// Target file relative to the tree root.
    pub target: PathBuf,
    /// State found before acting.
    pub probed: ProbeResult,
    /// Action taken.
    pub action: Action,
}

/// Whether every unit was visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every unit was processed.
    Completed,
    /// The run was cancelled between units.
    Incomplete,
    /// An environment failure stopped the run; earlier writes are kept.
    Aborted,
}

/// Outcome counts. Reversals count as `applied`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    /// Units changed (or that would be changed).
    pub applied: usize,
    /// Units already in the requested state.
    pub skipped: usize,
    /// Conflicted units.
    pub failed: usize,
}

/// Immutable record of one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Mode the run was started in.
    pub mode: Mode,
    /// Completed or aborted.
    pub status: RunStatus,
    /// Number of units in the set.
    pub planned: usize,
    /// Aggregated counts over `outcomes`.
    pub counts: Counts,
    /// Per-unit outcomes in application order.
    pub outcomes: Vec<UnitOutcome>,
}

impl RunSummary {
    /// Freezes the outcomes of a run into a summary.
    #[must_use]
    pub fn finish(
        mode: Mode,
        status: RunStatus,
        planned: usize,
        outcomes: Vec<UnitOutcome>,
    ) -> Self {
        let mut counts = Counts::default();
        for outcome in &outcomes {
            match outcome.action {
                Action::Applied | Action::Reversed => counts.applied += 1,
                Action::Skipped => counts.skipped += 1,
                Action::Failed => counts.failed += 1,
            }
        }
        Self { mode, status, planned, counts, outcomes }
    }

    /// `true` when the run completed with no failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed && self.counts.failed == 0
    }

    /// `true` when the run was cancelled before visiting every unit.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.status == RunStatus::Incomplete
    }

    /// `true` when an environment failure stopped the run partway.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.status == RunStatus::Aborted
    }

    /// Names of failed units, in order.
    #[must_use]
    pub fn failed_units(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.action == Action::Failed)
            .map(|o| o.name.clone())
            .collect()
    }

    /// The classification of each unit, for comparing runs.
    #[must_use]
    pub fn actions(&self) -> Vec<(String, Action)> {
        self.outcomes.iter().map(|o| (o.name.clone(), o.action)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ConflictReason;

    fn outcome(name: &str, action: Action) -> UnitOutcome {
        UnitOutcome {
            index: 0,
            name: name.to_string(),
            target: PathBuf::from("f.cpp"),
            probed: ProbeResult::Unapplied,
            action,
        }
    }

    #[test]
    fn decide_covers_both_directions() {
        let conflicted = ProbeResult::Conflicted { reason: ConflictReason::Diverged };
        assert_eq!(Action::decide(Direction::Forward, &ProbeResult::Unapplied), Action::Applied);
        assert_eq!(Action::decide(Direction::Forward, &ProbeResult::Applied), Action::Skipped);
        assert_eq!(Action::decide(Direction::Reverse, &ProbeResult::Applied), Action::Reversed);
        assert_eq!(Action::decide(Direction::Reverse, &ProbeResult::Unapplied), Action::Skipped);
        assert_eq!(Action::decide(Direction::Forward, &conflicted), Action::Failed);
        assert_eq!(Action::decide(Direction::Reverse, &conflicted), Action::Failed);
    }

    #[test]
    fn counts_reversals_as_applied() {
        let summary = RunSummary::finish(
            Mode::Reverse,
            RunStatus::Completed,
            3,
            vec![
                outcome("a", Action::Reversed),
                outcome("b", Action::Skipped),
                outcome("c", Action::Failed),
            ],
        );
        assert_eq!(summary.counts, Counts { applied: 1, skipped: 1, failed: 1 });
        assert_eq!(summary.failed_units(), vec!["c"]);
        assert!(!summary.is_success());
    }

    #[test]
    fn incomplete_run_is_not_success_even_without_failures() {
        let summary = RunSummary::finish(
            Mode::Apply,
            RunStatus::Incomplete,
            3,
            vec![outcome("a", Action::Applied)],
        );
        assert!(!summary.is_success());
        assert!(summary.is_incomplete());
    }

    #[test]
    fn aborted_run_is_neither_success_nor_incomplete() {
        let summary = RunSummary::finish(
            Mode::Apply,
            RunStatus::Aborted,
            3,
            vec![outcome("a", Action::Applied)],
        );
        assert!(!summary.is_success());
        assert!(summary.is_aborted());
        assert!(!summary.is_incomplete());
    }

    #[test]
    fn mode_reports_direction() {
        assert_eq!(Mode::DryRun(Direction::Reverse).direction(), Direction::Reverse);
        assert!(!Mode::Apply.is_dry_run());
        assert_eq!(Mode::DryRun(Direction::Forward).to_string(), "dry-run");
    }
}
