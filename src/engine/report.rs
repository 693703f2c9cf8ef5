//! Human-readable run reports.

use super::summary::{Mode, RunStatus, RunSummary, UnitOutcome};

/// Formats one unit's line: index, name, probed state, action.
#[must_use]
pub fn format_outcome(outcome: &UnitOutcome, mode: Mode) -> String {
    format!(
        "[{}] {}: {} -> {}",
        outcome.index + 1,
        outcome.name,
        outcome.probed,
        outcome.action.label(mode.is_dry_run())
    )
}

/// Formats the whole run: one line per unit, then the totals.
#[must_use]
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines: Vec<String> =
        summary.outcomes.iter().map(|o| format_outcome(o, summary.mode)).collect();

    let counts = summary.counts;
    let mut totals = format!(
        "{}: applied={} skipped={} failed={}",
        summary.mode, counts.applied, counts.skipped, counts.failed
    );
    let stopped = match summary.status {
        RunStatus::Completed => None,
        RunStatus::Incomplete => Some("INCOMPLETE"),
        RunStatus::Aborted => Some("ABORTED"),
    };
    if let Some(label) = stopped {
        totals.push_str(&format!(
            " {label} ({} of {} units processed)",
            summary.outcomes.len(),
            summary.planned
        ));
    }
    lines.push(totals);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::summary::Action;
    use crate::probe::{ConflictReason, Direction, ProbeResult};
    use std::path::PathBuf;

    fn outcome(index: usize, name: &str, probed: ProbeResult, action: Action) -> UnitOutcome {
        UnitOutcome { index, name: name.into(), target: PathBuf::from("f.cpp"), probed, action }
    }

    #[test]
    fn formats_each_unit_and_totals() {
        let summary = RunSummary::finish(
            Mode::Apply,
            RunStatus::Completed,
            2,
            vec![
                outcome(0, "include-hw", ProbeResult::Unapplied, Action::Applied),
                outcome(
                    1,
                    "register-hw",
                    ProbeResult::Conflicted { reason: ConflictReason::AnchorMissing },
                    Action::Failed,
                ),
            ],
        );
        let text = format_summary(&summary);
        assert!(text.contains("[1] include-hw: unapplied -> applied"));
        assert!(text.contains("[2] register-hw: conflicted (anchor missing) -> failed"));
        assert!(text.ends_with("apply: applied=1 skipped=0 failed=1"));
    }

    #[test]
    fn dry_run_uses_conditional_labels() {
        let line = format_outcome(
            &outcome(0, "u", ProbeResult::Unapplied, Action::Applied),
            Mode::DryRun(Direction::Forward),
        );
        assert_eq!(line, "[1] u: unapplied -> would apply");
    }

    #[test]
    fn incomplete_runs_are_marked() {
        let summary = RunSummary::finish(
            Mode::Apply,
            RunStatus::Incomplete,
            3,
            vec![outcome(0, "u", ProbeResult::Applied, Action::Skipped)],
        );
        assert!(format_summary(&summary).contains("INCOMPLETE (1 of 3 units processed)"));
    }

    #[test]
    fn aborted_runs_are_marked() {
        let summary = RunSummary::finish(
            Mode::Apply,
            RunStatus::Aborted,
            3,
            vec![outcome(0, "u", ProbeResult::Unapplied, Action::Applied)],
        );
        let text = format_summary(&summary);
        assert!(text.contains("[1] u: unapplied -> applied"));
        assert!(text.ends_with("ABORTED (1 of 3 units processed)"));
    }
}
