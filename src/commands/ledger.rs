//! `chainpatch ledger` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::ledger::{LedgerEntry, Verdict, VersionLedger};

/// Execute the `ledger` command.
///
/// Prints the latest entry for `revision`, or every entry with `history`.
///
/// # Errors
///
/// Returns an error string if the ledger cannot be read, the revision has
/// never been checked, or its latest verdict is not Clean.
pub fn run(
    ctx: &ServiceContext,
    settings: &Settings,
    revision: &str,
    history: bool,
) -> Result<(), String> {
    let ledger = VersionLedger::new(ctx.fs.as_ref(), &settings.ledger_path);
    let entries = ledger.history(revision).map_err(|e| e.to_string())?;

    let Some(latest) = entries.last() else {
        return Err(format!("No ledger entries for {revision}."));
    };

    if history {
        for entry in &entries {
            println!("{}", format_entry(entry));
        }
    } else {
        println!("{}", format_entry(latest));
    }

    match latest.verdict {
        Verdict::Clean => Ok(()),
        Verdict::Conflict => Err(format!("{revision} is not known good")),
    }
}

/// One-line rendering of an entry.
#[must_use]
pub fn format_entry(entry: &LedgerEntry) -> String {
    let mut line = format!(
        "{}  {} ({})  {}  run {}",
        entry.timestamp.to_rfc3339(),
        entry.revision,
        entry.upstream_ref,
        entry.verdict,
        entry.run_id
    );
    if !entry.failed_units.is_empty() {
        line.push_str(&format!("  failed: {}", entry.failed_units.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Mode, RunStatus, RunSummary};
    use crate::probe::Direction;
    use crate::testing::{mem_context, MemFs};
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn entry(revision: &str, verdict: Verdict, failed: &[&str]) -> LedgerEntry {
        LedgerEntry {
            run_id: "run-1".into(),
            revision: revision.into(),
            upstream_ref: "main".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            verdict,
            failed_units: failed.iter().map(|s| (*s).to_string()).collect(),
            summary: RunSummary::finish(
                Mode::DryRun(Direction::Forward),
                RunStatus::Completed,
                0,
                Vec::new(),
            ),
        }
    }

    fn settings() -> Settings {
        Settings { ledger_path: PathBuf::from("/state/ledger.jsonl"), ..Settings::default() }
    }

    #[test]
    fn unknown_revision_fails() {
        let fs = MemFs::new();
        let err = run(&mem_context(&fs), &settings(), "abc", false).unwrap_err();
        assert!(err.contains("No ledger entries"));
    }

    #[test]
    fn exit_follows_latest_verdict() {
        let fs = MemFs::new();
        let ctx = mem_context(&fs);
        let ledger = VersionLedger::new(ctx.fs.as_ref(), &settings().ledger_path);

        ledger.record(&entry("abc", Verdict::Conflict, &["register-hw"])).unwrap();
        assert!(run(&ctx, &settings(), "abc", true).is_err());

        ledger.record(&entry("abc", Verdict::Clean, &[])).unwrap();
        assert!(run(&ctx, &settings(), "abc", false).is_ok());
    }

    #[test]
    fn format_lists_failed_units() {
        let line = format_entry(&entry("abc", Verdict::Conflict, &["a", "b"]));
        assert_eq!(line, "2026-03-01T12:00:00+00:00  abc (main)  conflict  run run-1  failed: a, b");
    }
}
