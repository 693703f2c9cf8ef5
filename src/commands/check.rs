//! `chainpatch check` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::drift::{format_check_report, DriftMonitor, UpstreamTarget};
use crate::ledger::{Verdict, VersionLedger};
use crate::unit::load_units;

/// Execute the `check` command.
///
/// Fetches `upstream_ref`, dry-runs the unit set against it, and records the
/// verdict in the ledger.
///
/// # Errors
///
/// Returns an error string if the check cannot be completed or the verdict
/// is Conflict.
pub fn run(ctx: &ServiceContext, settings: &Settings, upstream_ref: &str) -> Result<(), String> {
    let units = load_units(ctx.fs.as_ref(), &settings.units_dir).map_err(|e| e.to_string())?;
    let ledger = VersionLedger::new(ctx.fs.as_ref(), &settings.ledger_path);
    let target = UpstreamTarget {
        url: settings.upstream_url.clone(),
        marker_dir: settings.marker_dir.clone(),
        timeout: settings.fetch_timeout(),
    };
    let monitor = DriftMonitor::new(ctx, &units, &ledger, target);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {e}"))?;
    let outcome = rt.block_on(monitor.check(upstream_ref)).map_err(|e| {
        if e.is_transient() {
            format!("{e}\nverdict for {upstream_ref} unknown; nothing recorded")
        } else {
            e.to_string()
        }
    })?;

    println!("{}", format_check_report(&outcome));
    match outcome.entry.verdict {
        Verdict::Clean => Ok(()),
        Verdict::Conflict => Err(format!(
            "upstream {} no longer accepts {} unit(s)",
            outcome.entry.revision,
            outcome.entry.failed_units.len()
        )),
    }
}
