//! `chainpatch apply` command.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::engine::{format_summary, Engine, Mode};
use crate::error::Error;
use crate::probe::Direction;
use crate::tree::TreeRoot;
use crate::unit::load_units;

/// Execute the `apply` command.
///
/// Prints one line per unit and a totals line. A run with conflicts, one
/// that was interrupted, or one stopped by an I/O failure still prints its
/// report before failing.
///
/// # Errors
///
/// Returns an error string on configuration or I/O failure, or when the run
/// had failed units or did not complete.
pub fn run(
    ctx: &ServiceContext,
    settings: &Settings,
    tree_root: &Path,
    dry_run: bool,
    reverse: bool,
    cancel: CancellationToken,
) -> Result<(), String> {
    let mode = mode_for(dry_run, reverse);
    let fs = ctx.fs.as_ref();

    let units = load_units(fs, &settings.units_dir).map_err(|e| e.to_string())?;
    let root = TreeRoot::open(fs, tree_root, &settings.marker_dir).map_err(|e| e.to_string())?;
    let summary = match Engine::new(fs).with_cancel(cancel).run(&root, &units, mode) {
        Ok(summary) => summary,
        Err(Error::Aborted { summary, source }) => {
            // Units before the failure were written; show them.
            println!("{}", format_summary(&summary));
            return Err(source.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    println!("{}", format_summary(&summary));

    if summary.is_incomplete() {
        return Err("run interrupted before every unit was processed".to_string());
    }
    if !summary.is_success() {
        let failed = summary.failed_units();
        return Err(format!("{} unit(s) failed: {}", failed.len(), failed.join(", ")));
    }
    Ok(())
}

/// Maps the two flags onto a run mode.
#[must_use]
pub fn mode_for(dry_run: bool, reverse: bool) -> Mode {
    match (dry_run, reverse) {
        (false, false) => Mode::Apply,
        (false, true) => Mode::Reverse,
        (true, false) => Mode::DryRun(Direction::Forward),
        (true, true) => Mode::DryRun(Direction::Reverse),
    }
}

/// Returns a token that is cancelled when the process receives Ctrl-C.
///
/// The listener runs on its own thread so the engine stays synchronous.
#[must_use]
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    std::thread::spawn(move || {
        let Ok(rt) = tokio::runtime::Builder::new_current_thread().enable_all().build() else {
            return;
        };
        rt.block_on(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping after the current unit");
                handle.cancel();
            }
        });
    });
    token
}
