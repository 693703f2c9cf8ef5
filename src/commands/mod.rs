//! Command dispatch and handlers.

pub mod apply;
pub mod check;
pub mod ledger;
pub mod units;

use tokio_util::sync::CancellationToken;

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::cli::{Cli, Command, GlobalArgs};
use crate::config::Settings;
use crate::context::ServiceContext;

/// Dispatch a parsed command line to its handler.
///
/// Settings are resolved from defaults, the config file, and the environment,
/// then overridden by command-line flags.
///
/// # Errors
///
/// Returns an error string if settings cannot be loaded or the selected
/// command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    let settings = resolve_settings(&LiveFileSystem, cli)?;
    let ctx = ServiceContext::live(&settings);

    // Ctrl-C only cancels apply runs; other commands keep the default handler.
    let cancel = if matches!(cli.command, Command::Apply { .. }) {
        apply::cancel_on_interrupt()
    } else {
        CancellationToken::new()
    };
    dispatch_with_context(&cli.command, &ctx, &settings, cancel)
}

/// Dispatch a command with the given service context and settings.
///
/// `cancel` stops an apply run between units.
///
/// # Errors
///
/// Returns an error string if the command handler fails.
pub fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: &Settings,
    cancel: CancellationToken,
) -> Result<(), String> {
    match command {
        Command::Apply { tree_root, dry_run, reverse } => {
            apply::run(ctx, settings, tree_root, *dry_run, *reverse, cancel)
        }
        Command::Check { upstream_ref, .. } => check::run(ctx, settings, upstream_ref),
        Command::Ledger { revision, history } => ledger::run(ctx, settings, revision, *history),
        Command::Units => units::run(ctx, settings),
    }
}

fn resolve_settings(fs: &LiveFileSystem, cli: &Cli) -> Result<Settings, String> {
    let mut settings = Settings::load(fs).map_err(|e| e.to_string())?;
    apply_overrides(&mut settings, &cli.global, &cli.command);
    Ok(settings)
}

/// Applies command-line flags on top of loaded settings.
pub fn apply_overrides(settings: &mut Settings, global: &GlobalArgs, command: &Command) {
    if let Some(units) = &global.units {
        settings.units_dir.clone_from(units);
    }
    if let Some(ledger) = &global.ledger {
        settings.ledger_path.clone_from(ledger);
    }
    if let Command::Check { url, timeout, .. } = command {
        if let Some(url) = url {
            settings.upstream_url.clone_from(url);
        }
        if let Some(secs) = timeout {
            settings.fetch_timeout_secs = *secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{mem_context, MemFs};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "chainpatch",
            "--units",
            "/u",
            "check",
            "main",
            "--url",
            "file:///mirror.git",
            "--timeout",
            "9",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &cli.global, &cli.command);

        assert_eq!(settings.units_dir, PathBuf::from("/u"));
        assert_eq!(settings.upstream_url, "file:///mirror.git");
        assert_eq!(settings.fetch_timeout_secs, 9);
        assert_eq!(settings.ledger_path, Settings::default().ledger_path);
    }

    #[test]
    fn dispatches_units_against_context() {
        let fs = MemFs::new();
        fs.put(
            "/u/0001.patch",
            "\
--- a/src/lib.cpp
+++ b/src/lib.cpp
@@ -1,2 +1,3 @@
 int main() {
+  init();
 }
",
        );
        let settings = Settings { units_dir: PathBuf::from("/u"), ..Settings::default() };
        let ctx = mem_context(&fs);
        let cancel = CancellationToken::new();
        assert!(dispatch_with_context(&Command::Units, &ctx, &settings, cancel).is_ok());
    }
}
