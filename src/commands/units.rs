//! `chainpatch units` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::unit::{load_units, ModificationUnit};

/// Execute the `units` command.
///
/// Lists every unit in application order with its target and anchor.
///
/// # Errors
///
/// Returns an error string if the unit set cannot be loaded.
pub fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let units = load_units(ctx.fs.as_ref(), &settings.units_dir).map_err(|e| e.to_string())?;
    println!("{}", format_units(&units));
    Ok(())
}

/// Renders the unit set as a table.
#[must_use]
pub fn format_units(units: &[ModificationUnit]) -> String {
    let rows: Vec<(String, String, String)> = units
        .iter()
        .map(|u| {
            (
                format!("{}", u.index() + 1),
                u.name().to_string(),
                u.target().display().to_string(),
            )
        })
        .collect();

    let idx_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(1).max(1);
    let name_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(4).max(4);

    let mut lines = vec![format!("{:<idx_width$}  {:<name_width$}  TARGET", "#", "NAME")];
    for (unit, (idx, name, target)) in units.iter().zip(&rows) {
        lines.push(format!("{idx:<idx_width$}  {name:<name_width$}  {target}"));
        if let Some(description) = unit.description() {
            lines.push(format!("{:idx_width$}  {description}", ""));
        }
        lines.push(format!("{:idx_width$}  anchor: {}", "", unit.anchor()));
    }
    lines.push(format!("\n{} unit(s).", units.len()));
    lines.join("\n")
}
