//! Tree prober: classifies a unit against the current tree without writing.

pub mod matcher;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::FileSystem;
use crate::unit::ModificationUnit;

pub use matcher::{simulate, Direction, Mismatch};

/// Why a unit is neither cleanly applicable nor cleanly reversible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictReason {
    /// The target file does not exist.
    MissingFile,
    /// The anchor text is not in the target file.
    AnchorMissing,
    /// The anchor text occurs more than once.
    AnchorAmbiguous {
        /// Number of occurrences.
        count: usize,
    },
    /// A hunk's expected text matches in more than one place.
    HunkAmbiguous {
        /// 0-based hunk index.
        hunk: usize,
        /// Number of places it matched.
        count: usize,
    },
    /// The file contains neither the original nor the modified text.
    Diverged,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile => write!(f, "target file missing"),
            Self::AnchorMissing => write!(f, "anchor missing"),
            Self::AnchorAmbiguous { count } => write!(f, "anchor found {count} times"),
            Self::HunkAmbiguous { hunk, count } => {
                write!(f, "hunk {} matches {count} places", hunk + 1)
            }
            Self::Diverged => write!(f, "content diverged"),
        }
    }
}

/// Current state of one unit against one tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeResult {
    /// The diff applies cleanly forward.
    Unapplied,
    /// The diff applies cleanly in reverse; its effect is already present.
    Applied,
    /// Neither direction applies.
    Conflicted {
        /// What went wrong.
        reason: ConflictReason,
    },
}

impl ProbeResult {
    /// Returns `true` for the conflicted state.
    #[must_use]
    pub fn is_conflicted(&self) -> bool {
        matches!(self, Self::Conflicted { .. })
    }

    fn conflicted(reason: ConflictReason) -> Self {
        Self::Conflicted { reason }
    }
}

impl fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unapplied => write!(f, "unapplied"),
            Self::Applied => write!(f, "applied"),
            Self::Conflicted { reason } => write!(f, "conflicted ({reason})"),
        }
    }
}

/// A probe result plus the buffer that acting on it would produce.
#[derive(Debug, Clone)]
pub struct Inspection {
    /// The classification.
    pub result: ProbeResult,
    /// For `Unapplied`, the forward-applied content; for `Applied`, the
    /// reversed content; `None` when conflicted.
    pub patched: Option<String>,
}

/// Classifies `unit` against `content`, where `None` means the file is absent.
///
/// Forward is tried first, then reverse. This is the single decision
/// procedure used by both [`probe`] and the engine.
#[must_use]
pub fn inspect(content: Option<&str>, unit: &ModificationUnit) -> Inspection {
    let Some(content) = content else {
        return Inspection {
            result: ProbeResult::conflicted(ConflictReason::MissingFile),
            patched: None,
        };
    };

    let forward = match simulate(content, unit, Direction::Forward) {
        Ok(patched) => {
            return Inspection { result: ProbeResult::Unapplied, patched: Some(patched) };
        }
        Err(mismatch) => mismatch,
    };

    // Anchor failures are direction independent.
    match forward {
        Mismatch::AnchorMissing => {
            return Inspection {
                result: ProbeResult::conflicted(ConflictReason::AnchorMissing),
                patched: None,
            };
        }
        Mismatch::AnchorAmbiguous(count) => {
            return Inspection {
                result: ProbeResult::conflicted(ConflictReason::AnchorAmbiguous { count }),
                patched: None,
            };
        }
        _ => {}
    }

    match simulate(content, unit, Direction::Reverse) {
        Ok(patched) => Inspection { result: ProbeResult::Applied, patched: Some(patched) },
        Err(reverse) => {
            let reason = match (forward, reverse) {
                (Mismatch::HunkAmbiguous { hunk, count }, _)
                | (_, Mismatch::HunkAmbiguous { hunk, count }) => {
                    ConflictReason::HunkAmbiguous { hunk, count }
                }
                _ => ConflictReason::Diverged,
            };
            Inspection { result: ProbeResult::conflicted(reason), patched: None }
        }
    }
}

/// Reads a unit's target file, returning `None` when it does not exist.
///
/// # Errors
///
/// Returns [`Error::Environment`] if the file exists but cannot be read.
pub fn read_target(fs: &dyn FileSystem, path: &Path) -> Result<Option<String>> {
    if !fs.exists(path) {
        return Ok(None);
    }
    fs.read_to_string(path)
        .map(Some)
        .map_err(|e| Error::environment(format!("reading {}", path.display()), e))
}

/// Determines `unit`'s state in the tree at `tree_root`. Never writes.
///
/// # Errors
///
/// Returns [`Error::Environment`] if the target exists but cannot be read.
pub fn probe(
    fs: &dyn FileSystem,
    tree_root: &Path,
    unit: &ModificationUnit,
) -> Result<ProbeResult> {
    let path = tree_root.join(unit.target());
    let content = read_target(fs, &path)?;
    let result = inspect(content.as_deref(), unit).result;
    tracing::debug!(unit = unit.name(), %result, "probed");
    Ok(result)
}
