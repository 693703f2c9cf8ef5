//! Version ledger: append-only record of upstream compatibility checks.
//!
//! Entries are stored one JSON object per line, oldest first:
//!
//! ```text
//! {"run_id":"…","revision":"3f2c…","upstream_ref":"main","timestamp":"…","verdict":"clean",…}
//! ```
//!
//! A revision may appear many times; the last entry for it is authoritative.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::RunSummary;
use crate::error::{Error, Result};
use crate::ports::FileSystem;

/// Overall classification of a checked revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every unit would apply or is already applied.
    Clean,
    /// At least one unit conflicted.
    Conflict,
}

impl Verdict {
    /// Classifies a completed run.
    #[must_use]
    pub fn of(summary: &RunSummary) -> Self {
        if summary.is_success() {
            Self::Clean
        } else {
            Self::Conflict
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Conflict => write!(f, "conflict"),
        }
    }
}

/// One recorded check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Distinguishes repeated checks of the same revision.
    pub run_id: String,
    /// Resolved upstream revision identifier.
    pub revision: String,
    /// The ref that was requested (branch, tag, or revision).
    pub upstream_ref: String,
    /// When the check finished.
    pub timestamp: DateTime<Utc>,
    /// Overall classification.
    pub verdict: Verdict,
    /// Names of conflicted units, in application order.
    pub failed_units: Vec<String>,
    /// The dry run the verdict was derived from.
    pub summary: RunSummary,
}

/// Append-only ledger file accessed through the filesystem port.
pub struct VersionLedger<'a> {
    fs: &'a dyn FileSystem,
    path: PathBuf,
}

impl<'a> VersionLedger<'a> {
    /// Opens the ledger at `path`. The file is created on first [`record`](Self::record).
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, path: &Path) -> Self {
        Self { fs, path: path.to_path_buf() }
    }

    /// Location of the ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if the ledger file cannot be written.
    pub fn record(&self, entry: &LedgerEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| Error::environment("serializing ledger entry", Box::new(e)))?;
        line.push('\n');
        self.fs
            .append(&self.path, &line)
            .map_err(|e| Error::environment(format!("appending to {}", self.path.display()), e))?;
        tracing::info!(
            revision = %entry.revision,
            verdict = %entry.verdict,
            run_id = %entry.run_id,
            "ledger entry recorded"
        );
        Ok(())
    }

    /// Every entry, oldest first. A missing ledger file has no entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Environment`] if the file cannot be read, or
    /// [`Error::Configuration`] naming the first line that does not parse.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !self.fs.exists(&self.path) {
            return Ok(Vec::new());
        }
        let contents = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| Error::environment(format!("reading {}", self.path.display()), e))?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).map_err(|e| {
                    Error::config(format!("{} line {}: {e}", self.path.display(), i + 1))
                })
            })
            .collect()
    }

    /// All entries for `revision`, oldest first.
    ///
    /// Entries match on either the resolved revision or the requested ref.
    ///
    /// # Errors
    ///
    /// See [`entries`](Self::entries).
    pub fn history(&self, revision: &str) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries()?.into_iter().filter(|e| matches_revision(e, revision)).collect())
    }

    /// The most recent entry for `revision`, if any.
    ///
    /// # Errors
    ///
    /// See [`entries`](Self::entries).
    pub fn latest(&self, revision: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.history(revision)?.pop())
    }

    /// `true` iff the most recent entry for `revision` is Clean.
    ///
    /// # Errors
    ///
    /// See [`entries`](Self::entries).
    pub fn is_known_good(&self, revision: &str) -> Result<bool> {
        Ok(self.latest(revision)?.is_some_and(|e| e.verdict == Verdict::Clean))
    }
}

fn matches_revision(entry: &LedgerEntry, revision: &str) -> bool {
    entry.revision == revision || entry.upstream_ref == revision
}
