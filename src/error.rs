//! Error taxonomy for runs and checks.
//!
//! Per-unit conflicts are not errors: they are probe states reported in the
//! run summary. Everything here aborts the current run or check.

use std::time::Duration;

use thiserror::Error;

use crate::engine::RunSummary;

/// Fatal failures of a run or a drift check.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed unit definition, invalid tree root, bad settings or arguments.
    /// Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Filesystem failure while reading or writing the tree or the ledger.
    #[error("environment error: {context}: {source}")]
    Environment {
        /// What was being attempted.
        context: String,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The upstream snapshot could not be fetched.
    #[error("failed to fetch upstream ref {reference}: {message}")]
    Fetch {
        /// The ref that was requested.
        reference: String,
        /// Fetcher output describing the failure.
        message: String,
    },

    /// A run stopped partway on an environment failure.
    ///
    /// `summary` lists the units handled before the failure; their writes are
    /// kept on disk.
    #[error("{source}")]
    Aborted {
        /// Outcomes up to the failing unit.
        summary: Box<RunSummary>,
        /// The failure that stopped the run.
        source: Box<Error>,
    },

    /// The upstream fetch exceeded the caller-supplied limit.
    #[error("fetching upstream ref {reference} timed out after {}s", limit.as_secs())]
    Timeout {
        /// The ref that was requested.
        reference: String,
        /// The limit that was exceeded.
        limit: Duration,
    },
}

impl Error {
    /// Builds a configuration error from anything printable.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wraps a port failure as an environment error.
    pub fn environment(
        context: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Environment { context: context.into(), source }
    }

    /// Attaches the partial summary of a run to the failure that stopped it.
    #[must_use]
    pub fn aborted(summary: RunSummary, source: Error) -> Self {
        Self::Aborted { summary: Box::new(summary), source: Box::new(source) }
    }

    /// Returns `true` for failures that may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration(_) => false,
            Self::Aborted { source, .. } => source.is_transient(),
            Self::Environment { .. } | Self::Fetch { .. } | Self::Timeout { .. } => true,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Mode, RunStatus};

    #[test]
    fn configuration_is_not_transient() {
        assert!(!Error::config("bad unit").is_transient());
    }

    #[test]
    fn timeout_message_names_ref_and_limit() {
        let err = Error::Timeout { reference: "main".into(), limit: Duration::from_secs(30) };
        let text = err.to_string();
        assert!(text.contains("main"));
        assert!(text.contains("30s"));
        assert!(err.is_transient());
    }

    #[test]
    fn aborted_run_reads_as_its_cause() {
        let summary = RunSummary::finish(Mode::Apply, RunStatus::Aborted, 2, Vec::new());
        let err = Error::aborted(summary, Error::environment("writing a.cpp", "disk full".into()));
        assert_eq!(err.to_string(), "environment error: writing a.cpp: disk full");
        assert!(err.is_transient());
    }

    #[test]
    fn environment_message_includes_source() {
        let err = Error::environment("writing src/a.cpp", "disk full".into());
        assert_eq!(err.to_string(), "environment error: writing src/a.cpp: disk full");
    }
}
