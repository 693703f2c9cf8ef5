//! Layered settings: defaults, YAML file, environment, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ports::FileSystem;

/// Settings file read from the working directory when `CHAINPATCH_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "chainpatch.yaml";

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the `.patch` unit files.
    pub units_dir: PathBuf,
    /// JSON Lines ledger file.
    pub ledger_path: PathBuf,
    /// Subdirectory every target tree must contain.
    pub marker_dir: String,
    /// Git URL the drift check fetches from.
    pub upstream_url: String,
    /// Upper bound on a single upstream fetch.
    pub fetch_timeout_secs: u64,
    /// Where compatibility events are POSTed; logged only when unset.
    pub notify_webhook: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            units_dir: PathBuf::from("patches"),
            ledger_path: PathBuf::from(".chainpatch/ledger.jsonl"),
            marker_dir: "webrtc-sys".to_string(),
            upstream_url: "https://github.com/livekit/rust-sdks.git".to_string(),
            fetch_timeout_secs: 300,
            notify_webhook: None,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment and the config file it names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the config file or an environment
    /// override is malformed.
    pub fn load(fs: &dyn FileSystem) -> Result<Self> {
        Self::load_with(fs, |key| std::env::var(key).ok())
    }

    /// Loads settings using `env` to look up variables.
    ///
    /// An explicitly named config file must exist; the default one is optional.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_with(fs: &dyn FileSystem, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match env("CHAINPATCH_CONFIG") {
            Some(path) => Self::from_file(fs, Path::new(&path))?,
            None if fs.exists(Path::new(DEFAULT_CONFIG_FILE)) => {
                Self::from_file(fs, Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        settings.apply_env(env)?;
        Ok(settings)
    }

    fn from_file(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .map_err(|e| Error::config(format!("invalid settings in {}: {e}", path.display())))
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = env("CHAINPATCH_UNITS_DIR") {
            self.units_dir = PathBuf::from(v);
        }
        if let Some(v) = env("CHAINPATCH_LEDGER") {
            self.ledger_path = PathBuf::from(v);
        }
        if let Some(v) = env("CHAINPATCH_MARKER_DIR") {
            self.marker_dir = v;
        }
        if let Some(v) = env("CHAINPATCH_UPSTREAM_URL") {
            self.upstream_url = v;
        }
        if let Some(v) = env("CHAINPATCH_FETCH_TIMEOUT") {
            self.fetch_timeout_secs = v.trim().parse().map_err(|_| {
                Error::config(format!("CHAINPATCH_FETCH_TIMEOUT must be whole seconds, got {v:?}"))
            })?;
        }
        if let Some(v) = env("CHAINPATCH_NOTIFY_WEBHOOK") {
            self.notify_webhook = if v.is_empty() { None } else { Some(v) };
        }
        Ok(())
    }

    /// The fetch timeout as a [`Duration`].
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
