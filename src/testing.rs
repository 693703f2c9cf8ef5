//! In-memory port fakes shared by unit tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::context::ServiceContext;
use crate::ports::{
    Clock, CompatibilityEvent, FetchFuture, FileSystem, IdGenerator, Notifier, NotifyFuture,
    PortError, UpstreamSource,
};

/// In-memory filesystem. Clones share the same files.
#[derive(Clone, Default)]
pub struct MemFs {
    files: Arc<Mutex<BTreeMap<PathBuf, String>>>,
    write_limit: Arc<Mutex<Option<usize>>>,
    writes: Arc<AtomicUsize>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl AsRef<Path>, contents: &str) {
        self.files.lock().unwrap().insert(path.as_ref().to_path_buf(), contents.to_string());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().remove(path.as_ref());
    }

    /// Snapshot of every file, for byte-for-byte comparisons.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        self.files.lock().unwrap().clone()
    }

    pub fn fail_writes(&self) {
        self.fail_writes_after(0);
    }

    /// Lets `count` more writes succeed, then fails every later one.
    pub fn fail_writes_after(&self, count: usize) {
        *self.write_limit.lock().unwrap() = Some(self.write_count() + count);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl FileSystem for MemFs {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        self.get(path).ok_or_else(|| format!("File not found: {}", path.display()).into())
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        if self.write_limit.lock().unwrap().is_some_and(|limit| self.write_count() >= limit) {
            return Err("simulated write failure".into());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.put(path, contents);
        Ok(())
    }

    fn append(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        let mut files = self.files.lock().unwrap();
        files.entry(path.to_path_buf()).or_default().push_str(contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.get(path).is_some() || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.keys().any(|k| k.starts_with(path) && k != path)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, PortError> {
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|k| {
                let rest = k.strip_prefix(path).ok()?;
                rest.components().next().map(|c| c.as_os_str().to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(year: i32, month: u32, day: u32) -> Self {
        Self(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces `run-1`, `run-2`, ...
#[derive(Default)]
pub struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn generate_id(&self) -> String {
        format!("run-{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// What the fake upstream does when asked for a ref.
#[derive(Clone)]
pub enum FakeFetch {
    /// Copy these files (relative path, contents) into the destination.
    Tree { revision: String, files: Vec<(String, String)> },
    /// Fail immediately.
    Fail(String),
    /// Never finish within any reasonable timeout.
    Hang,
}

/// Upstream source that materializes canned trees into a [`MemFs`].
pub struct FakeUpstream {
    pub fs: MemFs,
    pub behavior: FakeFetch,
}

impl UpstreamSource for FakeUpstream {
    fn fetch<'a>(&'a self, _url: &'a str, _reference: &'a str, dest: &'a Path) -> FetchFuture<'a> {
        Box::pin(async move {
            match &self.behavior {
                FakeFetch::Tree { revision, files } => {
                    for (rel, contents) in files {
                        self.fs.put(dest.join(rel), contents);
                    }
                    Ok(revision.clone())
                }
                FakeFetch::Fail(message) => Err(message.clone().into()),
                FakeFetch::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err("unreachable".into())
                }
            }
        })
    }
}

/// Notifier that keeps every event it was handed.
#[derive(Clone, Default)]
pub struct CapturingNotifier {
    pub events: Arc<Mutex<Vec<CompatibilityEvent>>>,
    pub fail: bool,
}

impl Notifier for CapturingNotifier {
    fn notify<'a>(&'a self, event: &'a CompatibilityEvent) -> NotifyFuture<'a> {
        Box::pin(async move {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                return Err("tracker unavailable".into());
            }
            Ok(())
        })
    }
}

/// Context over a [`MemFs`] with an upstream that fails if used.
pub fn mem_context(fs: &MemFs) -> ServiceContext {
    ServiceContext {
        clock: Box::new(FixedClock::at(2026, 3, 1)),
        fs: Box::new(fs.clone()),
        upstream: Box::new(FakeUpstream {
            fs: fs.clone(),
            behavior: FakeFetch::Fail("no upstream in this test".into()),
        }),
        notifier: Box::new(CapturingNotifier::default()),
        id_gen: Box::new(SequentialIds::default()),
    }
}
