//! Service context bundling all port trait objects.

use crate::adapters::live::filesystem::LiveFileSystem;
use crate::adapters::live::notifier::{LogNotifier, WebhookNotifier};
use crate::adapters::live::stamps::{SystemClock, UuidRunIds};
use crate::adapters::live::upstream::GitUpstream;
use crate::config::Settings;
use crate::ports::{Clock, FileSystem, IdGenerator, Notifier, UpstreamSource};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Tests build the
/// struct directly with in-memory fakes.
pub struct ServiceContext {
    /// Clock for timestamping checks.
    pub clock: Box<dyn Clock>,
    /// Filesystem for the tree, the unit set, and the ledger.
    pub fs: Box<dyn FileSystem>,
    /// Source of disposable upstream snapshots.
    pub upstream: Box<dyn UpstreamSource>,
    /// Receiver of compatibility events.
    pub notifier: Box<dyn Notifier>,
    /// ID generator for check run ids.
    pub id_gen: Box<dyn IdGenerator>,
}

impl ServiceContext {
    /// Creates a context with real adapters.
    ///
    /// Compatibility events go to the configured webhook, or only to the log
    /// when none is set.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        let notifier: Box<dyn Notifier> = match &settings.notify_webhook {
            Some(url) => Box::new(WebhookNotifier::new(url.clone())),
            None => Box::new(LogNotifier),
        };
        Self {
            clock: Box::new(SystemClock),
            fs: Box::new(LiveFileSystem),
            upstream: Box::new(GitUpstream),
            notifier,
            id_gen: Box::new(UuidRunIds),
        }
    }
}
