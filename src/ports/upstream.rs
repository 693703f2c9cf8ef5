//! Upstream source port for fetching disposable snapshots.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::filesystem::PortError;

/// Boxed future type alias used by [`UpstreamSource`] to keep the trait dyn-compatible.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, PortError>> + Send + 'a>>;

/// Materializes the upstream tree at a given ref.
///
/// Fetching is the only operation in a check that can block for an unbounded
/// time; callers wrap the returned future in a timeout. Dropping the future
/// must stop any work it started.
pub trait UpstreamSource: Send + Sync {
    /// Checks out `reference` from `url` into the empty directory `dest` and
    /// returns the resolved revision identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref cannot be fetched or checked out.
    fn fetch<'a>(&'a self, url: &'a str, reference: &'a str, dest: &'a Path) -> FetchFuture<'a>;
}
