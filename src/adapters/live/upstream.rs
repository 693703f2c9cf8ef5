//! Live upstream adapter using the `git` CLI.

use std::path::Path;

use tokio::process::Command;

use crate::ports::filesystem::PortError;
use crate::ports::upstream::{FetchFuture, UpstreamSource};

/// Live upstream source that shells out to `git`.
///
/// Only the requested ref is fetched, at depth 1.
pub struct GitUpstream;

async fn git(dir: &Path, args: &[&str]) -> Result<String, PortError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("failed to spawn git: {e}"))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args.join(" "), stderr.trim()).into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

impl UpstreamSource for GitUpstream {
    fn fetch<'a>(&'a self, url: &'a str, reference: &'a str, dest: &'a Path) -> FetchFuture<'a> {
        Box::pin(async move {
            tracing::debug!(url, reference, dest = %dest.display(), "fetching upstream snapshot");
            git(dest, &["init", "--quiet"]).await?;
            git(dest, &["fetch", "--quiet", "--depth", "1", url, reference]).await?;
            git(dest, &["checkout", "--quiet", "--detach", "FETCH_HEAD"]).await?;
            git(dest, &["rev-parse", "HEAD"]).await
        })
    }
}
