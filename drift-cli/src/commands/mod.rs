pub mod init;
pub mod pull;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use drift_core::{context, PathContext};

/// Locate the context governing the working directory.
pub(crate) fn current_context() -> Result<PathContext> {
    let cwd: PathBuf = std::env::current_dir().context("could not determine working directory")?;
    context::discover(&cwd).context("no drift context found")
}

/// The remote location, resolved against the context root when relative.
pub(crate) fn remote_root(ctx: &PathContext) -> PathBuf {
    let remote = &ctx.config().remote;
    if remote.is_absolute() {
        remote.clone()
    } else {
        ctx.root().join(remote)
    }
}
