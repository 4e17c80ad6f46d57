//! `drift init <root> --remote <dir> [--jobs N]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use drift_core::context;

/// Bind a local root directory to a remote store.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Local root directory; must already exist.
    pub root: PathBuf,

    /// Directory of the remote store (`index.json` + `blobs/`).
    #[arg(long, short = 'r')]
    pub remote: PathBuf,

    /// Number of changes applied concurrently.
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let root = self
            .root
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.root.display()))?;

        let ctx = context::init_at(&root, self.remote, self.jobs)
            .with_context(|| format!("failed to init '{}'", root.display()))?;

        println!("✓ Initialized drift context at '{}'", ctx.root().display());
        println!("  Remote: {}", ctx.config().remote.display());
        println!("  Window: {}", ctx.config().concurrency);
        Ok(())
    }
}
