//! Path context: binds a local root directory to a remote store.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   .drift/
//!     context.yaml   (remote location, window size)
//!     plan.json      (default precomputed change list)
//! ```
//!
//! # API pattern
//!
//! Functions take the root explicitly (`load_at`, `init_at`) so tests can
//! point them at a `TempDir`; [`discover`] walks up from a working directory.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContextError;

pub const CONTEXT_DIR: &str = ".drift";
pub const CONTEXT_FILE: &str = "context.yaml";
pub const PLAN_FILE: &str = "plan.json";
pub const CONTEXT_VERSION: u32 = 1;
/// Number of changes applied concurrently when nothing else is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Contents of `.drift/context.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    pub version: u32,
    /// Location of the remote store.
    pub remote: PathBuf,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub created_at: DateTime<Utc>,
}

impl ContextConfig {
    pub fn new(remote: impl Into<PathBuf>) -> Self {
        Self {
            version: CONTEXT_VERSION,
            remote: remote.into(),
            concurrency: DEFAULT_CONCURRENCY,
            created_at: Utc::now(),
        }
    }
}

/// A loaded context: its root directory and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    root: PathBuf,
    config: ContextConfig,
}

impl PathContext {
    pub fn new(root: impl Into<PathBuf>, config: ContextConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// `<root>/.drift/plan.json`
    pub fn plan_path(&self) -> PathBuf {
        plan_path_at(&self.root)
    }

    /// Map a repo-relative logical path to an absolute local path.
    ///
    /// Empty and `.` segments are ignored; `..` is rejected.
    pub fn resolve(&self, logical: &str) -> Result<PathBuf, ContextError> {
        let mut path = self.root.clone();
        for segment in logical.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(ContextError::EscapesRoot {
                        path: logical.to_string(),
                    })
                }
                other => path.push(other),
            }
        }
        Ok(path)
    }

    /// `true` if `path` is lexically inside the root (or is the root).
    pub fn contains(&self, path: &Path) -> bool {
        path.is_absolute()
            && !path.components().any(|c| matches!(c, Component::ParentDir))
            && path.starts_with(&self.root)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<root>/.drift/`
pub fn context_dir_at(root: &Path) -> PathBuf {
    root.join(CONTEXT_DIR)
}

/// `<root>/.drift/context.yaml`
pub fn config_path_at(root: &Path) -> PathBuf {
    context_dir_at(root).join(CONTEXT_FILE)
}

/// `<root>/.drift/plan.json`
pub fn plan_path_at(root: &Path) -> PathBuf {
    context_dir_at(root).join(PLAN_FILE)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the context rooted at `root`.
///
/// Returns `ContextError::NotFound` if `.drift/context.yaml` is absent,
/// `ContextError::Parse` (with path + line context) if it is malformed.
pub fn load_at(root: &Path) -> Result<PathContext, ContextError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Err(ContextError::NotFound {
            start: root.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(&path)?;
    let config: ContextConfig =
        serde_yaml::from_str(&contents).map_err(|e| ContextError::Parse { path, source: e })?;
    Ok(PathContext::new(root.canonicalize()?, config))
}

/// Atomically save `config` to `<root>/.drift/context.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `rename`.
pub fn save_at(root: &Path, config: &ContextConfig) -> Result<(), ContextError> {
    let dir = context_dir_at(root);
    std::fs::create_dir_all(&dir)?;
    let path = config_path_at(root);
    let tmp_path = dir.join(format!("{CONTEXT_FILE}.tmp"));

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// Create a context at `root` bound to `remote`.
///
/// Idempotent: if a context already exists it is loaded and returned unchanged.
pub fn init_at(
    root: &Path,
    remote: PathBuf,
    concurrency: Option<usize>,
) -> Result<PathContext, ContextError> {
    if config_path_at(root).exists() {
        return load_at(root);
    }
    let mut config = ContextConfig::new(remote);
    if let Some(n) = concurrency {
        config.concurrency = n.max(1);
    }
    save_at(root, &config)?;
    load_at(root)
}

/// Find the nearest context at or above `start`.
pub fn discover(start: &Path) -> Result<PathContext, ContextError> {
    for dir in start.ancestors() {
        if config_path_at(dir).exists() {
            return load_at(dir);
        }
    }
    Err(ContextError::NotFound {
        start: start.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
