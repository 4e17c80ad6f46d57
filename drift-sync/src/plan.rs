//! Plan-file resolver: reads a precomputed change list from JSON.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use drift_core::{normalize_logical, ChangeList, LocalMeta, RemoteMeta};

use crate::error::{io_err, SyncError};
use crate::pull::ChangeResolver;

/// Serves the changes of a plan file that fall under the requested path.
#[derive(Debug, Clone)]
pub struct PlanResolver {
    plan_path: PathBuf,
}

impl PlanResolver {
    pub fn new(plan_path: impl Into<PathBuf>) -> Self {
        Self {
            plan_path: plan_path.into(),
        }
    }

    pub fn plan_path(&self) -> &Path {
        &self.plan_path
    }

    /// Read and parse the whole plan.
    pub async fn load(&self) -> Result<ChangeList, SyncError> {
        let contents = tokio::fs::read_to_string(&self.plan_path)
            .await
            .map_err(|e| io_err(&self.plan_path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

fn in_scope(scope: &str, path: &str) -> bool {
    scope.is_empty()
        || path == scope
        || path
            .strip_prefix(scope)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[async_trait]
impl ChangeResolver for PlanResolver {
    async fn resolve(
        &self,
        path: &str,
        _remote: Option<&RemoteMeta>,
        _local: Option<&LocalMeta>,
    ) -> Result<ChangeList, SyncError> {
        let plan = self
            .load()
            .await
            .map_err(|e| SyncError::Resolution(e.to_string()))?;
        let scope = normalize_logical(path);
        let selected: ChangeList = plan
            .into_iter()
            .filter(|c| in_scope(&scope, &normalize_logical(&c.path)))
            .collect();
        for change in &selected {
            change
                .validate()
                .map_err(|e| SyncError::Resolution(e.to_string()))?;
        }
        tracing::debug!(scope = %scope, changes = selected.len(), "resolved plan");
        Ok(selected)
    }
}
