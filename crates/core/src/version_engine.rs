//! Version snapshots: capture, restore, and compare whole document trees.

use std::sync::Arc;

use crate::clock::Clock;
use crate::diff::{self, DiffEntry};
use crate::error::{CoreError, CoreResult};
use crate::snapshot::{DocumentSnapshot, NewReportVersion, ReportVersion, ReportVersionSummary};
use crate::store::{DocumentStore, VersionStore};
use crate::types::DbId;

/// Captures and restores project document trees as atomic units.
///
/// Does not consult locks. Gating edits on lock ownership is the job of
/// whatever layer writes sections and blocks.
#[derive(Clone)]
pub struct VersionEngine {
    documents: Arc<dyn DocumentStore>,
    versions: Arc<dyn VersionStore>,
    clock: Arc<dyn Clock>,
}

impl VersionEngine {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        versions: Arc<dyn VersionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            documents,
            versions,
            clock,
        }
    }

    /// Snapshot the current tree of a project and store it as a new version.
    ///
    /// Zero sections, or sections with zero blocks, are valid snapshots.
    pub async fn create_version_snapshot(
        &self,
        project_id: DbId,
        summary: Option<String>,
        created_by_user_id: Option<DbId>,
    ) -> CoreResult<DbId> {
        let trees = self
            .documents
            .load_tree(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })?;
        let snapshot = DocumentSnapshot::capture(trees);

        let input = NewReportVersion {
            project_id,
            summary: normalize_summary(summary),
            snapshot,
            created_by_user_id,
        };
        let version = self.versions.insert_version(&input, self.clock.now()).await?;

        tracing::info!(
            version_id = version.id,
            project_id,
            sections = version.snapshot.sections.len(),
            blocks = version.snapshot.block_count(),
            "Version snapshot created"
        );
        Ok(version.id)
    }

    /// Replace the live tree of the version's project with the snapshot.
    ///
    /// Every current section and block is deleted and recreated, so rows get
    /// new ids.
    pub async fn restore_version(&self, version_id: DbId) -> CoreResult<()> {
        let version = self.get_version(version_id).await?;

        let replaced = self
            .documents
            .replace_tree(
                version.project_id,
                &version.snapshot.sections,
                self.clock.now(),
            )
            .await?;
        if !replaced {
            return Err(CoreError::NotFound {
                entity: "Project",
                id: version.project_id,
            });
        }

        tracing::info!(
            version_id,
            project_id = version.project_id,
            sections = version.snapshot.sections.len(),
            "Version restored"
        );
        Ok(())
    }

    /// Positional diff from version `a` to version `b`.
    pub async fn compare_versions(&self, a: DbId, b: DbId) -> CoreResult<Vec<DiffEntry>> {
        let old = self.get_version(a).await?;
        let new = self.get_version(b).await?;
        Ok(diff::compare(&old.snapshot, &new.snapshot))
    }

    pub async fn get_version(&self, version_id: DbId) -> CoreResult<ReportVersion> {
        self.versions
            .find_version(version_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ReportVersion",
                id: version_id,
            })
    }

    /// Version history of a project, newest first.
    pub async fn list_versions(&self, project_id: DbId) -> CoreResult<Vec<ReportVersionSummary>> {
        self.versions.list_versions(project_id).await
    }
}

fn normalize_summary(summary: Option<String>) -> Option<String> {
    summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
