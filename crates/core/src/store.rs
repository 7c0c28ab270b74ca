//! Storage traits consumed by the lock manager and version engine.
//!
//! Each method is one atomic unit against the backing store. Implementations
//! must not let a concurrent caller observe half of a multi-row operation
//! (`acquire`, `load_tree`, `replace_tree`).

use async_trait::async_trait;
use chrono::Duration;

use crate::document::{Block, NewBlock, NewSection, Section, SectionTree};
use crate::error::CoreResult;
use crate::locking::{Lock, LockRequest, ResourceType};
use crate::snapshot::{NewReportVersion, ReportVersion, ReportVersionSummary, SectionSnapshot};
use crate::types::{DbId, Timestamp};

/// Persistence for lock rows.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Resolve an acquire for one resource under isolation.
    ///
    /// Reads the persisted row, applies [`crate::locking::plan_acquire`] and
    /// executes the plan without letting another acquire on the same resource
    /// interleave. Fails with `LockHeldByAnotherUser` on a foreign active lock.
    async fn acquire(&self, request: &LockRequest, now: Timestamp, ttl: Duration)
        -> CoreResult<Lock>;

    /// Set `locked_at = now` on a lock that is still active.
    ///
    /// Returns `None` when the id is unknown or the row has already expired.
    async fn refresh(&self, lock_id: DbId, now: Timestamp, ttl: Duration)
        -> CoreResult<Option<Lock>>;

    /// Delete a lock row regardless of age. Returns `true` if a row existed.
    async fn delete(&self, lock_id: DbId) -> CoreResult<bool>;

    /// The persisted row for a resource, expired or not.
    async fn find_by_resource(
        &self,
        resource_type: ResourceType,
        resource_id: DbId,
    ) -> CoreResult<Option<Lock>>;

    /// All persisted rows for a project, expired or not.
    async fn list_by_project(&self, project_id: DbId) -> CoreResult<Vec<Lock>>;
}

/// The section/block tree of each project.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read every section of a project with its blocks in one consistent
    /// pass. Returns `None` if the project does not exist.
    async fn load_tree(&self, project_id: DbId) -> CoreResult<Option<Vec<SectionTree>>>;

    /// Delete all sections and blocks of a project and recreate them from
    /// `sections`, as one unit. Returns `false` if the project does not exist.
    async fn replace_tree(
        &self,
        project_id: DbId,
        sections: &[SectionSnapshot],
        now: Timestamp,
    ) -> CoreResult<bool>;

    /// Sections of a project ordered by `order`.
    async fn list_sections(&self, project_id: DbId) -> CoreResult<Vec<Section>>;

    /// Blocks of a section ordered by `order`.
    async fn list_blocks(&self, section_id: DbId) -> CoreResult<Vec<Block>>;

    async fn insert_section(&self, input: &NewSection, now: Timestamp) -> CoreResult<Section>;

    async fn insert_block(&self, input: &NewBlock, now: Timestamp) -> CoreResult<Block>;

    async fn update_section_heading(
        &self,
        section_id: DbId,
        heading_text: &str,
        heading_level: i32,
    ) -> CoreResult<Option<Section>>;

    async fn update_block_text(
        &self,
        block_id: DbId,
        markdown_text: &str,
        now: Timestamp,
    ) -> CoreResult<Option<Block>>;

    /// Delete a section and its blocks.
    async fn delete_section(&self, section_id: DbId) -> CoreResult<bool>;

    async fn delete_block(&self, block_id: DbId) -> CoreResult<bool>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> CoreResult<()> {
        Ok(())
    }
}

/// Append-only storage for report versions.
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn insert_version(
        &self,
        input: &NewReportVersion,
        now: Timestamp,
    ) -> CoreResult<ReportVersion>;

    async fn find_version(&self, version_id: DbId) -> CoreResult<Option<ReportVersion>>;

    /// Version history of a project, newest first.
    async fn list_versions(&self, project_id: DbId) -> CoreResult<Vec<ReportVersionSummary>>;
}
