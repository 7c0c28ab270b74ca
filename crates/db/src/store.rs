//! [`PgStore`]: the `folio_core` storage traits over PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Duration;
use folio_core::document::{Block, NewBlock, NewSection, Section, SectionTree};
use folio_core::error::{CoreError, CoreResult};
use folio_core::locking::{plan_acquire, AcquirePlan, Lock, LockRequest, ResourceType};
use folio_core::snapshot::{
    NewReportVersion, ReportVersion, ReportVersionSummary, SectionSnapshot,
};
use folio_core::store::{DocumentStore, LockStore, VersionStore};
use folio_core::types::{DbId, Timestamp};

use crate::repositories::{BlockRepo, LockRepo, ProjectRepo, ReportVersionRepo, SectionRepo};
use crate::DbPool;

/// How many times an acquire re-reads the resource after losing an insert
/// race before giving up with `Conflict`.
const ACQUIRE_ATTEMPTS: usize = 3;

/// PostgreSQL SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn storage(err: sqlx::Error) -> CoreError {
    CoreError::storage(err)
}

/// Map a foreign key violation to `NotFound` for the referenced parent.
fn missing_parent(entity: &'static str, id: DbId) -> impl FnOnce(sqlx::Error) -> CoreError {
    move |err| {
        let is_fk = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == FOREIGN_KEY_VIOLATION);
        if is_fk {
            CoreError::NotFound { entity, id }
        } else {
            storage(err)
        }
    }
}

/// Storage backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for PgStore {
    async fn acquire(
        &self,
        request: &LockRequest,
        now: Timestamp,
        ttl: Duration,
    ) -> CoreResult<Lock> {
        for attempt in 1..=ACQUIRE_ATTEMPTS {
            let mut tx = self.pool.begin().await.map_err(storage)?;

            let existing = LockRepo::find_by_resource_for_update(
                &mut *tx,
                request.resource_type,
                request.resource_id,
            )
            .await
            .map_err(storage)?
            .map(Lock::try_from)
            .transpose()?;

            match plan_acquire(existing.as_ref(), request.requester_id, now, ttl) {
                AcquirePlan::Deny { holder } => return Err(CoreError::lock_held(&holder, ttl)),
                AcquirePlan::Refresh { lock_id } => {
                    let row = LockRepo::touch_if_active(&mut *tx, lock_id, now, now - ttl)
                        .await
                        .map_err(storage)?
                        .ok_or_else(|| {
                            CoreError::Internal(format!("Lock {lock_id} vanished during refresh"))
                        })?;
                    tx.commit().await.map_err(storage)?;
                    return Lock::try_from(row);
                }
                AcquirePlan::Insert { evict } => {
                    if let Some(stale) = evict {
                        LockRepo::delete(&mut *tx, stale).await.map_err(storage)?;
                    }
                    let inserted = LockRepo::insert_if_free(&mut *tx, request, now)
                        .await
                        .map_err(missing_parent("Project", request.project_id))?;
                    if let Some(row) = inserted {
                        tx.commit().await.map_err(storage)?;
                        return Lock::try_from(row);
                    }
                    tracing::debug!(
                        resource_type = %request.resource_type,
                        resource_id = request.resource_id,
                        attempt,
                        "Lost lock insert race, retrying",
                    );
                }
            }
        }

        Err(CoreError::Conflict(format!(
            "Could not acquire lock on {} {} after {ACQUIRE_ATTEMPTS} attempts",
            request.resource_type, request.resource_id
        )))
    }

    async fn refresh(
        &self,
        lock_id: DbId,
        now: Timestamp,
        ttl: Duration,
    ) -> CoreResult<Option<Lock>> {
        LockRepo::touch_if_active(&self.pool, lock_id, now, now - ttl)
            .await
            .map_err(storage)?
            .map(Lock::try_from)
            .transpose()
    }

    async fn delete(&self, lock_id: DbId) -> CoreResult<bool> {
        LockRepo::delete(&self.pool, lock_id).await.map_err(storage)
    }

    async fn find_by_resource(
        &self,
        resource_type: ResourceType,
        resource_id: DbId,
    ) -> CoreResult<Option<Lock>> {
        LockRepo::find_by_resource(&self.pool, resource_type, resource_id)
            .await
            .map_err(storage)?
            .map(Lock::try_from)
            .transpose()
    }

    async fn list_by_project(&self, project_id: DbId) -> CoreResult<Vec<Lock>> {
        LockRepo::list_by_project(&self.pool, project_id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Lock::try_from)
            .collect()
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn load_tree(&self, project_id: DbId) -> CoreResult<Option<Vec<SectionTree>>> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        if ProjectRepo::find_by_id(&mut *tx, project_id)
            .await
            .map_err(storage)?
            .is_none()
        {
            return Ok(None);
        }

        let sections = SectionRepo::list_by_project(&mut *tx, project_id)
            .await
            .map_err(storage)?;
        let block_rows = BlockRepo::list_by_project(&mut *tx, project_id)
            .await
            .map_err(storage)?;
        tx.commit().await.map_err(storage)?;

        let mut blocks_by_section: HashMap<DbId, Vec<Block>> = HashMap::new();
        for row in block_rows {
            let block = Block::try_from(row)?;
            blocks_by_section.entry(block.section_id).or_default().push(block);
        }

        let trees = sections
            .into_iter()
            .map(|row| {
                let section = Section::from(row);
                let blocks = blocks_by_section.remove(&section.id).unwrap_or_default();
                SectionTree { section, blocks }
            })
            .collect();
        Ok(Some(trees))
    }

    async fn replace_tree(
        &self,
        project_id: DbId,
        sections: &[SectionSnapshot],
        now: Timestamp,
    ) -> CoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        if !ProjectRepo::lock_for_update(&mut *tx, project_id)
            .await
            .map_err(storage)?
        {
            return Ok(false);
        }

        let removed_blocks = BlockRepo::delete_by_project(&mut *tx, project_id)
            .await
            .map_err(storage)?;
        let removed_sections = SectionRepo::delete_by_project(&mut *tx, project_id)
            .await
            .map_err(storage)?;

        for snapshot in sections {
            let section = SectionRepo::create(
                &mut *tx,
                &NewSection {
                    project_id,
                    heading_text: snapshot.heading_text.clone(),
                    heading_level: snapshot.heading_level,
                    order: snapshot.order,
                },
                now,
            )
            .await
            .map_err(storage)?;

            for block in &snapshot.blocks {
                BlockRepo::create(
                    &mut *tx,
                    &NewBlock {
                        project_id,
                        section_id: section.id,
                        order: block.order,
                        block_type: block.block_type,
                        markdown_text: block.markdown_text.clone(),
                    },
                    now,
                )
                .await
                .map_err(storage)?;
            }
        }

        tx.commit().await.map_err(storage)?;

        tracing::debug!(
            project_id,
            removed_sections,
            removed_blocks,
            inserted_sections = sections.len(),
            "Replaced document tree",
        );
        Ok(true)
    }

    async fn list_sections(&self, project_id: DbId) -> CoreResult<Vec<Section>> {
        let rows = SectionRepo::list_by_project(&self.pool, project_id)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(Section::from).collect())
    }

    async fn list_blocks(&self, section_id: DbId) -> CoreResult<Vec<Block>> {
        BlockRepo::list_by_section(&self.pool, section_id)
            .await
            .map_err(storage)?
            .into_iter()
            .map(Block::try_from)
            .collect()
    }

    async fn insert_section(&self, input: &NewSection, now: Timestamp) -> CoreResult<Section> {
        SectionRepo::create(&self.pool, input, now)
            .await
            .map(Section::from)
            .map_err(missing_parent("Project", input.project_id))
    }

    async fn insert_block(&self, input: &NewBlock, now: Timestamp) -> CoreResult<Block> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let section = SectionRepo::find_by_id(&mut *tx, input.section_id)
            .await
            .map_err(storage)?
            .ok_or(CoreError::NotFound {
                entity: "Section",
                id: input.section_id,
            })?;
        if section.project_id != input.project_id {
            return Err(CoreError::Validation(format!(
                "Section {} does not belong to project {}",
                input.section_id, input.project_id
            )));
        }

        let row = BlockRepo::create(&mut *tx, input, now)
            .await
            .map_err(missing_parent("Section", input.section_id))?;
        tx.commit().await.map_err(storage)?;
        Block::try_from(row)
    }

    async fn update_section_heading(
        &self,
        section_id: DbId,
        heading_text: &str,
        heading_level: i32,
    ) -> CoreResult<Option<Section>> {
        let row = SectionRepo::update_heading(&self.pool, section_id, heading_text, heading_level)
            .await
            .map_err(storage)?;
        Ok(row.map(Section::from))
    }

    async fn update_block_text(
        &self,
        block_id: DbId,
        markdown_text: &str,
        now: Timestamp,
    ) -> CoreResult<Option<Block>> {
        BlockRepo::update_text(&self.pool, block_id, markdown_text, now)
            .await
            .map_err(storage)?
            .map(Block::try_from)
            .transpose()
    }

    async fn delete_section(&self, section_id: DbId) -> CoreResult<bool> {
        SectionRepo::delete(&self.pool, section_id)
            .await
            .map_err(storage)
    }

    async fn delete_block(&self, block_id: DbId) -> CoreResult<bool> {
        BlockRepo::delete(&self.pool, block_id).await.map_err(storage)
    }

    async fn ping(&self) -> CoreResult<()> {
        crate::health_check(&self.pool).await.map_err(storage)
    }
}

#[async_trait]
impl VersionStore for PgStore {
    async fn insert_version(
        &self,
        input: &NewReportVersion,
        now: Timestamp,
    ) -> CoreResult<ReportVersion> {
        ReportVersionRepo::create(&self.pool, input, now)
            .await
            .map(ReportVersion::from)
            .map_err(missing_parent("Project", input.project_id))
    }

    async fn find_version(&self, version_id: DbId) -> CoreResult<Option<ReportVersion>> {
        let row = ReportVersionRepo::find_by_id(&self.pool, version_id)
            .await
            .map_err(storage)?;
        Ok(row.map(ReportVersion::from))
    }

    async fn list_versions(&self, project_id: DbId) -> CoreResult<Vec<ReportVersionSummary>> {
        let rows = ReportVersionRepo::list_by_project(&self.pool, project_id)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(ReportVersionSummary::from).collect())
    }
}
