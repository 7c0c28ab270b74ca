//! Repository for the `locks` table.
//!
//! Lock ages are never computed with `NOW()`: the caller passes the instant
//! from its clock so expiry stays testable.

use folio_core::locking::{LockRequest, ResourceType};
use folio_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::lock::LockRow;

const COLUMNS: &str = "id, project_id, resource_type, resource_id, user_id, locked_at";

pub struct LockRepo;

impl LockRepo {
    /// The persisted row for a resource, expired or not.
    pub async fn find_by_resource(
        executor: impl PgExecutor<'_>,
        resource_type: ResourceType,
        resource_id: DbId,
    ) -> Result<Option<LockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locks \
             WHERE resource_type = $1 AND resource_id = $2"
        );
        sqlx::query_as::<_, LockRow>(&query)
            .bind(resource_type.as_str())
            .bind(resource_id)
            .fetch_optional(executor)
            .await
    }

    /// Like [`find_by_resource`](Self::find_by_resource) but row-locks the
    /// result until the surrounding transaction ends.
    pub async fn find_by_resource_for_update(
        executor: impl PgExecutor<'_>,
        resource_type: ResourceType,
        resource_id: DbId,
    ) -> Result<Option<LockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locks \
             WHERE resource_type = $1 AND resource_id = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, LockRow>(&query)
            .bind(resource_type.as_str())
            .bind(resource_id)
            .fetch_optional(executor)
            .await
    }

    /// Insert a lock unless a row for the resource already exists.
    ///
    /// Returns `None` when `uq_locks_resource` rejected the insert, i.e. a
    /// concurrent acquirer got there first.
    pub async fn insert_if_free(
        executor: impl PgExecutor<'_>,
        request: &LockRequest,
        now: Timestamp,
    ) -> Result<Option<LockRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO locks (project_id, resource_type, resource_id, user_id, locked_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT ON CONSTRAINT uq_locks_resource DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LockRow>(&query)
            .bind(request.project_id)
            .bind(request.resource_type.as_str())
            .bind(request.resource_id)
            .bind(request.requester_id)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    /// Set `locked_at = now` on a row, but only if it was taken after
    /// `active_since` (i.e. has not expired).
    pub async fn touch_if_active(
        executor: impl PgExecutor<'_>,
        id: DbId,
        now: Timestamp,
        active_since: Timestamp,
    ) -> Result<Option<LockRow>, sqlx::Error> {
        let query = format!(
            "UPDATE locks SET locked_at = $2 \
             WHERE id = $1 AND locked_at > $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LockRow>(&query)
            .bind(id)
            .bind(now)
            .bind(active_since)
            .fetch_optional(executor)
            .await
    }

    /// Delete a lock by id. Returns `true` if a row was deleted.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM locks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every persisted row for a project, oldest first.
    pub async fn list_by_project(
        executor: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Vec<LockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locks \
             WHERE project_id = $1 \
             ORDER BY locked_at ASC, id ASC"
        );
        sqlx::query_as::<_, LockRow>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }
}
