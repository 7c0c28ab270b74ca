//! Repository for the `projects` table.

use folio_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::project::ProjectRow;

const COLUMNS: &str = "id, name, created_at";

pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project, returning the created row.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        name: &str,
    ) -> Result<ProjectRow, sqlx::Error> {
        let query = format!("INSERT INTO projects (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(name)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Row-lock a project for the rest of the transaction.
    ///
    /// Serializes whole-tree rewrites of the same project. Returns `false`
    /// if the project does not exist.
    pub async fn lock_for_update(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.is_some())
    }
}
