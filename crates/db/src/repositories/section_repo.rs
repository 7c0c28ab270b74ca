//! Repository for the `sections` table.

use folio_core::document::NewSection;
use folio_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::section::SectionRow;

const COLUMNS: &str = "id, project_id, heading_text, heading_level, sort_order, created_at";

pub struct SectionRepo;

impl SectionRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewSection,
        now: Timestamp,
    ) -> Result<SectionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO sections (project_id, heading_text, heading_level, sort_order, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(input.project_id)
            .bind(&input.heading_text)
            .bind(input.heading_level)
            .bind(input.order)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<SectionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sections WHERE id = $1");
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Sections of a project in document order.
    pub async fn list_by_project(
        executor: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Vec<SectionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sections \
             WHERE project_id = $1 \
             ORDER BY sort_order ASC, id ASC"
        );
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    pub async fn update_heading(
        executor: impl PgExecutor<'_>,
        id: DbId,
        heading_text: &str,
        heading_level: i32,
    ) -> Result<Option<SectionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE sections SET heading_text = $2, heading_level = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .bind(heading_text)
            .bind(heading_level)
            .fetch_optional(executor)
            .await
    }

    /// Delete a section; its blocks go with it via `ON DELETE CASCADE`.
    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every section of a project. Returns the number removed.
    pub async fn delete_by_project(
        executor: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sections WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
