//! Repository for the `blocks` table.

use folio_core::document::NewBlock;
use folio_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::block::BlockRow;

const COLUMNS: &str = "id, project_id, section_id, sort_order, block_type, \
                       markdown_text, last_edited_at";

pub struct BlockRepo;

impl BlockRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewBlock,
        now: Timestamp,
    ) -> Result<BlockRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO blocks \
                (project_id, section_id, sort_order, block_type, markdown_text, last_edited_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlockRow>(&query)
            .bind(input.project_id)
            .bind(input.section_id)
            .bind(input.order)
            .bind(input.block_type.as_str())
            .bind(&input.markdown_text)
            .bind(now)
            .fetch_one(executor)
            .await
    }

    /// Blocks of a section in document order.
    pub async fn list_by_section(
        executor: impl PgExecutor<'_>,
        section_id: DbId,
    ) -> Result<Vec<BlockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blocks \
             WHERE section_id = $1 \
             ORDER BY sort_order ASC, id ASC"
        );
        sqlx::query_as::<_, BlockRow>(&query)
            .bind(section_id)
            .fetch_all(executor)
            .await
    }

    /// Every block of a project, grouped by section and in document order.
    pub async fn list_by_project(
        executor: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Vec<BlockRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM blocks \
             WHERE project_id = $1 \
             ORDER BY section_id ASC, sort_order ASC, id ASC"
        );
        sqlx::query_as::<_, BlockRow>(&query)
            .bind(project_id)
            .fetch_all(executor)
            .await
    }

    pub async fn update_text(
        executor: impl PgExecutor<'_>,
        id: DbId,
        markdown_text: &str,
        now: Timestamp,
    ) -> Result<Option<BlockRow>, sqlx::Error> {
        let query = format!(
            "UPDATE blocks SET markdown_text = $2, last_edited_at = $3 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BlockRow>(&query)
            .bind(id)
            .bind(markdown_text)
            .bind(now)
            .fetch_optional(executor)
            .await
    }

    pub async fn delete(executor: impl PgExecutor<'_>, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_project(
        executor: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blocks WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
