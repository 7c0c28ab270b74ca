//! Repository for the `report_versions` table. Rows are insert-only.

use folio_core::snapshot::NewReportVersion;
use folio_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::models::report_version::{ReportVersionRow, ReportVersionSummaryRow};

const COLUMNS: &str = "id, project_id, created_at, summary, snapshot, created_by_user_id";

pub struct ReportVersionRepo;

impl ReportVersionRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewReportVersion,
        now: Timestamp,
    ) -> Result<ReportVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_versions \
                (project_id, created_at, summary, snapshot, created_by_user_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportVersionRow>(&query)
            .bind(input.project_id)
            .bind(now)
            .bind(&input.summary)
            .bind(Json(&input.snapshot))
            .bind(input.created_by_user_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<ReportVersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM report_versions WHERE id = $1");
        sqlx::query_as::<_, ReportVersionRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// History of a project, newest first, without loading snapshot bodies.
    pub async fn list_by_project(
        executor: impl PgExecutor<'_>,
        project_id: DbId,
    ) -> Result<Vec<ReportVersionSummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, ReportVersionSummaryRow>(
            "SELECT id, project_id, created_at, summary, created_by_user_id, \
                    jsonb_array_length(snapshot->'sections')::BIGINT AS section_count, \
                    (SELECT COALESCE(SUM(jsonb_array_length(s->'blocks')), 0) \
                       FROM jsonb_array_elements(snapshot->'sections') AS s)::BIGINT AS block_count \
             FROM report_versions \
             WHERE project_id = $1 \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(project_id)
        .fetch_all(executor)
        .await
    }
}
