use folio_core::snapshot::{DocumentSnapshot, ReportVersion, ReportVersionSummary};
use folio_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `report_versions` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReportVersionRow {
    pub id: DbId,
    pub project_id: DbId,
    pub created_at: Timestamp,
    pub summary: Option<String>,
    pub snapshot: Json<DocumentSnapshot>,
    pub created_by_user_id: Option<DbId>,
}

impl From<ReportVersionRow> for ReportVersion {
    fn from(row: ReportVersionRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            created_at: row.created_at,
            summary: row.summary,
            snapshot: row.snapshot.0,
            created_by_user_id: row.created_by_user_id,
        }
    }
}

/// History listing row; counts are computed in SQL so the tree is not loaded.
#[derive(Debug, Clone, FromRow)]
pub struct ReportVersionSummaryRow {
    pub id: DbId,
    pub project_id: DbId,
    pub created_at: Timestamp,
    pub summary: Option<String>,
    pub created_by_user_id: Option<DbId>,
    pub section_count: i64,
    pub block_count: i64,
}

impl From<ReportVersionSummaryRow> for ReportVersionSummary {
    fn from(row: ReportVersionSummaryRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            created_at: row.created_at,
            summary: row.summary,
            created_by_user_id: row.created_by_user_id,
            section_count: usize::try_from(row.section_count).unwrap_or(0),
            block_count: usize::try_from(row.block_count).unwrap_or(0),
        }
    }
}
