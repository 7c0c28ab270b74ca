use folio_core::document::Section;
use folio_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `sections` table.
#[derive(Debug, Clone, FromRow)]
pub struct SectionRow {
    pub id: DbId,
    pub project_id: DbId,
    pub heading_text: String,
    pub heading_level: i32,
    pub sort_order: i32,
    pub created_at: Timestamp,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            heading_text: row.heading_text,
            heading_level: row.heading_level,
            order: row.sort_order,
            created_at: row.created_at,
        }
    }
}
