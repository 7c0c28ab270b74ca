use folio_core::document::Block;
use folio_core::error::CoreError;
use folio_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `blocks` table.
#[derive(Debug, Clone, FromRow)]
pub struct BlockRow {
    pub id: DbId,
    pub project_id: DbId,
    pub section_id: DbId,
    pub sort_order: i32,
    pub block_type: String,
    pub markdown_text: String,
    pub last_edited_at: Timestamp,
}

impl TryFrom<BlockRow> for Block {
    type Error = CoreError;

    fn try_from(row: BlockRow) -> Result<Self, Self::Error> {
        let block_type = row.block_type.parse().map_err(|_| {
            CoreError::Internal(format!(
                "Block {} has unknown block_type '{}'",
                row.id, row.block_type
            ))
        })?;
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            section_id: row.section_id,
            order: row.sort_order,
            block_type,
            markdown_text: row.markdown_text,
            last_edited_at: row.last_edited_at,
        })
    }
}
