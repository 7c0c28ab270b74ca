use folio_core::error::CoreError;
use folio_core::locking::Lock;
use folio_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `locks` table.
#[derive(Debug, Clone, FromRow)]
pub struct LockRow {
    pub id: DbId,
    pub project_id: DbId,
    pub resource_type: String,
    pub resource_id: DbId,
    pub user_id: DbId,
    pub locked_at: Timestamp,
}

impl TryFrom<LockRow> for Lock {
    type Error = CoreError;

    fn try_from(row: LockRow) -> Result<Self, Self::Error> {
        let resource_type = row.resource_type.parse().map_err(|_| {
            CoreError::Internal(format!(
                "Lock {} has unknown resource_type '{}'",
                row.id, row.resource_type
            ))
        })?;
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            resource_type,
            resource_id: row.resource_id,
            user_id: row.user_id,
            locked_at: row.locked_at,
        })
    }
}
