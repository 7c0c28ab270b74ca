//! Point-in-time copies of a project's document tree.
//!
//! A snapshot keeps only content and ordering. Section and block ids are
//! deliberately absent: a restore recreates rows with fresh identities.

use serde::{Deserialize, Serialize};

use crate::document::{Block, BlockType, SectionTree};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub block_type: BlockType,
    pub markdown_text: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub heading_text: String,
    pub heading_level: i32,
    pub order: i32,
    pub blocks: Vec<BlockSnapshot>,
}

/// The full tree of a project. Serialized as `{"sections": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub sections: Vec<SectionSnapshot>,
}

impl DocumentSnapshot {
    /// Build a snapshot from live rows.
    ///
    /// Sections are ordered by `order`, blocks within a section likewise;
    /// ties fall back to row id so capture is deterministic.
    pub fn capture(mut trees: Vec<SectionTree>) -> Self {
        trees.sort_by_key(|t| (t.section.order, t.section.id));

        let sections = trees
            .into_iter()
            .map(|tree| {
                let mut blocks = tree.blocks;
                blocks.sort_by_key(|b| (b.order, b.id));
                SectionSnapshot {
                    heading_text: tree.section.heading_text,
                    heading_level: tree.section.heading_level,
                    order: tree.section.order,
                    blocks: blocks.into_iter().map(BlockSnapshot::from).collect(),
                }
            })
            .collect();

        Self { sections }
    }

    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }
}

impl From<Block> for BlockSnapshot {
    fn from(block: Block) -> Self {
        Self {
            block_type: block.block_type,
            markdown_text: block.markdown_text,
            order: block.order,
        }
    }
}

/// A stored version of a project. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    pub id: DbId,
    pub project_id: DbId,
    pub created_at: Timestamp,
    pub summary: Option<String>,
    pub snapshot: DocumentSnapshot,
    pub created_by_user_id: Option<DbId>,
}

/// DTO for inserting a version.
#[derive(Debug, Clone)]
pub struct NewReportVersion {
    pub project_id: DbId,
    pub summary: Option<String>,
    pub snapshot: DocumentSnapshot,
    pub created_by_user_id: Option<DbId>,
}

/// Version history entry without the tree itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersionSummary {
    pub id: DbId,
    pub project_id: DbId,
    pub created_at: Timestamp,
    pub summary: Option<String>,
    pub created_by_user_id: Option<DbId>,
    pub section_count: usize,
    pub block_count: usize,
}

impl From<&ReportVersion> for ReportVersionSummary {
    fn from(version: &ReportVersion) -> Self {
        Self {
            id: version.id,
            project_id: version.project_id,
            created_at: version.created_at,
            summary: version.summary.clone(),
            created_by_user_id: version.created_by_user_id,
            section_count: version.snapshot.sections.len(),
            block_count: version.snapshot.block_count(),
        }
    }
}
