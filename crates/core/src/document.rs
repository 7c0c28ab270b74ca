//! Document tree types: projects own ordered sections, sections own ordered
//! blocks of markdown.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// The kinds of block the editor renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    BulletList,
    NumberedList,
    Table,
    Image,
    CodeBlock,
}

impl BlockType {
    pub const ALL: [BlockType; 6] = [
        Self::Paragraph,
        Self::BulletList,
        Self::NumberedList,
        Self::Table,
        Self::Image,
        Self::CodeBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::BulletList => "bullet_list",
            Self::NumberedList => "numbered_list",
            Self::Table => "table",
            Self::Image => "image",
            Self::CodeBlock => "code_block",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid block_type '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: DbId,
    pub project_id: DbId,
    pub heading_text: String,
    pub heading_level: i32,
    pub order: i32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: DbId,
    pub project_id: DbId,
    pub section_id: DbId,
    pub order: i32,
    pub block_type: BlockType,
    pub markdown_text: String,
    pub last_edited_at: Timestamp,
}

/// DTO for inserting a section.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSection {
    pub project_id: DbId,
    pub heading_text: String,
    pub heading_level: i32,
    pub order: i32,
}

/// DTO for inserting a block.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBlock {
    pub project_id: DbId,
    pub section_id: DbId,
    pub order: i32,
    pub block_type: BlockType,
    pub markdown_text: String,
}

/// One live section with its blocks, as read in a single consistent pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTree {
    pub section: Section,
    pub blocks: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_type_round_trips_through_str() {
        for t in BlockType::ALL {
            assert_eq!(t.as_str().parse::<BlockType>().unwrap(), t);
        }
    }

    #[test]
    fn block_type_serde_matches_as_str() {
        let json = serde_json::to_string(&BlockType::NumberedList).unwrap();
        assert_eq!(json, "\"numbered_list\"");
    }

    #[test]
    fn unknown_block_type_is_validation_error() {
        assert!(matches!(
            "heading".parse::<BlockType>(),
            Err(CoreError::Validation(_))
        ));
    }
}
