//! Positional diff between two document snapshots.
//!
//! Sections are paired by list index and, within a paired section, blocks are
//! paired by list index. There is no content alignment: inserting a block in
//! the middle of a section reports every later position as `modified` plus one
//! trailing `added`.

use serde::{Deserialize, Serialize};

use crate::snapshot::{BlockSnapshot, DocumentSnapshot, SectionSnapshot};

/// One differing block position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffEntry {
    /// Position exists only in the newer snapshot.
    Added {
        section_index: usize,
        block_index: usize,
        block: BlockSnapshot,
    },
    /// Position exists only in the older snapshot.
    Removed {
        section_index: usize,
        block_index: usize,
        block: BlockSnapshot,
    },
    /// Position exists in both with different text.
    Modified {
        section_index: usize,
        block_index: usize,
        old_block: BlockSnapshot,
        new_block: BlockSnapshot,
    },
}

/// Compare `a` (older) against `b` (newer).
///
/// Only `markdown_text` decides `modified`; section headings are not diffed.
pub fn compare(a: &DocumentSnapshot, b: &DocumentSnapshot) -> Vec<DiffEntry> {
    let empty = SectionSnapshot {
        heading_text: String::new(),
        heading_level: 0,
        order: 0,
        blocks: Vec::new(),
    };
    let section_count = a.sections.len().max(b.sections.len());

    let mut entries = Vec::new();
    for section_index in 0..section_count {
        let old = a.sections.get(section_index).unwrap_or(&empty);
        let new = b.sections.get(section_index).unwrap_or(&empty);
        compare_blocks(section_index, &old.blocks, &new.blocks, &mut entries);
    }
    entries
}

fn compare_blocks(
    section_index: usize,
    old: &[BlockSnapshot],
    new: &[BlockSnapshot],
    out: &mut Vec<DiffEntry>,
) {
    for block_index in 0..old.len().max(new.len()) {
        match (old.get(block_index), new.get(block_index)) {
            (Some(o), Some(n)) if o.markdown_text != n.markdown_text => {
                out.push(DiffEntry::Modified {
                    section_index,
                    block_index,
                    old_block: o.clone(),
                    new_block: n.clone(),
                });
            }
            (Some(_), Some(_)) => {}
            (None, Some(n)) => out.push(DiffEntry::Added {
                section_index,
                block_index,
                block: n.clone(),
            }),
            (Some(o), None) => out.push(DiffEntry::Removed {
                section_index,
                block_index,
                block: o.clone(),
            }),
            (None, None) => {}
        }
    }
}

/// Per-kind tally of a diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl DiffSummary {
    pub fn from_entries(entries: &[DiffEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut acc, entry| {
            match entry {
                DiffEntry::Added { .. } => acc.added += 1,
                DiffEntry::Removed { .. } => acc.removed += 1,
                DiffEntry::Modified { .. } => acc.modified += 1,
            }
            acc
        })
    }
}
