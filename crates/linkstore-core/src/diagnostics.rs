//! Diagnostic table rows reported by the store.

use serde::{Deserialize, Serialize};

/// One row of the store's index table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    pub index: u32,
    pub offset: u64,
    pub length: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forward_links: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backward_links: Vec<u32>,
}

/// One row of the store's free-space table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSpaceRow {
    pub offset: u64,
    pub length: u32,
}

/// Sortable columns of the index table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexColumn {
    Index,
    Offset,
    Length,
    /// Total number of links in both directions.
    Links,
}

/// Sortable columns of the free-space table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeSpaceColumn {
    Offset,
    Length,
}

/// Stable ascending sort of index rows by `column`.
pub fn sort_index_rows(rows: &mut [IndexRow], column: IndexColumn) {
    match column {
        IndexColumn::Index => rows.sort_by_key(|r| r.index),
        IndexColumn::Offset => rows.sort_by_key(|r| r.offset),
        IndexColumn::Length => rows.sort_by_key(|r| r.length),
        IndexColumn::Links => rows.sort_by_key(|r| r.forward_links.len() + r.backward_links.len()),
    }
}

/// Stable ascending sort of free-space rows by `column`.
pub fn sort_free_space_rows(rows: &mut [FreeSpaceRow], column: FreeSpaceColumn) {
    match column {
        FreeSpaceColumn::Offset => rows.sort_by_key(|r| r.offset),
        FreeSpaceColumn::Length => rows.sort_by_key(|r| r.length),
    }
}
