// src/sheets/store.rs
//! The row-level primitives every backing store provides.
//!
//! Nothing here locks or versions rows: two writers to the same row index
//! resolve last-write-wins, and a find followed by an update can observe a row
//! that has changed in between.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::error::SheetResult;
use super::record::{self, Lookup};

/// What the provider reports back after an append or an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReceipt {
    pub updated_range: Option<String>,
    pub updated_rows: u32,
    pub updated_cells: u32,
}

/// Spreadsheet title and tab names, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetInfo {
    pub success: bool,
    pub title: String,
    pub sheets: Vec<String>,
}

#[async_trait]
pub trait SheetStore: Send + Sync + 'static {
    /// All cell values of `tab`, or of `range` within it. An empty tab yields
    /// an empty grid.
    async fn get_sheet_data(&self, tab: &str, range: Option<&str>) -> SheetResult<Vec<Vec<String>>>;

    /// Adds `values` as a new physical row after the last used row. Calling it
    /// twice appends twice.
    async fn append_to_sheet(&self, tab: &str, values: &[String]) -> SheetResult<WriteReceipt>;

    /// Overwrites the whole row at 1-based `row_index` with `values`. Cells
    /// past the end of `values` end up empty.
    async fn update_row(&self, tab: &str, row_index: usize, values: &[String]) -> SheetResult<WriteReceipt>;

    async fn test_connection(&self) -> SheetResult<SpreadsheetInfo>;

    /// Fetches the whole tab and returns the first row whose `column` equals
    /// `value`, with its physical row index.
    async fn find_row_by_value(&self, tab: &str, column: &str, value: &str) -> SheetResult<Lookup> {
        let grid = self.get_sheet_data(tab, None).await.map_err(|e| {
            error!("Error finding row in {}: {}", tab, e);
            e
        })?;
        Ok(record::find_first(&grid, column, value))
    }

    /// Header row of `tab`; empty when the tab has no data.
    async fn header(&self, tab: &str) -> SheetResult<Vec<String>> {
        let mut grid = self.get_sheet_data(tab, Some("1:1")).await?;
        Ok(if grid.is_empty() { Vec::new() } else { grid.swap_remove(0) })
    }
}
