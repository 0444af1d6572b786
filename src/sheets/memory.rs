// src/sheets/memory.rs
//! In-process [`SheetStore`] with the same observable semantics as the Sheets
//! API: trailing empty cells are not returned, appends land after the last used
//! row, and updates replace a whole row.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::info;

use super::error::{SheetError, SheetResult};
use super::range::{self, CellRange};
use super::store::{SheetStore, SpreadsheetInfo, WriteReceipt};

/// Highest row `update_row` will grow a tab to.
pub const MAX_ROW_INDEX: usize = 100_000;

pub struct MemorySheetStore {
    title: String,
    tabs: Mutex<Vec<(String, Vec<Vec<String>>)>>,
    fetch_calls: AtomicU64,
}

impl Default for MemorySheetStore {
    fn default() -> Self {
        Self::new("In-memory spreadsheet")
    }
}

impl MemorySheetStore {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            tabs: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
        }
    }

    /// Adds a tab with the given rows (header first). Replaces a tab of the same name.
    pub fn with_tab<R, C>(mut self, name: &str, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let grid = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let tabs = self.tabs.get_mut();
        tabs.retain(|(n, _)| n != name);
        tabs.push((name.to_string(), grid));
        self
    }

    /// Raw copy of a tab, including any trailing empty cells.
    pub async fn snapshot(&self, tab: &str) -> Option<Vec<Vec<String>>> {
        let tabs = self.tabs.lock().await;
        tabs.iter().find(|(n, _)| n == tab).map(|(_, grid)| grid.clone())
    }

    /// Number of reads served so far.
    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }
}

fn tab_mut<'a>(
    tabs: &'a mut [(String, Vec<Vec<String>>)],
    tab: &str,
) -> SheetResult<&'a mut Vec<Vec<String>>> {
    tabs.iter_mut()
        .find(|(n, _)| n == tab)
        .map(|(_, grid)| grid)
        .ok_or_else(|| SheetError::TabNotFound(tab.to_string()))
}

fn written_range(tab: &str, row: usize, width: usize) -> String {
    if width == 0 {
        format!("{}!A{}", range::quote_tab(tab), row)
    } else {
        format!(
            "{}!A{}:{}{}",
            range::quote_tab(tab),
            row,
            range::column_letters(width - 1),
            row
        )
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn get_sheet_data(&self, tab: &str, range: Option<&str>) -> SheetResult<Vec<Vec<String>>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        let cells = match range {
            Some(r) => CellRange::parse(r)?,
            None => CellRange::default(),
        };
        let mut tabs = self.tabs.lock().await;
        let grid = tab_mut(&mut tabs, tab)?;
        Ok(cells.slice(grid))
    }

    async fn append_to_sheet(&self, tab: &str, values: &[String]) -> SheetResult<WriteReceipt> {
        let mut tabs = self.tabs.lock().await;
        let grid = tab_mut(&mut tabs, tab)?;
        let used = grid
            .iter()
            .rposition(|row| row.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1);
        grid.insert(used, values.to_vec());
        info!("Data appended to {}", tab);
        Ok(WriteReceipt {
            updated_range: Some(written_range(tab, used + 1, values.len())),
            updated_rows: 1,
            updated_cells: values.len() as u32,
        })
    }

    async fn update_row(&self, tab: &str, row_index: usize, values: &[String]) -> SheetResult<WriteReceipt> {
        if row_index == 0 || row_index > MAX_ROW_INDEX {
            return Err(SheetError::InvalidRow(row_index));
        }
        let mut tabs = self.tabs.lock().await;
        let grid = tab_mut(&mut tabs, tab)?;
        if grid.len() < row_index {
            grid.resize_with(row_index, Vec::new);
        }
        grid[row_index - 1] = values.to_vec();
        info!("Row {} updated in {}", row_index, tab);
        Ok(WriteReceipt {
            updated_range: Some(written_range(tab, row_index, values.len())),
            updated_rows: 1,
            updated_cells: values.len() as u32,
        })
    }

    async fn test_connection(&self) -> SheetResult<SpreadsheetInfo> {
        let tabs = self.tabs.lock().await;
        Ok(SpreadsheetInfo {
            success: true,
            title: self.title.clone(),
            sheets: tabs.iter().map(|(n, _)| n.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_append_skips_trailing_blank_rows() {
        let store = MemorySheetStore::default().with_tab(
            "Deals",
            vec![vec!["id", "status"], vec!["D1", "pending"], vec!["", ""]],
        );
        let receipt = store.append_to_sheet("Deals", &row(&["D2", "pending"])).await.unwrap();
        assert_eq!(receipt.updated_range.as_deref(), Some("Deals!A3:B3"));

        let raw = store.snapshot("Deals").await.unwrap();
        assert_eq!(raw[2], row(&["D2", "pending"]));
        assert_eq!(raw.len(), 4);
    }

    #[tokio::test]
    async fn test_update_beyond_end_grows_tab() {
        let store = MemorySheetStore::default().with_tab("Admins", vec![vec!["email"]]);
        store.update_row("Admins", 4, &row(&["x@y.io"])).await.unwrap();
        let data = store.get_sheet_data("Admins", None).await.unwrap();
        assert_eq!(data, vec![row(&["email"]), row(&[]), row(&[]), row(&["x@y.io"])]);
    }

    #[tokio::test]
    async fn test_missing_tab_and_bad_row() {
        let store = MemorySheetStore::default();
        assert!(matches!(
            store.get_sheet_data("Nope", None).await,
            Err(SheetError::TabNotFound(_))
        ));
        let store = store.with_tab("Deals", Vec::<Vec<String>>::new());
        assert!(matches!(
            store.update_row("Deals", 0, &[]).await,
            Err(SheetError::InvalidRow(0))
        ));
        assert!(store.get_sheet_data("Deals", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_far_past_end_is_refused() {
        let store = MemorySheetStore::default().with_tab("Deals", vec![vec!["id"]]);
        assert!(matches!(
            store.update_row("Deals", usize::MAX, &row(&["D1"])).await,
            Err(SheetError::InvalidRow(usize::MAX))
        ));
        assert!(store.update_row("Deals", MAX_ROW_INDEX + 1, &row(&["D1"])).await.is_err());
        assert_eq!(store.snapshot("Deals").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connection_lists_tabs_in_order() {
        let store = MemorySheetStore::new("Deal Registry")
            .with_tab("Deals", vec![vec!["id"]])
            .with_tab("Admins", vec![vec!["email"]]);
        let info = store.test_connection().await.unwrap();
        assert_eq!(info.title, "Deal Registry");
        assert_eq!(info.sheets, vec!["Deals".to_string(), "Admins".to_string()]);
    }
}
