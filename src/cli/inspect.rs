// src/cli/inspect.rs
// Read-only sheet diagnostics, printed as JSON

use serde::Serialize;
use tracing::info;

use crate::sheets::record::map_rows;
use crate::sheets::{Lookup, SheetResult, SheetStore};

fn print_json<T: Serialize>(value: &T) -> SheetResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn test_connection<S: SheetStore>(store: &S) -> SheetResult<()> {
    let info = store.test_connection().await?;
    info!("Connected to \"{}\" ({} tabs)", info.title, info.sheets.len());
    print_json(&info)
}

pub async fn read<S: SheetStore>(store: &S, tab: &str, range: Option<&str>, raw: bool) -> SheetResult<()> {
    let grid = store.get_sheet_data(tab, range).await?;
    if raw {
        return print_json(&grid);
    }
    let records = map_rows(&grid);
    info!("{} records in {}", records.len(), tab);
    print_json(&records)
}

pub async fn find<S: SheetStore>(store: &S, tab: &str, column: &str, value: &str) -> SheetResult<()> {
    match store.find_row_by_value(tab, column, value).await? {
        Lookup::Found(record) => print_json(&record),
        Lookup::NotFound => {
            println!("No row in {} where {} = {}", tab, column, value);
            Ok(())
        }
    }
}
