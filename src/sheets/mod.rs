// src/sheets/mod.rs

pub mod error;
pub mod google;
pub mod ids;
pub mod memory;
pub mod range;
pub mod record;
pub mod store;

pub use error::{SheetError, SheetResult};
pub use google::GoogleSheetsClient;
pub use memory::MemorySheetStore;
pub use record::{Lookup, Record};
pub use store::{SheetStore, SpreadsheetInfo, WriteReceipt};
