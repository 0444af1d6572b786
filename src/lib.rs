// src/lib.rs
//! Partner deal registration kept in a Google Sheets spreadsheet.

pub mod cli;
pub mod deals;
pub mod server;
pub mod settings;
pub mod sheets;
