// src/sheets/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Google service account key file not found at: {}", .0.display())]
    KeyFileNotFound(PathBuf),
    #[error("Invalid service account key: {0}")]
    InvalidKey(String),
    #[error("Invalid row index {0}: rows are addressed from 1")]
    InvalidRow(usize),
    #[error("Tab not found: {0}")]
    TabNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token signing error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },
}

pub type SheetResult<T> = Result<T, SheetError>;

impl SheetError {
    /// True for failures raised while resolving credentials or settings,
    /// before anything has been sent over the network.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SheetError::Config(_) | SheetError::KeyFileNotFound(_) | SheetError::InvalidKey(_)
        )
    }
}
