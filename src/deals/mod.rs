// src/deals/mod.rs
//! Deal registrations and the admin allow-list, both kept as spreadsheet tabs.
//!
//! These types only talk to a [`SheetStore`](crate::sheets::SheetStore), so the
//! same code runs against Google Sheets and the in-memory store.

pub mod admins;
pub mod book;
pub mod deal;

pub use admins::{AdminEntry, AdminRoster};
pub use book::DealBook;
pub use deal::{Deal, DealStatus, NewDeal};

use thiserror::Error;
use tracing::info;

use crate::sheets::{SheetError, SheetResult, SheetStore};

#[derive(Error, Debug)]
pub enum DealError {
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },
    #[error("Deal {id} is already {status}")]
    AlreadyDecided { id: String, status: String },
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

pub type DealResult<T> = Result<T, DealError>;

/// Trimmed and lowercased; admin entries are stored in this form.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    clean(local)
        && clean(domain)
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i < domain.len() - 1)
}

/// The tab's header row. When row 1 is blank, `default` is written there and returned.
pub(crate) async fn header_or_seed<S: SheetStore>(
    store: &S,
    tab: &str,
    grid: &[Vec<String>],
    default: &[&str],
) -> SheetResult<Vec<String>> {
    match grid.first() {
        Some(h) if !h.is_empty() => Ok(h.clone()),
        _ => {
            let seed: Vec<String> = default.iter().map(|c| c.to_string()).collect();
            store.update_row(tab, 1, &seed).await?;
            info!("Wrote header row to {}", tab);
            Ok(seed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        for ok in ["ops@example.com", "a.b+c@sub.example.io", "x@y.z"] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in ["", "ops", "ops@", "@example.com", "ops@example", "ops@.com", "ops@example.", "o ps@example.com", "a@b@c.com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_seed_fills_blank_first_row() {
        use crate::sheets::MemorySheetStore;

        let store = MemorySheetStore::default().with_tab(
            "Admins",
            vec![vec![], vec!["ops@example.com", "lead@example.com", "", "active"]],
        );
        let grid = store.get_sheet_data("Admins", None).await.unwrap();
        let header = header_or_seed(&store, "Admins", &grid, &["email", "added_by", "added_at", "status"])
            .await
            .unwrap();
        assert_eq!(header[0], "email");

        let raw = store.snapshot("Admins").await.unwrap();
        assert_eq!(raw.len(), 2, "seed must not be appended after the data");
        assert_eq!(raw[0], header);
        assert_eq!(store.header("Admins").await.unwrap(), header);
    }

    #[tokio::test]
    async fn test_existing_header_is_kept() {
        use crate::sheets::MemorySheetStore;

        let store = MemorySheetStore::default().with_tab("Deals", vec![vec!["id", "status"]]);
        let grid = store.get_sheet_data("Deals", None).await.unwrap();
        let header = header_or_seed(&store, "Deals", &grid, &["other"]).await.unwrap();
        assert_eq!(header, vec!["id".to_string(), "status".to_string()]);
        assert_eq!(store.snapshot("Deals").await.unwrap().len(), 1);
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ops@Example.COM "), "ops@example.com");
    }
}
