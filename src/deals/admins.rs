// src/deals/admins.rs
//! Admin allow-list. One row per email; rows are never deleted, removal flips
//! the status so the provenance columns stay readable.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{header_or_seed, is_valid_email, normalize_email, DealError, DealResult};
use crate::sheets::ids::current_timestamp;
use crate::sheets::record::{map_rows, Record};
use crate::sheets::SheetStore;

pub const ADMIN_COLUMNS: [&str; 4] = ["email", "added_by", "added_at", "status"];
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_REMOVED: &str = "removed";

const EMAIL_COLUMN: &str = "email";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminEntry {
    pub email: String,
    pub added_by: String,
    pub added_at: String,
    pub status: String,
}

impl AdminEntry {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

/// `email` must already be normalized.
fn is_active_row(record: &Record, email: &str) -> bool {
    normalize_email(record.value(EMAIL_COLUMN)) == email && record.value("status") == STATUS_ACTIVE
}

pub struct AdminRoster<S> {
    store: Arc<S>,
    tab: String,
    bootstrap: Vec<String>,
}

impl<S: SheetStore> AdminRoster<S> {
    /// `bootstrap` emails count as admins whether or not the tab lists them.
    pub fn new(store: Arc<S>, tab: impl Into<String>, bootstrap: Vec<String>) -> Self {
        let bootstrap = bootstrap.iter().map(|e| normalize_email(e)).collect();
        Self { store, tab: tab.into(), bootstrap }
    }

    pub async fn list(&self) -> DealResult<Vec<AdminEntry>> {
        let grid = self.store.get_sheet_data(&self.tab, None).await?;
        map_rows(&grid)
            .iter()
            .map(|r| r.deserialize::<AdminEntry>().map_err(DealError::from))
            .collect()
    }

    pub async fn is_admin(&self, email: &str) -> DealResult<bool> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(false);
        }
        if self.bootstrap.contains(&email) {
            return Ok(true);
        }
        let grid = self.store.get_sheet_data(&self.tab, None).await?;
        Ok(map_rows(&grid).iter().any(|r| is_active_row(r, &email)))
    }

    /// Adds `email`, or reactivates it in place when a removed entry exists.
    pub async fn add(&self, email: &str, added_by: &str) -> DealResult<AdminEntry> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(DealError::Invalid("Please enter a valid email address".to_string()));
        }
        let entry = AdminEntry {
            email: email.clone(),
            added_by: normalize_email(added_by),
            added_at: current_timestamp(),
            status: STATUS_ACTIVE.to_string(),
        };

        let grid = self.store.get_sheet_data(&self.tab, None).await?;
        let rows = map_rows(&grid);
        if rows.iter().any(|r| is_active_row(r, &email)) {
            return Err(DealError::Duplicate(format!("{} is already an admin", email)));
        }
        let existing = rows
            .into_iter()
            .find(|r| normalize_email(r.value(EMAIL_COLUMN)) == email);
        let header = header_or_seed(self.store.as_ref(), &self.tab, &grid, &ADMIN_COLUMNS).await?;
        let row = Record::from_serialize(&entry)?.to_row(&header);

        match existing {
            Some(record) => {
                let row_index = record
                    .row_index()
                    .ok_or_else(|| DealError::NotFound { kind: "Admin", key: email.clone() })?;
                self.store.update_row(&self.tab, row_index, &row).await?;
                info!("Admin {} reactivated by {}", email, entry.added_by);
                Ok(entry)
            }
            None => {
                self.store.append_to_sheet(&self.tab, &row).await?;
                info!("Admin {} added by {}", email, entry.added_by);
                Ok(entry)
            }
        }
    }

    pub async fn remove(&self, email: &str, removed_by: &str) -> DealResult<AdminEntry> {
        let email = normalize_email(email);
        let removed_by = normalize_email(removed_by);
        if email == removed_by {
            return Err(DealError::Forbidden("You cannot remove yourself as an admin".to_string()));
        }
        let not_found = || DealError::NotFound { kind: "Admin", key: email.clone() };

        let grid = self.store.get_sheet_data(&self.tab, None).await?;
        let mut record = map_rows(&grid)
            .into_iter()
            .find(|r| is_active_row(r, &email))
            .ok_or_else(not_found)?;
        let row_index = record.row_index().ok_or_else(not_found)?;
        let header = grid.first().cloned().unwrap_or_default();

        record.set("status", STATUS_REMOVED);
        self.store
            .update_row(&self.tab, row_index, &record.to_row(&header))
            .await?;
        info!("Admin {} removed by {}", email, removed_by);
        Ok(record.deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::MemorySheetStore;

    fn roster(rows: Vec<Vec<&str>>, bootstrap: &[&str]) -> (Arc<MemorySheetStore>, AdminRoster<MemorySheetStore>) {
        let store = Arc::new(MemorySheetStore::default().with_tab("Admins", rows));
        let bootstrap = bootstrap.iter().map(|e| e.to_string()).collect();
        (store.clone(), AdminRoster::new(store, "Admins", bootstrap))
    }

    #[tokio::test]
    async fn test_bootstrap_admin_without_rows() {
        let (_, roster) = roster(vec![], &["Lead@Example.com"]);
        assert!(roster.is_admin("lead@example.com").await.unwrap());
        assert!(!roster.is_admin("someone@example.com").await.unwrap());
        assert!(!roster.is_admin("  ").await.unwrap());
    }

    #[tokio::test]
    async fn test_hand_typed_mixed_case_row_is_admin() {
        let (_, roster) = roster(
            vec![
                vec!["email", "added_by", "added_at", "status"],
                vec![" Ops@Example.com", "lead@example.com", "2024-01-01T00:00:00.000Z", "active"],
            ],
            &[],
        );
        assert!(roster.is_admin("ops@example.com").await.unwrap());
        assert!(matches!(
            roster.add("ops@example.com", "lead@example.com").await,
            Err(DealError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_later_active_row_wins_over_removed_row() {
        let (_, roster) = roster(
            vec![
                vec!["email", "added_by", "added_at", "status"],
                vec!["ops@example.com", "lead@example.com", "2024-01-01T00:00:00.000Z", "removed"],
                vec!["ops@example.com", "lead@example.com", "2024-02-01T00:00:00.000Z", "active"],
            ],
            &[],
        );
        assert!(roster.is_admin("ops@example.com").await.unwrap());
        roster.remove("ops@example.com", "lead@example.com").await.unwrap();
        assert!(!roster.is_admin("ops@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_then_add_reactivates_same_row() {
        let (store, roster) = roster(
            vec![
                vec!["email", "added_by", "added_at", "status"],
                vec!["ops@example.com", "lead@example.com", "2024-01-01T00:00:00.000Z", "active"],
            ],
            &[],
        );
        roster.remove("ops@example.com", "lead@example.com").await.unwrap();
        assert!(!roster.is_admin("ops@example.com").await.unwrap());

        let entry = roster.add("OPS@example.com", "lead@example.com").await.unwrap();
        assert!(entry.is_active());
        let raw = store.snapshot("Admins").await.unwrap();
        assert_eq!(raw.len(), 2, "reactivation must not append");
        assert_eq!(raw[1][3], "active");
        assert!(roster.is_admin("ops@example.com").await.unwrap());
    }
}
