// src/deals/book.rs

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::deal::{check_close_date, normalize_domain, Deal, DealStatus, NewDeal, DEAL_COLUMNS};
use super::{header_or_seed, is_valid_email, DealError, DealResult};
use crate::sheets::ids::{current_timestamp, generate_id};
use crate::sheets::record::{map_rows, Record};
use crate::sheets::SheetStore;

const ID_COLUMN: &str = "id";

enum Decision<'a> {
    Approve,
    Reject { reason: &'a str },
}

/// Deal registrations stored one per row in a tab.
///
/// Status changes are read-modify-write of the whole row with no locking:
/// concurrent decisions on the same deal resolve last-write-wins.
pub struct DealBook<S> {
    store: Arc<S>,
    tab: String,
}

impl<S: SheetStore> DealBook<S> {
    pub fn new(store: Arc<S>, tab: impl Into<String>) -> Self {
        Self { store, tab: tab.into() }
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    /// Every deal in sheet order.
    pub async fn all(&self) -> DealResult<Vec<Deal>> {
        let grid = self.store.get_sheet_data(&self.tab, None).await?;
        map_rows(&grid)
            .iter()
            .map(|r| r.deserialize::<Deal>().map_err(DealError::from))
            .collect()
    }

    pub async fn pending(&self) -> DealResult<Vec<Deal>> {
        let mut deals = self.all().await?;
        deals.retain(Deal::is_pending);
        Ok(deals)
    }

    pub async fn get(&self, id: &str) -> DealResult<Option<Deal>> {
        match self.store.find_row_by_value(&self.tab, ID_COLUMN, id).await?.into_option() {
            Some(record) => Ok(Some(record.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Validates and appends a new pending deal. The expected close date must
    /// fall within the next 60 days. A deal for the same customer domain that
    /// is not rejected blocks the submission.
    pub async fn submit(&self, new_deal: NewDeal) -> DealResult<Deal> {
        let deal = new_deal.into_deal(generate_id(), current_timestamp());
        if deal.company_name.is_empty() {
            return Err(DealError::Invalid("company_name is required".to_string()));
        }
        if deal.domain.is_empty() {
            return Err(DealError::Invalid("domain is required".to_string()));
        }
        if !is_valid_email(&deal.submitter_email) {
            return Err(DealError::Invalid("submitter_email must be a valid email address".to_string()));
        }
        check_close_date(&deal.expected_close_date, Utc::now().date_naive())?;

        let grid = self.store.get_sheet_data(&self.tab, None).await?;
        let existing = map_rows(&grid).into_iter().find(|r| {
            normalize_domain(r.value("domain")) == deal.domain
                && r.value("status") != DealStatus::Rejected.as_str()
        });
        if let Some(existing) = existing {
            warn!(
                "Rejected duplicate registration for {} (existing deal {})",
                deal.domain,
                existing.value(ID_COLUMN)
            );
            return Err(DealError::Duplicate(format!(
                "A deal for {} is already registered",
                deal.domain
            )));
        }

        let header = header_or_seed(self.store.as_ref(), &self.tab, &grid, &DEAL_COLUMNS).await?;
        let row = Record::from_serialize(&deal)?.to_row(&header);
        self.store.append_to_sheet(&self.tab, &row).await?;
        info!("Deal {} registered for {}", deal.id, deal.company_name);
        Ok(deal)
    }

    pub async fn approve(&self, id: &str, approver: &str) -> DealResult<Deal> {
        self.decide(id, approver, Decision::Approve).await
    }

    pub async fn reject(&self, id: &str, approver: &str, reason: &str) -> DealResult<Deal> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DealError::Invalid("rejection_reason is required".to_string()));
        }
        self.decide(id, approver, Decision::Reject { reason }).await
    }

    async fn decide(&self, id: &str, approver: &str, decision: Decision<'_>) -> DealResult<Deal> {
        let not_found = || DealError::NotFound { kind: "Deal", key: id.to_string() };
        let mut record = self
            .store
            .find_row_by_value(&self.tab, ID_COLUMN, id)
            .await?
            .into_option()
            .ok_or_else(not_found)?;
        let row_index = record.row_index().ok_or_else(not_found)?;

        let status = record.value("status").to_string();
        if status != DealStatus::Pending.as_str() {
            return Err(DealError::AlreadyDecided { id: id.to_string(), status });
        }

        let new_status = match decision {
            Decision::Approve => DealStatus::Approved,
            Decision::Reject { reason } => {
                record.set("rejection_reason", reason);
                DealStatus::Rejected
            }
        };
        record.set("status", new_status.as_str());
        record.set("approved_by", approver);
        record.set("approved_at", current_timestamp());

        let header = self.store.header(&self.tab).await?;
        if header.is_empty() {
            return Err(not_found());
        }
        self.store
            .update_row(&self.tab, row_index, &record.to_row(&header))
            .await?;
        info!("Deal {} {} by {}", id, new_status.as_str(), approver);
        Ok(record.deserialize()?)
    }
}
