// src/deals/deal.rs

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{DealError, DealResult};

/// Furthest an expected close date may lie after the submission day.
pub const MAX_CLOSE_DAYS: i64 = 60;

/// Column names of the deals tab, in the order a fresh tab is laid out.
pub const DEAL_COLUMNS: [&str; 21] = [
    "id",
    "status",
    "created_at",
    "company_name",
    "domain",
    "partner_company",
    "submitter_name",
    "submitter_email",
    "territory",
    "customer_industry",
    "customer_location",
    "deal_stage",
    "expected_close_date",
    "deal_value",
    "contract_type",
    "primary_product",
    "additional_notes",
    "customer_legal_name",
    "approved_by",
    "approved_at",
    "rejection_reason",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealStatus {
    Pending,
    Approved,
    Rejected,
}

impl DealStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DealStatus::Pending => "pending",
            DealStatus::Approved => "approved",
            DealStatus::Rejected => "rejected",
        }
    }
}

/// One row of the deals tab. Every field is a cell string; empty when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deal {
    pub id: String,
    pub status: String,
    pub created_at: String,
    pub company_name: String,
    pub domain: String,
    pub partner_company: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub territory: String,
    pub customer_industry: String,
    pub customer_location: String,
    pub deal_stage: String,
    pub expected_close_date: String,
    pub deal_value: String,
    pub contract_type: String,
    pub primary_product: String,
    pub additional_notes: String,
    pub customer_legal_name: String,
    pub approved_by: String,
    pub approved_at: String,
    pub rejection_reason: String,
}

impl Deal {
    pub fn is_pending(&self) -> bool {
        self.status == DealStatus::Pending.as_str()
    }
}

/// What a partner submits through the registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewDeal {
    pub company_name: String,
    pub domain: String,
    pub partner_company: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub territory: String,
    pub customer_industry: String,
    pub customer_location: String,
    pub deal_stage: String,
    pub expected_close_date: String,
    pub deal_value: String,
    pub contract_type: String,
    pub primary_product: String,
    pub additional_notes: String,
    pub customer_legal_name: String,
}

impl NewDeal {
    pub fn into_deal(self, id: String, created_at: String) -> Deal {
        Deal {
            id,
            status: DealStatus::Pending.as_str().to_string(),
            created_at,
            company_name: self.company_name.trim().to_string(),
            domain: normalize_domain(&self.domain),
            partner_company: self.partner_company,
            submitter_name: self.submitter_name,
            submitter_email: self.submitter_email.trim().to_string(),
            territory: self.territory,
            customer_industry: self.customer_industry,
            customer_location: self.customer_location,
            deal_stage: self.deal_stage,
            expected_close_date: self.expected_close_date.trim().to_string(),
            deal_value: self.deal_value,
            contract_type: self.contract_type,
            primary_product: self.primary_product,
            additional_notes: self.additional_notes,
            customer_legal_name: self.customer_legal_name,
            ..Deal::default()
        }
    }
}

/// Parses a `YYYY-MM-DD` close date that falls between `today` and
/// `today + MAX_CLOSE_DAYS`, both inclusive.
pub fn check_close_date(raw: &str, today: NaiveDate) -> DealResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DealError::Invalid("Expected close date is required".to_string()));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DealError::Invalid(format!("Expected close date {:?} is not a YYYY-MM-DD date", raw)))?;
    if date < today {
        return Err(DealError::Invalid("Expected close date must be in the future".to_string()));
    }
    if date > today + Duration::days(MAX_CLOSE_DAYS) {
        return Err(DealError::Invalid(format!(
            "Expected close date cannot be more than {} days from today",
            MAX_CLOSE_DAYS
        )));
    }
    Ok(date)
}

/// `https://www.Acme.com/pricing` -> `acme.com`.
pub fn normalize_domain(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme.split('/').next().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}
