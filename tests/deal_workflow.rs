// tests/deal_workflow.rs
// Submission, review and admin roster flows on top of the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};

use dealsheet::deals::{AdminRoster, DealBook, DealError, NewDeal};
use dealsheet::sheets::{MemorySheetStore, SheetStore};

fn new_deal(company: &str, domain: &str) -> NewDeal {
    NewDeal {
        company_name: company.to_string(),
        domain: domain.to_string(),
        submitter_name: "Riley Partner".to_string(),
        submitter_email: "riley@partner.io".to_string(),
        deal_value: "25000".to_string(),
        expected_close_date: close_date(30),
        ..NewDeal::default()
    }
}

fn close_date(days_ahead: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days_ahead)).to_string()
}

fn book() -> (Arc<MemorySheetStore>, DealBook<MemorySheetStore>) {
    let store = Arc::new(MemorySheetStore::default().with_tab("Deals", Vec::<Vec<String>>::new()));
    (store.clone(), DealBook::new(store, "Deals"))
}

#[tokio::test]
async fn submitted_deals_are_pending_until_decided() {
    let (_, book) = book();
    let acme = book.submit(new_deal("Acme", "acme.com")).await.unwrap();
    let mut globex = new_deal("Globex", "https://www.globex.io/");
    globex.expected_close_date = close_date(60);
    let globex = book.submit(globex).await.unwrap();
    assert_ne!(acme.id, globex.id);
    assert_eq!(globex.domain, "globex.io");

    let pending: Vec<String> = book.pending().await.unwrap().into_iter().map(|d| d.id).collect();
    assert_eq!(pending, vec![acme.id.clone(), globex.id.clone()]);

    let approved = book.approve(&acme.id, "Dana Reviewer").await.unwrap();
    assert_eq!(approved.status, "approved");
    assert_eq!(approved.approved_by, "Dana Reviewer");
    assert!(!approved.approved_at.is_empty());
    assert_eq!(approved.deal_value, "25000");

    let rejected = book.reject(&globex.id, "Dana Reviewer", "Existing customer").await.unwrap();
    assert_eq!(rejected.status, "rejected");
    assert_eq!(rejected.rejection_reason, "Existing customer");

    assert!(book.pending().await.unwrap().is_empty());
    let stored = book.get(&acme.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "approved");
    assert_eq!(stored.submitter_email, "riley@partner.io");
}

#[tokio::test]
async fn decided_deals_cannot_be_decided_again() {
    let (_, book) = book();
    let deal = book.submit(new_deal("Acme", "acme.com")).await.unwrap();
    book.approve(&deal.id, "Dana").await.unwrap();

    let err = book.reject(&deal.id, "Sam", "changed my mind").await.unwrap_err();
    assert!(matches!(err, DealError::AlreadyDecided { ref status, .. } if status == "approved"));
}

#[tokio::test]
async fn unknown_deal_and_missing_reason() {
    let (_, book) = book();
    let deal = book.submit(new_deal("Acme", "acme.com")).await.unwrap();

    assert!(matches!(book.approve("ID_missing", "Dana").await, Err(DealError::NotFound { .. })));
    assert!(matches!(book.reject(&deal.id, "Dana", "   ").await, Err(DealError::Invalid(_))));
    assert!(book.get("ID_missing").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_domain_is_refused_until_rejected() {
    let (store, book) = book();
    let first = book.submit(new_deal("Acme", "acme.com")).await.unwrap();

    let err = book.submit(new_deal("Acme Corp", "https://acme.com")).await.unwrap_err();
    assert!(matches!(err, DealError::Duplicate(_)));

    book.reject(&first.id, "Dana", "Not qualified").await.unwrap();
    book.submit(new_deal("Acme Corp", "acme.com")).await.unwrap();

    // header + three submissions minus the refused one
    assert_eq!(store.get_sheet_data("Deals", None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn submission_requires_core_fields() {
    let (store, book) = book();
    let mut missing_email = new_deal("Acme", "acme.com");
    missing_email.submitter_email = "not-an-email".to_string();

    let mut late_close = new_deal("Acme", "acme.com");
    late_close.expected_close_date = close_date(90);
    let mut past_close = new_deal("Acme", "acme.com");
    past_close.expected_close_date = close_date(-3);
    let mut no_close = new_deal("Acme", "acme.com");
    no_close.expected_close_date.clear();

    for bad in [new_deal("", "acme.com"), new_deal("Acme", " "), missing_email, late_close, past_close, no_close] {
        assert!(matches!(book.submit(bad).await, Err(DealError::Invalid(_))));
    }
    assert!(store.get_sheet_data("Deals", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn roster_add_list_remove() {
    let store = Arc::new(MemorySheetStore::default().with_tab("Admins", Vec::<Vec<String>>::new()));
    let roster = AdminRoster::new(store.clone(), "Admins", vec!["lead@example.com".to_string()]);

    let added = roster.add(" Ops@Example.com", "lead@example.com").await.unwrap();
    assert_eq!(added.email, "ops@example.com");
    assert_eq!(added.added_by, "lead@example.com");
    assert!(roster.is_admin("OPS@example.com").await.unwrap());

    assert!(matches!(
        roster.add("ops@example.com", "lead@example.com").await,
        Err(DealError::Duplicate(_))
    ));
    assert!(matches!(roster.add("nope", "lead@example.com").await, Err(DealError::Invalid(_))));

    let listed = roster.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_active());

    assert!(matches!(
        roster.remove("ops@example.com", "ops@example.com").await,
        Err(DealError::Forbidden(_))
    ));
    let removed = roster.remove("ops@example.com", "lead@example.com").await.unwrap();
    assert_eq!(removed.status, "removed");
    assert!(!roster.is_admin("ops@example.com").await.unwrap());
    assert!(matches!(
        roster.remove("ops@example.com", "lead@example.com").await,
        Err(DealError::NotFound { .. })
    ));

    // removed rows stay for provenance
    assert_eq!(roster.list().await.unwrap().len(), 1);
}
