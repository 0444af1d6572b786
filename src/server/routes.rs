// src/server/routes.rs

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::AppError;
use super::AppState;
use crate::deals::{normalize_email, AdminEntry, Deal, NewDeal};
use crate::sheets::{SheetStore, SpreadsheetInfo};

pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Email the caller identifies as, taken from the `x-user-email` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

#[async_trait]
impl<T> FromRequestParts<T> for Caller
where
    T: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(normalize_email)
            .unwrap_or_default();
        if email.is_empty() {
            return Err(AppError::Unauthenticated);
        }
        Ok(Caller(email))
    }
}

impl Caller {
    /// Passes only when the caller is on the admin roster.
    pub async fn require_admin<S: SheetStore>(&self, state: &AppState<S>) -> Result<(), AppError> {
        if state.admins.is_admin(&self.0).await? {
            Ok(())
        } else {
            warn!("Admin route refused for {}", self.0);
            Err(AppError::NotAdmin(self.0.clone()))
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DealResponse {
    pub deal: Deal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DealsResponse {
    pub deals: Vec<Deal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminResponse {
    pub admin: AdminEntry,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminsResponse {
    pub admins: Vec<AdminEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub success: bool,
    pub admin: AdminEntry,
}

#[derive(Debug, Deserialize)]
pub struct AdminRequest {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DecisionRequest {
    pub approver_name: Option<String>,
    pub rejection_reason: Option<String>,
}

impl DecisionRequest {
    /// The named approver, or the caller's email when none was given.
    fn approver(&self, caller: &Caller) -> String {
        self.approver_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map_or_else(|| caller.0.clone(), str::to_string)
    }
}

pub async fn health_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<SpreadsheetInfo>, AppError> {
    Ok(Json(state.store.test_connection().await?))
}

pub async fn submit_deal_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(new_deal): Json<NewDeal>,
) -> Result<(StatusCode, Json<DealResponse>), AppError> {
    let deal = state.deals.submit(new_deal).await?;
    Ok((StatusCode::CREATED, Json(DealResponse { deal })))
}

pub async fn pending_deals_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<DealsResponse>, AppError> {
    caller.require_admin(&state).await?;
    let deals = state.deals.pending().await?;
    Ok(Json(DealsResponse { deals }))
}

pub async fn approve_deal_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
    body: Option<Json<DecisionRequest>>,
) -> Result<Json<DealResponse>, AppError> {
    caller.require_admin(&state).await?;
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let deal = state.deals.approve(&id, &request.approver(&caller)).await?;
    Ok(Json(DealResponse { deal }))
}

pub async fn reject_deal_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DealResponse>, AppError> {
    caller.require_admin(&state).await?;
    let reason = request.rejection_reason.clone().unwrap_or_default();
    let deal = state.deals.reject(&id, &request.approver(&caller), &reason).await?;
    Ok(Json(DealResponse { deal }))
}

pub async fn list_admins_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<AdminsResponse>, AppError> {
    caller.require_admin(&state).await?;
    let mut admins = state.admins.list().await?;
    admins.retain(AdminEntry::is_active);
    Ok(Json(AdminsResponse { admins }))
}

pub async fn add_admin_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(request): Json<AdminRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), AppError> {
    caller.require_admin(&state).await?;
    let admin = state.admins.add(&request.email, &caller.0).await?;
    info!("{} granted admin access to {}", caller.0, admin.email);
    Ok((StatusCode::CREATED, Json(AdminResponse { admin })))
}

pub async fn remove_admin_handler<S: SheetStore>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(request): Json<AdminRequest>,
) -> Result<Json<RemovedResponse>, AppError> {
    caller.require_admin(&state).await?;
    let admin = state.admins.remove(&request.email, &caller.0).await?;
    Ok(Json(RemovedResponse { success: true, admin }))
}
