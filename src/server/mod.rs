// src/server/mod.rs
//! HTTP surface of the deal registry: a public submission route, a health
//! check, and admin routes gated on the `x-user-email` header.

pub mod error;
pub mod routes;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::deals::{AdminRoster, DealBook};
use crate::settings::Settings;
use crate::sheets::SheetStore;

pub use error::AppError;
pub use routes::{Caller, USER_EMAIL_HEADER};

pub struct AppState<S> {
    pub store: Arc<S>,
    pub deals: DealBook<S>,
    pub admins: AdminRoster<S>,
}

impl<S: SheetStore> AppState<S> {
    pub fn new(store: Arc<S>, settings: &Settings) -> Arc<Self> {
        Arc::new(Self {
            deals: DealBook::new(store.clone(), settings.deals_tab.clone()),
            admins: AdminRoster::new(
                store.clone(),
                settings.admins_tab.clone(),
                settings.bootstrap_admins.clone(),
            ),
            store,
        })
    }
}

pub fn build_router<S: SheetStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(USER_EMAIL_HEADER)]);

    Router::new()
        .route("/health", get(routes::health_handler::<S>))
        .route("/deals", post(routes::submit_deal_handler::<S>))
        .route("/admin/pending-deals", get(routes::pending_deals_handler::<S>))
        .route("/admin/list", get(routes::list_admins_handler::<S>))
        .route("/admin/add", post(routes::add_admin_handler::<S>))
        .route("/admin/remove", post(routes::remove_admin_handler::<S>))
        .route("/admin/deals/:id/approve", post(routes::approve_deal_handler::<S>))
        .route("/admin/deals/:id/reject", post(routes::reject_deal_handler::<S>))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server<S: SheetStore>(store: Arc<S>, settings: &Settings) -> std::io::Result<()> {
    let app = build_router(AppState::new(store, settings));

    let address = format!("0.0.0.0:{}", settings.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Deal registry listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
