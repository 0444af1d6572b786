// src/cli/serve.rs

use std::sync::Arc;
use tracing::{info, warn};

use crate::server;
use crate::settings::Settings;
use crate::sheets::{GoogleSheetsClient, SheetResult};

pub async fn run(port: Option<u16>) -> SheetResult<()> {
    let mut settings = Settings::from_env()?;
    if let Some(port) = port {
        settings.port = port;
    }

    let client = Arc::new(GoogleSheetsClient::new(&settings)?);
    match client.initialize().await {
        Ok(()) => {}
        Err(e) if e.is_configuration() => return Err(e),
        Err(e) => warn!("Google Sheets not reachable yet, retrying on first request: {}", e),
    }

    server::start_server(client.clone(), &settings).await?;

    if let Ok(client) = Arc::try_unwrap(client) {
        client.close();
    }
    info!("Server stopped");
    Ok(())
}
