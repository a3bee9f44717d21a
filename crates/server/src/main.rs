use std::{net::SocketAddr, sync::Arc};

use tracing::info;

mod config;
mod http;
mod site;

use config::load_settings;
use http::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let app = site::load_application(&settings.app_config)?;
    info!(
        id = %app.id(),
        base_path = %app.base_path().display(),
        routes = app.routes().routes.len(),
        "application loaded"
    );

    let state = AppState { app: Arc::new(app) };
    let router = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
