pub mod dashboards;
pub mod handlers;
pub mod routes;
pub mod shared;
pub mod system;

use std::sync::Arc;

use dashboards::d402_inventory_overview::service::InventoryOverviewService;
use dashboards::d402_inventory_overview::state::DashboardState;
use system::tasks::refresh_worker::RefreshWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::http::{header, Method};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};

    system::tracing::initialize()?;

    let config = shared::config::load_config()?;
    let source = shared::export_source::from_config(&config.source)?;

    let state = Arc::new(DashboardState::new());
    let service = Arc::new(InventoryOverviewService::new(source, state, &config));

    let worker = RefreshWorker::new(Arc::clone(&service), config.refresh.interval_seconds);
    tokio::spawn(async move { worker.run_loop().await });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = routes::configure_routes(service, &config.server.static_dir).layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    addr.port()
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", addr.port(), e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
