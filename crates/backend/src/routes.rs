use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::dashboards::d402_inventory_overview::service::InventoryOverviewService;
use crate::{handlers, system};

/// Конфигурация всех роутов приложения
pub fn configure_routes(service: Arc<InventoryOverviewService>, static_dir: &str) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // D402 Inventory overview
        .route(
            "/api/d402/inventory-overview",
            get(handlers::d402_inventory_overview::get_overview),
        )
        .route(
            "/api/d402/inventory-overview/movements",
            get(handlers::d402_inventory_overview::list_movements),
        )
        .route(
            "/api/d402/inventory-overview/rejected",
            get(handlers::d402_inventory_overview::list_rejected),
        )
        .route(
            "/api/d402/inventory-overview/refresh",
            post(handlers::d402_inventory_overview::refresh),
        )
        .with_state(service)
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(
            system::middleware::request_logger::request_logger,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d402_inventory_overview::state::DashboardState;
    use crate::shared::config::parse_config;
    use crate::shared::export_source::FileExportSource;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use contracts::dashboards::d402_inventory_overview::{
        InventoryOverviewResponse, MovementRow, RefreshResponse, RefreshStatus,
    };
    use tower::ServiceExt;

    const EXPORT: &str = "RFIDDatestamp,UID,category,Mode,StockLevel_Cat1,StockLevel_Cat2,HistorialDates,ForecastDates,HistoricalDataCat1,HistoricalDataCat2,ForecastDataCat1,ForecastDataCat2
01/03/2024 08:00:00,TAG-1,1,1,60,70,1/1/2024,1/2/2024,500,300,400,250
01/03/2024 09:00:00,TAG-2,2,0,,,1/2/2024,1/3/2024,450,280,420,260
";

    fn write_export(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.csv", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn app_for(path: &std::path::Path) -> Router {
        let config = parse_config(&format!(
            "[source]\npath = \"{}\"\n\n[dashboard]\ntracked_category_count = 2\n",
            path.display()
        ))
        .unwrap();
        let service = Arc::new(InventoryOverviewService::new(
            Arc::new(FileExportSource::new(path)),
            Arc::new(DashboardState::new()),
            &config,
        ));
        configure_routes(service, "dist")
    }

    async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health() {
        let path = write_export("d402-routes-health", EXPORT);
        let app = app_for(&path);
        let (status, body) = send(&app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn overview_unavailable_before_first_refresh() {
        let path = write_export("d402-routes-empty", EXPORT);
        let app = app_for(&path);
        let (status, _) = send(&app, "GET", "/api/d402/inventory-overview").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn refresh_then_read() {
        let path = write_export("d402-routes-refresh", EXPORT);
        let app = app_for(&path);

        let (status, body) = send(&app, "POST", "/api/d402/inventory-overview/refresh").await;
        assert_eq!(status, StatusCode::OK);
        let refresh: RefreshResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(refresh.status, RefreshStatus::Completed);

        let (status, body) = send(&app, "GET", "/api/d402/inventory-overview").await;
        assert_eq!(status, StatusCode::OK);
        let overview: InventoryOverviewResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(overview.movements.len(), 2);
        assert_eq!(overview.stock_levels.len(), 2);
        assert_eq!(overview.stock_levels[0].level, Some(60));
        assert_eq!(overview.planning.len(), 2);

        let (status, body) =
            send(&app, "GET", "/api/d402/inventory-overview/movements?category=2").await;
        assert_eq!(status, StatusCode::OK);
        let rows: Vec<MovementRow> = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].tag_id, "TAG-2");

        let (status, body) = send(&app, "GET", "/api/d402/inventory-overview/rejected").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn refresh_failure_is_reported() {
        let path = std::env::temp_dir().join("d402-routes-missing-export.csv");
        let app = app_for(&path);

        let (status, body) = send(&app, "POST", "/api/d402/inventory-overview/refresh").await;
        assert_eq!(status, StatusCode::OK);
        let refresh: RefreshResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(refresh.status, RefreshStatus::Failed);
        assert!(refresh.message.is_some());
    }
}
