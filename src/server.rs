use crate::config::AppConfig;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

pub struct AppState {
    pub records: Vec<serde_json::Value>,
    pub region_column: String,
}

#[derive(Deserialize)]
pub struct QueryParams {
    region: String,
}

/// Serve the generated artifacts: charts and combined datasets under
/// `/output`, plus a JSON query endpoint for a single region's rows.
pub async fn start_server(config: AppConfig) -> Result<()> {
    let json_path = config
        .output
        .root
        .join(format!("{}.json", config.output.name));
    let content = std::fs::read_to_string(&json_path).with_context(|| {
        format!(
            "Failed to read combined dataset {:?} (run the forecast first)",
            json_path
        )
    })?;
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&content).with_context(|| "Failed to parse combined dataset")?;
    info!(records = records.len(), "loaded combined dataset");

    let state = Arc::new(AppState {
        records,
        region_column: config.input.region_column.clone(),
    });

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let app = Router::new()
        .route("/api/forecast", get(forecast_handler))
        .nest_service("/output", ServeDir::new(&config.output.root))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn forecast_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Vec<serde_json::Value>> {
    let matches = state
        .records
        .iter()
        .filter(|record| {
            record
                .get(&state.region_column)
                .and_then(|value| value.as_str())
                == Some(params.region.as_str())
        })
        .cloned()
        .collect();
    Json(matches)
}
