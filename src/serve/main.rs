//! Zone data server.
//!
//! Serves the crime-zone dataset to map clients and answers point lookups
//! for the nearest locality.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use zonewatch::dataset::{CrimeInfo, ZoneDataset};
use zonewatch::Coordinate;

#[derive(Parser, Debug)]
#[command(name = "zone-server")]
#[command(about = "Crime zone data server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    listen: String,

    /// Zone dataset (CSV)
    #[arg(short, long, default_value = "raipur_localities_crime.csv")]
    data: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Application state shared across handlers
struct AppState {
    dataset: ZoneDataset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Zonewatch Zone Server");
    let dataset = ZoneDataset::load(&args.data)?;
    if dataset.zones().is_empty() {
        anyhow::bail!("Dataset {} contains no zones", args.data.display());
    }
    info!(
        "Serving {} zones (max rate {} per 100k)",
        dataset.zones().len(),
        dataset.max_crime_rate()
    );

    let state = Arc::new(AppState { dataset });
    let app = router(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/zones", get(zones_handler))
        .route("/crime-info", get(crime_info_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        zones: state.dataset.zones().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    zones: usize,
}

/// Full zone set
async fn zones_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.dataset.zones()).into_response()
}

/// Kept as text so a non-numeric value gets the same JSON error as a
/// missing one
#[derive(Deserialize)]
struct CrimeInfoParams {
    lat: Option<String>,
    lon: Option<String>,
}

fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Nearest locality to a point, within one kilometre
async fn crime_info_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CrimeInfoParams>,
) -> Result<Json<CrimeInfo>, (StatusCode, Json<serde_json::Value>)> {
    let lat = parse_coordinate(params.lat.as_deref());
    let lon = parse_coordinate(params.lon.as_deref());
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return Err(error_body(StatusCode::BAD_REQUEST, "lat and lon required"));
    };

    let point = Coordinate::new(lat, lon);
    if !point.is_valid() {
        return Err(error_body(StatusCode::BAD_REQUEST, "lat and lon out of range"));
    }

    match state.dataset.crime_info(&point) {
        Some(info) => {
            debug!(%point, locality = %info.locality, distance_km = info.distance_km, "Crime info");
            Ok(Json(info))
        }
        None => Err(error_body(StatusCode::NOT_FOUND, "No data available")),
    }
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(json!({ "error": message })))
}
