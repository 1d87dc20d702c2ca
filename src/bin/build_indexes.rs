//! Rebuild route and nearby-city indexes for every vehicle, or for the
//! vehicle ids given as arguments.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use freight_match_backend::{config::Config, db, AppResult, AppState};

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freight_match_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let db = db::connect(&config).await?;
    let state = AppState::new(db, config)?;

    let ids = std::env::args()
        .skip(1)
        .map(|arg| {
            Uuid::parse_str(&arg)
                .map_err(|e| freight_match_backend::AppError::BadRequest(format!("{arg}: {e}")))
        })
        .collect::<AppResult<Vec<_>>>()?;

    if ids.is_empty() {
        let report = state.indexer.rebuild_all().await?;
        tracing::info!(
            vehicles = report.vehicles,
            failed = report.failed,
            route_stops = report.route_stops,
            nearby_entries = report.nearby_entries,
            "Done"
        );
    } else {
        for id in ids {
            let (stops, entries) = state.indexer.reindex_vehicle(id).await?;
            tracing::info!(vehicle_id = %id, stops, entries, "Vehicle re-indexed");
        }
    }
    Ok(())
}
