//! Offline indexes behind matching: ordered route stops and nearby cities.

mod locks;
pub mod nearby;
pub mod route;
mod routing_client;

use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::vehicle;
use crate::error::{AppError, AppResult};

pub use locks::IndexLocks;
pub use routing_client::RoutingClient;

/// Everything an index job needs, cheap to clone into a background task.
#[derive(Clone)]
pub struct Indexer {
    pub db: DatabaseConnection,
    pub routing: RoutingClient,
    pub locks: IndexLocks,
    pub snap_radius_km: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct RebuildReport {
    pub vehicles: usize,
    pub failed: usize,
    pub route_stops: usize,
    pub nearby_entries: usize,
}

impl Indexer {
    /// Route first, then nearby cities, holding the vehicle's index lock.
    pub async fn reindex_vehicle(&self, vehicle_id: Uuid) -> AppResult<(usize, usize)> {
        let _guard = self.locks.acquire(vehicle_id).await;

        // Re-read under the lock so the latest edit is indexed
        let vehicle = vehicle::Entity::find_by_id(vehicle_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

        let stops = route::rebuild_route(&self.db, &self.routing, &vehicle, self.snap_radius_km).await?;
        let entries = nearby::rebuild_nearby(&self.db, &vehicle).await?;
        Ok((stops, entries))
    }

    /// Fire-and-forget re-index after a vehicle was saved.
    pub fn schedule(&self, vehicle_id: Uuid) {
        let indexer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = indexer.reindex_vehicle(vehicle_id).await {
                tracing::warn!(%vehicle_id, error = %e, "Background re-index failed");
            }
        });
    }

    /// Re-index every vehicle one after another. A failing vehicle is logged
    /// and counted, the rest still run.
    pub async fn rebuild_all(&self) -> AppResult<RebuildReport> {
        let ids: Vec<Uuid> = vehicle::Entity::find()
            .order_by_asc(vehicle::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();

        tracing::info!(vehicles = ids.len(), "Rebuilding all indexes");
        let mut report = RebuildReport::default();
        for id in ids {
            report.vehicles += 1;
            match self.reindex_vehicle(id).await {
                Ok((stops, entries)) => {
                    report.route_stops += stops;
                    report.nearby_entries += entries;
                }
                Err(e) => {
                    tracing::warn!(vehicle_id = %id, error = %e, "Re-index failed, continuing");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(?report, "Index rebuild finished");
        Ok(report)
    }
}
