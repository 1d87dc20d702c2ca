use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{cargo, cargo_location, company, nearby_city, vehicle, vehicle_route_stop};
use crate::error::{AppError, AppResult};

use super::{CargoRequest, IndexSnapshot, MatchResult, MatchingEngine, VehicleProfile};

/// Ranked vehicles for a stored cargo.
pub async fn matches_for_cargo(
    db: &DatabaseConnection,
    engine: &MatchingEngine,
    cargo_id: Uuid,
) -> AppResult<Vec<MatchResult>> {
    let request = load_cargo_request(db, cargo_id).await?;

    let (Some(pickup), Some(dropoff)) = (request.pickup(), request.dropoff()) else {
        tracing::debug!(%cargo_id, "Cargo has incomplete locations, skipping match");
        return Ok(Vec::new());
    };
    let cities = [pickup.place.city_key(), dropoff.place.city_key()];

    let vehicles = load_vehicle_profiles(db).await?;
    let snapshot = load_snapshot(db, &cities).await?;

    Ok(engine.find_matches(&request, &vehicles, &snapshot))
}

pub async fn load_cargo_request(db: &DatabaseConnection, cargo_id: Uuid) -> AppResult<CargoRequest> {
    let cargo = cargo::Entity::find_by_id(cargo_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cargo not found".to_string()))?;

    let locations = cargo_location::Entity::find()
        .filter(cargo_location::Column::CargoId.eq(cargo_id))
        .order_by_asc(cargo_location::Column::Sequence)
        .all(db)
        .await?;

    Ok(CargoRequest::from_models(&cargo, &locations))
}

/// Every vehicle with its company name, oldest first.
pub async fn load_vehicle_profiles(db: &DatabaseConnection) -> AppResult<Vec<VehicleProfile>> {
    let rows = vehicle::Entity::find()
        .find_also_related(company::Entity)
        .order_by_asc(vehicle::Column::CreatedAt)
        .order_by_asc(vehicle::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .iter()
        .map(|(v, c)| VehicleProfile::from_model(v, c.as_ref().map(|c| c.name.clone())))
        .collect())
}

/// Route stops of all vehicles plus the nearby entries that mention one of
/// `cities` (normalized). Other nearby entries can never satisfy a lookup.
async fn load_snapshot(db: &DatabaseConnection, cities: &[String]) -> AppResult<IndexSnapshot> {
    let stops = vehicle_route_stop::Entity::find().all(db).await?;

    let wanted: Vec<&str> = cities
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty())
        .collect();
    let entries = if wanted.is_empty() {
        Vec::new()
    } else {
        nearby_city::Entity::find()
            .filter(nearby_city::Column::NormalizedName.is_in(wanted))
            .all(db)
            .await?
    };

    tracing::debug!(stops = stops.len(), nearby = entries.len(), "Loaded index snapshot");
    Ok(IndexSnapshot::from_rows(stops, entries))
}
