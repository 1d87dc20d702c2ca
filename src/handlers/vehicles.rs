use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{vehicle, vehicle_route_stop};
use crate::error::{AppError, AppResult};
use crate::gazetteer;
use crate::handlers::{ensure_company, ensure_owner};
use crate::utils::jwt::Claims;
use crate::utils::parse::lenient_f64;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceInput {
    pub country: String,
    pub postcode: Option<String>,
    pub city: String,
    /// Client-side geocode, used only when the gazetteer has no match.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleRequest {
    pub vehicle_type: String,
    pub structure: Option<String>,
    pub equipment: Option<String>,
    pub cargo_securement: Option<String>,
    pub description: Option<String>,
    pub load_type: Option<String>,
    #[serde(default)]
    pub palette_exchange: bool,
    #[serde(default)]
    pub oversize: bool,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub capacity_tons: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume_m3: Option<f64>,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub origin: PlaceInput,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub origin_radius_km: Option<f64>,
    pub destination: PlaceInput,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub destination_radius_km: Option<f64>,
}

impl VehicleRequest {
    fn validate(&self) -> AppResult<()> {
        if self.vehicle_type.trim().is_empty() {
            return Err(AppError::BadRequest("vehicle_type is required".to_string()));
        }
        for (side, place) in [("origin", &self.origin), ("destination", &self.destination)] {
            if place.country.trim().is_empty() || place.city.trim().is_empty() {
                return Err(AppError::BadRequest(format!(
                    "{side} needs a country and a city"
                )));
            }
        }
        for radius in [self.origin_radius_km, self.destination_radius_km].into_iter().flatten() {
            if radius < 0.0 {
                return Err(AppError::BadRequest("Radius cannot be negative".to_string()));
            }
        }
        if let (Some(from), Some(until)) = (self.available_from, self.available_until) {
            if until < from {
                return Err(AppError::BadRequest(
                    "available_until is before available_from".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: vehicle::Model,
    /// Intermediate stops in driving order.
    pub route: Vec<vehicle_route_stop::Model>,
}

/// Gazetteer coordinates first, then whatever the client sent
async fn locate(db: &DatabaseConnection, place: &PlaceInput) -> AppResult<(Option<f64>, Option<f64>)> {
    let found = gazetteer::resolve_place(db, &place.country, &place.city, place.postcode.as_deref()).await?;
    Ok(match found {
        Some(city) => (Some(city.latitude), Some(city.longitude)),
        None => (place.lat, place.lng),
    })
}

async fn apply_request(
    db: &DatabaseConnection,
    model: &mut vehicle::ActiveModel,
    req: VehicleRequest,
) -> AppResult<()> {
    let (origin_lat, origin_lng) = locate(db, &req.origin).await?;
    let (destination_lat, destination_lng) = locate(db, &req.destination).await?;

    model.vehicle_type = Set(req.vehicle_type.trim().to_string());
    model.structure = Set(req.structure);
    model.equipment = Set(req.equipment);
    model.cargo_securement = Set(req.cargo_securement);
    model.description = Set(req.description);
    model.load_type = Set(req.load_type);
    model.palette_exchange = Set(req.palette_exchange);
    model.oversize = Set(req.oversize);
    model.capacity_tons = Set(req.capacity_tons.filter(|c| *c > 0.0));
    model.volume_m3 = Set(req.volume_m3);
    model.available_from = Set(req.available_from);
    model.available_until = Set(req.available_until);
    model.price = Set(req.price);
    model.currency = Set(req.currency);

    model.origin_country = Set(req.origin.country.trim().to_uppercase());
    model.origin_postcode = Set(req.origin.postcode);
    model.origin_city = Set(req.origin.city.trim().to_string());
    model.origin_lat = Set(origin_lat);
    model.origin_lng = Set(origin_lng);
    model.origin_radius_km = Set(req.origin_radius_km);

    model.destination_country = Set(req.destination.country.trim().to_uppercase());
    model.destination_postcode = Set(req.destination.postcode);
    model.destination_city = Set(req.destination.city.trim().to_string());
    model.destination_lat = Set(destination_lat);
    model.destination_lng = Set(destination_lng);
    model.destination_radius_km = Set(req.destination_radius_km);
    Ok(())
}

async fn find_vehicle(db: &DatabaseConnection, id: Uuid) -> AppResult<vehicle::Model> {
    vehicle::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))
}

/// Post a vehicle for the caller's company; its indexes are built in the background
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VehicleRequest>,
) -> AppResult<(StatusCode, Json<VehicleResponse>)> {
    req.validate()?;
    ensure_company(&state.db, claims.company_id).await?;

    let mut model = vehicle::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_id: Set(claims.company_id),
        user_id: Set(Some(claims.sub)),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    apply_request(&state.db, &mut model, req).await?;

    let vehicle = model.insert(&state.db).await?;
    tracing::info!(vehicle_id = %vehicle.id, company_id = %vehicle.company_id, "Vehicle created");
    state.indexer.schedule(vehicle.id);

    Ok((
        StatusCode::CREATED,
        Json(VehicleResponse {
            vehicle,
            route: Vec::new(),
        }),
    ))
}

/// List the vehicles of the caller's company
pub async fn list_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::CompanyId.eq(claims.company_id))
        .order_by_desc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Vehicle with its indexed route
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VehicleResponse>> {
    let vehicle = find_vehicle(&state.db, id).await?;
    let route = vehicle_route_stop::Entity::find()
        .filter(vehicle_route_stop::Column::VehicleId.eq(id))
        .order_by_asc(vehicle_route_stop::Column::StopNumber)
        .all(&state.db)
        .await?;

    Ok(Json(VehicleResponse { vehicle, route }))
}

/// Edit a vehicle and re-index it
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<VehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    req.validate()?;
    let existing = find_vehicle(&state.db, id).await?;
    ensure_owner(&claims, existing.company_id)?;

    let mut model = existing.into_active_model();
    apply_request(&state.db, &mut model, req).await?;
    let vehicle = model.update(&state.db).await?;

    tracing::info!(vehicle_id = %id, "Vehicle updated");
    state.indexer.schedule(id);

    Ok(Json(vehicle))
}

/// Delete a vehicle; its route stops go with it
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let existing = find_vehicle(&state.db, id).await?;
    ensure_owner(&claims, existing.company_id)?;

    {
        let _guard = state.indexer.locks.acquire(id).await;
        vehicle::Entity::delete_by_id(id).exec(&state.db).await?;
    }
    state.indexer.locks.forget(id);

    tracing::info!(vehicle_id = %id, "Vehicle deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: serde_json::Value) -> VehicleRequest {
        serde_json::from_value(body).unwrap()
    }

    fn berlin_warsaw() -> serde_json::Value {
        serde_json::json!({
            "vehicle_type": "tautliner",
            "capacity_tons": "24",
            "available_from": "2025-01-01",
            "available_until": "2025-01-10",
            "origin": {"country": "DE", "city": "Berlin"},
            "origin_radius_km": 50,
            "destination": {"country": "PL", "postcode": "00-001", "city": "Warszawa"}
        })
    }

    #[test]
    fn test_valid_request() {
        let req = request(berlin_warsaw());
        assert!(req.validate().is_ok());
        assert_eq!(req.capacity_tons, Some(24.0));
        assert_eq!(req.origin_radius_km, Some(50.0));
        assert_eq!(req.destination_radius_km, None);
    }

    #[test]
    fn test_missing_city_is_rejected() {
        let mut body = berlin_warsaw();
        body["destination"]["city"] = serde_json::json!("  ");
        assert!(matches!(request(body).validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let mut body = berlin_warsaw();
        body["available_until"] = serde_json::json!("2024-12-31");
        assert!(request(body).validate().is_err());
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        let mut body = berlin_warsaw();
        body["origin_radius_km"] = serde_json::json!(-5);
        assert!(request(body).validate().is_err());
    }
}
