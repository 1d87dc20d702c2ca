use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::cargo_location::LocationKind;
use crate::entities::{cargo, cargo_location};
use crate::error::{AppError, AppResult};
use crate::gazetteer;
use crate::handlers::{ensure_company, ensure_owner};
use crate::utils::jwt::Claims;
use crate::utils::parse::lenient_f64;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub country: String,
    pub postcode: Option<String>,
    pub city: String,
    /// Show other companies only a nearby major city.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lng: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time_1: Option<NaiveTime>,
    pub start_time_2: Option<NaiveTime>,
    pub end_time_1: Option<NaiveTime>,
    pub end_time_2: Option<NaiveTime>,
}

#[derive(Debug, Deserialize)]
pub struct CargoRequest {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub size: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub vehicle_type: Option<String>,
    pub pickups: Vec<LocationInput>,
    pub dropoffs: Vec<LocationInput>,
}

impl CargoRequest {
    fn validate(&self) -> AppResult<()> {
        if self.pickups.is_empty() || self.dropoffs.is_empty() {
            return Err(AppError::BadRequest(
                "A cargo needs at least one pickup and one dropoff".to_string(),
            ));
        }
        let blank = self
            .pickups
            .iter()
            .chain(&self.dropoffs)
            .any(|l| l.country.trim().is_empty() || l.city.trim().is_empty());
        if blank {
            return Err(AppError::BadRequest(
                "Every location needs a country and a city".to_string(),
            ));
        }
        Ok(())
    }

    /// Locations in insertion order: pickups, then dropoffs.
    fn sequenced(&self) -> impl Iterator<Item = (i32, LocationKind, &LocationInput)> {
        self.pickups
            .iter()
            .map(|l| (LocationKind::Pickup, l))
            .chain(self.dropoffs.iter().map(|l| (LocationKind::Dropoff, l)))
            .enumerate()
            .map(|(i, (kind, l))| (i as i32, kind, l))
    }
}

#[derive(Debug, Serialize)]
pub struct CargoResponse {
    #[serde(flatten)]
    pub cargo: cargo::Model,
    pub locations: Vec<cargo_location::Model>,
}

/// What a company other than the owner may see of a location.
fn public_view(mut location: cargo_location::Model) -> cargo_location::Model {
    if location.is_hidden {
        if let Some(masked) = location.masked_city.clone() {
            location.city = masked;
        }
        location.postcode = location.masked_postcode.clone();
        location.latitude = None;
        location.longitude = None;
    }
    location
}

fn apply_fields(model: &mut cargo::ActiveModel, req: &CargoRequest) {
    model.weight = Set(req.weight.filter(|w| *w > 0.0));
    model.size = Set(req.size);
    model.price = Set(req.price);
    model.currency = Set(req.currency.clone());
    model.description = Set(req.description.clone());
    model.vehicle_type = Set(req.vehicle_type.clone());
}

/// Location rows of `req`, hidden ones masked and every one geocoded.
async fn build_locations(
    db: &DatabaseConnection,
    cargo_id: Uuid,
    req: &CargoRequest,
) -> AppResult<Vec<cargo_location::ActiveModel>> {
    let mut locations = Vec::new();
    for (sequence, kind, input) in req.sequenced() {
        let (masked_city, masked_postcode) = if input.hidden {
            gazetteer::mask_place(db, &input.country, &input.city).await?
        } else {
            (input.city.clone(), input.postcode.clone())
        };

        // Hidden locations are geocoded at their stand-in city
        let found =
            gazetteer::resolve_place(db, &input.country, &masked_city, masked_postcode.as_deref())
                .await?;
        let (latitude, longitude) = match found {
            Some(city) => (Some(city.latitude), Some(city.longitude)),
            None => (input.lat, input.lng),
        };

        locations.push(cargo_location::ActiveModel {
            id: NotSet,
            cargo_id: Set(cargo_id),
            sequence: Set(sequence),
            kind: Set(kind),
            country: Set(input.country.trim().to_uppercase()),
            postcode: Set(input.postcode.clone()),
            city: Set(input.city.trim().to_string()),
            is_hidden: Set(input.hidden),
            masked_city: Set(Some(masked_city)),
            masked_postcode: Set(masked_postcode),
            latitude: Set(latitude),
            longitude: Set(longitude),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            start_time_1: Set(input.start_time_1),
            start_time_2: Set(input.start_time_2),
            end_time_1: Set(input.end_time_1),
            end_time_2: Set(input.end_time_2),
        });
    }
    Ok(locations)
}

async fn find_cargo(db: &DatabaseConnection, id: Uuid) -> AppResult<cargo::Model> {
    cargo::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cargo not found".to_string()))
}

/// Post a cargo with its pickup and dropoff locations
pub async fn create_cargo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CargoRequest>,
) -> AppResult<(StatusCode, Json<CargoResponse>)> {
    req.validate()?;
    ensure_company(&state.db, claims.company_id).await?;

    let cargo_id = Uuid::new_v4();
    let locations = build_locations(&state.db, cargo_id, &req).await?;

    let mut model = cargo::ActiveModel {
        id: Set(cargo_id),
        company_id: Set(claims.company_id),
        user_id: Set(claims.sub),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    apply_fields(&mut model, &req);

    let txn = state.db.begin().await?;
    let cargo = model.insert(&txn).await?;
    let mut stored = Vec::with_capacity(locations.len());
    for location in locations {
        stored.push(location.insert(&txn).await?);
    }
    txn.commit().await?;

    tracing::info!(cargo_id = %cargo.id, locations = stored.len(), "Cargo created");
    Ok((
        StatusCode::CREATED,
        Json(CargoResponse {
            cargo,
            locations: stored,
        }),
    ))
}

/// List the cargos of the caller's company
pub async fn list_cargos(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<cargo::Model>>> {
    let cargos = cargo::Entity::find()
        .filter(cargo::Column::CompanyId.eq(claims.company_id))
        .order_by_desc(cargo::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(cargos))
}

/// Edit a cargo; its locations are replaced and hidden ones masked again
pub async fn update_cargo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CargoRequest>,
) -> AppResult<Json<CargoResponse>> {
    req.validate()?;
    let existing = find_cargo(&state.db, id).await?;
    ensure_owner(&claims, existing.company_id)?;

    let locations = build_locations(&state.db, id, &req).await?;
    let mut model = existing.into_active_model();
    apply_fields(&mut model, &req);

    let txn = state.db.begin().await?;
    let cargo = model.update(&txn).await?;
    cargo_location::Entity::delete_many()
        .filter(cargo_location::Column::CargoId.eq(id))
        .exec(&txn)
        .await?;
    let mut stored = Vec::with_capacity(locations.len());
    for location in locations {
        stored.push(location.insert(&txn).await?);
    }
    txn.commit().await?;

    tracing::info!(cargo_id = %id, locations = stored.len(), "Cargo updated");
    Ok(Json(CargoResponse {
        cargo,
        locations: stored,
    }))
}

/// Cargo with its locations; hidden ones are masked for other companies
pub async fn get_cargo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CargoResponse>> {
    let cargo = find_cargo(&state.db, id).await?;

    let mut locations = cargo_location::Entity::find()
        .filter(cargo_location::Column::CargoId.eq(id))
        .order_by_asc(cargo_location::Column::Sequence)
        .all(&state.db)
        .await?;

    if ensure_owner(&claims, cargo.company_id).is_err() {
        locations = locations.into_iter().map(public_view).collect();
    }

    Ok(Json(CargoResponse { cargo, locations }))
}

/// Delete a cargo with its locations
pub async fn delete_cargo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let cargo = find_cargo(&state.db, id).await?;
    ensure_owner(&claims, cargo.company_id)?;

    cargo::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(cargo_id = %id, "Cargo deleted");
    Ok(StatusCode::NO_CONTENT)
}
