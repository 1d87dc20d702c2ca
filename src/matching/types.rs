use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{cargo, cargo_location, vehicle, vehicle_route_stop};
use crate::utils::text::{normalize_city_name, normalize_country_code};

/// A place as the matcher sees it: country + postcode + city, as entered.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRef {
    pub country: String,
    pub postcode: String,
    pub city: String,
}

impl PlaceRef {
    pub fn new(country: &str, postcode: Option<&str>, city: &str) -> Self {
        Self {
            country: country.to_string(),
            postcode: postcode.unwrap_or_default().to_string(),
            city: city.to_string(),
        }
    }

    /// Normalized city name; empty when the place has no usable city.
    pub fn city_key(&self) -> String {
        normalize_city_name(&self.city)
    }

    pub fn key(&self) -> PlaceKey {
        PlaceKey {
            country: normalize_country_code(&self.country),
            postcode: self.postcode.trim().to_string(),
            city: self.city_key(),
        }
    }
}

/// Lookup key of the nearby-city index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceKey {
    pub country: String,
    pub postcode: String,
    pub city: String,
}

impl PlaceKey {
    pub fn new(country: &str, postcode: &str, city: &str) -> Self {
        PlaceRef::new(country, Some(postcode), city).key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Nearby,
}

/// Descriptive fields copied into every match result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSummary {
    pub vehicle_id: Uuid,
    pub company: Option<String>,
    pub origin_country: String,
    pub origin_postcode: Option<String>,
    pub origin_city: String,
    pub destination_country: String,
    pub destination_postcode: Option<String>,
    pub destination_city: String,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    pub vehicle_type: String,
    pub structure: Option<String>,
    pub equipment: Option<String>,
    pub cargo_securement: Option<String>,
    pub description: Option<String>,
    pub capacity_tons: Option<f64>,
    pub volume_m3: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// Everything the engine needs to evaluate one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleProfile {
    pub id: Uuid,
    pub origin: PlaceRef,
    pub destination: PlaceRef,
    pub origin_radius_km: Option<f64>,
    pub destination_radius_km: Option<f64>,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    pub capacity_tons: Option<f64>,
    pub summary: VehicleSummary,
}

impl VehicleProfile {
    pub fn from_model(model: &vehicle::Model, company: Option<String>) -> Self {
        Self {
            id: model.id,
            origin: PlaceRef::new(
                &model.origin_country,
                model.origin_postcode.as_deref(),
                &model.origin_city,
            ),
            destination: PlaceRef::new(
                &model.destination_country,
                model.destination_postcode.as_deref(),
                &model.destination_city,
            ),
            origin_radius_km: model.origin_radius_km,
            destination_radius_km: model.destination_radius_km,
            available_from: model.available_from,
            available_until: model.available_until,
            capacity_tons: model.capacity_tons,
            summary: VehicleSummary {
                vehicle_id: model.id,
                company,
                origin_country: model.origin_country.clone(),
                origin_postcode: model.origin_postcode.clone(),
                origin_city: model.origin_city.clone(),
                destination_country: model.destination_country.clone(),
                destination_postcode: model.destination_postcode.clone(),
                destination_city: model.destination_city.clone(),
                available_from: model.available_from,
                available_until: model.available_until,
                vehicle_type: model.vehicle_type.clone(),
                structure: model.structure.clone(),
                equipment: model.equipment.clone(),
                cargo_securement: model.cargo_securement.clone(),
                description: model.description.clone(),
                capacity_tons: model.capacity_tons,
                volume_m3: model.volume_m3,
                price: model.price,
                currency: model.currency.clone(),
            },
        }
    }
}

impl From<&vehicle_route_stop::Model> for PlaceRef {
    fn from(stop: &vehicle_route_stop::Model) -> Self {
        PlaceRef::new(&stop.country, stop.postcode.as_deref(), &stop.city)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Pickup,
    Dropoff,
}

impl From<cargo_location::LocationKind> for StopKind {
    fn from(kind: cargo_location::LocationKind) -> Self {
        match kind {
            cargo_location::LocationKind::Pickup => StopKind::Pickup,
            cargo_location::LocationKind::Dropoff => StopKind::Dropoff,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CargoStop {
    pub sequence: i32,
    pub kind: StopKind,
    pub place: PlaceRef,
    pub start_date: Option<NaiveDate>,
}

impl From<&cargo_location::Model> for CargoStop {
    fn from(location: &cargo_location::Model) -> Self {
        Self {
            sequence: location.sequence,
            kind: location.kind.into(),
            place: PlaceRef::new(&location.country, location.postcode.as_deref(), &location.city),
            start_date: location.start_date,
        }
    }
}

/// A cargo reduced to what matching reads.
#[derive(Debug, Clone)]
pub struct CargoRequest {
    pub id: Uuid,
    pub weight_tons: Option<f64>,
    pub stops: Vec<CargoStop>,
}

impl CargoRequest {
    pub fn from_models(cargo: &cargo::Model, locations: &[cargo_location::Model]) -> Self {
        Self {
            id: cargo.id,
            weight_tons: cargo.weight,
            stops: locations.iter().map(CargoStop::from).collect(),
        }
    }

    /// First pickup by insertion sequence.
    ///
    /// Multi-pickup cargo is only partially modeled: the remaining pickups do
    /// not take part in matching.
    pub fn pickup(&self) -> Option<&CargoStop> {
        self.stops
            .iter()
            .filter(|s| s.kind == StopKind::Pickup)
            .min_by_key(|s| s.sequence)
    }

    /// Last dropoff by insertion sequence (the only one for single-drop cargo).
    pub fn dropoff(&self) -> Option<&CargoStop> {
        self.stops
            .iter()
            .filter(|s| s.kind == StopKind::Dropoff)
            .max_by_key(|s| s.sequence)
    }
}

/// One ranked candidate vehicle for a cargo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    #[serde(flatten)]
    pub vehicle: VehicleSummary,
    pub pickup_tier: MatchTier,
    pub dropoff_tier: MatchTier,
    pub score: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(sequence: i32, kind: StopKind, city: &str) -> CargoStop {
        CargoStop {
            sequence,
            kind,
            place: PlaceRef::new("PL", None, city),
            start_date: None,
        }
    }

    #[test]
    fn test_first_pickup_and_last_dropoff_by_sequence() {
        let cargo = CargoRequest {
            id: Uuid::new_v4(),
            weight_tons: None,
            stops: vec![
                stop(3, StopKind::Dropoff, "Warsaw"),
                stop(1, StopKind::Pickup, "Poznan"),
                stop(0, StopKind::Pickup, "Berlin"),
                stop(2, StopKind::Dropoff, "Lodz"),
            ],
        };

        assert_eq!(cargo.pickup().unwrap().place.city, "Berlin");
        assert_eq!(cargo.dropoff().unwrap().place.city, "Warsaw");
    }

    #[test]
    fn test_missing_kind_yields_none() {
        let cargo = CargoRequest {
            id: Uuid::new_v4(),
            weight_tons: None,
            stops: vec![stop(0, StopKind::Pickup, "Berlin")],
        };
        assert!(cargo.pickup().is_some());
        assert!(cargo.dropoff().is_none());
    }

    #[test]
    fn test_place_key_normalizes_every_part() {
        let key = PlaceRef::new(" pl", Some(" 61-001 "), "Poznań").key();
        assert_eq!(key, PlaceKey::new("PL", "61-001", "POZNAN"));
    }
}
