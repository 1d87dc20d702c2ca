use std::collections::HashMap;

use uuid::Uuid;

use crate::entities::{nearby_city, vehicle_route_stop};
use crate::utils::text::normalize_city_name;

use super::types::{PlaceKey, PlaceRef};

/// A city cached as lying near some reference place.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyHit {
    /// Normalized city name.
    pub city: String,
    pub distance_km: f64,
}

/// Read-only view of the route and nearby-city indexes.
pub trait GeoIndex {
    /// Intermediate stops of a vehicle in `stop_number` order, endpoints excluded.
    fn route_stops(&self, vehicle_id: Uuid) -> &[PlaceRef];

    /// Cities cached around `reference`, whatever radius they were indexed with.
    fn nearby(&self, reference: &PlaceKey) -> &[NearbyHit];
}

/// In-memory copy of both indexes, loaded once per match query.
#[derive(Debug, Default, Clone)]
pub struct IndexSnapshot {
    routes: HashMap<Uuid, Vec<PlaceRef>>,
    nearby: HashMap<PlaceKey, Vec<NearbyHit>>,
}

impl IndexSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(
        mut stops: Vec<vehicle_route_stop::Model>,
        entries: Vec<nearby_city::Model>,
    ) -> Self {
        stops.sort_by_key(|s| (s.vehicle_id, s.stop_number));

        let mut snapshot = Self::new();
        for stop in &stops {
            snapshot
                .routes
                .entry(stop.vehicle_id)
                .or_default()
                .push(PlaceRef::from(stop));
        }
        for entry in entries {
            let reference = PlaceKey::new(
                &entry.reference_country,
                &entry.reference_postcode,
                &entry.reference_city,
            );
            snapshot.insert_nearby(reference, &entry.normalized_name, entry.distance_km);
        }
        snapshot
    }

    /// Replace the intermediate stops of a vehicle. `stops` must already be in
    /// traversal order.
    pub fn with_route(mut self, vehicle_id: Uuid, stops: Vec<PlaceRef>) -> Self {
        self.routes.insert(vehicle_id, stops);
        self
    }

    pub fn with_nearby(mut self, reference: PlaceKey, city: &str, distance_km: f64) -> Self {
        self.insert_nearby(reference, city, distance_km);
        self
    }

    fn insert_nearby(&mut self, reference: PlaceKey, city: &str, distance_km: f64) {
        self.nearby.entry(reference).or_default().push(NearbyHit {
            city: normalize_city_name(city),
            distance_km,
        });
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}

impl GeoIndex for IndexSnapshot {
    fn route_stops(&self, vehicle_id: Uuid) -> &[PlaceRef] {
        self.routes.get(&vehicle_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn nearby(&self, reference: &PlaceKey) -> &[NearbyHit] {
        self.nearby.get(reference).map(Vec::as_slice).unwrap_or(&[])
    }
}
