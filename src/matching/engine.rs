use chrono::NaiveDate;

use super::index::GeoIndex;
use super::scoring::ScoreWeights;
use super::types::{CargoRequest, MatchResult, MatchTier, PlaceRef, VehicleProfile};

/// Ranks vehicles for a cargo by route geography, time fit and capacity fit.
///
/// Pure over its inputs: no writes, no shared state, safe to run for many
/// cargos at once.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    weights: ScoreWeights,
}

/// The cargo endpoints and facts every vehicle is scored against.
struct CargoProbe {
    pickup_city: String,
    dropoff_city: String,
    pickup_date: Option<NaiveDate>,
    weight_tons: Option<f64>,
}

impl MatchingEngine {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Every vehicle able to carry `cargo`, best score first.
    ///
    /// A cargo without a pickup or a dropoff has no matches. Ties keep the
    /// order of `vehicles`.
    pub fn find_matches<I>(
        &self,
        cargo: &CargoRequest,
        vehicles: &[VehicleProfile],
        index: &I,
    ) -> Vec<MatchResult>
    where
        I: GeoIndex + ?Sized,
    {
        let (Some(pickup), Some(dropoff)) = (cargo.pickup(), cargo.dropoff()) else {
            tracing::debug!(cargo_id = %cargo.id, "Cargo lacks a pickup or dropoff, no matches");
            return Vec::new();
        };

        let probe = CargoProbe {
            pickup_city: pickup.place.city_key(),
            dropoff_city: dropoff.place.city_key(),
            pickup_date: pickup.start_date,
            weight_tons: cargo.weight_tons,
        };

        let mut matches: Vec<MatchResult> = vehicles
            .iter()
            .filter_map(|vehicle| self.evaluate(vehicle, &probe, index))
            .collect();

        // Stable: equal scores keep vehicle order
        matches.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::debug!(
            cargo_id = %cargo.id,
            candidates = vehicles.len(),
            matched = matches.len(),
            "Matching finished"
        );
        matches
    }

    fn evaluate<I>(&self, vehicle: &VehicleProfile, probe: &CargoProbe, index: &I) -> Option<MatchResult>
    where
        I: GeoIndex + ?Sized,
    {
        let route = full_route(vehicle, index);
        let route_cities: Vec<String> = route.iter().map(|place| place.city_key()).collect();

        let pickup_tier = reachability(
            &route,
            &route_cities,
            &probe.pickup_city,
            vehicle.origin_radius_km,
            index,
        );
        let dropoff_tier = reachability(
            &route,
            &route_cities,
            &probe.dropoff_city,
            vehicle.destination_radius_km,
            index,
        );

        let (Some(pickup_tier), Some(dropoff_tier)) = (pickup_tier, dropoff_tier) else {
            tracing::debug!(vehicle_id = %vehicle.id, "Rejected: cargo endpoints not on route");
            return None;
        };

        // Nearby endpoints may not appear on the route verbatim; direction is
        // only enforced when both are exact.
        if pickup_tier == MatchTier::Exact && dropoff_tier == MatchTier::Exact {
            let pickup_at = route_cities.iter().position(|c| *c == probe.pickup_city)?;
            let dropoff_at = route_cities.iter().position(|c| *c == probe.dropoff_city)?;
            if pickup_at >= dropoff_at {
                tracing::debug!(vehicle_id = %vehicle.id, "Rejected: cargo runs against route direction");
                return None;
            }
        }

        let location = self.weights.location(pickup_tier) + self.weights.location(dropoff_tier);
        let time = self.weights.time(
            vehicle.available_from,
            vehicle.available_until,
            probe.pickup_date,
        );
        let capacity = self.weights.capacity(vehicle.capacity_tons, probe.weight_tons);

        Some(MatchResult {
            vehicle: vehicle.summary.clone(),
            pickup_tier,
            dropoff_tier,
            score: location + time + capacity,
        })
    }
}

/// `[origin, stop_1 .. stop_N, destination]`
fn full_route<'a, I>(vehicle: &'a VehicleProfile, index: &'a I) -> Vec<&'a PlaceRef>
where
    I: GeoIndex + ?Sized,
{
    std::iter::once(&vehicle.origin)
        .chain(index.route_stops(vehicle.id))
        .chain(std::iter::once(&vehicle.destination))
        .collect()
}

/// How `city` is reached by a route, if at all.
///
/// Exact when it is a route member; nearby when the vehicle accepts a detour
/// and the nearby index lists it within `radius_km` of some route member.
fn reachability<I>(
    route: &[&PlaceRef],
    route_cities: &[String],
    city: &str,
    radius_km: Option<f64>,
    index: &I,
) -> Option<MatchTier>
where
    I: GeoIndex + ?Sized,
{
    if city.is_empty() {
        return None;
    }
    if route_cities.iter().any(|c| c == city) {
        return Some(MatchTier::Exact);
    }

    let radius_km = radius_km.filter(|r| r.is_finite() && *r > 0.0)?;

    route
        .iter()
        .map(|member| member.key())
        .filter(|key| !key.city.is_empty())
        .any(|key| {
            index
                .nearby(&key)
                .iter()
                .any(|hit| hit.city == city && hit.distance_km <= radius_km)
        })
        .then_some(MatchTier::Nearby)
}
