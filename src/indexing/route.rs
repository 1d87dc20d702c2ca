use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Select, Set,
    TransactionTrait,
};

use crate::entities::{city, vehicle, vehicle_route_stop};
use crate::error::AppResult;
use crate::utils::geo::{haversine_distance, BoundingBox};
use crate::utils::text::normalize_city_name;

use super::locks::lock_vehicle_index;
use super::routing_client::RoutingClient;

/// Padding around the route polyline when querying candidate cities.
const POLYLINE_PADDING_DEG: f64 = 0.1;

/// Cities lying within `snap_radius_km` of some vertex of `polyline`, in the
/// order the route passes them. Cities named like one of `endpoints`
/// (normalized) are left out; of a repeated name only the city closest to
/// the route is kept.
pub fn snap_polyline_to_cities<'a>(
    polyline: &[(f64, f64)],
    cities: &'a [city::Model],
    snap_radius_km: f64,
    endpoints: &[String],
) -> Vec<&'a city::Model> {
    let skip: HashSet<&str> = endpoints.iter().map(String::as_str).collect();
    let mut closest: HashMap<String, (usize, f64, &city::Model)> = HashMap::new();
    for c in cities {
        let Some((i, d)) = polyline
            .iter()
            .enumerate()
            .map(|(i, &(lat, lng))| (i, haversine_distance(lat, lng, c.latitude, c.longitude)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|&(_, d)| d <= snap_radius_km)
        else {
            continue;
        };
        let name = normalize_city_name(&c.city_name);
        if skip.contains(name.as_str()) {
            continue;
        }
        match closest.get(&name) {
            Some(&(_, best, _)) if best <= d => {}
            _ => {
                closest.insert(name, (i, d, c));
            }
        }
    }

    let mut snapped: Vec<_> = closest.into_values().collect();
    snapped.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    snapped.into_iter().map(|(_, _, c)| c).collect()
}

/// Recompute the ordered intermediate stops of `vehicle`.
///
/// A vehicle without cached endpoint coordinates ends up with no stops.
/// Returns the number of stops stored.
pub async fn rebuild_route(
    db: &DatabaseConnection,
    routing: &RoutingClient,
    vehicle: &vehicle::Model,
    snap_radius_km: f64,
) -> AppResult<usize> {
    let endpoints = match (
        vehicle.origin_lat.zip(vehicle.origin_lng),
        vehicle.destination_lat.zip(vehicle.destination_lng),
    ) {
        (Some(from), Some(to)) => Some((from, to)),
        _ => None,
    };

    let stops = match endpoints {
        Some((from, to)) => {
            let polyline = routing.driving_route(from, to).await?;
            let candidates = candidate_cities(db, &polyline).await?;
            let own = [
                normalize_city_name(&vehicle.origin_city),
                normalize_city_name(&vehicle.destination_city),
            ];
            snap_polyline_to_cities(&polyline, &candidates, snap_radius_km, &own)
                .into_iter()
                .enumerate()
                .map(|(i, c)| vehicle_route_stop::ActiveModel {
                    id: NotSet,
                    vehicle_id: Set(vehicle.id),
                    stop_number: Set(i as i32 + 1),
                    country: Set(c.country_code.clone()),
                    postcode: Set(c.zipcode.clone()),
                    city: Set(c.city_name.clone()),
                    latitude: Set(c.latitude),
                    longitude: Set(c.longitude),
                })
                .collect()
        }
        None => {
            tracing::warn!(vehicle_id = %vehicle.id, "Vehicle lacks endpoint coordinates, route not built");
            Vec::new()
        }
    };
    let count = stops.len();

    let txn = db.begin().await?;
    lock_vehicle_index(&txn, vehicle.id).await?;
    vehicle_route_stop::Entity::delete_many()
        .filter(vehicle_route_stop::Column::VehicleId.eq(vehicle.id))
        .exec(&txn)
        .await?;
    if !stops.is_empty() {
        vehicle_route_stop::Entity::insert_many(stops).exec(&txn).await?;
    }
    txn.commit().await?;

    tracing::info!(vehicle_id = %vehicle.id, stops = count, "Route index rebuilt");
    Ok(count)
}

async fn candidate_cities(db: &DatabaseConnection, polyline: &[(f64, f64)]) -> AppResult<Vec<city::Model>> {
    let Some(bbox) = BoundingBox::enclosing(polyline, POLYLINE_PADDING_DEG) else {
        return Ok(Vec::new());
    };
    Ok(candidate_query(&bbox).all(db).await?)
}

/// Every gazetteer city in the padded route box, whatever its country, so
/// transit countries get stops too.
fn candidate_query(bbox: &BoundingBox) -> Select<city::Entity> {
    city::Entity::find()
        .filter(city::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
        .filter(city::Column::Longitude.between(bbox.min_lng, bbox.max_lng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn city(id: i32, name: &str, lat: f64, lng: f64) -> city::Model {
        city::Model {
            id,
            city_name: name.into(),
            normalized_name: normalize_city_name(name),
            country_code: "PL".into(),
            zipcode: None,
            latitude: lat,
            longitude: lng,
            population: None,
        }
    }

    // Coarse Berlin -> Warsaw polyline
    fn polyline() -> Vec<(f64, f64)> {
        vec![
            (52.52, 13.40),
            (52.34, 14.55),
            (52.41, 16.93),
            (52.22, 18.25),
            (51.76, 19.46),
            (52.23, 21.01),
        ]
    }

    fn endpoints() -> Vec<String> {
        vec!["berlin".into(), "warsaw".into()]
    }

    #[test]
    fn test_cities_are_ordered_along_route() {
        let cities = vec![
            city(1, "Łódź", 51.7592, 19.4560),
            city(2, "Poznań", 52.4064, 16.9252),
            city(3, "Konin", 52.2230, 18.2511),
            city(4, "Frankfurt (Oder)", 52.3471, 14.5506),
        ];
        let snapped = snap_polyline_to_cities(&polyline(), &cities, 3.0, &endpoints());
        let names: Vec<_> = snapped.iter().map(|c| c.city_name.as_str()).collect();
        assert_eq!(names, ["Frankfurt (Oder)", "Poznań", "Konin", "Łódź"]);
    }

    #[test]
    fn test_far_cities_and_endpoints_are_dropped() {
        let cities = vec![
            city(1, "Berlin", 52.52, 13.40),
            city(2, "Gdańsk", 54.35, 18.65),
            city(3, "Poznań", 52.4064, 16.9252),
            city(4, "Warsaw", 52.23, 21.01),
        ];
        let snapped = snap_polyline_to_cities(&polyline(), &cities, 3.0, &endpoints());
        assert_eq!(snapped.len(), 1);
        assert_eq!(snapped[0].id, 3);
    }

    #[test]
    fn test_duplicate_names_keep_the_one_closest_to_route() {
        // Vertex (52.41, 16.93): id 2 lies about 0.2 km away, id 1 about 0.5 km
        let cities = vec![
            city(1, "Poznań", 52.4064, 16.9252),
            city(2, "Poznan", 52.4080, 16.9300),
        ];
        let snapped = snap_polyline_to_cities(&polyline(), &cities, 3.0, &endpoints());
        assert_eq!(snapped.len(), 1);
        assert_eq!(snapped[0].id, 2);

        let reversed: Vec<_> = cities.into_iter().rev().collect();
        let snapped = snap_polyline_to_cities(&polyline(), &reversed, 3.0, &endpoints());
        assert_eq!(snapped[0].id, 2);
    }

    #[test]
    fn test_transit_countries_are_candidates() {
        let bbox = BoundingBox::enclosing(&polyline(), POLYLINE_PADDING_DEG).unwrap();
        let sql = candidate_query(&bbox).build(DbBackend::Postgres).to_string();
        assert!(sql.contains("\"latitude\" BETWEEN"));
        assert!(!sql.contains("country_code\" IN"));

        // Budapest -> Berlin runs through Austria and Czechia
        let route = vec![(47.50, 19.04), (48.21, 16.37), (49.20, 16.61), (50.08, 14.44), (52.52, 13.40)];
        let mut transit = vec![city(1, "Wien", 48.2082, 16.3738), city(2, "Brno", 49.1951, 16.6068)];
        transit[0].country_code = "AT".into();
        transit[1].country_code = "CZ".into();
        let own = vec!["budapest".to_string(), "berlin".to_string()];
        let snapped = snap_polyline_to_cities(&route, &transit, 3.0, &own);
        let names: Vec<_> = snapped.iter().map(|c| c.city_name.as_str()).collect();
        assert_eq!(names, ["Wien", "Brno"]);
    }

    #[test]
    fn test_empty_polyline_snaps_nothing() {
        let cities = vec![city(1, "Poznań", 52.4064, 16.9252)];
        assert!(snap_polyline_to_cities(&[], &cities, 3.0, &endpoints()).is_empty());
    }
}
