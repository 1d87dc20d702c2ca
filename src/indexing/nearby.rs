use std::collections::HashMap;

use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveValue::NotSet,
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Insert, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};

use crate::entities::{city, nearby_city, vehicle, vehicle_route_stop};
use crate::error::AppResult;
use crate::gazetteer;
use crate::matching::{PlaceKey, PlaceRef};
use crate::utils::geo::{haversine_distance, BoundingBox};
use crate::utils::text::normalize_city_name;

use super::locks::lock_vehicle_index;

/// A member of a vehicle's full route with its cached coordinates, if any.
#[derive(Debug, Clone)]
struct RouteMember {
    place: PlaceRef,
    coords: Option<(f64, f64)>,
}

/// Cities found around one reference place for one radius.
struct ReferenceScan {
    key: PlaceKey,
    radius_km: f64,
    hits: Vec<(city::Model, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Insert,
    ShrinkRadius,
    Keep,
}

/// What to do with a `(reference, city)` pair found at `radius_km`, given the
/// radius already stored for it.
pub fn upsert_action(stored_radius_km: Option<f64>, radius_km: f64) -> UpsertAction {
    match stored_radius_km {
        None => UpsertAction::Insert,
        Some(stored) if radius_km < stored => UpsertAction::ShrinkRadius,
        Some(_) => UpsertAction::Keep,
    }
}

/// Gazetteer rows within `radius_km` of `(lat, lng)`, nearest first.
pub fn nearby_candidates(
    lat: f64,
    lng: f64,
    radius_km: f64,
    cities: Vec<city::Model>,
) -> Vec<(city::Model, f64)> {
    let bbox = BoundingBox::around(lat, lng, radius_km);
    let mut hits: Vec<(city::Model, f64)> = cities
        .into_iter()
        .filter(|c| bbox.contains(c.latitude, c.longitude))
        .map(|c| {
            let d = haversine_distance(lat, lng, c.latitude, c.longitude);
            (c, d)
        })
        .filter(|(_, d)| *d <= radius_km)
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1));
    hits
}

fn route_members(vehicle: &vehicle::Model, stops: &[vehicle_route_stop::Model]) -> Vec<RouteMember> {
    let origin = RouteMember {
        place: PlaceRef::new(
            &vehicle.origin_country,
            vehicle.origin_postcode.as_deref(),
            &vehicle.origin_city,
        ),
        coords: vehicle.origin_lat.zip(vehicle.origin_lng),
    };
    let destination = RouteMember {
        place: PlaceRef::new(
            &vehicle.destination_country,
            vehicle.destination_postcode.as_deref(),
            &vehicle.destination_city,
        ),
        coords: vehicle.destination_lat.zip(vehicle.destination_lng),
    };

    std::iter::once(origin)
        .chain(stops.iter().map(|s| RouteMember {
            place: PlaceRef::from(s),
            coords: Some((s.latitude, s.longitude)),
        }))
        .chain(std::iter::once(destination))
        .collect()
}

/// Distinct positive detour radii of a vehicle.
fn detour_radii(vehicle: &vehicle::Model) -> Vec<f64> {
    let mut radii: Vec<f64> = [vehicle.origin_radius_km, vehicle.destination_radius_km]
        .into_iter()
        .flatten()
        .filter(|r| r.is_finite() && *r > 0.0)
        .collect();
    radii.sort_by(f64::total_cmp);
    radii.dedup();
    radii
}

/// Index the cities around every member of the vehicle's route, for each of
/// its detour radii. Returns the number of entries inserted or shrunk.
pub async fn rebuild_nearby(db: &DatabaseConnection, vehicle: &vehicle::Model) -> AppResult<usize> {
    let radii = detour_radii(vehicle);
    if radii.is_empty() {
        tracing::debug!(vehicle_id = %vehicle.id, "No detour radius, nearby index untouched");
        return Ok(0);
    }

    let stops = vehicle_route_stop::Entity::find()
        .filter(vehicle_route_stop::Column::VehicleId.eq(vehicle.id))
        .order_by_asc(vehicle_route_stop::Column::StopNumber)
        .all(db)
        .await?;

    let mut scans = Vec::new();
    for member in route_members(vehicle, &stops) {
        let key = member.place.key();
        if key.city.is_empty() {
            continue;
        }
        let Some((lat, lng)) = member_coords(db, &member).await? else {
            tracing::warn!(vehicle_id = %vehicle.id, city = %member.place.city, "No coordinates for route member, skipped");
            continue;
        };
        let widest = radii.last().copied().unwrap_or_default();
        let found = cities_around(db, &key.country, lat, lng, widest).await?;

        for &radius_km in &radii {
            let hits = nearby_candidates(lat, lng, radius_km, found.clone());
            scans.push(ReferenceScan { key: key.clone(), radius_km, hits });
        }
    }

    let txn = db.begin().await?;
    lock_vehicle_index(&txn, vehicle.id).await?;
    let mut written = 0;
    for scan in &scans {
        written += store_scan(&txn, scan).await?;
    }
    txn.commit().await?;

    tracing::info!(vehicle_id = %vehicle.id, references = scans.len(), written, "Nearby index rebuilt");
    Ok(written)
}

async fn member_coords(db: &DatabaseConnection, member: &RouteMember) -> AppResult<Option<(f64, f64)>> {
    if member.coords.is_some() {
        return Ok(member.coords);
    }
    let place = &member.place;
    let postcode = Some(place.postcode.as_str()).filter(|p| !p.is_empty());
    Ok(gazetteer::resolve_place(db, &place.country, &place.city, postcode)
        .await?
        .map(|c| (c.latitude, c.longitude)))
}

async fn cities_around(
    db: &DatabaseConnection,
    country: &str,
    lat: f64,
    lng: f64,
    radius_km: f64,
) -> AppResult<Vec<city::Model>> {
    let bbox = BoundingBox::around(lat, lng, radius_km);
    let cities = city::Entity::find()
        .filter(city::Column::CountryCode.eq(country))
        .filter(city::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
        .filter(city::Column::Longitude.between(bbox.min_lng, bbox.max_lng))
        .all(db)
        .await?;
    Ok(cities)
}

/// Insert of one `(reference, city)` pair. On a clash with a row written by
/// any vehicle sharing the reference, the smaller radius survives.
fn upsert_entry(
    key: &PlaceKey,
    radius_km: f64,
    city: &city::Model,
    distance_km: f64,
) -> Insert<nearby_city::ActiveModel> {
    let entry = nearby_city::ActiveModel {
        id: NotSet,
        reference_country: Set(key.country.clone()),
        reference_postcode: Set(key.postcode.clone()),
        reference_city: Set(key.city.clone()),
        radius_km: Set(radius_km),
        city_name: Set(city.city_name.clone()),
        normalized_name: Set(normalize_city_name(&city.city_name)),
        country_code: Set(city.country_code.clone()),
        zipcode: Set(city.zipcode.clone()),
        latitude: Set(city.latitude),
        longitude: Set(city.longitude),
        distance_km: Set(distance_km),
    };

    nearby_city::Entity::insert(entry).on_conflict(
        OnConflict::columns([
            nearby_city::Column::ReferenceCountry,
            nearby_city::Column::ReferencePostcode,
            nearby_city::Column::ReferenceCity,
            nearby_city::Column::CityName,
        ])
        .value(
            nearby_city::Column::RadiusKm,
            Expr::cust(r#"LEAST("nearby_city"."radius_km", "excluded"."radius_km")"#),
        )
        .to_owned(),
    )
}

async fn store_scan<C: ConnectionTrait>(conn: &C, scan: &ReferenceScan) -> AppResult<usize> {
    let mut stored: HashMap<String, f64> = nearby_city::Entity::find()
        .filter(nearby_city::Column::ReferenceCountry.eq(scan.key.country.as_str()))
        .filter(nearby_city::Column::ReferencePostcode.eq(scan.key.postcode.as_str()))
        .filter(nearby_city::Column::ReferenceCity.eq(scan.key.city.as_str()))
        .all(conn)
        .await?
        .into_iter()
        .map(|e| (e.city_name, e.radius_km))
        .collect();

    let mut written = 0;
    // Hits are nearest first, so a repeated name keeps its closest row
    for (city, distance_km) in &scan.hits {
        match upsert_action(stored.get(&city.city_name).copied(), scan.radius_km) {
            UpsertAction::Keep => continue,
            UpsertAction::Insert | UpsertAction::ShrinkRadius => {}
        }
        upsert_entry(&scan.key, scan.radius_km, city, *distance_km)
            .exec_without_returning(conn)
            .await?;
        stored.insert(city.city_name.clone(), scan.radius_km);
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DbBackend, QueryTrait};
    use uuid::Uuid;

    fn city(name: &str, lat: f64, lng: f64) -> city::Model {
        city::Model {
            id: 0,
            city_name: name.into(),
            normalized_name: normalize_city_name(name),
            country_code: "DE".into(),
            zipcode: None,
            latitude: lat,
            longitude: lng,
            population: None,
        }
    }

    fn vehicle(origin_radius: Option<f64>, destination_radius: Option<f64>) -> vehicle::Model {
        vehicle::Model {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            user_id: None,
            vehicle_type: "truck".into(),
            structure: None,
            equipment: None,
            cargo_securement: None,
            description: None,
            load_type: None,
            palette_exchange: false,
            oversize: false,
            capacity_tons: None,
            volume_m3: None,
            available_from: None,
            available_until: None,
            price: None,
            currency: None,
            origin_country: "DE".into(),
            origin_postcode: Some("10115".into()),
            origin_city: "Berlin".into(),
            origin_lat: Some(52.52),
            origin_lng: Some(13.405),
            origin_radius_km: origin_radius,
            destination_country: "PL".into(),
            destination_postcode: None,
            destination_city: "Warszawa".into(),
            destination_lat: None,
            destination_lng: None,
            destination_radius_km: destination_radius,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_upsert_keeps_smallest_radius() {
        assert_eq!(upsert_action(None, 50.0), UpsertAction::Insert);
        assert_eq!(upsert_action(Some(50.0), 30.0), UpsertAction::ShrinkRadius);
        assert_eq!(upsert_action(Some(30.0), 50.0), UpsertAction::Keep);
        assert_eq!(upsert_action(Some(30.0), 30.0), UpsertAction::Keep);
    }

    #[test]
    fn test_shared_reference_upsert_keeps_smaller_radius() {
        let key = PlaceKey::new("DE", "10115", "berlin");
        let sql = upsert_entry(&key, 30.0, &city("Potsdam", 52.3906, 13.0645), 26.7)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(
            r#"ON CONFLICT ("reference_country", "reference_postcode", "reference_city", "city_name") DO UPDATE"#
        ));
        assert!(sql.contains(r#"LEAST("nearby_city"."radius_km", "excluded"."radius_km")"#));
        assert!(!sql.contains(r#""distance_km" = "excluded""#));
    }

    #[test]
    fn test_candidates_within_radius_nearest_first() {
        let cities = vec![
            city("Oranienburg", 52.7545, 13.2369),
            city("Potsdam", 52.3906, 13.0645),
            city("Leipzig", 51.3397, 12.3731),
        ];
        let hits = nearby_candidates(52.52, 13.405, 30.0, cities);
        let names: Vec<_> = hits.iter().map(|(c, _)| c.city_name.as_str()).collect();
        assert_eq!(names, ["Potsdam", "Oranienburg"]);
        assert!(hits.iter().all(|(_, d)| *d <= 30.0));
    }

    #[test]
    fn test_route_members_span_origin_stops_destination() {
        let v = vehicle(Some(20.0), None);
        let stop = vehicle_route_stop::Model {
            id: 1,
            vehicle_id: v.id,
            stop_number: 1,
            country: "PL".into(),
            postcode: Some("61-001".into()),
            city: "Poznań".into(),
            latitude: 52.4064,
            longitude: 16.9252,
        };
        let members = route_members(&v, &[stop]);
        let cities: Vec<_> = members.iter().map(|m| m.place.city.as_str()).collect();
        assert_eq!(cities, ["Berlin", "Poznań", "Warszawa"]);
        assert_eq!(members[0].coords, Some((52.52, 13.405)));
        assert_eq!(members[2].coords, None);
        assert_eq!(members[1].place.key(), PlaceKey::new("PL", "61-001", "poznan"));
    }

    #[test]
    fn test_detour_radii() {
        assert!(detour_radii(&vehicle(None, Some(0.0))).is_empty());
        assert_eq!(detour_radii(&vehicle(Some(50.0), Some(20.0))), vec![20.0, 50.0]);
        assert_eq!(detour_radii(&vehicle(Some(30.0), Some(30.0))), vec![30.0]);
    }
}
