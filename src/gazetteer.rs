use sea_orm::{
    sea_query::{NullOrdering, Order},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, Select,
};
use serde::Serialize;

use crate::entities::{city, city_zipcode};
use crate::error::AppResult;
use crate::utils::geo::{haversine_distance, is_within_radius, BoundingBox};
use crate::utils::text::{normalize_city_name, normalize_country_code};

/// Minimum population of a city that may stand in for a hidden location.
pub const MAJOR_CITY_POPULATION: i64 = 15_000;
/// How far a hidden location may be moved.
pub const MASK_RADIUS_KM: f64 = 25.0;

const SEARCH_LIMIT: u64 = 10;
const RESOLVE_CANDIDATES: u64 = 50;

#[derive(Debug, Serialize)]
pub struct PlaceSuggestion {
    pub id: i32,
    pub city_name: String,
    pub country_code: String,
    pub zipcode: Option<String>,
}

/// Gazetteer row for a user-entered place.
///
/// Tries, in order: exact name in the country, exact name anywhere, name
/// prefix in the country, name prefix anywhere. Within a tier a row with the
/// given postcode wins, then the most populous.
pub async fn resolve_place(
    db: &DatabaseConnection,
    country: &str,
    city_name: &str,
    postcode: Option<&str>,
) -> AppResult<Option<city::Model>> {
    let name = normalize_city_name(city_name);
    if name.is_empty() {
        return Ok(None);
    }
    let country = normalize_country_code(country);

    let exact = city::Column::NormalizedName.eq(name.as_str());
    let prefix = city::Column::NormalizedName.starts_with(name.as_str());

    let mut tiers = Vec::with_capacity(4);
    if !country.is_empty() {
        tiers.push(Condition::all().add(exact.clone()).add(city::Column::CountryCode.eq(country.as_str())));
    }
    tiers.push(Condition::all().add(exact));
    if !country.is_empty() {
        tiers.push(Condition::all().add(prefix.clone()).add(city::Column::CountryCode.eq(country.as_str())));
    }
    tiers.push(Condition::all().add(prefix));

    for condition in tiers {
        let rows = city::Entity::find()
            .filter(condition)
            .order_by_with_nulls(city::Column::Population, Order::Desc, NullOrdering::Last)
            .limit(RESOLVE_CANDIDATES)
            .all(db)
            .await?;

        if let Some(found) = best_candidate(rows, postcode) {
            tracing::debug!(city = %city_name, resolved = %found.city_name, "Resolved place");
            return Ok(Some(found));
        }
    }

    tracing::debug!(city = %city_name, country = %country, "Place not in gazetteer");
    Ok(None)
}

/// `rows` are ordered by population, most populous first.
fn best_candidate(rows: Vec<city::Model>, postcode: Option<&str>) -> Option<city::Model> {
    let postcode = postcode.map(str::trim).filter(|p| !p.is_empty());
    if let Some(postcode) = postcode {
        if let Some(pos) = rows.iter().position(|r| r.zipcode.as_deref() == Some(postcode)) {
            return rows.into_iter().nth(pos);
        }
    }
    rows.into_iter().next()
}

/// Parsed search box input.
#[derive(Debug, Default, PartialEq)]
struct SearchTerms {
    countries: Vec<String>,
    postcodes: Vec<String>,
    names: Vec<String>,
}

impl SearchTerms {
    fn parse(q: &str) -> Option<Self> {
        let q = q.trim();
        if q.chars().count() < 2 {
            return None;
        }

        let mut terms = Self::default();
        for word in q.split_whitespace() {
            if word.chars().any(|c| c.is_ascii_digit()) {
                terms.postcodes.push(word.to_string());
            } else if word.chars().count() == 2 {
                terms.countries.push(normalize_country_code(word));
            } else {
                let name = normalize_city_name(word);
                if !name.is_empty() {
                    terms.names.push(name);
                }
            }
        }
        Some(terms)
    }

    fn has_postcode(&self) -> bool {
        !self.postcodes.is_empty()
    }
}

fn search_query(terms: &SearchTerms) -> Select<city::Entity> {
    let mut condition = Condition::all();
    for country in &terms.countries {
        condition = condition.add(city::Column::CountryCode.eq(country.as_str()));
    }
    for name in &terms.names {
        condition = condition.add(city::Column::NormalizedName.contains(name.as_str()));
    }
    for postcode in &terms.postcodes {
        let extra = city_zipcode::Entity::find()
            .select_only()
            .column(city_zipcode::Column::CityId)
            .filter(city_zipcode::Column::Zipcode.contains(postcode.as_str()))
            .into_query();
        condition = condition.add(
            Condition::any()
                .add(city::Column::Zipcode.contains(postcode.as_str()))
                .add(city::Column::Id.in_subquery(extra)),
        );
    }

    let mut query = city::Entity::find().filter(condition);
    if terms.has_postcode() {
        query = query.order_by_asc(city::Column::Zipcode);
    }
    query.order_by_asc(city::Column::CityName)
}

/// Autocomplete over the gazetteer, at most ten suggestions.
pub async fn search_places(db: &DatabaseConnection, q: &str) -> AppResult<Vec<PlaceSuggestion>> {
    let Some(terms) = SearchTerms::parse(q) else {
        return Ok(Vec::new());
    };

    let cities = search_query(&terms).limit(SEARCH_LIMIT).all(db).await?;

    let ids: Vec<i32> = cities.iter().map(|c| c.id).collect();
    let extra = city_zipcode::Entity::find()
        .filter(city_zipcode::Column::CityId.is_in(ids))
        .order_by_asc(city_zipcode::Column::Id)
        .all(db)
        .await?;

    Ok(cities
        .into_iter()
        .map(|c| {
            let zipcode = extra
                .iter()
                .find(|z| z.city_id == c.id)
                .map(|z| z.zipcode.clone())
                .or(c.zipcode);
            PlaceSuggestion {
                id: c.id,
                city_name: c.city_name,
                country_code: c.country_code,
                zipcode,
            }
        })
        .collect())
}

/// Public stand-in for a hidden location: the closest city of at least
/// [`MAJOR_CITY_POPULATION`] inhabitants within [`MASK_RADIUS_KM`], with its
/// postcode. Falls back to the entered city and no postcode.
pub async fn mask_place(
    db: &DatabaseConnection,
    country: &str,
    city_name: &str,
) -> AppResult<(String, Option<String>)> {
    let Some(origin) = resolve_place(db, country, city_name, None).await? else {
        tracing::warn!(city = %city_name, "Cannot mask unknown place, keeping it");
        return Ok((city_name.to_string(), None));
    };

    let bbox = BoundingBox::around(origin.latitude, origin.longitude, MASK_RADIUS_KM);
    let candidates = city::Entity::find()
        .filter(city::Column::CountryCode.eq(origin.country_code.as_str()))
        .filter(city::Column::Population.gte(MAJOR_CITY_POPULATION))
        .filter(city::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
        .filter(city::Column::Longitude.between(bbox.min_lng, bbox.max_lng))
        .all(db)
        .await?;

    let Some(major) = nearest_major_city(origin.latitude, origin.longitude, candidates) else {
        tracing::info!(city = %city_name, "No major city nearby, keeping hidden location as is");
        return Ok((city_name.to_string(), None));
    };

    let postcode = match major.zipcode.clone() {
        Some(zip) => Some(zip),
        None => city_zipcode::Entity::find()
            .filter(city_zipcode::Column::CityId.eq(major.id))
            .order_by_asc(city_zipcode::Column::Id)
            .one(db)
            .await?
            .map(|z| z.zipcode),
    };

    tracing::info!(city = %city_name, masked = %major.city_name, "Masked hidden location");
    Ok((major.city_name, postcode))
}

fn nearest_major_city(lat: f64, lng: f64, candidates: Vec<city::Model>) -> Option<city::Model> {
    candidates
        .into_iter()
        .filter(|c| c.population.unwrap_or(0) >= MAJOR_CITY_POPULATION)
        .filter(|c| is_within_radius(c.latitude, c.longitude, lat, lng, MASK_RADIUS_KM))
        .min_by(|a, b| {
            let da = haversine_distance(lat, lng, a.latitude, a.longitude);
            let db = haversine_distance(lat, lng, b.latitude, b.longitude);
            da.total_cmp(&db)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, name: &str, zipcode: Option<&str>, lat: f64, lng: f64, population: Option<i64>) -> city::Model {
        city::Model {
            id,
            city_name: name.into(),
            normalized_name: normalize_city_name(name),
            country_code: "PL".into(),
            zipcode: zipcode.map(Into::into),
            latitude: lat,
            longitude: lng,
            population,
        }
    }

    #[test]
    fn test_search_terms_split_by_shape() {
        let terms = SearchTerms::parse("pl 61 Poznań").unwrap();
        assert_eq!(terms.countries, ["PL"]);
        assert_eq!(terms.postcodes, ["61"]);
        assert_eq!(terms.names, ["poznan"]);
        assert!(terms.has_postcode());
    }

    #[test]
    fn test_search_terms_need_two_characters() {
        assert!(SearchTerms::parse(" b ").is_none());
        assert!(SearchTerms::parse("").is_none());
        assert!(SearchTerms::parse("be").is_some());
    }

    #[test]
    fn test_short_postcode_filters_through_subquery() {
        let terms = SearchTerms::parse("DE 1").unwrap();
        let sql = search_query(&terms)
            .limit(SEARCH_LIMIT)
            .build(sea_orm::DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""city"."id" IN (SELECT "city_zipcode"."city_id" FROM "city_zipcode""#));
        assert!(sql.contains("LIMIT 10"));
    }

    #[test]
    fn test_best_candidate_prefers_postcode_then_population() {
        let rows = vec![
            row(1, "Frankfurt am Main", Some("60311"), 50.11, 8.68, Some(750_000)),
            row(2, "Frankfurt (Oder)", Some("15230"), 52.34, 14.55, Some(57_000)),
        ];
        assert_eq!(best_candidate(rows.clone(), Some("15230")).unwrap().id, 2);
        assert_eq!(best_candidate(rows.clone(), Some("99999")).unwrap().id, 1);
        assert_eq!(best_candidate(rows, None).unwrap().id, 1);
        assert!(best_candidate(vec![], None).is_none());
    }

    #[test]
    fn test_nearest_major_city() {
        // Swarzędz lies about 11 km east of Poznań
        let (lat, lng) = (52.41, 17.07);
        let candidates = vec![
            row(1, "Poznań", Some("61-001"), 52.4064, 16.9252, Some(530_000)),
            row(2, "Gniezno", Some("62-200"), 52.535, 17.5826, Some(67_000)),
            row(3, "Kostrzyn", None, 52.398, 17.228, Some(10_000)),
        ];
        let major = nearest_major_city(lat, lng, candidates).unwrap();
        assert_eq!(major.city_name, "Poznań");
    }

    #[test]
    fn test_nearest_major_city_none_in_range() {
        let candidates = vec![row(1, "Warsaw", None, 52.2297, 21.0122, Some(1_800_000))];
        assert!(nearest_major_city(52.41, 17.07, candidates).is_none());
    }
}
