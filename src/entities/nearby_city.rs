use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cached proximity fact: `city_name` lies `distance_km` from the reference
/// place. `reference_city` and `normalized_name` hold normalized names;
/// `reference_postcode` is empty when the reference has no postcode.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nearby_city")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub reference_country: String,
    pub reference_postcode: String,
    pub reference_city: String,
    pub radius_km: f64,
    pub city_name: String,
    pub normalized_name: String,
    pub country_code: String,
    pub zipcode: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
