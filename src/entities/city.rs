use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gazetteer place. Loaded by bulk import, never written by the backend.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub city_name: String,
    #[serde(skip_serializing)]
    pub normalized_name: String,
    pub country_code: String,
    pub zipcode: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub population: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::city_zipcode::Entity")]
    Zipcodes,
}

impl Related<super::city_zipcode::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Zipcodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
