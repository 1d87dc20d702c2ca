use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "location_kind")]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    #[sea_orm(string_value = "pickup")]
    Pickup,
    #[sea_orm(string_value = "dropoff")]
    Dropoff,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cargo_location")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i32,
    #[serde(skip_serializing)]
    pub cargo_id: Uuid,
    /// Insertion order within the cargo, starting at 0.
    pub sequence: i32,
    pub kind: LocationKind,
    pub country: String,
    pub postcode: Option<String>,
    pub city: String,
    pub is_hidden: bool,
    pub masked_city: Option<String>,
    pub masked_postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub start_time_1: Option<Time>,
    pub start_time_2: Option<Time>,
    pub end_time_1: Option<Time>,
    pub end_time_2: Option<Time>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cargo::Entity",
        from = "Column::CargoId",
        to = "super::cargo::Column::Id"
    )]
    Cargo,
}

impl Related<super::cargo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cargo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
