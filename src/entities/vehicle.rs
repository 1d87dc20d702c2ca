use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub user_id: Option<Uuid>,

    pub vehicle_type: String,
    pub structure: Option<String>,
    pub equipment: Option<String>,
    pub cargo_securement: Option<String>,
    pub description: Option<String>,
    pub load_type: Option<String>,
    pub palette_exchange: bool,
    pub oversize: bool,

    pub capacity_tons: Option<f64>,
    pub volume_m3: Option<f64>,
    pub available_from: Option<Date>,
    pub available_until: Option<Date>,
    pub price: Option<f64>,
    pub currency: Option<String>,

    pub origin_country: String,
    pub origin_postcode: Option<String>,
    pub origin_city: String,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub origin_radius_km: Option<f64>,

    pub destination_country: String,
    pub destination_postcode: Option<String>,
    pub destination_city: String,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub destination_radius_km: Option<f64>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(has_many = "super::vehicle_route_stop::Entity")]
    RouteStops,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::vehicle_route_stop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RouteStops.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
