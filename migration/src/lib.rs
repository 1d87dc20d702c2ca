pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_gazetteer;
mod m20250101_000002_create_vehicles;
mod m20250101_000003_create_nearby_cities;
mod m20250101_000004_create_cargos;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_gazetteer::Migration),
            Box::new(m20250101_000002_create_vehicles::Migration),
            Box::new(m20250101_000003_create_nearby_cities::Migration),
            Box::new(m20250101_000004_create_cargos::Migration),
        ]
    }
}
