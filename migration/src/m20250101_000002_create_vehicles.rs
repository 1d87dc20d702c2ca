use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(uuid(Company::Id).primary_key())
                    .col(string_len(Company::Name, 200))
                    .col(
                        timestamp_with_time_zone(Company::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(uuid(Vehicle::CompanyId))
                    .col(uuid_null(Vehicle::UserId))
                    .col(string_len(Vehicle::VehicleType, 100))
                    .col(string_null(Vehicle::Structure))
                    .col(string_null(Vehicle::Equipment))
                    .col(string_null(Vehicle::CargoSecurement))
                    .col(text_null(Vehicle::Description))
                    .col(string_null(Vehicle::LoadType))
                    .col(boolean(Vehicle::PaletteExchange).default(false))
                    .col(boolean(Vehicle::Oversize).default(false))
                    .col(double_null(Vehicle::CapacityTons))
                    .col(double_null(Vehicle::VolumeM3))
                    .col(date_null(Vehicle::AvailableFrom))
                    .col(date_null(Vehicle::AvailableUntil))
                    .col(double_null(Vehicle::Price))
                    .col(string_len_null(Vehicle::Currency, 3))
                    .col(string_len(Vehicle::OriginCountry, 2))
                    .col(string_len_null(Vehicle::OriginPostcode, 20))
                    .col(string_len(Vehicle::OriginCity, 200))
                    .col(double_null(Vehicle::OriginLat))
                    .col(double_null(Vehicle::OriginLng))
                    .col(double_null(Vehicle::OriginRadiusKm))
                    .col(string_len(Vehicle::DestinationCountry, 2))
                    .col(string_len_null(Vehicle::DestinationPostcode, 20))
                    .col(string_len(Vehicle::DestinationCity, 200))
                    .col(double_null(Vehicle::DestinationLat))
                    .col(double_null(Vehicle::DestinationLng))
                    .col(double_null(Vehicle::DestinationRadiusKm))
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_company")
                            .from(Vehicle::Table, Vehicle::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VehicleRouteStop::Table)
                    .if_not_exists()
                    .col(pk_auto(VehicleRouteStop::Id))
                    .col(uuid(VehicleRouteStop::VehicleId))
                    .col(integer(VehicleRouteStop::StopNumber))
                    .col(string_len(VehicleRouteStop::Country, 2))
                    .col(string_len_null(VehicleRouteStop::Postcode, 20))
                    .col(string_len(VehicleRouteStop::City, 200))
                    .col(double(VehicleRouteStop::Latitude))
                    .col(double(VehicleRouteStop::Longitude))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_route_stop_vehicle")
                            .from(VehicleRouteStop::Table, VehicleRouteStop::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_route_stop_vehicle_number")
                    .table(VehicleRouteStop::Table)
                    .col(VehicleRouteStop::VehicleId)
                    .col(VehicleRouteStop::StopNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VehicleRouteStop::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Company::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Company {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Vehicle {
    Table,
    Id,
    CompanyId,
    UserId,
    VehicleType,
    Structure,
    Equipment,
    CargoSecurement,
    Description,
    LoadType,
    PaletteExchange,
    Oversize,
    CapacityTons,
    #[sea_orm(iden = "volume_m3")]
    VolumeM3,
    AvailableFrom,
    AvailableUntil,
    Price,
    Currency,
    OriginCountry,
    OriginPostcode,
    OriginCity,
    OriginLat,
    OriginLng,
    OriginRadiusKm,
    DestinationCountry,
    DestinationPostcode,
    DestinationCity,
    DestinationLat,
    DestinationLng,
    DestinationRadiusKm,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VehicleRouteStop {
    Table,
    Id,
    VehicleId,
    StopNumber,
    Country,
    Postcode,
    City,
    Latitude,
    Longitude,
}
