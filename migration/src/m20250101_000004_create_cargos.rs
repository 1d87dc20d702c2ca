use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250101_000002_create_vehicles::Company;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(LocationKind::Enum)
                    .values([LocationKind::Pickup, LocationKind::Dropoff])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cargo::Table)
                    .if_not_exists()
                    .col(uuid(Cargo::Id).primary_key())
                    .col(uuid(Cargo::CompanyId))
                    .col(uuid(Cargo::UserId))
                    .col(double_null(Cargo::Weight))
                    .col(double_null(Cargo::Size))
                    .col(double_null(Cargo::Price))
                    .col(string_len_null(Cargo::Currency, 3))
                    .col(text_null(Cargo::Description))
                    .col(string_len_null(Cargo::VehicleType, 100))
                    .col(
                        timestamp_with_time_zone(Cargo::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cargo_company")
                            .from(Cargo::Table, Cargo::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CargoLocation::Table)
                    .if_not_exists()
                    .col(pk_auto(CargoLocation::Id))
                    .col(uuid(CargoLocation::CargoId))
                    .col(integer(CargoLocation::Sequence))
                    .col(ColumnDef::new(CargoLocation::Kind).custom(LocationKind::Enum).not_null())
                    .col(string_len(CargoLocation::Country, 2))
                    .col(string_len_null(CargoLocation::Postcode, 20))
                    .col(string_len(CargoLocation::City, 200))
                    .col(boolean(CargoLocation::IsHidden).default(false))
                    .col(string_len_null(CargoLocation::MaskedCity, 200))
                    .col(string_len_null(CargoLocation::MaskedPostcode, 20))
                    .col(double_null(CargoLocation::Latitude))
                    .col(double_null(CargoLocation::Longitude))
                    .col(date_null(CargoLocation::StartDate))
                    .col(date_null(CargoLocation::EndDate))
                    .col(time_null(CargoLocation::StartTime1))
                    .col(time_null(CargoLocation::StartTime2))
                    .col(time_null(CargoLocation::EndTime1))
                    .col(time_null(CargoLocation::EndTime2))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cargo_location_cargo")
                            .from(CargoLocation::Table, CargoLocation::CargoId)
                            .to(Cargo::Table, Cargo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_cargo_location_sequence")
                    .table(CargoLocation::Table)
                    .col(CargoLocation::CargoId)
                    .col(CargoLocation::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CargoLocation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cargo::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(LocationKind::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Cargo {
    Table,
    Id,
    CompanyId,
    UserId,
    Weight,
    Size,
    Price,
    Currency,
    Description,
    VehicleType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CargoLocation {
    Table,
    Id,
    CargoId,
    Sequence,
    Kind,
    Country,
    Postcode,
    City,
    IsHidden,
    MaskedCity,
    MaskedPostcode,
    Latitude,
    Longitude,
    StartDate,
    EndDate,
    #[sea_orm(iden = "start_time_1")]
    StartTime1,
    #[sea_orm(iden = "start_time_2")]
    StartTime2,
    #[sea_orm(iden = "end_time_1")]
    EndTime1,
    #[sea_orm(iden = "end_time_2")]
    EndTime2,
}

#[derive(DeriveIden)]
pub enum LocationKind {
    #[sea_orm(iden = "location_kind")]
    Enum,
    #[sea_orm(iden = "pickup")]
    Pickup,
    #[sea_orm(iden = "dropoff")]
    Dropoff,
}
