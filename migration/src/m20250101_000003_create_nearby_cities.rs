use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NearbyCity::Table)
                    .if_not_exists()
                    .col(pk_auto(NearbyCity::Id))
                    .col(string_len(NearbyCity::ReferenceCountry, 2))
                    .col(string_len(NearbyCity::ReferencePostcode, 20).default(""))
                    .col(string_len(NearbyCity::ReferenceCity, 200))
                    .col(double(NearbyCity::RadiusKm))
                    .col(string_len(NearbyCity::CityName, 200))
                    .col(string_len(NearbyCity::NormalizedName, 200))
                    .col(string_len(NearbyCity::CountryCode, 2))
                    .col(string_len_null(NearbyCity::Zipcode, 20))
                    .col(double(NearbyCity::Latitude))
                    .col(double(NearbyCity::Longitude))
                    .col(double(NearbyCity::DistanceKm))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_nearby_city_reference_city")
                    .table(NearbyCity::Table)
                    .col(NearbyCity::ReferenceCountry)
                    .col(NearbyCity::ReferencePostcode)
                    .col(NearbyCity::ReferenceCity)
                    .col(NearbyCity::CityName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Match queries filter by the nearby city's name
        manager
            .create_index(
                Index::create()
                    .name("idx_nearby_city_normalized_name")
                    .table(NearbyCity::Table)
                    .col(NearbyCity::NormalizedName)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NearbyCity::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NearbyCity {
    Table,
    Id,
    ReferenceCountry,
    ReferencePostcode,
    ReferenceCity,
    RadiusKm,
    CityName,
    NormalizedName,
    CountryCode,
    Zipcode,
    Latitude,
    Longitude,
    DistanceKm,
}
