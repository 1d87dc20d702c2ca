use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(pk_auto(City::Id))
                    .col(string_len(City::CityName, 200))
                    .col(string_len(City::NormalizedName, 200))
                    .col(string_len(City::CountryCode, 2))
                    .col(string_len_null(City::Zipcode, 20))
                    .col(double(City::Latitude))
                    .col(double(City::Longitude))
                    .col(big_integer_null(City::Population))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_city_normalized_name_country")
                    .table(City::Table)
                    .col(City::NormalizedName)
                    .col(City::CountryCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_city_country_lat_lng")
                    .table(City::Table)
                    .col(City::CountryCode)
                    .col(City::Latitude)
                    .col(City::Longitude)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CityZipcode::Table)
                    .if_not_exists()
                    .col(pk_auto(CityZipcode::Id))
                    .col(integer(CityZipcode::CityId))
                    .col(string_len(CityZipcode::Zipcode, 20))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_zipcode_city")
                            .from(CityZipcode::Table, CityZipcode::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Seed a few places; the full gazetteer is bulk-loaded separately
        let insert = Query::insert()
            .into_table(City::Table)
            .columns([
                City::CityName,
                City::NormalizedName,
                City::CountryCode,
                City::Zipcode,
                City::Latitude,
                City::Longitude,
                City::Population,
            ])
            .values_panic(["Berlin".into(), "berlin".into(), "DE".into(), "10115".into(), 52.5200.into(), 13.4050.into(), 3_645_000i64.into()])
            .values_panic(["Potsdam".into(), "potsdam".into(), "DE".into(), "14467".into(), 52.3906.into(), 13.0645.into(), 183_000i64.into()])
            .values_panic(["Frankfurt (Oder)".into(), "frankfurt (oder)".into(), "DE".into(), "15230".into(), 52.3471.into(), 14.5506.into(), 57_000i64.into()])
            .values_panic(["Poznań".into(), "poznan".into(), "PL".into(), "61-001".into(), 52.4064.into(), 16.9252.into(), 530_000i64.into()])
            .values_panic(["Konin".into(), "konin".into(), "PL".into(), "62-500".into(), 52.2230.into(), 18.2511.into(), 72_000i64.into()])
            .values_panic(["Łódź".into(), "lodz".into(), "PL".into(), "90-001".into(), 51.7592.into(), 19.4560.into(), 670_000i64.into()])
            .values_panic(["Warszawa".into(), "warszawa".into(), "PL".into(), "00-001".into(), 52.2297.into(), 21.0122.into(), 1_790_000i64.into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CityZipcode::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(City::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum City {
    Table,
    Id,
    CityName,
    NormalizedName,
    CountryCode,
    Zipcode,
    Latitude,
    Longitude,
    Population,
}

#[derive(DeriveIden)]
enum CityZipcode {
    Table,
    Id,
    CityId,
    Zipcode,
}
