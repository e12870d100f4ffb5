use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use crate::db::{Bus, BusPosition, BusStop, BusTimeTable};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        manager
            .create_table(
                Table::create()
                    .table(BusStop::Table)
                    .if_not_exists()
                    .col(key_col(BusStop::Id))
                    .col(ColumnDef::new(BusStop::Name).string_len(64).not_null())
                    .col(ColumnDef::new(BusStop::Latitude).double().not_null())
                    .col(ColumnDef::new(BusStop::Longitude).double().not_null())
                    .primary_key(Index::create().name("pk_bus_stop").col(BusStop::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bus::Table)
                    .if_not_exists()
                    .col(key_col(Bus::Id))
                    .col(ColumnDef::new(Bus::Latitude).double().not_null())
                    .col(ColumnDef::new(Bus::Longitude).double().not_null())
                    .primary_key(Index::create().name("pk_bus").col(Bus::Id))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BusTimeTable::Table)
                    .if_not_exists()
                    .col(key_col(BusTimeTable::BusId))
                    .col(key_col(BusTimeTable::BusStopId))
                    .col(
                        ColumnDef::new(BusTimeTable::TimeSeconds)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_bus_time_table")
                            .col(BusTimeTable::BusId)
                            .col(BusTimeTable::BusStopId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_time_table_bus")
                            .from(BusTimeTable::Table, BusTimeTable::BusId)
                            .to(Bus::Table, Bus::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_time_table_stop")
                            .from(BusTimeTable::Table, BusTimeTable::BusStopId)
                            .to(BusStop::Table, BusStop::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BusPosition::Table)
                    .if_not_exists()
                    .col(serial_col(backend, BusPosition::Id))
                    .col(
                        ColumnDef::new(BusPosition::CreatedAtUs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(key_col(BusPosition::BusId))
                    .col(ColumnDef::new(BusPosition::Latitude).double().not_null())
                    .col(ColumnDef::new(BusPosition::Longitude).double().not_null())
                    .col(key_col(BusPosition::NextBusStopId))
                    .col(ColumnDef::new(BusPosition::IsBusStop).boolean().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_position_bus")
                            .from(BusPosition::Table, BusPosition::BusId)
                            .to(Bus::Table, Bus::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bus_position_stop")
                            .from(BusPosition::Table, BusPosition::NextBusStopId)
                            .to(BusStop::Table, BusStop::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("bus_position_bus_idx")
                    .table(BusPosition::Table)
                    .if_not_exists()
                    .col(BusPosition::BusId)
                    .col(BusPosition::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BusPosition::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusTimeTable::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bus::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusStop::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

fn key_col(col: impl Iden + 'static) -> ColumnDef {
    ColumnDef::new(col).string_len(36).not_null().to_owned()
}

// SQLite only honours AUTOINCREMENT on a plain INTEGER primary key.
fn serial_col(backend: DatabaseBackend, col: impl Iden + 'static) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Postgres => {
            col_def.big_integer();
        }
        _ => {
            col_def.integer();
        }
    }
    col_def.not_null().auto_increment().primary_key();
    col_def.to_owned()
}
