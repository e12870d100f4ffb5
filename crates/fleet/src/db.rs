use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum BusStop {
    Table,
    Id,
    Name,
    Latitude,
    Longitude,
}

#[derive(Iden, Clone, Copy)]
pub enum Bus {
    Table,
    Id,
    Latitude,
    Longitude,
}

#[derive(Iden, Clone, Copy)]
pub enum BusTimeTable {
    Table,
    BusId,
    BusStopId,
    TimeSeconds,
}

#[derive(Iden, Clone, Copy)]
pub enum BusPosition {
    Table,
    Id,
    CreatedAtUs,
    BusId,
    Latitude,
    Longitude,
    NextBusStopId,
    IsBusStop,
}

pub const POSITION_CHANNEL: &str = "bus_position_notification";
