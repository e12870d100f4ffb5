use std::sync::Arc;

use busline_fleet::{
    FleetConfig, FleetResult, FleetStore, NullNotifier, PositionApi, ReferenceDataApi,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::tempdir;

#[tokio::test]
async fn migrations_create_every_table() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = FleetConfig::default_sqlite(base.join("schema.sqlite").to_string_lossy());
    let store = FleetStore::connect(&config, base, Arc::new(NullNotifier)).await?;

    for table in ["bus_stop", "bus", "bus_time_table", "bus_position"] {
        let row = store
            .connection()
            .query_one(Statement::from_sql_and_values(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                [table.into()],
            ))
            .await?;
        assert!(row.is_some(), "missing table {table}");
    }
    Ok(())
}

#[tokio::test]
async fn reopening_is_idempotent_and_keeps_seed_counts() -> FleetResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = FleetConfig::default_sqlite(base.join("reopen.sqlite").to_string_lossy());

    let first = FleetStore::connect(&config, base, Arc::new(NullNotifier)).await?;
    first.close().await?;
    let store = FleetStore::connect(&config, base, Arc::new(NullNotifier)).await?;

    let stops = store.list_stops().await?;
    assert_eq!(stops.len(), 40);
    assert_eq!(stops[0].id, "1");
    assert_eq!(stops[0].name, "Stazione Tiburtina");
    assert_eq!(stops[9].id, "10");
    assert_eq!(stops[39].name, "Stazione Metro Cipro");

    let buses = store.list_buses().await?;
    assert_eq!(buses.len(), 1);
    assert_eq!(buses[0].id, "492");

    let offsets = store.list_route_offsets("492").await?;
    assert_eq!(offsets.len(), 40);
    assert_eq!(offsets[0].bus_stop_id, "1");
    assert_eq!(offsets[0].time_seconds, 0);
    assert_eq!(offsets[39].time_seconds, 969);

    assert_eq!(store.count_positions().await?, 0);
    Ok(())
}
