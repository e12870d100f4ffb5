use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend};

use crate::db::POSITION_CHANNEL;

/// Installs the engine-native fan-out for committed position inserts.
///
/// Only PostgreSQL has a notify primitive; other backends rely solely on the
/// in-process notifier wired into the store.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let conn = manager.get_connection();
        conn.execute_unprepared(&notify_function_sql()).await?;
        conn.execute_unprepared("DROP TRIGGER IF EXISTS notify_bus_position ON bus_position;")
            .await?;
        conn.execute_unprepared(
            "CREATE TRIGGER notify_bus_position
                AFTER INSERT ON bus_position
                FOR EACH ROW
                EXECUTE PROCEDURE notify_bus_position_event();",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP TRIGGER IF EXISTS notify_bus_position ON bus_position;")
            .await?;
        conn.execute_unprepared("DROP FUNCTION IF EXISTS notify_bus_position_event();")
            .await?;
        Ok(())
    }
}

fn notify_function_sql() -> String {
    format!(
        r#"CREATE OR REPLACE FUNCTION notify_bus_position_event() RETURNS TRIGGER AS
$$
BEGIN
    PERFORM pg_notify('{POSITION_CHANNEL}', json_build_object(
        'id', NEW.id,
        'creationtime', to_char(
            to_timestamp(NEW.created_at_us / 1000000.0) AT TIME ZONE 'UTC',
            'YYYY-MM-DD"T"HH24:MI:SS.US"Z"'
        ),
        'busId', NEW.bus_id,
        'latitude', NEW.latitude,
        'longitude', NEW.longitude,
        'nextBusStopId', NEW.next_bus_stop_id,
        'isBusStop', NEW.is_bus_stop
    )::text);
    RETURN NULL;
END;
$$
LANGUAGE plpgsql;"#
    )
}

#[cfg(test)]
mod tests {
    use super::notify_function_sql;

    #[test]
    fn trigger_function_targets_position_channel() {
        let sql = notify_function_sql();
        assert!(sql.contains("pg_notify('bus_position_notification'"));
        assert!(sql.contains("'nextBusStopId', NEW.next_bus_stop_id"));
    }
}
