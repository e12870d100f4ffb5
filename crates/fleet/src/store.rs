use std::cmp::Ordering;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Alias, Expr, Func, Order, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;

use crate::api::{
    Bus, BusWriteApi, NewPosition, PositionApi, PositionReport, ReferenceDataApi, RouteOffset,
    Stop,
};
use crate::clock::{ServerClock, from_micros, to_micros};
use crate::db::{self, BusPosition};
use crate::migration::Migrator;
use crate::notify::PositionNotifier;
use crate::{FleetConfig, FleetError, FleetResult, seed};

/// Storage client shared by the registry, gateway and estimator.
///
/// Cloning is cheap: clones share the underlying pool and notifier.
#[derive(Clone)]
pub struct FleetStore {
    conn: DatabaseConnection,
    notifier: Arc<dyn PositionNotifier>,
}

impl FleetStore {
    /// Open the pool, run migrations and ensure the seed data is present.
    pub async fn connect(
        config: &FleetConfig,
        base_dir: &Path,
        notifier: Arc<dyn PositionNotifier>,
    ) -> FleetResult<Self> {
        let conn = Self::connect_pool(config, base_dir).await?;
        Self::initialize(conn, notifier).await
    }

    pub async fn connect_pool(
        config: &FleetConfig,
        base_dir: &Path,
    ) -> FleetResult<DatabaseConnection> {
        let url = config.connection_url(base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(lifetime_ms) = pool.max_lifetime_ms {
                options.max_lifetime(Duration::from_millis(lifetime_ms));
            }
        }
        options.sqlx_logging(false);
        let conn = Database::connect(options).await?;
        Ok(conn)
    }

    pub async fn initialize(
        conn: DatabaseConnection,
        notifier: Arc<dyn PositionNotifier>,
    ) -> FleetResult<Self> {
        Migrator::up(&conn, None).await?;
        seed::ensure_reference_data(&conn).await?;
        log::info!(
            "fleet: store ready backend={:?} channel={}",
            conn.get_database_backend(),
            notifier.channel()
        );
        Ok(Self { conn, notifier })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub async fn close(self) -> FleetResult<()> {
        self.conn.close().await?;
        log::info!("fleet: store closed");
        Ok(())
    }
}

#[async_trait]
impl ReferenceDataApi for FleetStore {
    async fn list_stops(&self) -> FleetResult<Vec<Stop>> {
        let select = Query::select()
            .columns([
                db::BusStop::Id,
                db::BusStop::Name,
                db::BusStop::Latitude,
                db::BusStop::Longitude,
            ])
            .from(db::BusStop::Table)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut stops = rows
            .iter()
            .map(|row| {
                Ok(Stop {
                    id: row.try_get("", &col_name(db::BusStop::Id))?,
                    name: row.try_get("", &col_name(db::BusStop::Name))?,
                    latitude: row.try_get("", &col_name(db::BusStop::Latitude))?,
                    longitude: row.try_get("", &col_name(db::BusStop::Longitude))?,
                })
            })
            .collect::<FleetResult<Vec<_>>>()?;
        stops.sort_by(|a, b| compare_stop_ids(&a.id, &b.id));
        Ok(stops)
    }

    async fn list_buses(&self) -> FleetResult<Vec<Bus>> {
        let select = Query::select()
            .columns([db::Bus::Id, db::Bus::Latitude, db::Bus::Longitude])
            .from(db::Bus::Table)
            .order_by(db::Bus::Id, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter()
            .map(|row| {
                Ok(Bus {
                    id: row.try_get("", &col_name(db::Bus::Id))?,
                    latitude: row.try_get("", &col_name(db::Bus::Latitude))?,
                    longitude: row.try_get("", &col_name(db::Bus::Longitude))?,
                })
            })
            .collect()
    }

    async fn list_route_offsets(&self, bus_id: &str) -> FleetResult<Vec<RouteOffset>> {
        let select = Query::select()
            .columns([
                db::BusTimeTable::BusId,
                db::BusTimeTable::BusStopId,
                db::BusTimeTable::TimeSeconds,
            ])
            .from(db::BusTimeTable::Table)
            .and_where(Expr::col(db::BusTimeTable::BusId).eq(bus_id))
            .order_by(db::BusTimeTable::TimeSeconds, Order::Asc)
            .order_by(db::BusTimeTable::BusStopId, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter()
            .map(|row| {
                let seconds: i32 = row.try_get("", &col_name(db::BusTimeTable::TimeSeconds))?;
                Ok(RouteOffset {
                    bus_id: row.try_get("", &col_name(db::BusTimeTable::BusId))?,
                    bus_stop_id: row.try_get("", &col_name(db::BusTimeTable::BusStopId))?,
                    time_seconds: i64::from(seconds),
                })
            })
            .collect()
    }
}

#[async_trait]
impl BusWriteApi for FleetStore {
    async fn bus_exists(&self, bus_id: &str) -> FleetResult<bool> {
        let select = Query::select()
            .column(db::Bus::Id)
            .from(db::Bus::Table)
            .and_where(Expr::col(db::Bus::Id).eq(bus_id))
            .limit(1)
            .to_owned();
        Ok(query_one(&self.conn, &select).await?.is_some())
    }

    async fn create_bus(&self, bus: &Bus) -> FleetResult<()> {
        let insert = Query::insert()
            .into_table(db::Bus::Table)
            .columns([db::Bus::Id, db::Bus::Latitude, db::Bus::Longitude])
            .values_panic([
                bus.id.clone().into(),
                bus.latitude.into(),
                bus.longitude.into(),
            ])
            .to_owned();
        match exec(&self.conn, &insert).await {
            Ok(()) => Ok(()),
            Err(FleetError::Conflict { .. }) => Err(FleetError::conflict(format!(
                "bus {} already exists",
                bus.id
            ))),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl PositionApi for FleetStore {
    async fn record_position(&self, position: NewPosition) -> FleetResult<PositionReport> {
        let created_at = ServerClock::now();
        let insert = Query::insert()
            .into_table(BusPosition::Table)
            .columns([
                BusPosition::CreatedAtUs,
                BusPosition::BusId,
                BusPosition::Latitude,
                BusPosition::Longitude,
                BusPosition::NextBusStopId,
                BusPosition::IsBusStop,
            ])
            .values_panic([
                to_micros(created_at).into(),
                position.bus_id.clone().into(),
                position.latitude.into(),
                position.longitude.into(),
                position.next_bus_stop_id.clone().into(),
                position.is_bus_stop.into(),
            ])
            .returning_col(BusPosition::Id)
            .to_owned();

        let tx = self.conn.begin().await?;
        let row = query_one(&tx, &insert)
            .await?
            .ok_or_else(|| FleetError::storage("insert returned no identifier"))?;
        let id: i64 = row.try_get("", &col_name(BusPosition::Id))?;
        tx.commit().await?;

        let report = PositionReport {
            id,
            created_at,
            bus_id: position.bus_id,
            latitude: position.latitude,
            longitude: position.longitude,
            next_bus_stop_id: position.next_bus_stop_id,
            is_bus_stop: position.is_bus_stop,
        };
        self.notifier.publish(&report);
        log::debug!(
            "fleet: recorded position id={} bus={} next_stop={}",
            report.id,
            report.bus_id,
            report.next_bus_stop_id
        );
        Ok(report)
    }

    async fn list_positions(&self, bus_id: &str, limit: u64) -> FleetResult<Vec<PositionReport>> {
        let select = Query::select()
            .columns([
                BusPosition::Id,
                BusPosition::CreatedAtUs,
                BusPosition::BusId,
                BusPosition::Latitude,
                BusPosition::Longitude,
                BusPosition::NextBusStopId,
                BusPosition::IsBusStop,
            ])
            .from(BusPosition::Table)
            .and_where(Expr::col(BusPosition::BusId).eq(bus_id))
            .order_by(BusPosition::Id, Order::Desc)
            .limit(limit)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(read_position).collect()
    }

    async fn count_positions(&self) -> FleetResult<u64> {
        let select = Query::select()
            .expr_as(Func::count(Expr::col(BusPosition::Id)), Alias::new("total"))
            .from(BusPosition::Table)
            .to_owned();
        let total: i64 = match query_one(&self.conn, &select).await? {
            Some(row) => row.try_get("", "total")?,
            None => 0,
        };
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

fn read_position(row: &QueryResult) -> FleetResult<PositionReport> {
    let micros: i64 = row.try_get("", &col_name(BusPosition::CreatedAtUs))?;
    Ok(PositionReport {
        id: row.try_get("", &col_name(BusPosition::Id))?,
        created_at: from_micros(micros)?,
        bus_id: row.try_get("", &col_name(BusPosition::BusId))?,
        latitude: row.try_get("", &col_name(BusPosition::Latitude))?,
        longitude: row.try_get("", &col_name(BusPosition::Longitude))?,
        next_bus_stop_id: row.try_get("", &col_name(BusPosition::NextBusStopId))?,
        is_bus_stop: row.try_get("", &col_name(BusPosition::IsBusStop))?,
    })
}

// Numeric ids sort by value ahead of any non-numeric ids, which sort lexically.
fn compare_stop_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(left), Ok(right)) => left.cmp(&right).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Run a write on its own task; dropping the caller leaves it running to
/// completion, including the post-commit publish.
pub(crate) async fn run_detached<F, T>(task: F) -> FleetResult<T>
where
    F: Future<Output = FleetResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(task)
        .await
        .map_err(|err| FleetError::storage(format!("write task failed: {err}")))?
}

pub(crate) fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

pub(crate) fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_query::Values) {
    match backend {
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

pub(crate) async fn exec<C, S>(conn: &C, stmt: &S) -> FleetResult<()>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    conn.execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(())
}

pub(crate) async fn query_all<C, S>(conn: &C, stmt: &S) -> FleetResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

pub(crate) async fn query_one<C, S>(conn: &C, stmt: &S) -> FleetResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}
