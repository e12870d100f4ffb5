pub mod api;
pub mod clock;
pub mod config;
pub mod datastore;
mod db;
pub mod error;
pub mod estimator;
pub mod gateway;
pub mod migration;
pub mod notify;
pub mod registry;
pub mod seed;
pub mod store;
pub mod validate;

pub use api::{
    ArrivalEstimate, Bus, BusRegistration, BusWriteApi, FieldValue, NewPosition, PositionApi,
    PositionReport, PositionSubmission, ReferenceDataApi, RouteOffset, Stop,
};
pub use clock::ServerClock;
pub use config::{DatabaseConfig, FleetConfig, NotifyConfig, PoolConfig, StartupConfig};
pub use datastore::{default_sqlite_path, open_store};
pub use db::POSITION_CHANNEL;
pub use error::{FleetError, FleetResult};
pub use estimator::{ArrivalEstimator, project_arrivals};
pub use gateway::IngestionGateway;
pub use notify::{BroadcastNotifier, NullNotifier, PositionNotification, PositionNotifier};
pub use registry::FleetRegistry;
pub use store::FleetStore;
