use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::FleetResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One time-table row: seconds from route start at which `bus_id` reaches `bus_stop_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOffset {
    pub bus_id: String,
    pub bus_stop_id: String,
    pub time_seconds: i64,
}

/// Append-only position record as persisted by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub id: i64,
    #[serde(rename = "creationtime", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub bus_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub next_bus_stop_id: String,
    pub is_bus_stop: bool,
}

/// Validated position payload handed to the repository.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPosition {
    pub bus_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub next_bus_stop_id: String,
    pub is_bus_stop: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArrivalEstimate {
    pub bus_id: String,
    pub bus_stop_id: String,
    pub time_seconds: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Loosely typed scalar as sent by reporting agents, which post numbers and
/// flags as strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BusRegistration {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub latitude: Option<FieldValue>,
    #[serde(default)]
    pub longitude: Option<FieldValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSubmission {
    #[serde(default)]
    pub bus_id: Option<String>,
    #[serde(default)]
    pub latitude: Option<FieldValue>,
    #[serde(default)]
    pub longitude: Option<FieldValue>,
    #[serde(default)]
    pub next_bus_stop_id: Option<String>,
    #[serde(default)]
    pub is_bus_stop: Option<FieldValue>,
}

#[async_trait]
pub trait ReferenceDataApi {
    async fn list_stops(&self) -> FleetResult<Vec<Stop>>;
    async fn list_buses(&self) -> FleetResult<Vec<Bus>>;
    async fn list_route_offsets(&self, bus_id: &str) -> FleetResult<Vec<RouteOffset>>;
}

#[async_trait]
pub trait BusWriteApi {
    async fn bus_exists(&self, bus_id: &str) -> FleetResult<bool>;
    /// Plain insert; a duplicate id surfaces as `FleetError::Conflict`.
    async fn create_bus(&self, bus: &Bus) -> FleetResult<()>;
}

#[async_trait]
pub trait PositionApi {
    async fn record_position(&self, position: NewPosition) -> FleetResult<PositionReport>;
    async fn list_positions(&self, bus_id: &str, limit: u64) -> FleetResult<Vec<PositionReport>>;
    async fn count_positions(&self) -> FleetResult<u64>;
}
