use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use busline_fleet::{
    ArrivalEstimate, ArrivalEstimator, BroadcastNotifier, Bus, BusRegistration, FleetRegistry,
    FleetStore, IngestionGateway, PositionApi, PositionReport, PositionSubmission,
    ReferenceDataApi, Stop,
};
use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_POSITION_LIMIT: u64 = 50;
pub const MAX_POSITION_LIMIT: u64 = 500;

/// Components shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: FleetStore,
    pub registry: FleetRegistry,
    pub gateway: IngestionGateway,
    pub estimator: ArrivalEstimator,
    pub notifier: BroadcastNotifier,
}

impl AppState {
    /// `notifier` must be the same adapter the store publishes through.
    pub fn new(store: FleetStore, notifier: BroadcastNotifier) -> Self {
        let registry = FleetRegistry::new(store.clone());
        let gateway = IngestionGateway::new(registry.clone(), store.clone());
        let estimator = ArrivalEstimator::new(store.clone());
        Self {
            store,
            registry,
            gateway,
            estimator,
            notifier,
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn list_stops(State(state): State<AppState>) -> Result<Json<Vec<Stop>>, ApiError> {
    Ok(Json(state.store.list_stops().await?))
}

pub async fn list_buses(State(state): State<AppState>) -> Result<Json<Vec<Bus>>, ApiError> {
    Ok(Json(state.store.list_buses().await?))
}

pub async fn bus_schedule(
    State(state): State<AppState>,
    Path(bus_id): Path<String>,
) -> Result<Json<Vec<ArrivalEstimate>>, ApiError> {
    let estimates = state
        .estimator
        .estimate_arrivals(&bus_id)
        .await
        .map_err(|err| ApiError::from(err).internal())?;
    Ok(Json(estimates))
}

pub async fn register_bus(
    State(state): State<AppState>,
    body: Result<Json<BusRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<Bus>), ApiError> {
    let Json(registration) = body?;
    let bus = state.registry.register_bus(&registration).await?;
    Ok((StatusCode::CREATED, Json(bus)))
}

pub async fn submit_position(
    State(state): State<AppState>,
    body: Result<Json<PositionSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<PositionReport>), ApiError> {
    let Json(submission) = body?;
    let report = state.gateway.submit_position(&submission).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PositionsQuery {
    pub limit: Option<u64>,
}

impl PositionsQuery {
    fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_POSITION_LIMIT)
            .min(MAX_POSITION_LIMIT)
    }
}

pub async fn bus_positions(
    State(state): State<AppState>,
    Path(bus_id): Path<String>,
    query: Result<Query<PositionsQuery>, QueryRejection>,
) -> Result<Json<Vec<PositionReport>>, ApiError> {
    let Query(query) = query?;
    let positions = state
        .store
        .list_positions(&bus_id, query.effective_limit())
        .await?;
    Ok(Json(positions))
}

#[cfg(test)]
mod tests {
    use super::PositionsQuery;

    #[test]
    fn position_limit_defaults_and_caps() {
        assert_eq!(PositionsQuery::default().effective_limit(), 50);
        assert_eq!(PositionsQuery { limit: Some(7) }.effective_limit(), 7);
        assert_eq!(PositionsQuery { limit: Some(10_000) }.effective_limit(), 500);
    }
}
