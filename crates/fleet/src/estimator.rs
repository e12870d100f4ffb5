use time::{Duration, OffsetDateTime};

use crate::api::{ArrivalEstimate, ReferenceDataApi, RouteOffset};
use crate::store::FleetStore;
use crate::{FleetError, FleetResult};

/// Projects nominal arrival times from the static time table.
///
/// The projection assumes the bus departs at the snapshot instant and follows
/// the schedule exactly; live positions are not consulted.
#[derive(Clone)]
pub struct ArrivalEstimator {
    store: FleetStore,
}

impl ArrivalEstimator {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    pub async fn estimate_arrivals(&self, bus_id: &str) -> FleetResult<Vec<ArrivalEstimate>> {
        self.estimate_arrivals_at(bus_id, OffsetDateTime::now_utc())
            .await
    }

    pub async fn estimate_arrivals_at(
        &self,
        bus_id: &str,
        now: OffsetDateTime,
    ) -> FleetResult<Vec<ArrivalEstimate>> {
        let offsets = self
            .store
            .list_route_offsets(bus_id)
            .await
            .map_err(|err| {
                FleetError::not_found(format!("schedule for bus {bus_id} unavailable: {err}"))
            })?;
        Ok(project_arrivals(&offsets, now))
    }
}

/// Every estimate shares the single `now` snapshot.
pub fn project_arrivals(offsets: &[RouteOffset], now: OffsetDateTime) -> Vec<ArrivalEstimate> {
    let mut ordered: Vec<&RouteOffset> = offsets.iter().collect();
    ordered.sort_by(|a, b| {
        a.time_seconds
            .cmp(&b.time_seconds)
            .then_with(|| a.bus_stop_id.cmp(&b.bus_stop_id))
    });
    ordered
        .into_iter()
        .map(|offset| ArrivalEstimate {
            bus_id: offset.bus_id.clone(),
            bus_stop_id: offset.bus_stop_id.clone(),
            time_seconds: offset.time_seconds,
            timestamp: now + Duration::seconds(offset.time_seconds),
        })
        .collect()
}
