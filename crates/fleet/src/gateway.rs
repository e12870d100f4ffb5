use crate::api::{NewPosition, PositionApi, PositionReport, PositionSubmission};
use crate::registry::FleetRegistry;
use crate::store::{FleetStore, run_detached};
use crate::validate::{
    LATITUDE_RANGE, LONGITUDE_RANGE, parse_coordinate, parse_flag, parse_identifier,
};
use crate::{FleetError, FleetResult};

/// Entry point for reports from in-vehicle agents.
#[derive(Clone)]
pub struct IngestionGateway {
    registry: FleetRegistry,
    store: FleetStore,
}

impl IngestionGateway {
    pub fn new(registry: FleetRegistry, store: FleetStore) -> Self {
        Self { registry, store }
    }

    /// Validate, then hand the write to its own task so a dropped caller
    /// cannot cut it short.
    pub async fn submit_position(
        &self,
        submission: &PositionSubmission,
    ) -> FleetResult<PositionReport> {
        let position = validate_submission(submission)?;
        let gateway = self.clone();
        run_detached(async move { gateway.write_position(position).await }).await
    }

    async fn write_position(&self, position: NewPosition) -> FleetResult<PositionReport> {
        if !self.registry.bus_exists(&position.bus_id).await? {
            log::warn!(
                "fleet: rejected position for unregistered bus {}",
                position.bus_id
            );
            return Err(FleetError::conflict(format!(
                "bus {} does not exist",
                position.bus_id
            )));
        }
        self.store.record_position(position).await
    }
}

fn validate_submission(submission: &PositionSubmission) -> FleetResult<NewPosition> {
    Ok(NewPosition {
        bus_id: parse_identifier("bus_id", submission.bus_id.as_deref())?,
        latitude: parse_coordinate("latitude", submission.latitude.as_ref(), LATITUDE_RANGE)?,
        longitude: parse_coordinate(
            "longitude",
            submission.longitude.as_ref(),
            LONGITUDE_RANGE,
        )?,
        next_bus_stop_id: parse_identifier(
            "next_bus_stop_id",
            submission.next_bus_stop_id.as_deref(),
        )?,
        is_bus_stop: parse_flag("is_bus_stop", submission.is_bus_stop.as_ref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::validate_submission;
    use crate::api::{FieldValue, PositionSubmission};

    #[test]
    fn string_encoded_fields_are_parsed() {
        let submission = PositionSubmission {
            bus_id: Some("492".to_string()),
            latitude: Some(FieldValue::Text("41.9".to_string())),
            longitude: Some(FieldValue::Text("12.5".to_string())),
            next_bus_stop_id: Some("2".to_string()),
            is_bus_stop: Some(FieldValue::Text("false".to_string())),
        };
        let position = validate_submission(&submission).expect("valid");
        assert_eq!(position.bus_id, "492");
        assert_eq!(position.latitude, 41.9);
        assert_eq!(position.longitude, 12.5);
        assert!(!position.is_bus_stop);
    }

    #[test]
    fn missing_next_stop_is_rejected() {
        let submission = PositionSubmission {
            bus_id: Some("492".to_string()),
            latitude: Some(FieldValue::Number(41.9)),
            longitude: Some(FieldValue::Number(12.5)),
            next_bus_stop_id: None,
            is_bus_stop: Some(FieldValue::Bool(true)),
        };
        let err = validate_submission(&submission).expect_err("invalid");
        assert_eq!(err.code(), "validation_failed");
    }
}
