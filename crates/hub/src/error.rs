use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use busline_fleet::FleetError;
use serde::Serialize;

/// JSON error envelope returned by every route.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Collapse any failure to a 500 while keeping its code and message.
    pub fn internal(mut self) -> Self {
        self.status = StatusCode::INTERNAL_SERVER_ERROR;
        self
    }
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        let status = match err {
            FleetError::Validation { .. } => StatusCode::BAD_REQUEST,
            FleetError::Conflict { .. } => StatusCode::CONFLICT,
            FleetError::ReferentialIntegrity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            FleetError::NotFound { .. } => StatusCode::NOT_FOUND,
            FleetError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("hub: fleet error code={} detail={err}", err.code());
        } else {
            log::warn!("hub: request rejected code={} detail={err}", err.code());
        }
        Self::new(status, err.code(), err.message())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        log::warn!("hub: malformed body: {}", rejection.body_text());
        Self::new(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use busline_fleet::FleetError;

    use super::ApiError;

    #[test]
    fn fleet_errors_map_to_statuses() {
        let cases = [
            (FleetError::validation("x"), StatusCode::BAD_REQUEST),
            (FleetError::conflict("x"), StatusCode::CONFLICT),
            (FleetError::referential("x"), StatusCode::UNPROCESSABLE_ENTITY),
            (FleetError::not_found("x"), StatusCode::NOT_FOUND),
            (FleetError::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn envelope_carries_code_and_message_only() {
        let err = ApiError::from(FleetError::conflict("bus 7 already exists"));
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"code": "conflict", "message": "bus 7 already exists"})
        );
        assert_eq!(
            err.internal().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
