use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("validation error: {message}")]
    Validation { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("referential integrity violation: {message}")]
    ReferentialIntegrity { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
}

impl FleetError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn referential(message: impl Into<String>) -> Self {
        Self::ReferentialIntegrity {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Stable snake_case class used by outer surfaces.
    pub fn code(&self) -> &'static str {
        match self {
            FleetError::Validation { .. } => "validation_failed",
            FleetError::Conflict { .. } => "conflict",
            FleetError::ReferentialIntegrity { .. } => "referential_integrity",
            FleetError::Storage { .. } => "storage_unavailable",
            FleetError::NotFound { .. } => "not_found",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FleetError::Validation { message }
            | FleetError::Conflict { message }
            | FleetError::ReferentialIntegrity { message }
            | FleetError::Storage { message }
            | FleetError::NotFound { message } => message,
        }
    }
}

pub type FleetResult<T> = Result<T, FleetError>;

impl From<DbErr> for FleetError {
    fn from(value: DbErr) -> Self {
        match value.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => FleetError::conflict(detail),
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => FleetError::referential(detail),
            _ => classify_message(value.to_string()),
        }
    }
}

// Drivers do not always surface a structured code (e.g. errors raised inside a
// transaction commit), so fall back to the engine's wording.
fn classify_message(message: String) -> FleetError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("foreign key constraint") {
        FleetError::referential(message)
    } else if lowered.contains("unique constraint") || lowered.contains("duplicate key value") {
        FleetError::conflict(message)
    } else {
        FleetError::storage(message)
    }
}

#[cfg(test)]
mod tests {
    use super::{FleetError, classify_message};
    use sea_orm::DbErr;

    #[test]
    fn helper_constructors_set_variants() {
        let err = FleetError::validation("bad");
        assert!(matches!(err, FleetError::Validation { .. }));
        let err = FleetError::conflict("dup");
        assert!(matches!(err, FleetError::Conflict { .. }));
        let err = FleetError::referential("fk");
        assert!(matches!(err, FleetError::ReferentialIntegrity { .. }));
        let err = FleetError::storage("disk");
        assert!(matches!(err, FleetError::Storage { .. }));
        let err = FleetError::not_found("missing");
        assert!(matches!(err, FleetError::NotFound { .. }));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(FleetError::validation("x").code(), "validation_failed");
        assert_eq!(FleetError::conflict("x").code(), "conflict");
        assert_eq!(FleetError::referential("x").code(), "referential_integrity");
        assert_eq!(FleetError::storage("x").code(), "storage_unavailable");
        assert_eq!(FleetError::not_found("x").code(), "not_found");
        assert_eq!(FleetError::conflict("bus 7 exists").message(), "bus 7 exists");
    }

    #[test]
    fn engine_messages_are_classified() {
        assert!(matches!(
            classify_message("FOREIGN KEY constraint failed".to_string()),
            FleetError::ReferentialIntegrity { .. }
        ));
        assert!(matches!(
            classify_message(
                "duplicate key value violates unique constraint \"bus_pkey\"".to_string()
            ),
            FleetError::Conflict { .. }
        ));
        assert!(matches!(
            classify_message("UNIQUE constraint failed: bus.id".to_string()),
            FleetError::Conflict { .. }
        ));
        assert!(matches!(
            classify_message("connection refused".to_string()),
            FleetError::Storage { .. }
        ));
    }

    #[test]
    fn unstructured_db_errors_become_storage() {
        let err = FleetError::from(DbErr::Custom("pool timed out".to_string()));
        assert!(matches!(err, FleetError::Storage { .. }));
    }
}
