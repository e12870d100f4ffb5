use crate::api::FieldValue;
use crate::{FleetError, FleetResult};

/// Widest identifier the schema stores.
pub const MAX_IDENTIFIER_LEN: usize = 36;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

pub fn parse_identifier(field: &str, value: Option<&str>) -> FleetResult<String> {
    let raw = value.ok_or_else(|| FleetError::validation(format!("{field} is required")))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FleetError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(FleetError::validation(format!(
            "{field} exceeds {MAX_IDENTIFIER_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn parse_coordinate(
    field: &str,
    value: Option<&FieldValue>,
    (min, max): (f64, f64),
) -> FleetResult<f64> {
    let number = match value {
        None => return Err(FleetError::validation(format!("{field} is required"))),
        Some(FieldValue::Number(number)) => *number,
        Some(FieldValue::Text(text)) => text.trim().parse::<f64>().map_err(|_| {
            FleetError::validation(format!("{field} is not a number: {text:?}"))
        })?,
        Some(FieldValue::Bool(_)) => {
            return Err(FleetError::validation(format!("{field} must be a number")));
        }
    };
    if !number.is_finite() || number < min || number > max {
        return Err(FleetError::validation(format!(
            "{field} {number} outside [{min}, {max}]"
        )));
    }
    Ok(number)
}

pub fn parse_flag(field: &str, value: Option<&FieldValue>) -> FleetResult<bool> {
    match value {
        None => Err(FleetError::validation(format!("{field} is required"))),
        Some(FieldValue::Bool(flag)) => Ok(*flag),
        Some(FieldValue::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(FleetError::validation(format!(
                "{field} is not a boolean: {text:?}"
            ))),
        },
        Some(FieldValue::Number(_)) => {
            Err(FleetError::validation(format!("{field} must be a boolean")))
        }
    }
}
