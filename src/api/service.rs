//! Transport-independent request handling
//!
//! Every server variant (axum, Lambda) hands the raw request body here, so
//! parsing, validation and projection behave identically across deployments.

use std::collections::BTreeMap;

use serde_json::value::RawValue as JsonText;
use serde_json::Value;

use super::error::{ApiError, Result};
use crate::calculation::{
    validate, CalculationResponse, Field, ProjectionEngine, RawInput, RawValue,
};

/// Parse a JSON request body into raw calculator input
///
/// An empty body counts as an empty object so that it surfaces as missing
/// parameters rather than a parse failure. Field values are decoded one at a
/// time, so a number literal outside the `f64` range only makes its own field
/// non-numeric.
pub fn parse_body(body: &[u8]) -> Result<RawInput> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RawInput::default());
    }

    let fields: BTreeMap<String, Box<JsonText>> =
        serde_json::from_slice(body).map_err(|e| not_an_object(body, e))?;

    let mut input = RawInput {
        provided_keys: fields.keys().cloned().collect(),
        ..Default::default()
    };
    for field in Field::ALL {
        if let Some(text) = fields.get(field.key()) {
            let value = serde_json::from_str::<Value>(text.get())
                .map(|v| RawValue::from(&v))
                .unwrap_or(RawValue::Unsupported);
            input.set(field, value);
        }
    }
    Ok(input)
}

fn not_an_object(body: &[u8], err: serde_json::Error) -> ApiError {
    match serde_json::from_slice::<Value>(body) {
        Ok(other) => ApiError::InvalidBody(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        )),
        Err(_) => ApiError::InvalidBody(err.to_string()),
    }
}

/// Validate and project a raw request body
pub fn calculate(engine: &ProjectionEngine, body: &[u8]) -> Result<CalculationResponse> {
    let input = parse_body(body)?;
    let params = validate(&input, engine.limits())?;

    log::debug!(
        "Calculating: initial={} deposit={} rate={}% years={}",
        params.initial_savings,
        params.monthly_deposit,
        params.interest_rate,
        params.years
    );

    Ok(engine.project(&params)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
