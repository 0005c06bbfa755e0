//! Input validation for calculation requests
//!
//! Checks run in a fixed order and stop at the first failing stage:
//! presence, numeric type, minimum bounds, maximum bounds, whole years.
//! Client and server both run these checks, so the order decides which
//! single error is reported when several fields are wrong at once.

use serde_json::{json, Value};
use thiserror::Error;

use super::params::{CalculationParams, Field, RawInput};
use crate::config::Limits;
use crate::error::{ErrorBody, ErrorCode};

/// A rejected calculation input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing required parameters")]
    Missing {
        missing: Vec<Field>,
        provided: Vec<String>,
    },

    #[error("All parameters must be numeric values")]
    NotNumeric { invalid: Vec<Field> },

    #[error("{}", below_minimum_message(.field, .min))]
    BelowMinimum { field: Field, value: f64, min: f64 },

    #[error("{}", above_maximum_message(.field, .max))]
    AboveMaximum { field: Field, value: f64, max: f64 },

    #[error("Years must be a whole number")]
    FractionalYears { value: f64 },
}

fn below_minimum_message(field: &Field, min: &f64) -> String {
    if *field == Field::Years {
        format!("Years must be greater than {}", min - 1.0)
    } else {
        format!("{} must be a positive number", field.label())
    }
}

fn above_maximum_message(field: &Field, max: &f64) -> String {
    format!(
        "{} exceeds maximum allowed value of {}",
        field.label(),
        field.format_bound(*max)
    )
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::Missing { .. } => ErrorCode::MissingParameters,
            ValidationError::NotNumeric { .. } => ErrorCode::InvalidParameterType,
            ValidationError::BelowMinimum { field, .. } => match field {
                Field::InitialSavings => ErrorCode::NegativeInitialSavings,
                Field::MonthlyDeposit => ErrorCode::NegativeMonthlyDeposit,
                Field::InterestRate => ErrorCode::NegativeInterestRate,
                Field::Years => ErrorCode::InvalidYears,
            },
            ValidationError::AboveMaximum { field, .. } => match field {
                Field::InitialSavings => ErrorCode::ExcessiveInitialSavings,
                Field::MonthlyDeposit => ErrorCode::ExcessiveMonthlyDeposit,
                Field::InterestRate => ErrorCode::ExcessiveInterestRate,
                Field::Years => ErrorCode::ExcessiveYears,
            },
            ValidationError::FractionalYears { .. } => ErrorCode::InvalidYears,
        }
    }

    /// The offending field, when exactly one is identified
    pub fn field(&self) -> Option<Field> {
        match self {
            ValidationError::BelowMinimum { field, .. }
            | ValidationError::AboveMaximum { field, .. } => Some(*field),
            ValidationError::FractionalYears { .. } => Some(Field::Years),
            ValidationError::Missing { .. } | ValidationError::NotNumeric { .. } => None,
        }
    }

    pub fn details(&self) -> Value {
        match self {
            ValidationError::Missing { missing, provided } => json!({
                "requiredParams": Field::ALL.iter().map(|f| f.key()).collect::<Vec<_>>(),
                "providedParams": provided,
                "missingParams": missing.iter().map(|f| f.key()).collect::<Vec<_>>(),
            }),
            ValidationError::NotNumeric { invalid } => json!({
                "invalidParameters": invalid.iter().map(|f| f.key()).collect::<Vec<_>>(),
            }),
            ValidationError::BelowMinimum { value, min, .. } => json!({
                "value": value,
                "minAllowed": min,
            }),
            ValidationError::AboveMaximum { value, max, .. } => json!({
                "value": value,
                "maxAllowed": max,
            }),
            ValidationError::FractionalYears { value } => json!({ "value": value }),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.code(), self.to_string()).with_details(self.details())
    }
}

/// Validate raw input into typed parameters
pub fn validate(input: &RawInput, limits: &Limits) -> Result<CalculationParams, ValidationError> {
    let missing: Vec<Field> = Field::ALL
        .into_iter()
        .filter(|f| input.get(*f).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::Missing {
            missing,
            provided: input.provided_keys.clone(),
        });
    }

    let mut numbers = [0.0_f64; 4];
    let mut invalid = Vec::new();
    for (slot, field) in numbers.iter_mut().zip(Field::ALL) {
        match input.get(field).and_then(|v| v.to_number()) {
            Some(n) => *slot = n,
            None => invalid.push(field),
        }
    }
    if !invalid.is_empty() {
        return Err(ValidationError::NotNumeric { invalid });
    }

    let [initial_savings, monthly_deposit, interest_rate, years] = numbers;
    check_bounds(&numbers, limits)?;

    Ok(CalculationParams {
        initial_savings,
        monthly_deposit,
        interest_rate,
        years: years as u32,
    })
}

/// Re-check already typed parameters (numeric, bounds)
pub fn check_params(params: &CalculationParams, limits: &Limits) -> Result<(), ValidationError> {
    let numbers = Field::ALL.map(|f| params.value(f));

    let invalid: Vec<Field> = Field::ALL
        .into_iter()
        .zip(numbers)
        .filter(|(_, n)| !n.is_finite())
        .map(|(f, _)| f)
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::NotNumeric { invalid });
    }

    check_bounds(&numbers, limits)
}

/// Stages 3-5 over values ordered as `Field::ALL`
fn check_bounds(numbers: &[f64; 4], limits: &Limits) -> Result<(), ValidationError> {
    for (field, &value) in Field::ALL.iter().zip(numbers) {
        let min = limits.for_field(*field).min;
        if value < min {
            return Err(ValidationError::BelowMinimum { field: *field, value, min });
        }
    }

    for (field, &value) in Field::ALL.iter().zip(numbers) {
        let max = limits.for_field(*field).max;
        if value > max {
            return Err(ValidationError::AboveMaximum { field: *field, value, max });
        }
    }

    let years = numbers[3];
    if years.fract() != 0.0 {
        return Err(ValidationError::FractionalYears { value: years });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::RawValue;

    fn raw(savings: f64, deposit: f64, rate: f64, years: f64) -> RawInput {
        RawInput::from_values(savings, deposit, rate, years)
    }

    fn limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn test_valid_input() {
        let params = validate(&raw(1000.0, 100.0, 5.0, 5.0), &limits()).unwrap();
        assert_eq!(params.initial_savings, 1000.0);
        assert_eq!(params.years, 5);
    }

    #[test]
    fn test_zero_is_present_not_missing() {
        let params = validate(&raw(0.0, 0.0, 0.0, 1.0), &limits()).unwrap();
        assert_eq!(params.initial_savings, 0.0);
        assert_eq!(params.interest_rate, 0.0);
    }

    #[test]
    fn test_missing_initial_savings() {
        let mut input = RawInput::default();
        input.set(Field::MonthlyDeposit, RawValue::Number(100.0));
        input.set(Field::InterestRate, RawValue::Number(5.0));
        input.set(Field::Years, RawValue::Number(5.0));

        let err = validate(&input, &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingParameters);
        assert_eq!(err.details()["missingParams"], serde_json::json!(["initialSavings"]));
        assert_eq!(
            err.details()["providedParams"],
            serde_json::json!(["monthlyDeposit", "interestRate", "years"])
        );
    }

    #[test]
    fn test_missing_wins_over_non_numeric() {
        let mut input = RawInput::default();
        input.set(Field::InitialSavings, RawValue::from("abc"));
        let err = validate(&input, &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingParameters);
    }

    #[test]
    fn test_non_numeric_lists_every_field() {
        let input = RawInput::from_values("abc", 100.0, RawValue::Unsupported, 5.0);
        let err = validate(&input, &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameterType);
        assert_eq!(
            err.details()["invalidParameters"],
            serde_json::json!(["initialSavings", "interestRate"])
        );
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let input = RawInput::from_values("1000", " 100.5 ", "4", "10");
        let params = validate(&input, &limits()).unwrap();
        assert_eq!(params.monthly_deposit, 100.5);
        assert_eq!(params.years, 10);
    }

    #[test]
    fn test_minimum_checked_before_maximum() {
        // Negative deposit and excessive savings: all minimum checks run first
        let err = validate(&raw(2_000_000.0, -1.0, 5.0, 5.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NegativeMonthlyDeposit);
        assert_eq!(err.to_string(), "Monthly deposit must be a positive number");
    }

    #[test]
    fn test_first_field_wins_within_stage() {
        let err = validate(&raw(-1.0, -1.0, -1.0, 0.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NegativeInitialSavings);
        assert_eq!(err.field(), Some(Field::InitialSavings));
    }

    #[test]
    fn test_initial_savings_boundary() {
        assert!(validate(&raw(1_000_000.0, 0.0, 5.0, 5.0), &limits()).is_ok());

        let err = validate(&raw(1_000_000.01, 0.0, 5.0, 5.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExcessiveInitialSavings);
        assert_eq!(
            err.to_string(),
            "Initial savings exceeds maximum allowed value of $1,000,000"
        );
        assert_eq!(err.details()["maxAllowed"], serde_json::json!(1_000_000.0));
    }

    #[test]
    fn test_years_boundaries() {
        assert!(validate(&raw(0.0, 0.0, 5.0, 100.0), &limits()).is_ok());

        let err = validate(&raw(0.0, 0.0, 5.0, 101.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExcessiveYears);
        assert_eq!(err.to_string(), "Years exceeds maximum allowed value of 100");

        let err = validate(&raw(0.0, 0.0, 5.0, 0.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidYears);
        assert_eq!(err.to_string(), "Years must be greater than 0");
    }

    #[test]
    fn test_fractional_years() {
        let err = validate(&raw(0.0, 0.0, 5.0, 2.5), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidYears);
        assert_eq!(err.to_string(), "Years must be a whole number");
    }

    #[test]
    fn test_interest_rate_bounds() {
        assert!(validate(&raw(0.0, 0.0, 20.0, 1.0), &limits()).is_ok());

        let err = validate(&raw(0.0, 0.0, 20.5, 1.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExcessiveInterestRate);
        assert_eq!(err.to_string(), "Interest rate exceeds maximum allowed value of 20%");

        let err = validate(&raw(0.0, 0.0, -0.1, 1.0), &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NegativeInterestRate);
    }

    #[test]
    fn test_check_params_rejects_direct_construction() {
        let params = CalculationParams {
            initial_savings: 0.0,
            monthly_deposit: 20_000.0,
            interest_rate: 5.0,
            years: 1,
        };
        let err = check_params(&params, &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExcessiveMonthlyDeposit);

        let params = CalculationParams { initial_savings: f64::NAN, ..params };
        let err = check_params(&params, &limits()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameterType);
    }

    #[test]
    fn test_to_body() {
        let err = validate(&raw(0.0, 10_001.0, 5.0, 1.0), &limits()).unwrap_err();
        let body = err.to_body();
        assert_eq!(body.error, ErrorCode::ExcessiveMonthlyDeposit);
        assert_eq!(
            body.message,
            "Monthly deposit exceeds maximum allowed value of $10,000"
        );
        assert_eq!(body.detail("value"), Some(&serde_json::json!(10_001.0)));
    }
}
