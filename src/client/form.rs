//! Form state as typed by the user, with live per-field validation

use std::collections::BTreeMap;

use crate::calculation::{CalculationParams, Field, RawValue};
use crate::config::Limits;

/// The four inputs exactly as typed
///
/// Raw strings are kept so that in-progress input such as `"100."` survives
/// until the user finishes typing.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub initial_savings: String,
    pub monthly_deposit: String,
    pub interest_rate: String,
    pub years: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            initial_savings: "1000".to_string(),
            monthly_deposit: "100".to_string(),
            interest_rate: "4".to_string(),
            years: "50".to_string(),
        }
    }
}

/// Per-field messages for the fields that currently fail validation
pub type FieldErrors = BTreeMap<Field, String>;

impl FormState {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::InitialSavings => &self.initial_savings,
            Field::MonthlyDeposit => &self.monthly_deposit,
            Field::InterestRate => &self.interest_rate,
            Field::Years => &self.years,
        }
    }

    pub fn set(&mut self, field: Field, raw: impl Into<String>) {
        let slot = match field {
            Field::InitialSavings => &mut self.initial_savings,
            Field::MonthlyDeposit => &mut self.monthly_deposit,
            Field::InterestRate => &mut self.interest_rate,
            Field::Years => &mut self.years,
        };
        *slot = raw.into();
    }

    /// Messages for every invalid field
    pub fn errors(&self, limits: &Limits) -> FieldErrors {
        Field::ALL
            .into_iter()
            .filter_map(|field| validate_field(field, self.get(field), limits).map(|m| (field, m)))
            .collect()
    }

    pub fn is_valid(&self, limits: &Limits) -> bool {
        Field::ALL
            .into_iter()
            .all(|field| validate_field(field, self.get(field), limits).is_none())
    }

    /// Numeric values to send: unparsable fields become 0, years are floored
    pub fn to_params(&self) -> CalculationParams {
        let number = |field: Field| RawValue::from(self.get(field)).to_number().unwrap_or(0.0);
        let years = number(Field::Years).floor();

        CalculationParams {
            initial_savings: number(Field::InitialSavings),
            monthly_deposit: number(Field::MonthlyDeposit),
            interest_rate: number(Field::InterestRate),
            years: if years > 0.0 { years as u32 } else { 0 },
        }
    }
}

/// Live validation message for one field, `None` when the value is acceptable
pub fn validate_field(field: Field, raw: &str, limits: &Limits) -> Option<String> {
    let bounds = limits.for_field(field);

    let Some(value) = RawValue::from(raw).to_number() else {
        return Some(below_minimum(field, bounds.min));
    };

    if value < bounds.min {
        return Some(below_minimum(field, bounds.min));
    }
    if value > bounds.max {
        return Some(format!(
            "{} cannot exceed {}",
            field.label(),
            field.format_bound(bounds.max)
        ));
    }
    if field == Field::Years && value.fract() != 0.0 {
        return Some("Years must be a whole number".to_string());
    }

    None
}

fn below_minimum(field: Field, min: f64) -> String {
    match field {
        Field::Years => format!("Years must be greater than {}", min - 1.0),
        other => format!("{} must be a positive number", other.label()),
    }
}
