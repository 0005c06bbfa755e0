//! Calculation inputs: raw (untrusted) and validated forms

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One of the four calculator inputs, in validation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    InitialSavings,
    MonthlyDeposit,
    InterestRate,
    Years,
}

impl Field {
    /// All fields in the fixed order used by every validation stage
    pub const ALL: [Field; 4] = [
        Field::InitialSavings,
        Field::MonthlyDeposit,
        Field::InterestRate,
        Field::Years,
    ];

    /// Wire name (JSON key)
    pub fn key(self) -> &'static str {
        match self {
            Field::InitialSavings => "initialSavings",
            Field::MonthlyDeposit => "monthlyDeposit",
            Field::InterestRate => "interestRate",
            Field::Years => "years",
        }
    }

    /// Human label used at the start of messages
    pub fn label(self) -> &'static str {
        match self {
            Field::InitialSavings => "Initial savings",
            Field::MonthlyDeposit => "Monthly deposit",
            Field::InterestRate => "Interest rate",
            Field::Years => "Years",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Format a bound for display ("$1,000,000", "20%", "100")
    pub fn format_bound(self, value: f64) -> String {
        match self {
            Field::InitialSavings | Field::MonthlyDeposit => format!("${}", group_thousands(value)),
            Field::InterestRate => format!("{}%", value),
            Field::Years => format!("{}", value),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Group the integer part of a value with commas: 1000000 -> "1,000,000"
fn group_thousands(value: f64) -> String {
    let text = format!("{}", value);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// A single raw input value as received from a form, request body or CLI
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    /// Present, but of a type that can never be numeric (null, bool, array, object)
    Unsupported,
}

impl RawValue {
    /// The finite number this value denotes, if any
    pub fn to_number(&self) -> Option<f64> {
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Unsupported => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Unsupported),
            Value::String(s) => RawValue::Text(s.clone()),
            _ => RawValue::Unsupported,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

/// Untrusted calculator input: each field may be absent, non-numeric or out of range
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    pub initial_savings: Option<RawValue>,
    pub monthly_deposit: Option<RawValue>,
    pub interest_rate: Option<RawValue>,
    pub years: Option<RawValue>,
    /// Every key the caller supplied, including unknown ones
    pub provided_keys: Vec<String>,
}

impl RawInput {
    /// Build with all four fields present
    pub fn from_values(
        initial_savings: impl Into<RawValue>,
        monthly_deposit: impl Into<RawValue>,
        interest_rate: impl Into<RawValue>,
        years: impl Into<RawValue>,
    ) -> Self {
        let mut input = Self::default();
        input.set(Field::InitialSavings, initial_savings.into());
        input.set(Field::MonthlyDeposit, monthly_deposit.into());
        input.set(Field::InterestRate, interest_rate.into());
        input.set(Field::Years, years.into());
        input
    }

    pub fn get(&self, field: Field) -> Option<&RawValue> {
        match field {
            Field::InitialSavings => self.initial_savings.as_ref(),
            Field::MonthlyDeposit => self.monthly_deposit.as_ref(),
            Field::InterestRate => self.interest_rate.as_ref(),
            Field::Years => self.years.as_ref(),
        }
    }

    pub fn set(&mut self, field: Field, value: RawValue) {
        let slot = match field {
            Field::InitialSavings => &mut self.initial_savings,
            Field::MonthlyDeposit => &mut self.monthly_deposit,
            Field::InterestRate => &mut self.interest_rate,
            Field::Years => &mut self.years,
        };
        *slot = Some(value);
        if !self.provided_keys.iter().any(|k| k == field.key()) {
            self.provided_keys.push(field.key().to_string());
        }
    }
}

/// Validated calculation parameters
///
/// Constructing one directly bypasses validation; the projection engine
/// re-checks bounds before simulating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationParams {
    pub initial_savings: f64,
    pub monthly_deposit: f64,
    /// Annual rate as a percentage (5.0 = 5%)
    pub interest_rate: f64,
    pub years: u32,
}

impl CalculationParams {
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::InitialSavings => self.initial_savings,
            Field::MonthlyDeposit => self.monthly_deposit,
            Field::InterestRate => self.interest_rate,
            Field::Years => self.years as f64,
        }
    }

    /// Monthly compounding rate as a fraction
    pub fn monthly_rate(&self) -> f64 {
        (self.interest_rate / 100.0) / 12.0
    }
}
