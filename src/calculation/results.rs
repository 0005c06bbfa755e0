//! Result records produced by a projection

use serde::{Deserialize, Serialize};

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One simulated month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyResult {
    pub year: u32,
    /// 1-12
    pub month: u32,
    pub balance: f64,
    pub interest: f64,
}

/// One simulated year, folded from its twelve months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyResult {
    pub year: u32,
    pub start_balance: f64,
    pub end_balance: f64,
    pub growth: f64,
    /// `null` when the year started from a zero balance
    pub growth_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationSummary {
    pub initial_investment: f64,
    pub total_deposited: f64,
    pub total_interest_earned: f64,
    pub final_balance: f64,
    pub years: u32,
}

/// Complete projection result, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResponse {
    pub success: bool,
    pub summary: CalculationSummary,
    pub yearly_results: Vec<YearlyResult>,
    pub monthly_results: Vec<MonthlyResult>,
}

impl CalculationResponse {
    /// Monthly rows belonging to one year
    pub fn months_of_year(&self, year: u32) -> impl Iterator<Item = &MonthlyResult> {
        self.monthly_results.iter().filter(move |m| m.year == year)
    }

    /// Total interest across the monthly rows (sum of rounded values)
    pub fn total_monthly_interest(&self) -> f64 {
        self.monthly_results.iter().map(|m| m.interest).sum()
    }
}
