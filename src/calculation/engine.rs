//! Month-by-month compound interest projection

use super::params::CalculationParams;
use super::results::{
    round2, CalculationResponse, CalculationSummary, MonthlyResult, YearlyResult,
};
use super::state::SimulationState;
use super::validation::{check_params, ValidationError};
use crate::config::Limits;

/// Projection engine
///
/// Stateless apart from its validation window, so one instance can be shared
/// by any number of concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct ProjectionEngine {
    limits: Limits,
}

impl ProjectionEngine {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Run a full projection
    ///
    /// Parameters are re-checked first; an invalid set fails before any
    /// month is simulated.
    pub fn project(&self, params: &CalculationParams) -> Result<CalculationResponse, ValidationError> {
        check_params(params, &self.limits)?;

        let mut state = SimulationState::from_params(params);
        let mut yearly_results = Vec::with_capacity(params.years as usize);
        let mut monthly_results = Vec::with_capacity(params.years as usize * 12);

        for _year in 1..=params.years {
            state.begin_year();

            for _month in 1..=12 {
                state.advance_month();
                monthly_results.push(MonthlyResult {
                    year: state.year,
                    month: state.month,
                    balance: round2(state.balance),
                    interest: round2(state.last_interest),
                });
            }

            yearly_results.push(YearlyResult {
                year: state.year,
                start_balance: round2(state.year_start_balance),
                end_balance: round2(state.balance),
                growth: round2(state.year_growth()),
                growth_percentage: state.year_growth_percentage().map(round2),
            });
        }

        let total_deposited = params.monthly_deposit * 12.0 * params.years as f64;
        let total_interest_earned = state.balance - params.initial_savings - total_deposited;

        log::debug!(
            "Projected {} years: final balance {:.2}, interest {:.2}",
            params.years,
            state.balance,
            total_interest_earned
        );

        Ok(CalculationResponse {
            success: true,
            summary: CalculationSummary {
                initial_investment: params.initial_savings,
                total_deposited: round2(total_deposited),
                total_interest_earned: round2(total_interest_earned),
                final_balance: round2(state.balance),
                years: params.years,
            },
            yearly_results,
            monthly_results,
        })
    }
}

/// Project with the default validation window
pub fn project(params: &CalculationParams) -> Result<CalculationResponse, ValidationError> {
    ProjectionEngine::default().project(params)
}
