//! Running state of a savings simulation

use super::params::CalculationParams;

/// State of the account at a point in time during a simulation
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Current simulation year (1-indexed, 0 before the first month)
    pub year: u32,

    /// Month within the year (1-12, 0 before the first month)
    pub month: u32,

    /// Running balance at full precision (never rounded)
    pub balance: f64,

    /// Balance at the start of the current year
    pub year_start_balance: f64,

    /// Interest credited in the most recent month
    pub last_interest: f64,

    monthly_deposit: f64,
    monthly_rate: f64,
}

impl SimulationState {
    /// Initialize state from validated parameters at simulation start
    pub fn from_params(params: &CalculationParams) -> Self {
        Self {
            year: 0,
            month: 0,
            balance: params.initial_savings,
            year_start_balance: params.initial_savings,
            last_interest: 0.0,
            monthly_deposit: params.monthly_deposit,
            monthly_rate: params.monthly_rate(),
        }
    }

    /// Roll over to the next year, capturing its starting balance
    pub fn begin_year(&mut self) {
        self.year += 1;
        self.month = 0;
        self.year_start_balance = self.balance;
    }

    /// Advance one month: deposit first, then credit interest on the new balance
    pub fn advance_month(&mut self) {
        self.month += 1;
        self.balance += self.monthly_deposit;
        self.last_interest = self.balance * self.monthly_rate;
        self.balance += self.last_interest;
    }

    /// Growth of the current year so far
    pub fn year_growth(&self) -> f64 {
        self.balance - self.year_start_balance
    }

    /// Growth of the current year relative to its start, in percent
    ///
    /// `None` when the year started from a zero balance.
    pub fn year_growth_percentage(&self) -> Option<f64> {
        if self.year_start_balance == 0.0 {
            None
        } else {
            Some((self.balance / self.year_start_balance - 1.0) * 100.0)
        }
    }
}
