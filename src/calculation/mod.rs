//! Savings calculation: validation and compound-interest projection

mod params;
mod state;
mod results;
mod engine;
pub mod validation;

pub use params::{CalculationParams, Field, RawInput, RawValue};
pub use state::SimulationState;
pub use results::{round2, CalculationResponse, CalculationSummary, MonthlyResult, YearlyResult};
pub use engine::{project, ProjectionEngine};
pub use validation::{validate, ValidationError};
