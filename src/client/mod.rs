//! Client side of the calculator: form state, live validation and the
//! debounced request orchestrator

pub mod form;
pub mod messages;
pub mod orchestrator;
pub mod transport;

pub use form::{validate_field, FieldErrors, FormState};
pub use messages::{user_message, ErrorCategory};
pub use orchestrator::{
    spawn, CalculationFailure, Command, OrchestratorConfig, OrchestratorError, OrchestratorHandle,
    ViewState, DEFAULT_DEBOUNCE,
};
pub use transport::{CalculationTransport, ClientError, HttpTransport};
