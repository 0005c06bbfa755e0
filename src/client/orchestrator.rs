//! Debounced request orchestration for the calculator form
//!
//! A single actor task owns the form, the debounce deadline and the request
//! sequence counter. Callers drive it through an [`OrchestratorHandle`] and
//! observe it through a `watch` channel of [`ViewState`] snapshots.
//!
//! Every request carries a sequence number. A response is applied only if it
//! is newer than the last one applied, so an early request that resolves late
//! never overwrites a later result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::form::{FieldErrors, FormState};
use super::messages::{ErrorCategory, FORM_INVALID_MESSAGE};
use super::transport::{CalculationTransport, ClientError};
use crate::calculation::{CalculationParams, CalculationResponse, Field};
use crate::config::Limits;
use crate::error::ErrorCode;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Quiet period after the last qualifying edit before a request is sent
    pub debounce: Duration,
    /// Send one request for the initial form as soon as the actor starts
    pub calculate_on_start: bool,
    pub limits: Limits,
    pub initial_form: FormState,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            calculate_on_start: true,
            limits: Limits::default(),
            initial_form: FormState::default(),
        }
    }
}

/// A failed calculation, ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationFailure {
    pub category: ErrorCategory,
    pub code: Option<ErrorCode>,
    pub message: String,
}

impl CalculationFailure {
    fn from_client_error(err: &ClientError) -> Self {
        Self {
            category: err.category(),
            code: err.code(),
            message: err.user_message(),
        }
    }

    pub fn title(&self) -> &'static str {
        self.category.title()
    }
}

/// Snapshot of everything a view needs to render
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub form: FormState,
    pub field_errors: FieldErrors,
    /// A request is pending (debouncing) or in flight
    pub loading: bool,
    /// Last successfully applied result
    pub result: Option<CalculationResponse>,
    pub error: Option<CalculationFailure>,
    /// Form-level message, set when a manual calculation is refused
    pub notice: Option<String>,
    /// Total requests handed to the transport
    pub requests_sent: u64,
}

impl ViewState {
    /// Retry is offered whenever an error is displayed
    pub fn can_retry(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetField(Field, String),
    /// Validate and send immediately, bypassing the debounce
    Calculate,
    /// Re-send the last request
    Retry,
    Shutdown,
}

#[derive(Debug, Error, PartialEq)]
pub enum OrchestratorError {
    #[error("orchestrator has stopped")]
    Stopped,
}

/// Cloneable handle to a running orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<ViewState>,
}

impl OrchestratorHandle {
    pub fn send(&self, command: Command) -> Result<(), OrchestratorError> {
        self.commands.send(command).map_err(|_| OrchestratorError::Stopped)
    }

    pub fn set_field(&self, field: Field, raw: impl Into<String>) -> Result<(), OrchestratorError> {
        self.send(Command::SetField(field, raw.into()))
    }

    pub fn calculate(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Calculate)
    }

    pub fn retry(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Retry)
    }

    pub fn shutdown(&self) -> Result<(), OrchestratorError> {
        self.send(Command::Shutdown)
    }

    /// Current snapshot
    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// A receiver notified on every view change
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }
}

/// Start the orchestrator actor on the current tokio runtime
pub fn spawn(
    transport: Arc<dyn CalculationTransport>,
    config: OrchestratorConfig,
) -> (OrchestratorHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();

    let form = config.initial_form.clone();
    let initial_view = ViewState {
        field_errors: form.errors(&config.limits),
        form: form.clone(),
        ..Default::default()
    };
    let (view_tx, view_rx) = watch::channel(initial_view);

    let actor = Orchestrator {
        transport,
        config,
        form,
        deadline: None,
        next_seq: 0,
        last_applied: 0,
        in_flight: 0,
        last_sent: None,
        responses: response_tx,
        view: view_tx,
    };
    let task = tokio::spawn(actor.run(command_rx, response_rx));

    (
        OrchestratorHandle {
            commands: command_tx,
            view: view_rx,
        },
        task,
    )
}

type Reply = (u64, Result<CalculationResponse, ClientError>);

struct Orchestrator {
    transport: Arc<dyn CalculationTransport>,
    config: OrchestratorConfig,
    form: FormState,
    /// When the pending debounced request fires
    deadline: Option<Instant>,
    next_seq: u64,
    last_applied: u64,
    in_flight: usize,
    last_sent: Option<CalculationParams>,
    responses: mpsc::UnboundedSender<Reply>,
    view: watch::Sender<ViewState>,
}

impl Orchestrator {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut replies: mpsc::UnboundedReceiver<Reply>,
    ) {
        if self.config.calculate_on_start && self.form.is_valid(&self.config.limits) {
            self.send(self.form.to_params());
        }

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some((seq, reply)) = replies.recv() => self.apply(seq, reply),
                _ = wait_until(self.deadline) => {
                    self.deadline = None;
                    self.send(self.form.to_params());
                }
            }
        }

        log::debug!("Orchestrator stopped after {} requests", self.next_seq);
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetField(field, raw) => self.set_field(field, raw),
            Command::Calculate => self.calculate(),
            Command::Retry => match self.last_sent {
                Some(params) => self.send(params),
                None => self.calculate(),
            },
            Command::Shutdown => {}
        }
    }

    fn set_field(&mut self, field: Field, raw: String) {
        self.form.set(field, raw);
        let errors = self.form.errors(&self.config.limits);

        // Restart on every qualifying edit; an invalid form cancels
        self.deadline = if errors.is_empty() {
            Some(Instant::now() + self.config.debounce)
        } else {
            None
        };

        let form = self.form.clone();
        let loading = self.is_busy();
        self.view.send_modify(|view| {
            view.form = form;
            view.field_errors = errors;
            view.notice = None;
            view.loading = loading;
        });
    }

    fn calculate(&mut self) {
        let errors = self.form.errors(&self.config.limits);
        if !errors.is_empty() {
            log::debug!("Manual calculation refused: {} invalid fields", errors.len());
            self.view.send_modify(|view| {
                view.field_errors = errors;
                view.notice = Some(FORM_INVALID_MESSAGE.to_string());
            });
            return;
        }

        self.deadline = None;
        self.send(self.form.to_params());
    }

    fn send(&mut self, params: CalculationParams) {
        self.next_seq += 1;
        self.in_flight += 1;
        self.last_sent = Some(params);

        let seq = self.next_seq;
        log::debug!("Sending calculation #{}: {:?}", seq, params);

        let transport = Arc::clone(&self.transport);
        let replies = self.responses.clone();
        tokio::spawn(async move {
            let reply = transport.calculate(&params).await;
            // The actor may already be gone
            let _ = replies.send((seq, reply));
        });

        self.view.send_modify(|view| {
            view.loading = true;
            view.error = None;
            view.notice = None;
            view.requests_sent = seq;
        });
    }

    fn apply(&mut self, seq: u64, reply: Result<CalculationResponse, ClientError>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let loading = self.is_busy();

        if seq <= self.last_applied {
            log::debug!(
                "Dropping stale response #{} (already applied #{})",
                seq,
                self.last_applied
            );
            self.view.send_modify(|view| view.loading = loading);
            return;
        }
        self.last_applied = seq;

        match reply {
            Ok(response) => self.view.send_modify(|view| {
                view.result = Some(response);
                view.error = None;
                view.loading = loading;
            }),
            Err(err) => {
                log::warn!("Calculation #{} failed: {}", seq, err);
                let failure = CalculationFailure::from_client_error(&err);
                self.view.send_modify(|view| {
                    view.error = Some(failure);
                    view.loading = loading;
                });
            }
        }
    }

    fn is_busy(&self) -> bool {
        self.deadline.is_some() || self.in_flight > 0
    }
}

fn wait_until(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation;
    use crate::client::messages::NETWORK_MESSAGE;
    use crate::error::ErrorBody;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::sleep;

    /// Computes locally; each call can be scripted with a delay and a failure
    #[derive(Default)]
    struct MockTransport {
        calls: Mutex<Vec<CalculationParams>>,
        script: Mutex<VecDeque<(Duration, Option<ClientError>)>>,
    }

    impl MockTransport {
        fn scripted(steps: Vec<(Duration, Option<ClientError>)>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into()),
                ..Default::default()
            })
        }

        fn calls(&self) -> Vec<CalculationParams> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CalculationTransport for MockTransport {
        async fn calculate(
            &self,
            params: &CalculationParams,
        ) -> Result<CalculationResponse, ClientError> {
            self.calls.lock().unwrap().push(*params);
            let (delay, failure) = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((Duration::ZERO, None));

            sleep(delay).await;
            match failure {
                Some(err) => Err(err),
                None => calculation::project(params).map_err(|e| ClientError::Api {
                    status: 400,
                    body: e.to_body(),
                }),
            }
        }
    }

    fn quiet_config() -> OrchestratorConfig {
        OrchestratorConfig {
            calculate_on_start: false,
            ..Default::default()
        }
    }

    fn start(transport: &Arc<MockTransport>, config: OrchestratorConfig) -> OrchestratorHandle {
        let (handle, _task) = spawn(transport.clone(), config);
        handle
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn initial_of(view: &ViewState) -> Option<f64> {
        view.result.as_ref().map(|r| r.summary.initial_investment)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_calculation_on_start() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, OrchestratorConfig::default());

        sleep(ms(10)).await;
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], FormState::default().to_params());

        let view = handle.view();
        assert!(!view.loading);
        assert_eq!(view.result.unwrap().summary.years, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_single_request() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::InitialSavings, "2000").unwrap();
        sleep(ms(100)).await;
        handle.set_field(Field::InitialSavings, "3000").unwrap();
        sleep(ms(100)).await;
        handle.set_field(Field::InitialSavings, "4000").unwrap();
        sleep(ms(300)).await;

        assert!(transport.calls().is_empty());
        assert!(handle.view().loading);

        sleep(ms(300)).await;
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].initial_savings, 4000.0);

        sleep(ms(2000)).await;
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(initial_of(&handle.view()), Some(4000.0));
        assert!(!handle.view().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_restarts_debounce() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::Years, "10").unwrap();
        sleep(ms(400)).await;
        handle.set_field(Field::Years, "20").unwrap();
        sleep(ms(400)).await;
        assert!(transport.calls().is_empty());

        sleep(ms(200)).await;
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].years, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_uses_state_at_fire_time() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::MonthlyDeposit, "250.").unwrap();
        handle.set_field(Field::InterestRate, "6").unwrap();
        sleep(ms(600)).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].monthly_deposit, 250.0);
        assert_eq!(calls[0].interest_rate, 6.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_edit_cancels_pending_request() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::InitialSavings, "5000").unwrap();
        sleep(ms(100)).await;
        handle.set_field(Field::InterestRate, "25").unwrap();
        sleep(ms(1000)).await;

        assert!(transport.calls().is_empty());
        let view = handle.view();
        assert!(!view.loading);
        assert_eq!(
            view.field_errors.get(&Field::InterestRate).map(String::as_str),
            Some("Interest rate cannot exceed 20%")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_calculate_bypasses_debounce() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::Years, "3").unwrap();
        handle.calculate().unwrap();
        sleep(ms(10)).await;
        assert_eq!(transport.calls().len(), 1);

        // The pending debounce was consumed by the manual send
        sleep(ms(1000)).await;
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(handle.view().result.unwrap().yearly_results.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_calculate_refused_when_invalid() {
        let transport = Arc::new(MockTransport::default());
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::MonthlyDeposit, "-1").unwrap();
        handle.calculate().unwrap();
        sleep(ms(10)).await;

        assert!(transport.calls().is_empty());
        let view = handle.view();
        assert_eq!(view.notice.as_deref(), Some(FORM_INVALID_MESSAGE));
        assert!(view.field_errors.contains_key(&Field::MonthlyDeposit));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_dropped() {
        let transport = MockTransport::scripted(vec![(ms(1000), None), (ms(100), None)]);
        let handle = start(&transport, quiet_config());

        handle.set_field(Field::InitialSavings, "111").unwrap();
        handle.calculate().unwrap();
        sleep(ms(10)).await;
        handle.set_field(Field::InitialSavings, "222").unwrap();
        handle.calculate().unwrap();

        sleep(ms(200)).await;
        assert_eq!(initial_of(&handle.view()), Some(222.0));
        assert!(handle.view().loading);

        sleep(ms(1000)).await;
        let view = handle.view();
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(initial_of(&view), Some(222.0));
        assert!(!view.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_error_then_retry() {
        let limited = ClientError::Api {
            status: 429,
            body: ErrorBody {
                retry_after: Some("15 minutes".to_string()),
                ..ErrorBody::new(
                    ErrorCode::TooManyRequests,
                    "You have exceeded the rate limit. Please try again later.",
                )
                .with_details(json!({"limitPerWindow": 50, "windowDurationMinutes": 15}))
            },
        };
        let transport = MockTransport::scripted(vec![(Duration::ZERO, Some(limited))]);
        let handle = start(&transport, quiet_config());

        handle.calculate().unwrap();
        sleep(ms(10)).await;

        let view = handle.view();
        let error = view.error.clone().unwrap();
        assert_eq!(error.category, ErrorCategory::RateLimited);
        assert_eq!(error.code, Some(ErrorCode::TooManyRequests));
        assert_eq!(error.title(), "Rate Limit Exceeded");
        assert!(error.message.starts_with("Rate limit exceeded:"));
        assert!(view.can_retry());

        handle.retry().unwrap();
        sleep(ms(10)).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        let view = handle.view();
        assert!(view.error.is_none());
        assert!(view.result.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_message() {
        let transport = MockTransport::scripted(vec![(
            Duration::ZERO,
            Some(ClientError::Network("connection refused".to_string())),
        )]);
        let handle = start(&transport, quiet_config());

        handle.calculate().unwrap();
        sleep(ms(10)).await;

        let error = handle.view().error.unwrap();
        assert_eq!(error.category, ErrorCategory::Network);
        assert_eq!(error.code, None);
        assert_eq!(error.message, NETWORK_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_actor() {
        let transport = Arc::new(MockTransport::default());
        let (handle, task) = spawn(transport.clone(), quiet_config());

        handle.shutdown().unwrap();
        task.await.unwrap();
        assert_eq!(handle.calculate(), Err(OrchestratorError::Stopped));
    }
}
