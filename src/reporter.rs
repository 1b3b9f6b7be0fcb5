//! Session lifecycle and step execution.
//!
//! [`Reporter`] is an explicit, caller-owned object; there is no module-level
//! singleton. One reporter tracks any number of open sessions keyed by id,
//! plus a "current" pointer that the id-less convenience methods operate on.
//! `create_test` makes the new session current; earlier sessions stay
//! reachable through the `*_in` / `end_session` variants until finalized.
//!
//! All mutating methods take `&mut self`, so step appends and finalize
//! transitions are mutually exclusive per reporter by construction. The one
//! suspension point is awaiting a caller-supplied step action; no timeout is
//! enforced there, so a hanging action blocks its session indefinitely.

use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

use crate::api::{ApiError, QaflowApi, SubmitResponse, Transport};
use crate::config::{self, ReporterConfig, ReporterOptions, StepFailurePolicy};
use crate::summary::{Summary, aggregate_status, summarize};
use crate::types::{
    StepError, StepOptions, TestEnvironment, TestReport, TestSession, TestStatus, TestStep, Tester,
    current_timestamp,
};

/// Boxed error type accepted from step actions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for reporter operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors raised by reporter operations
#[derive(Debug)]
pub enum ReportError {
    /// No API key configured; call `initialize` first
    NotInitialized,

    /// The addressed session does not exist or is already finalized
    NoActiveSession { id: Option<String> },

    /// A step action failed; the failing step was recorded before this was
    /// raised
    Action(StepError),

    /// Report submission failed; the session is finalized and will not be
    /// resubmitted
    Transport(ApiError),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::NotInitialized => {
                write!(f, "Reporter not initialized: call initialize() with an API key first")
            }
            ReportError::NoActiveSession { id: Some(id) } => {
                write!(f, "No active test session with id: {}", id)
            }
            ReportError::NoActiveSession { id: None } => {
                write!(f, "No active test session: create a test first")
            }
            ReportError::Action(err) => write!(f, "Step action failed: {}", err),
            ReportError::Transport(err) => write!(f, "Failed to submit report: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for ReportError {
    fn from(err: ApiError) -> Self {
        ReportError::Transport(err)
    }
}

/// What `end` hands back to the caller
#[derive(Debug, Clone)]
pub struct EndReport {
    /// Session name
    pub name: String,

    /// Per-status counts and total step duration
    pub summary: Summary,

    /// Wall-clock session duration in millis
    pub duration: i64,

    /// Service acknowledgement
    pub response: SubmitResponse,
}

/// Test reporter: owns open sessions and the delivery transport
pub struct Reporter {
    transport: Option<Box<dyn Transport>>,
    options: ReporterOptions,
    sessions: HashMap<String, TestSession>,
    current: Option<String>,
}

impl Reporter {
    /// Create an unconfigured reporter.
    ///
    /// Session operations fail with `NotInitialized` until [`initialize`]
    /// (or a successful [`load_config`]) supplies an API key.
    ///
    /// [`initialize`]: Reporter::initialize
    /// [`load_config`]: Reporter::load_config
    pub fn new() -> Self {
        Self {
            transport: None,
            options: ReporterOptions::default(),
            sessions: HashMap::new(),
            current: None,
        }
    }

    /// Create a reporter from a full configuration
    pub fn with_config(config: ReporterConfig) -> Self {
        let mut reporter = Self::new();
        reporter.configure(config);
        reporter
    }

    /// Create a reporter with a custom transport (test seam)
    pub fn with_transport(transport: Box<dyn Transport>, options: ReporterOptions) -> Self {
        Self {
            transport: Some(transport),
            options,
            sessions: HashMap::new(),
            current: None,
        }
    }

    /// Create a reporter, attempting best-effort config discovery.
    ///
    /// Equivalent to `Reporter::new()` followed by [`load_config`]; an
    /// unconfigured reporter is returned when nothing is discoverable.
    ///
    /// [`load_config`]: Reporter::load_config
    pub fn discover() -> Self {
        let mut reporter = Self::new();
        reporter.load_config();
        reporter
    }

    /// Configure transport credentials.
    pub fn initialize(&mut self, api_key: impl Into<String>, options: ReporterOptions) {
        self.configure(ReporterConfig::new(api_key).options(options));
    }

    /// Configure from a full config, including a custom endpoint.
    pub fn configure(&mut self, config: ReporterConfig) {
        self.options = config.options.clone();
        self.transport = Some(Box::new(QaflowApi::new(&config)));
    }

    /// Best-effort config discovery; see [`config::discover`].
    ///
    /// Returns whether a usable configuration was found. Failure leaves the
    /// reporter unchanged and is only logged.
    pub fn load_config(&mut self) -> bool {
        match config::discover() {
            Some(config) => {
                self.configure(config);
                true
            }
            None => false,
        }
    }

    /// Whether transport credentials have been configured
    pub fn is_initialized(&self) -> bool {
        self.transport.is_some()
    }

    /// Create a new session and make it current.
    ///
    /// Returns the session id. No network call happens here; the session is
    /// only submitted on `end`.
    pub fn create_test(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        tester: Tester,
        environment: TestEnvironment,
    ) -> ReportResult<String> {
        if self.transport.is_none() {
            return Err(ReportError::NotInitialized);
        }

        let session = TestSession::new(name, description, tester, environment);
        let id = session.id.clone();
        debug!(id = %id, name = %session.name, "created test session");

        self.sessions.insert(id.clone(), session);
        self.current = Some(id.clone());
        Ok(id)
    }

    /// Look up a session by id
    pub fn session(&self, id: &str) -> Option<&TestSession> {
        self.sessions.get(id)
    }

    /// The session the id-less methods operate on
    pub fn current_session(&self) -> Option<&TestSession> {
        self.current.as_deref().and_then(|id| self.sessions.get(id))
    }

    // ------------------------------------------------------------------
    // Step recording
    // ------------------------------------------------------------------

    /// Record a skipped step on the current session.
    ///
    /// Never executes anything; duration is always 0.
    pub fn step_skipped(&mut self, name: &str, options: StepOptions) -> ReportResult<TestStep> {
        let id = self.resolve(None)?;
        self.record_skipped(&id, name, options)
    }

    /// Record a skipped step on a specific session.
    pub fn step_skipped_in(
        &mut self,
        id: &str,
        name: &str,
        options: StepOptions,
    ) -> ReportResult<TestStep> {
        let id = self.resolve(Some(id))?;
        self.record_skipped(&id, name, options)
    }

    /// Record a direct boolean assertion on the current session.
    ///
    /// `true` records a passed step, `false` a failed one; duration is 0 and
    /// a failed assertion is not an error.
    pub fn step_assert(
        &mut self,
        name: &str,
        passed: bool,
        options: StepOptions,
    ) -> ReportResult<TestStep> {
        let id = self.resolve(None)?;
        self.record_assert(&id, name, passed, options)
    }

    /// Record a direct boolean assertion on a specific session.
    pub fn step_assert_in(
        &mut self,
        id: &str,
        name: &str,
        passed: bool,
        options: StepOptions,
    ) -> ReportResult<TestStep> {
        let id = self.resolve(Some(id))?;
        self.record_assert(&id, name, passed, options)
    }

    /// Run an action as a step of the current session.
    ///
    /// Awaits the supplied future; `Ok` records a passed step and returns the
    /// value, `Err` records a failed step with the captured failure detail
    /// and then re-raises it as [`ReportError::Action`]. Under
    /// [`StepFailurePolicy::FinalizeAndSubmit`] a failing action also ends
    /// and submits the session before the error is returned.
    pub async fn step<T, E, F>(
        &mut self,
        name: &str,
        action: F,
        options: StepOptions,
    ) -> ReportResult<(TestStep, T)>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let id = self.resolve(None)?;
        self.run_action(&id, name, action, options).await
    }

    /// Run an action as a step of a specific session.
    pub async fn step_in<T, E, F>(
        &mut self,
        id: &str,
        name: &str,
        action: F,
        options: StepOptions,
    ) -> ReportResult<(TestStep, T)>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let id = self.resolve(Some(id))?;
        self.run_action(&id, name, action, options).await
    }

    /// Run a boolean check as a step of the current session.
    ///
    /// Like [`step`], but the `Ok` value doubles as the assertion: `Ok(true)`
    /// records a passed step, `Ok(false)` a failed one. Neither is an error;
    /// only an `Err` from the action is re-raised.
    ///
    /// [`step`]: Reporter::step
    pub async fn step_check<E, F>(
        &mut self,
        name: &str,
        action: F,
        options: StepOptions,
    ) -> ReportResult<(TestStep, bool)>
    where
        F: Future<Output = Result<bool, E>>,
        E: Into<BoxError>,
    {
        let id = self.resolve(None)?;
        self.run_check(&id, name, action, options).await
    }

    /// Run a boolean check as a step of a specific session.
    pub async fn step_check_in<E, F>(
        &mut self,
        id: &str,
        name: &str,
        action: F,
        options: StepOptions,
    ) -> ReportResult<(TestStep, bool)>
    where
        F: Future<Output = Result<bool, E>>,
        E: Into<BoxError>,
    {
        let id = self.resolve(Some(id))?;
        self.run_check(&id, name, action, options).await
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// End the current session: finalize, submit, and return the summary.
    pub async fn end(&mut self) -> ReportResult<EndReport> {
        let id = self.resolve(None)?;
        self.finalize(&id).await
    }

    /// End a specific session.
    pub async fn end_session(&mut self, id: &str) -> ReportResult<EndReport> {
        let id = self.resolve(Some(id))?;
        self.finalize(&id).await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolve the target session id and check it is still active.
    fn resolve(&self, id: Option<&str>) -> ReportResult<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self
                .current
                .clone()
                .ok_or(ReportError::NoActiveSession { id: None })?,
        };

        match self.sessions.get(&id) {
            Some(session) if session.active => Ok(id),
            _ => Err(ReportError::NoActiveSession { id: Some(id) }),
        }
    }

    fn session_mut(&mut self, id: &str) -> ReportResult<&mut TestSession> {
        match self.sessions.get_mut(id) {
            Some(session) if session.active => Ok(session),
            _ => Err(ReportError::NoActiveSession {
                id: Some(id.to_string()),
            }),
        }
    }

    fn record_skipped(
        &mut self,
        id: &str,
        name: &str,
        options: StepOptions,
    ) -> ReportResult<TestStep> {
        let step = make_step(name, TestStatus::Skipped, options, None, current_timestamp(), 0);
        self.session_mut(id)?.push_step(step.clone());
        Ok(step)
    }

    fn record_assert(
        &mut self,
        id: &str,
        name: &str,
        passed: bool,
        options: StepOptions,
    ) -> ReportResult<TestStep> {
        let status = if passed {
            TestStatus::Passed
        } else {
            TestStatus::Failed
        };
        let step = make_step(name, status, options, None, current_timestamp(), 0);
        self.session_mut(id)?.push_step(step.clone());
        Ok(step)
    }

    async fn run_action<T, E, F>(
        &mut self,
        id: &str,
        name: &str,
        action: F,
        options: StepOptions,
    ) -> ReportResult<(TestStep, T)>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let started = current_timestamp();
        let outcome = action.await;
        let duration = current_timestamp() - started;

        match outcome {
            Ok(value) => {
                let step = make_step(name, TestStatus::Passed, options, None, started, duration);
                self.session_mut(id)?.push_step(step.clone());
                Ok((step, value))
            }
            Err(err) => Err(self.record_failure(id, name, err.into(), options, started, duration).await),
        }
    }

    async fn run_check<E, F>(
        &mut self,
        id: &str,
        name: &str,
        action: F,
        options: StepOptions,
    ) -> ReportResult<(TestStep, bool)>
    where
        F: Future<Output = Result<bool, E>>,
        E: Into<BoxError>,
    {
        let started = current_timestamp();
        let outcome = action.await;
        let duration = current_timestamp() - started;

        match outcome {
            Ok(passed) => {
                let status = if passed {
                    TestStatus::Passed
                } else {
                    TestStatus::Failed
                };
                let step = make_step(name, status, options, None, started, duration);
                self.session_mut(id)?.push_step(step.clone());
                Ok((step, passed))
            }
            Err(err) => Err(self.record_failure(id, name, err.into(), options, started, duration).await),
        }
    }

    /// Record a failed step and apply the configured failure policy.
    async fn record_failure(
        &mut self,
        id: &str,
        name: &str,
        err: BoxError,
        options: StepOptions,
        started: i64,
        duration: i64,
    ) -> ReportError {
        let step_error = StepError::from_failure(err.as_ref());
        let step = make_step(
            name,
            TestStatus::Failed,
            options,
            Some(step_error.clone()),
            started,
            duration,
        );

        match self.session_mut(id) {
            Ok(session) => session.push_step(step),
            Err(err) => return err,
        }

        if self.options.step_failure == StepFailurePolicy::FinalizeAndSubmit {
            if let Err(end_err) = self.finalize(id).await {
                warn!(
                    id = %id,
                    error = %end_err,
                    "auto-finalize after step failure did not complete"
                );
            }
        }

        ReportError::Action(step_error)
    }

    async fn finalize(&mut self, id: &str) -> ReportResult<EndReport> {
        if self.transport.is_none() {
            return Err(ReportError::NotInitialized);
        }

        let session = self.session_mut(id)?;
        let end_time = current_timestamp();
        let duration = end_time - session.start_time;
        let status = aggregate_status(&session.steps);
        let summary = summarize(&session.steps);

        // The session flips to inactive before the submission is awaited; a
        // transport failure does not reopen it and the report is never
        // resubmitted.
        session.active = false;

        let report = TestReport {
            name: session.name.clone(),
            description: session.description.clone(),
            tester: session.tester.clone(),
            environment: session.environment.clone(),
            steps: session.steps.clone(),
            start_time: session.start_time,
            end_time,
            duration,
            status,
        };
        let name = report.name.clone();

        let transport = self
            .transport
            .as_deref()
            .ok_or(ReportError::NotInitialized)?;
        let response = transport.submit_report(&report).await?;

        debug!(id = %id, status = ?status, total = summary.total, "test session ended");

        Ok(EndReport {
            name,
            summary,
            duration,
            response,
        })
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

fn make_step(
    name: &str,
    status: TestStatus,
    options: StepOptions,
    error: Option<StepError>,
    timestamp: i64,
    duration: i64,
) -> TestStep {
    TestStep {
        name: name.to_string(),
        status,
        description: options.description,
        error,
        screenshot: options.screenshot,
        timestamp,
        duration,
    }
}
