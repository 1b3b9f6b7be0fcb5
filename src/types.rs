//! Core data types for test sessions and steps.
//!
//! Wire-facing types serialize with camelCase field names and lowercase
//! status values to match the QAFlow collection API. All timestamps and
//! durations are epoch milliseconds.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of a single step, or the aggregate outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Information about the test performer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tester {
    /// Author name
    pub author: String,

    /// Contact address
    pub email: String,
}

impl Tester {
    pub fn new(author: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            email: email.into(),
        }
    }
}

/// Descriptive metadata about where a session ran.
///
/// Attached at session creation and immutable thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEnvironment {
    /// Platform or host name
    pub name: String,

    /// Application or platform version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Operating system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Browser identifier, for browser-driven tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    /// Device identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Viewport dimensions (e.g., "1920x1080")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
}

impl TestEnvironment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Detect environment details from the running host.
    ///
    /// Fills `name` from the machine hostname and `os` from the compile-time
    /// target OS. Remaining fields are left for the caller.
    pub fn detect() -> Self {
        let name = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown-host".to_string());

        Self {
            name,
            os: Some(std::env::consts::OS.to_string()),
            ..Default::default()
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn browser(mut self, browser: impl Into<String>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn viewport(mut self, viewport: impl Into<String>) -> Self {
        self.viewport = Some(viewport.into());
        self
    }
}

/// Failure detail captured from a step action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    /// Failure message
    pub message: String,

    /// Chain of underlying causes, one per line, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl StepError {
    /// Capture message and cause chain from a boxed error.
    pub fn from_failure(err: &(dyn std::error::Error + 'static)) -> Self {
        let message = err.to_string();

        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        let stack = if causes.is_empty() {
            None
        } else {
            Some(causes.join("\n"))
        };

        Self { message, stack }
    }
}

impl std::fmt::Display for StepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Optional step metadata supplied at the call site
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    /// Step description
    pub description: Option<String>,

    /// Opaque screenshot reference
    pub screenshot: Option<String>,
}

impl StepOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.screenshot = Some(screenshot.into());
        self
    }
}

/// One recorded observation within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestStep {
    /// Step name
    pub name: String,

    /// Outcome of the step
    pub status: TestStatus,

    /// Step description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Failure detail, present only for action failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,

    /// Opaque screenshot reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    /// When the step began executing (epoch millis)
    pub timestamp: i64,

    /// Elapsed execution time in millis; 0 for skipped and assertion steps
    pub duration: i64,
}

/// One logical test run, tracked while active.
///
/// Steps are append-only and never reordered. The session flips to inactive
/// exactly once, when finalized by the reporter.
#[derive(Debug, Clone)]
pub struct TestSession {
    /// Session id, unique within the process lifetime
    pub id: String,

    /// Session name
    pub name: String,

    /// Session description
    pub description: Option<String>,

    /// Who ran the test
    pub tester: Tester,

    /// Where the test ran
    pub environment: TestEnvironment,

    /// When the session was created (epoch millis)
    pub start_time: i64,

    pub(crate) steps: Vec<TestStep>,
    pub(crate) active: bool,
}

impl TestSession {
    pub(crate) fn new(
        name: impl Into<String>,
        description: Option<String>,
        tester: Tester,
        environment: TestEnvironment,
    ) -> Self {
        Self {
            id: generate_session_id(),
            name: name.into(),
            description,
            tester,
            environment,
            start_time: current_timestamp(),
            steps: Vec::new(),
            active: true,
        }
    }

    /// Recorded steps, in recording order
    pub fn steps(&self) -> &[TestStep] {
        &self.steps
    }

    /// Whether the session can still accept steps
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn push_step(&mut self, step: TestStep) {
        self.steps.push(step);
    }
}

/// Finalized session payload submitted to the collection service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub tester: Tester,
    pub environment: TestEnvironment,
    pub steps: Vec<TestStep>,

    /// Session start (epoch millis)
    pub start_time: i64,

    /// Session end (epoch millis)
    pub end_time: i64,

    /// Wall-clock session duration in millis
    pub duration: i64,

    /// Aggregate session outcome
    pub status: TestStatus,
}

/// Current time as epoch milliseconds
pub(crate) fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a session id unique within this process.
///
/// Time-based prefix with a monotonic suffix, e.g. `test-1719830000000-3`.
fn generate_session_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", current_timestamp(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_session_id_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert!(a.starts_with("test-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TestStatus::Passed).unwrap(),
            "\"passed\""
        );
        assert_eq!(
            serde_json::to_string(&TestStatus::Skipped).unwrap(),
            "\"skipped\""
        );
    }

    #[test]
    fn test_report_wire_format_is_camel_case() {
        let report = TestReport {
            name: "login".to_string(),
            description: None,
            tester: Tester::new("jan", "jan@example.com"),
            environment: TestEnvironment::new("staging"),
            steps: vec![],
            start_time: 1000,
            end_time: 1500,
            duration: 500,
            status: TestStatus::Passed,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["startTime"], 1000);
        assert_eq!(json["endTime"], 1500);
        assert_eq!(json["status"], "passed");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_step_error_captures_cause_chain() {
        let io = std::io::Error::other("disk offline");
        let err = StepError::from_failure(&io);
        assert_eq!(err.message, "disk offline");
        assert_eq!(err.stack, None);
    }

    #[test]
    fn test_environment_detect_fills_os() {
        let env = TestEnvironment::detect();
        assert!(!env.name.is_empty());
        assert_eq!(env.os.as_deref(), Some(std::env::consts::OS));
    }
}
