//! QAFlow Report - client-side test reporting.
//!
//! This crate provides:
//! - Session tracking for test runs (unit, integration, or end-to-end)
//! - Step recording with pass/fail/skip outcomes, timings, and error capture
//! - Pure summary computation over recorded steps
//! - Authenticated submission of finalized sessions to the QAFlow API
//! - Config discovery from `reporter.config.json` or the environment
//!
//! # Example
//!
//! ```rust,no_run
//! use qaflow_report::{Reporter, ReporterOptions, StepOptions, TestEnvironment, Tester};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reporter = Reporter::new();
//! reporter.initialize("qa-live-key", ReporterOptions::default());
//!
//! reporter.create_test(
//!     "login flow",
//!     Some("checks the login form end to end".to_string()),
//!     Tester::new("jan", "jan@example.com"),
//!     TestEnvironment::detect(),
//! )?;
//!
//! reporter
//!     .step("open login page", async { open_page().await }, StepOptions::new())
//!     .await?;
//! reporter.step_assert("title is correct", true, StepOptions::new())?;
//!
//! let report = reporter.end().await?;
//! println!("{}: {}/{} passed", report.name, report.summary.passed, report.summary.total);
//! # Ok(())
//! # }
//! # async fn open_page() -> Result<(), std::io::Error> { Ok(()) }
//! ```

pub mod api;
pub mod config;
pub mod reporter;
pub mod summary;
pub mod types;

// Re-export the reporter entry points
pub use reporter::{BoxError, EndReport, ReportError, ReportResult, Reporter};

// Re-export configuration types
pub use config::{ReporterConfig, ReporterOptions, StepFailurePolicy};

// Re-export core data types
pub use types::{
    StepError, StepOptions, TestEnvironment, TestReport, TestSession, TestStatus, TestStep, Tester,
};

// Re-export summary computation
pub use summary::{Summary, aggregate_status, summarize};

// Re-export the transport seam
pub use api::{ApiError, ApiResult, QaflowApi, SubmitResponse, Transport};
