//! scrapi-probe - Integration probes for the Scrapi scraping backend
//!
//! Drives a deployed backend over HTTP the way a user would: registers an
//! account, lists and creates actors, starts runs, polls them to
//! completion, and grades the quality of the scraped data.
//!
//! # Architecture
//!
//! - [`config`] - Configuration management and settings
//! - [`client`] - HTTP client with bearer-token handling
//! - [`models`] - Wire types of the backend API
//! - [`poll`] - Run polling with a hard wait budget
//! - [`quality`] - Field counting and data-quality heuristics
//! - [`report`] - Pass/fail records and console summaries
//! - [`suites`] - The verification suites themselves
//!
//! # Example
//!
//! ```no_run
//! use scrapi_probe::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = ApiClient::new(&config)?;
//!     let mut suite = MapsSuite::new(SuiteContext::new(config, client));
//!     let report = suite.run().await;
//!     println!("{}", report.closing_line());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod poll;
pub mod quality;
pub mod report;
pub mod suites;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{ApiClient, ApiResponse, ClientError};
    pub use crate::config::{Config, PollSettings};
    pub use crate::error::{Error, ErrorCategory, ProbeErrorTrait, Result};
    pub use crate::models::{Actor, Run, RunStatus};
    pub use crate::poll::{poll_run, PollOutcome};
    pub use crate::report::{Reporter, TestRecord};
    pub use crate::suites::{
        BackendStep, BackendSuite, MapsSuite, RunOutputCheck, Suite, SuiteContext, SuiteReport,
    };
}

pub use models::{Actor, Run, RunStatus};
