//! Verification suites
//!
//! A suite is an ordered list of dependent steps run against one backend.
//! Each step records its checks on the shared [`Reporter`] and returns
//! whether it passed; an `Err` from a step means it could not be evaluated
//! (for example an undecodable body) and is reported as an exception.

pub mod backend;
pub mod check_run;
pub mod enhanced_maps;
pub mod maps;

pub use backend::{BackendStep, BackendSuite};
pub use check_run::RunOutputCheck;
pub use maps::MapsSuite;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::models::{user_id_of, RegisterRequest};
use crate::report::{success_rate, Reporter, TestRecord};

/// Test name shared by every registration step
pub const REGISTRATION_TEST: &str = "User Registration";

// ============================================================================
// Suite trait
// ============================================================================

/// A runnable verification suite
#[async_trait]
pub trait Suite: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Run every step and produce the final report
    async fn run(&mut self) -> SuiteReport;
}

/// Outcome of a whole suite
#[derive(Debug, Clone)]
pub struct SuiteReport {
    pub name: &'static str,
    /// Steps that returned true
    pub passed: usize,
    /// Steps scheduled, including ones skipped by an abort
    pub total: usize,
    /// Minimum pass rate, in percent
    pub pass_threshold: f64,
    pub records: Vec<TestRecord>,
    pub success_line: &'static str,
    pub failure_line: &'static str,
}

impl SuiteReport {
    pub fn success_rate(&self) -> f64 {
        success_rate(self.passed, self.total)
    }

    pub fn is_success(&self) -> bool {
        self.total > 0 && self.success_rate() >= self.pass_threshold
    }

    /// Last line printed before exiting
    pub fn closing_line(&self) -> &'static str {
        if self.is_success() {
            self.success_line
        } else {
            self.failure_line
        }
    }
}

// ============================================================================
// Shared state
// ============================================================================

/// Client, reporter and the registered user, shared by a suite's steps
#[derive(Debug)]
pub struct SuiteContext {
    pub config: Config,
    pub client: ApiClient,
    pub reporter: Reporter,
    /// `user` object from the registration response
    pub user: Option<Value>,
    /// Credentials of the registered account
    pub credentials: Option<RegisterRequest>,
}

impl SuiteContext {
    pub fn new(config: Config, client: ApiClient) -> Self {
        Self {
            config,
            client,
            reporter: Reporter::new(),
            user: None,
            credentials: None,
        }
    }

    pub fn has_token(&self) -> bool {
        self.client.token().is_some()
    }

    /// Id of the registered user, from either `id` or `_id`
    pub fn user_id(&self) -> Option<String> {
        self.user
            .as_ref()
            .and_then(user_id_of)
            .map(ToString::to_string)
    }

    pub fn username(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.get("username"))
            .and_then(Value::as_str)
    }
}

/// Register a fresh account and keep its token on the client
///
/// Passes on 201 with both `token` and `user` in the body.
pub async fn register_user(ctx: &mut SuiteContext, request: RegisterRequest) -> Result<bool> {
    let response = match ctx.client.register(&request).await {
        Ok(response) => response,
        Err(_) => {
            return Ok(ctx
                .reporter
                .fail(REGISTRATION_TEST, "Failed to connect to registration endpoint"));
        }
    };

    if !response.is_status(201) {
        return Ok(ctx.reporter.fail_with(
            REGISTRATION_TEST,
            format!("Registration failed with status {}", response.status),
            Value::String(response.body.clone()),
        ));
    }

    let body: Value = response.json()?;
    let token = body.get("token").and_then(Value::as_str);
    let user = body.get("user").filter(|u| !u.is_null());

    match (token, user) {
        (Some(token), Some(user)) => {
            ctx.client.set_token(token);
            ctx.user = Some(user.clone());
            ctx.credentials = Some(request);
            let username = ctx.username().unwrap_or("unknown").to_string();
            tracing::info!(username = %username, "Registered test user");
            Ok(ctx.reporter.pass(
                REGISTRATION_TEST,
                format!("User registered successfully: {username}"),
            ))
        }
        _ => Ok(ctx.reporter.fail_with(
            REGISTRATION_TEST,
            "Missing token or user data in response",
            body,
        )),
    }
}

/// `status` for messages, or `No response` when the request never completed
pub fn status_or_no_response<E>(response: &std::result::Result<crate::client::ApiResponse, E>) -> String {
    match response {
        Ok(r) => r.status.to_string(),
        Err(_) => "No response".to_string(),
    }
}
