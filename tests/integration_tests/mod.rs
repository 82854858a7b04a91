//! Integration tests module
//!
//! End-to-end runs of the verification suites against wiremock servers.

pub mod backend_suite_test;
pub mod error_scenarios;
pub mod maps_suite_test;
