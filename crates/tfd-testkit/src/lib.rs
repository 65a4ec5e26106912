//! TFD Test Kit - mock infrastructure for the Discord Terraform provider
//!
//! - [`MockApiServer`] - Discord-shaped HTTP mock server over wiremock
//! - [`fixtures::discord`] - JSON payloads as Discord returns them
//! - Assertion helpers for results and diagnostics
//! - Tracing configuration for test output
//!
//! # Example
//!
//! ```rust,ignore
//! use tfd_testkit::{MockApiServer, fixtures::discord};
//!
//! #[tokio::test]
//! async fn reads_a_channel() {
//!     tfd_testkit::init_test_tracing();
//!
//!     let mock = MockApiServer::start().await;
//!     mock.expect_get("/channels/10", discord::text_channel("10", "1", "general")).await;
//!
//!     // point the provider at mock.base_url() ...
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod assertions;
pub mod fixtures;
mod mock_server;
mod tracing_config;

pub use assertions::*;
pub use mock_server::*;
pub use tracing_config::*;

pub use tfd_core::{Diagnostic, Diagnostics, ProviderError, ProviderResult, Severity};
