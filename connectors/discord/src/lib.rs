//! TFD Discord Provider
//!
//! Terraform resources and data sources for Discord guild primitives:
//! - Servers, channels, categories and permission overwrites
//! - Roles, the `@everyone` role and role membership
//! - Emojis, invites, messages and webhooks
//! - Lookups for all of the above, plus a color converter
//!
//! Every operation talks to Discord through [`DiscordApi`], so tests can
//! substitute the REST client.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod api;
pub mod codec;
mod config;
pub mod data_sources;
mod error;
mod provider;
pub mod resources;
pub mod types;

pub use api::{DiscordApi, DiscordApiClient, Download};
pub use config::{DiscordConfig, RetryConfig, TOKEN_ENV_VAR, normalize_token};
pub use error::{DiscordError, DiscordResult, MISSING_ACCESS, MISSING_PERMISSIONS};
pub use provider::{DiscordProvider, PROVIDER_PREFIX};

/// Capability object handed to Discord resources and data sources.
pub type DiscordData = tfd_core::ProviderData<dyn DiscordApi>;
