//! TFD Core - resource runtime for the Discord Terraform provider
//!
//! This crate provides the traits, diagnostics and error handling shared by
//! resource and data source implementations. The API client type is a
//! generic parameter threaded through [`ProviderData`].

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod diagnostics;
mod error;
mod registry;
mod resource;

pub use diagnostics::*;
pub use error::*;
pub use registry::*;
pub use resource::*;
