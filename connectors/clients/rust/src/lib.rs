// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! # fleetq Client SDK
//!
//! HTTP client for the inventory service behind fleetq: device queries,
//! query template storage, and the filter catalogs. [`FleetqClient`]
//! implements the `fleetq-session` collaborator traits, so one client can
//! back a whole [`fleetq_session::FilterSession`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fleetq_client::FleetqClient;
//! use fleetq_filter::FilterConfig;
//! use fleetq_session::{Collaborators, FilterSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(FleetqClient::new("http://localhost:8080")?);
//!     let mut session = FilterSession::new(Collaborators::shared(client), FilterConfig::default());
//!     session.refresh_catalog().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`client`]: Connection configuration, authentication, and HTTP transport.
//! - [`query`]: Device queries.
//! - [`templates`]: Query template create/update, list, fetch, delete.
//! - [`catalog`]: Filter options and known field values.
//! - [`types`]: REST envelopes (error bodies, value lists).
//! - [`error`]: Error types and the crate-level `Result` alias.

pub mod catalog;
pub mod client;
pub mod error;
pub mod query;
pub mod service;
pub mod templates;
pub mod types;

pub use client::{Auth, FleetqClient};
pub use error::{FleetqError, Result};
