// SPDX-License-Identifier: PMPL-1.0-or-later
//! fleetq Session
//!
//! Async orchestration around a filter tree: the catalog cache and its
//! shared loading flag, single-flight query execution, template
//! management, and the collaborator traits implemented by the HTTP client.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod service;
pub mod session;
pub mod templates;

#[cfg(test)]
mod fakes;

pub use catalog::CatalogCache;
pub use error::{Result, SessionError};
pub use executor::{validate_for_submit, QueryExecutor, QueryOutcome, SubmitSlot, SubmitToken};
pub use service::{CatalogService, QueryService, TemplateStore};
pub use session::{Collaborators, FilterSession};
pub use templates::TemplateManager;
