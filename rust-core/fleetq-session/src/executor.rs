// SPDX-License-Identifier: PMPL-1.0-or-later
//! Guarded query execution.
//!
//! Only one submission may be in flight. [`SubmitSlot::try_acquire`] hands
//! out a [`SubmitToken`]; a second attempt while the token is alive fails
//! with [`SessionError::Busy`] instead of queueing. The token releases the
//! slot when dropped, so every exit path (success, failure, rejection)
//! frees it. There is no cancellation: a response that arrives late still
//! lands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fleetq_filter::{
    summarize_with_labels, to_wire_groups, Device, FilterCatalog, FilterConfig, FilterTree, Page,
    QueryRequest,
};
use tracing::{info, warn};

use crate::error::{Result, SessionError};
use crate::service::QueryService;

/// Single-occupancy slot for query submission.
#[derive(Debug, Default)]
pub struct SubmitSlot {
    in_flight: Arc<AtomicBool>,
}

impl SubmitSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Result<SubmitToken> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::Busy)?;
        Ok(SubmitToken {
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the submission slot.
#[derive(Debug)]
#[must_use = "dropping the token releases the submission slot"]
pub struct SubmitToken {
    in_flight: Arc<AtomicBool>,
}

impl Drop for SubmitToken {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Reject trees that would run an empty query: no groups at all, or no
/// active block in any group.
pub fn validate_for_submit(tree: &FilterTree) -> Result<()> {
    if tree.is_empty() {
        return Err(SessionError::Validation(
            "add at least one filter group".to_string(),
        ));
    }
    if !tree.has_active_blocks() {
        return Err(SessionError::Validation(
            "no active filter blocks".to_string(),
        ));
    }
    Ok(())
}

/// A page of matching devices and the summary of the query that found them.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub page: Page<Device>,
    pub summary: String,
}

pub struct QueryExecutor {
    service: Arc<dyn QueryService>,
    slot: SubmitSlot,
    config: FilterConfig,
}

impl QueryExecutor {
    pub fn new(service: Arc<dyn QueryService>, config: FilterConfig) -> Self {
        Self {
            service,
            slot: SubmitSlot::new(),
            config,
        }
    }

    pub fn slot(&self) -> &SubmitSlot {
        &self.slot
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_busy()
    }

    /// Transport form of `tree`: inactive blocks dropped, lists flattened.
    pub fn build_request(&self, tree: &FilterTree, page: u32, size: Option<u32>) -> QueryRequest {
        QueryRequest {
            groups: to_wire_groups(tree.groups(), true),
            page: page.max(1),
            size: size.unwrap_or(self.config.default_page_size),
        }
    }

    /// Acquire the slot and run the query.
    pub async fn execute(
        &self,
        tree: &FilterTree,
        catalog: &FilterCatalog,
        page: u32,
        size: Option<u32>,
    ) -> Result<QueryOutcome> {
        let token = match self.slot.try_acquire() {
            Ok(token) => token,
            Err(e) => {
                warn!("Rejected query submission: another query is running");
                return Err(e);
            }
        };
        self.execute_with_token(token, tree, catalog, page, size).await
    }

    /// Run the query under an already-acquired token, which is released on
    /// return.
    pub async fn execute_with_token(
        &self,
        token: SubmitToken,
        tree: &FilterTree,
        catalog: &FilterCatalog,
        page: u32,
        size: Option<u32>,
    ) -> Result<QueryOutcome> {
        let _token = token;
        if let Err(e) = validate_for_submit(tree) {
            warn!(error = %e, "Rejected query submission");
            return Err(e);
        }

        let request = self.build_request(tree, page, size);
        info!(
            groups = request.groups.len(),
            page = request.page,
            size = request.size,
            "Submitting device query"
        );

        let page = match self.service.query_devices(&request).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Device query failed");
                return Err(e);
            }
        };
        info!(total = page.total, returned = page.list.len(), "Device query finished");

        Ok(QueryOutcome {
            summary: summarize_with_labels(tree.groups(), catalog, self.config.summary_max_length),
            page,
        })
    }
}
