// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>

//! Device queries.

use fleetq_filter::{Device, Page, QueryRequest};

use crate::client::FleetqClient;
use crate::error::Result;

impl FleetqClient {
    /// Run a filter query and return one page of matching devices.
    ///
    /// Every block in `request` carries its value as a single string; build
    /// requests with [`fleetq_filter::to_wire_groups`] to get that form.
    pub async fn query_devices(&self, request: &QueryRequest) -> Result<Page<Device>> {
        self.post("/api/v1/devices/query", request).await
    }
}
