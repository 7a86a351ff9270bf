// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory collaborators for unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fleetq_filter::{
    Device, FilterOption, FilterOptions, KeyCatalog, Page, QueryRequest, QueryTemplate,
    TemplateSummary,
};
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::{Result, SessionError};
use crate::service::{CatalogService, QueryService, TemplateStore};

fn offline() -> SessionError {
    SessionError::Transport("connection refused".to_string())
}

/// Device field values come from `field_values`, or from `set_values`
/// when set. A gated field answers with the values current when the call
/// began, after `release` fires.
#[derive(Default)]
pub struct FakeCatalog {
    pub options: FilterOptions,
    pub key_values: HashMap<String, Vec<FilterOption>>,
    pub field_values: HashMap<String, Vec<String>>,
    failing: AtomicBool,
    calls: Mutex<Vec<String>>,
    live_values: Mutex<HashMap<String, Vec<String>>>,
    gates: Mutex<HashMap<String, (Arc<Notify>, Arc<Notify>)>>,
}

impl FakeCatalog {
    pub fn set_values(&self, field: &str, values: Vec<&str>) {
        self.live_values
            .lock()
            .unwrap()
            .insert(field.to_string(), values.into_iter().map(str::to_string).collect());
    }

    /// Hold the next fetch of `field`. Returns `(started, release)`.
    pub fn gate(&self, field: &str) -> (Arc<Notify>, Arc<Notify>) {
        let pair = (Arc::new(Notify::new()), Arc::new(Notify::new()));
        self.gates.lock().unwrap().insert(field.to_string(), pair.clone());
        pair
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn get_filter_options(&self) -> Result<FilterOptions> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(self.options.clone())
    }

    async fn get_values_for_key(&self, catalog: KeyCatalog, key: &str) -> Result<Vec<FilterOption>> {
        self.record(format!("values_for_key:{}:{key}", catalog.as_str()))?;
        Ok(self.key_values.get(key).cloned().unwrap_or_default())
    }

    async fn get_device_field_values(&self, field: &str, size_hint: usize) -> Result<Vec<String>> {
        self.record(format!("device_field_values:{field}:{size_hint}"))?;
        let live = self.live_values.lock().unwrap().get(field).cloned();
        let values = live
            .or_else(|| self.field_values.get(field).cloned())
            .unwrap_or_default();
        let gate = self.gates.lock().unwrap().remove(field);
        if let Some((started, release)) = gate {
            started.notify_one();
            release.notified().await;
        }
        Ok(values)
    }
}

/// Answers every query with `page`. With a gate installed, each query
/// signals `started` and then waits for `release`.
#[derive(Default)]
pub struct FakeQuery {
    pub page: Page<Device>,
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
    failing: AtomicBool,
    requests: Mutex<Vec<QueryRequest>>,
}

impl FakeQuery {
    pub fn gated(started: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((started, release)),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryService for FakeQuery {
    async fn query_devices(&self, request: &QueryRequest) -> Result<Page<Device>> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(Page {
            page: request.page,
            size: request.size,
            ..self.page.clone()
        })
    }
}

/// Stores templates as JSON, the way the remote store hands them back.
#[derive(Default)]
pub struct FakeTemplates {
    stored: Mutex<BTreeMap<u64, Value>>,
    next_id: AtomicU64,
}

impl FakeTemplates {
    /// Seed a raw stored document.
    pub fn insert_raw(&self, id: u64, raw: Value) {
        self.stored.lock().unwrap().insert(id, raw);
    }

    pub fn raw(&self, id: u64) -> Option<Value> {
        self.stored.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl TemplateStore for FakeTemplates {
    async fn save_template(&self, template: &QueryTemplate) -> Result<TemplateSummary> {
        let id = template
            .id
            .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let stored = QueryTemplate {
            id: Some(id),
            ..template.clone()
        };
        let raw = serde_json::to_value(&stored).map_err(|e| SessionError::Transport(e.to_string()))?;
        self.stored.lock().unwrap().insert(id, raw);
        Ok(TemplateSummary {
            id,
            name: template.name.clone(),
            description: template.description.clone(),
        })
    }

    async fn list_templates(&self, page: u32, size: u32) -> Result<Page<TemplateSummary>> {
        let stored = self.stored.lock().unwrap();
        let skip = (page.saturating_sub(1) * size) as usize;
        let list = stored
            .iter()
            .skip(skip)
            .take(size as usize)
            .map(|(id, raw)| TemplateSummary {
                id: *id,
                name: raw["name"].as_str().unwrap_or_default().to_string(),
                description: raw["description"].as_str().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Page {
            list,
            total: stored.len() as u64,
            page,
            size,
        })
    }

    async fn fetch_template(&self, id: u64) -> Result<Value> {
        self.raw(id)
            .ok_or_else(|| SessionError::NotFound(format!("template {id}")))
    }

    async fn delete_template(&self, id: u64) -> Result<()> {
        self.stored
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| SessionError::NotFound(format!("template {id}")))
    }
}
