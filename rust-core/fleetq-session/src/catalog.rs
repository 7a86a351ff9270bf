// SPDX-License-Identifier: PMPL-1.0-or-later
//! Catalog cache.
//!
//! Holds the field catalogs and the per-field value lists fetched from the
//! catalog service. One loading flag is shared by every fetch: it goes up
//! when a fetch starts and down when *any* fetch finishes, so overlapping
//! fetches clear it early.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use fleetq_filter::{FilterCatalog, FilterType, KeyCatalog, WarmRequest};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::service::CatalogService;

type ValueCache = HashMap<(FilterType, String), Vec<String>>;

/// Raises the shared flag for the lifetime of one fetch.
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct CatalogCache {
    service: Arc<dyn CatalogService>,
    catalog: RwLock<FilterCatalog>,
    values: RwLock<ValueCache>,
    loading: Arc<AtomicBool>,
    value_size_hint: usize,
}

impl CatalogCache {
    pub fn new(service: Arc<dyn CatalogService>, value_size_hint: usize) -> Self {
        Self {
            service,
            catalog: RwLock::new(FilterCatalog::new()),
            values: RwLock::new(HashMap::new()),
            loading: Arc::new(AtomicBool::new(false)),
            value_size_hint,
        }
    }

    /// Snapshot of the field catalogs.
    pub fn catalog(&self) -> Result<FilterCatalog> {
        let catalog = self.catalog.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(catalog.clone())
    }

    /// Cached values for a field, if they have been fetched.
    pub fn values(&self, filter_type: FilterType, field: &str) -> Result<Option<Vec<String>>> {
        let values = self.values.read().map_err(|_| SessionError::LockPoisoned)?;
        Ok(values.get(&(filter_type, field.to_string())).cloned())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The shared loading flag, for observers such as a spinner.
    pub fn loading_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.loading)
    }

    /// Fetch all field catalogs and replace the cached ones.
    ///
    /// On failure the previous catalogs are kept.
    pub async fn refresh(&self) -> Result<FilterCatalog> {
        let _loading = LoadingGuard::start(&self.loading);
        let options = match self.service.get_filter_options().await {
            Ok(options) => options,
            Err(e) => {
                warn!(error = %e, "Failed to load filter options");
                return Err(e);
            }
        };

        let catalog = options.into_catalog();
        debug!(
            device_fields = catalog.options(FilterType::Device).len(),
            node_label_keys = catalog.options(FilterType::NodeLabel).len(),
            node_taint_keys = catalog.options(FilterType::Taint).len(),
            "Loaded filter catalogs"
        );
        *self.catalog.write().map_err(|_| SessionError::LockPoisoned)? = catalog.clone();
        Ok(catalog)
    }

    /// Fetch and cache the known values for one field.
    pub async fn warm(&self, request: &WarmRequest) -> Result<Vec<String>> {
        let _loading = LoadingGuard::start(&self.loading);
        let values = match KeyCatalog::for_filter_type(request.filter_type) {
            Some(catalog) => self
                .service
                .get_values_for_key(catalog, &request.field)
                .await?
                .into_iter()
                .map(|option| option.value)
                .collect(),
            None => {
                self.service
                    .get_device_field_values(&request.field, self.value_size_hint)
                    .await?
            }
        };

        debug!(
            filter_type = %request.filter_type,
            field = %request.field,
            count = values.len(),
            "Cached field values"
        );
        self.values
            .write()
            .map_err(|_| SessionError::LockPoisoned)?
            .insert((request.filter_type, request.field.clone()), values.clone());
        Ok(values)
    }

    /// Warm every request not already cached, concurrently. Failures are
    /// logged and skipped. Returns how many fetches succeeded.
    pub async fn warm_all(&self, requests: &[WarmRequest]) -> usize {
        let mut todo: Vec<&WarmRequest> = Vec::new();
        for request in requests {
            let cached = matches!(self.values(request.filter_type, &request.field), Ok(Some(_)));
            if !cached && !todo.contains(&request) {
                todo.push(request);
            }
        }

        let results = join_all(todo.iter().map(|request| self.warm(request))).await;
        results
            .into_iter()
            .zip(todo)
            .filter(|(result, request)| match result {
                Ok(_) => true,
                Err(e) => {
                    warn!(field = %request.field, error = %e, "Failed to load field values");
                    false
                }
            })
            .count()
    }

    /// Poison the catalog lock, as a panicking writer would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = self.catalog.write();
                    panic!("writer panicked");
                })
                .join();
        });
    }
}
