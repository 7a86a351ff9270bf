// SPDX-License-Identifier: PMPL-1.0-or-later
//! The editing session: one filter tree plus the collaborators that feed
//! and execute it.
//!
//! Edits are synchronous and replace the tree wholesale. Field changes
//! queue value warm-ups, which [`FilterSession::flush_warm`] fetches.

use std::sync::Arc;

use fleetq_filter::{
    summarize, summarize_with_labels, BlockEdit, BlockPatch, FilterCatalog, FilterConfig,
    FilterTree, FilterType, GroupPatch, LoadedTemplate, Page, TemplateDraft, TemplateSummary,
    WarmRequest,
};
use tracing::debug;

use crate::catalog::CatalogCache;
use crate::error::Result;
use crate::executor::{QueryExecutor, QueryOutcome};
use crate::service::{CatalogService, QueryService, TemplateStore};
use crate::templates::TemplateManager;

/// The three remote collaborators a session needs.
#[derive(Clone)]
pub struct Collaborators {
    pub query: Arc<dyn QueryService>,
    pub templates: Arc<dyn TemplateStore>,
    pub catalog: Arc<dyn CatalogService>,
}

impl Collaborators {
    /// Use one service for all three roles.
    pub fn shared<S>(service: Arc<S>) -> Self
    where
        S: QueryService + TemplateStore + CatalogService + 'static,
    {
        Self {
            query: service.clone(),
            templates: service.clone(),
            catalog: service,
        }
    }
}

pub struct FilterSession {
    tree: FilterTree,
    catalog: CatalogCache,
    executor: QueryExecutor,
    templates: TemplateManager,
    config: FilterConfig,
    pending_warm: Vec<WarmRequest>,
}

impl FilterSession {
    pub fn new(collaborators: Collaborators, config: FilterConfig) -> Self {
        Self {
            tree: FilterTree::new(),
            catalog: CatalogCache::new(collaborators.catalog, config.value_size_hint),
            executor: QueryExecutor::new(collaborators.query, config.clone()),
            templates: TemplateManager::new(collaborators.templates, config.default_page_size),
            config,
            pending_warm: Vec::new(),
        }
    }

    pub fn tree(&self) -> &FilterTree {
        &self.tree
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub fn is_running(&self) -> bool {
        self.executor.is_running()
    }

    /// Warm-ups queued by edits and not yet fetched.
    pub fn pending_warm(&self) -> &[WarmRequest] {
        &self.pending_warm
    }

    /// Summary of the current tree, with catalog labels when available.
    pub fn summary(&self) -> String {
        match self.catalog.catalog() {
            Ok(catalog) => summarize_with_labels(self.tree.groups(), &catalog, self.config.summary_max_length),
            Err(_) => summarize(self.tree.groups(), self.config.summary_max_length),
        }
    }

    // -- Editing ------------------------------------------------------------

    /// Append an empty group and return its id.
    pub fn add_group(&mut self) -> String {
        self.tree = self.tree.add_group();
        self.tree
            .groups()
            .last()
            .map(|g| g.id.clone())
            .unwrap_or_default()
    }

    pub fn update_group(&mut self, group_id: &str, patch: &GroupPatch) {
        self.tree = self.tree.update_group(group_id, patch);
    }

    /// Append a default block; returns its id, or `None` for an unknown
    /// group.
    pub fn add_block(&mut self, group_id: &str, filter_type: FilterType) -> Result<Option<String>> {
        if self.tree.group(group_id).is_none() {
            return Ok(None);
        }
        let catalog = self.catalog.catalog()?;
        let edit = self.tree.add_block(group_id, filter_type, &catalog);
        let id = edit
            .tree
            .group(group_id)
            .and_then(|g| g.blocks.last())
            .map(|b| b.id.clone());
        self.apply(edit);
        Ok(id)
    }

    /// Returns whether the block exists.
    pub fn update_block(&mut self, group_id: &str, block_id: &str, patch: BlockPatch) -> bool {
        if self.tree.block(group_id, block_id).is_none() {
            return false;
        }
        let edit = self.tree.update_block(group_id, block_id, patch);
        self.apply(edit);
        true
    }

    pub fn remove_block(&mut self, group_id: &str, block_id: &str) {
        self.tree = self.tree.remove_block(group_id, block_id);
    }

    pub fn remove_all_blocks_in_group(&mut self, group_id: &str) {
        self.tree = self.tree.remove_all_blocks_in_group(group_id);
    }

    pub fn remove_group(&mut self, group_id: &str) {
        self.tree = self.tree.remove_group(group_id);
    }

    pub fn reset_all(&mut self) {
        self.tree = self.tree.reset_all();
        self.pending_warm.clear();
    }

    fn apply(&mut self, edit: BlockEdit) {
        self.tree = edit.tree;
        if let Some(request) = edit.warm {
            self.queue_warm(request);
        }
    }

    fn queue_warm(&mut self, request: WarmRequest) {
        if !self.pending_warm.contains(&request) {
            debug!(field = %request.field, filter_type = %request.filter_type, "Queued field value warm-up");
            self.pending_warm.push(request);
        }
    }

    // -- Remote work --------------------------------------------------------

    /// Fetch every queued warm-up. Failures are logged and dropped.
    pub async fn flush_warm(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_warm);
        self.catalog.warm_all(&pending).await
    }

    /// Reload the field catalogs, then give blank-field blocks a default
    /// field. On failure the tree is left as it was.
    pub async fn refresh_catalog(&mut self) -> Result<FilterCatalog> {
        let catalog = self.catalog.refresh().await?;
        self.fill_defaults(&catalog);
        Ok(catalog)
    }

    fn fill_defaults(&mut self, catalog: &FilterCatalog) {
        let (tree, warm) = self.tree.fill_default_fields(catalog);
        self.tree = tree;
        for request in warm {
            self.queue_warm(request);
        }
    }

    /// Run the current tree. `page` is 1-based; `size` defaults to the
    /// configured page size.
    pub async fn run(&self, page: u32, size: Option<u32>) -> Result<QueryOutcome> {
        let catalog = self.catalog.catalog()?;
        self.executor.execute(&self.tree, &catalog, page, size).await
    }

    pub async fn save_template(&self, draft: &TemplateDraft) -> Result<TemplateSummary> {
        self.templates.save(&self.tree, draft).await
    }

    pub async fn list_templates(&self, page: u32) -> Result<Page<TemplateSummary>> {
        self.templates.list(page).await
    }

    /// Replace the tree with a stored template. On failure the tree is left
    /// as it was.
    pub async fn load_template(&mut self, id: u64) -> Result<LoadedTemplate> {
        let loaded = self.templates.load(id).await?;
        let catalog = self.catalog.catalog()?;
        self.tree = loaded.tree.clone();
        self.pending_warm.clear();
        self.fill_defaults(&catalog);
        let fields: Vec<WarmRequest> = self
            .tree
            .groups()
            .iter()
            .flat_map(|g| g.blocks.iter())
            .filter(|b| !b.field.is_empty())
            .map(|b| WarmRequest {
                filter_type: b.filter_type,
                field: b.field.clone(),
            })
            .collect();
        for request in fields {
            self.queue_warm(request);
        }
        Ok(loaded)
    }

    pub async fn delete_template(&self, id: u64) -> Result<()> {
        self.templates.delete(id).await
    }
}
