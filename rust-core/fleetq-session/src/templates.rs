// SPDX-License-Identifier: PMPL-1.0-or-later
//! Saving, listing, loading, and deleting query templates.

use std::sync::Arc;

use fleetq_filter::{
    load_template, to_persisted, FilterTree, LoadedTemplate, Page, TemplateDraft, TemplateSummary,
};
use tracing::{info, warn};

use crate::error::{Result, SessionError};
use crate::service::TemplateStore;

pub struct TemplateManager {
    store: Arc<dyn TemplateStore>,
    page_size: u32,
}

impl TemplateManager {
    pub fn new(store: Arc<dyn TemplateStore>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    /// Persist the active part of `tree` under `draft`'s name.
    pub async fn save(&self, tree: &FilterTree, draft: &TemplateDraft) -> Result<TemplateSummary> {
        if draft.name.trim().is_empty() {
            return Err(SessionError::Validation("template name is required".to_string()));
        }

        let template = to_persisted(tree.groups(), draft, true);
        info!(name = %template.name, id = ?template.id, groups = template.groups.len(), "Saving query template");
        self.store.save_template(&template).await.map_err(|e| {
            warn!(name = %template.name, error = %e, "Failed to save query template");
            e
        })
    }

    pub async fn list(&self, page: u32) -> Result<Page<TemplateSummary>> {
        self.store.list_templates(page.max(1), self.page_size).await
    }

    /// Fetch and decode a template. Malformed groups decode leniently; only
    /// transport errors fail.
    pub async fn load(&self, id: u64) -> Result<LoadedTemplate> {
        let raw = self.store.fetch_template(id).await.map_err(|e| {
            warn!(id, error = %e, "Failed to fetch query template");
            e
        })?;
        let mut loaded = load_template(&raw);
        loaded.id.get_or_insert(id);
        info!(id, name = %loaded.name, blocks = loaded.tree.block_count(), "Loaded query template");
        Ok(loaded)
    }

    pub async fn delete(&self, id: u64) -> Result<()> {
        self.store.delete_template(id).await?;
        info!(id, "Deleted query template");
        Ok(())
    }
}
