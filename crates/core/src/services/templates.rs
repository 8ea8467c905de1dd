//! Template applicator: replaces one option axis of an item with a
//! template's option set.

use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::locks::SkuLocks;
use crate::options::{normalize_sku, OptionAxis};
use crate::services::require_item;
use crate::store::{InventoryStore, TemplateSource};
use crate::templates::{plan_template, AxisPlan, AxisPlanOutcome, Template};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateApplied {
    pub sku: String,
    pub template_id: String,
    pub axis: OptionAxis,
    #[serde(flatten)]
    pub outcome: AxisPlanOutcome,
}

#[derive(Clone)]
pub struct TemplateApplicator {
    store: Arc<dyn InventoryStore>,
    templates: Arc<dyn TemplateSource>,
    locks: SkuLocks,
}

impl TemplateApplicator {
    pub fn new(
        store: Arc<dyn InventoryStore>,
        templates: Arc<dyn TemplateSource>,
        locks: SkuLocks,
    ) -> Self {
        Self {
            store,
            templates,
            locks,
        }
    }

    pub async fn apply_color_template(
        &self,
        sku: &str,
        template_id: &str,
    ) -> Result<TemplateApplied, CoreError> {
        self.apply(sku, template_id, OptionAxis::Color).await
    }

    pub async fn apply_size_template(
        &self,
        sku: &str,
        template_id: &str,
    ) -> Result<TemplateApplied, CoreError> {
        self.apply(sku, template_id, OptionAxis::Size).await
    }

    /// Fetch, plan and commit. The lock is held across the remote fetch so
    /// the plan is computed against options nobody else can change.
    async fn apply(
        &self,
        sku: &str,
        template_id: &str,
        axis: OptionAxis,
    ) -> Result<TemplateApplied, CoreError> {
        let sku = normalize_sku(sku)?;
        let template_id = template_id.trim();
        if template_id.is_empty() {
            return Err(CoreError::Validation("template_id must not be empty".into()));
        }
        let _guard = self.locks.try_acquire(&sku, "apply_template")?;
        require_item(self.store.as_ref(), &sku).await?;

        let template = self
            .templates
            .fetch_template(template_id, axis)
            .await?
            .ok_or_else(|| CoreError::not_found("Template", template_id))?;
        if template.axis != axis {
            return Err(CoreError::Validation(format!(
                "Template '{template_id}' is a {} template, not a {axis} template",
                template.axis
            )));
        }

        let plan = self.plan(&sku, axis, &template).await?;
        let outcome = self.store.apply_axis_plan(&sku, axis, &plan).await?;

        tracing::info!(
            sku = %sku,
            template_id = %template_id,
            axis = %axis,
            added = outcome.options_added,
            updated = outcome.options_updated,
            removed = outcome.options_removed,
            cells_created = outcome.cells_created,
            cells_removed = outcome.cells_removed,
            "Applied template"
        );
        Ok(TemplateApplied {
            sku,
            template_id: template_id.to_string(),
            axis,
            outcome,
        })
    }

    async fn plan(
        &self,
        sku: &str,
        axis: OptionAxis,
        template: &Template,
    ) -> Result<AxisPlan, CoreError> {
        match axis {
            OptionAxis::Color => plan_template(template, &self.store.list_colors(sku).await?),
            OptionAxis::Size => plan_template(template, &self.store.list_sizes(sku).await?),
        }
    }
}
