//! In-process implementations of the store and provider traits.
//!
//! Used by the test suites and by the API binary when no `DATABASE_URL` or
//! `REMOTE_API_URL` is configured. Every mutating call runs under a single
//! write lock, and multi-step calls work on a copy of the state that is
//! swapped in only on success, so the atomicity contract of
//! [`InventoryStore`] holds here too.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::cascade::{OptionLink, ScopedSettings, SettingsMap, SettingsRecord, SettingsTarget};
use crate::error::CoreError;
use crate::matrix::{
    plan_reconcile, required_keys, total_quantity, CellKey, CellQuantity, ReconcileCounts,
    ReconcilePlan, StockCell,
};
use crate::options::{names_match, ColorOption, Item, OptionAxis, OptionDraft, SizeOption};
use crate::store::{CascadeSettingsStore, CascadeSource, InventoryStore, LinkSource, TemplateSource};
use crate::templates::{AxisPlan, AxisPlanOutcome, Template};
use crate::types::DbId;

#[derive(Debug, Clone)]
struct StoredSettings {
    record: SettingsRecord,
    active: bool,
}

#[derive(Debug, Clone, Default)]
struct State {
    next_id: DbId,
    items: BTreeMap<String, Item>,
    categories: BTreeMap<DbId, String>,
    colors: BTreeMap<DbId, ColorOption>,
    sizes: BTreeMap<DbId, SizeOption>,
    cells: BTreeMap<DbId, StockCell>,
    settings: BTreeMap<DbId, StoredSettings>,
}

impl State {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn upsert_color(
        &mut self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<ColorOption, CoreError> {
        if let Some(clash) = self
            .colors
            .values()
            .find(|c| c.sku == sku && Some(c.id) != id && names_match(&c.name, &draft.name))
        {
            return Err(CoreError::Conflict(format!(
                "color \"{}\" already exists with id {}",
                draft.name, clash.id
            )));
        }
        let id = match id {
            Some(id) => {
                if !self.colors.get(&id).is_some_and(|c| c.sku == sku) {
                    return Err(CoreError::not_found("ColorOption", id));
                }
                id
            }
            None => self.allocate_id(),
        };
        let option = ColorOption {
            id,
            sku: sku.to_string(),
            name: draft.name.clone(),
            swatch: draft.swatch.clone(),
            sort_order: draft.sort_order,
        };
        self.colors.insert(id, option.clone());
        Ok(option)
    }

    fn upsert_size(
        &mut self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<SizeOption, CoreError> {
        if let Some(clash) = self
            .sizes
            .values()
            .find(|s| s.sku == sku && Some(s.id) != id && names_match(&s.label, &draft.name))
        {
            return Err(CoreError::Conflict(format!(
                "size \"{}\" already exists with id {}",
                draft.name, clash.id
            )));
        }
        let id = match id {
            Some(id) => {
                if !self.sizes.get(&id).is_some_and(|s| s.sku == sku) {
                    return Err(CoreError::not_found("SizeOption", id));
                }
                id
            }
            None => self.allocate_id(),
        };
        let option = SizeOption {
            id,
            sku: sku.to_string(),
            label: draft.name.clone(),
            sort_order: draft.sort_order,
        };
        self.sizes.insert(id, option.clone());
        Ok(option)
    }

    /// Remove an option and its cells. Returns the number of rows removed,
    /// or `None` if the option does not belong to `sku`.
    fn remove_option(&mut self, sku: &str, axis: OptionAxis, id: DbId) -> Option<usize> {
        let removed = match axis {
            OptionAxis::Color => {
                self.colors.get(&id).is_some_and(|c| c.sku == sku)
                    && self.colors.remove(&id).is_some()
            }
            OptionAxis::Size => {
                self.sizes.get(&id).is_some_and(|s| s.sku == sku)
                    && self.sizes.remove(&id).is_some()
            }
        };
        if !removed {
            return None;
        }
        let before = self.cells.len();
        self.cells.retain(|_, cell| {
            let referenced = match axis {
                OptionAxis::Color => cell.color_id == Some(id),
                OptionAxis::Size => cell.size_id == Some(id),
            };
            !(cell.sku == sku && referenced)
        });
        Some(1 + before - self.cells.len())
    }

    fn cells_for(&self, sku: &str) -> Vec<StockCell> {
        self.cells.values().filter(|c| c.sku == sku).cloned().collect()
    }

    fn reconcile(&mut self, sku: &str, plan: &ReconcilePlan) {
        for id in &plan.remove {
            self.cells.remove(id);
        }
        for key in &plan.create {
            let id = self.allocate_id();
            self.cells.insert(
                id,
                StockCell {
                    id,
                    sku: sku.to_string(),
                    color_id: key.color_id,
                    size_id: key.size_id,
                    quantity: 0,
                },
            );
        }
    }

    fn required_for(&self, sku: &str) -> Vec<CellKey> {
        let colors: Vec<_> = self.colors.values().filter(|c| c.sku == sku).cloned().collect();
        let sizes: Vec<_> = self.sizes.values().filter(|s| s.sku == sku).cloned().collect();
        required_keys(&colors, &sizes)
    }

    /// Bring the cells of `sku` in line with its current options.
    fn reconcile_with_options(&mut self, sku: &str) -> ReconcilePlan {
        let plan = plan_reconcile(&self.required_for(sku), &self.cells_for(sku));
        self.reconcile(sku, &plan);
        plan
    }

    fn refresh_stock_level(&mut self, sku: &str) {
        let total = total_quantity(self.cells.values().filter(|c| c.sku == sku));
        if let Some(item) = self.items.get_mut(sku) {
            item.stock_level = total;
        }
    }

    fn active_settings(&self, target: &SettingsTarget) -> Option<&StoredSettings> {
        self.settings
            .values()
            .find(|s| s.active && &s.record.target == target)
    }
}

/// In-memory inventory and cascade settings store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item. Not counted as a write.
    pub fn add_item(&self, item: Item) {
        self.write().items.insert(item.sku.clone(), item);
    }

    /// Seed a category. Not counted as a write.
    pub fn add_category(&self, id: DbId, name: &str) {
        self.write().categories.insert(id, name.to_string());
    }

    /// Rows inserted, updated or deleted through the trait methods so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_writes(&self, n: usize) {
        self.writes.fetch_add(n, Ordering::SeqCst);
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_item(&self, sku: &str) -> Result<Option<Item>, CoreError> {
        Ok(self.read().items.get(sku).cloned())
    }

    async fn list_colors(&self, sku: &str) -> Result<Vec<ColorOption>, CoreError> {
        Ok(self
            .read()
            .colors
            .values()
            .filter(|c| c.sku == sku)
            .cloned()
            .collect())
    }

    async fn list_sizes(&self, sku: &str) -> Result<Vec<SizeOption>, CoreError> {
        Ok(self
            .read()
            .sizes
            .values()
            .filter(|s| s.sku == sku)
            .cloned()
            .collect())
    }

    async fn save_color(
        &self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<(ColorOption, ReconcileCounts), CoreError> {
        let mut state = self.write();
        let option = state.upsert_color(sku, id, draft)?;
        let plan = state.reconcile_with_options(sku);
        state.refresh_stock_level(sku);
        self.record_writes(1 + plan.write_count());
        Ok((option, plan.counts()))
    }

    async fn save_size(
        &self,
        sku: &str,
        id: Option<DbId>,
        draft: &OptionDraft,
    ) -> Result<(SizeOption, ReconcileCounts), CoreError> {
        let mut state = self.write();
        let option = state.upsert_size(sku, id, draft)?;
        let plan = state.reconcile_with_options(sku);
        state.refresh_stock_level(sku);
        self.record_writes(1 + plan.write_count());
        Ok((option, plan.counts()))
    }

    async fn delete_option(
        &self,
        sku: &str,
        axis: OptionAxis,
        id: DbId,
    ) -> Result<Option<ReconcileCounts>, CoreError> {
        let mut state = self.write();
        let Some(rows) = state.remove_option(sku, axis, id) else {
            return Ok(None);
        };
        let plan = state.reconcile_with_options(sku);
        state.refresh_stock_level(sku);
        self.record_writes(rows + plan.write_count());
        Ok(Some(plan.counts()))
    }

    async fn list_cells(&self, sku: &str) -> Result<Vec<StockCell>, CoreError> {
        Ok(self.read().cells_for(sku))
    }

    async fn apply_reconcile(&self, sku: &str, plan: &ReconcilePlan) -> Result<(), CoreError> {
        let mut state = self.write();
        state.reconcile(sku, plan);
        state.refresh_stock_level(sku);
        self.record_writes(plan.write_count());
        Ok(())
    }

    async fn write_quantities(
        &self,
        sku: &str,
        quantities: &[CellQuantity],
    ) -> Result<ReconcileCounts, CoreError> {
        let mut state = self.write();
        let required = state.required_for(sku);
        let known: HashSet<CellKey> = required.iter().copied().collect();
        if let Some(missing) = quantities.iter().find(|q| !known.contains(&q.key)) {
            return Err(CoreError::not_found("StockCell", missing.key));
        }

        let plan = plan_reconcile(&required, &state.cells_for(sku));
        state.reconcile(sku, &plan);
        let by_key: BTreeMap<CellKey, DbId> = state
            .cells
            .values()
            .filter(|c| c.sku == sku)
            .map(|c| (c.key(), c.id))
            .collect();
        for q in quantities {
            if let Some(cell) = by_key.get(&q.key).and_then(|id| state.cells.get_mut(id)) {
                cell.quantity = q.quantity;
            }
        }
        state.refresh_stock_level(sku);
        self.record_writes(plan.write_count() + quantities.len());
        Ok(plan.counts())
    }

    async fn apply_axis_plan(
        &self,
        sku: &str,
        axis: OptionAxis,
        plan: &AxisPlan,
    ) -> Result<AxisPlanOutcome, CoreError> {
        let mut guard = self.write();
        let mut next = guard.clone();
        let mut outcome = AxisPlanOutcome::default();

        for id in &plan.removals {
            next.remove_option(sku, axis, *id)
                .ok_or_else(|| CoreError::not_found(axis.entity(), *id))?;
            outcome.options_removed += 1;
        }
        for (id, draft) in &plan.upserts {
            match axis {
                OptionAxis::Color => {
                    next.upsert_color(sku, *id, draft)?;
                }
                OptionAxis::Size => {
                    next.upsert_size(sku, *id, draft)?;
                }
            }
            if id.is_some() {
                outcome.options_updated += 1;
            } else {
                outcome.options_added += 1;
            }
        }

        let reconcile = next.reconcile_with_options(sku);
        next.refresh_stock_level(sku);
        outcome.cells_created = reconcile.create.len();
        outcome.cells_removed = reconcile.remove.len();

        *guard = next;
        self.record_writes(plan.upserts.len() + plan.removals.len() + reconcile.write_count());
        Ok(outcome)
    }
}

#[async_trait]
impl CascadeSource for MemoryStore {
    async fn scoped_settings(&self, sku: &str) -> Result<ScopedSettings, CoreError> {
        let state = self.read();
        let item = state
            .items
            .get(sku)
            .ok_or_else(|| CoreError::not_found("Item", sku))?;

        let explicit = state
            .active_settings(&SettingsTarget::Sku {
                item_sku: sku.to_string(),
            })
            .map(|s| s.record.settings.clone());
        let category = item.category_id.and_then(|category_id| {
            state
                .active_settings(&SettingsTarget::Category { category_id })
                .map(|s| (category_id, s.record.settings.clone()))
        });
        Ok(ScopedSettings { explicit, category })
    }
}

#[async_trait]
impl CascadeSettingsStore for MemoryStore {
    async fn list_settings(&self) -> Result<Vec<SettingsRecord>, CoreError> {
        Ok(self
            .read()
            .settings
            .values()
            .filter(|s| s.active)
            .map(|s| s.record.clone())
            .collect())
    }

    async fn upsert_settings(
        &self,
        target: &SettingsTarget,
        settings: &SettingsMap,
    ) -> Result<SettingsRecord, CoreError> {
        let mut state = self.write();
        match target {
            SettingsTarget::Sku { item_sku } if !state.items.contains_key(item_sku) => {
                return Err(CoreError::not_found("Item", item_sku));
            }
            SettingsTarget::Category { category_id }
                if !state.categories.contains_key(category_id) =>
            {
                return Err(CoreError::not_found("Category", category_id));
            }
            _ => {}
        }

        let existing = state.active_settings(target).map(|s| s.record.id);
        let id = match existing {
            Some(id) => id,
            None => state.allocate_id(),
        };
        let record = SettingsRecord {
            id,
            target: target.clone(),
            settings: settings.clone(),
            updated_at: Some(Utc::now()),
        };
        state.settings.insert(
            id,
            StoredSettings {
                record: record.clone(),
                active: true,
            },
        );
        self.record_writes(1);
        Ok(record)
    }

    async fn deactivate_settings(&self, id: DbId) -> Result<bool, CoreError> {
        let mut state = self.write();
        match state.settings.get_mut(&id) {
            Some(stored) if stored.active => {
                stored.active = false;
                self.record_writes(1);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Fixed set of option links, filtered by SKU.
#[derive(Debug, Clone, Default)]
pub struct StaticLinks {
    links: Vec<OptionLink>,
}

impl StaticLinks {
    pub fn new(links: Vec<OptionLink>) -> Self {
        Self { links }
    }
}

#[async_trait]
impl LinkSource for StaticLinks {
    async fn effective_links(&self, sku: &str) -> Result<Vec<OptionLink>, CoreError> {
        Ok(self.links.iter().filter(|l| l.sku == sku).cloned().collect())
    }
}

/// Fixed set of templates, looked up by id.
///
/// The axis is not used as a filter: a template of the other axis is
/// returned as-is and rejected by the applicator.
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: Vec<Template>,
}

impl StaticTemplates {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl TemplateSource for StaticTemplates {
    async fn fetch_template(
        &self,
        template_id: &str,
        _axis: OptionAxis,
    ) -> Result<Option<Template>, CoreError> {
        Ok(self.templates.iter().find(|t| t.id == template_id).cloned())
    }
}
