//! Colour × size stock matrix: reconciliation planning, even distribution
//! and explicit update validation.
//!
//! Everything here is pure. Store implementations call [`plan_reconcile`]
//! inside their own transaction so the plan is computed against the same
//! snapshot it is applied to.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::options::{sort_options, ColorOption, SizeOption};
use crate::types::DbId;

/// Address of one cell in the matrix. A `None` side means that axis is
/// not populated for the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub color_id: Option<DbId>,
    pub size_id: Option<DbId>,
}

impl CellKey {
    pub fn new(color_id: Option<DbId>, size_id: Option<DbId>) -> Self {
        Self { color_id, size_id }
    }
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let part = |id: Option<DbId>| id.map_or_else(|| "-".to_string(), |id| id.to_string());
        write!(f, "color={}/size={}", part(self.color_id), part(self.size_id))
    }
}

/// One persisted stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCell {
    pub id: DbId,
    pub sku: String,
    pub color_id: Option<DbId>,
    pub size_id: Option<DbId>,
    pub quantity: i64,
}

impl StockCell {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.color_id, self.size_id)
    }
}

// ---------------------------------------------------------------------------
// Required cells
// ---------------------------------------------------------------------------

/// Compute the cells the matrix must contain, in distribution order
/// (ascending colour sort order, then size sort order).
///
/// - Both axes populated: Cartesian product.
/// - One axis empty: the other axis alone.
/// - Both empty: no cells.
pub fn required_keys(colors: &[ColorOption], sizes: &[SizeOption]) -> Vec<CellKey> {
    let mut colors = colors.to_vec();
    let mut sizes = sizes.to_vec();
    sort_options(&mut colors);
    sort_options(&mut sizes);

    match (colors.is_empty(), sizes.is_empty()) {
        (true, true) => Vec::new(),
        (false, true) => colors
            .iter()
            .map(|c| CellKey::new(Some(c.id), None))
            .collect(),
        (true, false) => sizes
            .iter()
            .map(|s| CellKey::new(None, Some(s.id)))
            .collect(),
        (false, false) => colors
            .iter()
            .flat_map(|c| sizes.iter().map(move |s| CellKey::new(Some(c.id), Some(s.id))))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Writes needed to bring the persisted cells in line with the options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    /// Cells to create with quantity 0.
    pub create: Vec<CellKey>,
    /// Ids of orphaned or duplicate cells to delete.
    pub remove: Vec<DbId>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.remove.is_empty()
    }

    pub fn write_count(&self) -> usize {
        self.create.len() + self.remove.len()
    }

    pub fn counts(&self) -> ReconcileCounts {
        ReconcileCounts {
            created: self.create.len(),
            removed: self.remove.len(),
        }
    }
}

/// Cells created and removed by one applied reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileCounts {
    pub created: usize,
    pub removed: usize,
}

/// Diff the required cells against the existing ones.
///
/// Duplicate cells for the same key keep the lowest id.
pub fn plan_reconcile(required: &[CellKey], existing: &[StockCell]) -> ReconcilePlan {
    let required_set: HashSet<CellKey> = required.iter().copied().collect();

    let mut by_id: Vec<&StockCell> = existing.iter().collect();
    by_id.sort_by_key(|c| c.id);

    let mut seen = HashSet::with_capacity(by_id.len());
    let mut remove = Vec::new();
    for cell in by_id {
        let key = cell.key();
        if !required_set.contains(&key) || !seen.insert(key) {
            remove.push(cell.id);
        }
    }

    let create = required
        .iter()
        .filter(|key| !seen.contains(*key))
        .copied()
        .collect();

    ReconcilePlan { create, remove }
}

// ---------------------------------------------------------------------------
// Quantities
// ---------------------------------------------------------------------------

/// Largest quantity a single cell may hold.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// A quantity to write to one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellQuantity {
    pub key: CellKey,
    pub quantity: i64,
}

/// Split `total` evenly across `keys` in order.
///
/// Every cell receives `total / n`; the first `total % n` cells receive one
/// extra unit. An empty key list yields an empty result. Fails if any
/// cell would receive more than [`MAX_QUANTITY`].
pub fn distribute_evenly(keys: &[CellKey], total: i64) -> Result<Vec<CellQuantity>, CoreError> {
    if total < 0 {
        return Err(CoreError::Validation(format!(
            "Total quantity must not be negative (got {total})"
        )));
    }
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let n = keys.len() as i64;
    let base = total / n;
    let remainder = (total % n) as usize;
    let largest = base + i64::from(remainder > 0);
    if largest > MAX_QUANTITY {
        return Err(CoreError::Validation(format!(
            "Total quantity {total} over {n} cells exceeds the per-cell maximum of {MAX_QUANTITY}"
        )));
    }

    Ok(keys
        .iter()
        .enumerate()
        .map(|(i, key)| CellQuantity {
            key: *key,
            quantity: base + i64::from(i < remainder),
        })
        .collect())
}

/// One explicit update from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    #[serde(default)]
    pub color_id: Option<DbId>,
    #[serde(default)]
    pub size_id: Option<DbId>,
    pub quantity: i64,
}

/// Validate a batch of explicit updates against the current matrix.
///
/// The whole batch is rejected if any update is negative or above
/// [`MAX_QUANTITY`], addresses a cell outside the matrix, or addresses the
/// same cell twice.
pub fn validate_updates(
    required: &[CellKey],
    updates: &[CellUpdate],
) -> Result<Vec<CellQuantity>, CoreError> {
    let required_set: HashSet<CellKey> = required.iter().copied().collect();
    let mut seen = HashSet::with_capacity(updates.len());
    let mut out = Vec::with_capacity(updates.len());

    for (i, update) in updates.iter().enumerate() {
        let key = CellKey::new(update.color_id, update.size_id);
        if update.quantity < 0 {
            return Err(CoreError::Validation(format!(
                "Update at index {i} has a negative quantity ({})",
                update.quantity
            )));
        }
        if update.quantity > MAX_QUANTITY {
            return Err(CoreError::Validation(format!(
                "Update at index {i} exceeds the per-cell maximum of {MAX_QUANTITY} ({})",
                update.quantity
            )));
        }
        if !required_set.contains(&key) {
            return Err(CoreError::Validation(format!(
                "Update at index {i} addresses a cell outside the matrix ({key})"
            )));
        }
        if !seen.insert(key) {
            return Err(CoreError::Validation(format!(
                "Update at index {i} addresses {key} more than once"
            )));
        }
        out.push(CellQuantity {
            key,
            quantity: update.quantity,
        });
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Sum of cell quantities, saturating at `i64::MAX`.
pub fn total_quantity<'a>(cells: impl IntoIterator<Item = &'a StockCell>) -> i64 {
    cells
        .into_iter()
        .fold(0i64, |total, cell| total.saturating_add(cell.quantity))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisTotal {
    pub id: DbId,
    pub name: String,
    pub quantity: i64,
}

/// Per-axis stock aggregates for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub sku: String,
    pub total: i64,
    pub by_color: Vec<AxisTotal>,
    pub by_size: Vec<AxisTotal>,
}

/// Roll cell quantities up per colour and per size. Cells that reference
/// unknown options still count toward `total` but not toward any axis.
pub fn summarize(
    sku: &str,
    colors: &[ColorOption],
    sizes: &[SizeOption],
    cells: &[StockCell],
) -> StockSummary {
    let mut per_color: BTreeMap<DbId, i64> = BTreeMap::new();
    let mut per_size: BTreeMap<DbId, i64> = BTreeMap::new();

    for cell in cells {
        if let Some(color_id) = cell.color_id {
            let sum = per_color.entry(color_id).or_default();
            *sum = sum.saturating_add(cell.quantity);
        }
        if let Some(size_id) = cell.size_id {
            let sum = per_size.entry(size_id).or_default();
            *sum = sum.saturating_add(cell.quantity);
        }
    }

    let mut colors = colors.to_vec();
    let mut sizes = sizes.to_vec();
    sort_options(&mut colors);
    sort_options(&mut sizes);

    StockSummary {
        sku: sku.to_string(),
        total: total_quantity(cells),
        by_color: colors
            .into_iter()
            .map(|c| AxisTotal {
                quantity: per_color.get(&c.id).copied().unwrap_or(0),
                id: c.id,
                name: c.name,
            })
            .collect(),
        by_size: sizes
            .into_iter()
            .map(|s| AxisTotal {
                quantity: per_size.get(&s.id).copied().unwrap_or(0),
                id: s.id,
                name: s.label,
            })
            .collect(),
    }
}
