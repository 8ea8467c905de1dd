//! Rows for `item_option_cascade_settings`.

use serde_json::Value;
use sqlx::FromRow;
use stockgrid_core::cascade::{SettingsMap, SettingsRecord, SettingsTarget};
use stockgrid_core::error::CoreError;
use stockgrid_core::types::{DbId, Timestamp};

/// `applies_to_type` values.
pub const APPLIES_TO_SKU: &str = "sku";
pub const APPLIES_TO_CATEGORY: &str = "category";

#[derive(Debug, Clone, FromRow)]
pub struct CascadeSettingsRow {
    pub id: DbId,
    pub applies_to_type: String,
    pub item_sku: Option<String>,
    pub category_id: Option<DbId>,
    pub settings: Value,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CascadeSettingsRow {
    /// The stored settings object. Anything other than a JSON object is
    /// treated as empty.
    pub fn settings_map(&self) -> SettingsMap {
        match &self.settings {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => SettingsMap::new(),
        }
    }
}

impl TryFrom<CascadeSettingsRow> for SettingsRecord {
    type Error = CoreError;

    fn try_from(row: CascadeSettingsRow) -> Result<Self, Self::Error> {
        let settings = row.settings_map();
        let target = match (row.applies_to_type.as_str(), row.item_sku, row.category_id) {
            (APPLIES_TO_SKU, Some(item_sku), _) => SettingsTarget::Sku { item_sku },
            (APPLIES_TO_CATEGORY, _, Some(category_id)) => SettingsTarget::Category { category_id },
            (other, _, _) => {
                return Err(CoreError::Internal(format!(
                    "Cascade settings row {} has an invalid scope '{other}'",
                    row.id
                )))
            }
        };
        Ok(SettingsRecord {
            id: row.id,
            target,
            settings,
            updated_at: Some(row.updated_at),
        })
    }
}

/// Split a target into the `(applies_to_type, item_sku, category_id)`
/// column triple.
pub fn target_columns(target: &SettingsTarget) -> (&'static str, Option<&str>, Option<DbId>) {
    match target {
        SettingsTarget::Sku { item_sku } => (APPLIES_TO_SKU, Some(item_sku.as_str()), None),
        SettingsTarget::Category { category_id } => (APPLIES_TO_CATEGORY, None, Some(*category_id)),
    }
}
