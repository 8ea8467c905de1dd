//! Cascade settings and option links: the item → category → global
//! inheritance chain and the merge that produces an effective view.
//!
//! Three-level merge for settings, per key:
//! 1. SKU record (explicit).
//! 2. Category record (inherited from the category).
//! 3. Built-in global default.
//!
//! Links are merged by option reference; an explicit link masks an
//! inherited link to the same option.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/* --------------------------------------------------------------------------
Named constants
-------------------------------------------------------------------------- */

/// Setting key: order in which option dimensions cascade in the picker.
pub const KEY_CASCADE_ORDER: &str = "cascade_order";

/// Setting key: which option dimensions are offered at all.
pub const KEY_ENABLED_DIMENSIONS: &str = "enabled_dimensions";

/// Setting key: free-form grouping rules (JSON object).
pub const KEY_GROUPING_RULES: &str = "grouping_rules";

pub const DIMENSION_GENDER: &str = "gender";
pub const DIMENSION_SIZE: &str = "size";
pub const DIMENSION_COLOR: &str = "color";

/// All recognized option dimensions, in default cascade order.
pub const ALL_DIMENSIONS: &[&str] = &[DIMENSION_GENDER, DIMENSION_SIZE, DIMENSION_COLOR];

/// All recognized setting keys.
pub const ALL_SETTING_KEYS: &[&str] = &[KEY_CASCADE_ORDER, KEY_ENABLED_DIMENSIONS, KEY_GROUPING_RULES];

/// Sparse raw settings as stored for one scope.
pub type SettingsMap = BTreeMap<String, Value>;

/// Global defaults applied when neither the SKU nor its category sets a key.
pub fn default_settings() -> SettingsMap {
    let dims = Value::from(ALL_DIMENSIONS.to_vec());
    SettingsMap::from([
        (KEY_CASCADE_ORDER.to_string(), dims.clone()),
        (KEY_ENABLED_DIMENSIONS.to_string(), dims),
        (KEY_GROUPING_RULES.to_string(), Value::Object(Default::default())),
    ])
}

/* --------------------------------------------------------------------------
Settings types
-------------------------------------------------------------------------- */

/// Where an inherited value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum InheritedFrom {
    Category { category_id: DbId },
    Global,
}

/// One resolved setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SettingValue {
    Explicit {
        value: Value,
    },
    Inherited {
        value: Value,
        inherited_from: InheritedFrom,
    },
}

impl SettingValue {
    pub fn value(&self) -> &Value {
        match self {
            SettingValue::Explicit { value } | SettingValue::Inherited { value, .. } => value,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, SettingValue::Explicit { .. })
    }
}

/// Resolved settings for one SKU, keyed by setting name.
pub type CascadeSettings = BTreeMap<String, SettingValue>;

/// The scope a stored settings record applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "applies_to_type", rename_all = "lowercase")]
pub enum SettingsTarget {
    Sku { item_sku: String },
    Category { category_id: DbId },
}

/// A stored settings record for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub id: DbId,
    #[serde(flatten)]
    pub target: SettingsTarget,
    pub settings: SettingsMap,
    pub updated_at: Option<Timestamp>,
}

/// What the settings fetch returns for one SKU: the SKU's own record (if
/// any) and its category's record (if any).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopedSettings {
    pub explicit: Option<SettingsMap>,
    pub category: Option<(DbId, SettingsMap)>,
}

/* --------------------------------------------------------------------------
Settings merge and validation
-------------------------------------------------------------------------- */

/// Merge scoped settings into one resolved map. Every key of the global
/// defaults is always present in the output.
pub fn merge_settings(scoped: &ScopedSettings) -> CascadeSettings {
    let mut out: CascadeSettings = default_settings()
        .into_iter()
        .map(|(key, value)| {
            (
                key,
                SettingValue::Inherited {
                    value,
                    inherited_from: InheritedFrom::Global,
                },
            )
        })
        .collect();

    if let Some((category_id, settings)) = &scoped.category {
        for (key, value) in settings {
            out.insert(
                key.clone(),
                SettingValue::Inherited {
                    value: value.clone(),
                    inherited_from: InheritedFrom::Category {
                        category_id: *category_id,
                    },
                },
            );
        }
    }

    if let Some(settings) = &scoped.explicit {
        for (key, value) in settings {
            out.insert(key.clone(), SettingValue::Explicit { value: value.clone() });
        }
    }

    out
}

/// Validate a raw settings payload before it is stored.
///
/// Rules:
/// - Only recognized keys.
/// - `cascade_order` / `enabled_dimensions`: arrays of known dimension
///   names without duplicates.
/// - `grouping_rules`: a JSON object (or null, stored as `{}`).
pub fn normalize_settings(raw: SettingsMap) -> Result<SettingsMap, CoreError> {
    let mut out = SettingsMap::new();
    for (key, value) in raw {
        let value = match key.as_str() {
            KEY_CASCADE_ORDER | KEY_ENABLED_DIMENSIONS => {
                validate_dimension_list(&key, &value)?;
                value
            }
            KEY_GROUPING_RULES => match value {
                Value::Null => Value::Object(Default::default()),
                Value::Object(_) => value,
                _ => {
                    return Err(CoreError::Validation(format!(
                        "{KEY_GROUPING_RULES} must be an object"
                    )))
                }
            },
            other => {
                return Err(CoreError::Validation(format!(
                    "Unknown setting key: '{other}'. Valid keys: {}",
                    ALL_SETTING_KEYS.join(", ")
                )))
            }
        };
        out.insert(key, value);
    }
    Ok(out)
}

fn validate_dimension_list(key: &str, value: &Value) -> Result<(), CoreError> {
    let Some(items) = value.as_array() else {
        return Err(CoreError::Validation(format!("{key} must be an array")));
    };
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        let Some(dim) = item.as_str() else {
            return Err(CoreError::Validation(format!(
                "{key} must contain only strings"
            )));
        };
        if !ALL_DIMENSIONS.contains(&dim) {
            return Err(CoreError::Validation(format!(
                "Unknown dimension in {key}: '{dim}'. Valid dimensions: {}",
                ALL_DIMENSIONS.join(", ")
            )));
        }
        if !seen.insert(dim) {
            return Err(CoreError::Validation(format!(
                "Duplicate dimension in {key}: '{dim}'"
            )));
        }
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Links
-------------------------------------------------------------------------- */

/// Kind of externally-defined option a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    // Declaration order is the sort order of the wire names.
    ColorTemplate,
    Material,
    SizeTemplate,
}

/// Identity of a linked option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OptionRef {
    pub option_type: OptionType,
    pub option_id: DbId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    Explicit,
    Inherited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionLink {
    pub sku: String,
    #[serde(flatten)]
    pub option_ref: OptionRef,
    pub scope: LinkScope,
    /// Category the link is inherited from (inherited links only).
    pub category_id: Option<DbId>,
    /// Display label of the linked option, when the provider knows it.
    pub label: Option<String>,
}

/// Merge link lists by `option_ref`: explicit links mask inherited ones,
/// duplicates within a scope collapse to the first occurrence. Output is
/// ordered by option reference.
pub fn merge_links(links: Vec<OptionLink>) -> Vec<OptionLink> {
    let mut merged: BTreeMap<OptionRef, OptionLink> = BTreeMap::new();
    for link in links {
        match merged.get(&link.option_ref) {
            None => {
                merged.insert(link.option_ref, link);
            }
            Some(current)
                if current.scope == LinkScope::Inherited && link.scope == LinkScope::Explicit =>
            {
                merged.insert(link.option_ref, link);
            }
            Some(_) => {}
        }
    }
    merged.into_values().collect()
}

/* --------------------------------------------------------------------------
Effective view
-------------------------------------------------------------------------- */

/// Fallback message when both sources fail without saying why.
pub const GENERIC_UPSTREAM_MESSAGE: &str = "Cascade settings and option links are unavailable";

/// The merged, read-only view a caller reads for one SKU. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveView {
    pub sku: String,
    pub cascade: CascadeSettings,
    pub links: Vec<OptionLink>,
    /// `true` when one of the two sources failed and its half is missing.
    pub degraded: bool,
    /// Message from the failed source, if any.
    pub error: Option<String>,
}

/// Apply the partial-failure policy to the two settled fetches.
///
/// - Both succeed: full view.
/// - One fails: view built from the other side, flagged `degraded`.
/// - Both fail: `Upstream` with the first non-empty message (settings
///   side first), else [`GENERIC_UPSTREAM_MESSAGE`].
/// - `NotFound` from either side is terminal.
pub fn settle(
    sku: &str,
    settings: Result<ScopedSettings, CoreError>,
    links: Result<Vec<OptionLink>, CoreError>,
) -> Result<EffectiveView, CoreError> {
    let settings = match settings {
        Err(err @ CoreError::NotFound { .. }) => return Err(err),
        other => other,
    };
    let links = match links {
        Err(err @ CoreError::NotFound { .. }) => return Err(err),
        other => other,
    };

    match (settings, links) {
        (Ok(settings), Ok(links)) => Ok(EffectiveView {
            sku: sku.to_string(),
            cascade: merge_settings(&settings),
            links: merge_links(links),
            degraded: false,
            error: None,
        }),
        (Ok(settings), Err(err)) => Ok(EffectiveView {
            sku: sku.to_string(),
            cascade: merge_settings(&settings),
            links: Vec::new(),
            degraded: true,
            error: Some(err.message()),
        }),
        (Err(err), Ok(links)) => Ok(EffectiveView {
            sku: sku.to_string(),
            cascade: merge_settings(&ScopedSettings::default()),
            links: merge_links(links),
            degraded: true,
            error: Some(err.message()),
        }),
        (Err(settings_err), Err(links_err)) => {
            let message = [settings_err.message(), links_err.message()]
                .into_iter()
                .find(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_UPSTREAM_MESSAGE.to_string());
            Err(CoreError::Upstream(message))
        }
    }
}
