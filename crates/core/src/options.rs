//! Colour and size option definitions scoped to a catalog item.
//!
//! Holds the domain types for the two option axes plus the pure validation
//! and upsert-resolution rules shared by every store implementation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of a colour name or size label (after trimming).
pub const MAX_NAME_LEN: usize = 64;

/// Maximum length of a swatch reference (hex code or swatch key).
pub const MAX_SWATCH_LEN: usize = 32;

/// Which option axis an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionAxis {
    Color,
    Size,
}

impl OptionAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionAxis::Color => "color",
            OptionAxis::Size => "size",
        }
    }

    /// Entity name used in `NotFound` errors.
    pub fn entity(self) -> &'static str {
        match self {
            OptionAxis::Color => "ColorOption",
            OptionAxis::Size => "SizeOption",
        }
    }
}

impl std::fmt::Display for OptionAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog item the options hang off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub sku: String,
    pub name: String,
    pub category_id: Option<DbId>,
    /// Rollup of every stock cell quantity for the item.
    pub stock_level: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    pub id: DbId,
    pub sku: String,
    pub name: String,
    /// Hex code (`#ff0000`) or a swatch reference.
    pub swatch: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeOption {
    pub id: DbId,
    pub sku: String,
    pub label: String,
    pub sort_order: i32,
}

/// Request body for saving a colour.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorInput {
    pub id: Option<DbId>,
    pub name: String,
    pub swatch: Option<String>,
    pub sort_order: Option<i32>,
}

/// Request body for saving a size.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SizeInput {
    pub id: Option<DbId>,
    pub label: String,
    pub sort_order: Option<i32>,
}

/// Validated, store-ready option fields. `swatch` is always `None` for sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub name: String,
    pub swatch: Option<String>,
    pub sort_order: i32,
}

/// Common view over both option axes, used by matrix ordering and
/// template planning.
pub trait AxisOption {
    fn id(&self) -> DbId;
    fn key_name(&self) -> &str;
    fn sort_order(&self) -> i32;
}

impl AxisOption for ColorOption {
    fn id(&self) -> DbId {
        self.id
    }
    fn key_name(&self) -> &str {
        &self.name
    }
    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

impl AxisOption for SizeOption {
    fn id(&self) -> DbId {
        self.id
    }
    fn key_name(&self) -> &str {
        &self.label
    }
    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Trim a SKU taken from a path or request body. Every service entry point
/// goes through this, so `" SKU-1"` and `"SKU-1"` address the same item.
pub fn normalize_sku(raw: &str) -> Result<String, CoreError> {
    let sku = raw.trim();
    if sku.is_empty() {
        return Err(CoreError::Validation("SKU must not be empty".into()));
    }
    Ok(sku.to_string())
}

/// Trim and validate a colour name or size label.
pub fn validate_option_name(axis: OptionAxis, raw: &str) -> Result<String, CoreError> {
    let field = match axis {
        OptionAxis::Color => "Color name",
        OptionAxis::Size => "Size label",
    };
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must not exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Trim a swatch reference; blank input becomes `None`.
pub fn validate_swatch(raw: Option<&str>) -> Result<Option<String>, CoreError> {
    let Some(swatch) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if swatch.chars().count() > MAX_SWATCH_LEN {
        return Err(CoreError::Validation(format!(
            "Swatch must not exceed {MAX_SWATCH_LEN} characters"
        )));
    }
    Ok(Some(swatch.to_string()))
}

impl ColorInput {
    pub fn into_draft(self) -> Result<OptionDraft, CoreError> {
        Ok(OptionDraft {
            name: validate_option_name(OptionAxis::Color, &self.name)?,
            swatch: validate_swatch(self.swatch.as_deref())?,
            sort_order: self.sort_order.unwrap_or(0),
        })
    }
}

impl SizeInput {
    pub fn into_draft(self) -> Result<OptionDraft, CoreError> {
        Ok(OptionDraft {
            name: validate_option_name(OptionAxis::Size, &self.label)?,
            swatch: None,
            sort_order: self.sort_order.unwrap_or(0),
        })
    }
}

/// Option names are unique per SKU regardless of case.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Upsert resolution
// ---------------------------------------------------------------------------

/// What a save should do against the current option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertTarget {
    Insert,
    Update(DbId),
}

impl UpsertTarget {
    /// The id to update, or `None` for an insert.
    pub fn id(self) -> Option<DbId> {
        match self {
            UpsertTarget::Insert => None,
            UpsertTarget::Update(id) => Some(id),
        }
    }
}

/// Decide whether a save inserts or updates, enforcing per-SKU name
/// uniqueness.
///
/// - With an explicit id: the id must exist, and no *other* option may
///   already carry the name.
/// - Without an id: an existing option with the same name is updated in
///   place, otherwise a new option is inserted.
pub fn resolve_upsert<O: AxisOption>(
    axis: OptionAxis,
    existing: &[O],
    id: Option<DbId>,
    name: &str,
) -> Result<UpsertTarget, CoreError> {
    let same_name = existing.iter().find(|o| names_match(o.key_name(), name));
    match id {
        Some(id) => {
            if !existing.iter().any(|o| o.id() == id) {
                return Err(CoreError::not_found(axis.entity(), id));
            }
            match same_name {
                Some(other) if other.id() != id => Err(CoreError::Conflict(format!(
                    "{axis} \"{name}\" already exists with id {}",
                    other.id()
                ))),
                _ => Ok(UpsertTarget::Update(id)),
            }
        }
        None => Ok(same_name.map_or(UpsertTarget::Insert, |o| UpsertTarget::Update(o.id()))),
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Sort options by `sort_order`, then case-insensitive name, then id.
pub fn sort_options<O: AxisOption>(options: &mut [O]) {
    options.sort_by(|a, b| {
        a.sort_order()
            .cmp(&b.sort_order())
            .then_with(|| a.key_name().to_lowercase().cmp(&b.key_name().to_lowercase()))
            .then_with(|| a.id().cmp(&b.id()))
    });
}
