//! Colour and size templates: reusable option sets applied wholesale to
//! an item.
//!
//! [`plan_template`] turns a template plus the item's current options into
//! an [`AxisPlan`]; the store commits the plan and the resulting matrix
//! reconciliation in one atomic step.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::options::{
    names_match, validate_option_name, validate_swatch, AxisOption, OptionAxis, OptionDraft,
};
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOption {
    /// Colour name or size label.
    pub name: String,
    #[serde(default)]
    pub swatch: Option<String>,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub axis: OptionAxis,
    pub options: Vec<TemplateOption>,
}

/// Option writes for one axis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisPlan {
    /// `(existing id, fields)`; `None` id means insert.
    pub upserts: Vec<(Option<DbId>, OptionDraft)>,
    /// Ids of current options absent from the template.
    pub removals: Vec<DbId>,
}

/// Counts reported after a template is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AxisPlanOutcome {
    pub options_added: usize,
    pub options_updated: usize,
    pub options_removed: usize,
    pub cells_created: usize,
    pub cells_removed: usize,
}

/// Plan the replacement of `current` options by the template's set.
///
/// Template entries match current options by name (case-insensitive):
/// matches keep their id, the rest are inserted, and current options the
/// template does not mention are removed. A template entry without an
/// explicit sort order takes its position in the template.
pub fn plan_template<O: AxisOption>(
    template: &Template,
    current: &[O],
) -> Result<AxisPlan, CoreError> {
    if template.options.is_empty() {
        return Err(CoreError::Validation(format!(
            "Template '{}' has no options",
            template.id
        )));
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(template.options.len());
    let mut kept: HashSet<DbId> = HashSet::with_capacity(current.len());
    let mut upserts = Vec::with_capacity(template.options.len());

    for (position, option) in template.options.iter().enumerate() {
        let name = validate_option_name(template.axis, &option.name)?;
        if !seen.insert(name.to_lowercase()) {
            return Err(CoreError::Validation(format!(
                "Template '{}' lists \"{name}\" more than once",
                template.id
            )));
        }
        let swatch = match template.axis {
            OptionAxis::Color => validate_swatch(option.swatch.as_deref())?,
            OptionAxis::Size => None,
        };
        let draft = OptionDraft {
            name,
            swatch,
            sort_order: option.sort_order.unwrap_or(position as i32),
        };
        let existing = current.iter().find(|o| names_match(o.key_name(), &draft.name));
        if let Some(existing) = existing {
            kept.insert(existing.id());
        }
        upserts.push((existing.map(AxisOption::id), draft));
    }

    let removals = current
        .iter()
        .map(AxisOption::id)
        .filter(|id| !kept.contains(id))
        .collect();

    Ok(AxisPlan { upserts, removals })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::options::SizeOption;

    fn size(id: DbId, label: &str) -> SizeOption {
        SizeOption {
            id,
            sku: "SKU-1".into(),
            label: label.into(),
            sort_order: 0,
        }
    }

    fn template(names: &[&str]) -> Template {
        Template {
            id: "basic".into(),
            name: "Basic".into(),
            axis: OptionAxis::Size,
            options: names
                .iter()
                .map(|n| TemplateOption {
                    name: n.to_string(),
                    swatch: Some("#000".into()),
                    sort_order: None,
                })
                .collect(),
        }
    }

    #[test]
    fn matches_keep_ids_and_unmentioned_are_removed() {
        let current = vec![size(1, "S"), size(2, "M"), size(3, "XXL")];
        let plan = plan_template(&template(&["s", "M", "L"]), &current).unwrap();
        let ids: Vec<_> = plan.upserts.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, [Some(1), Some(2), None]);
        assert_eq!(plan.removals, vec![3]);
        // Template spelling wins and position becomes the sort order.
        assert_eq!(plan.upserts[0].1.name, "s");
        assert_eq!(plan.upserts[2].1.sort_order, 2);
    }

    #[test]
    fn size_templates_drop_swatches() {
        let plan = plan_template(&template(&["S"]), &Vec::<SizeOption>::new()).unwrap();
        assert_eq!(plan.upserts[0].1.swatch, None);
    }

    #[test]
    fn empty_template_rejected() {
        assert_matches!(
            plan_template(&template(&[]), &Vec::<SizeOption>::new()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn duplicate_entries_rejected() {
        assert_matches!(
            plan_template(&template(&["S", " s "]), &Vec::<SizeOption>::new()),
            Err(CoreError::Validation(_))
        );
    }
}
