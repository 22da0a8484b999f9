//! Checklist templates and the answers collected against them.

use std::collections::{BTreeMap, BTreeSet};

use super::error::ValidationError;
use super::types::{ChecklistResponses, ChecklistValue, ProductCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Yes/no check; counts towards classification.
    Flag,
    /// Free-text "other" observation; never classified.
    Text,
}

impl ItemKind {
    fn describe(self) -> &'static str {
        match self {
            ItemKind::Flag => "yes/no",
            ItemKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistCategory {
    pub key: &'static str,
    pub label: &'static str,
    pub items: Vec<ChecklistItem>,
}

impl ChecklistCategory {
    fn item(&self, key: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.key == key)
    }
}

const fn flag(key: &'static str, label: &'static str) -> ChecklistItem {
    ChecklistItem {
        key,
        label,
        kind: ItemKind::Flag,
    }
}

const fn other(key: &'static str) -> ChecklistItem {
    ChecklistItem {
        key,
        label: "Other",
        kind: ItemKind::Text,
    }
}

fn category(
    key: &'static str,
    label: &'static str,
    items: Vec<ChecklistItem>,
) -> ChecklistCategory {
    ChecklistCategory { key, label, items }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistTemplate {
    categories: Vec<ChecklistCategory>,
}

impl ChecklistTemplate {
    pub fn new(categories: Vec<ChecklistCategory>) -> Self {
        Self { categories }
    }

    pub fn for_category(product_category: &ProductCategory) -> Self {
        let exterior = || {
            category(
                "exterior",
                "Exterior",
                vec![
                    flag("no_scratches", "Free of scratches"),
                    flag("no_dents", "Free of dents"),
                    flag("no_cracks", "Free of cracks"),
                    flag("paint_intact", "Paint intact"),
                    flag("clean", "Clean, no stickiness"),
                    other("other_exterior"),
                ],
            )
        };

        let categories = match product_category {
            ProductCategory::Camera => vec![
                exterior(),
                category(
                    "viewfinder",
                    "Viewfinder",
                    vec![
                        flag("no_mold", "No mold"),
                        flag("no_dust", "No dust"),
                        flag("no_cloudiness", "No cloudiness"),
                        flag("no_balsam_separation", "No balsam separation"),
                    ],
                ),
                category(
                    "shutter",
                    "Shutter and film chamber",
                    vec![
                        flag("shutter_fires", "Shutter fires at all speeds"),
                        flag("light_seals_ok", "Light seals intact"),
                        flag("meter_works", "Light meter responds"),
                    ],
                ),
                category(
                    "lens_exterior",
                    "Lens",
                    vec![
                        flag("glass_clear", "Glass clear"),
                        flag("focus_smooth", "Focus smooth"),
                        other("other_lens"),
                    ],
                ),
            ],
            ProductCategory::Lens => vec![
                exterior(),
                category(
                    "optics",
                    "Optics",
                    vec![
                        flag("front_element_clear", "Front element clear"),
                        flag("rear_element_clear", "Rear element clear"),
                        flag("no_fungus", "No fungus or haze"),
                    ],
                ),
                category(
                    "mechanics",
                    "Mechanics",
                    vec![
                        flag("aperture_dry", "Aperture blades dry and snappy"),
                        flag("focus_smooth", "Focus ring smooth"),
                        flag("zoom_smooth", "Zoom ring smooth"),
                    ],
                ),
            ],
            ProductCategory::Watch => vec![
                exterior(),
                category(
                    "movement",
                    "Movement",
                    vec![
                        flag("keeps_time", "Keeps time within tolerance"),
                        flag("crown_works", "Crown winds and sets"),
                    ],
                ),
                category(
                    "band",
                    "Band",
                    vec![flag("band_intact", "Band intact"), other("other_band")],
                ),
            ],
            ProductCategory::Accessory | ProductCategory::Other(_) => vec![
                exterior(),
                category(
                    "function",
                    "Function",
                    vec![
                        flag("works", "Functions as described"),
                        flag("complete", "Accessories complete"),
                    ],
                ),
            ],
        };

        Self::new(categories)
    }

    pub fn categories(&self) -> &[ChecklistCategory] {
        &self.categories
    }

    fn find(&self, category: &str, item: &str) -> Option<&ChecklistItem> {
        self.categories
            .iter()
            .find(|c| c.key == category)
            .and_then(|c| c.item(item))
    }
}

/// Answers plus the set of template categories the worker has been shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistState {
    template: ChecklistTemplate,
    responses: ChecklistResponses,
    visited: BTreeSet<String>,
}

impl ChecklistState {
    pub fn new(template: ChecklistTemplate) -> Self {
        Self {
            template,
            responses: BTreeMap::new(),
            visited: BTreeSet::new(),
        }
    }

    pub fn template(&self) -> &ChecklistTemplate {
        &self.template
    }

    pub fn responses(&self) -> &ChecklistResponses {
        &self.responses
    }

    pub fn set_flag(
        &mut self,
        category: &str,
        item: &str,
        value: bool,
    ) -> Result<(), ValidationError> {
        self.set(category, item, ItemKind::Flag, ChecklistValue::Flag(value))
    }

    pub fn set_text(
        &mut self,
        category: &str,
        item: &str,
        text: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.set(category, item, ItemKind::Text, ChecklistValue::Text(text.into()))
    }

    /// Returns the item to "not yet evaluated".
    pub fn clear(&mut self, category: &str, item: &str) {
        if let Some(items) = self.responses.get_mut(category) {
            items.remove(item);
            if items.is_empty() {
                self.responses.remove(category);
            }
        }
    }

    fn set(
        &mut self,
        category: &str,
        item: &str,
        kind: ItemKind,
        value: ChecklistValue,
    ) -> Result<(), ValidationError> {
        let definition = self.template.find(category, item).ok_or_else(|| {
            ValidationError::UnknownChecklistItem {
                category: category.to_string(),
                item: item.to_string(),
            }
        })?;
        if definition.kind != kind {
            return Err(ValidationError::ChecklistKindMismatch {
                category: category.to_string(),
                item: item.to_string(),
                expected: definition.kind.describe(),
            });
        }

        self.visited.insert(category.to_string());
        self.responses
            .entry(category.to_string())
            .or_default()
            .insert(item.to_string(), value);
        Ok(())
    }

    pub fn visit(&mut self, category: &str) {
        if self.template.categories.iter().any(|c| c.key == category) {
            self.visited.insert(category.to_string());
        }
    }

    pub fn visit_all(&mut self) {
        for category in &self.template.categories {
            self.visited.insert(category.key.to_string());
        }
    }

    pub fn visited(&self) -> impl Iterator<Item = &str> + '_ {
        self.visited.iter().map(String::as_str)
    }

    pub fn unvisited(&self) -> Vec<String> {
        self.template
            .categories
            .iter()
            .filter(|c| !self.visited.contains(c.key))
            .map(|c| c.key.to_string())
            .collect()
    }

    /// Replaces the answers with a checkpoint's. Checkpoint data is taken as-is.
    pub fn restore(&mut self, responses: ChecklistResponses) {
        self.responses = responses;
    }

    /// Every explicitly answered yes/no value across all categories.
    pub fn flags(&self) -> impl Iterator<Item = bool> + '_ {
        self.responses
            .values()
            .flat_map(|items| items.values())
            .filter_map(ChecklistValue::as_flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_checklist() -> ChecklistState {
        ChecklistState::new(ChecklistTemplate::for_category(&ProductCategory::Camera))
    }

    #[test]
    fn test_set_flag_marks_category_visited() {
        let mut checklist = camera_checklist();
        checklist.set_flag("exterior", "no_dents", true).unwrap();

        assert_eq!(
            checklist.responses()["exterior"]["no_dents"],
            ChecklistValue::Flag(true)
        );
        assert!(!checklist.unvisited().contains(&"exterior".to_string()));
        assert!(checklist.unvisited().contains(&"viewfinder".to_string()));
    }

    #[test]
    fn test_rejects_unknown_items_and_kind_mismatch() {
        let mut checklist = camera_checklist();
        assert!(matches!(
            checklist.set_flag("exterior", "teleporter", true),
            Err(ValidationError::UnknownChecklistItem { .. })
        ));
        assert!(matches!(
            checklist.set_flag("exterior", "other_exterior", true),
            Err(ValidationError::ChecklistKindMismatch { expected: "text", .. })
        ));
        assert!(checklist.responses().is_empty());
    }

    #[test]
    fn test_text_items_are_not_flags() {
        let mut checklist = camera_checklist();
        checklist.set_flag("exterior", "clean", false).unwrap();
        checklist
            .set_text("exterior", "other_exterior", "strap lug worn")
            .unwrap();

        let flags: Vec<bool> = checklist.flags().collect();
        assert_eq!(flags, vec![false]);
    }

    #[test]
    fn test_clear_returns_item_to_unevaluated() {
        let mut checklist = camera_checklist();
        checklist.set_flag("shutter", "meter_works", true).unwrap();
        checklist.clear("shutter", "meter_works");
        assert!(checklist.responses().is_empty());
        assert_eq!(checklist.flags().count(), 0);
    }

    #[test]
    fn test_visit_all_covers_template() {
        let mut checklist = camera_checklist();
        checklist.visit("viewfinder");
        checklist.visit("not-a-category");
        assert_eq!(checklist.unvisited().len(), 3);
        checklist.visit_all();
        assert!(checklist.unvisited().is_empty());
    }
}
