use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::ValidationError;
use super::photo_slots::PhotoSlot;

/// Opaque product identifier, immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to an uploaded image payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(String);

impl PhotoRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

/// Inspection steps, serialized as their step number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum InspectionStep {
    #[default]
    Checklist = 1,
    Photography = 2,
    Packaging = 3,
    ShelfStorage = 4,
}

impl InspectionStep {
    pub const ALL: [InspectionStep; 4] = [
        InspectionStep::Checklist,
        InspectionStep::Photography,
        InspectionStep::Packaging,
        InspectionStep::ShelfStorage,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Self> {
        match self {
            InspectionStep::Checklist => Some(InspectionStep::Photography),
            InspectionStep::Photography => Some(InspectionStep::Packaging),
            InspectionStep::Packaging => Some(InspectionStep::ShelfStorage),
            InspectionStep::ShelfStorage => None,
        }
    }

    pub fn previous(self) -> Option<Self> {
        match self {
            InspectionStep::Checklist => None,
            InspectionStep::Photography => Some(InspectionStep::Checklist),
            InspectionStep::Packaging => Some(InspectionStep::Photography),
            InspectionStep::ShelfStorage => Some(InspectionStep::Packaging),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InspectionStep::Checklist => "checklist",
            InspectionStep::Photography => "photography",
            InspectionStep::Packaging => "packaging & label",
            InspectionStep::ShelfStorage => "shelf storage",
        }
    }
}

impl fmt::Display for InspectionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

impl From<InspectionStep> for u8 {
    fn from(step: InspectionStep) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for InspectionStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        InspectionStep::ALL
            .into_iter()
            .find(|step| step.number() == value)
            .ok_or_else(|| format!("inspection step must be between 1 and 4, got {value}"))
    }
}

/// A single checklist answer. Text-only items never count towards classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChecklistValue {
    Flag(bool),
    Text(String),
}

impl ChecklistValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            ChecklistValue::Flag(value) => Some(*value),
            ChecklistValue::Text(_) => None,
        }
    }
}

/// category -> item -> value. A missing key means "not yet evaluated".
pub type ChecklistResponses = BTreeMap<String, BTreeMap<String, ChecklistValue>>;

/// Whether photos are needed before the item may leave the photography step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotographyPolicy {
    Required,
    NotRequired,
    PhotographyOnly,
}

impl PhotographyPolicy {
    pub fn requires_photos(self) -> bool {
        matches!(self, PhotographyPolicy::Required)
    }
}

/// Product categories known to the warehouse. Anything else is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductCategory {
    Camera,
    Lens,
    Watch,
    Accessory,
    Other(String),
}

impl ProductCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ProductCategory::Camera => "camera",
            ProductCategory::Lens => "lens",
            ProductCategory::Watch => "watch",
            ProductCategory::Accessory => "accessory",
            ProductCategory::Other(name) => name,
        }
    }
}

impl From<String> for ProductCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "camera" | "camera_body" => ProductCategory::Camera,
            "lens" => ProductCategory::Lens,
            "watch" => ProductCategory::Watch,
            "accessory" => ProductCategory::Accessory,
            _ => ProductCategory::Other(value),
        }
    }
}

impl From<ProductCategory> for String {
    fn from(category: ProductCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package weight in kilograms, positive, at most one fractional digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Weight(Decimal);

impl Weight {
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        let input = value.to_string();
        if value <= Decimal::ZERO {
            return Err(ValidationError::InvalidWeight {
                input,
                reason: "weight must be greater than zero".to_string(),
            });
        }
        if value.normalize().scale() > 1 {
            return Err(ValidationError::InvalidWeight {
                input,
                reason: "weight is recorded with one decimal place".to_string(),
            });
        }
        let mut scaled = value;
        scaled.rescale(1);
        Ok(Self(scaled))
    }

    pub fn kilograms(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Weight {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed).map_err(|e| ValidationError::InvalidWeight {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        Weight::new(value)
    }
}

impl TryFrom<Decimal> for Weight {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Weight::new(value)
    }
}

impl From<Weight> for Decimal {
    fn from(weight: Weight) -> Self {
        weight.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kg", self.0)
    }
}

/// Lifecycle status written by the terminal inspection update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStatus {
    ReadyForStorage,
    AwaitingPhotography,
    NeedsReview,
    OnHold,
}

impl LifecycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::ReadyForStorage => "ready-for-storage",
            LifecycleStatus::AwaitingPhotography => "awaiting-photography",
            LifecycleStatus::NeedsReview => "needs-review",
            LifecycleStatus::OnHold => "on-hold",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status carried on a progress checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Inspecting,
    Paused,
}

impl ProgressStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Inspecting => "inspecting",
            ProgressStatus::Paused => "paused",
        }
    }
}

/// Product record as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub category: ProductCategory,
    pub status: String,
    #[serde(default)]
    pub special_photography_requests: Vec<String>,
}

/// Shelf location as returned by the location API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    pub capacity: u32,
    pub current_count: u32,
}

impl StorageLocation {
    pub fn has_capacity(&self) -> bool {
        self.current_count < self.capacity
    }
}

/// Artifact produced by the label API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelArtifact {
    pub tracking_artifact_ref: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Wire form of an inspection checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub product_id: ProductId,
    pub current_step: InspectionStep,
    #[serde(default)]
    pub checklist: Option<ChecklistResponses>,
    #[serde(default)]
    pub visited_categories: Vec<String>,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    #[serde(default)]
    pub photo_slots: Vec<PhotoSlot>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub weight: Option<Weight>,
    #[serde(default = "default_progress_status")]
    pub status: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

fn default_progress_status() -> String {
    ProgressStatus::Inspecting.as_str().to_string()
}

/// Payload of the photography commit issued when leaving the photography step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotographyCommit {
    pub product_id: ProductId,
    pub photos: Vec<PhotoRef>,
    pub photo_slots: Vec<PhotoSlot>,
    pub notes: String,
}

/// Payload of the single terminal update that sets the product's new status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub product_id: ProductId,
    #[serde(rename = "inspectionNotes")]
    pub notes: String,
    pub status: LifecycleStatus,
    pub location_id: String,
    #[serde(rename = "skipPhotography")]
    pub skipped_photography: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_serializes_as_number() {
        let value = serde_json::to_value(InspectionStep::Packaging).unwrap();
        assert_eq!(value, json!(3));

        let step: InspectionStep = serde_json::from_value(json!(4)).unwrap();
        assert_eq!(step, InspectionStep::ShelfStorage);

        assert!(serde_json::from_value::<InspectionStep>(json!(5)).is_err());
        assert!(serde_json::from_value::<InspectionStep>(json!(0)).is_err());
    }

    #[test]
    fn test_step_navigation() {
        assert_eq!(InspectionStep::Checklist.previous(), None);
        assert_eq!(InspectionStep::ShelfStorage.next(), None);
        assert_eq!(
            InspectionStep::Photography.next(),
            Some(InspectionStep::Packaging)
        );
        assert_eq!(
            InspectionStep::Packaging.previous(),
            Some(InspectionStep::Photography)
        );
    }

    #[test]
    fn test_checklist_value_untagged() {
        let flag: ChecklistValue = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(flag, ChecklistValue::Flag(true));
        let text: ChecklistValue = serde_json::from_value(json!("loose strap")).unwrap();
        assert_eq!(text.as_flag(), None);
    }

    #[test]
    fn test_weight_parsing() {
        let weight: Weight = "1.5".parse().unwrap();
        assert_eq!(weight.kilograms().to_string(), "1.5");

        let whole: Weight = "2".parse().unwrap();
        assert_eq!(whole.kilograms().to_string(), "2.0");

        let trailing_zero: Weight = "0.80".parse().unwrap();
        assert_eq!(trailing_zero.kilograms().to_string(), "0.8");

        assert!("0".parse::<Weight>().is_err());
        assert!("-1.2".parse::<Weight>().is_err());
        assert!("1.25".parse::<Weight>().is_err());
        assert!("heavy".parse::<Weight>().is_err());
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            ProductCategory::from("camera_body".to_string()),
            ProductCategory::Camera
        );
        assert_eq!(
            ProductCategory::from("Lens".to_string()),
            ProductCategory::Lens
        );
        assert_eq!(
            ProductCategory::from("drone".to_string()),
            ProductCategory::Other("drone".to_string())
        );
    }

    #[test]
    fn test_finalize_request_wire_names() {
        let request = FinalizeRequest {
            product_id: ProductId::new("p-1"),
            notes: "minor scuffs".to_string(),
            status: LifecycleStatus::NeedsReview,
            location_id: "loc-7".to_string(),
            skipped_photography: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["productId"], "p-1");
        assert_eq!(value["inspectionNotes"], "minor scuffs");
        assert_eq!(value["status"], "needs-review");
        assert_eq!(value["locationId"], "loc-7");
        assert_eq!(value["skipPhotography"], false);
    }

    #[test]
    fn test_location_capacity() {
        let mut location = StorageLocation {
            id: "loc-1".to_string(),
            code: "STD-A-01".to_string(),
            name: None,
            zone: Some("A".to_string()),
            capacity: 2,
            current_count: 1,
        };
        assert!(location.has_capacity());
        location.current_count = 2;
        assert!(!location.has_capacity());
    }
}
