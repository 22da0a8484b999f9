//! In-memory state of one physical item's inspection.

use chrono::{DateTime, Utc};

use super::checklist::{ChecklistState, ChecklistTemplate};
use super::location::LocationCode;
use super::photo_slots::PhotoSlotAssigner;
use super::types::{
    InspectionStep, LabelArtifact, PhotoRef, PhotographyCommit, PhotographyPolicy, ProductId,
    ProductSummary, ProgressRecord, ProgressStatus, Weight,
};

/// Step a session without a checkpoint starts at, from the catalog status.
pub fn fallback_step(product_status: &str) -> InspectionStep {
    match product_status.trim().to_ascii_lowercase().as_str() {
        "inspecting" | "photography" => InspectionStep::Photography,
        "packing" | "packed" | "labeled" => InspectionStep::Packaging,
        "storage" | "completed" | "ordered" | "shipping" | "sold" | "returned" => {
            InspectionStep::ShelfStorage
        }
        _ => InspectionStep::Checklist,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectionSession {
    pub(crate) product: ProductSummary,
    pub(crate) current_step: InspectionStep,
    pub(crate) policy: PhotographyPolicy,
    pub(crate) checklist: ChecklistState,
    pub(crate) photos: PhotoSlotAssigner,
    pub(crate) notes: String,
    pub(crate) weight: Option<Weight>,
    pub(crate) label: Option<LabelArtifact>,
    pub(crate) tracking_code: Option<String>,
    pub(crate) location_code: Option<LocationCode>,
    pub(crate) photography_committed: bool,
    pub(crate) last_updated: Option<DateTime<Utc>>,
}

impl InspectionSession {
    pub fn new(product: ProductSummary, policy: PhotographyPolicy, max_photos: usize) -> Self {
        let checklist = ChecklistState::new(ChecklistTemplate::for_category(&product.category));
        let mut photos = PhotoSlotAssigner::for_product(
            &product.category,
            &product.special_photography_requests,
            max_photos,
        );
        if policy == PhotographyPolicy::NotRequired {
            photos.waive_required();
        }

        Self {
            product,
            current_step: InspectionStep::Checklist,
            policy,
            checklist,
            photos,
            notes: String::new(),
            weight: None,
            label: None,
            tracking_code: None,
            location_code: None,
            photography_committed: false,
            last_updated: None,
        }
    }

    /// A fresh session positioned at `step`. Steps already behind it count as done.
    pub fn starting_at(
        product: ProductSummary,
        policy: PhotographyPolicy,
        max_photos: usize,
        step: InspectionStep,
    ) -> Self {
        let mut session = Self::new(product, policy, max_photos);
        session.current_step = step;
        session.settle_passed_steps();
        session
    }

    /// Rehydrates a session from its last checkpoint.
    pub fn restore(
        product: ProductSummary,
        policy: PhotographyPolicy,
        max_photos: usize,
        record: ProgressRecord,
    ) -> Self {
        let mut session = Self::new(product, policy, max_photos);
        session.current_step = record.current_step;

        // Checkpoints written before visits were recorded only imply them through answers.
        if let Some(responses) = record.checklist {
            let answered: Vec<String> = responses.keys().cloned().collect();
            session.checklist.restore(responses);
            for category in &answered {
                session.checklist.visit(category);
            }
        }
        for category in &record.visited_categories {
            session.checklist.visit(category);
        }
        session.photos.restore(record.photos, record.photo_slots);
        if policy == PhotographyPolicy::NotRequired {
            session.photos.waive_required();
        }
        session.notes = record.notes;
        session.weight = record.weight;
        session.last_updated = record.last_updated;
        session.settle_passed_steps();
        session
    }

    fn settle_passed_steps(&mut self) {
        if self.current_step > InspectionStep::Checklist {
            self.checklist.visit_all();
        }
        if self.current_step > InspectionStep::Photography {
            self.photography_committed = true;
        }
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    pub fn product(&self) -> &ProductSummary {
        &self.product
    }

    pub fn current_step(&self) -> InspectionStep {
        self.current_step
    }

    pub fn policy(&self) -> PhotographyPolicy {
        self.policy
    }

    pub fn checklist(&self) -> &ChecklistState {
        &self.checklist
    }

    pub fn photos(&self) -> &PhotoSlotAssigner {
        &self.photos
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn weight(&self) -> Option<Weight> {
        self.weight
    }

    pub fn label(&self) -> Option<&LabelArtifact> {
        self.label.as_ref()
    }

    pub fn tracking_code(&self) -> Option<&str> {
        self.tracking_code.as_deref()
    }

    pub fn location_code(&self) -> Option<&LocationCode> {
        self.location_code.as_ref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Nothing was uploaded, so the product leaves inspection without photos.
    pub fn photography_skipped(&self) -> bool {
        self.photos.photo_count() == 0
    }

    pub fn photography_done(&self) -> bool {
        self.photography_committed && !self.photography_skipped()
    }

    /// Checkpoint of the current state, recorded at `step`.
    pub fn to_record(
        &self,
        step: InspectionStep,
        status: ProgressStatus,
        now: DateTime<Utc>,
    ) -> ProgressRecord {
        ProgressRecord {
            product_id: self.product.id.clone(),
            current_step: step,
            checklist: Some(self.checklist.responses().clone()),
            visited_categories: self.checklist.visited().map(str::to_string).collect(),
            photos: self.photos.photos().to_vec(),
            photo_slots: self.photos.slots().to_vec(),
            notes: self.notes.clone(),
            weight: self.weight,
            status: status.as_str().to_string(),
            last_updated: Some(now),
        }
    }

    pub fn photography_commit(&self) -> PhotographyCommit {
        PhotographyCommit {
            product_id: self.product.id.clone(),
            photos: self.photos.photos().to_vec(),
            photo_slots: self.photos.slots().to_vec(),
            notes: self.notes.clone(),
        }
    }

    pub fn unassigned_photos(&self) -> Vec<&PhotoRef> {
        self.photos.unassigned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::photo_slots::PhotoSlot;
    use crate::inspection::types::{ChecklistValue, ProductCategory};
    use std::collections::BTreeMap;

    fn camera() -> ProductSummary {
        ProductSummary {
            id: ProductId::new("P-100"),
            name: "Nikon F3".to_string(),
            sku: "DP-202401151030-7123-9".to_string(),
            category: ProductCategory::Camera,
            status: "pending_inspection".to_string(),
            special_photography_requests: vec!["serial_number".to_string()],
        }
    }

    #[test]
    fn test_fallback_step_table() {
        assert_eq!(fallback_step("pending_inspection"), InspectionStep::Checklist);
        assert_eq!(fallback_step("inspection"), InspectionStep::Checklist);
        assert_eq!(fallback_step("photography"), InspectionStep::Photography);
        assert_eq!(fallback_step("labeled"), InspectionStep::Packaging);
        assert_eq!(fallback_step("Storage"), InspectionStep::ShelfStorage);
        assert_eq!(fallback_step("sold"), InspectionStep::ShelfStorage);
        assert_eq!(fallback_step("mystery"), InspectionStep::Checklist);
    }

    #[test]
    fn test_new_session_has_special_slot_and_required_front() {
        let session = InspectionSession::new(camera(), PhotographyPolicy::Required, 20);
        let slots = session.photos().slots();
        assert!(slots.iter().any(|s| s.id == "front" && s.required));
        assert!(slots
            .iter()
            .any(|s| s.id == "special_serial_number" && s.required));
        assert!(session.photography_skipped());
        assert!(!session.photography_done());
    }

    #[test]
    fn test_not_required_policy_waives_slots() {
        let session = InspectionSession::new(camera(), PhotographyPolicy::NotRequired, 20);
        assert!(session.photos().is_satisfied());
    }

    #[test]
    fn test_restore_from_checkpoint() {
        let mut checklist = BTreeMap::new();
        checklist.insert(
            "exterior".to_string(),
            BTreeMap::from([("clean".to_string(), ChecklistValue::Flag(true))]),
        );
        let mut front = PhotoSlot::new("front", "Front", true);
        front.photos.push(PhotoRef::new("img-1"));
        let record = ProgressRecord {
            product_id: ProductId::new("P-100"),
            current_step: InspectionStep::Packaging,
            checklist: Some(checklist),
            visited_categories: Vec::new(),
            photos: vec![PhotoRef::new("img-1"), PhotoRef::new("img-2")],
            photo_slots: vec![front],
            notes: "box dented".to_string(),
            weight: Some("1.2".parse().unwrap()),
            status: "paused".to_string(),
            last_updated: None,
        };

        let session =
            InspectionSession::restore(camera(), PhotographyPolicy::Required, 20, record);

        assert_eq!(session.current_step(), InspectionStep::Packaging);
        assert!(session.checklist().unvisited().is_empty());
        assert_eq!(
            session.photos().slot_of(&PhotoRef::new("img-1")),
            Some("front")
        );
        assert_eq!(session.unassigned_photos(), vec![&PhotoRef::new("img-2")]);
        assert_eq!(session.notes(), "box dented");
        assert!(session.photography_done());
    }

    #[test]
    fn test_record_carries_requested_step_and_status() {
        let session = InspectionSession::new(camera(), PhotographyPolicy::Required, 20);
        let now = Utc::now();
        let record = session.to_record(InspectionStep::Photography, ProgressStatus::Inspecting, now);
        assert_eq!(record.current_step, InspectionStep::Photography);
        assert_eq!(record.status, "inspecting");
        assert_eq!(record.last_updated, Some(now));
        assert_eq!(record.photo_slots.len(), session.photos().slots().len());
    }

    #[test]
    fn test_visited_categories_survive_checkpoint() {
        let mut session = InspectionSession::new(camera(), PhotographyPolicy::Required, 20);
        session.checklist.visit("viewfinder");
        let record = session.to_record(InspectionStep::Checklist, ProgressStatus::Paused, Utc::now());
        assert_eq!(record.visited_categories, vec!["viewfinder".to_string()]);

        let restored =
            InspectionSession::restore(camera(), PhotographyPolicy::Required, 20, record);
        assert_eq!(restored.checklist(), session.checklist());
    }
}
