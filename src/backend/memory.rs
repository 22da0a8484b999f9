// In-process backend - no network, used by tests and embedded setups

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{BackendError, BackendOperation, InspectionBackend};
use crate::inspection::types::{
    FinalizeRequest, LabelArtifact, PhotographyCommit, ProductId, ProductSummary,
    ProgressRecord, StorageLocation,
};

/// One call observed by the in-memory backend, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    FetchProduct(ProductId),
    LoadProgress(ProductId),
    SaveProgress(ProgressRecord),
    CommitPhotography(PhotographyCommit),
    GenerateLabel {
        product_id: ProductId,
        tracking_code: String,
    },
    ValidateLocation(String),
    FinalizeInspection(FinalizeRequest),
}

impl BackendCall {
    pub fn operation(&self) -> BackendOperation {
        match self {
            BackendCall::FetchProduct(_) => BackendOperation::FetchProduct,
            BackendCall::LoadProgress(_) => BackendOperation::LoadProgress,
            BackendCall::SaveProgress(_) => BackendOperation::SaveProgress,
            BackendCall::CommitPhotography(_) => BackendOperation::CommitPhotography,
            BackendCall::GenerateLabel { .. } => BackendOperation::GenerateLabel,
            BackendCall::ValidateLocation(_) => BackendOperation::ValidateLocation,
            BackendCall::FinalizeInspection(_) => BackendOperation::FinalizeInspection,
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    products: HashMap<ProductId, ProductSummary>,
    progress: HashMap<ProductId, ProgressRecord>,
    photography: HashMap<ProductId, PhotographyCommit>,
    locations: HashMap<String, StorageLocation>,
    finalized: HashMap<ProductId, FinalizeRequest>,
    failing: HashSet<BackendOperation>,
    calls: Vec<BackendCall>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: Mutex<Store>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_product(&self, product: ProductSummary) {
        self.store().products.insert(product.id.clone(), product);
    }

    pub fn add_location(&self, location: StorageLocation) {
        self.store()
            .locations
            .insert(location.code.to_ascii_uppercase(), location);
    }

    pub fn put_progress(&self, record: ProgressRecord) {
        self.store()
            .progress
            .insert(record.product_id.clone(), record);
    }

    /// Makes every subsequent call of `operation` fail as unavailable.
    pub fn fail_on(&self, operation: BackendOperation) {
        self.store().failing.insert(operation);
    }

    pub fn recover(&self, operation: BackendOperation) {
        self.store().failing.remove(&operation);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.store().calls.clone()
    }

    pub fn operations(&self) -> Vec<BackendOperation> {
        self.store().calls.iter().map(BackendCall::operation).collect()
    }

    pub fn clear_calls(&self) {
        self.store().calls.clear();
    }

    pub fn product(&self, product_id: &ProductId) -> Option<ProductSummary> {
        self.store().products.get(product_id).cloned()
    }

    pub fn progress(&self, product_id: &ProductId) -> Option<ProgressRecord> {
        self.store().progress.get(product_id).cloned()
    }

    pub fn photography(&self, product_id: &ProductId) -> Option<PhotographyCommit> {
        self.store().photography.get(product_id).cloned()
    }

    pub fn finalized(&self, product_id: &ProductId) -> Option<FinalizeRequest> {
        self.store().finalized.get(product_id).cloned()
    }

    pub fn location(&self, code: &str) -> Option<StorageLocation> {
        self.store().locations.get(&code.to_ascii_uppercase()).cloned()
    }
}

impl Store {
    /// Records the call, then fails it if the operation was set to fail.
    fn enter(&mut self, call: BackendCall) -> Result<(), BackendError> {
        let operation = call.operation();
        self.calls.push(call);
        if self.failing.contains(&operation) {
            return Err(BackendError::Unavailable {
                reason: format!("{operation} is failing"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl InspectionBackend for InMemoryBackend {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<ProductSummary, BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::FetchProduct(product_id.clone()))?;
        store
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("product {product_id}")))
    }

    async fn load_progress(&self, product_id: &ProductId) -> Result<ProgressRecord, BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::LoadProgress(product_id.clone()))?;
        store
            .progress
            .get(product_id)
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("progress for {product_id}")))
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::SaveProgress(record.clone()))?;
        store
            .progress
            .insert(record.product_id.clone(), record.clone());
        Ok(())
    }

    async fn commit_photography(&self, commit: &PhotographyCommit) -> Result<(), BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::CommitPhotography(commit.clone()))?;
        store
            .photography
            .insert(commit.product_id.clone(), commit.clone());
        Ok(())
    }

    async fn generate_label(
        &self,
        product_id: &ProductId,
        tracking_code: &str,
        _notes: &str,
    ) -> Result<LabelArtifact, BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::GenerateLabel {
            product_id: product_id.clone(),
            tracking_code: tracking_code.to_string(),
        })?;
        Ok(LabelArtifact {
            tracking_artifact_ref: format!("labels/{product_id}/{tracking_code}"),
            file_name: Some(format!("label-{product_id}.pdf")),
        })
    }

    async fn validate_location(&self, code: &str) -> Result<StorageLocation, BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::ValidateLocation(code.to_string()))?;
        store
            .locations
            .get(&code.to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| BackendError::not_found(format!("location {code}")))
    }

    async fn finalize_inspection(&self, request: &FinalizeRequest) -> Result<(), BackendError> {
        let mut store = self.store();
        store.enter(BackendCall::FinalizeInspection(request.clone()))?;

        // Capacity check and reservation happen under the same lock.
        let location = store
            .locations
            .values_mut()
            .find(|location| location.id == request.location_id)
            .ok_or_else(|| BackendError::not_found(format!("location {}", request.location_id)))?;
        if !location.has_capacity() {
            return Err(BackendError::CapacityExceeded {
                location_id: request.location_id.clone(),
            });
        }
        location.current_count += 1;

        if let Some(product) = store.products.get_mut(&request.product_id) {
            product.status = request.status.as_str().to_string();
        }
        store.progress.remove(&request.product_id);
        store
            .finalized
            .insert(request.product_id.clone(), request.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::types::{InspectionStep, LifecycleStatus};

    fn shelf(id: &str, code: &str, capacity: u32, current_count: u32) -> StorageLocation {
        StorageLocation {
            id: id.to_string(),
            code: code.to_string(),
            name: None,
            zone: None,
            capacity,
            current_count,
        }
    }

    fn finalize(product: &str, location_id: &str) -> FinalizeRequest {
        FinalizeRequest {
            product_id: ProductId::new(product),
            notes: String::new(),
            status: LifecycleStatus::ReadyForStorage,
            location_id: location_id.to_string(),
            skipped_photography: false,
        }
    }

    #[tokio::test]
    async fn test_missing_progress_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend
            .load_progress(&ProductId::new("P-404"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.operations(), vec![BackendOperation::LoadProgress]);
    }

    #[tokio::test]
    async fn test_finalize_reserves_last_slot_once() {
        let backend = InMemoryBackend::new();
        backend.add_location(shelf("loc-1", "A-01", 1, 0));

        backend
            .finalize_inspection(&finalize("P-1", "loc-1"))
            .await
            .unwrap();
        let err = backend
            .finalize_inspection(&finalize("P-2", "loc-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::CapacityExceeded { .. }));
        assert_eq!(backend.location("a-01").unwrap().current_count, 1);
        assert!(backend.finalized(&ProductId::new("P-2")).is_none());
    }

    #[tokio::test]
    async fn test_failure_injection_still_records_call() {
        let backend = InMemoryBackend::new();
        backend.fail_on(BackendOperation::SaveProgress);
        let record = ProgressRecord {
            product_id: ProductId::new("P-1"),
            current_step: InspectionStep::Checklist,
            checklist: None,
            visited_categories: Vec::new(),
            photos: Vec::new(),
            photo_slots: Vec::new(),
            notes: String::new(),
            weight: None,
            status: "paused".to_string(),
            last_updated: None,
        };

        assert!(backend.save_progress(&record).await.is_err());
        assert!(backend.progress(&record.product_id).is_none());

        backend.recover(BackendOperation::SaveProgress);
        backend.save_progress(&record).await.unwrap();
        assert_eq!(backend.progress(&record.product_id), Some(record));
        assert_eq!(backend.calls().len(), 2);
    }
}
