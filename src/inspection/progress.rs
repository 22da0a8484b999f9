//! Checkpoint and resume of inspection sessions against the remote progress store.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::InspectionError;
use super::session::InspectionSession;
use super::types::{InspectionStep, ProductId, ProgressRecord, ProgressStatus};
use crate::backend::{observe, BackendError, BackendOperation, InspectionBackend};
use crate::observability::backend_metrics;

/// What the progress store knows about a product.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedProgress {
    Resumed(ProgressRecord),
    /// No checkpoint exists; this is the product's first inspection pass.
    Fresh,
}

#[derive(Clone)]
pub struct ProgressStore {
    backend: Arc<dyn InspectionBackend>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore").finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(backend: Arc<dyn InspectionBackend>) -> Self {
        Self { backend }
    }

    /// Fetches the last checkpoint. A missing checkpoint is `Fresh`, never an error.
    pub async fn load(&self, product_id: &ProductId) -> Result<LoadedProgress, InspectionError> {
        match observe(
            BackendOperation::LoadProgress,
            self.backend.load_progress(product_id),
        )
        .await
        {
            Ok(record) => {
                info!(
                    product_id = %product_id,
                    step = %record.current_step,
                    "Resuming inspection from checkpoint"
                );
                Ok(LoadedProgress::Resumed(record))
            }
            Err(BackendError::NotFound { .. }) => {
                debug!(product_id = %product_id, "No inspection checkpoint found");
                Ok(LoadedProgress::Fresh)
            }
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Failed to load inspection progress");
                Err(InspectionError::transport(BackendOperation::LoadProgress, e))
            }
        }
    }

    /// Persists the session as of `step`. The session itself is left untouched; the
    /// caller records the returned timestamp once it commits to the new state.
    pub async fn save(
        &self,
        session: &InspectionSession,
        step: InspectionStep,
        status: ProgressStatus,
    ) -> Result<DateTime<Utc>, InspectionError> {
        let now = Utc::now();
        let record = session.to_record(step, status, now);

        observe(
            BackendOperation::SaveProgress,
            self.backend.save_progress(&record),
        )
        .await
        .map_err(|e| {
            warn!(
                product_id = %record.product_id,
                step = %step,
                error = %e,
                "Failed to save inspection progress"
            );
            InspectionError::transport(BackendOperation::SaveProgress, e)
        })?;

        backend_metrics().record_persist();
        debug!(
            product_id = %record.product_id,
            step = %step,
            status = status.as_str(),
            "Inspection progress saved"
        );
        Ok(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::inspection::types::{PhotographyPolicy, ProductCategory, ProductSummary};

    fn lens() -> ProductSummary {
        ProductSummary {
            id: ProductId::new("P-200"),
            name: "Summicron 50".to_string(),
            sku: "DP-202402011200-5555-1".to_string(),
            category: ProductCategory::Lens,
            status: "inspection".to_string(),
            special_photography_requests: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_checkpoint_is_fresh() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = ProgressStore::new(backend);
        assert_eq!(
            store.load(&ProductId::new("P-200")).await.unwrap(),
            LoadedProgress::Fresh
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_from_missing() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_on(BackendOperation::LoadProgress);
        let store = ProgressStore::new(backend);

        let err = store.load(&ProductId::new("P-200")).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let backend = Arc::new(InMemoryBackend::new());
        let store = ProgressStore::new(backend.clone());
        let session = InspectionSession::new(lens(), PhotographyPolicy::Required, 20);

        let saved_at = store
            .save(&session, InspectionStep::Checklist, ProgressStatus::Paused)
            .await
            .unwrap();

        match store.load(session.product_id()).await.unwrap() {
            LoadedProgress::Resumed(record) => {
                assert_eq!(record.status, "paused");
                assert_eq!(record.last_updated, Some(saved_at));
            }
            LoadedProgress::Fresh => panic!("checkpoint should exist"),
        }
    }

    #[tokio::test]
    async fn test_failed_save_is_retryable() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.fail_on(BackendOperation::SaveProgress);
        let store = ProgressStore::new(backend.clone());
        let session = InspectionSession::new(lens(), PhotographyPolicy::Required, 20);

        let err = store
            .save(&session, InspectionStep::Checklist, ProgressStatus::Inspecting)
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        backend.recover(BackendOperation::SaveProgress);
        assert!(store
            .save(&session, InspectionStep::Checklist, ProgressStatus::Inspecting)
            .await
            .is_ok());
    }
}
