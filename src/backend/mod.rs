//! Gateway to the services the inspection workflow depends on.
//!
//! The workflow never talks to the catalog, progress store, photography storage, label
//! printer or shelf registry directly; it goes through [`InspectionBackend`]. Two
//! implementations ship with the crate: [`HttpBackend`] for the dashboard API and
//! [`InMemoryBackend`] for tests and embedding.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

use crate::observability::{backend_metrics, OperationTimer};

use crate::inspection::types::{
    FinalizeRequest, LabelArtifact, PhotographyCommit, ProductId, ProductSummary,
    ProgressRecord, StorageLocation,
};

pub use http::HttpBackend;
pub use memory::{BackendCall, InMemoryBackend};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("location {location_id} is at capacity")]
    CapacityExceeded { location_id: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend unavailable: {reason}")]
    Unavailable { reason: String },
}

impl BackendError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        BackendError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound { .. })
    }
}

/// Names the gateway call that failed, for error messages and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    FetchProduct,
    LoadProgress,
    SaveProgress,
    CommitPhotography,
    GenerateLabel,
    ValidateLocation,
    FinalizeInspection,
}

impl BackendOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendOperation::FetchProduct => "fetch_product",
            BackendOperation::LoadProgress => "load_progress",
            BackendOperation::SaveProgress => "save_progress",
            BackendOperation::CommitPhotography => "commit_photography",
            BackendOperation::GenerateLabel => "generate_label",
            BackendOperation::ValidateLocation => "validate_location",
            BackendOperation::FinalizeInspection => "finalize_inspection",
        }
    }
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response contract with the dashboard backend.
///
/// `NotFound` is a normal answer for `load_progress` (no checkpoint yet) and for
/// `validate_location` (unknown shelf). `finalize_inspection` must treat the capacity
/// check and the reservation as one admission decision.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InspectionBackend: Send + Sync {
    async fn fetch_product(&self, product_id: &ProductId) -> Result<ProductSummary, BackendError>;

    async fn load_progress(&self, product_id: &ProductId) -> Result<ProgressRecord, BackendError>;

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), BackendError>;

    async fn commit_photography(&self, commit: &PhotographyCommit) -> Result<(), BackendError>;

    async fn generate_label(
        &self,
        product_id: &ProductId,
        tracking_code: &str,
        notes: &str,
    ) -> Result<LabelArtifact, BackendError>;

    async fn validate_location(&self, code: &str) -> Result<StorageLocation, BackendError>;

    async fn finalize_inspection(&self, request: &FinalizeRequest) -> Result<(), BackendError>;
}

/// Runs one backend call with request metrics and timing.
pub(crate) async fn observe<T, F>(operation: BackendOperation, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    let metrics = backend_metrics();
    let timer = OperationTimer::new(operation.as_str());
    metrics.record_request();
    let result = call.await;
    timer.finish();
    if let Err(e) = &result {
        metrics.record_error(e);
        debug!(operation = %operation, error = %e, "Backend call failed");
    }
    result
}
