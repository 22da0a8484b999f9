use thiserror::Error;

use super::state_machine::StepEvent;
use super::types::{InspectionStep, ProductId};
use crate::backend::{BackendError, BackendOperation};

/// User-fixable input problems. Reported inline, never change session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least {required} photo(s) required before packaging, {uploaded} uploaded")]
    InsufficientPhotos { required: usize, uploaded: usize },

    #[error("required photo slots are empty: {}", .slots.join(", "))]
    UnsatisfiedSlots { slots: Vec<String> },

    #[error("unknown photo slot '{slot_id}'")]
    UnknownSlot { slot_id: String },

    #[error("photo '{photo}' has not been uploaded")]
    UnknownPhoto { photo: String },

    #[error("weight must be recorded before storage")]
    MissingWeight,

    #[error("invalid weight '{input}': {reason}")]
    InvalidWeight { input: String, reason: String },

    #[error("a product label must be generated before storage")]
    MissingLabel,

    #[error("a shelf location code is required")]
    MissingLocation,

    #[error("'{code}' is not a recognised shelf location code (e.g. A-01, STD-A-01, HUM-01)")]
    MalformedLocation { code: String },

    #[error("shelf location '{code}' does not exist")]
    UnknownLocation { code: String },

    #[error("unknown checklist item {category}/{item}")]
    UnknownChecklistItem { category: String, item: String },

    #[error("checklist item {category}/{item} expects a {expected} answer")]
    ChecklistKindMismatch {
        category: String,
        item: String,
        expected: &'static str,
    },

    #[error("checklist categories not yet visited: {}", .categories.join(", "))]
    UnvisitedChecklist { categories: Vec<String> },
}

/// Errors surfaced by the inspection workflow.
#[derive(Debug, Error)]
pub enum InspectionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{operation} failed: {source}")]
    Transport {
        operation: BackendOperation,
        #[source]
        source: BackendError,
    },

    #[error("shelf location {location} has no remaining capacity, choose another shelf")]
    Capacity { location: String },

    #[error("cannot {event} at step {step}")]
    InvalidTransition {
        step: InspectionStep,
        event: StepEvent,
    },

    #[error("inspection session for {product_id} is already closed")]
    SessionClosed { product_id: ProductId },
}

impl InspectionError {
    pub(crate) fn transport(operation: BackendOperation, source: BackendError) -> Self {
        InspectionError::Transport { operation, source }
    }

    /// Only transport failures are worth repeating unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InspectionError::Transport { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, InspectionError::Validation(_))
    }
}
