// Fulfillment Inspection - warehouse inspection workflow core
// This exposes the core components for testing and integration

pub mod backend;
pub mod config;
pub mod inspection;
pub mod observability;
pub mod telemetry;

// Re-export key types for easy access
pub use backend::{BackendError, BackendOperation, HttpBackend, InMemoryBackend, InspectionBackend};
pub use config::InspectionConfig;
pub use inspection::{
    derive_tracking_number, InspectionError, InspectionOutcome, InspectionSession,
    InspectionStep, InspectionWorkflow, PhotoSlotAssigner, SessionMode, ValidationError,
    Verdict, WorkflowRules,
};
pub use observability::{backend_metrics, BackendMetrics, OperationTimer};
pub use telemetry::{create_inspection_span, generate_correlation_id, init_telemetry};
