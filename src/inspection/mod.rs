// Physical inspection workflow: checklist, photography, packaging, shelf storage

pub mod checklist;
pub mod classifier;
pub mod error;
pub mod location;
pub mod photo_slots;
pub mod progress;
pub mod session;
pub mod state_machine;
pub mod tracking;
pub mod types;
pub mod workflow;

pub use checklist::{ChecklistState, ChecklistTemplate, ItemKind};
pub use classifier::{classify, classify_checklist, resulting_status, Classification, Verdict};
pub use error::{InspectionError, ValidationError};
pub use location::LocationCode;
pub use photo_slots::{PhotoSlot, PhotoSlotAssigner, UploadOutcome};
pub use progress::{LoadedProgress, ProgressStore};
pub use session::{fallback_step, InspectionSession};
pub use state_machine::{InspectionStepMachine, StepEvent, StepPhase};
pub use tracking::{derive_tracking_number, TRACKING_SENTINEL};
pub use types::*;
pub use workflow::{InspectionOutcome, InspectionWorkflow, SessionMode, WorkflowRules};
