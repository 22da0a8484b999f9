//! Guarded, persisted walk through the inspection steps.
//!
//! [`InspectionWorkflow`] owns one session. Every operation takes `&mut self`, so a
//! session never has two persists in flight. Guards run before any I/O; I/O runs
//! before the step machine moves; a failure at any point leaves the step unchanged.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

use super::classifier::{classify_checklist, Classification};
use super::error::{InspectionError, ValidationError};
use super::location::LocationCode;
use super::photo_slots::UploadOutcome;
use super::progress::{LoadedProgress, ProgressStore};
use super::session::{fallback_step, InspectionSession};
use super::state_machine::{InspectionStepMachine, StepEvent, StepPhase};
use super::tracking::derive_tracking_number;
use super::types::{
    FinalizeRequest, InspectionStep, LabelArtifact, PhotoRef, PhotographyPolicy,
    ProductCategory, ProductId, ProgressStatus, StorageLocation, Weight,
};
use crate::backend::{observe, BackendError, BackendOperation, InspectionBackend};
use crate::config::WorkflowConfig;
use crate::observability::backend_metrics;
use crate::telemetry::{create_inspection_span, generate_correlation_id};

/// How the session was opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionMode {
    #[default]
    Full,
    /// Re-shoot of an already inspected item: the checklist is not revisited.
    PhotographyOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRules {
    pub max_photos: usize,
    pub min_photos: usize,
    pub require_slot_coverage: bool,
    pub photography_exempt_categories: Vec<String>,
}

impl Default for WorkflowRules {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for WorkflowRules {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            max_photos: config.max_photos,
            min_photos: config.min_photos,
            require_slot_coverage: config.require_slot_coverage,
            photography_exempt_categories: config.photography_exempt_categories.clone(),
        }
    }
}

impl WorkflowRules {
    pub fn policy_for(&self, category: &ProductCategory, mode: SessionMode) -> PhotographyPolicy {
        if mode == SessionMode::PhotographyOnly {
            return PhotographyPolicy::PhotographyOnly;
        }
        let exempt = self
            .photography_exempt_categories
            .iter()
            .any(|name| name.eq_ignore_ascii_case(category.as_str()));
        if exempt {
            PhotographyPolicy::NotRequired
        } else {
            PhotographyPolicy::Required
        }
    }
}

/// Result of a completed inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionOutcome {
    pub product_id: ProductId,
    pub classification: Classification,
    pub location: StorageLocation,
    pub skipped_photography: bool,
}

pub struct InspectionWorkflow {
    backend: Arc<dyn InspectionBackend>,
    progress: ProgressStore,
    rules: WorkflowRules,
    session: InspectionSession,
    machine: InspectionStepMachine,
    correlation_id: String,
    span: tracing::Span,
}

impl std::fmt::Debug for InspectionWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectionWorkflow")
            .field("session", &self.session)
            .field("phase", &self.machine.phase())
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

impl InspectionWorkflow {
    /// Opens the product's inspection, resuming its checkpoint when there is one.
    pub async fn open(
        backend: Arc<dyn InspectionBackend>,
        product_id: &ProductId,
        rules: WorkflowRules,
        mode: SessionMode,
    ) -> Result<Self, InspectionError> {
        let correlation_id = generate_correlation_id();
        let span = create_inspection_span(product_id.as_str(), &correlation_id);

        let (progress, session, policy) = async {
            let product = observe(
                BackendOperation::FetchProduct,
                backend.fetch_product(product_id),
            )
            .await
            .map_err(|e| InspectionError::transport(BackendOperation::FetchProduct, e))?;

            let policy = rules.policy_for(&product.category, mode);
            let progress = ProgressStore::new(backend.clone());
            let mut session = match progress.load(product_id).await? {
                LoadedProgress::Resumed(record) => {
                    InspectionSession::restore(product, policy, rules.max_photos, record)
                }
                LoadedProgress::Fresh => {
                    let step = fallback_step(&product.status);
                    InspectionSession::starting_at(product, policy, rules.max_photos, step)
                }
            };

            // A re-shoot always lands on photography, even from a later checkpoint.
            if mode == SessionMode::PhotographyOnly {
                session.current_step = InspectionStep::Photography;
                session.photography_committed = false;
                session.checklist.visit_all();
            }
            Ok::<_, InspectionError>((progress, session, policy))
        }
        .instrument(span.clone())
        .await?;

        let machine = InspectionStepMachine::resumed_at(session.current_step);
        span.in_scope(|| {
            info!(
                step = %session.current_step,
                policy = ?policy,
                "Inspection session opened"
            )
        });

        Ok(Self {
            backend,
            progress,
            rules,
            session,
            machine,
            correlation_id,
            span,
        })
    }

    pub fn session(&self) -> &InspectionSession {
        &self.session
    }

    pub fn current_step(&self) -> InspectionStep {
        self.session.current_step
    }

    pub fn phase(&self) -> StepPhase {
        self.machine.phase()
    }

    pub fn rules(&self) -> &WorkflowRules {
        &self.rules
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Span every operation of this session is recorded under.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    fn ensure_open(&self) -> Result<(), InspectionError> {
        if self.machine.phase().is_closed() {
            return Err(InspectionError::SessionClosed {
                product_id: self.session.product.id.clone(),
            });
        }
        Ok(())
    }

    fn guard_failed(&self, error: ValidationError) -> InspectionError {
        backend_metrics().record_rejected_guard();
        warn!(
            product_id = %self.session.product.id,
            step = %self.session.current_step,
            error = %error,
            "Transition guard rejected"
        );
        InspectionError::Validation(error)
    }

    // Checklist

    pub fn set_checklist_flag(
        &mut self,
        category: &str,
        item: &str,
        value: bool,
    ) -> Result<(), InspectionError> {
        self.ensure_open()?;
        Ok(self.session.checklist.set_flag(category, item, value)?)
    }

    pub fn set_checklist_text(
        &mut self,
        category: &str,
        item: &str,
        text: &str,
    ) -> Result<(), InspectionError> {
        self.ensure_open()?;
        Ok(self.session.checklist.set_text(category, item, text)?)
    }

    pub fn clear_checklist_item(&mut self, category: &str, item: &str) -> Result<(), InspectionError> {
        self.ensure_open()?;
        self.session.checklist.clear(category, item);
        Ok(())
    }

    pub fn visit_checklist_category(&mut self, category: &str) -> Result<(), InspectionError> {
        self.ensure_open()?;
        self.session.checklist.visit(category);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: &str) -> Result<(), InspectionError> {
        self.ensure_open()?;
        self.session.notes = notes.to_string();
        Ok(())
    }

    // Photography

    pub fn upload_photos<I>(&mut self, photos: I) -> Result<UploadOutcome, InspectionError>
    where
        I: IntoIterator<Item = PhotoRef>,
    {
        self.ensure_open()?;
        Ok(self.session.photos.upload(photos))
    }

    pub fn assign_photo(&mut self, photo: &PhotoRef, slot_id: &str) -> Result<(), InspectionError> {
        self.ensure_open()?;
        Ok(self.session.photos.assign(photo, slot_id)?)
    }

    pub fn unassign_photo(&mut self, photo: &PhotoRef) -> Result<Option<String>, InspectionError> {
        self.ensure_open()?;
        Ok(self.session.photos.unassign(photo))
    }

    pub fn remove_photo(&mut self, photo: &PhotoRef) -> Result<bool, InspectionError> {
        self.ensure_open()?;
        Ok(self.session.photos.remove_photo(photo))
    }

    // Packaging

    pub fn record_weight(&mut self, input: &str) -> Result<Weight, InspectionError> {
        self.ensure_open()?;
        let weight: Weight = input.parse()?;
        self.session.weight = Some(weight);
        Ok(weight)
    }

    /// Derives the tracking code from the SKU and asks the label service for a label.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn generate_label(&mut self) -> Result<&LabelArtifact, InspectionError> {
        self.ensure_open()?;
        let tracking_code = derive_tracking_number(&self.session.product.sku);
        let artifact = observe(
            BackendOperation::GenerateLabel,
            self.backend.generate_label(
                &self.session.product.id,
                &tracking_code,
                &self.session.notes,
            ),
        )
        .await
        .map_err(|e| InspectionError::transport(BackendOperation::GenerateLabel, e))?;

        info!(tracking_code = %tracking_code, "Product label generated");
        self.session.tracking_code = Some(tracking_code);
        Ok(self.session.label.insert(artifact))
    }

    // Shelf storage

    pub fn set_location_code(&mut self, input: &str) -> Result<&LocationCode, InspectionError> {
        self.ensure_open()?;
        let code = LocationCode::parse(input)?;
        Ok(self.session.location_code.insert(code))
    }

    // Navigation

    /// Moves to the next step once its guard and side effects succeed.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn advance(&mut self) -> Result<InspectionStep, InspectionError> {
        self.ensure_open()?;
        let step = self.session.current_step;
        let next = step.next().ok_or(InspectionError::InvalidTransition {
            step,
            event: StepEvent::Advance,
        })?;

        match step {
            InspectionStep::Photography => {
                self.check_photography_guard()?;
                self.commit_photography().await?;
            }
            InspectionStep::Packaging => self.check_packaging_guard()?,
            InspectionStep::Checklist | InspectionStep::ShelfStorage => {}
        }

        let saved_at = self
            .progress
            .save(&self.session, next, ProgressStatus::Inspecting)
            .await?;

        self.machine
            .handle(StepEvent::Advance)
            .map_err(|_| InspectionError::InvalidTransition {
                step,
                event: StepEvent::Advance,
            })?;
        if step == InspectionStep::Checklist {
            self.session.checklist.visit_all();
        }
        self.session.current_step = next;
        self.session.last_updated = Some(saved_at);
        info!(from = %step, to = %next, "Inspection step advanced");
        Ok(next)
    }

    fn check_photography_guard(&self) -> Result<(), InspectionError> {
        let photos = &self.session.photos;
        if self.session.policy.requires_photos() && photos.photo_count() < self.rules.min_photos {
            return Err(self.guard_failed(ValidationError::InsufficientPhotos {
                required: self.rules.min_photos,
                uploaded: photos.photo_count(),
            }));
        }
        if self.rules.require_slot_coverage
            && self.session.policy.requires_photos()
            && !photos.is_satisfied()
        {
            let slots = photos
                .unsatisfied_slots()
                .into_iter()
                .map(str::to_string)
                .collect();
            return Err(self.guard_failed(ValidationError::UnsatisfiedSlots { slots }));
        }
        Ok(())
    }

    async fn commit_photography(&mut self) -> Result<(), InspectionError> {
        let commit = self.session.photography_commit();
        observe(
            BackendOperation::CommitPhotography,
            self.backend.commit_photography(&commit),
        )
        .await
        .map_err(|e| {
            warn!(error = %e, "Photography commit failed, staying on photography");
            InspectionError::transport(BackendOperation::CommitPhotography, e)
        })?;
        self.session.photography_committed = true;
        Ok(())
    }

    fn check_packaging_guard(&self) -> Result<(), InspectionError> {
        if self.session.weight.is_none() {
            return Err(self.guard_failed(ValidationError::MissingWeight));
        }
        if self.session.label.is_none() {
            return Err(self.guard_failed(ValidationError::MissingLabel));
        }
        Ok(())
    }

    /// Steps back without guards or network calls. Nothing entered is discarded.
    pub fn back(&mut self) -> Result<InspectionStep, InspectionError> {
        self.ensure_open()?;
        let step = self.session.current_step;
        match self.machine.handle(StepEvent::Back) {
            Ok(StepPhase::Active(previous)) => {
                self.session.current_step = previous;
                Ok(previous)
            }
            _ => Err(InspectionError::InvalidTransition {
                step,
                event: StepEvent::Back,
            }),
        }
    }

    /// Checkpoints the session as-is, whatever state it is in.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn save_and_return(&mut self) -> Result<DateTime<Utc>, InspectionError> {
        self.ensure_open()?;
        let saved_at = self
            .progress
            .save(&self.session, self.session.current_step, ProgressStatus::Paused)
            .await?;
        self.session.last_updated = Some(saved_at);
        info!(step = %self.session.current_step, "Inspection paused");
        Ok(saved_at)
    }

    /// Abandons the in-memory session. Earlier checkpoints stay on the server.
    pub fn cancel(&mut self) -> Result<(), InspectionError> {
        self.ensure_open()?;
        let step = self.session.current_step;
        self.machine
            .handle(StepEvent::Cancel)
            .map_err(|_| InspectionError::InvalidTransition {
                step,
                event: StepEvent::Cancel,
            })?;
        Ok(())
    }

    /// Confirms the shelf, classifies the checklist and issues the terminal update.
    #[tracing::instrument(parent = &self.span, skip(self))]
    pub async fn complete(&mut self) -> Result<InspectionOutcome, InspectionError> {
        self.ensure_open()?;
        let step = self.session.current_step;
        if step != InspectionStep::ShelfStorage {
            return Err(InspectionError::InvalidTransition {
                step,
                event: StepEvent::Complete,
            });
        }
        let code = match &self.session.location_code {
            Some(code) => code.clone(),
            None => return Err(self.guard_failed(ValidationError::MissingLocation)),
        };

        let mut location = match observe(
            BackendOperation::ValidateLocation,
            self.backend.validate_location(code.as_str()),
        )
        .await
        {
            Ok(location) => location,
            Err(BackendError::NotFound { .. }) => {
                return Err(self.guard_failed(ValidationError::UnknownLocation {
                    code: code.to_string(),
                }))
            }
            Err(e) => {
                return Err(InspectionError::transport(
                    BackendOperation::ValidateLocation,
                    e,
                ))
            }
        };
        if !location.has_capacity() {
            warn!(location = %code, "Shelf location is full");
            return Err(InspectionError::Capacity {
                location: code.to_string(),
            });
        }

        let classification =
            classify_checklist(&self.session.checklist, self.session.photography_done())
                .map_err(|e| self.guard_failed(e))?;

        let request = FinalizeRequest {
            product_id: self.session.product.id.clone(),
            notes: self.session.notes.clone(),
            status: classification.status,
            location_id: location.id.clone(),
            skipped_photography: self.session.photography_skipped(),
        };
        observe(
            BackendOperation::FinalizeInspection,
            self.backend.finalize_inspection(&request),
        )
        .await
        .map_err(|e| match e {
            BackendError::CapacityExceeded { .. } => InspectionError::Capacity {
                location: code.to_string(),
            },
            other => InspectionError::transport(BackendOperation::FinalizeInspection, other),
        })?;
        // The finalize admitted the product, so the shelf holds one more item.
        location.current_count += 1;

        self.machine
            .handle(StepEvent::Complete)
            .map_err(|_| InspectionError::InvalidTransition {
                step,
                event: StepEvent::Complete,
            })?;
        info!(
            verdict = %classification.verdict,
            status = %classification.status,
            location = %code,
            "Inspection completed"
        );

        Ok(InspectionOutcome {
            product_id: request.product_id,
            classification,
            location,
            skipped_photography: request.skipped_photography,
        })
    }
}
