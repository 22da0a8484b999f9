use serde::{Deserialize, Serialize};
use statig::blocking::StateMachine;
use statig::prelude::*;
use std::fmt;

use super::types::InspectionStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepEvent {
    Advance,
    Back,
    Complete,
    Cancel,
    /// Jump straight to a checkpointed step. Only accepted before any other event.
    Restore(InspectionStep),
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepEvent::Advance => f.write_str("advance"),
            StepEvent::Back => f.write_str("go back"),
            StepEvent::Complete => f.write_str("complete"),
            StepEvent::Cancel => f.write_str("cancel"),
            StepEvent::Restore(step) => write!(f, "restore to step {}", step.number()),
        }
    }
}

/// Where the session stands in the inspection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepPhase {
    Active(InspectionStep),
    Completed,
    Cancelled,
}

impl StepPhase {
    pub fn is_closed(self) -> bool {
        !matches!(self, StepPhase::Active(_))
    }
}

impl Default for StepPhase {
    fn default() -> Self {
        StepPhase::Active(InspectionStep::Checklist)
    }
}

/// Shared storage of the step machine. Guards live in the workflow; this only knows
/// which moves are legal from which step.
#[derive(Debug, Default)]
pub struct StepTracker {
    phase: StepPhase,
    rejections: u64,
}

impl StepTracker {
    fn move_to(&mut self, step: InspectionStep, next: State) -> Outcome<State> {
        tracing::debug!(from = ?self.phase, to = %step, "Inspection step changed");
        self.phase = StepPhase::Active(step);
        Transition(next)
    }

    fn reject(&mut self, event: StepEvent) {
        tracing::debug!(phase = ?self.phase, event = %event, "Step event rejected");
        self.rejections += 1;
    }
}

#[state_machine(initial = "State::checklist()")]
impl StepTracker {
    #[superstate]
    fn open(&mut self, event: &StepEvent) -> Outcome<State> {
        match event {
            StepEvent::Cancel => {
                self.phase = StepPhase::Cancelled;
                tracing::info!("Inspection session cancelled");
                Transition(State::cancelled())
            }
            _ => {
                self.reject(*event);
                Handled
            }
        }
    }

    #[state(superstate = "open")]
    fn checklist(&mut self, event: &StepEvent) -> Outcome<State> {
        match event {
            StepEvent::Advance => self.move_to(InspectionStep::Photography, State::photography()),
            StepEvent::Restore(InspectionStep::Checklist) => Handled,
            StepEvent::Restore(InspectionStep::Photography) => {
                self.move_to(InspectionStep::Photography, State::photography())
            }
            StepEvent::Restore(InspectionStep::Packaging) => {
                self.move_to(InspectionStep::Packaging, State::packaging())
            }
            StepEvent::Restore(InspectionStep::ShelfStorage) => {
                self.move_to(InspectionStep::ShelfStorage, State::shelf_storage())
            }
            _ => Super,
        }
    }

    #[state(superstate = "open")]
    fn photography(&mut self, event: &StepEvent) -> Outcome<State> {
        match event {
            StepEvent::Advance => self.move_to(InspectionStep::Packaging, State::packaging()),
            StepEvent::Back => self.move_to(InspectionStep::Checklist, State::checklist()),
            _ => Super,
        }
    }

    #[state(superstate = "open")]
    fn packaging(&mut self, event: &StepEvent) -> Outcome<State> {
        match event {
            StepEvent::Advance => {
                self.move_to(InspectionStep::ShelfStorage, State::shelf_storage())
            }
            StepEvent::Back => self.move_to(InspectionStep::Photography, State::photography()),
            _ => Super,
        }
    }

    #[state(superstate = "open")]
    fn shelf_storage(&mut self, event: &StepEvent) -> Outcome<State> {
        match event {
            StepEvent::Complete => {
                self.phase = StepPhase::Completed;
                tracing::info!("Inspection session completed");
                Transition(State::completed())
            }
            StepEvent::Back => self.move_to(InspectionStep::Packaging, State::packaging()),
            _ => Super,
        }
    }

    #[state]
    fn completed(&mut self, event: &StepEvent) -> Outcome<State> {
        self.reject(*event);
        Handled
    }

    #[state]
    fn cancelled(&mut self, event: &StepEvent) -> Outcome<State> {
        self.reject(*event);
        Handled
    }
}

/// Legal-move table for an inspection session.
pub struct InspectionStepMachine {
    machine: StateMachine<StepTracker>,
}

impl std::fmt::Debug for InspectionStepMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InspectionStepMachine")
            .field("phase", &self.phase())
            .finish()
    }
}

impl Default for InspectionStepMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectionStepMachine {
    pub fn new() -> Self {
        Self {
            machine: StepTracker::default().state_machine(),
        }
    }

    /// A machine already positioned at a checkpointed step.
    pub fn resumed_at(step: InspectionStep) -> Self {
        let mut machine = Self::new();
        machine.machine.handle(&StepEvent::Restore(step));
        machine
    }

    pub fn phase(&self) -> StepPhase {
        self.machine.inner().phase
    }

    /// Feeds an event; returns the phase it led to, or the phase it was rejected in.
    pub fn handle(&mut self, event: StepEvent) -> Result<StepPhase, StepPhase> {
        let before = self.machine.inner().rejections;
        self.machine.handle(&event);
        let tracker = self.machine.inner();
        if tracker.rejections > before {
            Err(tracker.phase)
        } else {
            Ok(tracker.phase)
        }
    }
}
