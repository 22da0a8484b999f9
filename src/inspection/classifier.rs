//! Inspection verdict and the lifecycle status it maps to.
//!
//! Only explicitly answered yes/no items count. An inspection with no answers at all is
//! a pass: the worker found nothing to flag. This also means malformed or empty
//! checklist data can never block the terminal update.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::checklist::ChecklistState;
use super::error::ValidationError;
use super::types::{ChecklistResponses, LifecycleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Conditional,
    Failed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::Passed => "passed",
            Verdict::Conditional => "conditional",
            Verdict::Failed => "failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecklistTally {
    pub passed: usize,
    pub total: usize,
}

impl ChecklistTally {
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        flags
            .into_iter()
            .fold(ChecklistTally::default(), |mut tally, flag| {
                tally.total += 1;
                if flag {
                    tally.passed += 1;
                }
                tally
            })
    }

    /// Ratio thresholds: below 60% fails, below 90% is conditional. Compared in
    /// integers so 6/10 and 9/10 land exactly on their boundaries.
    pub fn verdict(&self) -> Verdict {
        if self.total == 0 {
            return Verdict::Passed;
        }
        let scaled = self.passed * 10;
        if scaled < self.total * 6 {
            Verdict::Failed
        } else if scaled < self.total * 9 {
            Verdict::Conditional
        } else {
            Verdict::Passed
        }
    }
}

pub fn classify(responses: &ChecklistResponses) -> Verdict {
    let flags = responses
        .values()
        .flat_map(|items| items.values())
        .filter_map(|value| value.as_flag());
    ChecklistTally::from_flags(flags).verdict()
}

pub fn resulting_status(verdict: Verdict, photography_done: bool) -> LifecycleStatus {
    match (verdict, photography_done) {
        (Verdict::Passed, true) => LifecycleStatus::ReadyForStorage,
        (Verdict::Passed, false) => LifecycleStatus::AwaitingPhotography,
        (Verdict::Conditional, _) => LifecycleStatus::NeedsReview,
        (Verdict::Failed, _) => LifecycleStatus::OnHold,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tally: ChecklistTally,
    pub verdict: Verdict,
    pub status: LifecycleStatus,
}

/// Classifies a session's checklist. Refuses while any template category is unvisited.
pub fn classify_checklist(
    checklist: &ChecklistState,
    photography_done: bool,
) -> Result<Classification, ValidationError> {
    let unvisited = checklist.unvisited();
    if !unvisited.is_empty() {
        return Err(ValidationError::UnvisitedChecklist {
            categories: unvisited,
        });
    }

    let tally = ChecklistTally::from_flags(checklist.flags());
    let verdict = tally.verdict();
    Ok(Classification {
        tally,
        verdict,
        status: resulting_status(verdict, photography_done),
    })
}
