//! Per-step outcomes and the run summary.

use serde::Serialize;

use crate::error::StepError;
use crate::event::EventKind;

/// What happened to one event.
#[derive(Debug)]
pub enum StepOutcome {
    /// The step was replayed.
    Performed,
    /// The event carries no action (change, submit, visibility, printable keys).
    Informational,
    Skipped(StepError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub index: usize,
    pub kind: EventKind,
    pub reason: String,
}

/// Summary of a replay run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub total: usize,
    pub performed: usize,
    pub informational: usize,
    pub skipped: Vec<SkippedStep>,
    /// Stopped early on request.
    pub cancelled: bool,
}

impl ReplayReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, index: usize, kind: EventKind, outcome: &StepOutcome) {
        match outcome {
            StepOutcome::Performed => self.performed += 1,
            StepOutcome::Informational => self.informational += 1,
            StepOutcome::Skipped(reason) => self.skipped.push(SkippedStep {
                index,
                kind,
                reason: reason.to_string(),
            }),
        }
    }

    /// Steps that were looked at, whatever their outcome.
    pub fn processed(&self) -> usize {
        self.performed + self.informational + self.skipped.len()
    }
}
