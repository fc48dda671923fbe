//! Lifecycle of a plan between build and apply

use std::fmt;

use super::ChangePlan;
use crate::batch::ApplyReport;
use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
    /// Nothing to apply
    Done,
    /// Plan has errors and must not be applied
    Blocked,
    AwaitingConfirmation,
    Confirmed,
    Applying,
    Applied,
    PartiallyFailed,
}

impl PlanState {
    /// State of a freshly built plan.
    pub fn from_plan(plan: &ChangePlan) -> Self {
        if plan.is_blocked() {
            PlanState::Blocked
        } else if plan.has_changes() {
            PlanState::AwaitingConfirmation
        } else {
            PlanState::Done
        }
    }

    fn transition(self, to: PlanState) -> CliResult<PlanState> {
        let allowed = matches!(
            (self, to),
            (PlanState::AwaitingConfirmation, PlanState::Confirmed)
                | (PlanState::Confirmed, PlanState::Applying)
                | (PlanState::Applying, PlanState::Applied)
                | (PlanState::Applying, PlanState::PartiallyFailed)
        );
        if allowed {
            tracing::debug!(from = %self, to = %to, "Plan state transition");
            Ok(to)
        } else {
            Err(CliError::Validation(format!(
                "Plan cannot move from {self} to {to}"
            )))
        }
    }

    pub fn confirm(self) -> CliResult<PlanState> {
        self.transition(PlanState::Confirmed)
    }

    pub fn begin_apply(self) -> CliResult<PlanState> {
        self.transition(PlanState::Applying)
    }

    pub fn finish(self, report: &ApplyReport) -> CliResult<PlanState> {
        if report.has_failures() {
            self.transition(PlanState::PartiallyFailed)
        } else {
            self.transition(PlanState::Applied)
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanState::Done | PlanState::Blocked | PlanState::Applied | PlanState::PartiallyFailed
        )
    }
}

impl fmt::Display for PlanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanState::Done => "done",
            PlanState::Blocked => "blocked",
            PlanState::AwaitingConfirmation => "awaiting confirmation",
            PlanState::Confirmed => "confirmed",
            PlanState::Applying => "applying",
            PlanState::Applied => "applied",
            PlanState::PartiallyFailed => "partially failed",
        };
        write!(f, "{name}")
    }
}
