//! Apply result types
//!
//! Tracks per-asset outcomes of a push so that one failing asset does not
//! hide what happened to the others.

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};
use crate::models::AssetKind;

/// Outcome for a single asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Asset did not exist remotely and was created
    Created,
    /// Remote asset was changed
    Updated,
    /// Remote asset already matched
    Unchanged,
    /// Remote asset was removed
    Deleted,
    /// Creation declined at the prompt
    Skipped,
    /// Remote call failed
    Failed,
}

impl std::fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyOutcome::Created => write!(f, "created"),
            ApplyOutcome::Updated => write!(f, "updated"),
            ApplyOutcome::Unchanged => write!(f, "unchanged"),
            ApplyOutcome::Deleted => write!(f, "deleted"),
            ApplyOutcome::Skipped => write!(f, "skipped"),
            ApplyOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Result for a single asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyItem {
    pub kind: AssetKind,
    pub name: String,
    pub outcome: ApplyOutcome,
    /// Number of remote mutations issued for this asset
    #[serde(default)]
    pub mutations: usize,
    /// Error message if failed, reason if skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApplyItem {
    pub fn new(kind: AssetKind, name: impl Into<String>, outcome: ApplyOutcome) -> Self {
        Self {
            kind,
            name: name.into(),
            outcome,
            mutations: 0,
            error: None,
        }
    }

    pub fn with_mutations(mut self, mutations: usize) -> Self {
        self.mutations = mutations;
        self
    }

    pub fn failed(kind: AssetKind, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(kind, name, ApplyOutcome::Failed)
        }
    }

    pub fn skipped(kind: AssetKind, name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::new(kind, name, ApplyOutcome::Skipped)
        }
    }
}

/// Summary of a completed apply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Total assets attempted
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// Assets whose creation was declined
    pub skipped_count: usize,
    pub items: Vec<ApplyItem>,
    /// Failures the remote reported under a kind this tool does not know
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unattributed: Vec<String>,
    pub duration_ms: u64,
}

impl ApplyReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, item: ApplyItem) {
        self.total += 1;
        match item.outcome {
            ApplyOutcome::Failed => self.failure_count += 1,
            ApplyOutcome::Skipped => self.skipped_count += 1,
            ApplyOutcome::Created
            | ApplyOutcome::Updated
            | ApplyOutcome::Unchanged
            | ApplyOutcome::Deleted => self.success_count += 1,
        }
        self.items.push(item);
    }

    /// Count a failure that cannot be tied to a known asset kind.
    pub fn record_unattributed(&mut self, message: impl Into<String>) {
        self.total += 1;
        self.failure_count += 1;
        self.unattributed.push(message.into());
    }

    pub fn merge(&mut self, other: ApplyReport) {
        for item in other.items {
            self.record(item);
        }
        for message in other.unattributed {
            self.record_unattributed(message);
        }
        self.duration_ms += other.duration_ms;
    }

    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }

    /// Count of assets with remote changes (created or updated).
    pub fn changed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| {
                matches!(
                    i.outcome,
                    ApplyOutcome::Created | ApplyOutcome::Updated | ApplyOutcome::Deleted
                )
            })
            .count()
    }

    pub fn failed_items(&self) -> impl Iterator<Item = &ApplyItem> {
        self.items
            .iter()
            .filter(|i| i.outcome == ApplyOutcome::Failed)
    }

    pub fn successful_items(&self) -> impl Iterator<Item = &ApplyItem> {
        self.items.iter().filter(|i| {
            matches!(
                i.outcome,
                ApplyOutcome::Created
                    | ApplyOutcome::Updated
                    | ApplyOutcome::Unchanged
                    | ApplyOutcome::Deleted
            )
        })
    }

    /// Turn a report with failures into [`CliError::Partial`].
    pub fn into_result(self) -> CliResult<ApplyReport> {
        if self.has_failures() {
            Err(CliError::Partial(Box::new(self)))
        } else {
            Ok(self)
        }
    }
}
