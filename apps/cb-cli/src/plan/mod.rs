//! Reviewable change plans
//!
//! A [`ChangePlan`] groups what a push would do per asset kind: names to
//! create, names to update, and for schema-bearing kinds the columns to add
//! or drop. Warnings are shown but never block; any error blocks the plan.
//!
//! - `builder`: computes plans from a server dry run or a local diff
//! - `render`: table, JSON and YAML output
//! - `state`: the build → confirm → apply state machine

pub mod builder;
pub mod render;
pub mod state;

pub use builder::ChangeSetBuilder;
pub use render::{render_plan, should_use_color, OutputFormat};
pub use state::PlanState;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::batch::{ApplyItem, ApplyOutcome, ApplyReport};
use crate::models::AssetKind;

/// Exit code when no changes are pending
pub const EXIT_NO_CHANGES: i32 = 0;

/// Exit code when changes are pending
pub const EXIT_CHANGES_FOUND: i32 = 1;

/// Minimum upload version offering server-computed dry runs.
pub const UNIFIED_UPLOAD_VERSION: u32 = 5;

/// Schema column changes of one kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChanges {
    #[serde(default)]
    pub to_add: Vec<String>,
    #[serde(default)]
    pub to_remove: Vec<String>,
}

impl ColumnChanges {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Changes planned for one asset kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindChanges {
    #[serde(default)]
    pub to_create: Vec<String>,
    #[serde(default)]
    pub to_update: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnChanges>,
}

impl KindChanges {
    pub fn change_count(&self) -> usize {
        self.to_create.len()
            + self.to_update.len()
            + self
                .columns
                .as_ref()
                .map_or(0, |c| c.to_add.len() + c.to_remove.len())
    }

    pub fn is_empty(&self) -> bool {
        self.change_count() == 0
    }
}

/// Complete plan of a push or diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    #[serde(default)]
    pub sections: BTreeMap<AssetKind, KindChanges>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ChangePlan {
    pub fn new() -> Self {
        Self::default()
    }

    fn section_mut(&mut self, kind: AssetKind) -> &mut KindChanges {
        self.sections.entry(kind).or_default()
    }

    fn columns_mut(&mut self, kind: AssetKind) -> &mut ColumnChanges {
        self.section_mut(kind).columns.get_or_insert_with(Default::default)
    }

    pub fn add_create(&mut self, kind: AssetKind, name: impl Into<String>) {
        self.section_mut(kind).to_create.push(name.into());
    }

    pub fn add_update(&mut self, kind: AssetKind, name: impl Into<String>) {
        self.section_mut(kind).to_update.push(name.into());
    }

    pub fn add_column(&mut self, kind: AssetKind, column: impl Into<String>) {
        self.columns_mut(kind).to_add.push(column.into());
    }

    pub fn remove_column(&mut self, kind: AssetKind, column: impl Into<String>) {
        self.columns_mut(kind).to_remove.push(column.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Kinds with at least one change, in pipeline order.
    pub fn sections(&self) -> impl Iterator<Item = (AssetKind, &KindChanges)> {
        self.sections
            .iter()
            .filter(|(_, changes)| !changes.is_empty())
            .map(|(kind, changes)| (*kind, changes))
    }

    pub fn section(&self, kind: AssetKind) -> Option<&KindChanges> {
        self.sections.get(&kind)
    }

    pub fn total_changes(&self) -> usize {
        self.sections.values().map(KindChanges::change_count).sum()
    }

    /// A blocked plan is rendered but never applied.
    pub fn is_blocked(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True only for an unblocked plan with pending changes.
    pub fn has_changes(&self) -> bool {
        !self.is_blocked() && self.total_changes() > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.has_changes() {
            EXIT_CHANGES_FOUND
        } else {
            EXIT_NO_CHANGES
        }
    }

    pub fn merge(&mut self, other: ChangePlan) {
        for (kind, changes) in other.sections {
            let section = self.section_mut(kind);
            section.to_create.extend(changes.to_create);
            section.to_update.extend(changes.to_update);
            if let Some(columns) = changes.columns {
                let target = section.columns.get_or_insert_with(Default::default);
                target.to_add.extend(columns.to_add);
                target.to_remove.extend(columns.to_remove);
            }
        }
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }
}

/// Server-computed delta returned by a dry-run upload.
///
/// Every key other than `warnings`/`errors` is a kind section keyed by the
/// kind's wire key, e.g. `{"services": {"create": ["a"], "update": []}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DryRunResponse {
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(flatten)]
    pub sections: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct DryRunSection {
    #[serde(default)]
    create: Vec<String>,
    #[serde(default)]
    update: Vec<String>,
    #[serde(default)]
    columns: Option<DryRunColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct DryRunColumns {
    #[serde(default)]
    add: Vec<String>,
    #[serde(default)]
    remove: Vec<String>,
}

impl DryRunResponse {
    /// Convert into a plan. Unknown or malformed sections become warnings.
    pub fn into_plan(self) -> ChangePlan {
        let mut plan = ChangePlan::new();
        for (key, value) in self.sections {
            let Some(kind) = AssetKind::from_wire_key(&key) else {
                plan.warn(format!("Ignoring unknown section '{key}' in dry-run response"));
                continue;
            };
            let section: DryRunSection = match serde_json::from_value(value) {
                Ok(section) => section,
                Err(e) => {
                    plan.warn(format!("Ignoring malformed '{key}' section: {e}"));
                    continue;
                }
            };
            for name in section.create {
                plan.add_create(kind, name);
            }
            for name in section.update {
                plan.add_update(kind, name);
            }
            if let Some(columns) = section.columns {
                for column in columns.add {
                    plan.add_column(kind, column);
                }
                for column in columns.remove {
                    plan.remove_column(kind, column);
                }
            }
        }
        plan.warnings.extend(self.warnings);
        plan.errors.extend(self.errors);
        plan
    }
}

/// One asset failure reported by a non-dry-run upload
#[derive(Debug, Clone, Deserialize)]
pub struct UploadFailure {
    pub kind: String,
    pub name: String,
    pub error: String,
}

/// Response of a non-dry-run upload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub failures: Vec<UploadFailure>,
}

impl UploadResponse {
    /// Build the per-asset report of an upload of `plan`.
    pub fn into_report(self, plan: &ChangePlan) -> ApplyReport {
        let mut report = ApplyReport::new();
        let failed = |kind: AssetKind, name: &str| {
            self.failures
                .iter()
                .find(|f| AssetKind::from_wire_key(&f.kind) == Some(kind) && f.name == name)
        };

        for (kind, changes) in plan.sections() {
            let planned = changes
                .to_create
                .iter()
                .map(|n| (n, ApplyOutcome::Created))
                .chain(changes.to_update.iter().map(|n| (n, ApplyOutcome::Updated)));
            for (name, outcome) in planned {
                match failed(kind, name) {
                    Some(failure) => {
                        report.record(ApplyItem::failed(kind, name.as_str(), &failure.error))
                    }
                    None => report.record(ApplyItem::new(kind, name.as_str(), outcome)),
                }
            }
        }

        // Failures the plan did not list still count.
        for failure in &self.failures {
            let listed = AssetKind::from_wire_key(&failure.kind).is_some_and(|kind| {
                plan.section(kind).is_some_and(|s| {
                    s.to_create.contains(&failure.name) || s.to_update.contains(&failure.name)
                })
            });
            if listed {
                continue;
            }
            match AssetKind::from_wire_key(&failure.kind) {
                Some(kind) => {
                    report.record(ApplyItem::failed(kind, failure.name.as_str(), &failure.error))
                }
                None => report.record_unattributed(format!(
                    "{} '{}': {}",
                    failure.kind, failure.name, failure.error
                )),
            }
        }
        report
    }
}
