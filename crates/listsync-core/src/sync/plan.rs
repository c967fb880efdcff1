//! Dry-run results

use serde::Serialize;

use crate::models::ListTarget;

/// What a sync run would do for one definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PlanAction {
    /// List is missing and would be inserted with `values` values
    Create { values: usize },
    /// List exists and differs
    Update { changes: Vec<String> },
    /// List already matches; no write
    Unchanged,
    /// Definition is invalid or the backend lookup failed
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanItem {
    pub code: String,
    #[serde(flatten)]
    pub action: PlanAction,
    /// Stored values absent from the definition (left untouched by sync)
    pub stale_values: usize,
}

/// Read-only comparison of definitions against a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub target: ListTarget,
    pub items: Vec<PlanItem>,
}

impl SyncPlan {
    pub fn creates(&self) -> usize {
        self.count(|action| matches!(action, PlanAction::Create { .. }))
    }

    pub fn updates(&self) -> usize {
        self.count(|action| matches!(action, PlanAction::Update { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|action| matches!(action, PlanAction::Unchanged))
    }

    pub fn failures(&self) -> usize {
        self.count(|action| matches!(action, PlanAction::Failed { .. }))
    }

    /// Whether a sync run would write anything
    pub fn has_changes(&self) -> bool {
        self.creates() + self.updates() > 0
    }

    fn count(&self, predicate: impl Fn(&PlanAction) -> bool) -> usize {
        self.items
            .iter()
            .filter(|item| predicate(&item.action))
            .count()
    }
}
