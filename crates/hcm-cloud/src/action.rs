//! Reconciliation actions and sync summaries

use crate::vendor::{ResourceKind, Vendor};
use serde::{Deserialize, Serialize};

/// What a sync pass did to one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Create,
    Update,
    Delete,
    /// Observed and unchanged
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Counters of one sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl SyncSummary {
    pub fn record(&mut self, action: ActionType, n: usize) {
        match action {
            ActionType::Create => self.created += n,
            ActionType::Update => self.updated += n,
            ActionType::Delete => self.deleted += n,
            ActionType::NoOp => self.unchanged += n,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }

    pub fn merge(&mut self, other: &SyncSummary) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.unchanged += other.unchanged;
    }
}

impl std::fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} unchanged",
            self.created, self.updated, self.deleted, self.unchanged
        )
    }
}

/// Result of one sync request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub task_id: String,
    pub vendor: Vendor,
    pub kind: ResourceKind,
    pub summary: SyncSummary,
    pub duration_ms: u64,
}

impl SyncResult {
    pub fn new(vendor: Vendor, kind: ResourceKind, summary: SyncSummary) -> Self {
        Self {
            task_id: uuid::Uuid::new_v4().to_string(),
            vendor,
            kind,
            summary,
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        let mut summary = SyncSummary::default();
        assert!(!summary.has_changes());

        summary.record(ActionType::Create, 2);
        summary.record(ActionType::NoOp, 5);
        assert!(summary.has_changes());
        assert_eq!(
            summary.to_string(),
            "2 created, 0 updated, 0 deleted, 5 unchanged"
        );
    }

    #[test]
    fn test_merge() {
        let mut a = SyncSummary {
            created: 1,
            ..Default::default()
        };
        let b = SyncSummary {
            deleted: 3,
            unchanged: 1,
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.created, 1);
        assert_eq!(a.deleted, 3);
        assert_eq!(a.unchanged, 1);
    }

    #[test]
    fn test_task_id_is_uuid() {
        let result = SyncResult::new(Vendor::Gcp, ResourceKind::Vpc, SyncSummary::default());
        assert!(uuid::Uuid::parse_str(&result.task_id).is_ok());
    }
}
