//! The scheduler's output for one reconciliation tick.

use rollgrid_core::{Pod, PodSpecContext};
use serde::{Deserialize, Serialize};

/// A pod admitted for creation, with what is needed to create it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatablePod {
    pub pod: Pod,
    pub pod_spec_context: PodSpecContext,
}

/// A removal held back by a pod restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedDeletion {
    pub group: String,
    pub pod: String,
    pub reason: String,
}

/// Changes that may be issued right now.
///
/// `max_surge_groups` and `max_unavailable_groups` name the groups whose
/// desired creations (resp. deletions) did not all fit in the budget this
/// tick. Each name appears at most once, in group processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformableChanges {
    pub schedule_for_creation: Vec<CreatablePod>,
    pub schedule_for_deletion: Vec<Pod>,
    pub max_surge_groups: Vec<String>,
    pub max_unavailable_groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub restricted_deletions: Vec<RestrictedDeletion>,
}

impl PerformableChanges {
    /// True if nothing is to be created or deleted.
    pub fn is_empty(&self) -> bool {
        self.schedule_for_creation.is_empty() && self.schedule_for_deletion.is_empty()
    }

    /// True if some group could not make all of its desired changes.
    pub fn is_blocked(&self) -> bool {
        !self.max_surge_groups.is_empty()
            || !self.max_unavailable_groups.is_empty()
            || !self.restricted_deletions.is_empty()
    }

    pub(crate) fn mark_max_surge(&mut self, group: &str) {
        if !self.max_surge_groups.iter().any(|g| g == group) {
            self.max_surge_groups.push(group.to_string());
        }
    }

    pub(crate) fn mark_max_unavailable(&mut self, group: &str) {
        if !self.max_unavailable_groups.iter().any(|g| g == group) {
            self.max_unavailable_groups.push(group.to_string());
        }
    }

    /// Append everything from `other`, keeping group names unique.
    pub fn merge(&mut self, other: PerformableChanges) {
        self.schedule_for_creation.extend(other.schedule_for_creation);
        self.schedule_for_deletion.extend(other.schedule_for_deletion);
        for group in &other.max_surge_groups {
            self.mark_max_surge(group);
        }
        for group in &other.max_unavailable_groups {
            self.mark_max_unavailable(group);
        }
        self.restricted_deletions.extend(other.restricted_deletions);
    }
}
