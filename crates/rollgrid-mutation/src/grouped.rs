//! Per-group admission control.
//!
//! Each group is evaluated against the change budget using its own
//! `ChangeStats`:
//!
//! ```text
//! target_pods         = |to_keep| + |to_add|
//! current_pods        = all observed pods, any phase
//! current_surge       = current_pods - target_pods
//! current_unavailable = max(target_pods - running_ready, 0)
//!
//! creations admitted  = min(|to_add|, max(max_surge - current_surge, 0))
//! deletions admitted  = min(|ready ∩ to_remove|, max(max_unavailable - current_unavailable, 0))
//! ```
//!
//! Pods are admitted in name order. Only running-ready pods are admitted
//! for deletion. A group is capped when fewer pods are admitted than its
//! `to_add` (resp. `to_remove`) holds. Groups are processed in collection
//! order, and each group's admitted changes are simulated on its own state
//! and reported to the shared `PodRestrictions` before the next group is
//! evaluated.

use rollgrid_core::{ChangeBudget, GroupingDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::change_set::ChangeSet;
use crate::error::{MutationError, MutationResult};
use crate::performable::{CreatablePod, PerformableChanges, RestrictedDeletion};
use crate::pods_state::{PodPhase, PodsState};
use crate::restrictions::PodRestrictions;

/// Current versus target pod counts of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStats {
    pub target_pods: i64,
    pub current_pods: i64,
    pub current_running_ready_pods: i64,
    /// Pods beyond the target. Negative while the group is below target.
    pub current_surge: i64,
    /// Target pods not running-ready, floored at zero.
    pub current_unavailable: i64,
}

/// A group of the fleet with its desired changes and observed pods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedChangeSet {
    pub name: String,
    #[serde(default)]
    pub definition: GroupingDefinition,
    #[serde(default)]
    pub change_set: ChangeSet,
    #[serde(default)]
    pub pods_state: PodsState,
}

impl GroupedChangeSet {
    pub fn new(
        name: &str,
        definition: GroupingDefinition,
        change_set: ChangeSet,
        pods_state: PodsState,
    ) -> Self {
        Self {
            name: name.to_string(),
            definition,
            change_set,
            pods_state,
        }
    }

    pub fn change_stats(&self) -> ChangeStats {
        let target_pods = (self.change_set.to_keep.len() + self.change_set.to_add.len()) as i64;
        let current_pods = self.pods_state.current_pods_count() as i64;
        let current_running_ready_pods = self.pods_state.running_ready_count() as i64;

        ChangeStats {
            target_pods,
            current_pods,
            current_running_ready_pods,
            current_surge: current_pods - target_pods,
            current_unavailable: (target_pods - current_running_ready_pods).max(0),
        }
    }

    /// Decide which of this group's changes fit in `budget` right now.
    ///
    /// Admitted deletions are reported to `restrictions`. The group's own
    /// state is left untouched; see
    /// [`GroupedChangeSet::simulate_performable_changes_applied`].
    pub fn calculate_performable_changes(
        &self,
        budget: ChangeBudget,
        restrictions: &mut PodRestrictions,
    ) -> MutationResult<PerformableChanges> {
        check_budget(budget)?;
        self.admit(budget, restrictions)
    }

    /// Admission for a budget already known to be valid.
    fn admit(
        &self,
        budget: ChangeBudget,
        restrictions: &mut PodRestrictions,
    ) -> MutationResult<PerformableChanges> {
        self.change_set.validate(&self.name)?;

        let stats = self.change_stats();
        let mut changes = PerformableChanges::default();

        debug!(
            group = %self.name,
            target = stats.target_pods,
            current = stats.current_pods,
            ready = stats.current_running_ready_pods,
            surge = stats.current_surge,
            unavailable = stats.current_unavailable,
            to_add = self.change_set.to_add.len(),
            to_remove = self.change_set.to_remove.len(),
            "evaluating group"
        );

        // Creations, bounded by the surge budget.
        let surge_room = i64::from(budget.max_surge) - stats.current_surge;
        let creatable = usize::try_from(surge_room)
            .unwrap_or(0)
            .min(self.change_set.to_add.len());

        for pod in self.change_set.to_add.iter().take(creatable) {
            let pod_spec_context = self
                .change_set
                .to_add_context
                .get(&pod.name)
                .cloned()
                .ok_or_else(|| MutationError::MissingCreationContext {
                    group: self.name.clone(),
                    pod: pod.name.clone(),
                })?;
            changes.schedule_for_creation.push(CreatablePod {
                pod: pod.clone(),
                pod_spec_context,
            });
        }

        if creatable < self.change_set.to_add.len() {
            debug!(
                group = %self.name,
                admitted = creatable,
                desired = self.change_set.to_add.len(),
                "surge budget exhausted"
            );
            changes.mark_max_surge(&self.name);
        }

        // Deletions, bounded by the unavailability budget and restrictions.
        // Only running-ready pods are admitted: deleting pods are already in
        // flight, and other phases wait until they become ready.
        let unavailable_room = i64::from(budget.max_unavailable) - stats.current_unavailable;
        let deletable = usize::try_from(unavailable_room).unwrap_or(0);

        for pod in &self.change_set.to_remove {
            if changes.schedule_for_deletion.len() >= deletable {
                break;
            }
            if !self.pods_state.running_ready.contains(&pod.name) {
                debug!(
                    group = %self.name,
                    pod = %pod.name,
                    phase = ?self.pods_state.phase_of(&pod.name),
                    "pod not running-ready, not admitted for deletion"
                );
                continue;
            }
            if let Err(violation) = restrictions.can_remove(pod) {
                warn!(group = %self.name, pod = %pod.name, %violation, "deletion restricted");
                changes.restricted_deletions.push(RestrictedDeletion {
                    group: self.name.clone(),
                    pod: pod.name.clone(),
                    reason: violation.to_string(),
                });
                continue;
            }
            restrictions.remove(pod);
            changes.schedule_for_deletion.push(pod.clone());
        }

        if changes.schedule_for_deletion.len() < self.change_set.to_remove.len() {
            debug!(
                group = %self.name,
                admitted = changes.schedule_for_deletion.len(),
                desired = self.change_set.to_remove.len(),
                "unavailability budget exhausted"
            );
            changes.mark_max_unavailable(&self.name);
        }

        Ok(changes)
    }

    /// Project admitted changes onto this group's state as if they had
    /// been issued.
    ///
    /// Deleted pods leave `to_remove` and move to `Deleting`; created pods
    /// move from `to_add` to `to_keep` and appear as `Pending`. Changes for
    /// pods unknown to this group are ignored.
    pub fn simulate_performable_changes_applied(&mut self, changes: &PerformableChanges) {
        for pod in &changes.schedule_for_deletion {
            let removed = self.change_set.to_remove.remove(&pod.name);
            if removed.is_none() && !self.pods_state.contains(&pod.name) {
                continue;
            }
            let observed = self
                .pods_state
                .remove(&pod.name)
                .map(|(_, observed)| observed);
            self.pods_state
                .insert(PodPhase::Deleting, observed.unwrap_or_else(|| pod.clone()));
        }

        for creatable in &changes.schedule_for_creation {
            let name = &creatable.pod.name;
            let Some(pod) = self.change_set.to_add.remove(name) else {
                continue;
            };
            self.change_set.to_add_context.remove(name);
            self.change_set.to_keep.insert(pod.clone());
            self.pods_state.insert(PodPhase::Pending, pod);
        }
    }

    /// Snapshot variant of
    /// [`GroupedChangeSet::simulate_performable_changes_applied`].
    pub fn with_performable_changes_applied(&self, changes: &PerformableChanges) -> Self {
        let mut next = self.clone();
        next.simulate_performable_changes_applied(changes);
        next
    }
}

/// Groups in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedChangeSets(Vec<GroupedChangeSet>);

impl GroupedChangeSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: GroupedChangeSet) {
        self.0.push(group);
    }

    pub fn get(&self, name: &str) -> Option<&GroupedChangeSet> {
        self.0.iter().find(|g| g.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupedChangeSet> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<GroupedChangeSet> {
        self.0
    }

    /// Run admission control over every group, in order, appending the
    /// admitted changes to `out`.
    ///
    /// Stops at the first group with invalid input. Groups processed
    /// before it keep their entries in `out` (and their simulated state);
    /// nothing of the failing group is committed.
    pub fn calculate_performable_changes(
        &mut self,
        budget: ChangeBudget,
        restrictions: &mut PodRestrictions,
        out: &mut PerformableChanges,
    ) -> MutationResult<()> {
        check_budget(budget)?;

        for group in &mut self.0 {
            let changes = match group.admit(budget, restrictions) {
                Ok(changes) => changes,
                Err(e) => {
                    warn!(group = %group.name, error = %e, "invalid change set, halting");
                    return Err(e);
                }
            };
            group.simulate_performable_changes_applied(&changes);
            out.merge(changes);
        }

        info!(
            groups = self.0.len(),
            creations = out.schedule_for_creation.len(),
            deletions = out.schedule_for_deletion.len(),
            max_surge_groups = out.max_surge_groups.len(),
            max_unavailable_groups = out.max_unavailable_groups.len(),
            "calculated performable changes"
        );
        Ok(())
    }
}

impl From<Vec<GroupedChangeSet>> for GroupedChangeSets {
    fn from(groups: Vec<GroupedChangeSet>) -> Self {
        Self(groups)
    }
}

impl<'a> IntoIterator for &'a GroupedChangeSets {
    type Item = &'a GroupedChangeSet;
    type IntoIter = std::slice::Iter<'a, GroupedChangeSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn check_budget(budget: ChangeBudget) -> MutationResult<()> {
    if budget.max_surge < 0 {
        return Err(MutationError::NegativeBudget {
            field: "max_surge",
            value: budget.max_surge,
        });
    }
    if budget.max_unavailable < 0 {
        return Err(MutationError::NegativeBudget {
            field: "max_unavailable",
            value: budget.max_unavailable,
        });
    }
    Ok(())
}
