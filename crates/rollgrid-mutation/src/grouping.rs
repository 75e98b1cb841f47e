//! Splitting a fleet-wide change set into groups.

use rollgrid_core::{GroupingDefinition, Pod};
use tracing::debug;

use crate::change_set::ChangeSet;
use crate::grouped::{GroupedChangeSet, GroupedChangeSets};
use crate::pods_state::PodsState;

/// Name of the trailing group collecting pods no definition matched.
pub const UNMATCHED_GROUP_NAME: &str = "unmatched";

/// Name of the group built from the definition at `index`.
pub fn group_name(index: usize) -> String {
    format!("group-{index}")
}

impl ChangeSet {
    /// Split this change set and the observed pods into one group per
    /// definition, plus a trailing [`UNMATCHED_GROUP_NAME`] group.
    ///
    /// Each pod goes to the first definition whose selector matches its
    /// labels. Creation contexts follow their pods.
    pub fn group(
        &self,
        definitions: &[GroupingDefinition],
        pods_state: &PodsState,
    ) -> GroupedChangeSets {
        let mut groups: Vec<GroupedChangeSet> = definitions
            .iter()
            .enumerate()
            .map(|(i, definition)| {
                GroupedChangeSet::new(
                    &group_name(i),
                    definition.clone(),
                    ChangeSet::default(),
                    PodsState::default(),
                )
            })
            .collect();
        groups.push(GroupedChangeSet::new(
            UNMATCHED_GROUP_NAME,
            GroupingDefinition::default(),
            ChangeSet::default(),
            PodsState::default(),
        ));

        let slot = |pod: &Pod| {
            definitions
                .iter()
                .position(|d| d.matches(pod))
                .unwrap_or(definitions.len())
        };

        for pod in &self.to_keep {
            groups[slot(pod)].change_set.to_keep.insert(pod.clone());
        }
        for pod in &self.to_add {
            let change_set = &mut groups[slot(pod)].change_set;
            change_set.to_add.insert(pod.clone());
            if let Some(context) = self.to_add_context.get(&pod.name) {
                change_set
                    .to_add_context
                    .insert(pod.name.clone(), context.clone());
            }
        }
        for pod in &self.to_remove {
            groups[slot(pod)].change_set.to_remove.insert(pod.clone());
        }
        for (phase, pod) in pods_state.iter() {
            groups[slot(pod)].pods_state.insert(phase, pod.clone());
        }

        for group in &groups {
            debug!(
                group = %group.name,
                to_keep = group.change_set.to_keep.len(),
                to_add = group.change_set.to_add.len(),
                to_remove = group.change_set.to_remove.len(),
                observed = group.pods_state.current_pods_count(),
                "grouped changes"
            );
        }

        GroupedChangeSets::from(groups)
    }
}
