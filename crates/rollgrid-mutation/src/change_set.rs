//! Desired diff of a group: pods to keep, add and remove.

use std::collections::BTreeMap;

use rollgrid_core::{Pod, PodSet, PodSpecContext};
use serde::{Deserialize, Serialize};

use crate::error::{MutationError, MutationResult};

/// The desired changes for a set of pods.
///
/// The three sets are disjoint and every pod in `to_add` has an entry in
/// `to_add_context`. Both invariants are checked by [`ChangeSet::validate`]
/// before the scheduler acts on a change set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeSet {
    /// Desired and already existing.
    pub to_keep: PodSet,
    /// Desired, not existing yet.
    pub to_add: PodSet,
    /// Creation context of each pod in `to_add`, by pod name.
    pub to_add_context: BTreeMap<String, PodSpecContext>,
    /// Existing, no longer desired.
    pub to_remove: PodSet,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep(mut self, pod: Pod) -> Self {
        self.to_keep.insert(pod);
        self
    }

    pub fn add(mut self, pod: Pod, context: PodSpecContext) -> Self {
        self.to_add_context.insert(pod.name.clone(), context);
        self.to_add.insert(pod);
        self
    }

    pub fn remove(mut self, pod: Pod) -> Self {
        self.to_remove.insert(pod);
        self
    }

    /// True if nothing has to be created or deleted.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Check the change set invariants, attributing errors to `group`.
    pub fn validate(&self, group: &str) -> MutationResult<()> {
        for name in self.to_add.names() {
            if self.to_keep.contains(name) || self.to_remove.contains(name) {
                return Err(MutationError::OverlappingChange {
                    group: group.to_string(),
                    pod: name.to_string(),
                });
            }
            if !self.to_add_context.contains_key(name) {
                return Err(MutationError::MissingCreationContext {
                    group: group.to_string(),
                    pod: name.to_string(),
                });
            }
        }
        if let Some(name) = self.to_keep.names().find(|n| self.to_remove.contains(n)) {
            return Err(MutationError::OverlappingChange {
                group: group.to_string(),
                pod: name.to_string(),
            });
        }
        Ok(())
    }
}
