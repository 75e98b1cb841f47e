//! Cross-group pod restrictions.
//!
//! Some constraints span the whole fleet rather than a single group: the
//! scheduler must never delete the last running-ready pods of a protected
//! role (e.g. `role=master`), even when each group's own budget would
//! allow it. `PodRestrictions` is threaded by `&mut` through the groups in
//! order, so admissions in one group are visible to the next.

use std::collections::BTreeSet;

use rollgrid_core::{Pod, ProtectedRole};
use thiserror::Error;
use tracing::debug;

use crate::grouped::GroupedChangeSets;

/// A removal refused because it would break a protected role minimum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "removing pod {pod} would leave {remaining_after} running-ready {label}={value} pods, minimum is {min_remaining}"
)]
pub struct RestrictionViolation {
    pub pod: String,
    pub label: String,
    pub value: String,
    pub remaining_after: usize,
    pub min_remaining: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PodRestrictions {
    rules: Vec<ProtectedRole>,
    /// Running-ready members of each rule, same index as `rules`.
    remaining: Vec<BTreeSet<String>>,
}

impl PodRestrictions {
    /// Restrictions with no members observed yet.
    pub fn new(rules: Vec<ProtectedRole>) -> Self {
        let remaining = vec![BTreeSet::new(); rules.len()];
        Self { rules, remaining }
    }

    /// Restrictions seeded with the running-ready pods of every group.
    pub fn from_groups(rules: Vec<ProtectedRole>, groups: &GroupedChangeSets) -> Self {
        let mut restrictions = Self::new(rules);
        for group in groups.iter() {
            for pod in &group.pods_state.running_ready {
                restrictions.observe(pod);
            }
        }
        restrictions
    }

    /// Count `pod` as a running-ready member of every rule it matches.
    pub fn observe(&mut self, pod: &Pod) {
        for (rule, members) in self.rules.iter().zip(self.remaining.iter_mut()) {
            if pod.has_label(&rule.label, &rule.value) {
                members.insert(pod.name.clone());
            }
        }
    }

    /// Running-ready members left for the `label=value` rule.
    pub fn remaining(&self, label: &str, value: &str) -> Option<usize> {
        self.rules
            .iter()
            .position(|r| r.label == label && r.value == value)
            .map(|i| self.remaining[i].len())
    }

    pub fn can_remove(&self, pod: &Pod) -> Result<(), RestrictionViolation> {
        for (rule, members) in self.rules.iter().zip(self.remaining.iter()) {
            if !members.contains(&pod.name) {
                continue;
            }
            let remaining_after = members.len() - 1;
            if remaining_after < rule.min_remaining {
                return Err(RestrictionViolation {
                    pod: pod.name.clone(),
                    label: rule.label.clone(),
                    value: rule.value.clone(),
                    remaining_after,
                    min_remaining: rule.min_remaining,
                });
            }
        }
        Ok(())
    }

    /// Record that `pod` is being removed.
    pub fn remove(&mut self, pod: &Pod) {
        for (rule, members) in self.rules.iter().zip(self.remaining.iter_mut()) {
            if members.remove(&pod.name) {
                debug!(
                    pod = %pod.name,
                    role = %format!("{}={}", rule.label, rule.value),
                    remaining = members.len(),
                    "protected role member scheduled for removal"
                );
            }
        }
    }
}
