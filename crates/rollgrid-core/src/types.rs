//! Shared types used across rollgrid crates.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use thiserror::Error;

/// A worker process observed in (or desired for) the fleet.
///
/// Pods are identified by name; two pods with the same name are the same
/// pod as far as scheduling is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Pod {
    /// A pod with the given name and no labels.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.get(key).is_some_and(|v| v == value)
    }
}

/// A set of pods keyed and ordered by name.
///
/// Iteration is always lexical by pod name. Serialized as a plain list of
/// pods; a list naming the same pod twice is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Pod>", into = "Vec<Pod>")]
pub struct PodSet(BTreeMap<String, Pod>);

impl PodSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pod, returning the previous pod with the same name.
    pub fn insert(&mut self, pod: Pod) -> Option<Pod> {
        self.0.insert(pod.name.clone(), pod)
    }

    pub fn remove(&mut self, name: &str) -> Option<Pod> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Pod> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pods in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, Pod> {
        self.0.values()
    }

    /// Pod names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// A pod name listed more than once where names must be unique.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("pod {0} is listed more than once")]
pub struct DuplicatePod(pub String);

impl TryFrom<Vec<Pod>> for PodSet {
    type Error = DuplicatePod;

    fn try_from(pods: Vec<Pod>) -> Result<Self, Self::Error> {
        let mut set = PodSet::new();
        for pod in pods {
            let name = pod.name.clone();
            if set.insert(pod).is_some() {
                return Err(DuplicatePod(name));
            }
        }
        Ok(set)
    }
}

impl From<PodSet> for Vec<Pod> {
    fn from(set: PodSet) -> Self {
        set.0.into_values().collect()
    }
}

/// Later pods replace earlier pods with the same name.
impl FromIterator<Pod> for PodSet {
    fn from_iter<I: IntoIterator<Item = Pod>>(iter: I) -> Self {
        Self(iter.into_iter().map(|p| (p.name.clone(), p)).collect())
    }
}

impl<'a> IntoIterator for &'a PodSet {
    type Item = &'a Pod;
    type IntoIter = btree_map::Values<'a, String, Pod>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}

/// Everything needed to materialize a pod that does not exist yet.
///
/// Opaque to the scheduler: it is carried from the desired diff to the
/// creation call untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpecContext {
    /// Name of the pod template the pod is rendered from.
    #[serde(default)]
    pub template: String,
    /// Hash of the configuration the pod must be started with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Limits on how far a rollout may deviate from the target topology.
///
/// Values are signed so that invalid (negative) configuration can be
/// represented and rejected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBudget {
    /// Extra pods allowed beyond the target count.
    pub max_surge: i32,
    /// Target pods allowed to be unavailable at the same time.
    pub max_unavailable: i32,
}

impl ChangeBudget {
    pub fn new(max_surge: i32, max_unavailable: i32) -> Self {
        Self {
            max_surge,
            max_unavailable,
        }
    }
}

impl Default for ChangeBudget {
    fn default() -> Self {
        Self {
            max_surge: 1,
            max_unavailable: 1,
        }
    }
}

/// Describes which pods belong to a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingDefinition {
    /// Equality-based label selector. Empty matches every pod.
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
}

impl GroupingDefinition {
    pub fn with_selector(pairs: &[(&str, &str)]) -> Self {
        Self {
            selector: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn matches(&self, pod: &Pod) -> bool {
        self.selector.iter().all(|(k, v)| pod.has_label(k, v))
    }
}
