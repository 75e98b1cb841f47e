//! Observed pods of a group, partitioned by lifecycle phase.

use rollgrid_core::{Pod, PodSet};
use serde::{Deserialize, Serialize};

use crate::error::MutationError;

/// Lifecycle phase of an observed pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodPhase {
    /// Created, not running yet.
    Pending,
    /// Running and ready, but not yet part of the data-store cluster.
    RunningJoining,
    /// Healthy and serving.
    RunningReady,
    /// Running, cluster membership could not be determined.
    RunningUnknown,
    /// Phase could not be determined.
    Unknown,
    /// Succeeded or failed, still present.
    Terminal,
    /// Deletion requested, not gone yet.
    Deleting,
}

impl PodPhase {
    pub const ALL: [PodPhase; 7] = [
        PodPhase::Pending,
        PodPhase::RunningJoining,
        PodPhase::RunningReady,
        PodPhase::RunningUnknown,
        PodPhase::Unknown,
        PodPhase::Terminal,
        PodPhase::Deleting,
    ];
}

/// A group's observed pods. A pod name appears in at most one category.
///
/// `PodsState::default()` has every category present and empty. Use
/// [`PodsState::insert`] or [`PodsState::from_observed`] rather than
/// writing the categories directly; deserialization rejects a pod listed
/// in two categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ObservedCategories")]
pub struct PodsState {
    pub pending: PodSet,
    pub running_joining: PodSet,
    pub running_ready: PodSet,
    pub running_unknown: PodSet,
    pub unknown: PodSet,
    pub terminal: PodSet,
    pub deleting: PodSet,
}

/// Wire form of `PodsState`, checked for disjointness on conversion.
#[derive(Deserialize, Default)]
#[serde(default)]
struct ObservedCategories {
    pending: PodSet,
    running_joining: PodSet,
    running_ready: PodSet,
    running_unknown: PodSet,
    unknown: PodSet,
    terminal: PodSet,
    deleting: PodSet,
}

impl TryFrom<ObservedCategories> for PodsState {
    type Error = MutationError;

    fn try_from(raw: ObservedCategories) -> Result<Self, Self::Error> {
        let categories = [
            (PodPhase::Pending, raw.pending),
            (PodPhase::RunningJoining, raw.running_joining),
            (PodPhase::RunningReady, raw.running_ready),
            (PodPhase::RunningUnknown, raw.running_unknown),
            (PodPhase::Unknown, raw.unknown),
            (PodPhase::Terminal, raw.terminal),
            (PodPhase::Deleting, raw.deleting),
        ];

        let mut state = PodsState::default();
        for (phase, pods) in categories {
            for pod in Vec::<Pod>::from(pods) {
                if state.contains(&pod.name) {
                    return Err(MutationError::PodInSeveralPhases { pod: pod.name });
                }
                state.category_mut(phase).insert(pod);
            }
        }
        Ok(state)
    }
}

/// Per-phase pod counts, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodsStateSummary {
    pub pending: usize,
    pub running_joining: usize,
    pub running_ready: usize,
    pub running_unknown: usize,
    pub unknown: usize,
    pub terminal: usize,
    pub deleting: usize,
}

impl PodsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from observed `(pod, phase)` pairs. A pod observed
    /// twice ends up in the phase it was observed in last.
    pub fn from_observed<I>(observed: I) -> Self
    where
        I: IntoIterator<Item = (Pod, PodPhase)>,
    {
        let mut state = Self::default();
        for (pod, phase) in observed {
            state.insert(phase, pod);
        }
        state
    }

    pub fn category(&self, phase: PodPhase) -> &PodSet {
        match phase {
            PodPhase::Pending => &self.pending,
            PodPhase::RunningJoining => &self.running_joining,
            PodPhase::RunningReady => &self.running_ready,
            PodPhase::RunningUnknown => &self.running_unknown,
            PodPhase::Unknown => &self.unknown,
            PodPhase::Terminal => &self.terminal,
            PodPhase::Deleting => &self.deleting,
        }
    }

    fn category_mut(&mut self, phase: PodPhase) -> &mut PodSet {
        match phase {
            PodPhase::Pending => &mut self.pending,
            PodPhase::RunningJoining => &mut self.running_joining,
            PodPhase::RunningReady => &mut self.running_ready,
            PodPhase::RunningUnknown => &mut self.running_unknown,
            PodPhase::Unknown => &mut self.unknown,
            PodPhase::Terminal => &mut self.terminal,
            PodPhase::Deleting => &mut self.deleting,
        }
    }

    pub fn phase_of(&self, name: &str) -> Option<PodPhase> {
        PodPhase::ALL
            .into_iter()
            .find(|phase| self.category(*phase).contains(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.phase_of(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Pod> {
        PodPhase::ALL
            .into_iter()
            .find_map(|phase| self.category(phase).get(name))
    }

    pub fn count(&self, phase: PodPhase) -> usize {
        self.category(phase).len()
    }

    /// Total pods across all categories.
    pub fn current_pods_count(&self) -> usize {
        PodPhase::ALL.into_iter().map(|phase| self.count(phase)).sum()
    }

    pub fn running_ready_count(&self) -> usize {
        self.running_ready.len()
    }

    /// Place `pod` in `phase`, evicting it from whatever category held it.
    pub fn insert(&mut self, phase: PodPhase, pod: Pod) {
        self.remove(&pod.name);
        self.category_mut(phase).insert(pod);
    }

    pub fn remove(&mut self, name: &str) -> Option<(PodPhase, Pod)> {
        let phase = self.phase_of(name)?;
        self.category_mut(phase).remove(name).map(|pod| (phase, pod))
    }

    /// Every observed pod with its phase, phases in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PodPhase, &Pod)> {
        PodPhase::ALL
            .into_iter()
            .flat_map(move |phase| self.category(phase).iter().map(move |pod| (phase, pod)))
    }

    pub fn summary(&self) -> PodsStateSummary {
        PodsStateSummary {
            pending: self.pending.len(),
            running_joining: self.running_joining.len(),
            running_ready: self.running_ready.len(),
            running_unknown: self.running_unknown.len(),
            unknown: self.unknown.len(),
            terminal: self.terminal.len(),
            deleting: self.deleting.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed() -> PodsState {
        PodsState::from_observed(vec![
            (Pod::named("a"), PodPhase::RunningReady),
            (Pod::named("b"), PodPhase::Pending),
            (Pod::named("c"), PodPhase::Deleting),
            (Pod::named("d"), PodPhase::RunningReady),
        ])
    }

    #[test]
    fn default_has_empty_categories() {
        let state = PodsState::new();
        for phase in PodPhase::ALL {
            assert!(state.category(phase).is_empty());
        }
        assert_eq!(state.current_pods_count(), 0);
    }

    #[test]
    fn lookup_and_counts() {
        let state = observed();
        assert_eq!(state.phase_of("a"), Some(PodPhase::RunningReady));
        assert_eq!(state.phase_of("c"), Some(PodPhase::Deleting));
        assert_eq!(state.phase_of("z"), None);
        assert!(state.contains("b"));
        assert_eq!(state.count(PodPhase::RunningReady), 2);
        assert_eq!(state.running_ready_count(), 2);
        assert_eq!(state.current_pods_count(), 4);
    }

    #[test]
    fn insert_moves_between_categories() {
        let mut state = observed();
        state.insert(PodPhase::Deleting, Pod::named("a"));

        assert_eq!(state.phase_of("a"), Some(PodPhase::Deleting));
        assert!(!state.running_ready.contains("a"));
        assert_eq!(state.current_pods_count(), 4);
    }

    #[test]
    fn observed_twice_keeps_last_phase() {
        let state = PodsState::from_observed(vec![
            (Pod::named("a"), PodPhase::Pending),
            (Pod::named("a"), PodPhase::RunningReady),
        ]);
        assert_eq!(state.phase_of("a"), Some(PodPhase::RunningReady));
        assert_eq!(state.current_pods_count(), 1);
    }

    #[test]
    fn remove_reports_phase() {
        let mut state = observed();
        assert_eq!(
            state.remove("b"),
            Some((PodPhase::Pending, Pod::named("b")))
        );
        assert_eq!(state.remove("b"), None);
    }

    #[test]
    fn summary_counts_each_phase() {
        let summary = observed().summary();
        assert_eq!(summary.running_ready, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.deleting, 1);
        assert_eq!(summary.terminal, 0);
    }

    #[test]
    fn deserialization_rejects_pod_in_two_phases() {
        let err = serde_json::from_str::<PodsState>(
            r#"{"running_ready":[{"name":"a"}],"deleting":[{"name":"a"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("pod a is observed in more than one phase"));
    }

    #[test]
    fn deserialization_roundtrips_disjoint_state() {
        let state = observed();
        let json = serde_json::to_string(&state).unwrap();
        let back: PodsState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.current_pods_count(), 4);
    }

    #[test]
    fn deserializes_with_missing_categories() {
        let state: PodsState =
            serde_json::from_str(r#"{"running_ready":[{"name":"a"}]}"#).unwrap();
        assert_eq!(state.running_ready_count(), 1);
        assert!(state.deleting.is_empty());
        assert_eq!(state.iter().count(), 1);
    }
}
