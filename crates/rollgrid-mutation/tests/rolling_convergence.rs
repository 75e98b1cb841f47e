//! Cross-cutting scheduler properties, driven over several groups and
//! several reconciliation ticks.

use rollgrid_core::{ChangeBudget, GroupingDefinition, Pod, PodSpecContext};
use rollgrid_mutation::{
    ChangeSet, GroupedChangeSet, GroupedChangeSets, PerformableChanges, PodPhase,
    PodRestrictions, PodsState,
};

/// A group replacing `old` pods with `new` pods, all old pods ready.
fn replacement(group: &str, old: &[&str], new: &[&str]) -> GroupedChangeSet {
    let mut change_set = ChangeSet::new();
    for name in new {
        change_set = change_set.add(Pod::named(name), PodSpecContext::default());
    }
    for name in old {
        change_set = change_set.remove(Pod::named(name));
    }
    let pods_state = PodsState::from_observed(
        old.iter().map(|n| (Pod::named(n), PodPhase::RunningReady)),
    );
    GroupedChangeSet::new(group, GroupingDefinition::default(), change_set, pods_state)
}

fn fleet() -> Vec<GroupedChangeSet> {
    vec![
        replacement("zone-a", &["a-old-0", "a-old-1", "a-old-2"], &["a-new-0", "a-new-1", "a-new-2"]),
        replacement("zone-b", &["b-old-0", "b-old-1"], &["b-new-0", "b-new-1"]),
        replacement("zone-c", &["c-old-0"], &["c-new-0", "c-new-1"]),
    ]
}

/// `fleet()` plus a group whose removals include pods that are not
/// running-ready: one pending, one already deleting, one never observed.
fn mixed_fleet() -> Vec<GroupedChangeSet> {
    let change_set = ChangeSet::new()
        .keep(Pod::named("d-keep-0"))
        .add(Pod::named("d-new-0"), PodSpecContext::default())
        .remove(Pod::named("d-old-0"))
        .remove(Pod::named("d-old-1"))
        .remove(Pod::named("d-old-2"))
        .remove(Pod::named("d-old-3"))
        .remove(Pod::named("d-old-4"));
    let pods_state = PodsState::from_observed(vec![
        (Pod::named("d-keep-0"), PodPhase::RunningReady),
        (Pod::named("d-old-0"), PodPhase::RunningReady),
        (Pod::named("d-old-1"), PodPhase::Pending),
        (Pod::named("d-old-2"), PodPhase::Deleting),
        (Pod::named("d-old-3"), PodPhase::RunningReady),
    ]);

    let mut groups = fleet();
    groups.push(GroupedChangeSet::new(
        "zone-d",
        GroupingDefinition::default(),
        change_set,
        pods_state,
    ));
    groups
}

fn schedule(groups: &mut GroupedChangeSets, budget: ChangeBudget) -> PerformableChanges {
    let mut out = PerformableChanges::default();
    groups
        .calculate_performable_changes(budget, &mut PodRestrictions::default(), &mut out)
        .unwrap();
    out
}

/// Stand-in for the runtime between two ticks: pending pods become
/// ready, deleting pods disappear.
fn converge_runtime(groups: GroupedChangeSets) -> GroupedChangeSets {
    groups
        .into_inner()
        .into_iter()
        .map(|mut g| {
            g.pods_state.deleting = Default::default();
            let pending: Vec<Pod> = g.pods_state.pending.iter().cloned().collect();
            for pod in pending {
                g.pods_state.insert(PodPhase::RunningReady, pod);
            }
            g
        })
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn admitted_changes_never_exceed_desired_changes() {
    for surge in 0..4 {
        for unavailable in 0..4 {
            let input = mixed_fleet();
            let mut groups = GroupedChangeSets::from(input.clone());
            let out = schedule(&mut groups, ChangeBudget::new(surge, unavailable));

            for g in &input {
                let created = out
                    .schedule_for_creation
                    .iter()
                    .filter(|c| g.change_set.to_add.contains(&c.pod.name))
                    .count();
                let deleted = out
                    .schedule_for_deletion
                    .iter()
                    .filter(|p| g.change_set.to_remove.contains(&p.name))
                    .count();

                assert!(created <= g.change_set.to_add.len());
                assert!(deleted <= g.change_set.to_remove.len());

                // Capped iff not everything desired was admitted.
                assert_eq!(
                    out.max_surge_groups.contains(&g.name),
                    created < g.change_set.to_add.len(),
                    "surge marking for {} at budget ({surge}, {unavailable})",
                    g.name
                );
                assert_eq!(
                    out.max_unavailable_groups.contains(&g.name),
                    deleted < g.change_set.to_remove.len(),
                    "unavailability marking for {} at budget ({surge}, {unavailable})",
                    g.name
                );
            }
        }
    }
}

#[test]
fn larger_surge_budget_never_admits_fewer_creations() {
    for max_unavailable in 0..3 {
        let mut previous = 0;
        for max_surge in 0..6 {
            let mut groups = GroupedChangeSets::from(mixed_fleet());
            let out = schedule(&mut groups, ChangeBudget::new(max_surge, max_unavailable));
            let admitted = out.schedule_for_creation.len();

            assert!(admitted >= previous, "max_surge {max_surge}, max_unavailable {max_unavailable}");
            previous = admitted;
        }
    }
}

#[test]
fn larger_unavailability_budget_never_admits_fewer_deletions() {
    for max_surge in 0..3 {
        let mut previous = 0;
        for max_unavailable in 0..6 {
            let mut groups = GroupedChangeSets::from(mixed_fleet());
            let out = schedule(&mut groups, ChangeBudget::new(max_surge, max_unavailable));
            let admitted = out.schedule_for_deletion.len();

            assert!(admitted >= previous, "max_surge {max_surge}, max_unavailable {max_unavailable}");
            previous = admitted;
        }
    }
}

#[test]
fn only_running_ready_removals_are_admitted() {
    let mut groups = GroupedChangeSets::from(mixed_fleet());
    let out = schedule(&mut groups, ChangeBudget::new(5, 5));

    let deleted: Vec<&str> = out
        .schedule_for_deletion
        .iter()
        .map(|p| p.name.as_str())
        .filter(|n| n.starts_with("d-"))
        .collect();
    assert_eq!(deleted, vec!["d-old-0", "d-old-3"]);
    assert!(out.max_unavailable_groups.contains(&"zone-d".to_string()));
}

#[test]
fn identical_inputs_give_identical_decisions() {
    let budget = ChangeBudget::new(1, 1);
    let first = schedule(&mut GroupedChangeSets::from(fleet()), budget);
    let mut reversed_input = fleet();
    // Same pods, inserted in a different order.
    for g in &mut reversed_input {
        let pods: Vec<Pod> = g.change_set.to_remove.iter().rev().cloned().collect();
        g.change_set.to_remove = pods.into_iter().collect();
    }
    let second = schedule(&mut GroupedChangeSets::from(reversed_input), budget);

    assert_eq!(first, second);
}

#[test]
fn rolling_replacement_converges_within_budget() {
    let budget = ChangeBudget::new(1, 1);
    let mut groups = GroupedChangeSets::from(fleet());

    for _tick in 0..10 {
        let out = schedule(&mut groups, budget);

        for g in &groups {
            let stats = g.change_stats();
            assert!(stats.current_surge <= i64::from(budget.max_surge), "{}: {stats:?}", g.name);
            assert!(
                stats.current_unavailable <= i64::from(budget.max_unavailable),
                "{}: {stats:?}",
                g.name
            );
        }

        if out.is_empty() {
            break;
        }
        groups = converge_runtime(groups);
    }

    for g in &groups {
        assert!(g.change_set.is_empty(), "{} did not converge", g.name);
        assert!(g.pods_state.running_ready.names().all(|n| n.contains("-new-")));
        assert_eq!(
            g.pods_state.running_ready_count(),
            g.change_set.to_keep.len()
        );
    }
}
