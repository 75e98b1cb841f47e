use std::path::Path;

use anyhow::Context;
use rollgrid_core::RolloutPolicy;
use rollgrid_mutation::{ChangeSet, PerformableChanges, PodRestrictions, PodsState};
use serde::Deserialize;
use tracing::info;

/// Fleet-wide input of one reconciliation tick.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TickSnapshot {
    pub change_set: ChangeSet,
    pub pods_state: PodsState,
}

impl TickSnapshot {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        Ok(snapshot)
    }
}

/// Group the snapshot with the policy's definitions and run one
/// scheduling pass over it.
pub fn plan(policy: &RolloutPolicy, snapshot: &TickSnapshot) -> anyhow::Result<PerformableChanges> {
    let mut groups = snapshot
        .change_set
        .group(&policy.groups, &snapshot.pods_state);
    let mut restrictions = PodRestrictions::from_groups(policy.restrictions.clone(), &groups);
    let mut changes = PerformableChanges::default();

    groups.calculate_performable_changes(policy.budget, &mut restrictions, &mut changes)?;

    info!(
        creations = changes.schedule_for_creation.len(),
        deletions = changes.schedule_for_deletion.len(),
        blocked = changes.is_blocked(),
        "planned tick"
    );
    Ok(changes)
}

pub fn run(policy_path: &str, snapshot_path: &str, format: &str) -> anyhow::Result<()> {
    let policy = RolloutPolicy::from_file(Path::new(policy_path))
        .with_context(|| format!("loading policy {policy_path}"))?;
    let snapshot = TickSnapshot::from_file(Path::new(snapshot_path))?;
    let changes = plan(&policy, &snapshot)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&changes)?);
        }
        _ => {
            print!("{}", format_plan(&changes));
        }
    }

    Ok(())
}

pub fn format_plan(changes: &PerformableChanges) -> String {
    let mut out = String::new();

    if changes.is_empty() && !changes.is_blocked() {
        out.push_str("✓ Nothing to do\n");
        return out;
    }

    out.push_str(&format!(
        "Create ({}):\n",
        changes.schedule_for_creation.len()
    ));
    for c in &changes.schedule_for_creation {
        if c.pod_spec_context.template.is_empty() {
            out.push_str(&format!("  + {}\n", c.pod.name));
        } else {
            out.push_str(&format!(
                "  + {} (template {})\n",
                c.pod.name, c.pod_spec_context.template
            ));
        }
    }

    out.push_str(&format!(
        "Delete ({}):\n",
        changes.schedule_for_deletion.len()
    ));
    for pod in &changes.schedule_for_deletion {
        out.push_str(&format!("  - {}\n", pod.name));
    }

    if changes.is_blocked() {
        out.push_str("\nBlocked:\n");
        for group in &changes.max_surge_groups {
            out.push_str(&format!("  {group}: surge budget exhausted\n"));
        }
        for group in &changes.max_unavailable_groups {
            out.push_str(&format!("  {group}: unavailability budget exhausted\n"));
        }
        for r in &changes.restricted_deletions {
            out.push_str(&format!("  {}: {}\n", r.group, r.reason));
        }
    }

    out
}
