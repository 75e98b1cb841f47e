//! Rollout policy file parser.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::types::{ChangeBudget, GroupingDefinition};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RolloutPolicy {
    #[serde(default)]
    pub budget: ChangeBudget,
    /// Grouping definitions, in processing order.
    #[serde(default)]
    pub groups: Vec<GroupingDefinition>,
    #[serde(default)]
    pub restrictions: Vec<ProtectedRole>,
}

/// Pods labelled `label=value` that must keep at least `min_remaining`
/// running-ready members across the whole fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedRole {
    pub label: String,
    pub value: String,
    #[serde(default = "default_min_remaining")]
    pub min_remaining: usize,
}

fn default_min_remaining() -> usize {
    1
}

impl RolloutPolicy {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a policy.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let policy: RolloutPolicy = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.budget.max_surge < 0 {
            bail!("budget.max_surge must not be negative (got {})", self.budget.max_surge);
        }
        if self.budget.max_unavailable < 0 {
            bail!(
                "budget.max_unavailable must not be negative (got {})",
                self.budget.max_unavailable
            );
        }

        let mut seen = BTreeSet::new();
        for role in &self.restrictions {
            if role.label.is_empty() {
                bail!("protected role with value {:?} has an empty label", role.value);
            }
            if !seen.insert((role.label.as_str(), role.value.as_str())) {
                bail!("protected role {}={} declared twice", role.label, role.value);
            }
        }
        Ok(())
    }
}
