//! rollgrid mutation scheduler — budget-constrained rollout decisions.
//!
//! Given, for every group of the fleet, the desired diff (`ChangeSet`) and
//! the observed pods (`PodsState`), this crate decides which creations and
//! deletions may be issued during the current reconciliation tick without
//! exceeding the `ChangeBudget`. It is a pure decision function: nothing is
//! persisted and no runtime API is contacted. The caller executes the
//! returned `PerformableChanges` and calls again on the next tick with
//! freshly observed state.
//!
//! # Components
//!
//! - **`pods_state`** — observed pods partitioned by lifecycle phase
//! - **`change_set`** — desired diff of a group (keep, add, remove)
//! - **`grouping`** — splits a fleet-wide diff into groups by label selector
//! - **`grouped`** — per-group stats, admission and simulation
//! - **`restrictions`** — cross-group constraints (protected roles)
//! - **`performable`** — the scheduler's output

pub mod change_set;
pub mod error;
pub mod grouped;
pub mod grouping;
pub mod performable;
pub mod pods_state;
pub mod restrictions;

pub use change_set::ChangeSet;
pub use error::{MutationError, MutationResult};
pub use grouped::{ChangeStats, GroupedChangeSet, GroupedChangeSets};
pub use grouping::UNMATCHED_GROUP_NAME;
pub use performable::{CreatablePod, PerformableChanges, RestrictedDeletion};
pub use pods_state::{PodPhase, PodsState, PodsStateSummary};
pub use restrictions::{PodRestrictions, RestrictionViolation};
