//! Mutation scheduler error types.

use thiserror::Error;

/// Contract violations in the scheduler's inputs.
///
/// Running out of budget is not an error; it is reported through
/// `PerformableChanges`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("group {group}: pod {pod} is scheduled for creation without a creation context")]
    MissingCreationContext { group: String, pod: String },

    #[error("group {group}: pod {pod} appears in more than one of keep/add/remove")]
    OverlappingChange { group: String, pod: String },

    #[error("pod {pod} is observed in more than one phase")]
    PodInSeveralPhases { pod: String },

    #[error("change budget {field} must not be negative (got {value})")]
    NegativeBudget { field: &'static str, value: i32 },
}

pub type MutationResult<T> = Result<T, MutationError>;
