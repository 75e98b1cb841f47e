pub mod config;
pub mod types;

pub use config::{ProtectedRole, RolloutPolicy};
pub use types::*;
