//! Execution engine for icinga-users
//!
//! The engine orchestrates:
//! 1. Planning - Build fragment resources from a resolved run
//! 2. Diffing - Compute current vs desired state
//! 3. Executing - Apply changes in parallel

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, execute};
pub use planner::ExecutionPlan;
