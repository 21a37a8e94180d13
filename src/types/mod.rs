// ABOUTME: Validated domain types shared across config and pipeline.
// ABOUTME: Service names, branch names and run identifiers.

mod branch_name;
mod run_id;
mod service_name;

pub use branch_name::{BranchName, BranchNameError};
pub use run_id::RunId;
pub use service_name::{ServiceName, ServiceNameError};
