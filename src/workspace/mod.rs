//! Mapping workspace paths to filesystem paths
//!
//! Analysis inputs are workspace paths: `/Project/results/*.sca` names a
//! directory inside project `Project`, while paths without a leading `/`
//! are relative to the current working directory.

mod filesystem;
mod traits;

pub use filesystem::Workspace;
pub use traits::{ResolveError, ResolveResult, WorkspaceResolver};
