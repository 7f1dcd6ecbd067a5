//! Resolver trait definitions

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving workspace paths
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Workspace directory doesn't exist, or is not a directory: {}", .0.display())]
    WorkspaceNotFound(PathBuf),

    #[error("Directory for project {project} doesn't exist (workspace dir not specified?): {}", .location.display())]
    ProjectNotFound { project: String, location: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Maps logical (workspace) paths to filesystem paths
pub trait WorkspaceResolver {
    /// Translate a workspace path into a filesystem path
    fn resolve(&self, logical_path: &str) -> ResolveResult<PathBuf>;
}

impl<R: WorkspaceResolver + ?Sized> WorkspaceResolver for &R {
    fn resolve(&self, logical_path: &str) -> ResolveResult<PathBuf> {
        (**self).resolve(logical_path)
    }
}
