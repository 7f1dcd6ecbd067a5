//! Filesystem-backed workspace

use super::traits::{ResolveError, ResolveResult, WorkspaceResolver};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Name of the subdirectory that marks an IDE workspace
const METADATA_DIR: &str = ".metadata";

/// An IDE workspace directory and the projects in it.
///
/// Projects live at `<workspace>/<name>` unless listed in `project_paths`,
/// which may give an absolute or workspace-relative location.
#[derive(Debug, Clone)]
pub struct Workspace {
    workspace_dir: PathBuf,
    project_paths: HashMap<String, PathBuf>,
}

impl Workspace {
    /// Open a workspace; fails if `workspace_dir` is not an existing directory
    pub fn new(
        workspace_dir: impl AsRef<Path>,
        project_paths: HashMap<String, PathBuf>,
    ) -> ResolveResult<Self> {
        let dir = workspace_dir.as_ref();
        if !dir.is_dir() {
            return Err(ResolveError::WorkspaceNotFound(dir.to_path_buf()));
        }
        let workspace_dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };
        Ok(Self {
            workspace_dir,
            project_paths,
        })
    }

    /// Search `start` (or the current directory) and its ancestors for a
    /// directory containing a `.metadata` subdirectory.
    pub fn find(start: Option<&Path>) -> Option<PathBuf> {
        let start = match start {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().ok()?,
        };
        start
            .ancestors()
            .find(|dir| dir.join(METADATA_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Filesystem location of a project (not checked for existence)
    pub fn project_location(&self, project: &str) -> PathBuf {
        match self.project_paths.get(project) {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.workspace_dir.join(dir),
            None => self.workspace_dir.join(project),
        }
    }
}

impl WorkspaceResolver for Workspace {
    fn resolve(&self, logical_path: &str) -> ResolveResult<PathBuf> {
        let Some(rooted) = logical_path.strip_prefix('/') else {
            return Ok(PathBuf::from(logical_path));
        };
        let (project, rest) = rooted.split_once('/').unwrap_or((rooted, ""));
        let location = self.project_location(project);
        if !location.is_dir() {
            return Err(ResolveError::ProjectNotFound {
                project: project.to_string(),
                location,
            });
        }
        Ok(if rest.is_empty() {
            location
        } else {
            location.join(rest)
        })
    }
}
