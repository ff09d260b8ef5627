//! Filesystem adapters for docbot.
//!
//! Implements the `DocumentStore` trait from `docbot-core` over project
//! directories on local disk. Only markdown files are part of the corpus;
//! hidden files and directories are skipped.
//!
//! An optional shared-docs directory is exposed as one more project whose
//! corpus is only its top-level markdown files, minus an exclusion list.

pub mod atomic;

use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use docbot_core::store::DocumentStore;
use docbot_types::error::StoreError;
use docbot_types::project::Project;

use self::atomic::atomic_write;

const DOCUMENT_EXTENSION: &str = "md";

/// Local filesystem implementation of the `DocumentStore` trait.
///
/// Reads go through `tokio::fs`; directory walks run on the blocking pool.
/// Writes are atomic (temp file in the target directory, then rename).
pub struct LocalDocumentStore {
    projects: Vec<Project>,
    shared: Option<SharedDocs>,
}

/// Top-level documents of a directory, served under their own project id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedDocs {
    pub project: Project,
    /// File names left out of the corpus (exact match).
    pub exclude: Vec<String>,
}

impl SharedDocs {
    fn is_excluded(&self, name: &str) -> bool {
        self.exclude.iter().any(|e| e == name)
    }
}

impl LocalDocumentStore {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            shared: None,
        }
    }

    /// Serve `shared` alongside the configured projects.
    pub fn with_shared(mut self, shared: SharedDocs) -> Self {
        self.projects.push(shared.project.clone());
        self.shared = Some(shared);
        self
    }

    fn shared_for(&self, project: &str) -> Option<&SharedDocs> {
        self.shared.as_ref().filter(|s| s.project.id == project)
    }

    fn root(&self, project: &str) -> Result<&Path, StoreError> {
        self.projects
            .iter()
            .find(|p| p.id == project)
            .map(|p| p.root.as_path())
            .ok_or_else(|| StoreError::UnknownProject(project.to_string()))
    }

    /// Join a relative document path onto the project root, refusing
    /// anything that could escape it.
    fn resolve(&self, project: &str, path: &str) -> Result<PathBuf, StoreError> {
        let root = self.root(project)?;
        let relative = Path::new(path);
        // `Path::components` silently drops interior `.` and repeated
        // separators, so check the raw segments too: one file, one spelling.
        let is_plain = !path.is_empty()
            && path
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StoreError::InvalidPath(format!("{project}/{path}")));
        }
        if let Some(shared) = self.shared_for(project) {
            // Subdirectories of the shared root belong to other projects.
            if path.contains('/') {
                return Err(StoreError::InvalidPath(format!("{project}/{path}")));
            }
            if shared.is_excluded(path) {
                return Err(StoreError::NotFound(format!("{project}/{path}")));
            }
        }
        Ok(root.join(relative))
    }
}

impl DocumentStore for LocalDocumentStore {
    fn projects(&self) -> &[Project] {
        &self.projects
    }

    async fn list_documents(&self, project: &str) -> Result<Vec<String>, StoreError> {
        let root = self.root(project)?.to_path_buf();
        if !tokio::fs::try_exists(&root).await.unwrap_or(false) {
            tracing::debug!(project, root = %root.display(), "project root does not exist");
            return Ok(Vec::new());
        }

        let (max_depth, exclude) = match self.shared_for(project) {
            Some(shared) => (1, shared.exclude.clone()),
            None => (usize::MAX, Vec::new()),
        };
        let mut paths = tokio::task::spawn_blocking(move || list_markdown(&root, max_depth))
            .await
            .map_err(|e| StoreError::Io(format!("directory walk panicked: {e}")))?;
        paths.retain(|p| !exclude.contains(p));
        Ok(paths)
    }

    async fn read(&self, project: &str, path: &str) -> Result<String, StoreError> {
        let full = self.resolve(project, path)?;
        tokio::fs::read_to_string(&full).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(format!("{project}/{path}"))
            } else {
                StoreError::Io(format!("{}: {e}", full.display()))
            }
        })
    }

    async fn write(&self, project: &str, path: &str, content: &str) -> Result<(), StoreError> {
        let full = self.resolve(project, path)?;
        atomic_write(&full, content)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", full.display())))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Sorted `/`-separated paths of every markdown file under `root`, at most
/// `max_depth` levels deep.
fn list_markdown(root: &Path, max_depth: usize) -> Vec<String> {
    let mut paths: Vec<String> = WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        })
        .filter_map(|e| {
            let relative = e.path().strip_prefix(root).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
        .collect();
    paths.sort();
    paths
}
