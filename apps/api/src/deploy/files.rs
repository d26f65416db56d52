//! Deduplicated file sets. A path is the unique key; the last write wins and
//! keeps the position of the first insertion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Directory GitHub Actions reads workflow definitions from.
pub const WORKFLOW_DIR: &str = ".github/workflows/";
/// Reserved path of the Pages deployment workflow.
pub const WORKFLOW_PATH: &str = ".github/workflows/deploy.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub content: String,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn is_workflow(&self) -> bool {
        self.path.starts_with(WORKFLOW_DIR)
    }
}

/// Repository-relative form of a path: leading, trailing and repeated
/// slashes are dropped.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, Default)]
pub struct FileSet {
    entries: Vec<FileEntry>,
    index: HashMap<String, usize>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a file. Paths that normalize to nothing are ignored.
    /// Returns `true` when the path was not present before.
    pub fn insert(&mut self, path: &str, content: impl Into<String>) -> bool {
        let path = normalize_path(path);
        if path.is_empty() {
            return false;
        }
        let content = content.into();

        match self.index.get(&path) {
            Some(&i) => {
                self.entries[i].content = content;
                false
            }
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push(FileEntry::new(path, content));
                true
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.index
            .get(&normalize_path(path))
            .map(|&i| self.entries[i].content.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }

    /// Splits into regular files and workflow files. The reserved workflow,
    /// when present, is always the last workflow entry.
    pub fn into_upload_plan(self) -> UploadPlan {
        let (mut workflows, files): (Vec<_>, Vec<_>) =
            self.entries.into_iter().partition(FileEntry::is_workflow);

        if let Some(pos) = workflows.iter().position(|f| f.path == WORKFLOW_PATH) {
            let reserved = workflows.remove(pos);
            workflows.push(reserved);
        }

        UploadPlan { files, workflows }
    }
}

impl Extend<FileEntry> for FileSet {
    fn extend<I: IntoIterator<Item = FileEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(&entry.path, entry.content);
        }
    }
}

impl FromIterator<FileEntry> for FileSet {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut set = FileSet::new();
        set.extend(iter);
        set
    }
}

/// Files grouped by upload phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPlan {
    /// Everything outside `.github/workflows/`, in insertion order.
    pub files: Vec<FileEntry>,
    /// Workflow definitions, pushed after Actions has been provisioned.
    pub workflows: Vec<FileEntry>,
}
