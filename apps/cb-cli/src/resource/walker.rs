//! Project tree traversal

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::path::{classify, should_descend, Classification, ResourceId};
use crate::error::CliResult;

/// One classified file handed to a walk handler.
#[derive(Debug)]
pub struct WalkedFile<'a> {
    pub path: &'a Path,
    /// Slash-delimited path relative to the walk root.
    pub relative: &'a str,
    pub resource: &'a ResourceId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub matched: usize,
    pub unrecognized: usize,
}

/// Walks a project root, classifying every file it meets.
#[derive(Debug, Clone)]
pub struct AssetWalker {
    root: PathBuf,
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl AssetWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn enter(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        should_descend(&relative_path(&self.root, entry.path()))
    }

    /// Visit every recognised file under the root in file-name order.
    ///
    /// Directories that cannot hold a recognised file are not entered.
    /// The first handler error stops the walk.
    pub fn walk<F>(&self, mut handler: F) -> CliResult<WalkStats>
    where
        F: FnMut(WalkedFile<'_>) -> CliResult<()>,
    {
        let mut stats = WalkStats::default();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.enter(e))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(&self.root, entry.path());
            match classify(&relative) {
                Classification::Resource(resource) => {
                    stats.matched += 1;
                    tracing::trace!(path = %relative, %resource, "Classified file");
                    handler(WalkedFile {
                        path: entry.path(),
                        relative: &relative,
                        resource: &resource,
                    })?;
                }
                Classification::Unrecognized => {
                    stats.unrecognized += 1;
                    tracing::trace!(path = %relative, "Skipping unrecognized file");
                }
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            matched = stats.matched,
            unrecognized = stats.unrecognized,
            "Walked project tree"
        );
        Ok(stats)
    }
}
