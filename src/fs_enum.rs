use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::filter::FileFilter;
// Source tree enumeration

/// One enumerated item of the source tree
#[derive(Debug, Clone)]
pub struct LocalEntry {
    pub path: PathBuf,
    /// Path relative to the source root, always `/`-separated
    pub rel_path: String,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub is_directory: bool,
}

/// Filtered view of the source tree, parents before children
#[derive(Debug, Default)]
pub struct LocalTree {
    pub dirs: Vec<LocalEntry>,
    pub files: Vec<LocalEntry>,
    /// Files dropped by the filter
    pub filtered: u64,
}

impl LocalTree {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Relative `/` path of `path` under `root`, None for the root itself
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Walk `root` and apply `filter`. Excluded directories are not descended into.
pub fn enumerate_source(root: &Path, filter: &FileFilter) -> Result<LocalTree> {
    let mut tree = LocalTree::default();
    let mut pruned: Vec<PathBuf> = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // Skip excluded directories entirely - this prevents walking into them
            if !e.file_type().is_dir() {
                return true;
            }
            let keep = relative_slash_path(root, e.path())
                .map(|rel| filter.should_include_dir(&rel))
                .unwrap_or(true);
            if !keep {
                pruned.push(e.path().to_path_buf());
            }
            keep
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let Some(rel_path) = relative_slash_path(root, entry.path()) else {
            continue;
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            tree.dirs.push(LocalEntry {
                path: entry.path().to_path_buf(),
                rel_path,
                size: 0,
                modified: None,
                is_directory: true,
            });
        } else if file_type.is_file() {
            if !filter.should_include_file(&rel_path) {
                tree.filtered += 1;
                continue;
            }
            let metadata = entry
                .metadata()
                .with_context(|| format!("Failed to read metadata of {}", entry.path().display()))?;
            tree.files.push(LocalEntry {
                path: entry.path().to_path_buf(),
                rel_path,
                size: metadata.len(),
                modified: metadata.modified().ok(),
                is_directory: false,
            });
        }
        // Symlinks and special files are not deployed
    }

    for dir in &pruned {
        tree.filtered += count_files(dir)?;
    }

    Ok(tree)
}

/// Regular files below an excluded directory, for the filtered count
fn count_files(dir: &Path) -> Result<u64> {
    let mut count = 0;
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}
