use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::path::PagePath;
use crate::site::NavItem;
use crate::store::PAGE_HTML;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Top-level entries of the uploads root, keyed by `/<name>`.
pub type Structure = BTreeMap<String, StructureNode>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StructureNode {
    /// A page. `contents` lists pages nested below it, if any.
    File {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        contents: Vec<String>,
    },
    /// A folder of pages with no page of its own.
    Directory { contents: Vec<String> },
}

impl StructureNode {
    pub fn contents(&self) -> &[String] {
        match self {
            StructureNode::File { contents } | StructureNode::Directory { contents } => contents,
        }
    }
}

pub struct StructureScanner {
    root: PathBuf,
}

impl StructureScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            root: path.as_ref().to_path_buf(),
        }
    }

    pub fn scan(&self) -> Result<Structure, ScanError> {
        let mut structure = Structure::new();

        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "uploads root missing, structure is empty");
            return Ok(structure);
        }

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if !path.is_dir() || name.starts_with('.') {
                continue;
            }

            let contents = descendant_pages(&path)?;
            let node = if path.join(PAGE_HTML).is_file() {
                StructureNode::File { contents }
            } else if !contents.is_empty() {
                StructureNode::Directory { contents }
            } else {
                continue;
            };

            structure.insert(format!("/{name}"), node);
        }

        tracing::debug!(entries = structure.len(), "scanned page structure");
        Ok(structure)
    }
}

/// Relative `/`-joined paths of every directory below `dir` holding a page.
fn descendant_pages(dir: &Path) -> Result<Vec<String>, ScanError> {
    let mut pages = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if !entry.file_type().is_dir() || !entry.path().join(PAGE_HTML).is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };

        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        pages.push(joined);
    }

    pages.sort();
    Ok(pages)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Flatten a structure into links. `section` keeps a single top-level entry.
pub fn navigation(structure: &Structure, section: Option<&str>) -> Vec<NavItem> {
    let mut items = Vec::new();

    for (key, node) in structure {
        let name = key.trim_start_matches('/');
        if section.is_some_and(|s| s.trim_matches('/') != name) {
            continue;
        }

        if matches!(node, StructureNode::File { .. }) && name != PagePath::INDEX {
            items.push(NavItem {
                text: name.to_string(),
                link: format!("/page/{name}"),
            });
        }

        for child in node.contents() {
            let text = child.rsplit('/').next().unwrap_or(child);
            items.push(NavItem {
                text: text.to_string(),
                link: format!("/page/{name}/{child}"),
            });
        }
    }

    items
}
