//! # Brain Layout
//!
//! Path conventions of a brain root and recursive shard discovery.

use crate::CortexError;
use crate::primitives::{
    ENTITIES_DIR, KNOWLEDGE_DIR, RELATIONS_DIR, RELATION_SHARD_PATTERN, SHARD_EXTENSION,
    SNAPSHOT_FILE,
};
use chrono::NaiveDate;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Resolved paths of one brain root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Create a layout rooted at `root`. Nothing is touched on disk.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn knowledge_dir(&self) -> PathBuf {
        self.root.join(KNOWLEDGE_DIR)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.knowledge_dir().join(SNAPSHOT_FILE)
    }

    #[must_use]
    pub fn entities_dir(&self) -> PathBuf {
        self.knowledge_dir().join(ENTITIES_DIR)
    }

    #[must_use]
    pub fn relations_dir(&self) -> PathBuf {
        self.knowledge_dir().join(RELATIONS_DIR)
    }

    /// Shard file for an entity category.
    ///
    /// `concepts` maps to `entities/concepts.jsonl`; a name already ending in
    /// `.jsonl` is used as is. Nested relative names are allowed, absolute
    /// paths and `..` are not.
    pub fn entity_shard_path(&self, category: &str) -> Result<PathBuf, CortexError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(CortexError::entity_schema("category must not be empty"));
        }

        let relative = Path::new(category);
        let is_plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(CortexError::entity_schema(format!(
                "category '{}' must be a relative shard name",
                category
            )));
        }

        let has_extension = relative
            .extension()
            .is_some_and(|ext| ext == SHARD_EXTENSION);
        let file_name = if has_extension {
            category.to_string()
        } else {
            format!("{}.{}", category, SHARD_EXTENSION)
        };

        Ok(self.entities_dir().join(file_name))
    }

    /// Time-sharded relation log for the month containing `date`.
    #[must_use]
    pub fn relation_shard_path(&self, date: NaiveDate) -> PathBuf {
        let month = date.format(RELATION_SHARD_PATTERN);
        self.relations_dir()
            .join(format!("{}.{}", month, SHARD_EXTENSION))
    }

    /// All entity shard files, sorted by path.
    pub fn entity_shards(&self) -> Result<Vec<PathBuf>, CortexError> {
        discover_shards(&self.entities_dir())
    }

    /// All relation shard files, sorted by path.
    pub fn relation_shards(&self) -> Result<Vec<PathBuf>, CortexError> {
        discover_shards(&self.relations_dir())
    }
}

/// Recursively collect `*.jsonl` files below `dir`.
///
/// A missing directory yields no shards. Any other traversal failure
/// (permissions, broken mounts) is an I/O error.
fn discover_shards(dir: &Path) -> Result<Vec<PathBuf>, CortexError> {
    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "shard directory absent");
        return Ok(Vec::new());
    }

    let mut shards = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| {
            CortexError::IoError(format!("Cannot scan '{}': {}", dir.display(), e))
        })?;

        let is_shard = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == SHARD_EXTENSION);
        if is_shard {
            shards.push(entry.into_path());
        }
    }

    shards.sort();
    tracing::debug!(dir = %dir.display(), count = shards.len(), "discovered shards");
    Ok(shards)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn category_gets_extension_once() {
        let layout = Layout::new("/brain");
        assert_eq!(
            layout.entity_shard_path("concepts").expect("path"),
            PathBuf::from("/brain/knowledge/entities/concepts.jsonl")
        );
        assert_eq!(
            layout.entity_shard_path("tech_stack.jsonl").expect("path"),
            PathBuf::from("/brain/knowledge/entities/tech_stack.jsonl")
        );
    }

    #[test]
    fn escaping_categories_are_rejected() {
        let layout = Layout::new("/brain");
        assert!(layout.entity_shard_path("").is_err());
        assert!(layout.entity_shard_path("../outside").is_err());
        assert!(layout.entity_shard_path("/etc/passwd").is_err());
        assert!(layout.entity_shard_path("nested/people").is_ok());
    }

    #[test]
    fn relation_shards_are_monthly() {
        let layout = Layout::new("/brain");
        let date = NaiveDate::from_ymd_opt(2025, 11, 30).expect("date");
        assert_eq!(
            layout.relation_shard_path(date),
            PathBuf::from("/brain/knowledge/relations/2025-11.jsonl")
        );
    }

    #[test]
    fn discovery_is_recursive_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(dir.path());
        let entities = layout.entities_dir();
        fs::create_dir_all(entities.join("deep/er")).expect("mkdir");
        fs::write(entities.join("b.jsonl"), "").expect("write");
        fs::write(entities.join("a.jsonl"), "").expect("write");
        fs::write(entities.join("deep/er/c.jsonl"), "").expect("write");
        fs::write(entities.join("notes.md"), "").expect("write");

        let shards = layout.entity_shards().expect("discover");
        let names: Vec<_> = shards
            .iter()
            .map(|p| p.strip_prefix(&entities).expect("prefix").to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.jsonl"),
                PathBuf::from("b.jsonl"),
                PathBuf::from("deep/er/c.jsonl"),
            ]
        );
    }

    #[test]
    fn missing_directory_has_no_shards() {
        let dir = tempfile::tempdir().expect("tempdir");
        let layout = Layout::new(dir.path());
        assert!(layout.relation_shards().expect("discover").is_empty());
    }
}
