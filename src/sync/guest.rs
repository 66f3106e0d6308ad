//! Progress for signed-out users, kept in a JSON file

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// Bookmarks and solved questions of the anonymous user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestProgress {
    #[serde(default)]
    pub bookmarks: BTreeSet<QuestionId>,
    #[serde(default)]
    pub solved: BTreeSet<QuestionId>,
}

/// File-backed guest progress
#[derive(Debug, Clone)]
pub struct GuestStore {
    path: PathBuf,
}

impl GuestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load progress from disk
    pub fn load(&self) -> Result<GuestProgress> {
        if self.path.exists() {
            let contents = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read guest progress from {:?}", self.path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse guest.json")
        } else {
            Ok(GuestProgress::default())
        }
    }

    /// Save progress to disk
    pub fn save(&self, progress: &GuestProgress) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(progress)
            .with_context(|| "Failed to serialize guest progress")?;

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write guest progress to {:?}", self.path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuestStore::new(dir.path().join("guest.json"));
        assert_eq!(store.load().unwrap(), GuestProgress::default());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = GuestStore::new(dir.path().join("nested/data/guest.json"));
        let progress = GuestProgress {
            bookmarks: BTreeSet::from([5]),
            solved: BTreeSet::from([1, 2]),
        };
        store.save(&progress).unwrap();
        assert_eq!(store.load().unwrap(), progress);
    }

    #[test]
    fn reads_plain_id_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guest.json");
        std::fs::write(&path, r#"{"bookmarks":[3,1],"solved":[]}"#).unwrap();
        let progress = GuestStore::new(&path).load().unwrap();
        assert_eq!(progress.bookmarks.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }
}
