use crate::error::Result;
use crate::paths;
use crate::types::{Category, Timing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Selection saved before a mutation so it survives the post-deployment reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSelection {
    pub setting_id: String,
    pub category: Category,
    pub timing: Timing,
    pub timestamp: DateTime<Utc>,
}

/// Client-local key-value slot holding at most one [`PersistedSelection`].
pub trait SelectionStore: Send + Sync {
    fn save(&self, selection: &PersistedSelection) -> Result<()>;
    fn load(&self) -> Result<Option<PersistedSelection>>;
    fn clear(&self) -> Result<()>;

    /// Read the saved selection back and clear the slot.
    fn take(&self) -> Result<Option<PersistedSelection>> {
        let saved = self.load()?;
        if saved.is_some() {
            self.clear()?;
        }
        Ok(saved)
    }
}

// ---------------------------------------------------------------------------
// MemorySelectionStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    slot: Mutex<Option<PersistedSelection>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<PersistedSelection>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SelectionStore for MemorySelectionStore {
    fn save(&self, selection: &PersistedSelection) -> Result<()> {
        *self.slot() = Some(selection.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedSelection>> {
        Ok(self.slot().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileSelectionStore
// ---------------------------------------------------------------------------

/// JSON file under the explorer directory, written atomically.
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: paths::selection_path(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStore for FileSelectionStore {
    fn save(&self, selection: &PersistedSelection) -> Result<()> {
        let data = serde_json::to_vec_pretty(selection)?;
        crate::io::atomic_write(&self.path, &data)
    }

    fn load(&self) -> Result<Option<PersistedSelection>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&data) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable saved selection");
                Ok(None)
            }
        }
    }

    fn clear(&self) -> Result<()> {
        crate::io::remove_if_exists(&self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
