//! File-backed cursor store
//!
//! A single JSON object on disk holds the last saved cursor mapping under
//! one fixed key. Other top-level content in the file is preserved across
//! saves. Writes go to a temp file first, then rename, so a crash mid-save
//! cannot corrupt the previous state.

use super::{CURSOR_KEY, DEFAULT_STORE_FILE};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persists and restores the cursor variable mapping
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    /// Create a store backed by the given file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted cursor mapping.
    ///
    /// An absent file, a missing key, or an unreadable record all degrade
    /// to `None`: the caller starts from the beginning.
    pub async fn load(&self) -> Result<Option<HashMap<String, String>>> {
        let Some(content) = self.load_file().await? else {
            info!("no persisted cursor state");
            return Ok(None);
        };
        let Some(cursor) = content.get(CURSOR_KEY) else {
            info!("persisted state holds no cursor");
            return Ok(None);
        };
        match serde_json::from_value::<HashMap<String, String>>(cursor.clone()) {
            Ok(cursors) => {
                info!(?cursors, "loaded cursor state");
                Ok(Some(cursors))
            }
            Err(e) => {
                warn!(error = %e, "persisted cursor is malformed, starting over");
                Ok(None)
            }
        }
    }

    /// Save the cursor mapping under the fixed key, preserving any other
    /// top-level content already in the file.
    pub async fn save(&self, cursors: &HashMap<String, String>) -> Result<()> {
        info!(?cursors, "saving cursor state");
        let mut content = self.load_file().await?.unwrap_or_default();
        content.insert(CURSOR_KEY.to_string(), serde_json::to_value(cursors)?);
        self.save_file(&content).await
    }

    async fn load_file(&self) -> Result<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(content) => Ok(Some(content)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cursor store is corrupt, ignoring it");
                Ok(None)
            }
        }
    }

    async fn save_file(&self, content: &Map<String, Value>) -> Result<()> {
        let rendered = serde_json::to_string_pretty(content)?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &rendered)
            .await
            .map_err(|e| Error::state(format!("failed to write cursor store: {e}")))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("failed to replace cursor store: {e}")))?;
        debug!(path = %self.path.display(), "cursor state written");
        Ok(())
    }
}

impl Default for CursorStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_FILE)
    }
}
