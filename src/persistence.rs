//! JSON file-backed persistence for `AppState::persist`/`restore`.
//!
//! One JSON document per key, written under a directory resolved the same
//! way the rest of this crate's ambient config resolves its directory
//! (`dirs`, falling back to a temp dir), mirroring the create-dir-then-write
//! idiom this codebase uses for its JSONL event log.

use crate::error::NavigatorError;
use std::fs;
use std::path::PathBuf;

#[derive(Clone)]
pub struct PersistenceBackend {
    dir: PathBuf,
}

impl PersistenceBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Resolve the default persistence directory: `~/.local/share/navigator`
    /// (or the platform equivalent), falling back to a temp directory if the
    /// data directory cannot be determined.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("navigator"))
            .unwrap_or_else(std::env::temp_dir)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), NavigatorError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| NavigatorError::Persistence(format!("create dir: {e}")))?;
        let json = serde_json::to_string(value)
            .map_err(|e| NavigatorError::Persistence(format!("serialize: {e}")))?;
        fs::write(self.path_for(key), json)
            .map_err(|e| NavigatorError::Persistence(format!("write: {e}")))?;
        Ok(())
    }

    /// Tolerant of absence: returns `Ok(None)` if the key was never
    /// persisted, rather than erroring.
    pub fn load(&self, key: &str) -> Result<Option<serde_json::Value>, NavigatorError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| NavigatorError::Persistence(format!("read: {e}")))?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| NavigatorError::Persistence(format!("parse: {e}")))?;
        Ok(Some(value))
    }
}

impl Default for PersistenceBackend {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}
