//! Rove Gamestate - save/load persistence
//!
//! One JSON blob in one key-value slot, written and read only by the
//! orchestrator. Loading is all-or-nothing: a missing or unparsable blob
//! means "no save data", never an error the frame loop has to handle.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Save system errors
#[derive(Debug, Error)]
pub enum SaveError {
    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted fragment of one NPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcSaveState {
    pub state: String,
    pub x: f32,
    pub y: f32,
}

/// The persisted save blob. Field names are part of the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(rename = "playerX")]
    pub player_x: f32,
    #[serde(rename = "playerY")]
    pub player_y: f32,
    #[serde(rename = "timeOfDay")]
    pub time_of_day: f32,
    #[serde(rename = "npcStates", default)]
    pub npc_states: HashMap<String, NpcSaveState>,
    #[serde(rename = "playerState", default)]
    pub player_state: serde_json::Value,
    pub version: String,
}

impl SaveData {
    /// Current save format version
    pub const VERSION: &'static str = "1.0";

    /// Create a blob with the given player position
    pub fn new(player_x: f32, player_y: f32, time_of_day: f32) -> Self {
        Self {
            player_x,
            player_y,
            time_of_day,
            npc_states: HashMap::new(),
            player_state: serde_json::Value::Null,
            version: Self::VERSION.to_string(),
        }
    }
}

/// Key-value backend for the save slot
pub trait SaveStore: Send + Sync {
    /// Write bytes under a key, replacing any previous value
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), SaveError>;

    /// Read bytes under a key; `None` when the key has never been written
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SaveError>;
}

/// Stores each key as `"{key}.json"` in a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at a directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SaveStore for FileStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), SaveError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), bytes)?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SaveError> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), SaveError> {
        self.slots.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, SaveError> {
        Ok(self.slots.lock().get(key).cloned())
    }
}

/// Manages the single save slot
pub struct SaveManager {
    store: Box<dyn SaveStore>,
    key: String,
}

impl SaveManager {
    /// Create a manager over a backend and slot key
    pub fn new(store: impl SaveStore + 'static, key: impl Into<String>) -> Self {
        Self {
            store: Box::new(store),
            key: key.into(),
        }
    }

    /// Persist the blob
    pub fn save(&self, data: &SaveData) -> Result<(), SaveError> {
        let bytes = serde_json::to_vec(data)
            .map_err(|e| SaveError::Serialization(e.to_string()))?;
        self.store.write(&self.key, &bytes)?;
        log::debug!("saved {} bytes to slot '{}'", bytes.len(), self.key);
        Ok(())
    }

    /// Load the blob.
    ///
    /// All-or-nothing: a missing slot, a read failure or an unparsable
    /// blob all yield `None` (logged, never propagated).
    pub fn load(&self) -> Option<SaveData> {
        let bytes = match self.store.read(&self.key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("save slot '{}' unreadable: {e}", self.key);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("save slot '{}' unparsable: {e}", self.key);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SaveData {
        let mut data = SaveData::new(160.0, 200.0, 18.5);
        data.npc_states.insert(
            "3".to_string(),
            NpcSaveState {
                state: "patrol".to_string(),
                x: 40.0,
                y: 80.0,
            },
        );
        data.player_state = serde_json::json!({ "hp": 90 });
        data
    }

    #[test]
    fn test_round_trip_through_memory_store() {
        let manager = SaveManager::new(MemoryStore::new(), "slot");
        let data = sample();

        manager.save(&data).unwrap();
        assert_eq!(manager.load(), Some(data));
    }

    #[test]
    fn test_missing_slot_is_absence() {
        let manager = SaveManager::new(MemoryStore::new(), "slot");
        assert_eq!(manager.load(), None);
    }

    #[test]
    fn test_corrupt_blob_is_absence() {
        let store = MemoryStore::new();
        store.write("slot", b"{ not json").unwrap();

        let manager = SaveManager::new(store, "slot");
        assert_eq!(manager.load(), None);
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("playerX").is_some());
        assert!(json.get("timeOfDay").is_some());
        assert!(json.get("npcStates").is_some());
        assert_eq!(json.get("version"), Some(&serde_json::json!("1.0")));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join("rove_gamestate_test");
        let _ = fs::remove_dir_all(&dir);

        let manager = SaveManager::new(FileStore::new(&dir), "slot");
        assert_eq!(manager.load(), None);

        let data = sample();
        manager.save(&data).unwrap();
        assert_eq!(manager.load(), Some(data));

        let _ = fs::remove_dir_all(&dir);
    }
}
