use std::collections::HashMap;
use std::path::PathBuf;

use quizgrid_protocol::PlayerDoc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Key {0} is not set")]
    NotFound(String),
    #[error("Malformed value: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Small persistent key-value store for per-device settings, values kept as JSON.
pub trait KeyValueStorage {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError>;
    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw string, bypassing serialization.
    pub fn set_raw(&mut self, key: &str, raw: impl Into<String>) {
        self.values.insert(key.to_string(), raw.into());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
        let raw = self
            .values
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(serde_json::from_str(raw)?)
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), serde_json::to_string(value)?);
        Ok(())
    }
}

/// Keeps all keys in one JSON object on disk.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<serde_json::Map<String, serde_json::Value>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
        let mut values = self.read_all()?;
        let value = values
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        // An unreadable file is replaced rather than blocking every write.
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_string(), serde_json::to_value(value)?);
        std::fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

/// Which roster seat this client plays, remembered across restarts.
#[derive(Debug)]
pub struct Identity<K> {
    storage: K,
    color: Option<String>,
}

impl<K: KeyValueStorage> Identity<K> {
    pub const PLAYER_KEY: &'static str = "player";

    pub fn new(storage: K) -> Self {
        Self {
            storage,
            color: None,
        }
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Seat for a freshly loaded game: the stored player if the roster has
    /// them, otherwise the first player.
    pub fn join(&mut self, roster: &[PlayerDoc]) -> Option<&str> {
        let stored = match self.storage.get::<PlayerDoc>(Self::PLAYER_KEY) {
            Ok(player) => Some(player.color),
            Err(err) => {
                log::debug!("No stored player: {err}");
                None
            }
        };
        self.color = stored
            .filter(|color| roster.iter().any(|p| &p.color == color))
            .or_else(|| roster.first().map(|p| p.color.clone()));
        self.color()
    }

    /// Seat after the roster changed: unchanged if still present, otherwise the
    /// last player.
    pub fn follow(&mut self, roster: &[PlayerDoc]) -> Option<&str> {
        let kept = self
            .color
            .take()
            .filter(|color| roster.iter().any(|p| &p.color == color));
        self.color = kept.or_else(|| roster.last().map(|p| p.color.clone()));
        self.color()
    }

    /// Switches seat and remembers it.
    pub fn choose(&mut self, player: &PlayerDoc) {
        self.color = Some(player.color.clone());
        if let Err(err) = self.storage.set(Self::PLAYER_KEY, player) {
            log::error!("Could not save player to storage: {err}");
        }
    }

    pub fn clear(&mut self) {
        self.color = None;
    }
}
