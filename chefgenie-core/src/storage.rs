//! Local persistence for the cookbook and the household code.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::history::History;
use crate::household::HouseholdCode;

const HISTORY_FILE: &str = "history.json";
const SYNC_CODE_FILE: &str = "sync_code";

/// Files under the data directory. Only history and the household code are
/// kept locally; plans and shopping lists live in memory and in the
/// household document.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    data_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    pub fn sync_code_path(&self) -> PathBuf {
        self.data_dir.join(SYNC_CODE_FILE)
    }

    /// Loads the cookbook.
    ///
    /// A missing file is an empty cookbook. So is a file that does not
    /// parse; the problem is logged and the file is left alone until the
    /// next save overwrites it.
    pub fn load_history(&self) -> Result<History, StorageError> {
        let path = self.history_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(History::new()),
            Err(e) => return Err(StorageError::IoError(path, e)),
        };

        match serde_json::from_str(&contents) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Ok(History::new())
            }
        }
    }

    pub fn save_history(&self, history: &History) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let path = self.history_path();
        let json = serde_json::to_string(history)
            .map_err(|e| StorageError::SerializeError(path.clone(), e.to_string()))?;
        fs::write(&path, json).map_err(|e| StorageError::IoError(path, e))
    }

    /// Loads the stored household code. Blank or missing means none.
    pub fn load_code(&self) -> Result<Option<HouseholdCode>, StorageError> {
        let path = self.sync_code_path();
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(HouseholdCode::parse(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    pub fn save_code(&self, code: &HouseholdCode) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let path = self.sync_code_path();
        fs::write(&path, code.as_str()).map_err(|e| StorageError::IoError(path, e))
    }

    pub fn clear_code(&self) -> Result<(), StorageError> {
        let path = self.sync_code_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::IoError(path, e)),
        }
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| StorageError::IoError(self.data_dir.clone(), e))
    }
}

/// Errors that can occur reading or writing local files.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// The value could not be serialized for writing.
    SerializeError(PathBuf, String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            StorageError::SerializeError(path, e) => {
                write!(f, "Failed to serialize {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(_, e) => Some(e),
            StorageError::SerializeError(_, _) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealType, Recipe};
    use tempfile::TempDir;

    fn test_storage() -> (LocalStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("chefgenie"));
        (storage, temp_dir)
    }

    #[test]
    fn test_paths() {
        let (storage, _temp) = test_storage();
        assert!(storage.history_path().ends_with("history.json"));
        assert!(storage.sync_code_path().ends_with("sync_code"));
    }

    #[test]
    fn test_load_history_missing_is_empty() {
        let (storage, _temp) = test_storage();
        assert!(storage.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_history_save_and_load() {
        let (storage, _temp) = test_storage();
        let mut history = History::new();
        history.commit(&[Recipe::new("a", "Lasagna", 1, MealType::Dinner)]);
        let id = history.items()[0].id().to_string();
        history.toggle_star(&id);

        storage.save_history(&history).unwrap();
        let loaded = storage.load_history().unwrap();

        assert_eq!(loaded, history);
        assert!(loaded.get(&id).unwrap().is_starred);
    }

    #[test]
    fn test_malformed_history_is_empty() {
        let (storage, _temp) = test_storage();
        fs::create_dir_all(storage.data_dir()).unwrap();
        fs::write(storage.history_path(), "{ not json").unwrap();

        assert!(storage.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_history_file_is_plain_array() {
        let (storage, _temp) = test_storage();
        let mut history = History::new();
        history.commit(&[Recipe::new("a", "Lasagna", 1, MealType::Dinner)]);
        storage.save_history(&history).unwrap();

        let raw = fs::read_to_string(storage.history_path()).unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains("\"isStarred\":false"));
        assert!(raw.contains("\"originalId\":\"a\""));
    }

    #[test]
    fn test_code_save_load_clear() {
        let (storage, _temp) = test_storage();
        assert_eq!(storage.load_code().unwrap(), None);

        let code = HouseholdCode::parse("chef-abc1234").unwrap();
        storage.save_code(&code).unwrap();
        assert_eq!(storage.load_code().unwrap(), Some(code));

        storage.clear_code().unwrap();
        assert_eq!(storage.load_code().unwrap(), None);
        storage.clear_code().unwrap();
    }

    #[test]
    fn test_blank_code_file_is_none() {
        let (storage, _temp) = test_storage();
        fs::create_dir_all(storage.data_dir()).unwrap();
        fs::write(storage.sync_code_path(), "  \n").unwrap();
        assert_eq!(storage.load_code().unwrap(), None);
    }
}
