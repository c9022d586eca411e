use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{Error, Storage};

/// A [`Storage`] persisted as one JSON object in a file.
///
/// The whole object is loaded when the storage is opened and rewritten on
/// every change. Writes go to a temporary file first and are then renamed
/// over the original, so readers never see a half-written file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens the storage at `path`.
    ///
    /// A missing file is treated as an empty storage and is only created
    /// by the first write. A file that exists but cannot be parsed is an
    /// error, so that it is never silently overwritten.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, Error> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                Error::serialization().with_reason(format!(
                    "failed to parse {}: {err}",
                    path.display()
                ))
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                BTreeMap::new()
            }
            Err(err) => {
                return Err(Error::io().with_reason(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };
        debug!("opened {} with {} entries", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the path of the backing file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(entries).map_err(|err| {
            Error::serialization().with_reason(err.to_string())
        })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                Error::io().with_reason(format!(
                    "failed to create {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|err| {
            Error::io().with_reason(format!(
                "failed to write {}: {err}",
                tmp_path.display()
            ))
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|err| {
            Error::io().with_reason(format!(
                "failed to replace {}: {err}",
                self.path.display()
            ))
        })?;

        trace!("persisted {} entries", entries.len());
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), Error> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = entries.insert(key.to_owned(), value);
        if let Err(err) = self.persist(&entries) {
            // Keep memory in sync with what is on disk.
            match previous {
                Some(previous) => entries.insert(key.to_owned(), previous),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries =
            self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.persist(&entries) {
            entries.insert(key.to_owned(), previous);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ErrorKind;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("anything").unwrap(), None);
        assert!(!path.exists());

        // The first write creates the parent directories.
        storage.set("k", "v".to_owned()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("a", "1".to_owned()).unwrap();
        storage.set("b", "2".to_owned()).unwrap();
        storage.remove("a").unwrap();
        drop(storage);

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("a").unwrap(), None);
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_remove_missing_key_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.remove("never-saved").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
        // The file is left alone for the user to inspect.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_failed_write_keeps_memory_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the file makes the rename fail.
        let path = dir.path().join("history.json");
        fs::create_dir(&path).unwrap();
        let storage = FileStorage {
            path: path.clone(),
            entries: Mutex::new(BTreeMap::new()),
        };

        let err = storage.set("k", "v".to_owned()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
