use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// String key/value storage the session store persists through.
///
/// Implementations must round-trip values byte for byte. A missing key is
/// `Ok(None)`, never an error, and removing a missing key succeeds.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<T: SessionStorage + ?Sized> SessionStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-memory storage. Nothing survives the process; used for tests and
/// `--ephemeral` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed storage: one file per key inside `dir`.
///
/// On unix the entries are readable by the owner only. Use the keyring
/// backend to keep the token off disk entirely.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        // Keys become file names
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("Invalid storage key: {:?}", key);
        }
        Ok(self.dir.join(key))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        std::fs::create_dir_all(&self.dir).context("Failed to create storage directory")?;
        write_private(&path, value)
            .with_context(|| format!("Failed to write storage entry: {}", key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage entry: {}", key))?;
        }
        Ok(())
    }
}

/// Write `value` to `path` with owner-only permissions on unix
fn write_private(path: &Path, value: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // Files created before this version may still be world-readable
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("token").unwrap(), None);

        storage.set("token", "abc").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.len(), 1);

        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_storage_remove_missing_is_ok() {
        let mut storage = MemoryStorage::new();
        assert!(storage.remove("user").is_ok());
    }

    #[test]
    fn test_boxed_storage_delegates() {
        let mut storage: Box<dyn SessionStorage> = Box::new(MemoryStorage::new());
        storage.set("user", "{}").unwrap();
        assert_eq!(storage.get("user").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let storage = FileStorage::new(PathBuf::from("/tmp/gameshelf-test"));
        assert!(storage.entry_path("../etc/passwd").is_err());
        assert!(storage.entry_path("").is_err());
        assert!(storage.entry_path("token").is_ok());
    }
}
