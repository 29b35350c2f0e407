use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};

/// Well-known key holding the bearer token.
pub const TOKEN_KEY: &str = "jwt";

/// Durable key-value capability backing the session.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// JSON object on disk, one entry per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                DashboardError::Storage(format!("{}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(DashboardError::Storage(format!(
                "{}: {err}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let storage_err = |err: std::io::Error| {
            DashboardError::Storage(format!("{}: {err}", self.path.display()))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|err| DashboardError::Storage(err.to_string()))?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            // owner read/write only
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(storage_err)?;
        file.write_all(contents.as_bytes()).map_err(storage_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store. The failure flags simulate a disabled or full backend.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    fail_writes: bool,
    fail_reads: bool,
}

#[cfg(test)]
impl MemoryStore {
    /// Store that rejects every `set` and `remove`.
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Store that rejects every `get`.
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    /// Holds `value` under `key`, then starts rejecting writes.
    pub fn with_entry_failing_writes(key: &str, value: &str) -> Self {
        let mut store = Self::failing_writes();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(DashboardError::Storage("read refused".to_string()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(DashboardError::Storage("quota exceeded".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.fail_writes {
            return Err(DashboardError::Storage("write refused".to_string()));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Single bearer-token slot. Every read goes to the backing store.
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn set_token(&mut self, token: &str) -> Result<()> {
        let token = normalize_token(token);
        if token.is_empty() {
            return Err(DashboardError::Storage("refusing to store an empty token".to_string()));
        }
        self.store.set(TOKEN_KEY, token)?;
        info!("session established");
        Ok(())
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.store.get(TOKEN_KEY)
    }

    pub fn clear_token(&mut self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        debug!("session cleared");
        Ok(())
    }

    /// Clears the session, logging instead of failing. Used on forced logout paths.
    pub fn clear_quietly(&mut self) {
        if let Err(err) = self.clear_token() {
            warn!(error = %err, "failed to clear session");
        }
    }
}

/// Strips one leading and one trailing literal quote, if present.
pub fn normalize_token(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    trimmed.strip_suffix('"').unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_single_pair_of_quotes() {
        assert_eq!(normalize_token("\"abc.def\""), "abc.def");
        assert_eq!(normalize_token("abc.def"), "abc.def");
        assert_eq!(normalize_token("\"\"abc\"\""), "\"abc\"");
        assert_eq!(normalize_token("\"abc"), "abc");
    }

    #[test]
    fn set_get_clear_round_trip() {
        let mut session = SessionStore::new(MemoryStore::default());
        assert_eq!(session.token().unwrap(), None);

        session.set_token("\"tok\"").unwrap();
        assert_eq!(session.token().unwrap().as_deref(), Some("tok"));

        session.clear_token().unwrap();
        assert_eq!(session.token().unwrap(), None);
    }

    #[test]
    fn write_failure_is_reported_and_leaves_no_session() {
        let mut session = SessionStore::new(MemoryStore::failing_writes());
        let err = session.set_token("tok").unwrap_err();
        assert!(matches!(err, DashboardError::Storage(_)));
        assert_eq!(session.token().unwrap(), None);
    }

    #[test]
    fn empty_token_is_rejected() {
        let mut session = SessionStore::new(MemoryStore::default());
        assert!(session.set_token("\"\"").is_err());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut first = SessionStore::new(FileStore::new(&path));
        first.set_token("persisted").unwrap();

        let second = SessionStore::new(FileStore::new(&path));
        assert_eq!(second.token().unwrap().as_deref(), Some("persisted"));

        first.clear_token().unwrap();
        assert_eq!(second.token().unwrap(), None);
    }

    #[test]
    fn file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(store.get(TOKEN_KEY), Err(DashboardError::Storage(_))));
    }

    #[test]
    fn failed_clear_keeps_the_token_and_reports_it() {
        let store = MemoryStore::with_entry_failing_writes(TOKEN_KEY, "tok");
        let mut session = SessionStore::new(store);
        assert!(matches!(session.clear_token(), Err(DashboardError::Storage(_))));
        assert_eq!(session.token().unwrap().as_deref(), Some("tok"));
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut session = SessionStore::new(FileStore::new(&path));
        session.set_token("secret").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn removing_missing_key_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("session.json"));
        store.remove(TOKEN_KEY).unwrap();
        assert!(!store.path().exists());
    }
}
