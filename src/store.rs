//! Profile stores: where completion records live between sessions.
//!
//! A store holds one [`CompletionRecord`] per `(user, scope)`. Writes are
//! field-level upserts: the incoming record is merged into what is stored,
//! so flags never regress and concurrent writers converge on last-write-wins
//! per field.

use crate::error::StoreError;
use crate::record::CompletionRecord;
use crate::sequence::{ScopeId, is_valid_id};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// All records of one user, keyed by scope.
pub type UserRecords = BTreeMap<ScopeId, CompletionRecord>;

pub trait ProfileStore: Send + Sync {
    /// Unknown users and scopes read as an empty record.
    fn get_completion_record(
        &self,
        user: &str,
        scope: &ScopeId,
    ) -> Result<CompletionRecord, StoreError>;

    /// Merges `record` into the stored record for `scope`.
    fn set_completion_record(
        &self,
        user: &str,
        scope: &ScopeId,
        record: &CompletionRecord,
    ) -> Result<(), StoreError>;

    fn all_records(&self, user: &str) -> Result<UserRecords, StoreError>;
}

fn check_user(user: &str) -> Result<(), StoreError> {
    if is_valid_id(user) && !user.starts_with('.') {
        Ok(())
    } else {
        Err(StoreError::InvalidUser(user.to_string()))
    }
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, UserRecords>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn get_completion_record(
        &self,
        user: &str,
        scope: &ScopeId,
    ) -> Result<CompletionRecord, StoreError> {
        check_user(user)?;
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .get(user)
            .and_then(|scopes| scopes.get(scope))
            .cloned()
            .unwrap_or_default())
    }

    fn set_completion_record(
        &self,
        user: &str,
        scope: &ScopeId,
        record: &CompletionRecord,
    ) -> Result<(), StoreError> {
        check_user(user)?;
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        records
            .entry(user.to_string())
            .or_default()
            .entry(scope.clone())
            .or_default()
            .merge(record);
        debug!(user, %scope, "memory store updated");
        Ok(())
    }

    fn all_records(&self, user: &str) -> Result<UserRecords, StoreError> {
        check_user(user)?;
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(user).cloned().unwrap_or_default())
    }
}

const PROGRESS_FILE: &str = "progress.json";

/// One JSON file per user under `root`: `<root>/<user>/progress.json`.
///
/// The file maps scope strings (`course:<id>`, `level:<course>/<level>`) to
/// completion records.
#[derive(Debug)]
pub struct JsonFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates the root directory if it doesn't exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.exists() {
            create_dir_all(&root)?;
            info!(root = %root.display(), "created progress database");
        }
        Ok(JsonFileStore {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_file(&self, user: &str) -> Result<PathBuf, StoreError> {
        check_user(user)?;
        Ok(self.root.join(user).join(PROGRESS_FILE))
    }

    fn read_user(&self, user: &str) -> Result<UserRecords, StoreError> {
        let path = self.user_file(user)?;
        if !path.exists() {
            return Ok(UserRecords::new());
        }
        let contents = fs::read_to_string(&path)?;
        let records: UserRecords = serde_json::from_str(&contents)?;
        Ok(records
            .into_iter()
            .map(|(scope, record)| (scope, record.normalized()))
            .collect())
    }

    fn write_user(&self, user: &str, records: &UserRecords) -> Result<(), StoreError> {
        let path = self.user_file(user)?;
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        // write-then-rename so a crash never leaves a truncated file behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl ProfileStore for JsonFileStore {
    fn get_completion_record(
        &self,
        user: &str,
        scope: &ScopeId,
    ) -> Result<CompletionRecord, StoreError> {
        let mut records = self.read_user(user)?;
        debug!(user, %scope, "read completion record");
        Ok(records.remove(scope).unwrap_or_default())
    }

    fn set_completion_record(
        &self,
        user: &str,
        scope: &ScopeId,
        record: &CompletionRecord,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.read_user(user)?;
        records.entry(scope.clone()).or_default().merge(record);
        self.write_user(user, &records)?;
        debug!(user, %scope, "wrote completion record");
        Ok(())
    }

    fn all_records(&self, user: &str) -> Result<UserRecords, StoreError> {
        self.read_user(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::EntityStatus;
    use tempfile::tempdir;

    fn exercise(store: &dyn ProfileStore) {
        let scope = ScopeId::level("rust-101", "basics");

        assert!(store.get_completion_record("ada", &scope).unwrap().is_empty());

        let first: CompletionRecord = [
            ("install", EntityStatus::COMPLETED),
            ("hello", EntityStatus::UNLOCKED),
        ]
        .into_iter()
        .collect();
        store.set_completion_record("ada", &scope, &first).unwrap();

        // a partial, stale write must not undo the completion of "install"
        let partial: CompletionRecord = [
            ("install", EntityStatus::LOCKED),
            ("hello", EntityStatus::COMPLETED),
        ]
        .into_iter()
        .collect();
        store.set_completion_record("ada", &scope, &partial).unwrap();

        let stored = store.get_completion_record("ada", &scope).unwrap();
        assert!(stored.is_completed("install"));
        assert!(stored.is_completed("hello"));

        // scopes and users are independent
        let other = ScopeId::course("rust-101");
        assert!(store.get_completion_record("ada", &other).unwrap().is_empty());
        assert!(store.get_completion_record("bob", &scope).unwrap().is_empty());

        let all = store.all_records("ada").unwrap();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key(&scope));
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn json_store_contract() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("db")).unwrap();
        exercise(&store);
        assert!(dir.path().join("db/ada/progress.json").exists());
    }

    #[test]
    fn json_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let scope = ScopeId::course("rust-101");
        let record: CompletionRecord = [("basics", EntityStatus::COMPLETED)].into_iter().collect();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store.set_completion_record("ada", &scope, &record).unwrap();
        }
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(store.get_completion_record("ada", &scope).unwrap(), record);
    }

    #[test]
    fn json_store_normalizes_legacy_entries() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("ada")).unwrap();
        fs::write(
            dir.path().join("ada/progress.json"),
            r#"{"course:rust-101":{"basics":{"completed":true}}}"#,
        )
        .unwrap();

        let store = JsonFileStore::open(dir.path()).unwrap();
        let record = store
            .get_completion_record("ada", &ScopeId::course("rust-101"))
            .unwrap();
        assert_eq!(record.status("basics"), EntityStatus::COMPLETED);
    }

    #[test]
    fn rejects_path_like_user_names() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        let scope = ScopeId::course("c");
        for bad in ["../etc", "", "a/b", ".hidden"] {
            assert!(matches!(
                store.get_completion_record(bad, &scope),
                Err(StoreError::InvalidUser(_))
            ));
        }
        assert!(matches!(
            MemoryStore::new().get_completion_record("a b", &scope),
            Err(StoreError::InvalidUser(_))
        ));
    }
}
