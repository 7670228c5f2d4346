use crate::infrastructure::error::InfraError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    let connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Opaque durable key-value store backing the task snapshot. The store
/// makes no atomicity guarantee across process crashes; callers treat
/// writes as best-effort.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn set(&self, key: &str, value: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db_path: PathBuf,
}

impl SqliteKeyValueStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let value: Option<String> = connection
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("kv lock poisoned: {error}")))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("kv lock poisoned: {error}")))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store that fails every operation. Used to exercise the best-effort
/// persistence paths in tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingKeyValueStore;

#[cfg(test)]
impl KeyValueStore for FailingKeyValueStore {
    fn get(&self, _key: &str) -> Result<Option<String>, InfraError> {
        Err(InfraError::InvalidConfig("store unavailable".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), InfraError> {
        Err(InfraError::InvalidConfig("store unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_roundtrips_values() {
        let store = InMemoryKeyValueStore::default();
        assert_eq!(store.get("tasks").expect("get"), None);

        store.set("tasks", "[]").expect("set");
        assert_eq!(store.get("tasks").expect("get"), Some("[]".to_string()));

        store.set("tasks", "[1]").expect("overwrite");
        assert_eq!(store.get("tasks").expect("get"), Some("[1]".to_string()));
    }

    #[test]
    fn sqlite_store_persists_across_connections() {
        let path = std::env::temp_dir().join(format!(
            "tareas-kv-test-{}-{}.sqlite",
            std::process::id(),
            line!()
        ));
        initialize_database(&path).expect("initialize db");

        {
            let store = SqliteKeyValueStore::new(&path);
            store.set("tasks", r#"[{"id":1}]"#).expect("set");
        }
        let reopened = SqliteKeyValueStore::new(&path);
        assert_eq!(
            reopened.get("tasks").expect("get"),
            Some(r#"[{"id":1}]"#.to_string())
        );

        let _ = std::fs::remove_file(&path);
    }
}
