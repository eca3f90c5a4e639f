//! Durable task store: the system of record for embedding task state.
//!
//! Records survive process restarts, so a poller can always resolve a task
//! id even when the process that started the work is gone. Values are the
//! JSON-serialized [`TaskRecord`], keyed by task id.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

use crate::error::TaskStoreError;
use crate::models::TaskRecord;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS embedding_tasks (
    task_id TEXT PRIMARY KEY,
    record TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

/// Key-value persistence for task records.
pub trait TaskStore: Send + Sync {
    fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, TaskStoreError>;
    fn set(&self, task_id: &str, record: &TaskRecord) -> Result<(), TaskStoreError>;
    fn list(&self) -> Result<Vec<(String, TaskRecord)>, TaskStoreError>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl SqliteTaskStore {
    pub fn open(path: &Path) -> Result<Self, TaskStoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Non-durable variant for tests.
    pub fn open_in_memory() -> Result<Self, TaskStoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl TaskStore for SqliteTaskStore {
    fn get(&self, task_id: &str) -> Result<Option<TaskRecord>, TaskStoreError> {
        let conn = self.conn.lock().map_err(|_| TaskStoreError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT record FROM embedding_tasks WHERE task_id = ?1")?;
        let mut rows = stmt.query(params![task_id])?;

        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    fn set(&self, task_id: &str, record: &TaskRecord) -> Result<(), TaskStoreError> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn.lock().map_err(|_| TaskStoreError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO embedding_tasks (task_id, record, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(task_id) DO UPDATE SET
                 record = excluded.record,
                 updated_at = excluded.updated_at",
            params![task_id, json],
        )?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<(String, TaskRecord)>, TaskStoreError> {
        let conn = self.conn.lock().map_err(|_| TaskStoreError::LockPoisoned)?;
        let mut stmt =
            conn.prepare("SELECT task_id, record FROM embedding_tasks ORDER BY updated_at")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (task_id, json) = row?;
            tasks.push((task_id, serde_json::from_str(&json)?));
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskState;

    #[test]
    fn test_set_then_get_roundtrip() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        let record = TaskRecord {
            progress: 0.3,
            status: TaskState::Running,
            estimated_time_left: 8.0,
        };

        store.set("task-1", &record).unwrap();
        let loaded = store.get("task-1").unwrap().unwrap();
        assert_eq!(loaded.progress, 0.3);
        assert_eq!(loaded.status, TaskState::Running);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites_existing_record() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store.set("task-1", &TaskRecord::initialized()).unwrap();

        let done = TaskRecord {
            progress: 1.0,
            status: TaskState::Completed,
            estimated_time_left: 0.0,
        };
        store.set("task-1", &done).unwrap();

        let loaded = store.get("task-1").unwrap().unwrap();
        assert_eq!(loaded.status, TaskState::Completed);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_returns_every_task() {
        let store = SqliteTaskStore::open_in_memory().unwrap();
        store.set("a", &TaskRecord::initialized()).unwrap();
        store.set("b", &TaskRecord::initialized()).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");
        {
            let store = SqliteTaskStore::open(&path).unwrap();
            store.set("persisted", &TaskRecord::initialized()).unwrap();
        }
        let reopened = SqliteTaskStore::open(&path).unwrap();
        assert!(reopened.get("persisted").unwrap().is_some());
    }
}
