//! Embedding task manager: lifecycle, concurrency, progress tracking, and
//! failure recording for long-running embedding jobs.
//!
//! Each submitted job runs on exactly one spawned worker. State lives in an
//! in-process map (fast path for the owning process) and the durable store
//! (system of record); the worker owning a task id is its only writer, and
//! persists after every embedded unit so pollers never observe progress
//! regression.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::TaskError;
use crate::models::{Chunk, TaskRecord, TaskState, TaskStatus};
use crate::services::task_store::TaskStore;
use crate::services::vector_store::VectorStore;

type TaskMap = Arc<RwLock<HashMap<String, TaskRecord>>>;

pub struct TaskManager {
    tasks: TaskMap,
    durable: Arc<dyn TaskStore>,
    store: Arc<VectorStore>,
    /// Fire-and-forget handles, retained for ownership but never awaited.
    workers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TaskManager {
    pub fn new(store: Arc<VectorStore>, durable: Arc<dyn TaskStore>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            durable,
            store,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Create a task and schedule its embedding work. Returns the task id
    /// immediately; the caller never blocks on completion.
    pub fn submit(
        &self,
        name: &str,
        tags: Vec<String>,
        texts: Vec<String>,
    ) -> Result<String, TaskError> {
        if texts.is_empty() {
            return Err(TaskError::Validation(
                "texts must not be empty".to_string(),
            ));
        }

        let task_id = Uuid::new_v4().to_string();
        persist(
            &self.tasks,
            self.durable.as_ref(),
            &task_id,
            TaskRecord::initialized(),
        )?;

        let tasks = Arc::clone(&self.tasks);
        let durable = Arc::clone(&self.durable);
        let store = Arc::clone(&self.store);
        let worker_id = task_id.clone();
        let name = name.to_string();

        let handle = tokio::spawn(async move {
            // The persisted status is the caller-visible channel; the error
            // itself only surfaces here, in the worker's host task.
            if let Err(e) =
                run_embedding_task(&tasks, durable.as_ref(), &store, &worker_id, &name, tags, texts)
                    .await
            {
                eprintln!("embedding task {} failed: {}", worker_id, e);
            }
        });

        let mut workers = self
            .workers
            .lock()
            .map_err(|_| TaskError::LockPoisoned)?;
        workers.retain(|_, handle| !handle.is_finished());
        workers.insert(task_id.clone(), handle);

        Ok(task_id)
    }

    /// Current status of a task, consulting the in-process map first and
    /// the durable store second.
    ///
    /// A task found only durably with a non-terminal status belonged to a
    /// process that is gone; it is reclassified as failed so it is never
    /// reported as perpetually running.
    pub fn get_status(&self, task_id: &str) -> Result<TaskStatus, TaskError> {
        if let Some(record) = self
            .tasks
            .read()
            .map_err(|_| TaskError::LockPoisoned)?
            .get(task_id)
        {
            return Ok(TaskStatus::from_record(task_id, record));
        }

        match self.durable.get(task_id)? {
            None => Err(TaskError::NotFound(task_id.to_string())),
            Some(mut record) => {
                if !record.status.is_terminal() {
                    record.status = TaskState::Failed;
                    record.estimated_time_left = 0.0;
                    self.durable.set(task_id, &record)?;
                }
                Ok(TaskStatus::from_record(task_id, &record))
            }
        }
    }

    /// Every task known to the durable store, whichever process created it.
    pub fn list_all(&self) -> Result<Vec<TaskStatus>, TaskError> {
        Ok(self
            .durable
            .list()?
            .into_iter()
            .map(|(task_id, record)| TaskStatus::from_record(task_id, &record))
            .collect())
    }
}

/// Write-through state update: in-process map first, then the durable copy.
fn persist(
    tasks: &TaskMap,
    durable: &dyn TaskStore,
    task_id: &str,
    record: TaskRecord,
) -> Result<(), TaskError> {
    tasks
        .write()
        .map_err(|_| TaskError::LockPoisoned)?
        .insert(task_id.to_string(), record.clone());
    durable.set(task_id, &record)?;
    Ok(())
}

/// Drive one embedding job to a terminal state. The failure is recorded
/// before it propagates, so the task record never stays non-terminal.
async fn run_embedding_task(
    tasks: &TaskMap,
    durable: &dyn TaskStore,
    store: &VectorStore,
    task_id: &str,
    name: &str,
    tags: Vec<String>,
    texts: Vec<String>,
) -> Result<(), TaskError> {
    match embed_all(tasks, durable, store, task_id, name, &tags, texts).await {
        Ok(()) => persist(
            tasks,
            durable,
            task_id,
            TaskRecord {
                progress: 1.0,
                status: TaskState::Completed,
                estimated_time_left: 0.0,
            },
        ),
        Err(e) => {
            let mut record = current_record(tasks, task_id);
            record.status = TaskState::Failed;
            if let Err(persist_err) = persist(tasks, durable, task_id, record) {
                eprintln!(
                    "failed to record failure of task {}: {}",
                    task_id, persist_err
                );
            }
            Err(e)
        }
    }
}

async fn embed_all(
    tasks: &TaskMap,
    durable: &dyn TaskStore,
    store: &VectorStore,
    task_id: &str,
    name: &str,
    tags: &[String],
    texts: Vec<String>,
) -> Result<(), TaskError> {
    persist(
        tasks,
        durable,
        task_id,
        TaskRecord {
            progress: 0.0,
            status: TaskState::Running,
            estimated_time_left: 0.0,
        },
    )?;

    let start = Instant::now();
    let total = texts.len();

    for (i, text) in texts.into_iter().enumerate() {
        store.embed_and_store(name, &Chunk::new(text), tags).await?;

        let progress = (i + 1) as f64 / total as f64;
        let elapsed = start.elapsed().as_secs_f64();
        // Linear extrapolation from observed throughput.
        let estimated_time_left = (elapsed / progress - elapsed).max(0.0);

        persist(
            tasks,
            durable,
            task_id,
            TaskRecord {
                progress,
                status: TaskState::Running,
                estimated_time_left,
            },
        )?;
    }

    Ok(())
}

fn current_record(tasks: &TaskMap, task_id: &str) -> TaskRecord {
    tasks
        .read()
        .ok()
        .and_then(|map| map.get(task_id).cloned())
        .unwrap_or_else(TaskRecord::initialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::provider::testing::{FailingProvider, HashProvider};
    use crate::services::task_store::SqliteTaskStore;
    use std::time::Duration;

    fn manager(dir: &std::path::Path) -> TaskManager {
        let store = Arc::new(VectorStore::new(dir, Arc::new(HashProvider)));
        let durable = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
        TaskManager::new(store, durable)
    }

    async fn poll_until_terminal(manager: &TaskManager, task_id: &str) -> TaskStatus {
        for _ in 0..200 {
            let status = manager.get_status(task_id).unwrap();
            if status.status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {} never reached a terminal state", task_id);
    }

    #[tokio::test]
    async fn test_submit_returns_initialized_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());

        let task_id = manager
            .submit("notes", vec![], vec!["one text".to_string()])
            .unwrap();

        // The worker has not run yet on this single-threaded runtime.
        let status = manager.get_status(&task_id).unwrap();
        assert_eq!(status.status, TaskState::Initialized);
        assert_eq!(status.progress, 0.0);
    }

    #[tokio::test]
    async fn test_empty_texts_rejected_before_task_creation() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());

        let result = manager.submit("notes", vec![], vec![]);
        assert!(matches!(result, Err(TaskError::Validation(_))));
        assert!(manager.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_runs_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());

        let texts: Vec<String> = (0..5).map(|i| format!("text number {}", i)).collect();
        let task_id = manager.submit("notes", vec![], texts).unwrap();

        let status = poll_until_terminal(&manager, &task_id).await;
        assert_eq!(status.status, TaskState::Completed);
        assert_eq!(status.progress, 1.0);
        assert_eq!(status.estimated_time_left, 0.0);

        // Terminal state never changes on subsequent polls.
        let again = manager.get_status(&task_id).unwrap();
        assert_eq!(again.status, TaskState::Completed);
        assert_eq!(again.progress, 1.0);
        assert_eq!(again.estimated_time_left, 0.0);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());

        let texts: Vec<String> = (0..20).map(|i| format!("sentence {}", i)).collect();
        let task_id = manager.submit("notes", vec![], texts).unwrap();

        let mut last = 0.0;
        for _ in 0..200 {
            let status = manager.get_status(&task_id).unwrap();
            assert!(status.progress >= last);
            assert!(status.estimated_time_left >= 0.0);
            last = status.progress;
            if status.status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(last, 1.0);
    }

    #[tokio::test]
    async fn test_provider_failure_marks_task_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(FailingProvider)));
        let durable = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
        let manager = TaskManager::new(store, Arc::clone(&durable) as Arc<dyn TaskStore>);

        let task_id = manager
            .submit("notes", vec![], vec!["doomed".to_string()])
            .unwrap();

        let status = poll_until_terminal(&manager, &task_id).await;
        assert_eq!(status.status, TaskState::Failed);

        // The failure is recorded durably, not just in-process.
        let record = durable.get(&task_id).unwrap().unwrap();
        assert_eq!(record.status, TaskState::Failed);
    }

    #[tokio::test]
    async fn test_unknown_task_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());
        let result = manager.get_status("nonexistent-task-id");
        assert!(matches!(result, Err(TaskError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_orphaned_running_task_reclassified_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let durable = Arc::new(SqliteTaskStore::open_in_memory().unwrap());

        // A previous process recorded this task as running and then died.
        durable
            .set(
                "orphan",
                &TaskRecord {
                    progress: 0.6,
                    status: TaskState::Running,
                    estimated_time_left: 30.0,
                },
            )
            .unwrap();

        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let manager = TaskManager::new(store, Arc::clone(&durable) as Arc<dyn TaskStore>);

        let status = manager.get_status("orphan").unwrap();
        assert_eq!(status.status, TaskState::Failed);
        assert_eq!(status.estimated_time_left, 0.0);

        // The correction is persisted.
        let record = durable.get("orphan").unwrap().unwrap();
        assert_eq!(record.status, TaskState::Failed);
    }

    #[tokio::test]
    async fn test_orphaned_terminal_task_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let durable = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
        durable
            .set(
                "done",
                &TaskRecord {
                    progress: 1.0,
                    status: TaskState::Completed,
                    estimated_time_left: 0.0,
                },
            )
            .unwrap();

        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let manager = TaskManager::new(store, Arc::clone(&durable) as Arc<dyn TaskStore>);

        let status = manager.get_status("done").unwrap();
        assert_eq!(status.status, TaskState::Completed);
        assert_eq!(status.progress, 1.0);
    }

    #[tokio::test]
    async fn test_list_all_reads_the_durable_store() {
        let dir = tempfile::tempdir().unwrap();
        let durable = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
        durable.set("foreign", &TaskRecord::initialized()).unwrap();

        let store = Arc::new(VectorStore::new(dir.path(), Arc::new(HashProvider)));
        let manager = TaskManager::new(store, Arc::clone(&durable) as Arc<dyn TaskStore>);

        let task_id = manager
            .submit("notes", vec![], vec!["text".to_string()])
            .unwrap();
        poll_until_terminal(&manager, &task_id).await;

        let all = manager.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|t| t.task_id == "foreign"));
        assert!(all.iter().any(|t| t.task_id == task_id));
    }

    #[tokio::test]
    async fn test_concurrent_tasks_into_same_collection() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path());

        let first = manager
            .submit("shared", vec![], vec!["a".to_string(), "b".to_string()])
            .unwrap();
        let second = manager
            .submit("shared", vec![], vec!["c".to_string(), "d".to_string()])
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(
            poll_until_terminal(&manager, &first).await.status,
            TaskState::Completed
        );
        assert_eq!(
            poll_until_terminal(&manager, &second).await.status,
            TaskState::Completed
        );
    }
}
