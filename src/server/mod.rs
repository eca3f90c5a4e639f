//! Daemon server: a thin local-socket adapter around the core.
//!
//! The daemon hosts one task manager, so fire-and-forget embedding jobs
//! keep running between client connections. Requests arrive as
//! length-prefixed JSON over a Unix socket; the request surface mirrors
//! the HTTP routes an outer gateway would expose.

pub mod protocol;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::RwLock;

use crate::chunking::{Chunker, ChunkerOptions, SplitterMode};
use crate::error::{StoreError, TaskError};
use crate::models::Config;
use crate::server::protocol::{
    ChunkSummary, ChunksResponse, Request, Response, StatusResponse, TaskAcceptedResponse,
    decode_length, encode_message,
};
use crate::services::{
    EmbeddingProvider, SearchExecutor, SqliteTaskStore, TaskManager, VectorStore, create_provider,
};

pub struct DaemonServer {
    config: Config,
    socket_path: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    manager: TaskManager,
    executor: SearchExecutor,
    last_request: Arc<RwLock<Instant>>,
    requests_served: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl DaemonServer {
    pub fn new(config: Config) -> Result<Self, crate::error::AppError> {
        let socket_path = config.socket_path();

        let provider = create_provider(&config.embedding)?;
        eprintln!(
            "Embedding provider: {} ({})",
            config.embedding.provider,
            provider.model()
        );

        let store = Arc::new(VectorStore::new(config.persist_dir(), Arc::clone(&provider)));
        let durable = Arc::new(
            SqliteTaskStore::open(&config.task_db_path())
                .map_err(|e| crate::error::AppError::Task(TaskError::Store(e)))?,
        );
        let manager = TaskManager::new(Arc::clone(&store), durable);
        let executor = SearchExecutor::new(Arc::clone(&store), config.search.clone());

        Ok(Self {
            config,
            socket_path,
            provider,
            store,
            manager,
            executor,
            last_request: Arc::new(RwLock::new(Instant::now())),
            requests_served: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub async fn run(&self) -> Result<(), std::io::Error> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;
        self.write_pid_file()?;

        eprintln!("Daemon listening on: {}", self.socket_path.display());
        eprintln!("Idle timeout: {}s", self.config.daemon.idle_timeout_secs);

        let idle_timeout = Duration::from_secs(self.config.daemon.idle_timeout_secs);
        let check_interval = Duration::from_secs(10);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            *self.last_request.write().await = Instant::now();
                            self.handle_connection(stream).await;
                        }
                        Err(e) => {
                            eprintln!("Accept error: {}", e);
                        }
                    }
                }
                _ = tokio::time::sleep(check_interval) => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let last = *self.last_request.read().await;
                    if last.elapsed() > idle_timeout {
                        eprintln!("Idle timeout reached, shutting down");
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    eprintln!("Received SIGINT, shutting down");
                    break;
                }
            }
        }

        self.cleanup();
        Ok(())
    }

    async fn handle_connection(&self, mut stream: tokio::net::UnixStream) {
        let mut len_buf = [0u8; 4];

        while stream.read_exact(&mut len_buf).await.is_ok() {
            let len = decode_length(&len_buf);
            if len > 10 * 1024 * 1024 {
                break;
            }

            let mut msg_buf = vec![0u8; len];
            if stream.read_exact(&mut msg_buf).await.is_err() {
                break;
            }

            let request: Request = match serde_json::from_slice(&msg_buf) {
                Ok(r) => r,
                Err(e) => {
                    let response = Response::error(format!("invalid request: {}", e));
                    if let Ok(encoded) = encode_message(&response) {
                        let _ = stream.write_all(&encoded).await;
                    }
                    continue;
                }
            };

            let response = self.handle_request(request).await;
            self.requests_served.fetch_add(1, Ordering::Relaxed);

            if let Ok(encoded) = encode_message(&response)
                && stream.write_all(&encoded).await.is_err()
            {
                break;
            }

            if matches!(response, Response::ShutdownAck) {
                self.shutdown.store(true, Ordering::Relaxed);
                break;
            }
        }
    }

    async fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::Shutdown => {
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShutdownAck
            }

            Request::Status => {
                let last = *self.last_request.read().await;
                let collections = self.store.collection_names().map(|n| n.len()).unwrap_or(0);
                Response::Status(StatusResponse {
                    running: true,
                    provider: self.config.embedding.provider.to_string(),
                    model: self.provider.model().to_string(),
                    collections,
                    idle_secs: last.elapsed().as_secs(),
                    requests_served: self.requests_served.load(Ordering::Relaxed),
                })
            }

            Request::StartEmbedding(req) => {
                match self.manager.submit(&req.name, req.tags, req.texts) {
                    Ok(task_id) => Response::TaskAccepted(TaskAcceptedResponse::new(task_id)),
                    Err(e) => Response::error(e.to_string()),
                }
            }

            Request::TaskStatus { task_id } => match self.manager.get_status(&task_id) {
                Ok(status) => Response::Task(status),
                Err(TaskError::NotFound(_)) => Response::not_found("Task not found"),
                Err(e) => Response::error(e.to_string()),
            },

            Request::ListTasks => match self.manager.list_all() {
                Ok(tasks) => Response::Tasks(tasks),
                Err(e) => Response::error(e.to_string()),
            },

            Request::ListNames => match self.store.collection_names() {
                Ok(names) => Response::Names(names),
                Err(e) => Response::error(e.to_string()),
            },

            Request::ListTags { name } => match self.store.collection_tags(&name) {
                Ok(tags) => Response::Tags(tags.into_iter().collect()),
                Err(StoreError::CollectionNotFound(name)) => {
                    Response::not_found(format!("collection not found: {}", name))
                }
                Err(e) => Response::error(e.to_string()),
            },

            Request::DeleteTags { name, tags } => {
                let mut removed = 0;
                for tag in &tags {
                    match self.store.delete_tag(&name, tag) {
                        Ok(count) => removed += count,
                        Err(StoreError::CollectionNotFound(name)) => {
                            return Response::not_found(format!("collection not found: {}", name));
                        }
                        Err(e) => return Response::error(e.to_string()),
                    }
                }
                Response::Deleted { removed }
            }

            Request::Chunk(req) => {
                // Splitter mode is validated before the file is touched.
                let splitter = match req.splitter.parse::<SplitterMode>() {
                    Ok(mode) => mode,
                    Err(e) => return Response::error(e.to_string()),
                };
                let options = ChunkerOptions {
                    chunk_size: req.chunk_size.unwrap_or(self.config.chunking.chunk_size),
                    chunk_overlap: req
                        .chunk_overlap
                        .unwrap_or(self.config.chunking.chunk_overlap),
                    splitter,
                    ..Default::default()
                };

                let chunker = match Chunker::for_path(
                    &req.file_path,
                    options,
                    Some(Arc::clone(&self.provider)),
                ) {
                    Ok(chunker) => chunker,
                    Err(e) => return Response::error(e.to_string()),
                };

                match chunker.split(&req.file_path).await {
                    Ok(chunks) if req.content_only => {
                        Response::Contents(chunks.into_iter().map(|c| c.content).collect())
                    }
                    Ok(chunks) => Response::Chunks(ChunksResponse {
                        total: chunks.len(),
                        chunks: chunks
                            .into_iter()
                            .map(|c| ChunkSummary {
                                length: c.len(),
                                content: c.content,
                            })
                            .collect(),
                    }),
                    Err(e) => Response::error(e.to_string()),
                }
            }

            Request::Search(req) => {
                let result = self
                    .executor
                    .search(
                        &req.name,
                        &req.tags,
                        &req.query,
                        req.top_k,
                        req.search_type,
                        &req.opts,
                    )
                    .await;
                match result {
                    Ok(chunks) if req.content_only => {
                        Response::Contents(chunks.into_iter().map(|c| c.content).collect())
                    }
                    Ok(chunks) => Response::Search(crate::models::SearchResults::new(chunks)),
                    Err(e) if e.is_collection_not_found() => Response::not_found(e.to_string()),
                    Err(e) => Response::error(e.to_string()),
                }
            }
        }
    }

    fn write_pid_file(&self) -> Result<(), std::io::Error> {
        let pid_path = self.config.pid_path();
        std::fs::write(&pid_path, std::process::id().to_string())
    }

    fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.socket_path);
        let _ = std::fs::remove_file(self.config.pid_path());
        eprintln!("Daemon stopped");
    }
}

pub async fn run_daemon(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = DaemonServer::new(config)?;
    server.run().await?;
    Ok(())
}
