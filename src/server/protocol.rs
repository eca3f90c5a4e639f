//! Length-prefixed JSON protocol spoken over the daemon socket.
//!
//! Requests map one-to-one onto the operations an HTTP routing layer would
//! expose: start an embedding task, poll it, list tasks and collection
//! names, chunk a file, search a collection.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{EmbeddingRequest, SearchRequest, SearchResults, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    Shutdown,
    Status,
    StartEmbedding(EmbeddingRequest),
    TaskStatus { task_id: String },
    ListTasks,
    ListNames,
    ListTags { name: String },
    DeleteTags { name: String, tags: Vec<String> },
    Chunk(ChunkFileRequest),
    Search(SearchRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkFileRequest {
    pub file_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<usize>,

    #[serde(default = "default_splitter")]
    pub splitter: String,

    #[serde(default)]
    pub content_only: bool,
}

fn default_splitter() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    ShutdownAck,
    Status(StatusResponse),
    TaskAccepted(TaskAcceptedResponse),
    Task(TaskStatus),
    Tasks(Vec<TaskStatus>),
    Names(Vec<String>),
    Tags(Vec<String>),
    Deleted { removed: usize },
    Chunks(ChunksResponse),
    Contents(Vec<String>),
    Search(SearchResults),
    NotFound(ErrorResponse),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub provider: String,
    pub model: String,
    pub collections: usize,
    pub idle_secs: u64,
    pub requests_served: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAcceptedResponse {
    pub message: String,
    pub task_id: String,
    pub check_status_url: String,
}

impl TaskAcceptedResponse {
    pub fn new(task_id: String) -> Self {
        Self {
            message: "Embedding task started successfully.".to_string(),
            check_status_url: format!("/embedding/task/{}", task_id),
            task_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunksResponse {
    pub total: usize,
    pub chunks: Vec<ChunkSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub length: usize,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            message: message.into(),
        })
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Response::NotFound(ErrorResponse {
            message: message.into(),
        })
    }
}

pub fn encode_message(msg: &impl Serialize) -> Result<Vec<u8>, serde_json::Error> {
    let json = serde_json::to_vec(msg)?;
    let len = (json.len() as u32).to_be_bytes();
    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len);
    buf.extend_from_slice(&json);
    Ok(buf)
}

pub fn decode_length(buf: &[u8; 4]) -> usize {
    u32::from_be_bytes(*buf) as usize
}
