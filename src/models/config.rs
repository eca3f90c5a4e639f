use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "nomic-embed-text:latest";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub tasks: TaskStoreConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("recall").join("config.toml"))
    }

    /// Base directory for on-disk state (vector index files, task store,
    /// daemon socket).
    pub fn data_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|p| p.join("recall"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Persist directory for collection index files, falling back to a
    /// relative path when no platform data directory exists.
    pub fn persist_dir(&self) -> PathBuf {
        self.store.persist_dir.clone().unwrap_or_else(|| {
            Self::data_dir()
                .map(|p| p.join("collections"))
                .unwrap_or_else(|| PathBuf::from("./collections"))
        })
    }

    /// Path of the durable task database.
    pub fn task_db_path(&self) -> PathBuf {
        self.tasks.db_path.clone().unwrap_or_else(|| {
            Self::data_dir()
                .map(|p| p.join("tasks.db"))
                .unwrap_or_else(|| PathBuf::from("./tasks.db"))
        })
    }

    pub fn socket_path(&self) -> PathBuf {
        self.daemon.socket_path.clone().unwrap_or_else(|| {
            Self::data_dir()
                .map(|p| p.join("recall.sock"))
                .unwrap_or_else(|| PathBuf::from("./recall.sock"))
        })
    }

    pub fn pid_path(&self) -> PathBuf {
        self.socket_path().with_extension("pid")
    }
}

/// Which embedding backend to talk to. Selected once at startup, never
/// per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local-network embedding service (base URL + model)
    #[default]
    Ollama,
    /// Cloud embedding API (API key + model, fixed output dimensionality)
    OpenAi,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(format!("unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Base URL of the provider. Defaults per provider kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Model name. Defaults per provider kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key for the cloud provider; falls back to `OPENAI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Output dimensionality requested from the cloud provider.
    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            url: None,
            model: None,
            api_key: None,
            dimension: default_dimension(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    pub fn resolved_url(&self) -> String {
        self.url.clone().unwrap_or_else(|| match self.provider {
            ProviderKind::Ollama => DEFAULT_OLLAMA_URL.to_string(),
            ProviderKind::OpenAi => DEFAULT_OPENAI_URL.to_string(),
        })
    }

    pub fn resolved_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider {
            ProviderKind::Ollama => DEFAULT_OLLAMA_MODEL.to_string(),
            ProviderKind::OpenAi => DEFAULT_OPENAI_MODEL.to_string(),
        })
    }

    /// API key from config, falling back to the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Directory holding one index file per collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskStoreConfig {
    /// Path of the durable task database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    400
}

fn default_chunk_overlap() -> usize {
    20
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// MMR candidate pool is this multiple of top_k when fetch_k is unset.
    #[serde(default = "default_pool_multiplier")]
    pub mmr_pool_multiplier: usize,

    #[serde(default)]
    pub default_format: super::search::OutputFormat,
}

fn default_top_k() -> usize {
    10
}

fn default_pool_multiplier() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            mmr_pool_multiplier: default_pool_multiplier(),
            default_format: super::search::OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout() -> u64 {
    600
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}
