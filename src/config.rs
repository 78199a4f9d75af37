use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PrimerConfig {
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Local working directory for the interview store and index files.
    pub data_dir: String,
    /// Optional mounted volume. When set and present it takes precedence
    /// over `data_dir` for the index files, so rebuilds survive redeploys.
    pub persistent_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    /// Base URL for the `remote` provider (OpenAI-compatible).
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Vector width the `remote` provider is expected to return.
    pub remote_dimensions: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
}

impl Default for PrimerConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = default_primer_dir().to_string_lossy().into_owned();
        Self {
            data_dir,
            persistent_dir: String::new(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_primer_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
            api_base: "https://api.openai.com/v1".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            remote_dimensions: 1536,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { default_k: 3 }
    }
}

/// Resolved locations of the persisted index artifacts. All three files live
/// in one directory and are replaced together on every rebuild.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub index_dir: PathBuf,
    pub vector_index: PathBuf,
    pub metadata: PathBuf,
    pub rebuild_status: PathBuf,
}

impl IndexPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            index_dir: dir.to_path_buf(),
            vector_index: dir.join("vector_index.json"),
            metadata: dir.join("metadata.json"),
            rebuild_status: dir.join("rebuild_status.json"),
        }
    }
}

/// Returns `~/.primer/`
pub fn default_primer_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".primer")
}

/// Returns the default config file path: `~/.primer/config.toml`
pub fn default_config_path() -> PathBuf {
    default_primer_dir().join("config.toml")
}

impl PrimerConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            PrimerConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (PRIMER_DATA_DIR,
    /// PRIMER_PERSISTENT_DIR, PRIMER_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PRIMER_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("PRIMER_PERSISTENT_DIR") {
            self.storage.persistent_dir = val;
        }
        if let Ok(val) = std::env::var("PRIMER_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Resolve the data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    /// Resolve the directory holding the index files. Prefers the persistent
    /// directory when one is configured and actually mounted.
    pub fn resolved_index_dir(&self) -> PathBuf {
        if !self.storage.persistent_dir.is_empty() {
            let persistent = expand_tilde(&self.storage.persistent_dir);
            if persistent.exists() {
                return persistent.join("index");
            }
        }
        self.resolved_data_dir().join("index")
    }

    /// Paths of the three persisted index artifacts.
    pub fn index_paths(&self) -> IndexPaths {
        IndexPaths::in_dir(self.resolved_index_dir())
    }

    /// Path of the interview document store.
    pub fn interviews_path(&self) -> PathBuf {
        self.resolved_data_dir().join("interviews.json")
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
