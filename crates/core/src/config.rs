//! Configuration management for CCNA Coach.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.ccna/config.yaml` in the workspace, or `CCNA_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources override earlier ones. All on-disk state (question store,
//! semantic index, prompt overrides) lives under the workspace's `.ccna/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the language model factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["azure-openai", "openai", "ollama"];

/// Embedding providers the embedding factory knows how to build.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "trigram"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ccna/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// HTTP listener and request budget
    pub server: ServerConfig,

    /// Question store and semantic index locations
    pub storage: StorageConfig,

    /// Number of candidates requested from the semantic index
    pub top_k: usize,

    /// Active LLM provider (e.g., "azure-openai", "openai", "ollama")
    pub provider: String,

    /// Model identifier (deployment name for Azure)
    pub model: String,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Embedding settings shared by the indexer and the search path
    pub embedding: EmbeddingConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations from config.yaml
    pub llm: Option<LlmConfig>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind (e.g., "127.0.0.1:5000")
    pub bind: String,

    /// Number of request worker threads
    pub workers: usize,

    /// Caller-side budget for each downstream call, in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            workers: 4,
            request_timeout_secs: 30,
        }
    }
}

/// Storage locations. Relative paths resolve against the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the questions table
    pub database: PathBuf,

    /// SQLite file holding the embedding collection
    pub index: PathBuf,

    /// Name of the embedding collection
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".ccna/questions.sqlite"),
            index: PathBuf::from(".ccna/index.sqlite"),
            collection: "ccna_embeddings".to_string(),
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint (Ollama base URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum number of texts per embedding batch during indexing
    #[serde(rename = "batchSize", default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
///
/// Variant order matters for untagged matching: Azure is the only one with a
/// `deployment`, OpenAI the only remaining one with an `apiKeyEnv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    AzureOpenAI {
        endpoint: String,
        deployment: String,
        #[serde(rename = "apiVersion")]
        api_version: String,
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
    },
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
    },
}

impl ProviderConfig {
    /// Provider kind as understood by the client factory.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AzureOpenAI { .. } => "azure-openai",
            Self::OpenAI { .. } => "openai",
            Self::Ollama { .. } => "ollama",
        }
    }

    /// Model (or deployment) this provider is configured to use.
    pub fn model(&self) -> &str {
        match self {
            Self::AzureOpenAI { deployment, .. } => deployment,
            Self::OpenAI { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }

    /// Endpoint override, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::AzureOpenAI { endpoint, .. } => Some(endpoint),
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Azure API version, if this is an Azure provider.
    pub fn api_version(&self) -> Option<&str> {
        match self {
            Self::AzureOpenAI { api_version, .. } => Some(api_version),
            _ => None,
        }
    }

    /// Environment variable holding the API key, for hosted providers.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::AzureOpenAI { api_key_env, .. } | Self::OpenAI { api_key_env, .. } => {
                Some(api_key_env)
            }
            Self::Ollama { .. } => None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    server: Option<ServerSection>,
    storage: Option<StorageSection>,
    retrieval: Option<RetrievalSection>,
    llm: Option<LlmConfig>,
    embedding: Option<EmbeddingConfig>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ServerSection {
    bind: Option<String>,
    workers: Option<usize>,
    #[serde(rename = "requestTimeoutSecs")]
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StorageSection {
    database: Option<PathBuf>,
    index: Option<PathBuf>,
    collection: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RetrievalSection {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            top_k: 5,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            api_key: None,
            embedding: EmbeddingConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `CCNA_WORKSPACE`: Override workspace path
    /// - `CCNA_CONFIG`: Path to config file
    /// - `CCNA_BIND`: HTTP bind address
    /// - `CCNA_DATABASE`: Question store path
    /// - `CCNA_PROVIDER`: LLM provider
    /// - `CCNA_MODEL`: Model identifier
    /// - `CCNA_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ccna_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("CCNA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("CCNA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.ccna_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env();

        Ok(config)
    }

    /// Environment variables override the YAML config.
    fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var("CCNA_BIND") {
            self.server.bind = bind;
        }

        if let Ok(database) = std::env::var("CCNA_DATABASE") {
            self.storage.database = PathBuf::from(database);
        }

        if let Ok(provider) = std::env::var("CCNA_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(model) = std::env::var("CCNA_MODEL") {
            self.model = model;
        }

        if let Ok(key) = std::env::var("CCNA_API_KEY") {
            self.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| match e {
            AppError::Serialization(msg) => {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, msg))
            }
            other => other,
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(server) = config_file.server {
            if let Some(bind) = server.bind {
                result.server.bind = bind;
            }
            if let Some(workers) = server.workers {
                result.server.workers = workers;
            }
            if let Some(timeout) = server.request_timeout_secs {
                result.server.request_timeout_secs = timeout;
            }
        }

        if let Some(storage) = config_file.storage {
            if let Some(database) = storage.database {
                result.storage.database = database;
            }
            if let Some(index) = storage.index {
                result.storage.index = index;
            }
            if let Some(collection) = storage.collection {
                result.storage.collection = collection;
            }
        }

        if let Some(top_k) = config_file.retrieval.and_then(|r| r.top_k) {
            result.top_k = top_k;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .ccna directory.
    pub fn ccna_dir(&self) -> PathBuf {
        self.workspace.join(".ccna")
    }

    /// Ensure the .ccna directory exists.
    pub fn ensure_ccna_dir(&self) -> AppResult<()> {
        let ccna_dir = self.ccna_dir();
        if !ccna_dir.exists() {
            std::fs::create_dir_all(&ccna_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .ccna directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Absolute path of the question store.
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.storage.database)
    }

    /// Absolute path of the semantic index.
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.storage.index)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get the configuration for a provider, if config.yaml declares it.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Kind of the active provider.
    ///
    /// A provider declared in config.yaml may use any key name; its kind
    /// comes from the shape of its entry. Otherwise the name is the kind.
    pub fn provider_kind(&self) -> &str {
        match self.get_provider_config(&self.provider) {
            Some(provider_config) => provider_config.kind(),
            None => &self.provider,
        }
    }

    /// Endpoint override for the active provider.
    pub fn provider_endpoint(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|c| c.endpoint())
            .map(str::to_string)
    }

    /// Azure API version for the active provider.
    pub fn provider_api_version(&self) -> Option<String> {
        self.get_provider_config(&self.provider)
            .and_then(|c| c.api_version())
            .map(str::to_string)
    }

    /// Resolve the API key: `CCNA_API_KEY` first, then the provider's `apiKeyEnv`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.get_provider_config(&self.provider)
            .and_then(|c| c.api_key_env())
            .and_then(|env_var| std::env::var(env_var).ok())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider_kind();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider != "ollama" && self.resolve_api_key().is_none() {
            let hint = self
                .get_provider_config(&self.provider)
                .and_then(|c| c.api_key_env())
                .unwrap_or("CCNA_API_KEY");
            return Err(AppError::Config(format!(
                "API key for provider '{}' not found (set {})",
                self.provider, hint
            )));
        }

        if provider == "azure-openai" && self.provider_endpoint().is_none() {
            return Err(AppError::Config(
                "Provider 'azure-openai' requires an endpoint in config.yaml".to_string(),
            ));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be greater than zero".to_string(),
            ));
        }

        if self.server.workers == 0 {
            return Err(AppError::Config(
                "Server needs at least one worker".to_string(),
            ));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("retrieval.topK must be at least 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.top_k, 5);
        assert_eq!(config.server.bind, "127.0.0.1:5000");
        assert_eq!(config.storage.collection, "ccna_embeddings");
        assert_eq!(config.embedding.dimensions, 384);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_ccna_dir_and_storage_paths() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/coach");

        assert!(config.ccna_dir().ends_with(".ccna"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/coach/.ccna/questions.sqlite")
        );

        config.storage.index = PathBuf::from("/var/lib/ccna/index.sqlite");
        assert_eq!(config.index_path(), PathBuf::from("/var/lib/ccna/index.sqlite"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("openai".to_string()),
            Some("gpt-4".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
server:
  bind: "0.0.0.0:8080"
  workers: 8
  requestTimeoutSecs: 10
storage:
  collection: practice
retrieval:
  topK: 3
embedding:
  provider: trigram
  model: trigram-v1
  dimensions: 256
logging:
  level: debug
  color: false
llm:
  activeProvider: azure
  providers:
    azure:
      endpoint: "https://example.openai.azure.com"
      deployment: gpt-4
      apiVersion: "2024-02-01"
      apiKeyEnv: AZURE_OPENAI_KEY
    local:
      endpoint: "http://localhost:11434"
      model: llama3.2
"#;

        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();
        assert_eq!(merged.server.bind, "0.0.0.0:8080");
        assert_eq!(merged.server.workers, 8);
        assert_eq!(merged.server.request_timeout_secs, 10);
        assert_eq!(merged.storage.collection, "practice");
        assert_eq!(merged.top_k, 3);
        assert_eq!(merged.embedding.provider, "trigram");
        assert_eq!(merged.embedding.batch_size, 32);
        assert_eq!(merged.log_level, Some("debug".to_string()));
        assert!(merged.no_color);
        assert_eq!(merged.provider, "azure");
        assert_eq!(merged.provider_kind(), "azure-openai");
        assert_eq!(merged.model, "gpt-4");
        assert_eq!(
            merged.provider_endpoint(),
            Some("https://example.openai.azure.com".to_string())
        );

        let azure = merged.get_provider_config("azure").unwrap();
        assert!(matches!(azure, ProviderConfig::AzureOpenAI { .. }));
        assert_eq!(azure.api_version(), Some("2024-02-01"));

        let local = merged.get_provider_config("local").unwrap();
        assert!(matches!(local, ProviderConfig::Ollama { .. }));
        assert_eq!(local.api_key_env(), None);
    }

    #[test]
    fn test_merge_yaml_rejects_malformed() {
        let result = AppConfig::default().merge_yaml_str("retrieval:\n  topK: many\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_yaml_file_from_workspace() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(".ccna")).unwrap();
        std::fs::write(
            temp.path().join(".ccna/config.yaml"),
            "retrieval:\n  topK: 7\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.workspace = temp.path().to_path_buf();
        let merged = config
            .merge_yaml(&temp.path().join(".ccna/config.yaml"))
            .unwrap();
        assert_eq!(merged.top_k, 7);
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_hosted_provider_requires_key() {
        let mut config = AppConfig::default();
        config.provider = "openai".to_string();
        config.api_key = None;
        // No provider config, no CCNA_API_KEY captured in the struct
        assert!(config.validate().is_err());

        config.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_top_k_and_workers() {
        let mut config = AppConfig::default();
        config.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.workers = 0;
        assert!(config.validate().is_err());
    }
}
