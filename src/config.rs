use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use chefgenie_core::generation::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use chefgenie_core::sync::DEFAULT_POLL_INTERVAL;

const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Recipe generation settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    /// Gemini API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name (default: gemini-3-flash-preview)
    pub model: Option<String>,
    /// API base URL, for proxies and tests
    pub base_url: Option<String>,
}

impl GenerationConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

/// Household sync settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    /// Firebase project holding the `households` collection
    pub project_id: Option<String>,
    /// Firebase web API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Quiet period before a local change is pushed (default: 2000)
    pub debounce_ms: Option<u64>,
    /// How often to poll for remote changes (default: 5)
    pub poll_interval_secs: Option<u64>,
}

impl SyncConfig {
    /// Returns true if a Firestore project is configured
    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding history.json and sync_code
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub generation: GenerationConfig,
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    generation: Option<GenerationConfig>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut generation = GenerationConfig::default();
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(generation_config) = file_config.generation {
                generation = generation_config;
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        if let Ok(dir) = std::env::var("CHEFGENIE_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("API_KEY")) {
            generation.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("CHEFGENIE_MODEL") {
            generation.model = Some(model);
        }
        if let Ok(project) = std::env::var("FIREBASE_PROJECT_ID") {
            sync.project_id = Some(project);
        }
        if let Ok(key) = std::env::var("FIREBASE_API_KEY") {
            sync.api_key = Some(key);
        }
        if let Ok(ms) = std::env::var("CHEFGENIE_SYNC_DEBOUNCE_MS") {
            match ms.parse() {
                Ok(ms) => sync.debounce_ms = Some(ms),
                Err(_) => tracing::warn!("Ignoring invalid CHEFGENIE_SYNC_DEBOUNCE_MS '{}'", ms),
            }
        }

        Ok(Self {
            data_dir,
            config_file,
            generation,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/chefgenie/
    /// - macOS: ~/Library/Application Support/chefgenie/
    /// - Windows: %APPDATA%/chefgenie/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chefgenie")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/chefgenie/
    /// - macOS: ~/Library/Application Support/chefgenie/
    /// - Windows: %APPDATA%/chefgenie/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chefgenie")
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
