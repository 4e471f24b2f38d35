//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (or its environment variable, via clap)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! The TOML file is bootstrap-only: changes require a restart.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Default bind address (loopback only)
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "JOT_ROOT_FOLDER";

/// Environment variable holding the LLM API token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Token file looked up in the root folder when the env var is unset
pub const TOKEN_FILE: &str = "token.txt";

/// Config file name inside the root folder
pub const ROOT_CONFIG_FILE: &str = "jot.toml";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "jot.db";

pub const DEFAULT_LLM_ENDPOINT: &str = "https://models.github.ai/inference";
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-4.1-mini";

/// Bootstrap configuration loaded from TOML
///
/// Every field is optional; anything absent falls through to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub root_folder: Option<PathBuf>,
    /// Path to SQLite database file (relative paths are taken from the root folder)
    pub database_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub llm: LlmConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Chat-completions endpoint settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LLM_ENDPOINT.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 1.0,
            top_p: 1.0,
            timeout_secs: 30,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub root_folder: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
    pub llm: LlmConfig,
    /// None disables the LLM-backed endpoints
    pub llm_token: Option<String>,
}

impl ServiceConfig {
    /// Resolve the full configuration from CLI values, environment, TOML and defaults
    pub fn resolve(cli: CliOverrides) -> Result<Self> {
        let root_folder = resolve_root_folder(cli.root_folder.as_deref());
        let toml_config = load_toml_config(cli.config_path.as_deref(), &root_folder)?;

        let database_path = match toml_config.database_path {
            Some(path) if path.is_absolute() => path,
            Some(path) => root_folder.join(path),
            None => root_folder.join(DATABASE_FILE),
        };

        let llm_token = resolve_llm_token(&root_folder);

        Ok(Self {
            bind: cli
                .bind
                .or(toml_config.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
            root_folder,
            database_path,
            log_level: toml_config.logging.level,
            llm: toml_config.llm,
            llm_token,
        })
    }
}

/// Resolve the root folder holding the database, token file and `jot.toml`
pub fn resolve_root_folder(cli_arg: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // The user-level config file may relocate the root folder
    if let Some(config_path) = user_config_path() {
        if let Ok(config) = read_toml_config(&config_path) {
            if let Some(root_folder) = config.root_folder {
                return root_folder;
            }
        }
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("jot"))
        .unwrap_or_else(|| PathBuf::from("./jot_data"))
}

/// `~/.config/jot/config.toml` (platform equivalent)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jot").join("config.toml"))
}

/// Load the TOML config
///
/// An explicitly named file must exist and parse. Otherwise `<root>/jot.toml`
/// then the user config file are tried; if neither exists the defaults are
/// used and a warning is logged.
pub fn load_toml_config(explicit: Option<&Path>, root_folder: &Path) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return read_toml_config(path);
    }

    let candidates = std::iter::once(root_folder.join(ROOT_CONFIG_FILE)).chain(user_config_path());
    for path in candidates {
        if path.exists() {
            info!("Loading config file: {}", path.display());
            return read_toml_config(&path);
        }
    }

    warn!("No config file found, using defaults");
    Ok(TomlConfig::default())
}

/// Read and parse one TOML file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolve the LLM API token: `GITHUB_TOKEN`, then `<root>/token.txt`
pub fn resolve_llm_token(root_folder: &Path) -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if is_valid_token(&token) {
            info!("LLM token loaded from environment variable");
            return Some(token.trim().to_string());
        }
    }

    let token_file = root_folder.join(TOKEN_FILE);
    match std::fs::read_to_string(&token_file) {
        Ok(token) if is_valid_token(&token) => {
            info!("LLM token loaded from {}", token_file.display());
            Some(token.trim().to_string())
        }
        Ok(_) => {
            warn!("Token file {} is empty", token_file.display());
            None
        }
        Err(_) => {
            warn!(
                "{} not set and no {} in {}; natural-language endpoints are disabled",
                TOKEN_ENV,
                TOKEN_FILE,
                root_folder.display()
            );
            None
        }
    }
}

/// Token must be non-empty after trimming
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}
