//! Per-language server configuration.
//!
//! Built-in defaults cover the common servers; a JSON override file can
//! replace or extend them without recompiling.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SessionError;

/// How the server endpoint is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Spawn the server binary locally and talk over stdio.
    Stdio,
    /// Run the server inside a container with the workspace mounted at
    /// `/workspace`, talking over the container's stdio.
    Docker,
    /// Connect to an already-running server over TCP.
    Tcp { address: String },
}

impl Default for ServerMode {
    fn default() -> Self {
        Self::Stdio
    }
}

/// Configuration for one language's server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Language name this server handles ("python", "rust", ...).
    pub language: String,
    /// Executable and arguments for stdio mode.
    pub command: Vec<String>,
    /// Identifier sent in textDocument/didOpen.
    pub language_id: String,
    /// Container image for docker mode.
    #[serde(default)]
    pub docker_image: Option<String>,
    #[serde(default)]
    pub mode: ServerMode,
    /// Per-request deadline in milliseconds.
    #[serde(default = "defaults::request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Deadline for the initialize handshake in milliseconds.
    #[serde(default = "defaults::handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Restart budget for transient failures before the session faults.
    #[serde(default = "defaults::restart_attempts")]
    pub restart_attempts: u32,
    /// Base delay for exponential restart backoff in milliseconds.
    #[serde(default = "defaults::backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Whether requests may be pipelined. Serialized is the safe
    /// default; many servers process in arrival order regardless.
    #[serde(default)]
    pub pipeline: bool,
}

mod defaults {
    pub fn request_timeout_ms() -> u64 {
        10_000
    }
    pub fn handshake_timeout_ms() -> u64 {
        30_000
    }
    pub fn restart_attempts() -> u32 {
        3
    }
    pub fn backoff_base_ms() -> u64 {
        500
    }
}

impl ServerConfig {
    pub fn new(language: &str, language_id: &str, command: &[&str]) -> Self {
        Self {
            language: language.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            language_id: language_id.to_string(),
            docker_image: None,
            mode: ServerMode::Stdio,
            request_timeout_ms: defaults::request_timeout_ms(),
            handshake_timeout_ms: defaults::handshake_timeout_ms(),
            restart_attempts: defaults::restart_attempts(),
            backoff_base_ms: defaults::backoff_base_ms(),
            pipeline: false,
        }
    }

    pub fn with_docker_image(mut self, image: &str) -> Self {
        self.docker_image = Some(image.to_string());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

/// Registry of server configurations keyed by language.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    configs: HashMap<String, ServerConfig>,
}

impl ServerRegistry {
    /// Registry with built-in defaults for the supported languages.
    pub fn builtin() -> Self {
        let mut configs = HashMap::new();
        for config in [
            ServerConfig::new("python", "python", &["pyright-langserver", "--stdio"])
                .with_docker_image("scribe-lsp-python"),
            ServerConfig::new(
                "typescript",
                "typescript",
                &["typescript-language-server", "--stdio"],
            )
            .with_docker_image("scribe-lsp-typescript"),
            ServerConfig::new("rust", "rust", &["rust-analyzer"]),
            ServerConfig::new("go", "go", &["gopls"]),
            ServerConfig::new("java", "java", &["jdtls"]),
        ] {
            configs.insert(config.language.clone(), config);
        }
        Self { configs }
    }

    /// Loads overrides from a JSON file mapping language name to
    /// [`ServerConfig`], replacing any built-in entry.
    pub fn load_overrides(&mut self, path: &Path) -> Result<(), SessionError> {
        let text = std::fs::read_to_string(path)?;
        let overrides: HashMap<String, ServerConfig> = serde_json::from_str(&text)?;
        for (language, config) in overrides {
            debug!(language, "applying server config override");
            self.configs.insert(language, config);
        }
        Ok(())
    }

    pub fn config_for(&self, language: &str) -> Option<&ServerConfig> {
        self.configs.get(language)
    }

    pub fn insert(&mut self, config: ServerConfig) {
        self.configs.insert(config.language.clone(), config);
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}
