use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub claude: ClaudeConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

// Manual Debug impl to avoid leaking the API key
impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Toolchain binaries are configurable so deployments can point at
/// versioned interpreters (e.g. `python3.12`) without rebuilding.
#[derive(Debug, Deserialize, Clone)]
pub struct SandboxConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Parent directory for single-use workspaces; system temp when unset.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_python_bin")]
    pub python_bin: String,
    #[serde(default = "default_node_bin")]
    pub node_bin: String,
    #[serde(default = "default_cxx_bin")]
    pub cxx_bin: String,
    #[serde(default = "default_javac_bin")]
    pub javac_bin: String,
    #[serde(default = "default_java_bin")]
    pub java_bin: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            base_dir: None,
            python_bin: default_python_bin(),
            node_bin: default_node_bin(),
            cxx_bin: default_cxx_bin(),
            javac_bin: default_javac_bin(),
            java_bin: default_java_bin(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    #[serde(default = "default_max_review_iterations")]
    pub max_review_iterations: u32,
    #[serde(default = "default_max_total_iterations")]
    pub max_total_iterations: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_review_iterations: default_max_review_iterations(),
            max_total_iterations: default_max_total_iterations(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_python_bin() -> String {
    "python3".to_string()
}

fn default_node_bin() -> String {
    "node".to_string()
}

fn default_cxx_bin() -> String {
    "g++".to_string()
}

fn default_javac_bin() -> String {
    "javac".to_string()
}

fn default_java_bin() -> String {
    "java".to_string()
}

fn default_max_review_iterations() -> u32 {
    3
}

fn default_max_total_iterations() -> u32 {
    5
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(config::File::with_name("crucible").required(false));
        }

        // Environment variable overrides with CRUCIBLE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("CRUCIBLE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn claude_api_key(&self) -> &str {
        &self.claude.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_defaults() {
        let sandbox = SandboxConfig::default();
        assert_eq!(sandbox.timeout_secs, 10);
        assert_eq!(sandbox.python_bin, "python3");
        assert_eq!(sandbox.cxx_bin, "g++");

        let workflow = WorkflowConfig::default();
        assert_eq!(workflow.max_review_iterations, 3);
        assert_eq!(workflow.max_total_iterations, 5);
    }

    #[test]
    fn test_claude_config_debug_redacts_key() {
        let cfg = ClaudeConfig {
            api_key: "sk-secret".to_string(),
            model: default_model(),
            max_tokens: default_max_tokens(),
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
