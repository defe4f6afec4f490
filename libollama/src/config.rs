/// Ollama-specific configuration that extends the base `Config` from core.
///
/// This configuration includes:
/// - All editor options from `libtypo_core::Config` (flattened via serde)
/// - Inference service location, model and sampling options
/// - Supervisor timing (probe timeout, poll interval, attempt bound)
/// - The command used to start the service
/// - Recognizer service location for the drawing/IMU flow
///
/// # Example
///
/// ```rust
/// use libollama::OllamaConfig;
///
/// let config = OllamaConfig::default();
/// let base_config = config.into_base();
/// // Use base_config with CorrectionEngine::new()
/// ```
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use libtypo_core::ConfigError;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Editor configuration fields (trigger, trailing space, context window...)
    #[serde(flatten)]
    pub base: libtypo_core::Config,

    /// Base URL of the inference service
    pub host: String,
    /// Model name passed with every request
    pub model: String,
    /// Sampling temperature (omitted from requests when unset)
    pub temperature: Option<f32>,

    // Timeouts (milliseconds)
    /// Deadline for a single correction request
    pub request_timeout_ms: u64,
    /// Deadline for a single liveness probe
    pub probe_timeout_ms: u64,

    // Startup polling
    /// Delay between liveness probes after spawning the service
    pub poll_interval_ms: u64,
    /// Probes attempted after spawning before giving up
    pub max_poll_attempts: u32,

    /// Program and arguments that start the service
    pub serve_command: Vec<String>,

    /// Correction cache entries (0 disables the cache)
    pub cache_size: usize,

    /// Base URL of the character recognizer service
    pub recognizer_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base: libtypo_core::Config::default(),
            host: "http://127.0.0.1:11434".to_string(),
            model: "llama3".to_string(),
            temperature: None,
            request_timeout_ms: 30_000,
            probe_timeout_ms: 2_000,
            poll_interval_ms: 1_000,
            max_poll_attempts: 10,
            serve_command: vec!["ollama".to_string(), "serve".to_string()],
            cache_size: 256,
            recognizer_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl OllamaConfig {
    /// Convert this config into the base config for use with `CorrectionEngine::new()`
    pub fn into_base(self) -> libtypo_core::Config {
        self.base
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &libtypo_core::Config {
        &self.base
    }

    /// Get a mutable reference to the base config
    pub fn base_mut(&mut self) -> &mut libtypo_core::Config {
        &mut self.base
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `{host}{path}` with exactly one slash between them.
    pub fn endpoint(&self, path: &str) -> String {
        join_url(&self.host, path)
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.probe_timeout(), Duration::from_secs(2));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.max_poll_attempts, 10);
        assert_eq!(config.serve_command, vec!["ollama", "serve"]);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let mut config = OllamaConfig::default();
        assert_eq!(config.endpoint("/api/tags"), "http://127.0.0.1:11434/api/tags");
        config.host = "http://localhost:9/".into();
        assert_eq!(config.endpoint("api/generate"), "http://localhost:9/api/generate");
    }

    #[test]
    fn test_flattened_base_fields() {
        let config = OllamaConfig::from_toml_str(
            r#"
            model = "mistral"
            temperature = 0.1
            trailing_space = true
            context_chars = 24
            "#,
        )
        .unwrap();
        assert_eq!(config.model, "mistral");
        assert_eq!(config.temperature, Some(0.1));
        assert!(config.base().trailing_space);
        assert_eq!(config.base().context_chars, 24);
        assert_eq!(config.host, "http://127.0.0.1:11434");
    }
}
