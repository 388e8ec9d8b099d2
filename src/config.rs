//! Configuration system for domru-check
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (DOMRU_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Main tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Lookup batch settings
    pub lookup: LookupSettings,

    /// HTTP client settings
    pub http: HttpSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Output settings
    pub output: OutputSettings,
}

/// Lookup batch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupSettings {
    /// Maximum lookups in flight at once
    pub concurrency: usize,

    /// Per-lookup timeout in seconds (0 = no timeout)
    pub task_timeout_secs: u64,

    /// Render a live completed/total counter on stderr
    pub progress: bool,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Proxy URL, e.g. socks5://127.0.0.1:9050 (None = direct)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,

    /// Total request timeout in milliseconds
    pub request_timeout_ms: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format: plain, json, csv
    pub format: String,
}

// Default implementations

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            lookup: LookupSettings::default(),
            http: HttpSettings::default(),
            logging: LoggingSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            task_timeout_secs: 0, // No per-lookup timeout
            progress: true,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout_ms: 10000,
            request_timeout_ms: 30000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "plain".to_string(),
        }
    }
}

impl CheckConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
            config = toml::from_str(&content)
                .map_err(|e| Error::config_parse(e.to_string()))?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let expanded = shellexpand::tilde(path);
            let path = PathBuf::from(expanded.as_ref());
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            // Current directory
            PathBuf::from("domru-check.toml"),
            PathBuf::from("config.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("domru-check").join("config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".domru-check").join("config.toml"))
                .unwrap_or_default(),
            // System config (Linux)
            PathBuf::from("/etc/domru-check/config.toml"),
        ];

        for path in &search_paths {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Lookup settings
        if let Ok(val) = std::env::var("DOMRU_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                self.lookup.concurrency = n;
            }
        }
        if let Ok(val) = std::env::var("DOMRU_TASK_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.lookup.task_timeout_secs = n;
            }
        }
        if let Ok(val) = std::env::var("DOMRU_PROGRESS") {
            self.lookup.progress = val.to_lowercase() == "true" || val == "1";
        }

        // HTTP settings
        if let Ok(val) = std::env::var("DOMRU_PROXY") {
            self.http.proxy = Some(val);
        }
        if let Ok(val) = std::env::var("DOMRU_CONNECT_TIMEOUT_MS") {
            if let Ok(n) = val.parse() {
                self.http.connect_timeout_ms = n;
            }
        }
        if let Ok(val) = std::env::var("DOMRU_REQUEST_TIMEOUT_MS") {
            if let Ok(n) = val.parse() {
                self.http.request_timeout_ms = n;
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("DOMRU_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("DOMRU_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("DOMRU_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }

        // Output settings
        if let Ok(val) = std::env::var("DOMRU_OUTPUT_FORMAT") {
            self.output.format = val;
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.lookup.concurrency == 0 {
            return Err(Error::Config(
                "lookup.concurrency must be at least 1".to_string(),
            ));
        }

        if let Some(ref proxy) = self.http.proxy {
            let parsed = url::Url::parse(proxy).map_err(|e| Error::ProxyInvalid {
                proxy: proxy.clone(),
                message: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https" | "socks5" | "socks5h") {
                return Err(Error::ProxyInvalid {
                    proxy: proxy.clone(),
                    message: "scheme must be http, https, socks5 or socks5h".to_string(),
                });
            }
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        // Validate output format
        let valid_formats = ["plain", "json", "csv"];
        if !valid_formats.contains(&self.output.format.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid output format '{}'. Must be one of: {}",
                self.output.format,
                valid_formats.join(", ")
            )));
        }

        Ok(())
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<()> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".domru-check")
                .join("config.toml")
        });

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    // Generate default config with comments
    let config_content = generate_default_config();

    // Write the file
    fs::write(&config_path, config_content)
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    println!("Configuration file created: {}", config_path.display());
    Ok(())
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# domru-check Configuration

[lookup]
# Maximum lookups in flight at once
concurrency = 10

# Per-lookup timeout in seconds (0 = no timeout)
task_timeout_secs = 0

# Render a live completed/total counter on stderr
progress = true

[http]
# Proxy URL (comment out for a direct connection)
# proxy = "socks5://127.0.0.1:9050"

# Connection timeout in milliseconds
connect_timeout_ms = 10000

# Total request timeout in milliseconds
request_timeout_ms = 30000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.domru-check/logs/domru-check.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false

[output]
# Output format: plain, json, csv
format = "plain"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert_eq!(config.lookup.concurrency, 10);
        assert_eq!(config.lookup.task_timeout_secs, 0);
        assert!(config.lookup.progress);
        assert!(config.http.proxy.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.output.format, "plain");
    }

    #[test]
    fn test_env_override() {
        env::set_var("DOMRU_CONCURRENCY", "25");
        env::set_var("DOMRU_PROXY", "socks5://127.0.0.1:9050");
        env::set_var("DOMRU_LOG_LEVEL", "debug");

        let mut config = CheckConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.lookup.concurrency, 25);
        assert_eq!(
            config.http.proxy.as_deref(),
            Some("socks5://127.0.0.1:9050")
        );
        assert_eq!(config.logging.level, "debug");

        env::remove_var("DOMRU_CONCURRENCY");
        env::remove_var("DOMRU_PROXY");
        env::remove_var("DOMRU_LOG_LEVEL");
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let mut config = CheckConfig::default();
        config.lookup.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_proxy() {
        let mut config = CheckConfig::default();
        config.http.proxy = Some("ftp://proxy.example.com".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = CheckConfig::default();
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_output_format() {
        let mut config = CheckConfig::default();
        config.output.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_valid_config() {
        let config = CheckConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = CheckConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: CheckConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.lookup.concurrency, parsed.lookup.concurrency);
        assert_eq!(config.output.format, parsed.output.format);
    }

    #[test]
    fn test_parse_config_file() {
        let config_str = r#"
[lookup]
concurrency = 4
task_timeout_secs = 30
progress = false

[http]
proxy = "socks5://127.0.0.1:9050"
request_timeout_ms = 60000

[logging]
level = "debug"
"#;

        let config: CheckConfig = toml::from_str(config_str).unwrap();

        assert_eq!(config.lookup.concurrency, 4);
        assert_eq!(config.lookup.task_timeout_secs, 30);
        assert!(!config.lookup.progress);
        assert_eq!(
            config.http.proxy.as_deref(),
            Some("socks5://127.0.0.1:9050")
        );
        assert_eq!(config.http.request_timeout_ms, 60000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_generated_default_parses() {
        let config: CheckConfig = toml::from_str(&generate_default_config()).unwrap();
        assert!(config.validate().is_ok());
    }
}
