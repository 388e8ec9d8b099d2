//! Error types for domru-check
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for lookup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Network errors (3xx)
    NetworkFailed = 300,
    NetworkTimeout = 301,
    ProxyInvalid = 302,

    // API errors (4xx)
    ApiStatus = 400,
    ApiMalformed = 401,

    // Execution errors (5xx)
    ExecutionFailed = 500,
    ExecutionTimeout = 501,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Network errors
            400..=499 => 40, // API errors
            500..=599 => 50, // Execution errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the tool
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Network Errors
    // ─────────────────────────────────────────────────────────────

    /// Request failed before producing a response
    #[error("Request to {url} failed: {message}")]
    NetworkFailed { url: String, message: String },

    /// Request timed out
    #[error("Request to {url} timed out")]
    NetworkTimeout { url: String },

    /// Proxy URL could not be used
    #[error("Invalid proxy '{proxy}': {message}")]
    ProxyInvalid { proxy: String, message: String },

    /// HTTP client construction or transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // ─────────────────────────────────────────────────────────────
    // API Errors
    // ─────────────────────────────────────────────────────────────

    /// API answered with a non-success status
    #[error("API returned HTTP {status} for {url}")]
    ApiStatus { url: String, status: u16 },

    /// API answered with a body that does not match the expected shape
    #[error("Unexpected API response from {url}: {message}")]
    ApiMalformed { url: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────

    /// Lookup task failed
    #[error("Lookup failed: {0}")]
    Execution(String),

    /// Lookup task timed out
    #[error("Lookup timed out after {timeout_secs}s")]
    ExecutionTimeout { timeout_secs: u64 },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::NetworkFailed { .. } => ErrorCode::NetworkFailed,
            Error::NetworkTimeout { .. } => ErrorCode::NetworkTimeout,
            Error::ProxyInvalid { .. } => ErrorCode::ProxyInvalid,
            Error::Http(e) => {
                if e.is_timeout() {
                    ErrorCode::NetworkTimeout
                } else {
                    ErrorCode::NetworkFailed
                }
            }

            Error::ApiStatus { .. } => ErrorCode::ApiStatus,
            Error::ApiMalformed { .. } => ErrorCode::ApiMalformed,

            Error::Execution(_) => ErrorCode::ExecutionFailed,
            Error::ExecutionTimeout { .. } => ErrorCode::ExecutionTimeout,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NetworkFailed { .. }
                | Error::NetworkTimeout { .. }
                | Error::Http(_)
                | Error::ExecutionTimeout { .. }
                | Error::Io(_)
                | Error::IoRead { .. }
                | Error::IoWrite { .. }
        )
    }

    /// Check if the error is fatal (the run cannot continue)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::Config(_)
                | Error::ProxyInvalid { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'domru-check config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'domru-check config validate' to see details."
            ),
            Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values."
            ),

            Error::NetworkFailed { .. } => Some(
                "Check your network connection. The Dom.ru API may be reachable only from certain regions; try --proxy."
            ),
            Error::NetworkTimeout { .. } => Some(
                "The API is slow or unreachable. Increase request_timeout_ms in config or try --proxy."
            ),
            Error::ProxyInvalid { .. } => Some(
                "Proxy must be a URL like socks5://127.0.0.1:9050 or http://host:port."
            ),

            Error::ApiStatus { .. } => Some(
                "The API rejected the request. It may rate-limit or block your address; try --proxy or retry later."
            ),
            Error::ApiMalformed { .. } => Some(
                "The API response format may have changed. Check for a newer version of this tool."
            ),

            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!("\x1b[31mError [{}]\x1b[0m: {}\n", code.as_str(), self);

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound { path: path.into() }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
        }
    }

    /// Create a network failed error
    pub fn network_failed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::NetworkFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an API status error
    pub fn api_status(url: impl Into<String>, status: u16) -> Self {
        Error::ApiStatus {
            url: url.into(),
            status,
        }
    }

    /// Create an API malformed-response error
    pub fn api_malformed(url: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ApiMalformed {
            url: url.into(),
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
