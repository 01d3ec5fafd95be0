//! Structured error types for configuration loading and bootstrapping.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Loader errors
    FileNotFound,
    DirectoryNotFound,
    InvalidYaml,
    InvalidInitFile,
    MalformedDirective,
    CircularConfiguration,
    OutsideRoot,

    // Subsystem errors
    DuplicateSubsystem,
    SubsystemNotFound,
    MethodNotFound,
    AccessDenied,

    // Ambient errors
    InvalidSettings,
    Io,
}

impl ErrorCode {
    /// The code string carried on the wire and in CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::DirectoryNotFound => "DIRECTORY_NOT_FOUND",
            ErrorCode::InvalidYaml => "INVALID_YAML",
            ErrorCode::InvalidInitFile => "INVALID_INIT_FILE",
            ErrorCode::MalformedDirective => "MALFORMED_DIRECTIVE",
            ErrorCode::CircularConfiguration => "CIRCULAR_CONFIGURATION",
            ErrorCode::OutsideRoot => "OUTSIDE_ROOT",
            ErrorCode::DuplicateSubsystem => "DUPLICATE_SUBSYSTEM",
            ErrorCode::SubsystemNotFound => "SUBSYSTEM_NOT_FOUND",
            ErrorCode::MethodNotFound => "METHOD_NOT_FOUND",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::InvalidSettings => "INVALID_SETTINGS",
            ErrorCode::Io => "IO",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by every fallible operation in the crate.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct InitError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl InitError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
            key: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    // Convenience constructors

    pub fn file_not_found(path: &Path, err: impl fmt::Display) -> Self {
        let shown = crate::paths::to_forward_slashes(path);
        Self::new(
            ErrorCode::FileNotFound,
            format!("Unable to read {}: {}", shown, err),
        )
        .with_path(shown)
    }

    pub fn directory_not_found(path: &Path) -> Self {
        let shown = crate::paths::to_forward_slashes(path);
        Self::new(
            ErrorCode::DirectoryNotFound,
            format!("Not a readable directory: {}", shown),
        )
        .with_path(shown)
    }

    /// Wraps a parser failure; the parser's own message is kept verbatim.
    pub fn invalid_yaml(path: Option<&Path>, err: impl fmt::Display) -> Self {
        let err = Self::new(ErrorCode::InvalidYaml, err.to_string());
        match path {
            Some(p) => err.with_path(crate::paths::to_forward_slashes(p)),
            None => err,
        }
    }

    pub fn invalid_init_file(path: &Path) -> Self {
        let shown = crate::paths::to_forward_slashes(path);
        Self::new(
            ErrorCode::InvalidInitFile,
            format!("Initialization file is not a mapping: {}", shown),
        )
        .with_path(shown)
    }

    pub fn malformed_directive(key: &str) -> Self {
        Self::new(
            ErrorCode::MalformedDirective,
            format!("Invalid initialization entry type - {}", key),
        )
        .with_key(key)
    }

    pub fn circular(path: &Path) -> Self {
        let shown = crate::paths::to_forward_slashes(path);
        Self::new(
            ErrorCode::CircularConfiguration,
            format!("Configuration extends into itself: {}", shown),
        )
        .with_path(shown)
    }

    pub fn outside_root(path: &Path) -> Self {
        let shown = crate::paths::to_forward_slashes(path);
        Self::new(
            ErrorCode::OutsideRoot,
            format!("Path leaves the configuration root: {}", shown),
        )
        .with_path(shown)
    }

    pub fn duplicate_subsystem(name: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateSubsystem,
            format!("Subsystem already registered: {}", name),
        )
    }

    pub fn subsystem_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::SubsystemNotFound,
            format!("Subsystem not found: {}", name),
        )
    }

    pub fn method_not_found(subsystem: &str, method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Subsystem {} has no method {}", subsystem, method),
        )
    }

    pub fn access_denied(subsystem: &str, method: &str) -> Self {
        Self::new(
            ErrorCode::AccessDenied,
            format!("Method {} of subsystem {} is not visible here", method, subsystem),
        )
    }

    pub fn invalid_settings(reason: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidSettings, reason.to_string())
    }

    pub fn io(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::Io, err.to_string())
    }
}

/// Result type for loader and bootstrap operations.
pub type InitResult<T> = std::result::Result<T, InitError>;
