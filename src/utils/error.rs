use std::num::ParseIntError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetnsError {
    #[error("Allocation failed for {what}: {reason}")]
    AllocationError { what: String, reason: String },

    #[error("Registration failed: {message}")]
    RegistrationError { message: String },

    #[error("Invalid value {input:?} for attribute '{attribute}': {source}")]
    ParseError {
        attribute: String,
        input: String,
        #[source]
        source: ParseIntError,
    },

    #[error("Entry '{name}' already exists under '{parent}'")]
    AlreadyExists { parent: String, name: String },

    #[error("No such entry: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid entry name {name:?}")]
    InvalidName { name: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': '{value}' - {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Resource,
    Lifecycle,
    Input,
    Tree,
    Configuration,
}

impl NetnsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NetnsError::AllocationError { .. } => ErrorCategory::Resource,
            NetnsError::RegistrationError { .. } => ErrorCategory::Lifecycle,
            NetnsError::ParseError { .. } => ErrorCategory::Input,
            NetnsError::AlreadyExists { .. }
            | NetnsError::NotFound { .. }
            | NetnsError::PermissionDenied { .. }
            | NetnsError::InvalidName { .. } => ErrorCategory::Tree,
            NetnsError::IoError(_)
            | NetnsError::ConfigError { .. }
            | NetnsError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Short message for terminal output; the `Display` form stays for logs.
    pub fn user_friendly_message(&self) -> String {
        match self {
            NetnsError::AllocationError { what, .. } => format!("Could not create {}", what),
            NetnsError::RegistrationError { .. } => {
                "Could not register namespace hooks; nothing was left behind".to_string()
            }
            NetnsError::ParseError { input, .. } => {
                format!("'{}' is not a base-10 integer", input.trim_end())
            }
            NetnsError::NotFound { path } => format!("'{}' does not exist in this namespace", path),
            NetnsError::PermissionDenied { path } => format!("Not allowed to access '{}'", path),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NetnsError>;
