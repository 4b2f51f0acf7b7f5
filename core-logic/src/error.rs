//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),

    #[error(transparent)]
    Network(NetworkError),
}

impl CoreError {
    /// Configuration problems abort the run before any chain is contacted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Config(_))
    }
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown chain '{name}' (available: {available})")]
    UnknownChain { name: String, available: String },

    #[error("Duplicate chain name '{name}'")]
    DuplicateChain { name: String },

    #[error("Invalid RPC URL format: '{url}'")]
    InvalidRpcUrl { url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },

    #[error("Failed to load configuration: {msg}")]
    Load { msg: String },
}

/// Wallet and credential errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WalletError {
    #[error("No private keys found in {source_name}")]
    EmptySource { source_name: String },

    #[error("Invalid private key format: expected hex string")]
    InvalidKeyFormat,

    #[error("Invalid private key length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },

    #[error("Signing failed: {reason}")]
    SigningFailed { reason: String },
}

/// Network and RPC-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        let err: CoreError = ConfigError::FileNotFound {
            path: "data/private_keys.txt".into(),
        }
        .into();
        assert!(err.is_fatal());

        let err: CoreError = WalletError::EmptySource {
            source_name: "keys.txt".into(),
        }
        .into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unknown_chain_message_lists_available() {
        let err = ConfigError::UnknownChain {
            name: "foo".into(),
            available: "monad, unichain".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown chain 'foo' (available: monad, unichain)"
        );
    }
}
