//! Per-attempt failure taxonomy.
//!
//! None of these abort a batch: the scheduler turns each one into a failed
//! [`DispatchAttempt`](crate::dispatch::DispatchAttempt) and moves on.

use core_logic::{NetworkError, WalletError};
use ethers::providers::{ProviderError, RpcError};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Network error during {operation}: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: NetworkError,
    },

    #[error("Signing failed: {source}")]
    Signing {
        #[source]
        source: WalletError,
    },

    #[error("Transaction rejected by node: {reason}")]
    Submission { reason: String },

    #[error("No receipt for {tx_hash} after {}s", .timeout.as_secs())]
    ConfirmationTimeout { tx_hash: String, timeout: Duration },
}

/// Stable, serialisable tag for a [`DispatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkError,
    SigningError,
    SubmissionError,
    ConfirmationTimeout,
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::Network { .. } => FailureKind::NetworkError,
            DispatchError::Signing { .. } => FailureKind::SigningError,
            DispatchError::Submission { .. } => FailureKind::SubmissionError,
            DispatchError::ConfirmationTimeout { .. } => FailureKind::ConfirmationTimeout,
        }
    }

    /// Classify a provider failure on a read call (nonce, gas price, receipt).
    pub fn from_provider(operation: &'static str, endpoint: &str, err: &ProviderError) -> Self {
        let reason = err.to_string();
        let source = if let Some(resp) = err.as_error_response() {
            NetworkError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: format!("RPC error {}: {}", resp.code, resp.message),
            }
        } else if err.as_serde_error().is_some() {
            NetworkError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason,
            }
        } else {
            NetworkError::Transport {
                endpoint: endpoint.to_string(),
                reason,
            }
        };
        DispatchError::Network { operation, source }
    }

    pub fn network(operation: &'static str, source: NetworkError) -> Self {
        DispatchError::Network { operation, source }
    }
}

impl From<WalletError> for DispatchError {
    fn from(source: WalletError) -> Self {
        DispatchError::Signing { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        let err = DispatchError::Submission {
            reason: "nonce too low".into(),
        };
        assert_eq!(err.kind(), FailureKind::SubmissionError);
        assert_eq!(
            serde_json::to_string(&err.kind()).unwrap(),
            "\"submission_error\""
        );

        let err: DispatchError = WalletError::InvalidKeyFormat.into();
        assert_eq!(err.kind(), FailureKind::SigningError);
    }

    #[test]
    fn test_timeout_message() {
        let err = DispatchError::ConfirmationTimeout {
            tx_hash: "0xabc".into(),
            timeout: Duration::from_secs(120),
        };
        assert_eq!(err.to_string(), "No receipt for 0xabc after 120s");
    }
}
