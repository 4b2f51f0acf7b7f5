//! # Core Logic - Shared Utilities for Multi-Chain Dispatch
//!
//! Chain-agnostic plumbing shared by the dispatch binaries: typed errors,
//! run configuration values, credential loading, logging and shutdown.
//!
//! ## Modules
//!
//! - [`config`] - Delay policy, confirmation settings, wallet sources
//! - [`error`] - Typed error handling with thiserror
//! - [`traits`] - Run statistics and the credential loader seam
//! - `utils` - Logging, credential parsing, cancellation helpers

pub mod config;
pub mod error;
pub mod traits;
pub(crate) mod utils;

pub use config::{ConfirmationConfig, DelayPolicy, WalletSource};
pub use error::{ConfigError, CoreError, NetworkError, WalletError};
pub use traits::{CredentialLoader, RunStats};

pub use utils::logger::RESULT_TARGET;
pub use utils::{setup_logger, Credential, CredentialSource, WorkerRunner};
