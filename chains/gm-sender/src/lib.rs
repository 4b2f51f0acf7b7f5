//! # GM Sender
//!
//! Sends a fixed zero-argument "greeting" call from a batch of operator
//! wallets to a known contract on one or more EVM chains, one wallet at a
//! time with randomized pacing, and reports per-wallet and per-chain results.
//!
//! ## Modules
//!
//! - [`chain`] - Chain profiles, registry and the JSON-RPC client
//! - [`dispatch`] - Sequential scheduler and the result model
//! - [`report`] - Reporter boundary and the console reporter
//! - [`config`] - TOML / environment configuration for the binary
//! - [`error`] - Per-attempt failure taxonomy

pub mod chain;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod report;

pub use chain::{
    ChainClient, ChainProfile, ChainRegistry, Confirmation, Connector, GreetingClient,
    HttpConnector, SignedGreeting,
};
pub use config::GmConfig;
pub use dispatch::{BatchResult, ChainRun, DispatchAttempt, DispatchScheduler, DispatchSummary};
pub use error::{DispatchError, FailureKind};
pub use report::{ConsoleReporter, DispatchReporter};
