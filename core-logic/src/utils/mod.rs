//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

// Internal modules - not part of public API
pub(crate) mod logger;
pub(crate) mod runner;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use logger::setup_logger;
pub use runner::WorkerRunner;
pub use wallet_manager::{Credential, CredentialSource};
