use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the operator's private keys come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WalletSource {
    File { path: PathBuf },
    Inline { name: String, content: String },
}

/// Randomized pause inserted between two wallets of the same batch.
///
/// Sampling is uniform over `[min, max]` and collapses to `min` when both
/// bounds are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DelayPolicy {
    min: Duration,
    max: Duration,
}

impl DelayPolicy {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidValue {
                field: "min_delay_between_wallets".into(),
                reason: format!("{:?} is greater than max {:?}", min, max),
            });
        }
        Ok(Self { min, max })
    }

    pub fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Build from the fractional-second values used in `.env` / TOML.
    pub fn from_secs_f64(min_secs: f64, max_secs: f64) -> Result<Self, ConfigError> {
        let to_duration = |field: &str, secs: f64| {
            Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("{} ({})", secs, e),
            })
        };
        Self::new(
            to_duration("min_delay_between_wallets", min_secs)?,
            to_duration("max_delay_between_wallets", max_secs)?,
        )
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.is_fixed() {
            return self.min;
        }
        let min_us = self.min.as_micros() as u64;
        let max_us = self.max.as_micros() as u64;
        Duration::from_micros(rng.gen_range(min_us..=max_us))
    }

    /// Human-readable range, e.g. `1s` or `1-3s`.
    pub fn display_range(&self) -> String {
        if self.is_fixed() {
            format!("{}s", self.min.as_secs_f64())
        } else {
            format!("{}-{}s", self.min.as_secs_f64(), self.max.as_secs_f64())
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(3),
        }
    }
}

/// Settings for the receipt wait after a transaction has been accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ConfirmationConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

    pub fn new(timeout: Duration, poll_interval: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "confirmation_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "receipt_poll_interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self {
            timeout,
            poll_interval,
        })
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(Self::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}
