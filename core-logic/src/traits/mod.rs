use crate::error::CoreError;
use crate::utils::wallet_manager::Credential;
use async_trait::async_trait;
use serde::Serialize;

/// Success/failure counters for a chain or a whole batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl RunStats {
    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn merge(&mut self, other: &RunStats) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

impl FromIterator<bool> for RunStats {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut stats = RunStats::default();
        for success in iter {
            stats.record(success);
        }
        stats
    }
}

#[async_trait]
pub trait CredentialLoader: Send + Sync {
    /// Load every usable key, optionally in random order.
    async fn load(&self, shuffle: bool) -> Result<Vec<Credential>, CoreError>;
}
