//! Boundary between the scheduler and whatever shows results to a human.

use crate::chain::ChainProfile;
use crate::dispatch::{BatchResult, ChainRun, DispatchAttempt, DispatchSummary};
use anyhow::{Context, Result};
use core_logic::RESULT_TARGET;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Receives results as the scheduler produces them.
///
/// Every attempt is delivered as soon as it finishes. After each chain the
/// reporter also sees the batch accumulated so far, and the final batch
/// once every chain is done.
pub trait DispatchReporter: Send {
    fn chain_started(&mut self, _profile: &ChainProfile, _wallets: usize) {}

    fn attempt_finished(&mut self, attempt: &DispatchAttempt);

    fn delay_sampled(&mut self, _delay: Duration) {}

    fn chain_finished(
        &mut self,
        run: &ChainRun,
        summary: &DispatchSummary,
        batch_so_far: &BatchResult,
    );

    fn batch_finished(&mut self, batch: &BatchResult, summary: &DispatchSummary);
}

/// Writes results to the `task_result` log target (console + log file).
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    chains_seen: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DispatchReporter for ConsoleReporter {
    fn chain_started(&mut self, profile: &ChainProfile, wallets: usize) {
        self.chains_seen += 1;
        info!(
            target: RESULT_TARGET,
            "=== {} (chain {}) | {} wallet(s) ===",
            profile.name(),
            profile.chain_id(),
            wallets
        );
    }

    fn attempt_finished(&mut self, attempt: &DispatchAttempt) {
        let wallet = attempt.short_wallet();
        match (&attempt.error, attempt.succeeded) {
            (None, true) => info!(
                target: RESULT_TARGET,
                "SUCCESS GM on {} from {} | {}",
                attempt.chain_name,
                wallet,
                attempt.explorer_url.as_deref().unwrap_or("-")
            ),
            (None, false) => info!(
                target: RESULT_TARGET,
                "REVERTED GM on {} from {} (most likely 24 hours haven't passed yet) | {}",
                attempt.chain_name,
                wallet,
                attempt.explorer_url.as_deref().unwrap_or("-")
            ),
            (Some(err), _) => info!(
                target: RESULT_TARGET,
                "FAILED GM on {} from {}: {}",
                attempt.chain_name,
                wallet,
                err.message
            ),
        }
    }

    fn delay_sampled(&mut self, delay: Duration) {
        if !delay.is_zero() {
            info!(
                target: RESULT_TARGET,
                "⏳ Waiting {:.1}s before next wallet...",
                delay.as_secs_f64()
            );
        }
    }

    fn chain_finished(
        &mut self,
        run: &ChainRun,
        summary: &DispatchSummary,
        _batch_so_far: &BatchResult,
    ) {
        info!(
            target: RESULT_TARGET,
            "{} Summary: {} successful, {} failed",
            run.chain_name,
            summary.succeeded,
            summary.failed
        );
    }

    fn batch_finished(&mut self, batch: &BatchResult, summary: &DispatchSummary) {
        info!(target: RESULT_TARGET, "=== Overall Summary ===");
        if self.chains_seen > 1 {
            info!(target: RESULT_TARGET, "Chains: {}", batch.chains.len());
        }
        info!(target: RESULT_TARGET, "Total transactions: {}", summary.total);
        info!(target: RESULT_TARGET, "Successful: {}", summary.succeeded);
        info!(target: RESULT_TARGET, "Failed: {}", summary.failed);
        if summary.total > 0 {
            info!(target: RESULT_TARGET, "Success rate: {:.1}%", summary.success_rate());
        }
        if batch.cancelled {
            info!(target: RESULT_TARGET, "Run was cancelled before all wallets were processed.");
        }
    }
}

/// Write the final batch as pretty JSON.
pub async fn export_json(batch: &BatchResult, path: &Path) -> Result<()> {
    let json = batch
        .to_json_pretty()
        .context("Failed to serialise batch result")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_export_json_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/batch.json");

        export_json(&BatchResult::default(), &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["summary"]["total"], 0);
        assert_eq!(json["cancelled"], false);
    }
}
