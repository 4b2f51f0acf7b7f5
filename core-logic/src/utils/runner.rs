use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Returns a token that is cancelled on Ctrl+C.
    ///
    /// Work in progress is not interrupted; loops are expected to check the
    /// token between units of work.
    pub fn shutdown_token() -> CancellationToken {
        let token = CancellationToken::new();
        let cloned_token = token.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!(target: super::logger::RESULT_TARGET, "🛑 Received Ctrl+C. Finishing current wallet, then stopping...");
                    cloned_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        token
    }

    /// Sleeps for `duration` unless the token fires first.
    /// Returns `false` when the sleep was cut short by cancellation.
    pub async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
        if duration.is_zero() {
            return !token.is_cancelled();
        }
        tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_cancel() {
        let token = CancellationToken::new();
        let start = tokio::time::Instant::now();
        assert!(WorkerRunner::sleep_or_cancel(&token, Duration::from_secs(2)).await);
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_cut_short_by_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(!WorkerRunner::sleep_or_cancel(&token, Duration::from_secs(60)).await);
    }
}
