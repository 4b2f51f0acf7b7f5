//! Sequential, jittered dispatch of the greeting call across wallets and
//! chains.
//!
//! One attempt is in flight at a time: wallets run one after another on a
//! chain, and chains run one after another in configuration order. Between
//! two wallets of the same chain the scheduler sleeps for a delay sampled
//! from its [`DelayPolicy`]. Failures are recorded and never stop the batch.

mod result;

pub use result::{AttemptError, BatchResult, ChainRun, DispatchAttempt, DispatchSummary};

use crate::chain::client::derive_address;
use crate::chain::{ChainProfile, Connector, GreetingClient};
use crate::error::DispatchError;
use crate::report::DispatchReporter;
use core_logic::{ConfirmationConfig, Credential, DelayPolicy, WorkerRunner};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

pub struct DispatchScheduler {
    delay_policy: DelayPolicy,
    confirmation: ConfirmationConfig,
    cancel: CancellationToken,
}

impl DispatchScheduler {
    pub fn new(delay_policy: DelayPolicy, confirmation: ConfirmationConfig) -> Self {
        Self {
            delay_policy,
            confirmation,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe an external token (e.g. Ctrl+C). Cancellation takes effect
    /// before the next wallet or chain, never in the middle of an attempt.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Send from every credential, in order, on one chain.
    pub async fn run_single_chain<C: GreetingClient>(
        &self,
        client: &C,
        credentials: &[Credential],
        reporter: &mut dyn DispatchReporter,
    ) -> BatchResult {
        let mut batch = BatchResult::default();

        if !credentials.is_empty() {
            let (run, cancelled) = self.dispatch_chain(client, credentials, reporter).await;
            batch.cancelled = cancelled;
            Self::finish_chain(&mut batch, run, reporter);
        }

        reporter.batch_finished(&batch, &batch.summary());
        batch
    }

    /// Run the full credential list against each chain in turn.
    pub async fn run_all_chains<K: Connector>(
        &self,
        connector: &K,
        chains: &[ChainProfile],
        credentials: &[Credential],
        reporter: &mut dyn DispatchReporter,
    ) -> BatchResult {
        let mut batch = BatchResult::default();

        if !credentials.is_empty() {
            for profile in chains {
                if self.cancel.is_cancelled() {
                    batch.cancelled = true;
                    break;
                }

                let (run, cancelled) = match connector.connect(profile) {
                    Ok(client) => self.dispatch_chain(&client, credentials, reporter).await,
                    Err(err) => (
                        Self::record_unreachable(profile, credentials, &err, reporter),
                        false,
                    ),
                };

                batch.cancelled = cancelled;
                Self::finish_chain(&mut batch, run, reporter);
                if cancelled {
                    break;
                }
            }
        }

        reporter.batch_finished(&batch, &batch.summary());
        batch
    }

    /// Dispatch over `chains`; a single chain behaves like [`Self::run_single_chain`].
    pub async fn run<K: Connector>(
        &self,
        connector: &K,
        chains: &[ChainProfile],
        credentials: &[Credential],
        reporter: &mut dyn DispatchReporter,
    ) -> BatchResult {
        let [profile] = chains else {
            return self
                .run_all_chains(connector, chains, credentials, reporter)
                .await;
        };

        if credentials.is_empty() {
            let batch = BatchResult::default();
            reporter.batch_finished(&batch, &batch.summary());
            return batch;
        }

        match connector.connect(profile) {
            Ok(client) => self.run_single_chain(&client, credentials, reporter).await,
            Err(err) => {
                let mut batch = BatchResult::default();
                let run = Self::record_unreachable(profile, credentials, &err, reporter);
                Self::finish_chain(&mut batch, run, reporter);
                reporter.batch_finished(&batch, &batch.summary());
                batch
            }
        }
    }

    /// Append a finished chain and hand the batch so far to the reporter.
    fn finish_chain(batch: &mut BatchResult, run: ChainRun, reporter: &mut dyn DispatchReporter) {
        let summary = run.summary();
        batch.chains.push(run);
        if let Some(run) = batch.chains.last() {
            reporter.chain_finished(run, &summary, &*batch);
        }
    }

    async fn dispatch_chain<C: GreetingClient>(
        &self,
        client: &C,
        credentials: &[Credential],
        reporter: &mut dyn DispatchReporter,
    ) -> (ChainRun, bool) {
        let profile = client.profile();
        let mut run = ChainRun::new(profile.name());
        let mut cancelled = false;

        reporter.chain_started(profile, credentials.len());

        for (i, credential) in credentials.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let span = info_span!("wallet", chain = profile.name(), line = credential.line());
            let attempt = self
                .dispatch_one(client, credential)
                .instrument(span)
                .await;
            reporter.attempt_finished(&attempt);
            run.attempts.push(attempt);

            if i + 1 < credentials.len() {
                let delay = self.sample_delay();
                reporter.delay_sampled(delay);
                if !WorkerRunner::sleep_or_cancel(&self.cancel, delay).await {
                    cancelled = true;
                    break;
                }
            }
        }

        (run, cancelled)
    }

    /// nonce → gas price → sign → submit → receipt. Any failure short-circuits.
    async fn dispatch_one<C: GreetingClient>(
        &self,
        client: &C,
        credential: &Credential,
    ) -> DispatchAttempt {
        let profile = client.profile();

        let wallet = match derive_address(credential) {
            Ok(addr) => addr,
            Err(e) => return DispatchAttempt::failed(profile, None, None, &e.into()),
        };
        let fail = |err: DispatchError| DispatchAttempt::failed(profile, Some(wallet), None, &err);

        let nonce = match client.get_nonce(wallet).await {
            Ok(nonce) => nonce,
            Err(e) => return fail(e),
        };
        let gas_price = match client.get_gas_price().await {
            Ok(price) => price,
            Err(e) => return fail(e),
        };

        let signed = match client.build_and_sign(credential, nonce, gas_price) {
            Ok(signed) => signed,
            Err(e) => return fail(e),
        };
        debug!("Signed greeting {:?} (nonce {})", signed.hash, nonce);

        let tx_hash = match client.submit(&signed).await {
            Ok(hash) => hash,
            Err(e) => return fail(e),
        };
        debug!("Submitted {}", profile.explorer_url(&tx_hash));

        match client
            .await_confirmation(tx_hash, self.confirmation.timeout)
            .await
        {
            Ok(confirmation) => {
                DispatchAttempt::confirmed(profile, wallet, tx_hash, &confirmation)
            }
            Err(e) => DispatchAttempt::failed(profile, Some(wallet), Some(tx_hash), &e),
        }
    }

    fn record_unreachable(
        profile: &ChainProfile,
        credentials: &[Credential],
        err: &DispatchError,
        reporter: &mut dyn DispatchReporter,
    ) -> ChainRun {
        warn!("Could not build client for {}: {}", profile.name(), err);
        let mut run = ChainRun::new(profile.name());
        reporter.chain_started(profile, credentials.len());
        for credential in credentials {
            let attempt =
                DispatchAttempt::failed(profile, derive_address(credential).ok(), None, err);
            reporter.attempt_finished(&attempt);
            run.attempts.push(attempt);
        }
        run
    }

    fn sample_delay(&self) -> Duration {
        self.delay_policy.sample(&mut rand::thread_rng())
    }
}

impl Default for DispatchScheduler {
    fn default() -> Self {
        Self::new(DelayPolicy::default(), ConfirmationConfig::default())
    }
}
