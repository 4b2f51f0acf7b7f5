use crate::chain::{ChainProfile, Confirmation};
use crate::error::{DispatchError, FailureKind};
use core_logic::RunStats;
use ethers::types::{Address, TxHash};
use serde::Serialize;

/// `{total, succeeded, failed}` for one chain or a whole batch.
pub type DispatchSummary = RunStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&DispatchError> for AttemptError {
    fn from(err: &DispatchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of sending the greeting from one wallet on one chain.
///
/// Exactly one shape holds:
/// - confirmed: `succeeded`, `tx_hash` set, no `error`
/// - reverted on-chain: not `succeeded`, `tx_hash` set, no `error`
/// - failed before or without a receipt: not `succeeded`, `error` set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchAttempt {
    pub chain_name: String,
    pub wallet_address: Option<Address>,
    pub tx_hash: Option<TxHash>,
    pub explorer_url: Option<String>,
    pub succeeded: bool,
    pub error: Option<AttemptError>,
}

impl DispatchAttempt {
    pub fn confirmed(
        profile: &ChainProfile,
        wallet: Address,
        tx_hash: TxHash,
        confirmation: &Confirmation,
    ) -> Self {
        Self {
            chain_name: profile.name().to_string(),
            wallet_address: Some(wallet),
            tx_hash: Some(tx_hash),
            explorer_url: Some(profile.explorer_url(&tx_hash)),
            succeeded: confirmation.succeeded,
            error: None,
        }
    }

    /// `tx_hash` is kept when the failure happened after submission.
    pub fn failed(
        profile: &ChainProfile,
        wallet: Option<Address>,
        tx_hash: Option<TxHash>,
        err: &DispatchError,
    ) -> Self {
        Self {
            chain_name: profile.name().to_string(),
            wallet_address: wallet,
            tx_hash,
            explorer_url: tx_hash.map(|h| profile.explorer_url(&h)),
            succeeded: false,
            error: Some(err.into()),
        }
    }

    pub fn reverted(&self) -> bool {
        !self.succeeded && self.error.is_none()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// `0x1234...abcd`, or `unknown` when the key never decoded.
    pub fn short_wallet(&self) -> String {
        match self.wallet_address {
            Some(addr) => {
                let full = format!("{:?}", addr);
                format!("{}...{}", &full[..6], &full[full.len() - 4..])
            }
            None => "unknown".to_string(),
        }
    }
}

/// All attempts made against one chain, in credential order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRun {
    pub chain_name: String,
    pub attempts: Vec<DispatchAttempt>,
}

impl ChainRun {
    pub fn new(chain_name: impl Into<String>) -> Self {
        Self {
            chain_name: chain_name.into(),
            attempts: Vec::new(),
        }
    }

    pub fn summary(&self) -> DispatchSummary {
        self.attempts.iter().map(|a| a.succeeded).collect()
    }
}

/// Attempts grouped by chain, chains in the order they were run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    pub chains: Vec<ChainRun>,
    pub cancelled: bool,
}

impl BatchResult {
    /// Every attempt, chain by chain.
    pub fn attempts(&self) -> impl Iterator<Item = &DispatchAttempt> {
        self.chains.iter().flat_map(|c| c.attempts.iter())
    }

    pub fn len(&self) -> usize {
        self.chains.iter().map(|c| c.attempts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> DispatchSummary {
        let mut total = DispatchSummary::default();
        for chain in &self.chains {
            total.merge(&chain.summary());
        }
        total
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Report<'a> {
            summary: DispatchSummary,
            #[serde(flatten)]
            batch: &'a BatchResult,
        }
        serde_json::to_string_pretty(&Report {
            summary: self.summary(),
            batch: self,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wallet() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    fn mined(succeeded: bool) -> Confirmation {
        Confirmation {
            succeeded,
            raw_status: Some(succeeded as u64),
            block_number: Some(1),
        }
    }

    #[test]
    fn test_attempt_shapes() {
        let profile = ChainProfile::monad();
        let hash = TxHash::repeat_byte(1);

        let ok = DispatchAttempt::confirmed(&profile, wallet(), hash, &mined(true));
        assert!(ok.succeeded && ok.error.is_none() && ok.tx_hash.is_some());
        assert!(!ok.reverted());

        let reverted = DispatchAttempt::confirmed(&profile, wallet(), hash, &mined(false));
        assert!(reverted.reverted());
        assert!(reverted.explorer_url.is_some());

        let timeout = DispatchError::ConfirmationTimeout {
            tx_hash: format!("{:?}", hash),
            timeout: Duration::from_secs(1),
        };
        let failed = DispatchAttempt::failed(&profile, Some(wallet()), Some(hash), &timeout);
        assert!(!failed.succeeded && !failed.reverted());
        assert_eq!(failed.failure_kind(), Some(FailureKind::ConfirmationTimeout));
    }

    #[test]
    fn test_short_wallet() {
        let profile = ChainProfile::monad();
        let err = DispatchError::Submission {
            reason: "x".into(),
        };
        let attempt = DispatchAttempt::failed(&profile, Some(wallet()), None, &err);
        assert_eq!(attempt.short_wallet(), "0xf39f...2266");

        let attempt = DispatchAttempt::failed(&profile, None, None, &err);
        assert_eq!(attempt.short_wallet(), "unknown");
    }

    #[test]
    fn test_batch_summary_and_json() {
        let profile = ChainProfile::monad();
        let mut run = ChainRun::new("Monad");
        run.attempts.push(DispatchAttempt::confirmed(
            &profile,
            wallet(),
            TxHash::repeat_byte(2),
            &mined(true),
        ));
        run.attempts.push(DispatchAttempt::failed(
            &profile,
            None,
            None,
            &DispatchError::Submission {
                reason: "nonce too low".into(),
            },
        ));
        let batch = BatchResult {
            chains: vec![run],
            cancelled: false,
        };

        assert_eq!(
            batch.summary(),
            DispatchSummary {
                total: 2,
                succeeded: 1,
                failed: 1
            }
        );

        let json: serde_json::Value = serde_json::from_str(&batch.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(
            json["chains"][0]["attempts"][1]["error"]["kind"],
            "submission_error"
        );
    }
}
