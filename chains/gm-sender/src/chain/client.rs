use super::ChainProfile;
use crate::error::DispatchError;
use async_trait::async_trait;
use core_logic::{Credential, NetworkError, WalletError};
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, U256, U64};
use std::time::Duration;
use tracing::{debug, warn};

/// A greeting transaction signed and ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedGreeting {
    pub from: Address,
    pub nonce: U256,
    pub hash: TxHash,
    pub raw: Bytes,
}

/// Mined receipt status of a submitted greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub succeeded: bool,
    pub raw_status: Option<u64>,
    pub block_number: Option<u64>,
}

impl From<&TransactionReceipt> for Confirmation {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            succeeded: receipt.status == Some(U64::from(1)),
            raw_status: receipt.status.map(|s| s.as_u64()),
            block_number: receipt.block_number.map(|b| b.as_u64()),
        }
    }
}

/// Parse a credential into a chain-bound signer.
pub fn signer_for(credential: &Credential, chain_id: u64) -> Result<LocalWallet, WalletError> {
    let hex_part = credential.expose_secret().trim_start_matches("0x");
    if hex_part.len() != 64 {
        return Err(WalletError::InvalidKeyLength {
            length: hex_part.len(),
        });
    }
    let wallet = hex_part
        .parse::<LocalWallet>()
        .map_err(|_| WalletError::InvalidKeyFormat)?;
    Ok(wallet.with_chain_id(chain_id))
}

/// Public address of a credential. Pure, no network access.
pub fn derive_address(credential: &Credential) -> Result<Address, WalletError> {
    Ok(signer_for(credential, 1)?.address())
}

/// RPC surface the scheduler needs from one chain.
///
/// Signing only depends on the [`ChainProfile`], so it is provided here and
/// every implementation produces byte-identical transactions.
#[async_trait]
pub trait GreetingClient: Send + Sync {
    fn profile(&self) -> &ChainProfile;

    async fn get_nonce(&self, address: Address) -> Result<U256, DispatchError>;

    async fn get_gas_price(&self) -> Result<U256, DispatchError>;

    async fn submit(&self, signed: &SignedGreeting) -> Result<TxHash, DispatchError>;

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<Confirmation, DispatchError>;

    fn build_and_sign(
        &self,
        credential: &Credential,
        nonce: U256,
        gas_price: U256,
    ) -> Result<SignedGreeting, DispatchError> {
        let profile = self.profile();
        let wallet = signer_for(credential, profile.chain_id())?;
        let from = wallet.address();

        let tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(profile.contract_address())
            .data(Bytes::from(profile.call_selector().to_vec()))
            .value(profile.value_wei())
            .gas(profile.gas_limit())
            .gas_price(gas_price)
            .nonce(nonce)
            .chain_id(profile.chain_id())
            .into();

        let signature = wallet
            .sign_transaction_sync(&tx)
            .map_err(|e| WalletError::SigningFailed {
                reason: e.to_string(),
            })?;

        Ok(SignedGreeting {
            from,
            nonce,
            hash: tx.hash(&signature),
            raw: tx.rlp_signed(&signature),
        })
    }
}

/// JSON-RPC client for one chain, parameterized by its [`ChainProfile`].
#[derive(Debug, Clone)]
pub struct ChainClient<P = Http> {
    profile: ChainProfile,
    provider: Provider<P>,
    poll_interval: Duration,
}

impl ChainClient<Http> {
    /// HTTP client with a per-request timeout. Does not touch the network.
    pub fn connect(profile: ChainProfile, rpc_timeout: Duration) -> Result<Self, DispatchError> {
        let endpoint = profile.rpc_endpoint().to_string();
        let transport_err = |reason: String| {
            DispatchError::network(
                "connect",
                NetworkError::Transport {
                    endpoint: endpoint.clone(),
                    reason,
                },
            )
        };

        let url = reqwest::Url::parse(&endpoint).map_err(|e| transport_err(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(rpc_timeout)
            .build()
            .map_err(|e| transport_err(e.to_string()))?;

        let provider = Provider::new(Http::new_with_client(url, client));
        Ok(Self::with_provider(profile, provider))
    }
}

impl<P: JsonRpcClient> ChainClient<P> {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    pub fn with_provider(profile: ChainProfile, provider: Provider<P>) -> Self {
        Self {
            profile,
            provider,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.profile.chain_id()
    }

    pub fn contract_address(&self) -> Address {
        self.profile.contract_address()
    }

    pub fn call_selector(&self) -> [u8; 4] {
        self.profile.call_selector()
    }

    fn read_err(&self, operation: &'static str, err: &ProviderError) -> DispatchError {
        DispatchError::from_provider(operation, self.profile.rpc_endpoint(), err)
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> GreetingClient for ChainClient<P> {
    fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    async fn get_nonce(&self, address: Address) -> Result<U256, DispatchError> {
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(|e| self.read_err("nonce lookup", &e))
    }

    async fn get_gas_price(&self) -> Result<U256, DispatchError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| self.read_err("gas price lookup", &e))
    }

    async fn submit(&self, signed: &SignedGreeting) -> Result<TxHash, DispatchError> {
        let pending = match self.provider.send_raw_transaction(signed.raw.clone()).await {
            Ok(pending) => pending,
            // node answered and said no: nonce too low, insufficient funds, ...
            Err(e) if e.as_error_response().is_some() => {
                let reason = e
                    .as_error_response()
                    .map(|resp| resp.message.clone())
                    .unwrap_or_else(|| e.to_string());
                return Err(DispatchError::Submission { reason });
            }
            Err(e) => return Err(self.read_err("submission", &e)),
        };

        let tx_hash = pending.tx_hash();
        if tx_hash != signed.hash {
            warn!(
                "{} returned hash {:?}, expected {:?}",
                self.profile.name(),
                tx_hash,
                signed.hash
            );
        }
        Ok(tx_hash)
    }

    async fn await_confirmation(
        &self,
        tx_hash: TxHash,
        timeout: Duration,
    ) -> Result<Confirmation, DispatchError> {
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Confirmation::from(&receipt),
                    Ok(None) => debug!("{:?} still pending on {}", tx_hash, self.profile.name()),
                    Err(e) => warn!(
                        "Receipt lookup for {:?} on {} failed: {}",
                        tx_hash,
                        self.profile.name(),
                        e
                    ),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| DispatchError::ConfirmationTimeout {
                tx_hash: format!("{:?}", tx_hash),
                timeout,
            })
    }
}

/// Builds the client for a chain when the scheduler reaches it.
pub trait Connector: Send + Sync {
    type Client: GreetingClient;

    fn connect(&self, profile: &ChainProfile) -> Result<Self::Client, DispatchError>;
}

/// Production connector: one HTTP JSON-RPC client per chain.
#[derive(Debug, Clone, Copy)]
pub struct HttpConnector {
    rpc_timeout: Duration,
    poll_interval: Duration,
}

impl HttpConnector {
    pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(rpc_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            rpc_timeout,
            poll_interval,
        }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RPC_TIMEOUT, Duration::from_secs(1))
    }
}

impl Connector for HttpConnector {
    type Client = ChainClient<Http>;

    fn connect(&self, profile: &ChainProfile) -> Result<Self::Client, DispatchError> {
        Ok(ChainClient::connect(profile.clone(), self.rpc_timeout)?
            .with_poll_interval(self.poll_interval))
    }
}
