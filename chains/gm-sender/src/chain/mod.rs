//! Static chain descriptors and the name → profile registry.

pub mod client;

pub use client::{
    ChainClient, Confirmation, Connector, GreetingClient, HttpConnector, SignedGreeting,
};

use core_logic::ConfigError;
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Substitution slot in an explorer URL template, see [`ChainProfile::explorer_url`].
pub const TX_HASH_SLOT: &str = "{tx_hash}";

/// Chain name (any case) that selects every registered chain; no profile may use it.
pub const ALL_CHAINS: &str = "all";

/// Minimum gas any transaction burns; greeting calls need strictly more.
pub const INTRINSIC_GAS: u64 = 21_000;

/// Everything needed to send the greeting call on one chain.
///
/// Immutable once built; construct through [`ChainProfile::new`] or
/// [`ChainProfileToml`] so the invariants are checked.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ChainProfile {
    name: String,
    chain_id: u64,
    rpc_endpoint: String,
    contract_address: Address,
    call_selector: [u8; 4],
    value_wei: U256,
    gas_limit: u64,
    explorer_template: String,
}

impl ChainProfile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        chain_id: u64,
        rpc_endpoint: impl Into<String>,
        contract_address: Address,
        call_selector: [u8; 4],
        value_wei: U256,
        gas_limit: u64,
        explorer_template: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let profile = Self {
            name: name.into(),
            chain_id,
            rpc_endpoint: rpc_endpoint.into(),
            contract_address,
            call_selector,
            value_wei,
            gas_limit,
            explorer_template: explorer_template.into(),
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Monad testnet GM contract.
    pub fn monad() -> Self {
        Self {
            name: "Monad".to_string(),
            chain_id: 10143,
            rpc_endpoint: "https://testnet-rpc.monad.xyz".to_string(),
            contract_address: Address::from([
                0x34, 0x28, 0x7f, 0x1c, 0xef, 0x9b, 0x00, 0x91, 0x95, 0xb8, 0x98, 0x01, 0xae,
                0x4e, 0x2d, 0xfe, 0x70, 0x87, 0x19, 0xab,
            ]),
            call_selector: [0x50, 0x11, 0xb7, 0x1c],
            // 0.000029 ETH
            value_wei: U256::from(29_000_000_000_000u64),
            gas_limit: 300_000,
            explorer_template: "https://testnet.monvision.io/tx/{tx_hash}".to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "chains.name".into(),
            });
        }
        if self.name.trim().eq_ignore_ascii_case(ALL_CHAINS) {
            return Err(ConfigError::InvalidValue {
                field: "chains.name".into(),
                reason: format!("'{}' is reserved for running every chain", ALL_CHAINS),
            });
        }
        let url = url::Url::parse(&self.rpc_endpoint).map_err(|_| ConfigError::InvalidRpcUrl {
            url: self.rpc_endpoint.clone(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidRpcUrl {
                url: self.rpc_endpoint.clone(),
            });
        }
        if self.gas_limit <= INTRINSIC_GAS {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.gas_limit", self.name),
                reason: format!("{} must be greater than {}", self.gas_limit, INTRINSIC_GAS),
            });
        }
        if self.explorer_template.matches(TX_HASH_SLOT).count() != 1 {
            return Err(ConfigError::InvalidValue {
                field: format!("{}.explorer_template", self.name),
                reason: format!("must contain exactly one {} slot", TX_HASH_SLOT),
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn rpc_endpoint(&self) -> &str {
        &self.rpc_endpoint
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn call_selector(&self) -> [u8; 4] {
        self.call_selector
    }

    pub fn value_wei(&self) -> U256 {
        self.value_wei
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn explorer_url(&self, tx_hash: &TxHash) -> String {
        self.explorer_template
            .replace(TX_HASH_SLOT, &format!("{:?}", tx_hash))
    }

    pub(crate) fn with_rpc_endpoint(mut self, rpc_endpoint: String) -> Result<Self, ConfigError> {
        self.rpc_endpoint = rpc_endpoint;
        self.validate()?;
        Ok(self)
    }
}

impl fmt::Debug for ChainProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainProfile")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("rpc_endpoint", &self.rpc_endpoint)
            .field("contract_address", &self.contract_address)
            .field("call_selector", &format!("0x{}", hex::encode(self.call_selector)))
            .field("value_wei", &self.value_wei)
            .field("gas_limit", &self.gas_limit)
            .finish()
    }
}

/// `[[chains]]` entry as written in the TOML config.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainProfileToml {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub contract: String,
    pub selector: String,
    #[serde(default)]
    pub value_wei: Option<u64>,
    #[serde(default)]
    pub value_ether: Option<String>,
    pub gas_limit: u64,
    pub explorer: String,
}

impl TryFrom<ChainProfileToml> for ChainProfile {
    type Error = ConfigError;

    fn try_from(toml: ChainProfileToml) -> Result<Self, Self::Error> {
        let field = |f: &str| format!("{}.{}", toml.name, f);

        let contract_address: Address =
            toml.contract
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    field: field("contract"),
                    reason: format!("{}", e),
                })?;

        let selector_hex = toml.selector.trim_start_matches("0x");
        let call_selector: [u8; 4] = hex::decode(selector_hex)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: field("selector"),
                reason: format!("'{}' is not a 4-byte hex selector", toml.selector),
            })?;

        let value_wei = match (toml.value_wei, &toml.value_ether) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    field: field("value_wei"),
                    reason: "set either value_wei or value_ether, not both".into(),
                })
            }
            (Some(wei), None) => U256::from(wei),
            (None, Some(ether)) => {
                ethers::utils::parse_ether(ether).map_err(|e| ConfigError::InvalidValue {
                    field: field("value_ether"),
                    reason: e.to_string(),
                })?
            }
            (None, None) => U256::zero(),
        };

        ChainProfile::new(
            toml.name,
            toml.chain_id,
            toml.rpc_url,
            contract_address,
            call_selector,
            value_wei,
            toml.gas_limit,
            toml.explorer,
        )
    }
}

/// Supported chains in configuration order, looked up case-insensitively.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    profiles: Vec<ChainProfile>,
}

impl ChainRegistry {
    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Registry seeded with the built-in profiles.
    pub fn builtin() -> Self {
        Self {
            profiles: vec![ChainProfile::monad()],
        }
    }

    /// Add a profile, replacing any existing one with the same name in place.
    pub fn upsert(&mut self, profile: ChainProfile) {
        match self.position(profile.name()) {
            Some(idx) => self.profiles[idx] = profile,
            None => self.profiles.push(profile),
        }
    }

    /// Add a profile; a second profile with the same name is an error.
    pub fn insert(&mut self, profile: ChainProfile) -> Result<(), ConfigError> {
        if self.position(profile.name()).is_some() {
            return Err(ConfigError::DuplicateChain {
                name: profile.name().to_string(),
            });
        }
        self.profiles.push(profile);
        Ok(())
    }

    pub fn override_rpc(&mut self, name: &str, rpc_endpoint: String) -> Result<(), ConfigError> {
        let idx = self.position(name).ok_or_else(|| self.unknown(name))?;
        self.profiles[idx] = self.profiles[idx].clone().with_rpc_endpoint(rpc_endpoint)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ChainProfile, ConfigError> {
        self.position(name)
            .map(|idx| &self.profiles[idx])
            .ok_or_else(|| self.unknown(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name()).collect()
    }

    pub fn profiles(&self) -> &[ChainProfile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.profiles
            .iter()
            .position(|p| p.name().eq_ignore_ascii_case(wanted))
    }

    fn unknown(&self, name: &str) -> ConfigError {
        ConfigError::UnknownChain {
            name: name.to_string(),
            available: self.names().join(", "),
        }
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> ChainProfileToml {
        ChainProfileToml {
            name: "Unichain".into(),
            chain_id: 1301,
            rpc_url: "https://sepolia.unichain.org".into(),
            contract: "0x34287F1ceF9B009195B89801Ae4e2DFE708719aB".into(),
            selector: "0x5011b71c".into(),
            value_wei: None,
            value_ether: Some("0.000029".into()),
            gas_limit: 150_000,
            explorer: "https://sepolia.uniscan.xyz/tx/{tx_hash}".into(),
        }
    }

    #[test]
    fn test_builtin_monad_profile_is_valid() {
        let monad = ChainProfile::monad();
        monad.validate().unwrap();
        assert_eq!(monad.chain_id(), 10143);
        assert_eq!(monad.call_selector(), [0x50, 0x11, 0xb7, 0x1c]);
        assert_eq!(
            monad.contract_address(),
            "0x34287F1ceF9B009195B89801Ae4e2DFE708719aB"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_explorer_url_substitutes_hash() {
        let monad = ChainProfile::monad();
        let hash = TxHash::repeat_byte(0xab);
        let url = monad.explorer_url(&hash);
        assert_eq!(
            url,
            format!("https://testnet.monvision.io/tx/0x{}", "ab".repeat(32))
        );
    }

    #[test]
    fn test_toml_profile_conversion() {
        let profile = ChainProfile::try_from(sample_toml()).unwrap();
        assert_eq!(profile.value_wei(), U256::from(29_000_000_000_000u64));
        assert_eq!(profile.gas_limit(), 150_000);
    }

    #[test]
    fn test_gas_limit_must_exceed_intrinsic() {
        let mut toml = sample_toml();
        toml.gas_limit = 21_000;
        assert!(matches!(
            ChainProfile::try_from(toml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bad_selector_and_template_rejected() {
        let mut toml = sample_toml();
        toml.selector = "0x5011".into();
        assert!(ChainProfile::try_from(toml).is_err());

        let mut toml = sample_toml();
        toml.explorer = "https://sepolia.uniscan.xyz/tx/".into();
        assert!(ChainProfile::try_from(toml).is_err());
    }

    #[test]
    fn test_reserved_name_rejected() {
        let mut toml = sample_toml();
        toml.name = "All".into();
        assert!(matches!(
            ChainProfile::try_from(toml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_rpc_url_must_be_http() {
        let mut toml = sample_toml();
        toml.rpc_url = "not a url".into();
        assert!(matches!(
            ChainProfile::try_from(toml),
            Err(ConfigError::InvalidRpcUrl { .. })
        ));
    }

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let mut registry = ChainRegistry::builtin();
        registry
            .insert(ChainProfile::try_from(sample_toml()).unwrap())
            .unwrap();

        assert_eq!(registry.get("MONAD").unwrap().name(), "Monad");
        assert_eq!(registry.get("unichain").unwrap().chain_id(), 1301);
        assert_eq!(registry.names(), vec!["Monad", "Unichain"]);

        match registry.get("megaeth") {
            Err(ConfigError::UnknownChain { available, .. }) => {
                assert_eq!(available, "Monad, Unichain")
            }
            other => panic!("Expected UnknownChain, got {:?}", other),
        }
    }

    #[test]
    fn test_registry_rejects_duplicates_and_upserts_in_place() {
        let mut registry = ChainRegistry::builtin();
        assert!(registry.insert(ChainProfile::monad()).is_err());

        let mut toml = sample_toml();
        toml.name = "monad".into();
        registry.upsert(ChainProfile::try_from(toml).unwrap());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("Monad").unwrap().chain_id(), 1301);
    }

    #[test]
    fn test_rpc_override() {
        let mut registry = ChainRegistry::builtin();
        registry
            .override_rpc("monad", "http://127.0.0.1:8545".into())
            .unwrap();
        assert_eq!(
            registry.get("monad").unwrap().rpc_endpoint(),
            "http://127.0.0.1:8545"
        );
        assert!(registry.override_rpc("monad", "ftp://x".into()).is_err());
    }
}
