use crate::chain::{ChainProfile, ChainProfileToml, ChainRegistry, ALL_CHAINS};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use core_logic::{ConfigError, ConfirmationConfig, CredentialSource, DelayPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const RPC_URL_SUFFIX: &str = "_RPC_URL";

/// Keys that may be set from the environment; anything else there is ignored.
const ENV_KEYS: &[&str] = &[
    "chain",
    "min_delay_between_wallets",
    "max_delay_between_wallets",
    "shuffle_wallets",
    "private_keys_file",
    "confirmation_timeout_secs",
    "receipt_poll_interval_ms",
    "rpc_timeout_secs",
];

/// Settings for one run, resolved once at start-up and passed down
/// explicitly.
#[derive(Debug, Deserialize, Clone)]
pub struct GmConfig {
    #[serde(default = "default_chain")]
    pub chain: String,
    #[serde(default = "default_min_delay")]
    pub min_delay_between_wallets: f64,
    #[serde(default = "default_max_delay")]
    pub max_delay_between_wallets: f64,
    #[serde(default)]
    pub shuffle_wallets: bool,
    #[serde(default = "default_keys_file")]
    pub private_keys_file: PathBuf,
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_rpc_timeout")]
    pub rpc_timeout_secs: u64,
    #[serde(default)]
    pub chains: Vec<ChainProfileToml>,
    /// Lower-cased chain name → RPC URL, from `<CHAIN>_RPC_URL` variables.
    #[serde(skip)]
    pub rpc_overrides: BTreeMap<String, String>,
}

fn default_chain() -> String {
    "monad".to_string()
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    3.0
}

fn default_keys_file() -> PathBuf {
    PathBuf::from(CredentialSource::DEFAULT_KEYS_FILE)
}

fn default_confirmation_timeout() -> u64 {
    ConfirmationConfig::DEFAULT_TIMEOUT_SECS
}

fn default_poll_interval() -> u64 {
    ConfirmationConfig::DEFAULT_POLL_INTERVAL_MS
}

fn default_rpc_timeout() -> u64 {
    30
}

impl GmConfig {
    /// Optional TOML file at `path`, overridden by environment variables
    /// (`CHAIN`, `MIN_DELAY_BETWEEN_WALLETS`, `SHUFFLE_WALLETS`, `MONAD_RPC_URL`, ...).
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Same as [`Self::load`] with an explicit set of environment variables.
    pub fn load_with_env(path: &str, vars: Vec<(String, String)>) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::default()
                    .source(Some(Self::recognised_env(vars.iter().cloned())))
                    .try_parsing(true),
            );

        let mut config = Self::build(builder)?;
        config.rpc_overrides = Self::collect_rpc_overrides(vars.into_iter());
        config.validate()?;
        Ok(config)
    }

    /// TOML content only, no environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder().add_source(File::from_str(content, FileFormat::Toml));
        let config = Self::build(builder)?;
        config.validate()?;
        Ok(config)
    }

    fn build(
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| ConfigError::Load { msg: e.to_string() })
    }

    fn recognised_env(
        vars: impl Iterator<Item = (String, String)>,
    ) -> config::Map<String, String> {
        vars.filter_map(|(key, value)| {
            let key = key.to_lowercase();
            ENV_KEYS.contains(&key.as_str()).then_some((key, value))
        })
        .collect()
    }

    fn collect_rpc_overrides(
        vars: impl Iterator<Item = (String, String)>,
    ) -> BTreeMap<String, String> {
        vars.filter_map(|(key, value)| {
            key.strip_suffix(RPC_URL_SUFFIX)
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_lowercase(), value))
        })
        .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delay_policy()?;
        self.confirmation()?;
        if self.rpc_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "rpc_timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn delay_policy(&self) -> Result<DelayPolicy, ConfigError> {
        DelayPolicy::from_secs_f64(
            self.min_delay_between_wallets,
            self.max_delay_between_wallets,
        )
    }

    pub fn confirmation(&self) -> Result<ConfirmationConfig, ConfigError> {
        ConfirmationConfig::new(
            Duration::from_secs(self.confirmation_timeout_secs),
            Duration::from_millis(self.receipt_poll_interval_ms),
        )
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Built-in chains, then `[[chains]]` entries, then RPC overrides.
    pub fn registry(&self) -> Result<ChainRegistry, ConfigError> {
        // configured entries may shadow a built-in but not each other
        let mut configured = ChainRegistry::empty();
        for entry in &self.chains {
            configured.insert(ChainProfile::try_from(entry.clone())?)?;
        }

        let mut registry = ChainRegistry::builtin();
        for profile in configured.profiles() {
            registry.upsert(profile.clone());
        }

        let known: Vec<String> = registry.names().iter().map(|n| n.to_lowercase()).collect();
        for (name, url) in &self.rpc_overrides {
            if known.contains(name) {
                registry.override_rpc(name, url.clone())?;
            } else {
                warn!("Ignoring {}{}: no chain named '{}'", name.to_uppercase(), RPC_URL_SUFFIX, name);
            }
        }

        Ok(registry)
    }

    /// Chains to run: every registered chain for `--all` or a chain name of
    /// `all`, otherwise the named chain (`requested` over the configured one).
    pub fn select_chains(
        &self,
        registry: &ChainRegistry,
        requested: Option<&str>,
        all: bool,
    ) -> Result<Vec<ChainProfile>, ConfigError> {
        let name = requested.unwrap_or(&self.chain).trim();
        if all || name.eq_ignore_ascii_case(ALL_CHAINS) {
            return Ok(registry.profiles().to_vec());
        }
        Ok(vec![registry.get(name)?.clone()])
    }

    pub fn credential_source(&self) -> CredentialSource {
        CredentialSource::from_path(self.private_keys_file.clone())
    }
}

impl Default for GmConfig {
    fn default() -> Self {
        Self {
            chain: default_chain(),
            min_delay_between_wallets: default_min_delay(),
            max_delay_between_wallets: default_max_delay(),
            shuffle_wallets: false,
            private_keys_file: default_keys_file(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            receipt_poll_interval_ms: default_poll_interval(),
            rpc_timeout_secs: default_rpc_timeout(),
            chains: Vec::new(),
            rpc_overrides: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML: &str = r#"
chain = "unichain"
min_delay_between_wallets = 2
max_delay_between_wallets = 5.5
shuffle_wallets = true
private_keys_file = "keys/main.txt"
confirmation_timeout_secs = 60

[[chains]]
name = "Unichain"
chain_id = 1301
rpc_url = "https://sepolia.unichain.org"
contract = "0x34287F1ceF9B009195B89801Ae4e2DFE708719aB"
selector = "0x5011b71c"
value_ether = "0.000029"
gas_limit = 150000
explorer = "https://sepolia.uniscan.xyz/tx/{tx_hash}"
"#;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = GmConfig::from_toml_str("").unwrap();
        assert_eq!(config.chain, "monad");
        assert!(!config.shuffle_wallets);
        assert_eq!(config.private_keys_file, PathBuf::from("data/private_keys.txt"));
        assert_eq!(
            config.delay_policy().unwrap(),
            DelayPolicy::from_secs_f64(1.0, 3.0).unwrap()
        );
        assert_eq!(config.confirmation().unwrap().timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_full_file() {
        let config = GmConfig::from_toml_str(TOML).unwrap();
        assert!(config.shuffle_wallets);
        assert_eq!(config.delay_policy().unwrap().max(), Duration::from_millis(5500));
        assert_eq!(config.confirmation_timeout_secs, 60);

        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), vec!["Monad", "Unichain"]);
        assert_eq!(registry.get(&config.chain).unwrap().chain_id(), 1301);
    }

    #[test]
    fn test_inverted_delays_rejected() {
        let err = GmConfig::from_toml_str(
            "min_delay_between_wallets = 4\nmax_delay_between_wallets = 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_duplicate_configured_chain_rejected() {
        let doubled = format!("{}{}", TOML, &TOML[TOML.find("[[chains]]").unwrap()..]);
        let config = GmConfig::from_toml_str(&doubled).unwrap();
        assert!(matches!(
            config.registry(),
            Err(ConfigError::DuplicateChain { .. })
        ));
    }

    #[test]
    fn test_rpc_overrides_from_env_pairs() {
        let vars = vec![
            ("MONAD_RPC_URL".to_string(), "http://localhost:8545".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("_RPC_URL".to_string(), "http://ignored".to_string()),
        ];
        let mut config = GmConfig::default();
        config.rpc_overrides = GmConfig::collect_rpc_overrides(vars.into_iter());
        assert_eq!(config.rpc_overrides.len(), 1);

        let registry = config.registry().unwrap();
        assert_eq!(
            registry.get("monad").unwrap().rpc_endpoint(),
            "http://localhost:8545"
        );
    }

    #[test]
    fn test_bad_override_url_is_config_error() {
        let mut config = GmConfig::default();
        config
            .rpc_overrides
            .insert("monad".into(), "not a url".into());
        assert!(matches!(
            config.registry(),
            Err(ConfigError::InvalidRpcUrl { .. })
        ));
    }

    #[test]
    fn test_chain_all_selects_every_chain() {
        let config = GmConfig::from_toml_str(&TOML.replace(
            "chain = \"unichain\"",
            "chain = \"ALL\"",
        ))
        .unwrap();
        let registry = config.registry().unwrap();

        let chains = config.select_chains(&registry, None, false).unwrap();
        let names: Vec<&str> = chains.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["Monad", "Unichain"]);

        let chains = config.select_chains(&registry, Some("all"), false).unwrap();
        assert_eq!(chains.len(), 2);

        let chains = config.select_chains(&registry, Some("monad"), false).unwrap();
        assert_eq!(chains[0].chain_id(), 10143);
    }

    #[test]
    fn test_select_named_chain_and_flag() {
        let config = GmConfig::default();
        let registry = config.registry().unwrap();

        assert_eq!(config.select_chains(&registry, None, false).unwrap().len(), 1);
        assert_eq!(config.select_chains(&registry, None, true).unwrap().len(), 1);
        assert!(matches!(
            config.select_chains(&registry, Some("megaeth"), false),
            Err(ConfigError::UnknownChain { .. })
        ));
    }

    #[test]
    fn test_environment_limited_to_known_keys() {
        let vars = vec![
            ("CHAIN".to_string(), "all".to_string()),
            ("MIN_DELAY_BETWEEN_WALLETS".to_string(), "2".to_string()),
            ("SHUFFLE_WALLETS".to_string(), "true".to_string()),
            ("CHAINS".to_string(), "not a table".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("MONAD_RPC_URL".to_string(), "http://localhost:8545".to_string()),
        ];
        let config = GmConfig::load_with_env("does/not/exist/gm", vars).unwrap();

        assert_eq!(config.chain, "all");
        assert_eq!(config.min_delay_between_wallets, 2.0);
        assert!(config.shuffle_wallets);
        assert!(config.chains.is_empty());
        assert_eq!(
            config.registry().unwrap().get("monad").unwrap().rpc_endpoint(),
            "http://localhost:8545"
        );
    }
}
