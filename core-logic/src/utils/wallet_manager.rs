use crate::config::WalletSource;
use crate::error::{ConfigError, CoreError, WalletError};
use crate::traits::CredentialLoader;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One operator private key, normalized to a `0x`-prefixed hex string.
///
/// The key is wiped from memory on drop and never shows up in `Debug`
/// output. Well-formedness is not checked here; a bad key only surfaces
/// when something tries to sign with it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    secret: String,
    #[zeroize(skip)]
    line: usize,
}

impl Credential {
    pub fn new(raw: &str, line: usize) -> Self {
        let trimmed = raw.trim();
        let secret = if trimmed.starts_with("0x") {
            trimmed.to_string()
        } else {
            format!("0x{}", trimmed)
        };
        Self { secret, line }
    }

    /// Normalized key, only meant to be handed to a signer.
    pub fn expose_secret(&self) -> &str {
        &self.secret
    }

    /// 1-based line in the source the key was read from.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("line", &self.line)
            .field("secret", &"***REDACTED***")
            .finish()
    }
}

/// Line-oriented private key source: one key per line, `#` comments and
/// blank lines ignored.
#[derive(Debug, Clone)]
pub struct CredentialSource {
    source: WalletSource,
}

impl CredentialSource {
    pub const DEFAULT_KEYS_FILE: &'static str = "data/private_keys.txt";

    pub fn new(source: WalletSource) -> Self {
        Self { source }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(WalletSource::File { path: path.into() })
    }

    pub fn from_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(WalletSource::Inline {
            name: name.into(),
            content: content.into(),
        })
    }

    pub fn name(&self) -> String {
        match &self.source {
            WalletSource::File { path } => path.display().to_string(),
            WalletSource::Inline { name, .. } => name.clone(),
        }
    }

    /// Parse keys out of raw file content, keeping file order.
    pub fn parse(content: &str) -> Vec<Credential> {
        content
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    None
                } else {
                    Some(Credential::new(trimmed, i + 1))
                }
            })
            .collect()
    }

    async fn read_file(path: &Path) -> Result<String, ConfigError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(ConfigError::IoError {
                path: path.display().to_string(),
                msg: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl CredentialLoader for CredentialSource {
    async fn load(&self, shuffle: bool) -> Result<Vec<Credential>, CoreError> {
        let mut keys = match &self.source {
            WalletSource::File { path } => Self::parse(&Self::read_file(path).await?),
            WalletSource::Inline { content, .. } => Self::parse(content),
        };

        if keys.is_empty() {
            warn!("No private keys found in {}", self.name());
            return Err(WalletError::EmptySource {
                source_name: self.name(),
            }
            .into());
        }

        if shuffle {
            info!("Shuffling {} wallets...", keys.len());
            keys.shuffle(&mut rand::thread_rng());
        }

        info!("Loaded {} keys from {}", keys.len(), self.name());
        Ok(keys)
    }
}
