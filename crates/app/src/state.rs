use std::str::FromStr;
use std::{fs, path::PathBuf};

use common::collaborators::LocalSigner;
use common::devnet::{Devnet, DevnetError};
use common::prelude::{Address, SecretKey};
use common::protocol::{ClientConfig, RecordClient, DEFAULT_DURATION_DAYS};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "cipherfile";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const DEVNET_FILE_NAME: &str = "devnet.json";

/// Where the first contract lands on a fresh local chain
pub const DEFAULT_CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const DEFAULT_CHAIN_ID: u64 = 31337;

pub type Client = RecordClient<Devnet, Devnet, Devnet, LocalSigner>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Record contract ciphertexts are bound to
    #[serde(default = "default_contract")]
    pub contract: Address,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Validity of each decryption authorization, in days
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
    /// Default tracing level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_contract() -> Address {
    Address::from_str(DEFAULT_CONTRACT).unwrap_or_default()
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_duration_days() -> u32 {
    DEFAULT_DURATION_DAYS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            contract: default_contract(),
            chain_id: default_chain_id(),
            duration_days: default_duration_days(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log_level).unwrap_or(tracing::Level::INFO)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.cipherfile)
    pub state_dir: PathBuf,
    /// Path to the account key PEM file
    pub key_path: PathBuf,
    /// Path to the persisted devnet
    pub devnet_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.cipherfile)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory with a fresh account key and devnet
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        if state_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&state_dir)?;

        let key = SecretKey::generate();
        let key_path = state_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        let devnet_path = state_dir.join(DEVNET_FILE_NAME);
        Devnet::new(config.chain_id, config.contract).save(&devnet_path)?;

        Ok(Self {
            state_dir,
            key_path,
            devnet_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        if !state_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = state_dir.join(KEY_FILE_NAME);
        let devnet_path = state_dir.join(DEVNET_FILE_NAME);
        let config_path = state_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !devnet_path.exists() {
            return Err(StateError::MissingFile(DEVNET_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            state_dir,
            key_path,
            devnet_path,
            config_path,
            config,
        })
    }

    /// Load the account key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    pub fn load_devnet(&self) -> Result<Devnet, StateError> {
        Ok(Devnet::load(&self.devnet_path)?)
    }

    pub fn save_devnet(&self, devnet: &Devnet) -> Result<(), StateError> {
        Ok(devnet.save(&self.devnet_path)?)
    }

    /// A record client for the configured account, backed by the saved devnet
    pub fn client(&self) -> Result<(Client, Devnet), StateError> {
        let key = self.load_key()?;
        let devnet = self.load_devnet()?;

        let mut config = ClientConfig::new(self.config.contract);
        config.duration_days = self.config.duration_days;

        let client = RecordClient::new(
            devnet.clone(),
            devnet.clone(),
            devnet.clone(),
            LocalSigner::new(key),
            config,
        );
        Ok((client, devnet))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cipherfile directory not initialized. Run 'cfile init' first")]
    NotInitialized,

    #[error("cipherfile directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("devnet error: {0}")]
    Devnet(#[from] DevnetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");

        let state = AppState::init(Some(path.clone()), None).unwrap();
        assert!(state.key_path.exists());
        assert!(state.devnet_path.exists());

        let loaded = AppState::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.config.contract, default_contract());
        assert_eq!(loaded.config.duration_days, DEFAULT_DURATION_DAYS);
        assert_eq!(
            loaded.load_key().unwrap().address(),
            state.load_key().unwrap().address()
        );

        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_config_defaults_fill_gaps() {
        let config: AppConfig = toml::from_str("chain_id = 1\n").unwrap();
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.contract, default_contract());
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }
}
