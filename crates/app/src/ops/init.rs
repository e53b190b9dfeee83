use clap::Args;

use common::prelude::Address;

use crate::state::{AppConfig, AppState, DEFAULT_CHAIN_ID};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Record contract address (defaults to the first deployment on a local chain)
    #[arg(long)]
    pub contract: Option<Address>,

    /// Chain id the decryption domain is bound to
    #[arg(long, default_value_t = DEFAULT_CHAIN_ID)]
    pub chain_id: u64,

    /// Validity of each decryption authorization, in days (1-365)
    #[arg(long, default_value_t = common::protocol::DEFAULT_DURATION_DAYS)]
    pub duration_days: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig {
            chain_id: self.chain_id,
            duration_days: self.duration_days,
            ..AppConfig::default()
        };
        if let Some(contract) = self.contract {
            config.contract = contract;
        }

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let key = state.load_key()?;

        let output = format!(
            "Initialized cipherfile directory at: {}\n\
             - Key: {}\n\
             - Devnet: {}\n\
             - Config: {}\n\
             - Account: {}\n\
             - Contract: {}\n\
             - Chain id: {}",
            state.state_dir.display(),
            state.key_path.display(),
            state.devnet_path.display(),
            state.config_path.display(),
            key.address(),
            state.config.contract,
            state.config.chain_id,
        );

        Ok(output)
    }
}
