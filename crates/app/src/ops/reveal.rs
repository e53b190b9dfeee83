use clap::Args;

use common::protocol::ProtocolError;

use crate::state::StateError;

/// Decrypt a record's slots and print its CID
#[derive(Args, Debug, Clone)]
pub struct Reveal {
    /// Record index, as shown by `cfile ls`
    pub index: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum RevealError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("{}", .0.user_message())]
    Protocol(#[from] ProtocolError),
}

#[async_trait::async_trait]
impl crate::op::Op for Reveal {
    type Error = RevealError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let (client, _devnet) = state.client()?;
        Ok(client.reveal(self.index).await?)
    }
}
