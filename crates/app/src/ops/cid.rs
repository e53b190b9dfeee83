use clap::Args;

use common::codec::{self, EncodingError, Slot, SlotPair};

use crate::op::Op;

/// Pack a CID into two slots
#[derive(Args, Debug, Clone)]
pub struct Encode {
    /// Base58 CID, e.g. Qm...
    pub cid: String,
}

/// Recover a CID from two slots
#[derive(Args, Debug, Clone)]
pub struct Decode {
    /// First slot, 0x-prefixed hex
    pub slot_a: Slot,
    /// Second slot, 0x-prefixed hex
    pub slot_b: Slot,
}

#[async_trait::async_trait]
impl Op for Encode {
    type Error = EncodingError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let slots = codec::cid_to_slots(self.cid.trim())?;
        Ok(format!("{}\n{}", slots.a, slots.b))
    }
}

#[async_trait::async_trait]
impl Op for Decode {
    type Error = EncodingError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        codec::slots_to_cid(&SlotPair::new(self.slot_a, self.slot_b))
    }
}

crate::command_enum! {
    (Encode, Encode),
    (Decode, Decode),
}

pub type CidCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Cid {
    #[command(subcommand)]
    pub command: CidCommand,
}

#[async_trait::async_trait]
impl Op for Cid {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
