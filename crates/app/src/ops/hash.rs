use std::path::PathBuf;

use clap::Args;

use common::codec::{self, EncodingError};

/// Print the CID of a file and the slot pair it packs into
#[derive(Args, Debug, Clone)]
pub struct Hash {
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[async_trait::async_trait]
impl crate::op::Op for Hash {
    type Error = HashError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| HashError::Read {
                path: self.path.clone(),
                source,
            })?;

        let cid = codec::cid_from_file(&bytes)?;
        let slots = codec::cid_to_slots(&cid)?;
        Ok(format!("{}\nslot a: {}\nslot b: {}", cid, slots.a, slots.b))
    }
}
