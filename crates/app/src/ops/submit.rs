use std::path::PathBuf;

use clap::Args;

use common::protocol::{ProtocolError, Submission};

use crate::state::StateError;

/// Hash, encode, encrypt and submit a file pointer
#[derive(Args, Debug, Clone)]
pub struct Submit {
    /// File to reference; only its hash leaves this machine
    #[arg(required_unless_present = "cid", conflicts_with = "cid")]
    pub path: Option<PathBuf>,

    /// Submit an existing CID instead of hashing a file
    #[arg(long)]
    pub cid: Option<String>,

    /// Record name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}", .0.user_message())]
    Protocol(#[from] ProtocolError),
}

#[async_trait::async_trait]
impl crate::op::Op for Submit {
    type Error = SubmitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let (client, devnet) = state.client()?;

        let mut submission = match (&self.path, &self.cid) {
            (Some(path), _) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| SubmitError::Read {
                        path: path.clone(),
                        source,
                    })?;
                Submission::from_file(bytes)
            }
            (None, Some(cid)) => Submission::with_cid(cid.trim())?,
            (None, None) => Submission::new(),
        };

        let name = self.name.clone().or_else(|| {
            self.path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
        });
        if let Some(name) = name {
            submission.set_name(name);
        }

        let index = client.advance(&mut submission).await?;
        state.save_devnet(&devnet)?;

        let cid = submission.cid().unwrap_or_default();
        Ok(format!("submitted record {} ({})", index, cid))
    }
}
