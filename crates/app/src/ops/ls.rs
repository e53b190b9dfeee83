use clap::Args;

use common::protocol::ProtocolError;

use crate::state::StateError;

/// List the account's records
#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Reveal each record's CID as well
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("{}", .0.user_message())]
    Protocol(#[from] ProtocolError),
}

fn format_timestamp(timestamp: u64) -> String {
    chrono::DateTime::from_timestamp(timestamp as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let (client, _devnet) = state.client()?;

        let listing = client.list_records().await?;
        if listing.entries.is_empty() {
            return Ok("No records found".to_string());
        }

        let mut lines = Vec::with_capacity(listing.entries.len() + 1);
        for entry in &listing.entries {
            let cid = if self.reveal {
                match client.reveal(entry.index).await {
                    Ok(cid) => cid,
                    // one unreadable record should not hide the rest
                    Err(e) => format!("<{}>", e.user_message()),
                }
            } else {
                entry.cid.clone().unwrap_or_else(|| "<encrypted>".to_string())
            };
            lines.push(format!(
                "{:>4}  {}  {}  {}",
                entry.index,
                format_timestamp(entry.record.timestamp),
                entry.record.name,
                cid
            ));
        }
        if listing.drifted() {
            lines.push(format!(
                "(record count changed from {} to {} while listing)",
                listing.initial_count, listing.final_count
            ));
        }

        Ok(lines.join("\n"))
    }
}
