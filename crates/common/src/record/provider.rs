use std::fmt::{Debug, Display};

use async_trait::async_trait;

use super::types::{EncryptedInput, Record};
use crate::crypto::Address;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError<T> {
    /// The provider itself failed; the ledger could not be reached or read
    #[error("unhandled record store provider error: {0}")]
    Provider(#[from] T),
    /// The ledger refused the write. Nothing was appended
    #[error("submission rejected: {0}")]
    Rejected(String),
    /// No record at this index for the owner, at the time of the read
    #[error("no record at index {index}, owner has {count}")]
    IndexOutOfRange { index: u64, count: u64 },
}

/// Append-only, per-account list of confidential records
///
/// Records are addressed by a stable index `0..count` in submission order.
/// Indices are never reused or reordered, and a record never changes once
/// written. Reads are not isolated from concurrent writes: a count read
/// followed by indexed reads may observe records appended in between.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Append a record for `owner`, the account sending the write
    ///
    /// The timestamp is assigned by the store. The write is atomic: on error
    /// no record has been appended.
    ///
    /// # Returns
    /// * `Ok(u64)` - The index of the new record
    /// * `Err(RecordStoreError::Rejected)` - The input failed validation
    async fn submit(
        &self,
        owner: Address,
        name: String,
        input: EncryptedInput,
    ) -> Result<u64, RecordStoreError<Self::Error>>;

    /// Number of records `owner` has submitted
    async fn count(&self, owner: Address) -> Result<u64, RecordStoreError<Self::Error>>;

    /// Get the record at `index` for `owner`
    ///
    /// # Returns
    /// * `Err(RecordStoreError::IndexOutOfRange)` - `index >= count`
    async fn get_at(&self, owner: Address, index: u64)
        -> Result<Record, RecordStoreError<Self::Error>>;

    /// Names of all records of `owner`, in index order
    async fn names(&self, owner: Address) -> Result<Vec<String>, RecordStoreError<Self::Error>> {
        let count = self.count(owner).await?;
        let mut names = Vec::new();
        for index in 0..count {
            names.push(self.get_at(owner, index).await?.name);
        }
        Ok(names)
    }
}
