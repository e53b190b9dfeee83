use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::provider::{RecordStore, RecordStoreError};
use super::types::{EncryptedInput, Record};
use crate::crypto::Address;

/// In-memory record store
///
/// Accepts any well-shaped input; it does not verify proofs or bindings.
/// Wrap it (as the devnet does) to get ledger-side validation.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<RwLock<LedgerSnapshot>>,
}

/// Everything the in-memory store holds, for persistence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// owner -> records in index order
    records: HashMap<Address, Vec<Record>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryRecordStoreError {
    #[error("memory provider error: {0}")]
    Internal(String),
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot, RecordStoreError<MemoryRecordStoreError>> {
        let inner = self.inner.read().map_err(|e| {
            RecordStoreError::Provider(MemoryRecordStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;
        Ok(inner.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    type Error = MemoryRecordStoreError;

    async fn submit(
        &self,
        owner: Address,
        name: String,
        input: EncryptedInput,
    ) -> Result<u64, RecordStoreError<Self::Error>> {
        if input.handles.iter().any(|h| h.is_zero()) {
            return Err(RecordStoreError::Rejected(
                "uninitialized ciphertext handle".to_string(),
            ));
        }

        let mut inner = self.inner.write().map_err(|e| {
            RecordStoreError::Provider(MemoryRecordStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })?;

        let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
        let [slot_a, slot_b] = input.handles;
        let records = inner.records.entry(owner).or_default();
        records.push(Record {
            name: name.clone(),
            timestamp,
            slot_a,
            slot_b,
        });
        let index = records.len() as u64 - 1;

        tracing::info!(
            user = %owner,
            index,
            name = %name,
            timestamp,
            "RecordSubmitted"
        );
        Ok(index)
    }

    async fn count(&self, owner: Address) -> Result<u64, RecordStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            RecordStoreError::Provider(MemoryRecordStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        Ok(inner.records.get(&owner).map(|r| r.len()).unwrap_or(0) as u64)
    }

    async fn get_at(
        &self,
        owner: Address,
        index: u64,
    ) -> Result<Record, RecordStoreError<Self::Error>> {
        let inner = self.inner.read().map_err(|e| {
            RecordStoreError::Provider(MemoryRecordStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })?;

        let records = inner.records.get(&owner);
        let count = records.map(|r| r.len()).unwrap_or(0) as u64;
        records
            .and_then(|r| r.get(index as usize))
            .cloned()
            .ok_or(RecordStoreError::IndexOutOfRange { index, count })
    }
}
