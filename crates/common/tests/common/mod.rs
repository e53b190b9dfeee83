//! Shared test utilities for record protocol integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use common::codec::Slot;
use common::collaborators::{AuthorizationSigner, ConfidentialEncryptor, LocalSigner};
use common::crypto::{
    Address, AuthorizationDomain, DecryptAuthorization, SecretKey, SignedAuthorization,
};
use common::devnet::{Devnet, DevnetError};
use common::protocol::{ClientConfig, RecordClient};
use common::record::{
    Binding, EncryptedInput, Handle, MemoryRecordStore, MemoryRecordStoreError, Record,
    RecordStore, RecordStoreError,
};

pub const CHAIN_ID: u64 = 31337;

pub type DevnetClient = RecordClient<Devnet, Devnet, Devnet, LocalSigner>;

pub fn contract() -> Address {
    Address::from([0xc0; 20])
}

/// A fresh devnet, an account key, and a client for that account
pub fn setup_test_env() -> (DevnetClient, Devnet, SecretKey) {
    let devnet = Devnet::new(CHAIN_ID, contract());
    let key = SecretKey::generate();
    let client = client_for(&devnet, &key);
    (client, devnet, key)
}

pub fn client_for(devnet: &Devnet, key: &SecretKey) -> DevnetClient {
    RecordClient::new(
        devnet.clone(),
        devnet.clone(),
        devnet.clone(),
        LocalSigner::new(key.clone()),
        ClientConfig::new(contract()),
    )
}

#[derive(Debug, thiserror::Error)]
pub enum FlakyError {
    #[error("encryption service unavailable")]
    Unavailable,
    #[error(transparent)]
    Devnet(#[from] DevnetError),
}

/// Encryptor that fails a fixed number of times before delegating
#[derive(Debug, Clone)]
pub struct FlakyEncryptor {
    inner: Devnet,
    failures_left: Arc<AtomicUsize>,
}

impl FlakyEncryptor {
    pub fn new(inner: Devnet, failures: usize) -> Self {
        Self {
            inner,
            failures_left: Arc::new(AtomicUsize::new(failures)),
        }
    }
}

#[async_trait]
impl ConfidentialEncryptor for FlakyEncryptor {
    type Error = FlakyError;

    async fn encrypt(
        &self,
        values: [Slot; 2],
        binding: Binding,
    ) -> Result<EncryptedInput, Self::Error> {
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(FlakyError::Unavailable);
        }
        Ok(self.inner.encrypt(values, binding).await?)
    }
}

/// Ledger where another writer appends a record for the same owner while a
/// listing is in progress
#[derive(Debug, Clone, Default)]
pub struct RacingStore {
    inner: MemoryRecordStore,
    races_left: Arc<AtomicUsize>,
}

impl RacingStore {
    pub fn new(races: usize) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            races_left: Arc::new(AtomicUsize::new(races)),
        }
    }

    pub async fn seed(&self, owner: Address, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            self.inner
                .submit(owner, name.to_string(), input(i as u8 + 1))
                .await
                .unwrap();
        }
    }
}

pub fn input(seed: u8) -> EncryptedInput {
    EncryptedInput {
        handles: [Handle::from([seed; 32]), Handle::from([seed ^ 0x80; 32])],
        proof: vec![seed],
    }
}

#[async_trait]
impl RecordStore for RacingStore {
    type Error = MemoryRecordStoreError;

    async fn submit(
        &self,
        owner: Address,
        name: String,
        input: EncryptedInput,
    ) -> Result<u64, RecordStoreError<Self::Error>> {
        self.inner.submit(owner, name, input).await
    }

    async fn count(&self, owner: Address) -> Result<u64, RecordStoreError<Self::Error>> {
        self.inner.count(owner).await
    }

    async fn get_at(
        &self,
        owner: Address,
        index: u64,
    ) -> Result<Record, RecordStoreError<Self::Error>> {
        let record = self.inner.get_at(owner, index).await?;
        if self
            .races_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            let count = self.inner.count(owner).await?;
            self.inner
                .submit(owner, format!("late-{}", count), input(0x40 + count as u8))
                .await?;
        }
        Ok(record)
    }
}

/// Ledger that loses records mid-listing: after `reads` successful reads every
/// further index is out of range. `count` can be overridden to report a
/// figure the ledger cannot back.
#[derive(Debug, Clone, Default)]
pub struct ShrinkingStore {
    inner: MemoryRecordStore,
    reads_left: Arc<AtomicUsize>,
    reported_count: Option<u64>,
}

impl ShrinkingStore {
    pub fn new(reads: usize) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            reads_left: Arc::new(AtomicUsize::new(reads)),
            reported_count: None,
        }
    }

    pub fn reporting_count(mut self, count: u64) -> Self {
        self.reported_count = Some(count);
        self
    }

    pub async fn seed(&self, owner: Address, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            self.inner
                .submit(owner, name.to_string(), input(i as u8 + 1))
                .await
                .unwrap();
        }
    }
}

#[async_trait]
impl RecordStore for ShrinkingStore {
    type Error = MemoryRecordStoreError;

    async fn submit(
        &self,
        owner: Address,
        name: String,
        input: EncryptedInput,
    ) -> Result<u64, RecordStoreError<Self::Error>> {
        self.inner.submit(owner, name, input).await
    }

    async fn count(&self, owner: Address) -> Result<u64, RecordStoreError<Self::Error>> {
        match self.reported_count {
            Some(count) => Ok(count),
            None => self.inner.count(owner).await,
        }
    }

    async fn get_at(
        &self,
        owner: Address,
        index: u64,
    ) -> Result<Record, RecordStoreError<Self::Error>> {
        if self
            .reads_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_err()
        {
            return Err(RecordStoreError::IndexOutOfRange {
                index,
                count: index,
            });
        }
        self.inner.get_at(owner, index).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every write is refused; reads work
    RejectWrites,
    /// Nothing answers
    Unreachable,
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct ConnectionRefused;

/// Ledger that fails in one fixed way
#[derive(Debug, Clone)]
pub struct FaultyStore {
    inner: MemoryRecordStore,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            fault,
        }
    }

    fn check(&self) -> Result<(), RecordStoreError<ConnectionRefused>> {
        match self.fault {
            Fault::Unreachable => Err(RecordStoreError::Provider(ConnectionRefused)),
            Fault::RejectWrites => Ok(()),
        }
    }
}

fn internal(e: RecordStoreError<MemoryRecordStoreError>) -> RecordStoreError<ConnectionRefused> {
    match e {
        RecordStoreError::Rejected(reason) => RecordStoreError::Rejected(reason),
        RecordStoreError::IndexOutOfRange { index, count } => {
            RecordStoreError::IndexOutOfRange { index, count }
        }
        RecordStoreError::Provider(_) => RecordStoreError::Provider(ConnectionRefused),
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    type Error = ConnectionRefused;

    async fn submit(
        &self,
        owner: Address,
        name: String,
        input: EncryptedInput,
    ) -> Result<u64, RecordStoreError<Self::Error>> {
        self.check()?;
        if self.fault == Fault::RejectWrites {
            return Err(RecordStoreError::Rejected(
                "input proof does not match binding".to_string(),
            ));
        }
        self.inner.submit(owner, name, input).await.map_err(internal)
    }

    async fn count(&self, owner: Address) -> Result<u64, RecordStoreError<Self::Error>> {
        self.check()?;
        self.inner.count(owner).await.map_err(internal)
    }

    async fn get_at(
        &self,
        owner: Address,
        index: u64,
    ) -> Result<Record, RecordStoreError<Self::Error>> {
        self.check()?;
        self.inner.get_at(owner, index).await.map_err(internal)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("user rejected the request")]
pub struct UserRejected;

/// Signer whose account holder refuses every request
#[derive(Debug, Clone)]
pub struct DecliningSigner {
    address: Address,
}

impl DecliningSigner {
    pub fn new(key: &SecretKey) -> Self {
        Self {
            address: key.address(),
        }
    }
}

#[async_trait]
impl AuthorizationSigner for DecliningSigner {
    type Error = UserRejected;

    fn address(&self) -> Address {
        self.address
    }

    async fn sign(
        &self,
        _domain: &AuthorizationDomain,
        _authorization: DecryptAuthorization,
    ) -> Result<SignedAuthorization, Self::Error> {
        Err(UserRejected)
    }
}
