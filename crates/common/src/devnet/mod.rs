//! Local stand-in for the confidential runtime and its record ledger
//!
//! One [`Devnet`] plays every external role the protocol talks to:
//!
//! - **ledger**: a [`MemoryRecordStore`] that only accepts inputs whose proof
//!   and binding check out, granting the submitter access to the handles
//! - **encryptor**: slots are sealed under a network secret that never leaves
//!   the devnet; callers only ever see handles
//! - **decryptor**: reveals handles to an account that presents a valid,
//!   in-window authorization signed under [`Devnet::domain`]
//!
//! ```text
//! handle = blake3_kdf(HANDLE_CONTEXT, contract || account || i || ciphertext)
//! proof  = blake3_keyed(proof_key, contract || account || handle_a || handle_b)
//! ```
//!
//! State round-trips through JSON so a CLI can keep one devnet across runs.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codec::{EncodingError, Slot};
use crate::collaborators::{AuthorizedDecryptor, ConfidentialEncryptor, DecryptRequest};
use crate::crypto::{
    seal_to, Address, AuthorizationDomain, AuthorizationError, SealError, Secret, SecretError,
};
use crate::record::{
    Binding, EncryptedInput, Handle, LedgerSnapshot, MemoryRecordStore, MemoryRecordStoreError,
    Record, RecordStore, RecordStoreError,
};

const HANDLE_CONTEXT: &str = "cipherfile 2025 devnet ciphertext handle";
const PROOF_CONTEXT: &str = "cipherfile 2025 devnet input proof";
const GATEWAY_CONTEXT: &str = "cipherfile 2025 devnet decryption gateway";

/// Name the devnet signs decryption domains under
pub const DOMAIN_NAME: &str = "Decryption";
pub const DOMAIN_VERSION: &str = "1";

#[derive(Debug, thiserror::Error)]
pub enum DevnetError {
    #[error("authorization does not cover contract {0}")]
    ContractNotAuthorized(Address),
    #[error("authorization signed by {signer}, ciphertexts belong to {account}")]
    SignerMismatch { signer: Address, account: Address },
    #[error("authorization: {0}")]
    Authorization(#[from] AuthorizationError),
    #[error("request window differs from the signed window")]
    WindowMismatch,
    #[error("ephemeral key differs from the signed public key")]
    KeyMismatch,
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),
    #[error("account {account} may not decrypt handle {handle}")]
    AccessDenied { handle: Handle, account: Address },
    #[error("handle {handle} is bound to contract {bound}, not {requested}")]
    ContractMismatch {
        handle: Handle,
        bound: Address,
        requested: Address,
    },
    #[error("corrupt plaintext: {0}")]
    Corrupt(#[from] EncodingError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("seal error: {0}")]
    Seal(#[from] SealError),
    #[error("devnet state error: {0}")]
    Internal(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A ciphertext held by the runtime, with the binding it was created under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCiphertext {
    pub binding: Binding,
    #[serde(with = "hex_bytes")]
    pub ciphertext: Vec<u8>,
}

/// Runtime-side state: keys, ciphertexts and access grants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeState {
    pub domain: AuthorizationDomain,
    /// The record contract this devnet hosts
    pub contract: Address,
    network_secret: Secret,
    /// ciphertexts of submitted records
    ciphertexts: HashMap<Handle, StoredCiphertext>,
    /// encrypted but not yet on the ledger; never written to disk
    #[serde(skip)]
    pending: HashMap<Handle, StoredCiphertext>,
    /// handle -> accounts allowed to decrypt it
    acl: HashMap<Handle, BTreeSet<Address>>,
}

/// Everything a devnet holds, as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevnetState {
    pub runtime: RuntimeState,
    pub ledger: LedgerSnapshot,
}

/// Address the devnet's decryption domain verifies against on `chain_id`
pub fn gateway_address(chain_id: u64) -> Address {
    let digest = blake3::derive_key(GATEWAY_CONTEXT, &chain_id.to_be_bytes());
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest[12..]);
    Address::from(bytes)
}

fn binding_bytes(binding: &Binding) -> Vec<u8> {
    let mut out = Vec::with_capacity(40);
    out.extend_from_slice(&binding.contract.to_bytes());
    out.extend_from_slice(&binding.account.to_bytes());
    out
}

fn ledger_error(err: RecordStoreError<MemoryRecordStoreError>) -> RecordStoreError<DevnetError> {
    match err {
        RecordStoreError::Provider(e) => {
            RecordStoreError::Provider(DevnetError::Internal(e.to_string()))
        }
        RecordStoreError::Rejected(reason) => RecordStoreError::Rejected(reason),
        RecordStoreError::IndexOutOfRange { index, count } => {
            RecordStoreError::IndexOutOfRange { index, count }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Devnet {
    runtime: Arc<RwLock<RuntimeState>>,
    ledger: MemoryRecordStore,
}

impl Devnet {
    /// A fresh devnet hosting `contract` on `chain_id`
    pub fn new(chain_id: u64, contract: Address) -> Self {
        let domain = AuthorizationDomain {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract: gateway_address(chain_id),
        };
        Self::from_state(DevnetState {
            runtime: RuntimeState {
                domain,
                contract,
                network_secret: Secret::generate(),
                ciphertexts: HashMap::new(),
                pending: HashMap::new(),
                acl: HashMap::new(),
            },
            ledger: LedgerSnapshot::default(),
        })
    }

    pub fn from_state(state: DevnetState) -> Self {
        Self {
            runtime: Arc::new(RwLock::new(state.runtime)),
            ledger: MemoryRecordStore::from_snapshot(state.ledger),
        }
    }

    pub fn state(&self) -> Result<DevnetState, DevnetError> {
        let runtime = self.read()?.clone();
        let ledger = self
            .ledger
            .snapshot()
            .map_err(|e| DevnetError::Internal(e.to_string()))?;
        Ok(DevnetState { runtime, ledger })
    }

    /// Load a devnet previously written with [`Devnet::save`]
    pub fn load(path: &Path) -> Result<Self, DevnetError> {
        let data = std::fs::read_to_string(path)?;
        let state: DevnetState = serde_json::from_str(&data)?;
        tracing::debug!(path = %path.display(), "loaded devnet state");
        Ok(Self::from_state(state))
    }

    pub fn save(&self, path: &Path) -> Result<(), DevnetError> {
        let data = serde_json::to_string_pretty(&self.state()?)?;
        std::fs::write(path, data)?;
        tracing::debug!(path = %path.display(), "saved devnet state");
        Ok(())
    }

    pub fn contract(&self) -> Result<Address, DevnetError> {
        Ok(self.read()?.contract)
    }

    /// Grant `account` access to `handle`, as the ledger contract would
    pub fn allow(&self, handle: Handle, account: Address) -> Result<(), DevnetError> {
        let mut runtime = self.write()?;
        if !runtime.ciphertexts.contains_key(&handle) {
            return Err(DevnetError::UnknownHandle(handle));
        }
        runtime.acl.entry(handle).or_default().insert(account);
        Ok(())
    }

    pub fn is_allowed(&self, handle: &Handle, account: &Address) -> Result<bool, DevnetError> {
        Ok(self
            .read()?
            .acl
            .get(handle)
            .is_some_and(|accounts| accounts.contains(account)))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RuntimeState>, DevnetError> {
        self.runtime
            .read()
            .map_err(|e| DevnetError::Internal(format!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RuntimeState>, DevnetError> {
        self.runtime
            .write()
            .map_err(|e| DevnetError::Internal(format!("failed to acquire write lock: {}", e)))
    }
}

impl RuntimeState {
    fn proof_key(&self) -> [u8; 32] {
        *Secret::derive(PROOF_CONTEXT, self.network_secret.bytes())
    }

    fn proof(&self, binding: &Binding, handles: &[Handle; 2]) -> [u8; 32] {
        let mut data = binding_bytes(binding);
        for handle in handles {
            data.extend_from_slice(&handle.to_bytes());
        }
        *blake3::keyed_hash(&self.proof_key(), &data).as_bytes()
    }

    /// Why `input` may not be submitted by `owner`, if anything
    fn check_input(&self, owner: Address, input: &EncryptedInput) -> Option<String> {
        let binding = Binding::new(self.contract, owner);
        let expected = self.proof(&binding, &input.handles);
        if input.proof.as_slice() != expected.as_slice() {
            return Some("input proof does not match (contract, sender)".to_string());
        }
        for handle in &input.handles {
            let stored = self
                .ciphertexts
                .get(handle)
                .or_else(|| self.pending.get(handle));
            match stored {
                Some(stored) if stored.binding == binding => {}
                Some(_) => return Some(format!("handle {} bound to another account", handle)),
                None => return Some(format!("unknown handle {}", handle)),
            }
        }
        None
    }

    fn decrypt_slot(&self, handle: &Handle) -> Result<Slot, DevnetError> {
        let stored = self
            .ciphertexts
            .get(handle)
            .ok_or(DevnetError::UnknownHandle(*handle))?;
        let plaintext = self
            .network_secret
            .decrypt(&stored.ciphertext, &binding_bytes(&stored.binding))?;
        Ok(Slot::try_from(plaintext.as_slice())?)
    }
}

#[async_trait]
impl RecordStore for Devnet {
    type Error = DevnetError;

    async fn submit(
        &self,
        owner: Address,
        name: String,
        input: EncryptedInput,
    ) -> Result<u64, RecordStoreError<Self::Error>> {
        let rejection = self
            .read()
            .map_err(RecordStoreError::Provider)?
            .check_input(owner, &input);
        if let Some(reason) = rejection {
            tracing::warn!(owner = %owner, reason = %reason, "rejected record submission");
            // a rejected input can never be resubmitted, drop its ciphertexts
            let mut runtime = self.write().map_err(RecordStoreError::Provider)?;
            for handle in &input.handles {
                runtime.pending.remove(handle);
            }
            return Err(RecordStoreError::Rejected(reason));
        }

        let handles = input.handles;
        let index = self
            .ledger
            .submit(owner, name, input)
            .await
            .map_err(ledger_error)?;

        let mut runtime = self.write().map_err(RecordStoreError::Provider)?;
        for handle in handles {
            if let Some(stored) = runtime.pending.remove(&handle) {
                runtime.ciphertexts.insert(handle, stored);
            }
            runtime.acl.entry(handle).or_default().insert(owner);
        }
        Ok(index)
    }

    async fn count(&self, owner: Address) -> Result<u64, RecordStoreError<Self::Error>> {
        self.ledger.count(owner).await.map_err(ledger_error)
    }

    async fn get_at(
        &self,
        owner: Address,
        index: u64,
    ) -> Result<Record, RecordStoreError<Self::Error>> {
        self.ledger.get_at(owner, index).await.map_err(ledger_error)
    }
}

#[async_trait]
impl ConfidentialEncryptor for Devnet {
    type Error = DevnetError;

    async fn encrypt(
        &self,
        values: [Slot; 2],
        binding: Binding,
    ) -> Result<EncryptedInput, Self::Error> {
        let mut runtime = self.write()?;
        let aad = binding_bytes(&binding);

        let mut handles = [Handle::default(); 2];
        for (i, value) in values.iter().enumerate() {
            let ciphertext = runtime.network_secret.encrypt(&value.to_bytes(), &aad)?;

            let mut hasher = blake3::Hasher::new_derive_key(HANDLE_CONTEXT);
            hasher.update(&aad);
            hasher.update(&[i as u8]);
            hasher.update(&ciphertext);
            let handle = Handle::from(*hasher.finalize().as_bytes());

            runtime
                .pending
                .insert(handle, StoredCiphertext { binding, ciphertext });
            handles[i] = handle;
        }

        let proof = runtime.proof(&binding, &handles).to_vec();
        Ok(EncryptedInput { handles, proof })
    }
}

#[async_trait]
impl AuthorizedDecryptor for Devnet {
    type Error = DevnetError;

    fn domain(&self) -> AuthorizationDomain {
        match self.runtime.read() {
            Ok(runtime) => runtime.domain.clone(),
            Err(poisoned) => poisoned.into_inner().domain.clone(),
        }
    }

    async fn user_decrypt(
        &self,
        request: DecryptRequest<'_>,
    ) -> Result<HashMap<Handle, Slot>, Self::Error> {
        let runtime = self.read()?;
        let signed = request.authorization;
        let authorization = &signed.authorization;
        let account = request.binding.account;

        if !authorization.covers(&request.binding.contract) {
            return Err(DevnetError::ContractNotAuthorized(request.binding.contract));
        }
        let signer = signed.signer.address();
        if signer != account {
            return Err(DevnetError::SignerMismatch { signer, account });
        }
        signed.verify(&runtime.domain)?;
        if authorization.window != request.window {
            return Err(DevnetError::WindowMismatch);
        }
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        authorization.window.check(now)?;
        if authorization.public_key != request.keypair.public_key() {
            return Err(DevnetError::KeyMismatch);
        }

        let mut plaintexts = HashMap::with_capacity(request.handles.len());
        for handle in request.handles {
            let stored = runtime
                .ciphertexts
                .get(handle)
                .ok_or(DevnetError::UnknownHandle(*handle))?;
            if stored.binding.contract != request.binding.contract {
                return Err(DevnetError::ContractMismatch {
                    handle: *handle,
                    bound: stored.binding.contract,
                    requested: request.binding.contract,
                });
            }
            let allowed = runtime
                .acl
                .get(handle)
                .is_some_and(|accounts| accounts.contains(&account));
            if !allowed {
                return Err(DevnetError::AccessDenied {
                    handle: *handle,
                    account,
                });
            }

            // re-encrypt to the ephemeral key; only the requester can open it
            let slot = runtime.decrypt_slot(handle)?;
            let sealed = seal_to(&authorization.public_key, &slot.to_bytes())?;
            let opened = request.keypair.open(&sealed)?;
            plaintexts.insert(*handle, Slot::try_from(opened.as_slice())?);
        }

        tracing::debug!(account = %account, handles = plaintexts.len(), "user decryption served");
        Ok(plaintexts)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
