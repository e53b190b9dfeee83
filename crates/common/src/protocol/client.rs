use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::codec::{self, SlotPair};
use crate::collaborators::{
    AuthorizationSigner, AuthorizedDecryptor, ConfidentialEncryptor, ContentHasher,
    DecryptRequest, Sha256Hasher,
};
use crate::crypto::{Address, DecryptAuthorization, EphemeralKeypair, ValidityWindow};
use crate::record::{Binding, Record, RecordStore, RecordStoreError};

use super::error::{CollaboratorError, ProtocolError, Step};
use super::submission::Submission;

/// Default validity of a decryption authorization
pub const DEFAULT_DURATION_DAYS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// The record contract every ciphertext is bound to
    pub contract: Address,
    /// How long each decryption authorization stays valid
    pub duration_days: u32,
}

impl ClientConfig {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            duration_days: DEFAULT_DURATION_DAYS,
        }
    }
}

/// One record as seen by a listing, with its identifier if already revealed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub index: u64,
    pub record: Record,
    pub cid: Option<String>,
}

/// Result of a count-then-iterate read of the owner's records
///
/// The ledger gives no snapshot isolation, so the count may move while the
/// records are read. That is reported, not treated as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListing {
    pub entries: Vec<RecordEntry>,
    /// Count observed before reading records
    pub initial_count: u64,
    /// Count observed after reading records
    pub final_count: u64,
}

impl RecordListing {
    pub fn drifted(&self) -> bool {
        self.initial_count != self.final_count || self.entries.len() as u64 != self.initial_count
    }
}

fn ledger_error<T: Display + Debug>(step: Step, err: RecordStoreError<T>) -> ProtocolError {
    match err {
        RecordStoreError::Rejected(reason) => ProtocolError::collaborator(
            step,
            CollaboratorError::SubmissionRejected(anyhow::anyhow!(reason)),
        ),
        RecordStoreError::Provider(e) => ProtocolError::collaborator(
            step,
            CollaboratorError::LedgerUnreachable(anyhow::anyhow!("{}", e)),
        ),
        RecordStoreError::IndexOutOfRange { index, count } => {
            ProtocolError::NoSuchRecord { index, count }
        }
    }
}

/// Removes the index from the in-flight set when the reveal ends, however it ends
struct InFlight<'a> {
    set: &'a Mutex<HashSet<u64>>,
    index: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.index);
    }
}

/// Drives confidential records through their lifecycle for one account
///
/// Submission: file -> hash -> encode -> encrypt -> ledger write.
/// Reveal: ledger read -> sign authorization -> user decryption -> decode.
///
/// # Examples
///
/// ```ignore
/// let client = RecordClient::new(devnet.clone(), devnet.clone(), devnet, signer, config);
///
/// let (index, cid) = client.submit_file("report.pdf", bytes).await?;
/// assert_eq!(client.reveal(index).await?, cid);
/// ```
pub struct RecordClient<S, E, D, G, H = Sha256Hasher> {
    store: S,
    encryptor: E,
    decryptor: D,
    signer: G,
    hasher: H,
    config: ClientConfig,
    /// index -> identifier, for records revealed this session
    revealed: Mutex<HashMap<u64, String>>,
    in_flight: Mutex<HashSet<u64>>,
}

impl<S, E, D, G> RecordClient<S, E, D, G, Sha256Hasher>
where
    S: RecordStore,
    E: ConfidentialEncryptor,
    D: AuthorizedDecryptor,
    G: AuthorizationSigner,
{
    pub fn new(store: S, encryptor: E, decryptor: D, signer: G, config: ClientConfig) -> Self {
        Self {
            store,
            encryptor,
            decryptor,
            signer,
            hasher: Sha256Hasher,
            config,
            revealed: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }
}

impl<S, E, D, G, H> RecordClient<S, E, D, G, H>
where
    S: RecordStore,
    E: ConfidentialEncryptor,
    D: AuthorizedDecryptor,
    G: AuthorizationSigner,
    H: ContentHasher,
{
    /// Swap the content hasher
    pub fn with_hasher<H2: ContentHasher>(self, hasher: H2) -> RecordClient<S, E, D, G, H2> {
        RecordClient {
            store: self.store,
            encryptor: self.encryptor,
            decryptor: self.decryptor,
            signer: self.signer,
            hasher,
            config: self.config,
            revealed: self.revealed,
            in_flight: self.in_flight,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The account submitting and revealing
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn binding(&self) -> Binding {
        Binding::new(self.config.contract, self.owner())
    }

    /// Unsubmitted -> Hashed: sha2-256 multihash of the file
    pub fn hash(&self, submission: &mut Submission) -> Result<String, ProtocolError> {
        submission.ensure_open()?;
        let file = submission.require_file()?;

        let digest = self.hasher.sha256(file).map_err(|e| {
            ProtocolError::collaborator(
                Step::Hash,
                CollaboratorError::HashingFailed(anyhow::Error::new(e)),
            )
        })?;
        let multihash = codec::sha256_multihash(&digest)?;
        let cid = codec::base58::encode(&multihash);

        tracing::debug!(cid = %cid, "submission hashed");
        submission.hashed(multihash);
        Ok(cid)
    }

    /// Hashed -> Encoded: pack the multihash into two slots
    pub fn encode(&self, submission: &mut Submission) -> Result<SlotPair, ProtocolError> {
        submission.ensure_open()?;
        let slots = codec::encode(submission.require_multihash()?)?;

        tracing::debug!(slot_a = %slots.a, slot_b = %slots.b, "submission encoded");
        submission.encoded(slots);
        Ok(slots)
    }

    /// Encoded -> Encrypted: encrypt both slots under (contract, owner)
    pub async fn encrypt(&self, submission: &mut Submission) -> Result<(), ProtocolError> {
        submission.ensure_open()?;
        let slots = submission.require_slots()?;

        let input = self
            .encryptor
            .encrypt(slots.to_array(), self.binding())
            .await
            .map_err(|e| {
                ProtocolError::collaborator(
                    Step::Encrypt,
                    CollaboratorError::EncryptionFailed(anyhow::Error::new(e)),
                )
            })?;

        tracing::debug!(
            handle_a = %input.handles[0],
            handle_b = %input.handles[1],
            "submission encrypted"
        );
        submission.encrypted_with(input);
        Ok(())
    }

    /// Encrypted -> Submitted: one atomic ledger write
    pub async fn submit(&self, submission: &mut Submission) -> Result<u64, ProtocolError> {
        submission.ensure_open()?;
        let name = submission.require_name()?;
        let input = submission.require_encrypted()?;

        let index = self
            .store
            .submit(self.owner(), name.clone(), input)
            .await
            .map_err(|e| ledger_error(Step::Submit, e))?;

        tracing::info!(owner = %self.owner(), index, name = %name, "record submitted");
        submission.submitted(index);
        Ok(index)
    }

    /// Run every remaining step of a submission
    ///
    /// Resumes from the submission's current stage; on failure the
    /// submission keeps whatever progress it made.
    pub async fn advance(&self, submission: &mut Submission) -> Result<u64, ProtocolError> {
        submission.ensure_open()?;
        // validate the name before doing any work
        submission.require_name()?;

        if submission.multihash().is_none() {
            self.hash(submission)?;
        }
        if submission.slots().is_none() {
            self.encode(submission)?;
        }
        if submission.encrypted().is_none() {
            self.encrypt(submission).await?;
        }
        self.submit(submission).await
    }

    /// Submit a file under `name`, returning its index and CID
    pub async fn submit_file(
        &self,
        name: impl Into<String>,
        file: Vec<u8>,
    ) -> Result<(u64, String), ProtocolError> {
        let mut submission = Submission::from_file(file);
        submission.set_name(name);
        let index = self.advance(&mut submission).await?;
        let cid = submission
            .cid()
            .ok_or(ProtocolError::MissingInput(super::MissingInput::ContentIdentifier))?;
        Ok((index, cid))
    }

    /// Read every record of the owner: the count, then each index in turn
    pub async fn list_records(&self) -> Result<RecordListing, ProtocolError> {
        let owner = self.owner();
        let initial_count = self
            .store
            .count(owner)
            .await
            .map_err(|e| ledger_error(Step::ReadLedger, e))?;

        let mut entries = Vec::new();
        for index in 0..initial_count {
            match self.store.get_at(owner, index).await {
                Ok(record) => entries.push(RecordEntry {
                    index,
                    record,
                    cid: self.cached_cid(index),
                }),
                Err(RecordStoreError::IndexOutOfRange { count, .. }) => {
                    tracing::warn!(index, count, "record count shrank during listing");
                    break;
                }
                Err(e) => return Err(ledger_error(Step::ReadLedger, e)),
            }
        }

        let final_count = self
            .store
            .count(owner)
            .await
            .map_err(|e| ledger_error(Step::ReadLedger, e))?;
        if final_count != initial_count {
            tracing::warn!(
                initial_count,
                final_count,
                "record count changed during listing"
            );
        }

        Ok(RecordListing {
            entries,
            initial_count,
            final_count,
        })
    }

    /// Identifier of a record revealed earlier in this session
    pub fn cached_cid(&self, index: u64) -> Option<String> {
        self.revealed.lock().get(&index).cloned()
    }

    pub fn clear_cache(&self) {
        self.revealed.lock().clear();
    }

    /// Reveal the identifier behind record `index`
    ///
    /// Cached after the first success. Only one reveal per index may run at a
    /// time; a second concurrent call fails fast with
    /// [`ProtocolError::RevealInFlight`] instead of generating another
    /// ephemeral keypair.
    pub async fn reveal(&self, index: u64) -> Result<String, ProtocolError> {
        if let Some(cid) = self.cached_cid(index) {
            return Ok(cid);
        }

        if !self.in_flight.lock().insert(index) {
            return Err(ProtocolError::RevealInFlight(index));
        }
        let _guard = InFlight {
            set: &self.in_flight,
            index,
        };

        let cid = self.decrypt_record(index).await?;
        self.revealed.lock().insert(index, cid.clone());
        Ok(cid)
    }

    /// A full authorize-and-decrypt round trip for record `index`
    ///
    /// Bypasses the cache and the in-flight guard; every call generates a
    /// fresh ephemeral keypair and asks for a fresh signature.
    pub async fn decrypt_record(&self, index: u64) -> Result<String, ProtocolError> {
        let owner = self.owner();
        let record = self
            .store
            .get_at(owner, index)
            .await
            .map_err(|e| ledger_error(Step::ReadLedger, e))?;

        let keypair = EphemeralKeypair::generate();
        let window = ValidityWindow::starting_now(self.config.duration_days)?;
        let authorization =
            DecryptAuthorization::new(keypair.public_key(), vec![self.config.contract], window);

        let domain = self.decryptor.domain();
        let signed = self
            .signer
            .sign(&domain, authorization)
            .await
            .map_err(|e| {
                ProtocolError::collaborator(
                    Step::Sign,
                    CollaboratorError::SigningDeclined(anyhow::Error::new(e)),
                )
            })?;

        let handles = record.handles();
        let plaintexts = self
            .decryptor
            .user_decrypt(DecryptRequest {
                handles: &handles,
                keypair: &keypair,
                authorization: &signed,
                binding: self.binding(),
                window,
            })
            .await
            .map_err(|e| {
                ProtocolError::collaborator(
                    Step::Decrypt,
                    CollaboratorError::DecryptionUnauthorized(anyhow::Error::new(e)),
                )
            })?;

        let mut slots = Vec::with_capacity(handles.len());
        for handle in &handles {
            let slot = plaintexts.get(handle).copied().ok_or_else(|| {
                ProtocolError::collaborator(
                    Step::Decrypt,
                    CollaboratorError::DecryptionUnauthorized(anyhow::anyhow!(
                        "no plaintext returned for handle {}",
                        handle
                    )),
                )
            })?;
            slots.push(slot);
        }

        let cid = codec::slots_to_cid(&SlotPair::new(slots[0], slots[1]))?;
        tracing::info!(owner = %owner, index, name = %record.name, "record revealed");
        Ok(cid)
    }
}
