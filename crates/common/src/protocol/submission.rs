use std::fmt;

use crate::codec::{self, SlotPair};
use crate::record::EncryptedInput;

use super::error::{MissingInput, ProtocolError};

/// How far a submission has progressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubmissionStage {
    Unsubmitted,
    Hashed,
    Encoded,
    Encrypted,
    Submitted,
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Client-local state of one record on its way to the ledger
///
/// Each step of [`super::RecordClient`] fills in one more field. A failed
/// step leaves the submission where it was, so it can be retried without
/// redoing earlier work. Replacing an input (file, CID) discards everything
/// computed from it. Nothing here is persisted.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    name: Option<String>,
    file: Option<Vec<u8>>,
    multihash: Option<Vec<u8>>,
    slots: Option<SlotPair>,
    encrypted: Option<EncryptedInput>,
    index: Option<u64>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from file contents; the name defaults to nothing
    pub fn from_file(file: Vec<u8>) -> Self {
        let mut submission = Self::new();
        submission.set_file(file);
        submission
    }

    /// Start from an already computed CID, skipping the hash step
    pub fn with_cid(cid: &str) -> Result<Self, ProtocolError> {
        let mut submission = Self::new();
        submission.set_cid(cid)?;
        Ok(submission)
    }

    pub fn stage(&self) -> SubmissionStage {
        if self.index.is_some() {
            SubmissionStage::Submitted
        } else if self.encrypted.is_some() {
            SubmissionStage::Encrypted
        } else if self.slots.is_some() {
            SubmissionStage::Encoded
        } else if self.multihash.is_some() {
            SubmissionStage::Hashed
        } else {
            SubmissionStage::Unsubmitted
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_file(&mut self, file: Vec<u8>) {
        self.file = Some(file);
        self.multihash = None;
        self.reset_from_slots();
    }

    /// Replace the content identifier directly, validating its base58 form
    pub fn set_cid(&mut self, cid: &str) -> Result<(), ProtocolError> {
        let multihash = codec::base58::decode(cid)?;
        self.multihash = Some(multihash);
        self.reset_from_slots();
        Ok(())
    }

    fn reset_from_slots(&mut self) {
        self.slots = None;
        self.encrypted = None;
        self.index = None;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn file(&self) -> Option<&[u8]> {
        self.file.as_deref()
    }

    pub fn multihash(&self) -> Option<&[u8]> {
        self.multihash.as_deref()
    }

    /// Base58 CID of the computed multihash
    pub fn cid(&self) -> Option<String> {
        self.multihash.as_deref().map(codec::base58::encode)
    }

    pub fn slots(&self) -> Option<&SlotPair> {
        self.slots.as_ref()
    }

    pub fn encrypted(&self) -> Option<&EncryptedInput> {
        self.encrypted.as_ref()
    }

    /// Ledger index once submitted
    pub fn index(&self) -> Option<u64> {
        self.index
    }

    pub(crate) fn ensure_open(&self) -> Result<(), ProtocolError> {
        match self.index {
            Some(index) => Err(ProtocolError::AlreadySubmitted(index)),
            None => Ok(()),
        }
    }

    pub(crate) fn require_file(&self) -> Result<&[u8], ProtocolError> {
        self.file()
            .ok_or(ProtocolError::MissingInput(MissingInput::File))
    }

    pub(crate) fn require_multihash(&self) -> Result<&[u8], ProtocolError> {
        self.multihash()
            .ok_or(ProtocolError::MissingInput(MissingInput::ContentIdentifier))
    }

    pub(crate) fn require_slots(&self) -> Result<SlotPair, ProtocolError> {
        self.slots
            .ok_or(ProtocolError::MissingInput(MissingInput::Slots))
    }

    pub(crate) fn require_name(&self) -> Result<String, ProtocolError> {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(ProtocolError::MissingInput(MissingInput::Name)),
        }
    }

    pub(crate) fn require_encrypted(&self) -> Result<EncryptedInput, ProtocolError> {
        self.encrypted
            .clone()
            .ok_or(ProtocolError::MissingInput(MissingInput::EncryptedInput))
    }

    pub(crate) fn hashed(&mut self, multihash: Vec<u8>) {
        self.multihash = Some(multihash);
        self.reset_from_slots();
    }

    pub(crate) fn encoded(&mut self, slots: SlotPair) {
        self.slots = Some(slots);
        self.encrypted = None;
    }

    pub(crate) fn encrypted_with(&mut self, input: EncryptedInput) {
        self.encrypted = Some(input);
    }

    pub(crate) fn submitted(&mut self, index: u64) {
        self.index = Some(index);
    }
}
