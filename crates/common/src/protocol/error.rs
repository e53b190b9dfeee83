use std::fmt;

use crate::codec::EncodingError;
use crate::crypto::AuthorizationError;

/// Where in the protocol a collaborator failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Hash,
    Encrypt,
    Submit,
    ReadLedger,
    Sign,
    Decrypt,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Hash => "hash",
            Step::Encrypt => "encrypt",
            Step::Submit => "submit",
            Step::ReadLedger => "ledger read",
            Step::Sign => "sign",
            Step::Decrypt => "decrypt",
        };
        f.write_str(name)
    }
}

/// Failures reported by external collaborators, passed through verbatim
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("hashing failed: {0}")]
    HashingFailed(anyhow::Error),
    #[error("encryption failed: {0}")]
    EncryptionFailed(anyhow::Error),
    #[error("submission rejected: {0}")]
    SubmissionRejected(anyhow::Error),
    #[error("signing declined: {0}")]
    SigningDeclined(anyhow::Error),
    #[error("decryption unauthorized: {0}")]
    DecryptionUnauthorized(anyhow::Error),
    #[error("ledger unreachable: {0}")]
    LedgerUnreachable(anyhow::Error),
}

/// Client-side input the current step needs but nobody has produced yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    File,
    Name,
    ContentIdentifier,
    Slots,
    EncryptedInput,
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            MissingInput::File => "file",
            MissingInput::Name => "name",
            MissingInput::ContentIdentifier => "content identifier",
            MissingInput::Slots => "encoded slots",
            MissingInput::EncryptedInput => "encrypted input",
        };
        f.write_str(what)
    }
}

/// Coarse grouping of failures for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Something has to be selected or computed first
    MissingInput,
    /// A signer, ledger, encryptor or decryptor said no
    CollaboratorRejected,
    /// Bad base58, oversized multihash, corrupt slots
    MalformedInput,
    /// The request conflicts with work already done or in progress
    InvalidState,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureCategory::MissingInput => "missing input",
            FailureCategory::CollaboratorRejected => "collaborator rejected",
            FailureCategory::MalformedInput => "malformed input",
            FailureCategory::InvalidState => "invalid state",
        };
        f.write_str(text)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("{0}")]
    MissingInput(MissingInput),
    #[error("{0}")]
    Malformed(#[from] EncodingError),
    #[error("invalid authorization: {0}")]
    Authorization(#[from] AuthorizationError),
    #[error("{step} step failed: {source}")]
    Collaborator {
        step: Step,
        source: CollaboratorError,
    },
    #[error("no record at index {index}, owner has {count}")]
    NoSuchRecord { index: u64, count: u64 },
    #[error("submission already on ledger at index {0}")]
    AlreadySubmitted(u64),
    #[error("reveal of record {0} already in flight")]
    RevealInFlight(u64),
}

impl ProtocolError {
    pub(crate) fn collaborator(step: Step, source: CollaboratorError) -> Self {
        ProtocolError::Collaborator { step, source }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            ProtocolError::MissingInput(_) | ProtocolError::NoSuchRecord { .. } => {
                FailureCategory::MissingInput
            }
            ProtocolError::Malformed(_) | ProtocolError::Authorization(_) => {
                FailureCategory::MalformedInput
            }
            ProtocolError::Collaborator { .. } => FailureCategory::CollaboratorRejected,
            ProtocolError::AlreadySubmitted(_) | ProtocolError::RevealInFlight(_) => {
                FailureCategory::InvalidState
            }
        }
    }

    /// The failed step, for collaborator failures
    pub fn step(&self) -> Option<Step> {
        match self {
            ProtocolError::Collaborator { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Short cause string for display: `<category>: <detail>`
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.category(), self)
    }
}
