//! Confidential record protocol
//!
//! Per record, from the submitting client's point of view:
//!
//! ```text
//! Unsubmitted -> Hashed -> Encoded -> Encrypted -> Submitted ( -> Revealed )
//! ```
//!
//! The first four transitions are driven through a [`Submission`]; the
//! ledger write is all-or-nothing. Revealing is a read-side round trip that
//! can be repeated and never touches ledger state.

mod client;
mod error;
mod submission;

pub use client::{ClientConfig, RecordClient, RecordEntry, RecordListing, DEFAULT_DURATION_DAYS};
pub use error::{CollaboratorError, FailureCategory, MissingInput, ProtocolError, Step};
pub use submission::{Submission, SubmissionStage};
