//! Reversible packing of IPFS multihashes into address-shaped slots
//!
//! The confidential record store only accepts encrypted 20-byte values, so a
//! content identifier has to be split across two of them before it can be
//! submitted. This module owns that transformation and the base58 text form
//! of a multihash (the CIDv0 string users see).
//!
//! # Packed Layout
//!
//! ```text
//! byte:  0                         19 20                        38   39
//!        [ multihash ........... | .......... zero filler ...... | len ]
//!        \________ slot A ______/ \____________ slot B ______________/
//! ```
//!
//! The last byte always holds the original multihash length, which caps the
//! supported multihash at 39 bytes. A sha2-256 multihash is 34.
//!
//! Everything here is pure: no I/O, no randomness.

pub mod base58;
pub mod multihash;
pub mod slots;

pub use self::multihash::{cid_from_file, sha256_multihash, validate_multihash, SHA2_256_CODE};
pub use slots::{
    cid_to_slots, decode, decode_slices, encode, slots_to_cid, Slot, SlotPair,
    LENGTH_BYTE_INDEX, MAX_MULTIHASH_LEN, PACKED_SIZE, SLOT_SIZE,
};

/// Local, deterministic failures of the codec.
///
/// These are always caused by the input and can be fixed by correcting it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// The multihash does not fit in front of the trailing length byte
    #[error("multihash is {0} bytes, at most {max} fit in a slot pair", max = MAX_MULTIHASH_LEN)]
    TooLong(usize),
    /// A slot was not exactly 20 bytes
    #[error("invalid slot length, expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    /// A character outside the bitcoin base58 alphabet
    #[error("invalid base58 character {character:?} at position {position}")]
    InvalidBase58 { character: char, position: usize },
    /// The length byte of a packed pair points past the payload area
    #[error("corrupt length byte {0} in packed slot pair")]
    CorruptLength(u8),
    /// A slot string was not valid hex
    #[error("invalid slot hex: {0}")]
    InvalidHex(String),
    /// Bytes that do not parse as a multihash
    #[error("invalid multihash: {0}")]
    InvalidMultihash(String),
}
