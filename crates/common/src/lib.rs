/**
 * Multihash <-> two 20-byte slot packing,
 *  plus the base58 text form of CIDs.
 */
pub mod codec;
/**
 * External services the record protocol
 *  talks to: hashing, encryption, user
 *  decryption, and signing.
 */
pub mod collaborators;
/**
 * Cryptographic types and operations.
 *  - Account keys and addresses
 *  - Signed, time-boxed decryption authorizations
 *  - Ephemeral keypairs for reveals
 */
pub mod crypto;
/**
 * In-process confidential runtime and ledger,
 *  for local use and tests.
 */
pub mod devnet;
/**
 * Submission and reveal of confidential
 *  file pointers.
 */
pub mod protocol;
/**
 * The per-account append-only record ledger.
 */
pub mod record;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::codec::{cid_to_slots, slots_to_cid, EncodingError, Slot, SlotPair};
    pub use crate::collaborators::LocalSigner;
    pub use crate::crypto::{Address, PublicKey, SecretKey};
    pub use crate::devnet::Devnet;
    pub use crate::protocol::{ClientConfig, ProtocolError, RecordClient, Submission};
    pub use crate::record::{Record, RecordStore};
    pub use crate::version::build_info;
}
