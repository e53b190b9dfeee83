//! Cryptographic primitives for confidential records
//!
//! - **Accounts**: Ed25519 keypairs (`SecretKey`/`PublicKey`) own records and
//!   sign decryption authorizations; an account's ledger identity is its
//!   20-byte [`Address`].
//! - **Authorizations**: domain-separated structured signatures over a
//!   reveal's ephemeral key, the contracts involved and a validity window.
//! - **Ephemeral keys**: one X25519 keypair per reveal; decrypted slots are
//!   sealed to it and opened client-side.
//! - **Secrets**: ChaCha20-Poly1305 keys for anything held at rest.

mod authorization;
mod ephemeral;
mod keys;
mod secret;

pub use authorization::{
    AuthorizationDomain, AuthorizationError, DecryptAuthorization, SignedAuthorization,
    ValidityWindow, MAX_DURATION_DAYS, SECONDS_PER_DAY,
};
pub use ed25519_dalek::Signature;
pub use ephemeral::{seal_to, EphemeralKeypair, SealError, EPHEMERAL_KEY_SIZE};
pub use keys::{Address, KeyError, PublicKey, SecretKey, ADDRESS_SIZE};
pub use secret::{Secret, SecretError, SECRET_SIZE};
