//! Single-use X25519 keypairs scoping one decryption authorization
//!
//! A reveal generates a fresh [`EphemeralKeypair`], embeds its public half in
//! the signed authorization, and hands the keypair to the decryption
//! collaborator. Plaintext slots come back sealed to the public half:
//!
//! ```text
//! [ sender_pubkey: 32 bytes ][ nonce: 12 ][ ciphertext ][ tag: 16 ]
//! ```
//!
//! The sender key is itself ephemeral; the shared secret is the X25519 ECDH
//! output run through the blake3 KDF. The keypair is neither `Clone` nor
//! serializable, so it cannot outlive the reveal that created it.

use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::secret::{Secret, SecretError};

/// Size of an X25519 public key in bytes
pub const EPHEMERAL_KEY_SIZE: usize = 32;

const SEAL_CONTEXT: &str = "cipherfile 2025 ephemeral reencryption";

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("sealed box too short")]
    Truncated,
    #[error("seal error: {0}")]
    Secret(#[from] SecretError),
}

/// Fresh X25519 keypair generated for exactly one reveal.
pub struct EphemeralKeypair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

impl EphemeralKeypair {
    pub fn generate() -> Self {
        let mut bytes = [0u8; EPHEMERAL_KEY_SIZE];
        getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
        let secret = StaticSecret::from(bytes);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> [u8; EPHEMERAL_KEY_SIZE] {
        self.public.to_bytes()
    }

    /// Open a box produced by [`seal_to`] for this keypair's public key.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, SealError> {
        if sealed.len() < EPHEMERAL_KEY_SIZE {
            return Err(SealError::Truncated);
        }
        let mut sender = [0u8; EPHEMERAL_KEY_SIZE];
        sender.copy_from_slice(&sealed[..EPHEMERAL_KEY_SIZE]);
        let sender = X25519PublicKey::from(sender);

        let shared = self.secret.diffie_hellman(&sender);
        let key = Secret::derive(SEAL_CONTEXT, shared.as_bytes());
        Ok(key.decrypt(&sealed[EPHEMERAL_KEY_SIZE..], self.public.as_bytes())?)
    }
}

/// Seal `plaintext` so only the holder of the matching ephemeral private key can open it.
pub fn seal_to(
    recipient: &[u8; EPHEMERAL_KEY_SIZE],
    plaintext: &[u8],
) -> Result<Vec<u8>, SealError> {
    let sender = EphemeralKeypair::generate();
    let recipient = X25519PublicKey::from(*recipient);

    let shared = sender.secret.diffie_hellman(&recipient);
    let key = Secret::derive(SEAL_CONTEXT, shared.as_bytes());
    let ciphertext = key.encrypt(plaintext, recipient.as_bytes())?;

    let mut out = Vec::with_capacity(EPHEMERAL_KEY_SIZE + ciphertext.len());
    out.extend_from_slice(&sender.public_key());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let keypair = EphemeralKeypair::generate();
        let sealed = seal_to(&keypair.public_key(), b"twenty byte payload!").unwrap();
        assert_eq!(keypair.open(&sealed).unwrap(), b"twenty byte payload!");
    }

    #[test]
    fn test_other_keypair_cannot_open() {
        let keypair = EphemeralKeypair::generate();
        let intruder = EphemeralKeypair::generate();
        let sealed = seal_to(&keypair.public_key(), b"secret").unwrap();
        assert!(intruder.open(&sealed).is_err());
    }

    #[test]
    fn test_keypairs_are_fresh() {
        let a = EphemeralKeypair::generate();
        let b = EphemeralKeypair::generate();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_truncated_box() {
        let keypair = EphemeralKeypair::generate();
        assert!(matches!(keypair.open(&[0u8; 10]), Err(SealError::Truncated)));
    }
}
