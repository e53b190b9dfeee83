//! Symmetric encryption using ChaCha20-Poly1305
//!
//! Used wherever a plaintext slot has to sit at rest or travel sealed: the
//! devnet's ciphertext table and the re-encryption of decrypted slots to a
//! reveal's ephemeral key.

use std::ops::Deref;

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use serde::{Deserialize, Serialize};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of ChaCha20-Poly1305 key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
}

/// A 256-bit symmetric key
///
/// Ciphertexts are laid out as `nonce (12 bytes) || encrypted(plaintext) || tag (16 bytes)`.
/// Callers may bind associated data that must be presented again on decryption.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Secret([u8; SECRET_SIZE]);

impl Default for Secret {
    fn default() -> Self {
        Secret([0; SECRET_SIZE])
    }
}

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Derive a secret from key material under a context string (blake3 KDF)
    pub fn derive(context: &str, material: &[u8]) -> Self {
        Self(blake3::derive_key(context, material))
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt `data`, authenticating `aad` alongside it.
    ///
    /// A random nonce is generated for each encryption operation.
    pub fn encrypt(&self, data: &[u8], aad: &[u8]) -> Result<Vec<u8>, SecretError> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes)
            .map_err(|e| anyhow::anyhow!("failed to generate nonce: {}", e))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, Payload { msg: data, aad })
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt data produced by [`Secret::encrypt`] with the same `aad`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short or authentication fails
    /// (tampered ciphertext, wrong key or wrong associated data).
    pub fn decrypt(&self, data: &[u8], aad: &[u8]) -> Result<Vec<u8>, SecretError> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(anyhow::anyhow!("ciphertext too short").into());
        }

        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let plaintext = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: &data[NONCE_SIZE..],
                    aad,
                },
            )
            .map_err(|_| anyhow::anyhow!("decrypt error"))?;
        Ok(plaintext)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_secret_encrypt_decrypt() {
        let secret = Secret::generate();
        let data = [0x11u8; 20];

        let encrypted = secret.encrypt(&data, b"slot").unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + data.len() + TAG_SIZE);
        assert_eq!(secret.decrypt(&encrypted, b"slot").unwrap(), data);
    }

    #[test]
    fn test_nonce_is_fresh() {
        let secret = Secret::generate();
        let a = secret.encrypt(b"same", b"").unwrap();
        let b = secret.encrypt(b"same", b"").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_wrong_key_aad_and_tampering() {
        let secret = Secret::generate();
        let mut encrypted = secret.encrypt(b"payload", b"bound").unwrap();

        assert!(Secret::generate().decrypt(&encrypted, b"bound").is_err());
        assert!(secret.decrypt(&encrypted, b"other").is_err());

        encrypted[NONCE_SIZE + 1] ^= 0xff;
        assert!(secret.decrypt(&encrypted, b"bound").is_err());
        assert!(secret.decrypt(&[0u8; 8], b"bound").is_err());
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Secret::derive("cipherfile test", b"material");
        let b = Secret::derive("cipherfile test", b"material");
        let c = Secret::derive("cipherfile other", b"material");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
