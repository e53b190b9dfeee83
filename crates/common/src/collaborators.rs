//! External services the record protocol drives
//!
//! Each collaborator is injected into the [`crate::protocol::RecordClient`]
//! rather than reached through global state. Their errors are opaque to the
//! protocol: it reports them verbatim, tagged with the step that failed.

use std::collections::HashMap;
use std::convert::Infallible;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::codec::Slot;
use crate::crypto::{
    Address, AuthorizationDomain, DecryptAuthorization, EphemeralKeypair, SecretKey,
    SignedAuthorization, ValidityWindow,
};
use crate::record::{Binding, EncryptedInput, Handle};

/// Computes the content digest of a file
pub trait ContentHasher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn sha256(&self, bytes: &[u8]) -> Result<[u8; 32], Self::Error>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    type Error = Infallible;

    fn sha256(&self, bytes: &[u8]) -> Result<[u8; 32], Self::Error> {
        Ok(Sha256::digest(bytes).into())
    }
}

/// Encrypts plaintext slots for submission to the confidential runtime
#[async_trait]
pub trait ConfidentialEncryptor: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Encrypt both values under the same binding, returning one handle per
    /// value (in order) and a single proof covering the pair.
    async fn encrypt(
        &self,
        values: [Slot; 2],
        binding: Binding,
    ) -> Result<EncryptedInput, Self::Error>;
}

/// Everything a user decryption needs, borrowed for the length of one call
#[derive(Debug)]
pub struct DecryptRequest<'a> {
    pub handles: &'a [Handle],
    pub keypair: &'a EphemeralKeypair,
    pub authorization: &'a SignedAuthorization,
    pub binding: Binding,
    pub window: ValidityWindow,
}

/// Reveals plaintext behind handles to an account holding a signed authorization
#[async_trait]
pub trait AuthorizedDecryptor: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// The domain authorizations must be signed under
    fn domain(&self) -> AuthorizationDomain;

    /// Decrypt every handle in the request, keyed by handle
    async fn user_decrypt(
        &self,
        request: DecryptRequest<'_>,
    ) -> Result<HashMap<Handle, Slot>, Self::Error>;
}

/// Signs decryption authorizations on behalf of an account
#[async_trait]
pub trait AuthorizationSigner: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn address(&self) -> Address;

    async fn sign(
        &self,
        domain: &AuthorizationDomain,
        authorization: DecryptAuthorization,
    ) -> Result<SignedAuthorization, Self::Error>;
}

/// Signs with an account key held in memory
#[derive(Debug, Clone)]
pub struct LocalSigner {
    key: SecretKey,
}

impl LocalSigner {
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }
}

#[async_trait]
impl AuthorizationSigner for LocalSigner {
    type Error = Infallible;

    fn address(&self) -> Address {
        self.key.address()
    }

    async fn sign(
        &self,
        domain: &AuthorizationDomain,
        authorization: DecryptAuthorization,
    ) -> Result<SignedAuthorization, Self::Error> {
        let signature = self.key.sign(&authorization.signing_digest(domain));
        Ok(SignedAuthorization {
            authorization,
            signer: self.key.public(),
            signature,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sha256_hasher() {
        let digest = Sha256Hasher.sha256(b"Hello").unwrap();
        assert_eq!(
            hex::encode(digest),
            "185f8db32271fe25f561a6fc938b2e264306ec304eda518007d1764826381969"
        );
    }

    #[tokio::test]
    async fn test_local_signer_signature_verifies() {
        let key = SecretKey::generate();
        let signer = LocalSigner::new(key.clone());
        let domain = AuthorizationDomain {
            name: "Decryption".to_string(),
            version: "1".to_string(),
            chain_id: 31337,
            verifying_contract: Address::from([3; 20]),
        };
        let authorization = DecryptAuthorization::new(
            EphemeralKeypair::generate().public_key(),
            vec![Address::from([4; 20])],
            ValidityWindow::starting_now(10).unwrap(),
        );

        let signed = signer.sign(&domain, authorization).await.unwrap();
        assert_eq!(signer.address(), key.address());
        assert_eq!(signed.verify(&domain).unwrap(), key.address());
    }
}
