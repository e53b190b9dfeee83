//! Time-boxed, signed authorizations for user decryption
//!
//! An account asks the confidential runtime to reveal its own slots by
//! signing a [`DecryptAuthorization`]: the reveal's ephemeral public key, the
//! contracts whose handles may be decrypted, and a validity window.
//!
//! The signed bytes follow the typed structured-data layout used by EVM
//! wallets, with sha256 as the hash function:
//!
//! ```text
//! digest = H(0x19 || 0x01 || domainSeparator || structHash)
//! domainSeparator = H(H(DOMAIN_TYPE) || H(name) || H(version) || chainId || verifyingContract)
//! structHash = H(H(AUTHORIZATION_TYPE) || H(publicKey) || H(contracts..) || start || days)
//! ```
//!
//! Integers and addresses are encoded as 32-byte big-endian words, dynamic
//! values by their hash. The domain separates signatures meant for one
//! runtime deployment from any other.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ephemeral::EPHEMERAL_KEY_SIZE;
use super::keys::{Address, PublicKey};

pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
pub const AUTHORIZATION_TYPE: &str = "UserDecryptRequestVerification(bytes publicKey,address[] contractAddresses,uint256 startTimestamp,uint256 durationDays)";

/// Longest validity window an authorization may request
pub const MAX_DURATION_DAYS: u32 = 365;
pub const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("duration of {0} days outside 1..={max}", max = MAX_DURATION_DAYS)]
    InvalidDuration(u32),
    #[error("authorization not valid until {start}, now {now}")]
    NotYetValid { start: u64, now: u64 },
    #[error("authorization expired at {end}, now {now}")]
    Expired { end: u64, now: u64 },
    #[error("signature does not verify")]
    BadSignature,
}

fn word(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

fn hash(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

/// Identifies which runtime deployment a signature is meant for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl AuthorizationDomain {
    pub fn separator(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(hash(DOMAIN_TYPE.as_bytes()));
        hasher.update(hash(self.name.as_bytes()));
        hasher.update(hash(self.version.as_bytes()));
        hasher.update(word(self.chain_id));
        hasher.update(self.verifying_contract.to_word());
        hasher.finalize().into()
    }
}

/// Start time (unix seconds) plus a duration in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub start_timestamp: u64,
    pub duration_days: u32,
}

impl ValidityWindow {
    pub fn new(start_timestamp: u64, duration_days: u32) -> Result<Self, AuthorizationError> {
        if duration_days == 0 || duration_days > MAX_DURATION_DAYS {
            return Err(AuthorizationError::InvalidDuration(duration_days));
        }
        Ok(Self {
            start_timestamp,
            duration_days,
        })
    }

    /// Window starting now
    pub fn starting_now(duration_days: u32) -> Result<Self, AuthorizationError> {
        Self::new(chrono::Utc::now().timestamp().max(0) as u64, duration_days)
    }

    pub fn end_timestamp(&self) -> u64 {
        self.start_timestamp
            .saturating_add(self.duration_days as u64 * SECONDS_PER_DAY)
    }

    /// Check `now` against the window, `[start, end)`
    pub fn check(&self, now: u64) -> Result<(), AuthorizationError> {
        if self.duration_days == 0 || self.duration_days > MAX_DURATION_DAYS {
            return Err(AuthorizationError::InvalidDuration(self.duration_days));
        }
        if now < self.start_timestamp {
            return Err(AuthorizationError::NotYetValid {
                start: self.start_timestamp,
                now,
            });
        }
        let end = self.end_timestamp();
        if now >= end {
            return Err(AuthorizationError::Expired { end, now });
        }
        Ok(())
    }
}

/// The message an account signs to permit one user decryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptAuthorization {
    /// Public half of the reveal's ephemeral keypair
    pub public_key: [u8; EPHEMERAL_KEY_SIZE],
    pub contract_addresses: Vec<Address>,
    pub window: ValidityWindow,
}

impl DecryptAuthorization {
    pub fn new(
        public_key: [u8; EPHEMERAL_KEY_SIZE],
        contract_addresses: Vec<Address>,
        window: ValidityWindow,
    ) -> Self {
        Self {
            public_key,
            contract_addresses,
            window,
        }
    }

    pub fn struct_hash(&self) -> [u8; 32] {
        let mut contracts = Vec::with_capacity(self.contract_addresses.len() * 32);
        for address in &self.contract_addresses {
            contracts.extend_from_slice(&address.to_word());
        }

        let mut hasher = Sha256::new();
        hasher.update(hash(AUTHORIZATION_TYPE.as_bytes()));
        hasher.update(hash(&self.public_key));
        hasher.update(hash(&contracts));
        hasher.update(word(self.window.start_timestamp));
        hasher.update(word(self.window.duration_days as u64));
        hasher.finalize().into()
    }

    /// The domain-separated digest that gets signed
    pub fn signing_digest(&self, domain: &AuthorizationDomain) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update([0x19, 0x01]);
        hasher.update(domain.separator());
        hasher.update(self.struct_hash());
        hasher.finalize().into()
    }

    pub fn covers(&self, contract: &Address) -> bool {
        self.contract_addresses.contains(contract)
    }
}

/// A [`DecryptAuthorization`] together with the account signature over it
#[derive(Debug, Clone)]
pub struct SignedAuthorization {
    pub authorization: DecryptAuthorization,
    pub signer: PublicKey,
    pub signature: ed25519_dalek::Signature,
}

impl SignedAuthorization {
    /// Verify the signature under `domain`, returning the signing account
    pub fn verify(&self, domain: &AuthorizationDomain) -> Result<Address, AuthorizationError> {
        let digest = self.authorization.signing_digest(domain);
        self.signer
            .verify(&digest, &self.signature)
            .map_err(|_| AuthorizationError::BadSignature)?;
        Ok(self.signer.address())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SecretKey;

    fn domain() -> AuthorizationDomain {
        AuthorizationDomain {
            name: "Decryption".to_string(),
            version: "1".to_string(),
            chain_id: 11155111,
            verifying_contract: Address::from([0x5a; 20]),
        }
    }

    fn authorization() -> DecryptAuthorization {
        DecryptAuthorization::new(
            [9u8; EPHEMERAL_KEY_SIZE],
            vec![Address::from([0x62; 20])],
            ValidityWindow::new(1_700_000_000, 10).unwrap(),
        )
    }

    fn sign(key: &SecretKey, domain: &AuthorizationDomain) -> SignedAuthorization {
        let authorization = authorization();
        let signature = key.sign(&authorization.signing_digest(domain));
        SignedAuthorization {
            authorization,
            signer: key.public(),
            signature,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let key = SecretKey::generate();
        let signed = sign(&key, &domain());
        assert_eq!(signed.verify(&domain()).unwrap(), key.address());
    }

    #[test]
    fn test_domain_separation() {
        let key = SecretKey::generate();
        let signed = sign(&key, &domain());

        let mut other = domain();
        other.chain_id = 1;
        assert_eq!(signed.verify(&other), Err(AuthorizationError::BadSignature));

        let mut other = domain();
        other.verifying_contract = Address::from([0x5b; 20]);
        assert_eq!(signed.verify(&other), Err(AuthorizationError::BadSignature));
    }

    #[test]
    fn test_tampered_message() {
        let key = SecretKey::generate();
        let mut signed = sign(&key, &domain());
        signed.authorization.window.duration_days = 365;
        assert_eq!(signed.verify(&domain()), Err(AuthorizationError::BadSignature));

        let mut signed = sign(&key, &domain());
        signed.authorization.contract_addresses.push(Address::from([1; 20]));
        assert_eq!(signed.verify(&domain()), Err(AuthorizationError::BadSignature));
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(
            authorization().signing_digest(&domain()),
            authorization().signing_digest(&domain())
        );
        let mut other = authorization();
        other.public_key[0] ^= 1;
        assert_ne!(
            other.signing_digest(&domain()),
            authorization().signing_digest(&domain())
        );
    }

    #[test]
    fn test_window() {
        let window = ValidityWindow::new(1_000, 1).unwrap();
        assert!(window.check(1_000).is_ok());
        assert!(window.check(1_000 + SECONDS_PER_DAY - 1).is_ok());
        assert!(matches!(
            window.check(999),
            Err(AuthorizationError::NotYetValid { .. })
        ));
        assert!(matches!(
            window.check(1_000 + SECONDS_PER_DAY),
            Err(AuthorizationError::Expired { .. })
        ));

        assert_eq!(
            ValidityWindow::new(0, 0),
            Err(AuthorizationError::InvalidDuration(0))
        );
        assert_eq!(
            ValidityWindow::new(0, 366),
            Err(AuthorizationError::InvalidDuration(366))
        );
    }
}
