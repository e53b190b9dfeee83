use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::Address;

/// Size of a ciphertext handle in bytes
pub const HANDLE_SIZE: usize = 32;

/// Opaque reference to a ciphertext held by the confidential runtime
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle([u8; HANDLE_SIZE]);

impl From<[u8; HANDLE_SIZE]> for Handle {
    fn from(bytes: [u8; HANDLE_SIZE]) -> Self {
        Handle(bytes)
    }
}

impl Handle {
    pub fn to_bytes(&self) -> [u8; HANDLE_SIZE] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HANDLE_SIZE]
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self)
    }
}

impl FromStr for Handle {
    type Err = hex::FromHexError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut buff = [0u8; HANDLE_SIZE];
        hex::decode_to_slice(s, &mut buff)?;
        Ok(Handle(buff))
    }
}

impl Serialize for Handle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The (contract, account) pair ciphertexts are bound to at encryption time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub contract: Address,
    pub account: Address,
}

impl Binding {
    pub fn new(contract: Address, account: Address) -> Self {
        Self { contract, account }
    }
}

/// Two ciphertext handles and the proof that they were encrypted under one binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handles: [Handle; 2],
    #[serde(with = "hex_bytes")]
    pub proof: Vec<u8>,
}

/// One confidential file pointer as stored on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    /// Ledger-assigned, unix seconds
    pub timestamp: u64,
    pub slot_a: Handle,
    pub slot_b: Handle,
}

impl Record {
    pub fn handles(&self) -> [Handle; 2] {
        [self.slot_a, self.slot_b]
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_handle_hex() {
        let handle = Handle::from([0xcd; HANDLE_SIZE]);
        let text = handle.to_string();
        assert_eq!(text.len(), 2 + HANDLE_SIZE * 2);
        assert_eq!(text.parse::<Handle>().unwrap(), handle);
        assert!("0x1234".parse::<Handle>().is_err());
        assert!(Handle::default().is_zero());
    }

    #[test]
    fn test_record_json() {
        let record = Record {
            name: "myfile.pdf".to_string(),
            timestamp: 1_700_000_000,
            slot_a: Handle::from([1; HANDLE_SIZE]),
            slot_b: Handle::from([2; HANDLE_SIZE]),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(serde_json::from_str::<Record>(&json).unwrap(), record);

        let input = EncryptedInput {
            handles: record.handles(),
            proof: vec![0xde, 0xad],
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["proof"], "dead");
    }
}
