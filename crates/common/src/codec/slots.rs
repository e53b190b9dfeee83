use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{base58, EncodingError};

/// Width of one confidential slot (an address-shaped value)
pub const SLOT_SIZE: usize = 20;
/// Width of the packed buffer backing a slot pair
pub const PACKED_SIZE: usize = SLOT_SIZE * 2;
/// Position of the trailing length byte
pub const LENGTH_BYTE_INDEX: usize = PACKED_SIZE - 1;
/// Largest multihash that fits in front of the length byte
pub const MAX_MULTIHASH_LEN: usize = LENGTH_BYTE_INDEX;

/// One 20-byte plaintext slot.
///
/// Rendered as `0x`-prefixed lowercase hex, the same shape as an account
/// address, which is what the confidential runtime expects to encrypt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot([u8; SLOT_SIZE]);

impl Deref for Slot {
    type Target = [u8; SLOT_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SLOT_SIZE]> for Slot {
    fn from(bytes: [u8; SLOT_SIZE]) -> Self {
        Slot(bytes)
    }
}

impl From<Slot> for [u8; SLOT_SIZE] {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl TryFrom<&[u8]> for Slot {
    type Error = EncodingError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SLOT_SIZE] =
            bytes
                .try_into()
                .map_err(|_| EncodingError::InvalidLength {
                    expected: SLOT_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Slot(bytes))
    }
}

impl FromStr for Slot {
    type Err = EncodingError;

    /// Accepts both plain hex and "0x"-prefixed hex strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| EncodingError::InvalidHex(e.to_string()))?;
        Slot::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Slot {
    pub fn to_bytes(&self) -> [u8; SLOT_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

/// The two slots a multihash is packed into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPair {
    pub a: Slot,
    pub b: Slot,
}

impl SlotPair {
    pub fn new(a: Slot, b: Slot) -> Self {
        Self { a, b }
    }

    pub fn to_array(&self) -> [Slot; 2] {
        [self.a, self.b]
    }

    fn packed(&self) -> [u8; PACKED_SIZE] {
        let mut buf = [0u8; PACKED_SIZE];
        buf[..SLOT_SIZE].copy_from_slice(self.a.as_ref());
        buf[SLOT_SIZE..].copy_from_slice(self.b.as_ref());
        buf
    }
}

impl From<[Slot; 2]> for SlotPair {
    fn from([a, b]: [Slot; 2]) -> Self {
        Self { a, b }
    }
}

/// Pack a multihash into two 20-byte slots.
///
/// # Errors
///
/// Returns [`EncodingError::TooLong`] if the multihash exceeds
/// [`MAX_MULTIHASH_LEN`] bytes.
pub fn encode(multihash: &[u8]) -> Result<SlotPair, EncodingError> {
    let len = multihash.len();
    if len > MAX_MULTIHASH_LEN {
        return Err(EncodingError::TooLong(len));
    }

    let mut buf = [0u8; PACKED_SIZE];
    buf[..len].copy_from_slice(multihash);
    buf[LENGTH_BYTE_INDEX] = len as u8;

    let mut a = [0u8; SLOT_SIZE];
    let mut b = [0u8; SLOT_SIZE];
    a.copy_from_slice(&buf[..SLOT_SIZE]);
    b.copy_from_slice(&buf[SLOT_SIZE..]);
    Ok(SlotPair::new(a.into(), b.into()))
}

/// Recover the multihash packed into a slot pair.
///
/// Filler bytes between the payload and the length byte are ignored. The
/// result is not checked for multihash well-formedness; see
/// [`super::validate_multihash`].
///
/// # Errors
///
/// Returns [`EncodingError::CorruptLength`] if the length byte exceeds
/// [`MAX_MULTIHASH_LEN`], which `encode` never produces.
pub fn decode(pair: &SlotPair) -> Result<Vec<u8>, EncodingError> {
    let buf = pair.packed();
    let len = buf[LENGTH_BYTE_INDEX];
    if len as usize > MAX_MULTIHASH_LEN {
        return Err(EncodingError::CorruptLength(len));
    }
    Ok(buf[..len as usize].to_vec())
}

/// [`decode`] over raw slices, as handed back by a decryption collaborator.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidLength`] if either slice is not exactly
/// [`SLOT_SIZE`] bytes.
pub fn decode_slices(a: &[u8], b: &[u8]) -> Result<Vec<u8>, EncodingError> {
    let pair = SlotPair::new(Slot::try_from(a)?, Slot::try_from(b)?);
    decode(&pair)
}

/// Base58-decode a CID string and pack its multihash.
pub fn cid_to_slots(cid: &str) -> Result<SlotPair, EncodingError> {
    let multihash = base58::decode(cid)?;
    encode(&multihash)
}

/// Unpack a slot pair and render the multihash as a CID string.
pub fn slots_to_cid(pair: &SlotPair) -> Result<String, EncodingError> {
    let multihash = decode(pair)?;
    Ok(base58::encode(&multihash))
}
