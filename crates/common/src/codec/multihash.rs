use ::multihash::Multihash;
use sha2::{Digest, Sha256};

use super::{base58, EncodingError};

/// Multicodec code for sha2-256
pub const SHA2_256_CODE: u64 = 0x12;
/// Digest length of sha2-256
pub const SHA2_256_SIZE: usize = 32;
/// `[code, length, digest..]` for sha2-256
pub const SHA2_256_MULTIHASH_LEN: usize = SHA2_256_SIZE + 2;

/// Wrap a sha2-256 digest as multihash bytes, `[0x12, 0x20, digest..]`.
pub fn sha256_multihash(digest: &[u8; SHA2_256_SIZE]) -> Result<Vec<u8>, EncodingError> {
    let mh = Multihash::<64>::wrap(SHA2_256_CODE, digest)
        .map_err(|e| EncodingError::InvalidMultihash(e.to_string()))?;
    Ok(mh.to_bytes())
}

/// CIDv0 string for a file: base58 of the sha2-256 multihash of its bytes.
pub fn cid_from_file(bytes: &[u8]) -> Result<String, EncodingError> {
    let digest: [u8; SHA2_256_SIZE] = Sha256::digest(bytes).into();
    Ok(base58::encode(&sha256_multihash(&digest)?))
}

/// Check that bytes form exactly one well-formed multihash.
///
/// The slot codec deliberately does not do this, so callers that need a
/// meaningful identifier run it on the decoded bytes.
///
/// Returns the hash function code and the digest length.
pub fn validate_multihash(bytes: &[u8]) -> Result<(u64, usize), EncodingError> {
    let mh = Multihash::<64>::from_bytes(bytes)
        .map_err(|e| EncodingError::InvalidMultihash(e.to_string()))?;
    Ok((mh.code(), mh.size() as usize))
}
