//! Bitcoin-alphabet base58, as used by CIDv0 strings
//!
//! Thin wrapper over `bs58`. Every leading zero byte maps to one leading `1`
//! and back. Unlike the library, the empty input encodes to `"1"`, never to
//! the empty string.

use super::EncodingError;

pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Encode bytes as base58.
pub fn encode(bytes: &[u8]) -> String {
    let out = bs58::encode(bytes).into_string();
    if out.is_empty() {
        return (ALPHABET[0] as char).to_string();
    }
    out
}

/// Decode a base58 string back into bytes.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidBase58`] on the first character outside
/// the alphabet. No partial output is produced.
pub fn decode(input: &str) -> Result<Vec<u8>, EncodingError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|_| invalid_character(input))
}

/// Locate the offending character, by char position rather than byte offset
fn invalid_character(input: &str) -> EncodingError {
    let (position, character) = input
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii() || !ALPHABET.contains(&(*c as u8)))
        .unwrap_or((input.chars().count(), char::REPLACEMENT_CHARACTER));
    EncodingError::InvalidBase58 {
        character,
        position,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_encodes_to_first_symbol() {
        assert_eq!(encode(&[]), "1");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_all_zero_input() {
        assert_eq!(encode(&[0]), "1");
        assert_eq!(encode(&[0, 0, 0]), "111");
        assert_eq!(decode("111").unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode(b"hello world"), "StV1DL6CwTryKyV");
        assert_eq!(decode("StV1DL6CwTryKyV").unwrap(), b"hello world");
        assert_eq!(encode(&[0, 0, 0x28, 0x7f, 0xb4, 0xcd]), "11233QC4");
        assert_eq!(encode(&[0xff]), "5Q");
        assert_eq!(encode(&[58]), "21");
    }

    #[test]
    fn test_leading_zeros_survive() {
        let bytes = [0, 0, 1, 2, 3, 0, 0];
        let encoded = encode(&bytes);
        assert!(encoded.starts_with("11"));
        assert_eq!(decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_rejects_characters_outside_alphabet() {
        for (input, character, position) in [
            ("abc0", '0', 3),
            ("Oabc", 'O', 0),
            ("aIb", 'I', 1),
            ("xyl", 'l', 2),
            ("Qm é", ' ', 2),
        ] {
            assert_eq!(
                decode(input),
                Err(EncodingError::InvalidBase58 {
                    character,
                    position
                })
            );
        }
    }

    #[test]
    fn test_rejects_non_ascii() {
        assert!(matches!(
            decode("Qmé"),
            Err(EncodingError::InvalidBase58 { character: 'é', .. })
        ));
    }
}
