//! Bech32 codec
//!
//! Generic checksummed text encoding between a byte payload and a
//! prefixed string, as used for Zenon addresses and Nostr public keys.
//! Payload bytes are regrouped from 8-bit to 5-bit words (big-endian bit
//! order) with zero padding on the final group; a 6-word checksum derived
//! from the prefix and the word sequence is appended.
//!
//! Pure and deterministic: no I/O, no shared state.

use thiserror::Error;

/// The fixed 32-character data alphabet
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Checksum generator coefficients
const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

/// Number of checksum words appended to the data part
const CHECKSUM_LENGTH: usize = 6;

/// Maximum overall string length accepted by the codec
const MAX_LENGTH: usize = 90;

/// Decoding and encoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Bech32Error {
    /// A character outside the codec's fixed alphabet (or the printable
    /// ASCII range for prefixes) appeared
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),

    /// Recomputed checksum did not match the encoded one
    #[error("checksum verification failed")]
    InvalidChecksum,

    /// Decoded prefix does not equal the expected value
    #[error("invalid prefix {found:?}; expected {expected:?}")]
    InvalidPrefix { expected: String, found: String },

    /// Non-zero bits in the zero padding of the final word group
    #[error("non-zero padding in final word group")]
    InvalidPadding,

    /// Upper- and lowercase characters mixed in one string
    #[error("mixed-case strings are not valid")]
    MixedCase,

    /// No prefix separator present
    #[error("missing prefix separator")]
    MissingSeparator,

    /// String or prefix length outside the codec's bounds
    #[error("invalid length: {details}")]
    InvalidLength { details: String },
}

/// Encode a byte payload under the given prefix.
///
/// The prefix must be non-empty lowercase printable ASCII. Output is
/// always lowercase.
pub fn encode(prefix: &str, payload: &[u8]) -> Result<String, Bech32Error> {
    validate_prefix(prefix)?;

    let words = to_words(payload);
    let total = prefix.len() + 1 + words.len() + CHECKSUM_LENGTH;
    if total > MAX_LENGTH {
        return Err(Bech32Error::InvalidLength {
            details: format!("encoded string would be {total} characters (limit {MAX_LENGTH})"),
        });
    }

    let checksum = create_checksum(prefix, &words);

    let mut out = String::with_capacity(total);
    out.push_str(prefix);
    out.push('1');
    for word in words.iter().chain(checksum.iter()) {
        out.push(CHARSET[*word as usize] as char);
    }
    Ok(out)
}

/// Decode a bech32 string into its prefix and byte payload.
///
/// Rejects mixed-case input, characters outside the alphabet, checksum
/// mismatches, and non-zero padding bits in the final word group.
pub fn decode(encoded: &str) -> Result<(String, Vec<u8>), Bech32Error> {
    let lower = normalize_case(encoded)?;

    let separator = lower.rfind('1').ok_or(Bech32Error::MissingSeparator)?;
    let (prefix, data_part) = lower.split_at(separator);
    let data_part = &data_part[1..];

    if prefix.is_empty() {
        return Err(Bech32Error::InvalidLength {
            details: "empty prefix".to_string(),
        });
    }
    if data_part.len() < CHECKSUM_LENGTH {
        return Err(Bech32Error::InvalidLength {
            details: format!("data part shorter than the {CHECKSUM_LENGTH}-word checksum"),
        });
    }
    if lower.len() > MAX_LENGTH {
        return Err(Bech32Error::InvalidLength {
            details: format!("string is {} characters (limit {MAX_LENGTH})", lower.len()),
        });
    }
    validate_prefix(prefix)?;

    let mut words = Vec::with_capacity(data_part.len());
    for ch in data_part.chars() {
        let index = CHARSET
            .iter()
            .position(|&c| c as char == ch)
            .ok_or(Bech32Error::InvalidCharacter(ch))?;
        words.push(index as u8);
    }

    if !verify_checksum(prefix, &words) {
        return Err(Bech32Error::InvalidChecksum);
    }

    let payload = from_words(&words[..words.len() - CHECKSUM_LENGTH])?;
    Ok((prefix.to_string(), payload))
}

/// Decode and require a specific prefix.
pub fn decode_expecting(expected_prefix: &str, encoded: &str) -> Result<Vec<u8>, Bech32Error> {
    let (prefix, payload) = decode(encoded)?;
    if prefix != expected_prefix {
        return Err(Bech32Error::InvalidPrefix {
            expected: expected_prefix.to_string(),
            found: prefix,
        });
    }
    Ok(payload)
}

/// Regroup 8-bit bytes into 5-bit words, zero-padding the final group.
fn to_words(payload: &[u8]) -> Vec<u8> {
    let mut words = Vec::with_capacity((payload.len() * 8).div_ceil(5));
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in payload {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            words.push(((acc >> bits) & 0x1f) as u8);
        }
    }
    if bits > 0 {
        words.push(((acc << (5 - bits)) & 0x1f) as u8);
    }
    words
}

/// Regroup 5-bit words back into bytes, rejecting non-zero padding.
fn from_words(words: &[u8]) -> Result<Vec<u8>, Bech32Error> {
    let mut payload = Vec::with_capacity(words.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    for &word in words {
        acc = (acc << 5) | u32::from(word);
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            payload.push(((acc >> bits) & 0xff) as u8);
        }
    }
    // A full byte of leftover bits means a stray word; any set padding
    // bit means the encoder did not zero-pad.
    if bits >= 5 || (acc << (8 - bits)) & 0xff != 0 {
        return Err(Bech32Error::InvalidPadding);
    }
    Ok(payload)
}

fn polymod(values: impl Iterator<Item = u8>) -> u32 {
    let mut checksum: u32 = 1;
    for value in values {
        let top = checksum >> 25;
        checksum = ((checksum & 0x01ff_ffff) << 5) ^ u32::from(value);
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                checksum ^= generator;
            }
        }
    }
    checksum
}

fn prefix_expand(prefix: &str) -> impl Iterator<Item = u8> + '_ {
    prefix
        .bytes()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(prefix.bytes().map(|b| b & 0x1f))
}

fn verify_checksum(prefix: &str, words: &[u8]) -> bool {
    polymod(prefix_expand(prefix).chain(words.iter().copied())) == 1
}

fn create_checksum(prefix: &str, words: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let values = prefix_expand(prefix)
        .chain(words.iter().copied())
        .chain(std::iter::repeat(0).take(CHECKSUM_LENGTH));
    let polymod = polymod(values) ^ 1;

    let mut checksum = [0u8; CHECKSUM_LENGTH];
    for (i, word) in checksum.iter_mut().enumerate() {
        *word = ((polymod >> (5 * (5 - i))) & 0x1f) as u8;
    }
    checksum
}

fn validate_prefix(prefix: &str) -> Result<(), Bech32Error> {
    if prefix.is_empty() || prefix.len() > 83 {
        return Err(Bech32Error::InvalidLength {
            details: format!("prefix length {} outside 1..=83", prefix.len()),
        });
    }
    for ch in prefix.chars() {
        if !(33..=126).contains(&(ch as u32)) || ch.is_ascii_uppercase() {
            return Err(Bech32Error::InvalidCharacter(ch));
        }
    }
    Ok(())
}

/// Lowercase the input, rejecting mixed-case and non-printable characters.
fn normalize_case(encoded: &str) -> Result<String, Bech32Error> {
    let mut has_lower = false;
    let mut has_upper = false;
    for ch in encoded.chars() {
        if !(33..=126).contains(&(ch as u32)) {
            return Err(Bech32Error::InvalidCharacter(ch));
        }
        has_lower |= ch.is_ascii_lowercase();
        has_upper |= ch.is_ascii_uppercase();
    }
    if has_lower && has_upper {
        return Err(Bech32Error::MixedCase);
    }
    Ok(encoded.to_ascii_lowercase())
}
