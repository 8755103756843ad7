//! Zenon address derivation and validation
//!
//! An address is the bech32 encoding, under the fixed `"z"` prefix, of a
//! 20-byte core: one tag byte (0 for user addresses) followed by the
//! first 19 bytes of the SHA3-256 digest of the owner's public key.
//! Derivation is deterministic; distinct public keys collide only with
//! hash-collision probability.

use sha3::{Digest, Sha3_256};
use thiserror::Error;

use crate::bech32::{self, Bech32Error};

/// Human-readable prefix of every pillar address
pub const ADDRESS_PREFIX: &str = "z";

/// Tag byte identifying the user address class
const USER_TAG: u8 = 0;

/// Length of the encoded core: tag byte + truncated digest
const CORE_LENGTH: usize = 20;

/// Length of the truncated SHA3-256 digest inside the core
const DIGEST_LENGTH: usize = 19;

/// Expected public key length in bytes
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Address parsing failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The underlying bech32 decode failed
    #[error(transparent)]
    Codec(#[from] Bech32Error),

    /// The decoded core is not the fixed 20 bytes
    #[error("invalid core length {found}; expected {CORE_LENGTH}")]
    InvalidCoreLength { found: usize },
}

/// A parsed, structurally valid pillar address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    text: String,
    core: [u8; CORE_LENGTH],
}

impl Address {
    /// Derive the address owned by a public key.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Self {
        let digest = Sha3_256::digest(public_key);

        let mut core = [0u8; CORE_LENGTH];
        core[0] = USER_TAG;
        core[1..].copy_from_slice(&digest[..DIGEST_LENGTH]);

        // Encoding a 20-byte core under a valid prefix cannot fail
        let text = bech32::encode(ADDRESS_PREFIX, &core).expect("core encoding is infallible");
        Self { text, core }
    }

    /// Parse an address string, verifying prefix, checksum, and core length.
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let payload = bech32::decode_expecting(ADDRESS_PREFIX, text)?;
        let core: [u8; CORE_LENGTH] =
            payload
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidCoreLength {
                    found: payload.len(),
                })?;

        Ok(Self {
            text: text.to_ascii_lowercase(),
            core,
        })
    }

    /// Whether a string is a structurally valid address.
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    /// The canonical (lowercase) textual form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The 20-byte core payload.
    pub fn core(&self) -> &[u8; CORE_LENGTH] {
        &self.core
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Check that a claimed public key derives to a stored address.
///
/// Decode or derivation failures are a non-match, never an error. The
/// core comparison is constant-time so the check leaks nothing about how
/// far a near-miss got.
pub fn verify_public_key(address: &str, public_key: &[u8]) -> bool {
    let Ok(stored) = Address::parse(address) else {
        return false;
    };
    let Ok(key) = <&[u8; PUBLIC_KEY_LENGTH]>::try_from(public_key) else {
        return false;
    };
    let derived = Address::from_public_key(key);

    secure_compare(stored.core(), derived.core())
}

/// Constant-time byte-slice comparison.
///
/// Always walks the full length even after a difference is found. Used
/// for every security-sensitive equality in the portal (address cores,
/// trigger secrets).
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        result |= byte_a ^ byte_b;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(fill: u8) -> [u8; PUBLIC_KEY_LENGTH] {
        [fill; PUBLIC_KEY_LENGTH]
    }

    #[test]
    fn test_derived_address_shape() {
        let address = Address::from_public_key(&test_key(0x01));
        assert!(address.as_str().starts_with("z1"));
        assert_eq!(address.core()[0], USER_TAG);
        assert_eq!(address.core().len(), CORE_LENGTH);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = Address::from_public_key(&test_key(0x42));
        let b = Address::from_public_key(&test_key(0x42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_keys_yield_distinct_addresses() {
        let a = Address::from_public_key(&test_key(0x00));
        let b = Address::from_public_key(&test_key(0x01));
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn test_parse_round_trip() {
        let derived = Address::from_public_key(&test_key(0x07));
        let parsed = Address::parse(derived.as_str()).unwrap();
        assert_eq!(parsed, derived);
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        let payload = [0u8; CORE_LENGTH];
        let foreign = bech32::encode("npub", &payload).unwrap();
        assert!(matches!(
            Address::parse(&foreign),
            Err(AddressError::Codec(Bech32Error::InvalidPrefix { .. }))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_core_length() {
        let short = bech32::encode(ADDRESS_PREFIX, &[0u8; 19]).unwrap();
        assert_eq!(
            Address::parse(&short),
            Err(AddressError::InvalidCoreLength { found: 19 })
        );
    }

    #[test]
    fn test_is_valid() {
        let derived = Address::from_public_key(&test_key(0x33));
        assert!(Address::is_valid(derived.as_str()));
        assert!(!Address::is_valid("z1notanaddress"));
        assert!(!Address::is_valid(""));
    }

    #[test]
    fn test_verify_public_key_matches() {
        let key = test_key(0x11);
        let address = Address::from_public_key(&key);
        assert!(verify_public_key(address.as_str(), &key));
    }

    #[test]
    fn test_verify_public_key_mismatch() {
        let address = Address::from_public_key(&test_key(0x11));
        assert!(!verify_public_key(address.as_str(), &test_key(0x22)));
    }

    #[test]
    fn test_verify_public_key_downgrades_failures() {
        let key = test_key(0x11);
        // Malformed address
        assert!(!verify_public_key("not-an-address", &key));
        // Malformed key length
        let address = Address::from_public_key(&key);
        assert!(!verify_public_key(address.as_str(), &[0u8; 16]));
    }

    #[test]
    fn test_secure_compare() {
        assert!(secure_compare(b"same-bytes", b"same-bytes"));
        assert!(!secure_compare(b"same-bytes", b"diff-bytes"));
        assert!(!secure_compare(b"short", b"longer-value"));
    }
}
