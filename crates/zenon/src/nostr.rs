//! Nostr public key validation
//!
//! Secondary identity keys are Nostr public keys in `npub` form: bech32
//! with the literal `npub` prefix over a 32-byte payload. Format-only
//! validation; no ownership proof is attached to these keys.

use crate::bech32;

/// Required human-readable prefix
const NOSTR_PREFIX: &str = "npub";

/// Required decoded payload length in bytes
const NOSTR_KEY_LENGTH: usize = 32;

/// Whether a string is a well-formed `npub` public key.
///
/// Any decode failure yields `false`, never an error.
pub fn is_valid_nostr_pubkey(pubkey: &str) -> bool {
    if !pubkey.starts_with(NOSTR_PREFIX) {
        return false;
    }

    match bech32::decode_expecting(NOSTR_PREFIX, pubkey) {
        Ok(payload) => payload.len() == NOSTR_KEY_LENGTH,
        Err(_) => false,
    }
}
