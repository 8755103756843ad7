//! Structural validation of registration input
//!
//! Format-only checks, run before any proof or store access. Every
//! failure names the offending field so the caller can surface an
//! actionable message.

use once_cell::sync::Lazy;
use regex::Regex;

use zenon::{is_valid_nostr_pubkey, Address};

use super::{RegistrationData, RegistrationError};

/// Maximum length of a secondary network name
pub const SECONDARY_NAME_MAX_LENGTH: usize = 40;

/// Expected public key length in hex characters (32 bytes)
pub const PUBLIC_KEY_HEX_LENGTH: usize = 64;

/// Expected signature length in hex characters (64 bytes)
pub const SIGNATURE_HEX_LENGTH: usize = 128;

/// Alphanumeric runs separated by single hyphen/dot/underscore, no
/// leading or trailing separator
static SECONDARY_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z0-9]+[-._]?)*[a-zA-Z0-9]$").expect("valid name pattern"));

static HEX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("valid hex pattern"));

/// Validate the whole bundle, failing on the first malformed field.
pub fn validate(data: &RegistrationData) -> Result<(), RegistrationError> {
    validate_public_key(&data.public_key)?;
    validate_secondary_name(&data.secondary_name)?;
    validate_address_field("secondaryOwnerAddress", &data.secondary_owner_address)?;
    validate_address_field("secondaryWithdrawAddress", &data.secondary_withdraw_address)?;
    validate_address_field("secondaryProducerAddress", &data.secondary_producer_address)?;
    if let Some(key) = &data.secondary_identity_key {
        validate_identity_key(key)?;
    }
    validate_signature(&data.signature)?;
    Ok(())
}

fn validate_public_key(public_key: &str) -> Result<(), RegistrationError> {
    if public_key.len() != PUBLIC_KEY_HEX_LENGTH || !HEX_PATTERN.is_match(public_key) {
        return Err(RegistrationError::validation(
            "publicKey",
            format!("must be exactly {PUBLIC_KEY_HEX_LENGTH} hexadecimal characters (32 bytes)"),
        ));
    }
    Ok(())
}

fn validate_secondary_name(name: &str) -> Result<(), RegistrationError> {
    if name.is_empty() {
        return Err(RegistrationError::validation(
            "secondaryName",
            "name is required",
        ));
    }
    if name.len() > SECONDARY_NAME_MAX_LENGTH {
        return Err(RegistrationError::validation(
            "secondaryName",
            format!("cannot exceed {SECONDARY_NAME_MAX_LENGTH} characters"),
        ));
    }
    if !SECONDARY_NAME_PATTERN.is_match(name) {
        return Err(RegistrationError::validation(
            "secondaryName",
            "can only contain letters, numbers, and single instances of hyphen, dot, \
             or underscore between characters",
        ));
    }
    Ok(())
}

fn validate_address_field(field: &'static str, address: &str) -> Result<(), RegistrationError> {
    if address.is_empty() {
        return Err(RegistrationError::validation(field, "address is required"));
    }
    if !Address::is_valid(address) {
        return Err(RegistrationError::validation(
            field,
            "must be a valid address",
        ));
    }
    Ok(())
}

fn validate_identity_key(key: &str) -> Result<(), RegistrationError> {
    if !is_valid_nostr_pubkey(key) {
        return Err(RegistrationError::validation(
            "secondaryIdentityKey",
            "must be a valid Nostr public key (npub format)",
        ));
    }
    Ok(())
}

fn validate_signature(signature: &str) -> Result<(), RegistrationError> {
    if signature.is_empty() {
        return Err(RegistrationError::validation(
            "signature",
            "signature is required",
        ));
    }
    if !HEX_PATTERN.is_match(signature) {
        return Err(RegistrationError::validation(
            "signature",
            "must contain only hexadecimal characters (0-9 and a-f)",
        ));
    }
    if signature.len() != SIGNATURE_HEX_LENGTH {
        return Err(RegistrationError::validation(
            "signature",
            format!("must be exactly {SIGNATURE_HEX_LENGTH} hexadecimal characters (64 bytes)"),
        ));
    }
    Ok(())
}
