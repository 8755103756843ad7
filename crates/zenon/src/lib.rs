//! # Zenon
//!
//! Centralized Zenon network interactions for the pillar portal:
//! - Bech32 address codec and SHA3-based address derivation
//! - Ownership verification (public key against stored address)
//! - Nostr secondary-key format validation
//! - The `SignatureAuthority` boundary with remote and local implementations
//! - HTTP clients for the pillar snapshot source and the frontier ledger lookup
//!
//! Everything chain-shaped lives here so the portal service stays agnostic
//! to how the primary network is reached.

pub mod address;
pub mod bech32;
pub mod nostr;
pub mod pillars;
pub mod signature;

pub use address::{
    secure_compare, verify_public_key, Address, AddressError, ADDRESS_PREFIX, PUBLIC_KEY_LENGTH,
};
pub use bech32::Bech32Error;
pub use nostr::is_valid_nostr_pubkey;
pub use pillars::{FrontierLookup, PillarSnapshot, PillarSource, ZenonHubClient};
pub use signature::{
    canonical_message, LocalSignatureAuthority, RemoteSignatureAuthority, SignatureAuthority,
    SignatureCheck,
};
