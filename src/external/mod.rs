//! Adapters over the cryptography this crate consumes but doesn’t implement.

pub mod hash;
pub mod pubkey;
