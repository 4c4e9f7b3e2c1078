//! Multisig transaction assembly
//!
//! This crate provides:
//! - Signature normalization and validation against a multisig's key set
//! - Unsigned and fully-signed multisig transaction construction
//! - A legacy (v0) psbt bridge: unsigned psbt construction for signers
//!   and signature extraction from signed psbts

pub mod error;
pub mod psbt;
pub mod signatures;
pub mod transactions;

pub use error::{Error, Result};
pub use psbt::{
    auto_load_psbt, parse_signature_array_from_psbt, parse_signatures_from_psbt,
    unsigned_multisig_psbt,
};
pub use signatures::{
    multisig_signature_buffer, multisig_signature_hash, signature_no_sighash_type,
    validate_multisig_signature,
};
pub use transactions::{signed_multisig_transaction, unsigned_multisig_transaction, SignatureSet};
