//! Core primitives for a bitcoin multisig coordination toolkit.
//!
//! This crate provides:
//! - Extended public key encoding, validation, and child derivation
//! - BIP32 derivation path parsing and validation
//! - Braids: M-of-N groups of extended keys bound to one branch index
//! - BIP67-canonical multisig script and address generation
//! - Transaction input/output validation
//! - Fee and virtual-size estimation per address type
//!
//! Everything here is a synchronous, pure, in-memory transform: no
//! network I/O, no persistence.

pub mod address;
pub mod braid;
pub mod error;
pub mod fees;
pub mod inputs;
pub mod keys;
pub mod multisig;
pub mod networks;
pub mod outputs;
pub mod p2sh;
pub mod p2sh_p2wsh;
pub mod p2wsh;
pub mod paths;
pub mod utils;

pub use address::{address_type, validate_address, AddressType};
pub use braid::{
    braid_config, derive_multisig_by_index, derive_multisig_by_path,
    generate_bip32_derivation_by_index, generate_bip32_derivation_by_path,
    generate_public_keys_at_index, generate_public_keys_at_path, is_valid_child_pubkey,
    validate_bip32_path_for_braid, Bip32Derivation, Braid, UNKNOWN_ROOT_FINGERPRINT,
};
pub use error::{Error, Result};
pub use inputs::{
    sort_inputs, validate_multisig_input, validate_multisig_inputs, validate_transaction_id,
    validate_transaction_index, MultisigTransactionInput,
};
pub use keys::{
    compress_public_key, convert_extended_public_key, derive_child_extended_public_key,
    derive_child_public_key, derive_extended_public_key, extended_public_key_root_fingerprint,
    fingerprint_from_public_key, fingerprint_to_fixed_length_hex, is_key_compressed,
    masked_derivation, validate_extended_public_key, validate_extended_public_key_for_network,
    validate_prefix, validate_public_key, validate_root_fingerprint, ExtendedPublicKey,
};
pub use multisig::{
    generate_multisig_from_hex, generate_multisig_from_public_keys, Multisig, MultisigAddressType,
};
pub use networks::{network_data, network_from_prefix, network_label, Network};
pub use outputs::{
    validate_output, validate_output_amount, validate_outputs, TransactionOutput, DUST_LIMIT_SATS,
};
pub use p2sh::MultisigTransactionShape;
pub use paths::{
    bip32_path_to_sequence, bip32_sequence_to_path, combine_bip32_paths, get_parent_bip32_path,
    get_relative_bip32_path, hardened_bip32_index, multisig_bip32_path, multisig_bip32_root,
    validate_bip32_index, validate_bip32_path, PathMode, HARDENING_OFFSET,
};
pub use utils::{
    bitcoins_to_satoshis, compact_size_length, hash160_digest, satoshis_to_bitcoins, valid_base64,
    validate_hex,
};
