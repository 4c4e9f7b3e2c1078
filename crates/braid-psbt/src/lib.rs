//! PSBT v2 engine for multisig coordination
//!
//! This crate provides:
//! - A typed-map PSBT v2 serializer/deserializer per BIP174/BIP370
//! - The Creator/Constructor/Updater/Signer role operations with the
//!   tx-modifiable state machine
//! - BIP370 locktime resolution
//! - Import from legacy (v0) psbts

pub mod constants;
pub mod error;
pub mod functions;
pub mod map;
pub mod psbtv2;

pub use constants::*;
pub use error::{Error, Result};
pub use functions::{bufferize, parse_derivation_path_nodes_to_bytes};
pub use map::{KeyValue, MapKey, PsbtMap};
pub use psbtv2::{
    psbt_version_number, Bip32DerivationEntry, PsbtV2, PsbtV2InputArgs, PsbtV2OutputArgs,
    TxModifiable,
};
