//! PSBT keytype constants
//!
//! Keytype bytes for the global, input, and output maps as defined by
//! BIP174 and extended by BIP370.

// Magic bytes for PSBT
pub const PSBT_MAGIC: &[u8] = b"psbt\xff";
pub const PSBT_MAGIC_HEX: &str = "70736274ff";
pub const PSBT_MAGIC_B64: &str = "cHNidP8";

// PSBT v2 version number
pub const PSBT_V2_VERSION: u32 = 2;

// Global map keytypes
pub const PSBT_GLOBAL_XPUB: u8 = 0x01;
pub const PSBT_GLOBAL_TX_VERSION: u8 = 0x02;
pub const PSBT_GLOBAL_FALLBACK_LOCKTIME: u8 = 0x03;
pub const PSBT_GLOBAL_INPUT_COUNT: u8 = 0x04;
pub const PSBT_GLOBAL_OUTPUT_COUNT: u8 = 0x05;
pub const PSBT_GLOBAL_TX_MODIFIABLE: u8 = 0x06;
pub const PSBT_GLOBAL_VERSION: u8 = 0xfb;
pub const PSBT_GLOBAL_PROPRIETARY: u8 = 0xfc;

// The keytype reserved in v2 for the v0 unsigned transaction; its
// presence in a global map makes the psbt not a valid v2.
pub const PSBT_GLOBAL_UNSIGNED_TX: u8 = 0x00;

// Input map keytypes
pub const PSBT_IN_NON_WITNESS_UTXO: u8 = 0x00;
pub const PSBT_IN_WITNESS_UTXO: u8 = 0x01;
pub const PSBT_IN_PARTIAL_SIG: u8 = 0x02;
pub const PSBT_IN_SIGHASH_TYPE: u8 = 0x03;
pub const PSBT_IN_REDEEM_SCRIPT: u8 = 0x04;
pub const PSBT_IN_WITNESS_SCRIPT: u8 = 0x05;
pub const PSBT_IN_BIP32_DERIVATION: u8 = 0x06;
pub const PSBT_IN_FINAL_SCRIPTSIG: u8 = 0x07;
pub const PSBT_IN_FINAL_SCRIPTWITNESS: u8 = 0x08;
pub const PSBT_IN_POR_COMMITMENT: u8 = 0x09;
pub const PSBT_IN_RIPEMD160: u8 = 0x0a;
pub const PSBT_IN_SHA256: u8 = 0x0b;
pub const PSBT_IN_HASH160: u8 = 0x0c;
pub const PSBT_IN_HASH256: u8 = 0x0d;
pub const PSBT_IN_PREVIOUS_TXID: u8 = 0x0e;
pub const PSBT_IN_OUTPUT_INDEX: u8 = 0x0f;
pub const PSBT_IN_SEQUENCE: u8 = 0x10;
pub const PSBT_IN_REQUIRED_TIME_LOCKTIME: u8 = 0x11;
pub const PSBT_IN_REQUIRED_HEIGHT_LOCKTIME: u8 = 0x12;
pub const PSBT_IN_TAP_KEY_SIG: u8 = 0x13;
pub const PSBT_IN_TAP_SCRIPT_SIG: u8 = 0x14;
pub const PSBT_IN_TAP_LEAF_SCRIPT: u8 = 0x15;
pub const PSBT_IN_TAP_BIP32_DERIVATION: u8 = 0x16;
pub const PSBT_IN_TAP_INTERNAL_KEY: u8 = 0x17;
pub const PSBT_IN_TAP_MERKLE_ROOT: u8 = 0x18;
pub const PSBT_IN_PROPRIETARY: u8 = 0xfc;

// Output map keytypes
pub const PSBT_OUT_REDEEM_SCRIPT: u8 = 0x00;
pub const PSBT_OUT_WITNESS_SCRIPT: u8 = 0x01;
pub const PSBT_OUT_BIP32_DERIVATION: u8 = 0x02;
pub const PSBT_OUT_AMOUNT: u8 = 0x03;
pub const PSBT_OUT_SCRIPT: u8 = 0x04;
pub const PSBT_OUT_TAP_INTERNAL_KEY: u8 = 0x05;
pub const PSBT_OUT_TAP_TREE: u8 = 0x06;
pub const PSBT_OUT_TAP_BIP32_DERIVATION: u8 = 0x07;
pub const PSBT_OUT_PROPRIETARY: u8 = 0xfc;

// Sighash type flags
pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

// Inputs specifying a required locktime at or above this value are using
// time locktimes; below it, height locktimes.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;
