//! Error types for braid and multisig operations

use thiserror::Error;

/// Result type alias for braid-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for key, braid, and multisig operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid extended public key: {0}")]
    InvalidExtendedPublicKey(String),

    #[error("Invalid extended public key prefix {0}")]
    InvalidPrefix(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid root fingerprint: {0}")]
    InvalidRootFingerprint(String),

    #[error("Invalid BIP32 path: {0}")]
    InvalidPath(String),

    #[error("Cannot derive paths outside of the braid's index: {0}")]
    PathOutsideBraid(String),

    #[error("Invalid braid: {0}")]
    InvalidBraid(String),

    #[error("Invalid multisig script: {0}")]
    InvalidMultisigScript(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("BIP32 error: {0}")]
    Bip32(#[from] bitcoin::bip32::Error),

    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Base58 decoding error: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
