//! Error types for signature validation and transaction assembly

use thiserror::Error;

/// Result type alias for transaction assembly operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for signature and transaction operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    InvalidInputs(String),

    #[error("{0}")]
    InvalidOutputs(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("At least one transaction signature is required.")]
    NoTransactionSignatures,

    #[error("Insufficient input signatures for transaction signature {signature_set}: require {required}, received {received}.")]
    InsufficientInputSignatures {
        signature_set: usize,
        required: usize,
        received: usize,
    },

    #[error("Insufficient signatures for input {input}: require {required}, received {received}.")]
    InsufficientSignatures {
        input: usize,
        required: usize,
        received: usize,
    },

    #[error("Invalid signature for input {input}: {signature}")]
    InvalidSignature { input: usize, signature: String },

    #[error("Duplicate signature for input {input}: {signature}")]
    DuplicateSignature { input: usize, signature: String },

    #[error("Invalid DER signature: {0}")]
    InvalidDer(String),

    #[error("Input {0} has no multisig witness script")]
    MissingWitnessScript(usize),

    #[error("Input {0} has no multisig redeem script")]
    MissingRedeemScript(usize),

    #[error("Input {0} is missing its funding transaction hex")]
    MissingFundingTransaction(usize),

    #[error("Sighash computation failed: {0}")]
    Sighash(String),

    #[error("Core error: {0}")]
    Core(#[from] braid_core::Error),

    #[error("PSBT error: {0}")]
    Psbt(#[from] braid_psbt::Error),

    #[error("Bitcoin PSBT error: {0}")]
    BitcoinPsbt(#[from] bitcoin::psbt::Error),

    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Bitcoin consensus error: {0}")]
    Consensus(#[from] bitcoin::consensus::encode::Error),
}
