//! Error types for PSBT operations

use thiserror::Error;

/// Result type alias for PSBT operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for PSBT v2 and legacy-PSBT operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("PsbtV2 magic bytes are incorrect.")]
    InvalidMagic,

    #[error("PsbtV2 has a version field set less than 2")]
    VersionTooLow,

    #[error("PsbtV2 has a tx version field set less than 2")]
    TxVersionTooLow,

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field data: {0}")]
    InvalidFieldData(String),

    #[error("PsbtV2 input time locktime is less than 500000000.")]
    TimeLocktimeTooLow,

    #[error("PsbtV2 input height locktime is gte 500000000.")]
    HeightLocktimeTooHigh,

    #[error("PsbtV2.PSBT_GLOBAL_TX_MODIFIABLE {0} cannot be modified.")]
    NotModifiable(String),

    #[error("PsbtV2 has no input at {0}")]
    InvalidInputIndex(usize),

    #[error("PsbtV2 has no output at {0}")]
    InvalidOutputIndex(usize),

    #[error("PsbtV2 already has a signature for this input with this pubkey")]
    DuplicatePartialSig,

    #[error("PsbtV2 input has no signature from pubkey {0}")]
    NoSignatureForPubkey(String),

    #[error("Input cannot be bufferized.")]
    NotBufferizable,

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Core error: {0}")]
    Core(#[from] braid_core::Error),

    #[error("Bitcoin PSBT error: {0}")]
    BitcoinPsbt(#[from] bitcoin::psbt::Error),

    #[error("Bitcoin consensus error: {0}")]
    Consensus(#[from] bitcoin::consensus::encode::Error),

    #[error("Hex decoding error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
