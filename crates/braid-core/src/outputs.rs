//! Validating transaction outputs and amounts.

use crate::address::validate_address;
use crate::multisig::Multisig;
use crate::networks::Network;

/// Lowest acceptable output amount in satoshis.
pub const DUST_LIMIT_SATS: u64 = 546;

/// An output in a multisig transaction.
///
/// A change output carries the [`Multisig`] it pays to, so derivation
/// metadata and locking scripts can be embedded for hardware-wallet
/// change verification.
#[derive(Debug, Clone)]
pub struct TransactionOutput {
    pub address: String,
    pub amount_sats: u64,
    pub multisig: Option<Multisig>,
}

impl TransactionOutput {
    pub fn new(address: &str, amount_sats: u64) -> Self {
        TransactionOutput {
            address: address.to_string(),
            amount_sats,
            multisig: None,
        }
    }

    /// A change output paying back into the given multisig address.
    pub fn change(multisig: Multisig, amount_sats: u64) -> Self {
        TransactionOutput {
            address: multisig.address().to_string(),
            amount_sats,
            multisig: Some(multisig),
        }
    }
}

/// Validates the given transaction outputs.
///
/// Returns an error message if there are no outputs or any output fails
/// [`validate_output`].
pub fn validate_outputs(
    network: Network,
    outputs: &[TransactionOutput],
    inputs_total_sats: Option<u64>,
) -> String {
    if outputs.is_empty() {
        return "At least one output is required.".to_string();
    }
    for output in outputs {
        let error = validate_output(network, output, inputs_total_sats);
        if !error.is_empty() {
            return error;
        }
    }
    String::new()
}

/// Validate the given transaction output: its amount and address.
pub fn validate_output(
    network: Network,
    output: &TransactionOutput,
    inputs_total_sats: Option<u64>,
) -> String {
    let error = validate_output_amount(output.amount_sats, inputs_total_sats, None);
    if !error.is_empty() {
        return error;
    }
    if output.address.is_empty() {
        return "Does not have an 'address' property.".to_string();
    }
    let error = validate_address(&output.address, network);
    if !error.is_empty() {
        return format!("Has an invalid 'address' property: {}.", error);
    }
    String::new()
}

/// Validate the given output amount (in satoshis).
///
/// Cannot be zero, cannot be smaller than the dust limit, and cannot
/// exceed the total input amount when one is given.
pub fn validate_output_amount(
    amount_sats: u64,
    max_sats: Option<u64>,
    min_sats: Option<u64>,
) -> String {
    let min_sats = min_sats.unwrap_or(DUST_LIMIT_SATS);
    if amount_sats == 0 {
        return "Output amount must be positive.".to_string();
    }
    if amount_sats <= min_sats {
        return "Output amount is too small.".to_string();
    }
    if let Some(max_sats) = max_sats {
        if max_sats == 0 {
            return "Total input amount must be positive.".to_string();
        }
        if amount_sats > max_sats {
            return "Output amount is too large.".to_string();
        }
    }
    String::new()
}
