//! Sorting and validating multisig transaction inputs.

use crate::multisig::Multisig;
use crate::utils::validate_hex;

const TXID_LENGTH: usize = 64;

/// A transaction input spending a multisig UTXO.
///
/// The [`Multisig`] represents the address the UTXO belongs to. The
/// funding transaction hex is carried when available so PSBT formatters
/// can attach witness or non-witness UTXO data.
#[derive(Debug, Clone)]
pub struct MultisigTransactionInput {
    /// The funding transaction ID, big-endian display hex.
    pub txid: String,
    /// The output index in the funding transaction.
    pub index: u32,
    pub multisig: Multisig,
    pub amount_sats: u64,
    /// The full funding transaction, when known.
    pub transaction_hex: Option<String>,
    /// The BIP32 path suffix the input address was derived at, when known.
    pub bip32_path: Option<String>,
}

impl MultisigTransactionInput {
    pub fn new(txid: &str, index: u32, multisig: Multisig, amount_sats: u64) -> Self {
        MultisigTransactionInput {
            txid: txid.to_string(),
            index,
            multisig,
            amount_sats,
            transaction_hex: None,
            bip32_path: None,
        }
    }
}

/// Sorts the given inputs per BIP69: ascending lexicographic txid, then
/// ascending index.
pub fn sort_inputs(mut inputs: Vec<MultisigTransactionInput>) -> Vec<MultisigTransactionInput> {
    inputs.sort_by(|a, b| a.txid.cmp(&b.txid).then(a.index.cmp(&b.index)));
    inputs
}

/// Validates the given transaction inputs.
///
/// Returns an error message if there are no inputs, an input fails
/// [`validate_multisig_input`], a duplicate UTXO appears, or (when
/// `braid_required` is set) an input's multisig carries no braid
/// provenance.
pub fn validate_multisig_inputs(
    inputs: &[MultisigTransactionInput],
    braid_required: bool,
) -> String {
    if inputs.is_empty() {
        return "At least one input is required.".to_string();
    }
    let mut utxo_ids: Vec<String> = Vec::with_capacity(inputs.len());
    for input in inputs {
        if braid_required && input.multisig.braid_details().is_none() {
            return "At least one input cannot be traced back to its set of extended public keys."
                .to_string();
        }
        let error = validate_multisig_input(input);
        if !error.is_empty() {
            return error;
        }
        let utxo_id = format!("{}:{}", input.txid, input.index);
        if utxo_ids.contains(&utxo_id) {
            return format!("Duplicate input: {}", utxo_id);
        }
        utxo_ids.push(utxo_id);
    }
    String::new()
}

/// Validates a single transaction input: its transaction ID and index.
pub fn validate_multisig_input(input: &MultisigTransactionInput) -> String {
    if input.txid.is_empty() {
        return "Does not have a transaction ID ('txid') property.".to_string();
    }
    let error = validate_transaction_id(&input.txid);
    if !error.is_empty() {
        return error;
    }
    String::new()
}

/// Validates the given transaction ID: 64 characters of hex.
pub fn validate_transaction_id(txid: &str) -> String {
    if txid.is_empty() {
        return "TXID cannot be blank.".to_string();
    }
    let error = validate_hex(txid);
    if !error.is_empty() {
        return format!("TXID is invalid ({})", error);
    }
    if txid.len() != TXID_LENGTH {
        return format!("TXID is invalid (must be {}-characters)", TXID_LENGTH);
    }
    String::new()
}

/// Validates the given transaction index string.
pub fn validate_transaction_index(index: &str) -> String {
    if index.is_empty() {
        return "Index cannot be blank.".to_string();
    }
    if index.starts_with('-') {
        return "Index cannot be negative.".to_string();
    }
    if index.parse::<u32>().is_err() {
        return "Index is invalid".to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multisig::{generate_multisig_from_public_keys, MultisigAddressType};
    use crate::networks::Network;

    const PUBKEY_A: &str = "021a0b6eb37bd9d2767a364601e41635a11c1dbbbb601efab8406281e210336ace";
    const PUBKEY_B: &str = "03b32dc780fba98db25b4b72cf2b69da228f5e10ca6aa8f46eabe7f9fe22c994ee";

    fn test_input(txid: &str, index: u32) -> MultisigTransactionInput {
        let multisig = generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2sh,
            2,
            &[PUBKEY_A, PUBKEY_B],
        )
        .unwrap();
        MultisigTransactionInput::new(txid, index, multisig, 100_000)
    }

    #[test]
    fn test_sort_inputs() {
        let sorted = sort_inputs(vec![
            test_input(&"bb".repeat(32), 0),
            test_input(&"aa".repeat(32), 1),
            test_input(&"aa".repeat(32), 0),
        ]);
        assert_eq!(sorted[0].txid, "aa".repeat(32));
        assert_eq!(sorted[0].index, 0);
        assert_eq!(sorted[1].index, 1);
        assert_eq!(sorted[2].txid, "bb".repeat(32));
    }

    #[test]
    fn test_validate_multisig_inputs() {
        assert_eq!(
            validate_multisig_inputs(&[], false),
            "At least one input is required."
        );
        let inputs = vec![test_input(&"aa".repeat(32), 0), test_input(&"aa".repeat(32), 0)];
        assert!(validate_multisig_inputs(&inputs, false).starts_with("Duplicate input:"));
        let inputs = vec![test_input(&"aa".repeat(32), 0), test_input(&"aa".repeat(32), 1)];
        assert_eq!(validate_multisig_inputs(&inputs, false), "");
        // braid provenance required but absent
        assert!(validate_multisig_inputs(&inputs, true).contains("cannot be traced back"));
    }

    #[test]
    fn test_validate_transaction_id() {
        assert_eq!(validate_transaction_id(""), "TXID cannot be blank.");
        assert_eq!(
            validate_transaction_id("xyz"),
            "TXID is invalid (Invalid hex: odd-length string.)"
        );
        assert_eq!(
            validate_transaction_id("deadbeef"),
            "TXID is invalid (must be 64-characters)"
        );
        assert_eq!(validate_transaction_id(&"ab".repeat(32)), "");
    }

    #[test]
    fn test_validate_transaction_index() {
        assert_eq!(validate_transaction_index(""), "Index cannot be blank.");
        assert_eq!(validate_transaction_index("foo"), "Index is invalid");
        assert_eq!(validate_transaction_index("-1"), "Index cannot be negative.");
        assert_eq!(validate_transaction_index("0"), "");
        assert_eq!(validate_transaction_index("7"), "");
    }
}
