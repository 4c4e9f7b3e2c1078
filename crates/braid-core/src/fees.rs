//! Calculating and validating transaction fees.

use crate::multisig::MultisigAddressType;
use crate::p2sh::{estimate_multisig_p2sh_transaction_vsize, MultisigTransactionShape};
use crate::p2sh_p2wsh::estimate_multisig_p2sh_p2wsh_transaction_vsize;
use crate::p2wsh::estimate_multisig_p2wsh_transaction_vsize;

/// Maximum acceptable transaction fee rate in satoshis/vbyte.
pub const MAX_FEE_RATE_SATS_PER_VBYTE: f64 = 1000.0;

/// Maximum acceptable transaction fee in satoshis (~0.025 BTC).
pub const MAX_FEE_SATS: u64 = 2_500_000;

/// Validate the given transaction fee rate (in satoshis/vbyte).
///
/// Must parse as a number, cannot be negative (zero is OK), and cannot
/// exceed [`MAX_FEE_RATE_SATS_PER_VBYTE`].
pub fn validate_fee_rate(fee_rate_sats_per_vbyte: &str) -> String {
    let rate: f64 = match fee_rate_sats_per_vbyte.trim().parse() {
        Ok(rate) => rate,
        Err(_) => return "Invalid fee rate.".to_string(),
    };
    if !rate.is_finite() {
        return "Invalid fee rate.".to_string();
    }
    if rate < 0.0 {
        return "Fee rate cannot be negative.".to_string();
    }
    if rate > MAX_FEE_RATE_SATS_PER_VBYTE {
        return "Fee rate is too high.".to_string();
    }
    String::new()
}

/// Validate the given transaction fee (in satoshis) against the total
/// input amount.
///
/// Must parse as a number, cannot be negative (zero is OK), cannot exceed
/// the total input amount, and cannot exceed [`MAX_FEE_SATS`].
pub fn validate_fee(fee_sats: &str, inputs_total_sats: &str) -> String {
    let fee: f64 = match fee_sats.trim().parse() {
        Ok(fee) => fee,
        Err(_) => return "Invalid fee.".to_string(),
    };
    if !fee.is_finite() {
        return "Invalid fee.".to_string();
    }
    let total: f64 = match inputs_total_sats.trim().parse() {
        Ok(total) => total,
        Err(_) => return "Invalid total input amount.".to_string(),
    };
    if !total.is_finite() {
        return "Invalid total input amount.".to_string();
    }
    if fee < 0.0 {
        return "Fee cannot be negative.".to_string();
    }
    if total <= 0.0 {
        return "Total input amount must be positive.".to_string();
    }
    if fee > total {
        return "Fee is too high.".to_string();
    }
    if fee > MAX_FEE_SATS as f64 {
        return "Fee is too high.".to_string();
    }
    String::new()
}

/// Estimate transaction vsize for the given address type and transaction
/// shape.
pub fn estimate_multisig_transaction_vsize(
    address_type: MultisigAddressType,
    shape: MultisigTransactionShape,
) -> usize {
    match address_type {
        MultisigAddressType::P2sh => estimate_multisig_p2sh_transaction_vsize(shape),
        MultisigAddressType::P2shP2wsh => estimate_multisig_p2sh_p2wsh_transaction_vsize(shape),
        MultisigAddressType::P2wsh => estimate_multisig_p2wsh_transaction_vsize(shape),
    }
}

/// Estimate the fee rate (satoshis/vbyte) implied by an actual fee for
/// the given address type and transaction shape.
pub fn estimate_multisig_transaction_fee_rate(
    address_type: MultisigAddressType,
    shape: MultisigTransactionShape,
    fees_in_satoshis: u64,
) -> f64 {
    fees_in_satoshis as f64 / estimate_multisig_transaction_vsize(address_type, shape) as f64
}

/// Estimate the fee (satoshis) from a fee rate for the given address type
/// and transaction shape.
///
/// A fractional-satoshi product is rounded up: estimate the worst case
/// rather than underpay.
pub fn estimate_multisig_transaction_fee(
    address_type: MultisigAddressType,
    shape: MultisigTransactionShape,
    fees_per_byte_in_satoshis: f64,
) -> u64 {
    let fee = fees_per_byte_in_satoshis
        * estimate_multisig_transaction_vsize(address_type, shape) as f64;
    fee.ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: MultisigTransactionShape = MultisigTransactionShape {
        num_inputs: 2,
        num_outputs: 2,
        m: 2,
        n: 3,
    };

    #[test]
    fn test_validate_fee_rate() {
        assert_eq!(validate_fee_rate("foo"), "Invalid fee rate.");
        assert_eq!(validate_fee_rate("NaN"), "Invalid fee rate.");
        assert_eq!(validate_fee_rate("-1"), "Fee rate cannot be negative.");
        assert_eq!(validate_fee_rate("1001"), "Fee rate is too high.");
        assert_eq!(validate_fee_rate("0"), "");
        assert_eq!(validate_fee_rate("10.5"), "");
    }

    #[test]
    fn test_validate_fee() {
        assert_eq!(validate_fee("foo", "100000"), "Invalid fee.");
        assert_eq!(validate_fee("1000", "bar"), "Invalid total input amount.");
        assert_eq!(validate_fee("-1", "100000"), "Fee cannot be negative.");
        assert_eq!(validate_fee("0", "0"), "Total input amount must be positive.");
        assert_eq!(validate_fee("100001", "100000"), "Fee is too high.");
        assert_eq!(validate_fee("2500001", "10000000"), "Fee is too high.");
        assert_eq!(validate_fee("1000", "100000"), "");
        assert_eq!(validate_fee("0", "100000"), "");
    }

    #[test]
    fn test_estimate_vsize_dispatch() {
        assert_eq!(
            estimate_multisig_transaction_vsize(MultisigAddressType::P2wsh, SHAPE),
            306
        );
        assert_eq!(
            estimate_multisig_transaction_vsize(MultisigAddressType::P2sh, SHAPE),
            668
        );
        assert_eq!(
            estimate_multisig_transaction_vsize(MultisigAddressType::P2shP2wsh, SHAPE),
            295
        );
    }

    #[test]
    fn test_estimate_fee_rate() {
        let rate =
            estimate_multisig_transaction_fee_rate(MultisigAddressType::P2wsh, SHAPE, 3060);
        assert!((rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_fee_rounds_up() {
        // 306 vbytes * 1.5 sats/vbyte = 459 exactly; 306 * 1.501 rounds up.
        assert_eq!(
            estimate_multisig_transaction_fee(MultisigAddressType::P2wsh, SHAPE, 1.5),
            459
        );
        assert_eq!(
            estimate_multisig_transaction_fee(MultisigAddressType::P2wsh, SHAPE, 1.501),
            460
        );
    }
}
