//! Size estimation for the P2SH address type.

use crate::utils::compact_size_length;

/// Size in bytes of an output paying a P2SH address:
/// value (8) + script length (1) + script (23).
pub fn p2sh_output_size() -> usize {
    32
}

/// Size in bytes of a fully-signed P2SH multisig input, including the
/// scriptSig.
///
/// Script structure: `OP_0 <m signatures> <redeem script>`, with a 72-byte
/// conservative estimate per ECDSA signature and 33 bytes per pubkey in
/// the redeem script.
pub fn p2sh_input_size(m: usize, n: usize) -> usize {
    const PREVHASH_BYTES: usize = 32;
    const PREV_INDEX_BYTES: usize = 4;
    const SEQUENCE_BYTES: usize = 4;
    const SIGNATURE_SIZE: usize = 72;
    const PUBKEY_SIZE: usize = 33;

    // OP_M + n * (push + pubkey) + OP_N + OP_CHECKMULTISIG
    let redeem_script_size = 1 + n * (1 + PUBKEY_SIZE) + 1 + 1;
    let redeem_script_push_size = if redeem_script_size <= 75 {
        1
    } else if redeem_script_size <= 255 {
        2
    } else {
        3
    };
    let script_size = 1 + m * (1 + SIGNATURE_SIZE) + redeem_script_push_size + redeem_script_size;
    let script_length_bytes = compact_size_length(script_size as u64);

    PREVHASH_BYTES + PREV_INDEX_BYTES + script_length_bytes + script_size + SEQUENCE_BYTES
}

/// Size-estimation parameters for a multisig spend: every input comes
/// from the same M-of-N multisig address.
#[derive(Debug, Clone, Copy)]
pub struct MultisigTransactionShape {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub m: usize,
    pub n: usize,
}

/// Estimate the transaction virtual size (vsize) when spending inputs
/// from the same multisig P2SH address.
pub fn estimate_multisig_p2sh_transaction_vsize(shape: MultisigTransactionShape) -> usize {
    let total_input_size = p2sh_input_size(shape.m, shape.n) * shape.num_inputs;
    let total_output_size = p2sh_output_size() * shape.num_outputs;
    // version (4) + locktime (4) + input count + output count
    let transaction_overhead = 4
        + 4
        + compact_size_length(shape.num_inputs as u64)
        + compact_size_length(shape.num_outputs as u64);
    total_input_size + total_output_size + transaction_overhead
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2sh_input_size() {
        // 2-of-3: scriptSig is 254 bytes, per the Optech calculator.
        assert_eq!(p2sh_input_size(2, 3), 32 + 4 + 3 + 254 + 4);
    }

    #[test]
    fn test_estimate_vsize() {
        assert_eq!(
            estimate_multisig_p2sh_transaction_vsize(MultisigTransactionShape {
                num_inputs: 2,
                num_outputs: 2,
                m: 2,
                n: 3,
            }),
            668
        );
    }
}
