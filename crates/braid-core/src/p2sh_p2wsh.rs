//! Size estimation for the P2SH-wrapped P2WSH address type, sometimes
//! written P2SH-P2WSH.

use crate::p2sh::{p2sh_output_size, MultisigTransactionShape};
use crate::p2wsh::witness_size;

/// Base input size: prevhash (32) + prevIndex (4) + script length (1) +
/// P2SH redeem script push (34, the hash of the witness script) +
/// sequence (4). Signatures live in witness data, not in the base input.
pub fn p2sh_p2wsh_input_size() -> usize {
    32 + 4 + 1 + 34 + 4
}

pub fn p2sh_p2wsh_output_size() -> usize {
    p2sh_output_size()
}

/// Estimate the transaction virtual size (vsize) when spending inputs
/// from the same multisig P2SH-P2WSH address.
///
/// The witness structure is the same as P2WSH; the base input instead
/// carries the P2SH redeem-script push.
pub fn estimate_multisig_p2sh_p2wsh_transaction_vsize(shape: MultisigTransactionShape) -> usize {
    let base_size = p2sh_p2wsh_input_size() * shape.num_inputs
        + p2sh_p2wsh_output_size() * shape.num_outputs
        + 4 + 4 + 1 + 1;
    let witness = witness_size(shape.m, shape.n) * shape.num_inputs;
    (base_size * 3 + witness).div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_vsize() {
        assert_eq!(
            estimate_multisig_p2sh_p2wsh_transaction_vsize(MultisigTransactionShape {
                num_inputs: 2,
                num_outputs: 2,
                m: 2,
                n: 3,
            }),
            295
        );
    }
}
