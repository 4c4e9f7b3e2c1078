//! Size estimation for the P2WSH address type.

use crate::p2sh::MultisigTransactionShape;
use crate::utils::compact_size_length;

/// Size of a single base (non-witness) P2WSH input:
/// prevhash (32) + prevIndex (4) + empty scriptSig length (1) + sequence (4).
pub fn p2wsh_input_size() -> usize {
    32 + 4 + 1 + 4
}

/// Approximate size of an output: value (8) + script length + the script
/// itself. Defaults to the largest standard locking script, P2WSH (34
/// bytes).
pub fn p2wsh_output_size(script_pubkey_size: usize) -> usize {
    8 + compact_size_length(script_pubkey_size as u64) + script_pubkey_size
}

/// Size of the bare M-of-N script:
/// OP_M + n pushes + n pubkeys (33 each) + OP_N + OP_CHECKMULTISIG.
pub fn redeem_script_size(n: usize) -> usize {
    1 + n + 33 * n + 1 + 1
}

/// Size of a fully-signed multisig witness:
/// item count + empty element + m signatures (size-prefixed, 72-byte
/// estimate each) + size-prefixed witness script.
pub fn witness_size(m: usize, n: usize) -> usize {
    let witness_items_count = compact_size_length((1 + m + 1) as u64);
    let signatures_size = m * (1 + 72);
    let script_size = redeem_script_size(n);
    witness_items_count + 1 + signatures_size + compact_size_length(script_size as u64) + script_size
}

/// The fields of a transaction that do NOT get the witness discount.
pub fn p2wsh_base_size(inputs_count: usize, outputs_count: usize) -> usize {
    let mut total = 0;
    total += 4; // version
    total += 4; // locktime
    total += compact_size_length(inputs_count as u64);
    total += inputs_count * p2wsh_input_size();
    total += compact_size_length(outputs_count as u64);
    total += outputs_count * p2wsh_output_size(34);
    total
}

/// Total size of the witness region: marker + flag + one witness per
/// input.
pub fn p2wsh_total_witness_size(shape: MultisigTransactionShape) -> usize {
    let mut total = 0;
    total += 1; // segwit marker
    total += 1; // segwit flag
    total += compact_size_length(shape.num_inputs as u64);
    total += shape.num_inputs * witness_size(shape.m, shape.n);
    total
}

/// Virtual size: three times the base size plus the total size, divided
/// by the scale factor of 4 and rounded up.
fn vsize(base_size: usize, witness_size: usize) -> usize {
    const WITNESS_SCALE_FACTOR: usize = 4;
    let total_size = base_size + witness_size;
    let weight = base_size * 3 + total_size;
    weight.div_ceil(WITNESS_SCALE_FACTOR)
}

/// Estimate the transaction virtual size (vsize) when spending inputs
/// from the same multisig P2WSH address.
pub fn estimate_multisig_p2wsh_transaction_vsize(shape: MultisigTransactionShape) -> usize {
    let base_size = p2wsh_base_size(shape.num_inputs, shape.num_outputs);
    // these are the bytes that benefit from the segwit discount
    let witness_size = p2wsh_total_witness_size(shape);
    vsize(base_size, witness_size)
}
