//! Constructing unsigned and fully-signed multisig transactions.

use std::collections::HashMap;
use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::blockdata::opcodes::all::OP_PUSHBYTES_0;
use bitcoin::blockdata::script::Builder;
use bitcoin::script::PushBytesBuf;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use braid_core::multisig::MultisigAddressType;
use braid_core::{
    network_data, validate_multisig_inputs, validate_outputs, MultisigTransactionInput, Network,
    TransactionOutput,
};

use crate::error::{Error, Result};
use crate::signatures::{signature_no_sighash_type, validate_multisig_signature};

/// One signer's signatures, one per transaction input, in input order.
/// An empty entry means the signer did not cover that input.
pub type SignatureSet = Vec<Vec<u8>>;

/// Create an unsigned bitcoin transaction from the given inputs and
/// outputs. Inputs and outputs are validated before use.
pub fn unsigned_multisig_transaction(
    network: Network,
    inputs: &[MultisigTransactionInput],
    outputs: &[TransactionOutput],
) -> Result<Transaction> {
    let input_error = validate_multisig_inputs(inputs, false);
    if !input_error.is_empty() {
        return Err(Error::InvalidInputs(input_error));
    }
    let output_error = validate_outputs(network, outputs, None);
    if !output_error.is_empty() {
        return Err(Error::InvalidOutputs(output_error));
    }

    let tx_inputs = inputs
        .iter()
        .map(|input| {
            let txid =
                Txid::from_str(&input.txid).map_err(|e| Error::InvalidInputs(e.to_string()))?;
            Ok(TxIn {
                previous_output: OutPoint {
                    txid,
                    vout: input.index,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
        })
        .collect::<Result<Vec<TxIn>>>()?;

    let tx_outputs = outputs
        .iter()
        .map(|output| {
            let address = Address::from_str(&output.address)
                .map_err(|e| Error::InvalidAddress(e.to_string()))?
                .require_network(network_data(network))
                .map_err(|e| Error::InvalidAddress(e.to_string()))?;
            Ok(TxOut {
                value: Amount::from_sat(output.amount_sats),
                script_pubkey: address.script_pubkey(),
            })
        })
        .collect::<Result<Vec<TxOut>>>()?;

    Ok(Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: tx_inputs,
        output: tx_outputs,
    })
}

/// Create a fully signed multisig transaction from the unsigned
/// transaction's inputs and outputs plus per-signer signature sets.
///
/// Each input requires at least M valid signatures; an invalid signature
/// or two signatures resolving to the same public key is fatal. Verified
/// signatures are reordered into the input's BIP67 public-key order
/// before the scriptSig/witness is emitted.
pub fn signed_multisig_transaction(
    network: Network,
    inputs: &[MultisigTransactionInput],
    outputs: &[TransactionOutput],
    transaction_signatures: &[SignatureSet],
) -> Result<Transaction> {
    // Validates inputs and outputs.
    let mut signed_transaction = unsigned_multisig_transaction(network, inputs, outputs)?;

    if transaction_signatures.is_empty() {
        return Err(Error::NoTransactionSignatures);
    }
    for (signature_set_index, signature_set) in transaction_signatures.iter().enumerate() {
        if signature_set.len() < inputs.len() {
            return Err(Error::InsufficientInputSignatures {
                signature_set: signature_set_index + 1,
                required: inputs.len(),
                received: signature_set.len(),
            });
        }
    }

    for (input_index, input) in inputs.iter().enumerate() {
        let input_signatures: Vec<&Vec<u8>> = transaction_signatures
            .iter()
            .map(|signature_set| &signature_set[input_index])
            .filter(|signature| !signature.is_empty())
            .collect();
        let required_signatures = input.multisig.required_signers();
        if input_signatures.len() < required_signatures {
            return Err(Error::InsufficientSignatures {
                input: input_index + 1,
                required: required_signatures,
                received: input_signatures.len(),
            });
        }

        // Resolve each signature to the public key that produced it.
        let mut signatures_by_public_key: HashMap<String, &Vec<u8>> = HashMap::new();
        for signature in input_signatures {
            let public_key =
                match validate_multisig_signature(network, inputs, outputs, input_index, signature)
                {
                    Ok(Some(public_key)) => public_key,
                    _ => {
                        return Err(Error::InvalidSignature {
                            input: input_index + 1,
                            signature: hex::encode(signature),
                        })
                    }
                };
            if signatures_by_public_key.contains_key(&public_key) {
                return Err(Error::DuplicateSignature {
                    input: input_index + 1,
                    signature: hex::encode(signature),
                });
            }
            signatures_by_public_key.insert(public_key, signature);
        }

        // Reorder the verified signatures to match the position of their
        // public keys within the input's script.
        let sorted_signatures: Vec<Vec<u8>> = input
            .multisig
            .public_keys()
            .iter()
            .filter_map(|public_key| signatures_by_public_key.get(public_key))
            .map(|signature| {
                let mut sig = signature_no_sighash_type(signature).to_vec();
                sig.push(0x01); // SIGHASH_ALL
                sig
            })
            .collect();

        match input.multisig.address_type() {
            MultisigAddressType::P2wsh => {
                let witness = multisig_witness_field(input, input_index, &sorted_signatures)?;
                signed_transaction.input[input_index].witness = witness;
            }
            MultisigAddressType::P2shP2wsh => {
                let witness = multisig_witness_field(input, input_index, &sorted_signatures)?;
                signed_transaction.input[input_index].witness = witness;
                // The scriptSig is a single push of the P2WSH wrapper
                // script.
                let redeem_script = input
                    .multisig
                    .redeem_script()
                    .ok_or(Error::MissingRedeemScript(input_index))?;
                let push = PushBytesBuf::try_from(redeem_script.to_bytes())
                    .map_err(|_| Error::MissingRedeemScript(input_index))?;
                signed_transaction.input[input_index].script_sig =
                    Builder::new().push_slice(push).into_script();
            }
            MultisigAddressType::P2sh => {
                signed_transaction.input[input_index].script_sig =
                    multisig_script_sig(input, input_index, &sorted_signatures)?;
            }
        }
    }

    Ok(signed_transaction)
}

/// The witness stack spending a multisig input: an empty element (the
/// CHECKMULTISIG off-by-one consumes one extra stack item), the
/// signatures in script order, then the witness script.
fn multisig_witness_field(
    input: &MultisigTransactionInput,
    input_index: usize,
    sorted_signatures: &[Vec<u8>],
) -> Result<Witness> {
    let witness_script = input
        .multisig
        .witness_script()
        .ok_or(Error::MissingWitnessScript(input_index))?;
    let mut witness = Witness::new();
    witness.push([]);
    for signature in sorted_signatures {
        witness.push(signature);
    }
    witness.push(witness_script.as_bytes());
    Ok(witness)
}

/// The legacy scriptSig spending a P2SH multisig input:
/// `OP_0 <sig...> <redeemScript>`.
fn multisig_script_sig(
    input: &MultisigTransactionInput,
    input_index: usize,
    sorted_signatures: &[Vec<u8>],
) -> Result<ScriptBuf> {
    let redeem_script = input
        .multisig
        .redeem_script()
        .ok_or(Error::MissingRedeemScript(input_index))?;
    let mut builder = Builder::new().push_opcode(OP_PUSHBYTES_0);
    for signature in sorted_signatures {
        let push = PushBytesBuf::try_from(signature.clone())
            .map_err(|_| Error::InvalidDer("signature too long to push".to_string()))?;
        builder = builder.push_slice(push);
    }
    let redeem_push = PushBytesBuf::try_from(redeem_script.to_bytes())
        .map_err(|_| Error::MissingRedeemScript(input_index))?;
    Ok(builder.push_slice(redeem_push).into_script())
}
