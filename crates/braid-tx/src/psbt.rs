//! Bridging the braid/multisig domain model to legacy (v0) psbts, per
//! BIP174: unsigned psbt construction for signers, and signature
//! extraction from signed psbts.

use std::collections::BTreeMap;
use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Fingerprint, Xpub};
use bitcoin::psbt::Psbt;
use bitcoin::Transaction;
use braid_core::braid::Bip32Derivation;
use braid_core::multisig::{Multisig, MultisigAddressType};
use braid_core::paths::bip32_path_to_sequence;
use braid_core::{
    fingerprint_to_fixed_length_hex, generate_bip32_derivation_by_index, validate_multisig_inputs,
    validate_outputs, Braid, MultisigTransactionInput, Network, TransactionOutput,
};

use crate::error::{Error, Result};
use crate::transactions::unsigned_multisig_transaction;

/// Parse a psbt presented as hex or base64 text (detected by magic
/// prefix) into a v0 psbt.
pub fn auto_load_psbt(psbt: &str) -> Result<Psbt> {
    let bytes = braid_psbt::bufferize(psbt)?;
    Ok(Psbt::deserialize(&bytes)?)
}

/// The derivation metadata for a multisig: taken from the multisig when
/// already derived, otherwise regenerated from its braid provenance at
/// the given address index.
fn get_bip32_derivation(multisig: &Multisig, index: u32) -> Result<Vec<Bip32Derivation>> {
    if let Some(derivation) = multisig.bip32_derivation() {
        return Ok(derivation.to_vec());
    }
    let braid_details = multisig.braid_details().ok_or_else(|| {
        Error::InvalidInputs(
            "At least one input cannot be traced back to its set of extended public keys."
                .to_string(),
        )
    })?;
    let braid = Braid::from_json(braid_details)?;
    Ok(generate_bip32_derivation_by_index(&braid, index)?)
}

/// Multi-address inputs have different derivations per address index, so
/// the input's recorded path picks the index; a missing path means
/// index 0.
fn psbt_input_derivation(input: &MultisigTransactionInput) -> Result<Vec<Bip32Derivation>> {
    let index = match &input.bip32_path {
        Some(path) => bip32_path_to_sequence(path)?.last().copied().unwrap_or(0),
        None => 0,
    };
    get_bip32_derivation(&input.multisig, index)
}

fn derivation_map(
    derivations: &[Bip32Derivation],
) -> Result<BTreeMap<secp256k1::PublicKey, (Fingerprint, DerivationPath)>> {
    let mut map = BTreeMap::new();
    for derivation in derivations {
        let pubkey = secp256k1::PublicKey::from_slice(&derivation.pubkey)?;
        let fingerprint = Fingerprint::from(derivation.master_fingerprint);
        let path = DerivationPath::from_str(&derivation.path)
            .map_err(braid_core::Error::Bip32)
            .map_err(Error::Core)?;
        map.insert(pubkey, (fingerprint, path));
    }
    Ok(map)
}

/// The locking script(s) for a multisig in psbt form: redeemScript,
/// witnessScript, or both for the wrapped type.
fn psbt_multisig_lock(
    multisig: &Multisig,
) -> (Option<bitcoin::ScriptBuf>, Option<bitcoin::ScriptBuf>) {
    match multisig.address_type() {
        MultisigAddressType::P2sh => (multisig.redeem_script().cloned(), None),
        MultisigAddressType::P2wsh => (None, multisig.witness_script().cloned()),
        MultisigAddressType::P2shP2wsh => (
            multisig.redeem_script().cloned(),
            multisig.witness_script().cloned(),
        ),
    }
}

/// Create an unsigned v0 psbt from braid-aware inputs and outputs, ready
/// to pass to signers.
///
/// Each input carries a witness UTXO (segwit types) or the full funding
/// transaction (legacy), its locking script(s), and its per-signer
/// derivations. Change outputs (those carrying a multisig) additionally
/// embed their locking scripts and derivations so a signing device can
/// confirm the change address belongs to the same wallet. With
/// `include_global_xpubs`, the braid's extended public keys are recorded
/// in the global map.
pub fn unsigned_multisig_psbt(
    network: Network,
    inputs: &[MultisigTransactionInput],
    outputs: &[TransactionOutput],
    include_global_xpubs: bool,
) -> Result<Psbt> {
    let input_error = validate_multisig_inputs(inputs, true);
    if !input_error.is_empty() {
        return Err(Error::InvalidInputs(input_error));
    }
    let output_error = validate_outputs(network, outputs, None);
    if !output_error.is_empty() {
        return Err(Error::InvalidOutputs(output_error));
    }

    let unsigned_tx = unsigned_multisig_transaction(network, inputs, outputs)?;
    let mut psbt = Psbt::from_unsigned_tx(unsigned_tx)?;

    for (index, input) in inputs.iter().enumerate() {
        let transaction_hex = input
            .transaction_hex
            .as_ref()
            .ok_or(Error::MissingFundingTransaction(index))?;
        let funding_tx: Transaction =
            bitcoin::consensus::deserialize(&hex::decode(transaction_hex)?)?;

        let psbt_input = &mut psbt.inputs[index];
        // Segwit inputs verify against the spent output; legacy inputs
        // need the whole funding transaction.
        if input.multisig.witness_script().is_some() {
            let utxo = funding_tx
                .output
                .get(input.index as usize)
                .ok_or(Error::MissingFundingTransaction(index))?;
            psbt_input.witness_utxo = Some(utxo.clone());
        } else {
            psbt_input.non_witness_utxo = Some(funding_tx);
        }
        let (redeem_script, witness_script) = psbt_multisig_lock(&input.multisig);
        psbt_input.redeem_script = redeem_script;
        psbt_input.witness_script = witness_script;
        psbt_input.bip32_derivation = derivation_map(&psbt_input_derivation(input)?)?;
    }

    for (index, output) in outputs.iter().enumerate() {
        if let Some(multisig) = &output.multisig {
            let psbt_output = &mut psbt.outputs[index];
            let (redeem_script, witness_script) = psbt_multisig_lock(multisig);
            psbt_output.redeem_script = redeem_script;
            psbt_output.witness_script = witness_script;
            psbt_output.bip32_derivation = derivation_map(&get_bip32_derivation(multisig, 0)?)?;
        }
    }

    if include_global_xpubs {
        add_global_xpubs(&mut psbt, inputs)?;
    }

    Ok(psbt)
}

/// Record the deduplicated set of extended public keys reachable from the
/// inputs' braids in the psbt's global xpub map.
fn add_global_xpubs(psbt: &mut Psbt, inputs: &[MultisigTransactionInput]) -> Result<()> {
    let mut global_xpubs: BTreeMap<Xpub, (Fingerprint, DerivationPath)> = BTreeMap::new();
    for input in inputs {
        let Some(braid_details) = input.multisig.braid_details() else {
            continue;
        };
        let braid = Braid::from_json(braid_details)?;
        for extended_public_key in braid.extended_public_keys() {
            let xpub = Xpub::from_str(&extended_public_key.base58_string)
                .map_err(braid_core::Error::Bip32)
                .map_err(Error::Core)?;
            // With no root fingerprint recorded, the parent fingerprint
            // stands in as the masked fingerprint.
            let fingerprint_hex = match &extended_public_key.root_fingerprint {
                Some(fingerprint) => fingerprint.clone(),
                None => fingerprint_to_fixed_length_hex(extended_public_key.parent_fingerprint),
            };
            let mut fingerprint_bytes = [0u8; 4];
            fingerprint_bytes.copy_from_slice(&hex::decode(&fingerprint_hex)?);
            let path = match &extended_public_key.path {
                Some(path) => DerivationPath::from_str(path)
                    .map_err(braid_core::Error::Bip32)
                    .map_err(Error::Core)?,
                None => DerivationPath::master(),
            };
            global_xpubs
                .entry(xpub)
                .or_insert((Fingerprint::from(fingerprint_bytes), path));
        }
    }
    psbt.xpub = global_xpubs;
    Ok(())
}

/// The number of signers that have contributed partial signatures, read
/// from the first input.
fn num_signers(psbt: &Psbt) -> usize {
    psbt.inputs
        .first()
        .map(|input| input.partial_sigs.len())
        .unwrap_or(0)
}

/// Extract the signatures from a signed psbt, keyed by signing pubkey
/// hex; each value holds one signature hex per input, in input order.
/// Returns `None` when the psbt carries no signatures.
///
/// There should be one signature per input per signer. Because braids
/// march their multisig addresses forward at the same index across every
/// chain, one pubkey never appears at two different inputs' positions in
/// this structure.
pub fn parse_signatures_from_psbt(psbt: &str) -> Result<Option<BTreeMap<String, Vec<String>>>> {
    let psbt = auto_load_psbt(psbt)?;
    if num_signers(&psbt) == 0 {
        return Ok(None);
    }
    let mut signature_set: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for input in &psbt.inputs {
        for (pubkey, signature) in &input.partial_sigs {
            signature_set
                .entry(hex::encode(pubkey.to_bytes()))
                .or_default()
                .push(hex::encode(signature.to_vec()));
        }
    }
    Ok(Some(signature_set))
}

/// Extract signatures in input order as one array per signer. Returns
/// `None` when the psbt carries no signatures.
pub fn parse_signature_array_from_psbt(psbt: &str) -> Result<Option<Vec<Vec<String>>>> {
    let psbt = auto_load_psbt(psbt)?;
    let num_signers = num_signers(&psbt);
    if num_signers == 0 {
        return Ok(None);
    }
    let mut signature_arrays = vec![Vec::new(); num_signers];
    for input in &psbt.inputs {
        for (signer, (_, signature)) in input.partial_sigs.iter().enumerate() {
            if let Some(signatures) = signature_arrays.get_mut(signer) {
                signatures.push(hex::encode(signature.to_vec()));
            }
        }
    }
    Ok(Some(signature_arrays))
}
