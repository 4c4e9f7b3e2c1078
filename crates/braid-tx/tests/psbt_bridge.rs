//! Legacy psbt bridge: braid-aware unsigned psbt construction, signature
//! extraction, and import into the v2 engine.

use std::str::FromStr;

use bitcoin::consensus::Encodable;
use braid_core::{
    derive_multisig_by_index, Braid, ExtendedPublicKey, MultisigAddressType,
    MultisigTransactionInput, Network, TransactionOutput,
};
use braid_psbt::{PsbtV2, TxModifiable};
use braid_tx::{auto_load_psbt, parse_signatures_from_psbt, unsigned_multisig_psbt};

const TPUBS: [&str; 3] = [
    "tpubDEsnGW8641BjEMwkkxSU3ucZT6YfVXtiwPY5cW4kk2ehmnu6RvVqLWXuaGxuyiVrPV7RNJoSoTrP719TPRAkGxVYEGyJpyuX1MEk9fzoYCa",
    "tpubDEsnGW8641BjGQp5mtw6RWsSHPn27RtdYeySi9phhdus9UzTBTcJkkB64ZwysBe2eXSdBT5cr9y8mFJEfU8QrQxfWvBBmW4rkhBMC1yvgHQ",
    "tpubDEsnGW8641BjJh6yeoSisiBqZAahaoirYRGdBRFFYwCJcNK9ZqWfZvLZ8fMV3YqUoEvB5gwdEZG43UjgLfNro6kMvh4nNX6WPU2W22tsmzE",
];

const DESTINATION: &str = "2N9E65H2rPFg8uqPg6MyYB4vzn7gwGF4jaj";

fn test_braid() -> Braid {
    let xpubs = TPUBS
        .iter()
        .map(|tpub| ExtendedPublicKey::from_base58(tpub).unwrap())
        .collect();
    Braid::new(Network::Testnet, MultisigAddressType::P2wsh, xpubs, 2, 0).unwrap()
}

/// A funding transaction whose output 0 pays the given script.
fn funding_tx_hex(script_pubkey: bitcoin::ScriptBuf, amount_sats: u64) -> (String, String) {
    let tx = bitcoin::Transaction {
        version: bitcoin::transaction::Version::TWO,
        lock_time: bitcoin::absolute::LockTime::ZERO,
        input: vec![bitcoin::TxIn {
            previous_output: bitcoin::OutPoint {
                txid: bitcoin::Txid::from_str(&"11".repeat(32)).unwrap(),
                vout: 0,
            },
            script_sig: bitcoin::ScriptBuf::new(),
            sequence: bitcoin::Sequence::MAX,
            witness: bitcoin::Witness::new(),
        }],
        output: vec![bitcoin::TxOut {
            value: bitcoin::Amount::from_sat(amount_sats),
            script_pubkey,
        }],
    };
    let mut bytes = Vec::new();
    tx.consensus_encode(&mut bytes).unwrap();
    (hex::encode(bytes), tx.compute_txid().to_string())
}

fn bridge_fixture() -> (Vec<MultisigTransactionInput>, Vec<TransactionOutput>) {
    let multisig = derive_multisig_by_index(&test_braid(), 0).unwrap();
    let script_pubkey = bitcoin::Address::from_str(multisig.address())
        .unwrap()
        .assume_checked()
        .script_pubkey();
    let (transaction_hex, txid) = funding_tx_hex(script_pubkey, 100_000);
    let mut input = MultisigTransactionInput::new(&txid, 0, multisig, 100_000);
    input.transaction_hex = Some(transaction_hex);
    let outputs = vec![TransactionOutput::new(DESTINATION, 99_000)];
    (vec![input], outputs)
}

#[test]
fn unsigned_psbt_carries_scripts_and_derivations() {
    let (inputs, outputs) = bridge_fixture();
    let psbt = unsigned_multisig_psbt(Network::Testnet, &inputs, &outputs, false).unwrap();

    assert_eq!(psbt.inputs.len(), 1);
    assert_eq!(psbt.outputs.len(), 1);
    let input = &psbt.inputs[0];
    // Native segwit: witness UTXO and witness script, no redeem script.
    assert!(input.witness_utxo.is_some());
    assert!(input.non_witness_utxo.is_none());
    assert!(input.redeem_script.is_none());
    assert_eq!(
        input.witness_utxo.as_ref().unwrap().value.to_sat(),
        100_000
    );
    assert_eq!(
        input.witness_script.as_ref().map(|s| s.to_bytes()),
        inputs[0].multisig.witness_script().map(|s| s.to_bytes())
    );
    // One derivation per signer.
    assert_eq!(input.bip32_derivation.len(), 3);
    assert!(psbt.xpub.is_empty());
}

#[test]
fn unsigned_psbt_includes_global_xpubs_when_asked() {
    let (inputs, outputs) = bridge_fixture();
    let psbt = unsigned_multisig_psbt(Network::Testnet, &inputs, &outputs, true).unwrap();
    assert_eq!(psbt.xpub.len(), 3);
    for xpub in psbt.xpub.keys() {
        assert!(TPUBS.contains(&xpub.to_string().as_str()));
    }
}

#[test]
fn unsigned_psbt_requires_braid_provenance() {
    let (mut inputs, outputs) = bridge_fixture();
    // Rebuild the multisig without braid provenance.
    let bare = braid_core::generate_multisig_from_public_keys(
        Network::Testnet,
        MultisigAddressType::P2wsh,
        2,
        &inputs[0]
            .multisig
            .public_keys()
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>(),
    )
    .unwrap();
    inputs[0].multisig = bare;
    let error = unsigned_multisig_psbt(Network::Testnet, &inputs, &outputs, false).unwrap_err();
    assert!(error
        .to_string()
        .contains("cannot be traced back to its set of extended public keys"));
}

#[test]
fn signatures_round_trip_through_psbt_text() {
    let (inputs, outputs) = bridge_fixture();
    let mut psbt = unsigned_multisig_psbt(Network::Testnet, &inputs, &outputs, false).unwrap();

    // No signatures yet.
    let hex_text = hex::encode(psbt.serialize());
    assert_eq!(parse_signatures_from_psbt(&hex_text).unwrap(), None);

    // Record a (syntactically valid) partial signature and re-extract it.
    let pubkey = bitcoin::PublicKey::from_str(&inputs[0].multisig.public_keys()[0]).unwrap();
    let signature = bitcoin::ecdsa::Signature::from_slice(
        &hex::decode("3045022100cc9d12530a5acca43be4baf66bf6330c655d8c22aa835c2f0c4b1406330c2d9502201776472737446e14c280f93e0aa3d35bfe85e02a1189017d6d8dba300667e21b01").unwrap(),
    )
    .unwrap();
    psbt.inputs[0].partial_sigs.insert(pubkey, signature);

    let hex_text = hex::encode(psbt.serialize());
    let extracted = parse_signatures_from_psbt(&hex_text).unwrap().unwrap();
    assert_eq!(extracted.len(), 1);
    let signatures = extracted.get(&inputs[0].multisig.public_keys()[0]).unwrap();
    assert_eq!(signatures.len(), 1);
    assert!(signatures[0].starts_with("3045"));

    // The same text loads through the auto-detecting loader.
    assert!(auto_load_psbt(&hex_text).is_ok());
    assert!(auto_load_psbt("nonsense").is_err());
}

#[test]
fn v0_psbt_imports_into_v2_engine() {
    let (inputs, outputs) = bridge_fixture();
    let mut v0 = unsigned_multisig_psbt(Network::Testnet, &inputs, &outputs, true).unwrap();
    let pubkey = bitcoin::PublicKey::from_str(&inputs[0].multisig.public_keys()[0]).unwrap();
    let signature = bitcoin::ecdsa::Signature::from_slice(
        &hex::decode("3045022100cc9d12530a5acca43be4baf66bf6330c655d8c22aa835c2f0c4b1406330c2d9502201776472737446e14c280f93e0aa3d35bfe85e02a1189017d6d8dba300667e21b01").unwrap(),
    )
    .unwrap();
    v0.inputs[0].partial_sigs.insert(pubkey, signature);

    // The legacy transaction is version 1, so the import requires the
    // explicit escape hatch.
    assert!(PsbtV2::from_v0(&v0, false).is_err());
    let v2 = PsbtV2::from_v0(&v0, true).unwrap();

    assert_eq!(v2.tx_version().unwrap(), 1);
    assert_eq!(v2.input_count().unwrap(), 1);
    assert_eq!(v2.output_count().unwrap(), 1);
    assert_eq!(v2.global_xpubs().len(), 3);
    assert_eq!(v2.input_bip32_derivations()[0].len(), 3);
    assert_eq!(v2.output_amounts().unwrap(), vec![99_000]);
    // The replayed SIGHASH_ALL signature locked the transaction
    // structure.
    assert_eq!(v2.input_partial_sigs()[0].len(), 1);
    assert_eq!(v2.tx_modifiable(), TxModifiable::empty());

    // Previous txid round-trips in wire order.
    use bitcoin::hashes::Hash;
    assert_eq!(
        v2.input_previous_txids().unwrap()[0],
        v0.unsigned_tx.input[0]
            .previous_output
            .txid
            .to_byte_array()
            .to_vec()
    );
}
