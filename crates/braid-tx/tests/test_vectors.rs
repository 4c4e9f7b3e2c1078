//! End-to-end multisig signing vectors.
//!
//! A 2-of-3 multisig built from three fixed keys, spent as P2WSH and as
//! P2SH, with independently computed signatures. Any change in key
//! sorting, script assembly, sighash computation, or witness emission
//! breaks these byte-for-byte.

use bitcoin::consensus::Encodable;
use braid_core::{
    generate_multisig_from_public_keys, Multisig, MultisigAddressType, MultisigTransactionInput,
    Network, TransactionOutput,
};
use braid_tx::{
    signed_multisig_transaction, unsigned_multisig_transaction, validate_multisig_signature,
    Error,
};

// The three signer pubkeys, in the order supplied by the wallet
// configuration (NOT sorted).
const PUBKEYS: [&str; 3] = [
    "03defdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a34",
    "031be68a5a028f2601d0e80d468c344ba331d611b96c358b6032e8b4da0547fc11",
    "02463b3d9f662621fb1b4be8fbbe2520125a216cdfc9dae3debcba4850c690d45b",
];

const FUNDING_TXID: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const FUNDING_INDEX: u32 = 1;
const INPUT_AMOUNT: u64 = 100_000;
const OUTPUT_AMOUNT: u64 = 99_000;
const DESTINATION: &str = "tb1qzyl4l3m6af64fv703f3qcjply2ezexd3p7lk5g0j8k6ed8el4q6qkyt4c0";

// Signatures over the P2WSH (BIP143) sighash, by signer pubkey, each with
// the trailing SIGHASH_ALL byte.
const SEGWIT_SIG_KEY0: &str = "3045022100cc9d12530a5acca43be4baf66bf6330c655d8c22aa835c2f0c4b1406330c2d9502201776472737446e14c280f93e0aa3d35bfe85e02a1189017d6d8dba300667e21b01";
const SEGWIT_SIG_KEY1: &str = "3045022100e4d0bc9de9a86d5faa64a07c4d9c2f549fd176d2069697e1b0e351213e7cf99602205b82cf03da404cf9bf414f468af82479fd3a283ee7ffd14ced26522a7957600101";

// Signatures over the legacy (P2SH) sighash.
const LEGACY_SIG_KEY0: &str = "304402207e8e147647e7a69128f30289b8edaed9732fa72c2a3958ef56dfe3a26be9f03102203be2d0184e4847579e543e51d008aab0bca8b5b6b1ce52058100397e95a33be401";
const LEGACY_SIG_KEY1: &str = "3045022100df6677a39ecce46562bd864a1661316e0a662160c7ff51f94db2b1ed67edb303022077fa41a6adc5d8c96e1113db500aa1d5f3a0ca934490753ff9c1ba47d2c5bfba01";

fn multisig(address_type: MultisigAddressType) -> Multisig {
    generate_multisig_from_public_keys(Network::Testnet, address_type, 2, &PUBKEYS).unwrap()
}

fn fixture(address_type: MultisigAddressType) -> (Vec<MultisigTransactionInput>, Vec<TransactionOutput>) {
    let inputs = vec![MultisigTransactionInput::new(
        FUNDING_TXID,
        FUNDING_INDEX,
        multisig(address_type),
        INPUT_AMOUNT,
    )];
    let outputs = vec![TransactionOutput::new(DESTINATION, OUTPUT_AMOUNT)];
    (inputs, outputs)
}

fn sig(hex_sig: &str) -> Vec<u8> {
    hex::decode(hex_sig).unwrap()
}

#[test]
fn multisig_addresses_are_pinned() {
    assert_eq!(
        multisig(MultisigAddressType::P2wsh).address(),
        "tb1qj3y5clemg4zsk4g5wu678cwqqt0xak6d02vjq885hkrwj9hp5phqe0mhg4"
    );
    assert_eq!(
        multisig(MultisigAddressType::P2sh).address(),
        "2MseiarMnsnSvUvY83Bm6N1Zk35XSAvHp4X"
    );
    assert_eq!(
        hex::encode(multisig(MultisigAddressType::P2wsh).script().as_bytes()),
        "522102463b3d9f662621fb1b4be8fbbe2520125a216cdfc9dae3debcba4850c690d45b21031be68a5a028f2601d0e80d468c344ba331d611b96c358b6032e8b4da0547fc112103defdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a3453ae"
    );
}

#[test]
fn unsigned_transaction_shape() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2wsh);
    let tx = unsigned_multisig_transaction(Network::Testnet, &inputs, &outputs).unwrap();
    assert_eq!(tx.version.0, 1);
    assert_eq!(tx.lock_time.to_consensus_u32(), 0);
    assert_eq!(tx.input.len(), 1);
    assert_eq!(tx.input[0].previous_output.vout, FUNDING_INDEX);
    assert_eq!(tx.input[0].sequence.0, 0xffff_ffff);
    assert_eq!(tx.output[0].value.to_sat(), OUTPUT_AMOUNT);
}

#[test]
fn segwit_signature_resolves_to_signer() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2wsh);
    assert_eq!(
        validate_multisig_signature(Network::Testnet, &inputs, &outputs, 0, &sig(SEGWIT_SIG_KEY0))
            .unwrap(),
        Some(PUBKEYS[0].to_string())
    );
    assert_eq!(
        validate_multisig_signature(Network::Testnet, &inputs, &outputs, 0, &sig(SEGWIT_SIG_KEY1))
            .unwrap(),
        Some(PUBKEYS[1].to_string())
    );
    // A signature over the legacy digest matches no key for the segwit
    // input.
    assert_eq!(
        validate_multisig_signature(Network::Testnet, &inputs, &outputs, 0, &sig(LEGACY_SIG_KEY0))
            .unwrap(),
        None
    );
}

#[test]
fn legacy_signature_resolves_to_signer() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2sh);
    assert_eq!(
        validate_multisig_signature(Network::Testnet, &inputs, &outputs, 0, &sig(LEGACY_SIG_KEY0))
            .unwrap(),
        Some(PUBKEYS[0].to_string())
    );
    assert_eq!(
        validate_multisig_signature(Network::Testnet, &inputs, &outputs, 0, &sig(LEGACY_SIG_KEY1))
            .unwrap(),
        Some(PUBKEYS[1].to_string())
    );
}

#[test]
fn signed_p2wsh_transaction_witness_order() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2wsh);
    // Signer of PUBKEYS[0] supplied first, but its pubkey sorts LAST:
    // the emitted witness must follow script order, not supply order.
    let signature_sets = vec![vec![sig(SEGWIT_SIG_KEY0)], vec![sig(SEGWIT_SIG_KEY1)]];
    let tx =
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signature_sets).unwrap();

    let witness: Vec<Vec<u8>> = tx.input[0].witness.iter().map(|e| e.to_vec()).collect();
    assert_eq!(witness.len(), 4);
    // Leading empty element compensates for the CHECKMULTISIG
    // off-by-one.
    assert!(witness[0].is_empty());
    assert_eq!(hex::encode(&witness[1]), SEGWIT_SIG_KEY1);
    assert_eq!(hex::encode(&witness[2]), SEGWIT_SIG_KEY0);
    assert_eq!(
        witness[3],
        multisig(MultisigAddressType::P2wsh).witness_script().unwrap().to_bytes()
    );
    assert!(tx.input[0].script_sig.is_empty());

    // The signed transaction serializes with the segwit marker.
    let mut serialized = Vec::new();
    tx.consensus_encode(&mut serialized).unwrap();
    assert_eq!(serialized[4], 0x00);
    assert_eq!(serialized[5], 0x01);
}

#[test]
fn signed_p2sh_transaction_script_sig_order() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2sh);
    let signature_sets = vec![vec![sig(LEGACY_SIG_KEY0)], vec![sig(LEGACY_SIG_KEY1)]];
    let tx =
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signature_sets).unwrap();

    let redeem = multisig(MultisigAddressType::P2sh).redeem_script().unwrap().to_bytes();
    let script_sig = tx.input[0].script_sig.to_bytes();
    // OP_0, then the two signatures in script order, then the pushed
    // redeem script.
    assert_eq!(script_sig[0], 0x00);
    let sig1 = sig(LEGACY_SIG_KEY1);
    let sig0 = sig(LEGACY_SIG_KEY0);
    let mut expected = vec![0x00];
    expected.push(sig1.len() as u8);
    expected.extend_from_slice(&sig1);
    expected.push(sig0.len() as u8);
    expected.extend_from_slice(&sig0);
    expected.push(0x4c); // OP_PUSHDATA1: redeem script is over 75 bytes
    expected.push(redeem.len() as u8);
    expected.extend_from_slice(&redeem);
    assert_eq!(script_sig, expected);
    assert!(tx.input[0].witness.is_empty());
}

#[test]
fn signed_p2sh_p2wsh_transaction_wraps_witness() {
    // The BIP143 digest depends on the witness script and spent amount,
    // both shared with the P2WSH case, so the same signatures apply.
    let (inputs, outputs) = fixture(MultisigAddressType::P2shP2wsh);
    let signature_sets = vec![vec![sig(SEGWIT_SIG_KEY0)], vec![sig(SEGWIT_SIG_KEY1)]];
    let tx =
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signature_sets).unwrap();

    let witness: Vec<Vec<u8>> = tx.input[0].witness.iter().map(|e| e.to_vec()).collect();
    assert_eq!(witness.len(), 4);
    assert!(witness[0].is_empty());
    assert_eq!(hex::encode(&witness[1]), SEGWIT_SIG_KEY1);
    assert_eq!(hex::encode(&witness[2]), SEGWIT_SIG_KEY0);

    // The scriptSig is a single push of the 34-byte P2WSH wrapper.
    let wrapper = multisig(MultisigAddressType::P2shP2wsh)
        .redeem_script()
        .unwrap()
        .to_bytes();
    let mut expected = vec![wrapper.len() as u8];
    expected.extend_from_slice(&wrapper);
    assert_eq!(tx.input[0].script_sig.to_bytes(), expected);
}

#[test]
fn insufficient_signatures_are_fatal() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2wsh);
    assert!(matches!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &[]),
        Err(Error::NoTransactionSignatures)
    ));
    let one_signer = vec![vec![sig(SEGWIT_SIG_KEY0)]];
    assert!(matches!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &one_signer),
        Err(Error::InsufficientSignatures { input: 1, required: 2, received: 1 })
    ));
}

#[test]
fn duplicate_signatures_are_fatal() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2wsh);
    let duplicated = vec![vec![sig(SEGWIT_SIG_KEY0)], vec![sig(SEGWIT_SIG_KEY0)]];
    assert!(matches!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &duplicated),
        Err(Error::DuplicateSignature { input: 1, .. })
    ));
}

#[test]
fn invalid_signatures_are_fatal() {
    let (inputs, outputs) = fixture(MultisigAddressType::P2wsh);
    // Legacy-digest signatures verify against no key on the segwit input.
    let wrong_digest = vec![vec![sig(LEGACY_SIG_KEY0)], vec![sig(LEGACY_SIG_KEY1)]];
    assert!(matches!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &wrong_digest),
        Err(Error::InvalidSignature { input: 1, .. })
    ));
}
