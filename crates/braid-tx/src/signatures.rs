//! Validating and normalizing multisig transaction signatures.

use bitcoin::hashes::Hash;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use braid_core::multisig::MultisigAddressType;
use braid_core::{MultisigTransactionInput, Network, TransactionOutput};
use secp256k1::{ecdsa, Message, PublicKey, Secp256k1};

use crate::error::{Error, Result};
use crate::transactions::unsigned_multisig_transaction;

/// Strip the trailing sighash-type byte from a DER signature.
///
/// The byte is only stripped when the declared DER length field does not
/// already account for it; a bare DER signature passes through unchanged.
pub fn signature_no_sighash_type(signature: &[u8]) -> &[u8] {
    if signature.len() < 2 {
        return signature;
    }
    let declared = signature[1] as usize;
    if declared == signature.len() - 2 {
        signature
    } else {
        &signature[..signature.len() - 1]
    }
}

/// Decompose a DER signature into its (r, s) components.
fn decode_der(signature: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let invalid = |msg: &str| Error::InvalidDer(msg.to_string());
    if signature.len() < 8 || signature[0] != 0x30 {
        return Err(invalid("missing DER sequence tag"));
    }
    if signature[1] as usize != signature.len() - 2 {
        return Err(invalid("DER length mismatch"));
    }
    if signature[2] != 0x02 {
        return Err(invalid("missing DER integer tag for r"));
    }
    let r_len = signature[3] as usize;
    if 4 + r_len + 2 > signature.len() {
        return Err(invalid("r length out of bounds"));
    }
    let r = signature[4..4 + r_len].to_vec();
    if signature[4 + r_len] != 0x02 {
        return Err(invalid("missing DER integer tag for s"));
    }
    let s_len = signature[5 + r_len] as usize;
    if 6 + r_len + s_len != signature.len() {
        return Err(invalid("s length out of bounds"));
    }
    let s = signature[6 + r_len..].to_vec();
    Ok((r, s))
}

/// Convert a DER signature (without sighash byte) into the fixed 64-byte
/// raw form the verification primitive wants.
///
/// There is a mismatch between DER serialization and ECDSA requirements:
/// DER's highest bit states polarity, while ECDSA has no negatives. Where
/// DER would yield a negative, a one-byte 0x00 pad was prepended; it is
/// truncated here when r or s exceeds 32 bytes. Components shorter than
/// 32 bytes are left-zero-padded.
pub fn multisig_signature_buffer(signature: &[u8]) -> Result<[u8; 64]> {
    let (r, s) = decode_der(signature)?;
    let r = if r.len() > 32 { &r[r.len() - 32..] } else { &r[..] };
    let s = if s.len() > 32 { &s[s.len() - 32..] } else { &s[..] };
    let mut buffer = [0u8; 64];
    buffer[32 - r.len()..32].copy_from_slice(r);
    buffer[64 - s.len()..].copy_from_slice(s);
    Ok(buffer)
}

/// Compute the signature hash for the input at `input_index`: the BIP143
/// witness-v0 digest (amount + witness script) for the segwit address
/// types, the legacy digest (redeem script) otherwise. Always SIGHASH_ALL.
pub fn multisig_signature_hash(
    network: Network,
    inputs: &[MultisigTransactionInput],
    outputs: &[TransactionOutput],
    input_index: usize,
) -> Result<[u8; 32]> {
    let unsigned_transaction = unsigned_multisig_transaction(network, inputs, outputs)?;
    let input = &inputs[input_index];
    let mut cache = SighashCache::new(&unsigned_transaction);
    match input.multisig.address_type() {
        MultisigAddressType::P2wsh | MultisigAddressType::P2shP2wsh => {
            let witness_script = input
                .multisig
                .witness_script()
                .ok_or(Error::MissingWitnessScript(input_index))?;
            let sighash = cache
                .p2wsh_signature_hash(
                    input_index,
                    witness_script,
                    bitcoin::Amount::from_sat(input.amount_sats),
                    EcdsaSighashType::All,
                )
                .map_err(|e| Error::Sighash(e.to_string()))?;
            Ok(sighash.to_byte_array())
        }
        MultisigAddressType::P2sh => {
            let redeem_script = input
                .multisig
                .redeem_script()
                .ok_or(Error::MissingRedeemScript(input_index))?;
            let sighash = cache
                .legacy_signature_hash(
                    input_index,
                    redeem_script,
                    EcdsaSighashType::All.to_u32(),
                )
                .map_err(|e| Error::Sighash(e.to_string()))?;
            Ok(sighash.to_byte_array())
        }
    }
}

/// Validate a multisig signature for the given input.
///
/// A bare signature does not declare which key produced it, so the
/// input's public keys are scanned in order, attempting ECDSA
/// verification against each. Returns the first matching public key hex,
/// or `None` when the signature matches none of them.
pub fn validate_multisig_signature(
    network: Network,
    inputs: &[MultisigTransactionInput],
    outputs: &[TransactionOutput],
    input_index: usize,
    input_signature: &[u8],
) -> Result<Option<String>> {
    let hash = multisig_signature_hash(network, inputs, outputs, input_index)?;
    let signature_buffer =
        multisig_signature_buffer(signature_no_sighash_type(input_signature))?;
    let signature = ecdsa::Signature::from_compact(&signature_buffer)?;
    let message = Message::from_digest(hash);

    let secp = Secp256k1::verification_only();
    let input = &inputs[input_index];
    for public_key_hex in input.multisig.public_keys() {
        let public_key = PublicKey::from_slice(&hex::decode(public_key_hex)?)?;
        if secp.verify_ecdsa(&message, &signature, &public_key).is_ok() {
            return Ok(Some(public_key_hex.clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_no_sighash_type() {
        // 8-byte DER body declared, 9 bytes supplied: trailing byte is a
        // sighash type and gets stripped.
        let with_sighash = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01];
        assert_eq!(
            signature_no_sighash_type(&with_sighash),
            &with_sighash[..8]
        );
        // Length field accounts for every byte: nothing stripped.
        let bare = [0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];
        assert_eq!(signature_no_sighash_type(&bare), &bare[..]);
    }

    #[test]
    fn test_multisig_signature_buffer_pads_short_components() {
        // r and s of 1 byte each are left-zero-padded to 32 bytes.
        let der = [0x30, 0x06, 0x02, 0x01, 0x7f, 0x02, 0x01, 0x7e];
        let buffer = multisig_signature_buffer(&der).unwrap();
        assert_eq!(buffer[31], 0x7f);
        assert_eq!(buffer[63], 0x7e);
        assert!(buffer[..31].iter().all(|&b| b == 0));
        assert!(buffer[32..63].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_multisig_signature_buffer_truncates_padded_components() {
        // A 33-byte r with a leading 0x00 non-negativity pad.
        let mut der = vec![0x30, 0x26, 0x02, 0x21, 0x00];
        der.push(0x80);
        der.extend_from_slice(&[0x11; 31]);
        der.extend_from_slice(&[0x02, 0x01, 0x7e]);
        let buffer = multisig_signature_buffer(&der).unwrap();
        assert_eq!(buffer[0], 0x80);
        assert_eq!(buffer[1..32], [0x11; 31]);
        assert_eq!(buffer[63], 0x7e);
    }

    #[test]
    fn test_decode_der_rejects_garbage() {
        assert!(multisig_signature_buffer(&[0x31, 0x00]).is_err());
        assert!(multisig_signature_buffer(&[0x30, 0x06, 0x03, 0x01, 0x01, 0x02, 0x01, 0x01]).is_err());
        assert!(multisig_signature_buffer(&[]).is_err());
    }
}
