//! Braids: a group of extended public keys plus the multisig information
//! needed to define an M-of-N setup bound to one unhardened branch index.
//!
//! A braid derives a sequence of multisig addresses. By convention index 0
//! is the deposit branch and index 1 the change branch, though the value
//! is caller-defined.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::{
    derive_child_public_key, extended_public_key_root_fingerprint, validate_extended_public_key,
    ExtendedPublicKey,
};
use crate::multisig::{generate_multisig_from_public_keys, Multisig, MultisigAddressType};
use crate::networks::Network;
use crate::paths::{validate_bip32_index, validate_bip32_path, PathMode};

/// The all-zero master fingerprint recorded in PSBT derivation metadata
/// when the actual root fingerprint of a device is unknown.
///
/// This is an explicitly insecure-but-standard placeholder: at least one
/// of the fingerprints embedded in a PSBT must be real for signing to
/// work, but verifiers accept the zero sentinel for the rest.
pub const UNKNOWN_ROOT_FINGERPRINT: [u8; 4] = [0, 0, 0, 0];

/// One signer's derivation metadata for embedding in a PSBT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bip32Derivation {
    /// Fingerprint of the signer's key at `m/`, or
    /// [`UNKNOWN_ROOT_FINGERPRINT`].
    pub master_fingerprint: [u8; 4],
    /// The complete path from the signer's root to the derived pubkey.
    pub path: String,
    /// The derived compressed pubkey bytes.
    pub pubkey: Vec<u8>,
    /// True when `master_fingerprint` is the zero sentinel rather than a
    /// real fingerprint.
    pub fingerprint_is_masked: bool,
}

/// An M-of-N group of extended public keys bound to one unhardened branch
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Braid {
    network: Network,
    address_type: MultisigAddressType,
    extended_public_keys: Vec<ExtendedPublicKey>,
    required_signers: usize,
    index: u32,
}

impl Braid {
    /// Build a braid from its parts, validating every extended public key
    /// against the network and the signer counts against each other.
    pub fn new(
        network: Network,
        address_type: MultisigAddressType,
        extended_public_keys: Vec<ExtendedPublicKey>,
        required_signers: usize,
        index: u32,
    ) -> Result<Self> {
        for xpub in &extended_public_keys {
            let error = validate_extended_public_key(&xpub.base58_string, network);
            if !error.is_empty() {
                return Err(Error::InvalidBraid(error));
            }
        }
        if required_signers == 0 || required_signers > extended_public_keys.len() {
            return Err(Error::InvalidBraid(
                "Can't have more requiredSigners than there are keys.".to_string(),
            ));
        }
        let index_error = validate_bip32_index(&index.to_string(), PathMode::Unhardened);
        if !index_error.is_empty() {
            return Err(Error::InvalidBraid(index_error));
        }
        Ok(Braid {
            network,
            address_type,
            extended_public_keys,
            required_signers,
            index,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn address_type(&self) -> MultisigAddressType {
        self.address_type
    }

    pub fn extended_public_keys(&self) -> &[ExtendedPublicKey] {
        &self.extended_public_keys
    }

    pub fn required_signers(&self) -> usize {
        self.required_signers
    }

    /// The unhardened branch index every path through this braid must
    /// start with.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The braid's wallet-configuration JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild a braid from its wallet-configuration JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let braid: Braid = serde_json::from_str(json)?;
        Braid::new(
            braid.network,
            braid.address_type,
            braid.extended_public_keys,
            braid.required_signers,
            braid.index,
        )
    }
}

/// The braid's wallet-configuration JSON.
pub fn braid_config(braid: &Braid) -> Result<String> {
    braid.to_json()
}

/// Validate that a requested path is derivable from a particular braid:
/// it must be a valid BIP32 path whose first index equals the braid's
/// branch index.
pub fn validate_bip32_path_for_braid(braid: &Braid, path: &str) -> Result<()> {
    let path_error = validate_bip32_path(path, PathMode::Any);
    if !path_error.is_empty() {
        return Err(Error::InvalidPath(path_error));
    }
    let sequence = crate::paths::bip32_path_to_sequence(path)?;
    if sequence.first() != Some(&braid.index()) {
        return Err(Error::PathOutsideBraid(braid.index().to_string()));
    }
    Ok(())
}

fn derive_public_key_objects_at_path(
    braid: &Braid,
    path: &str,
) -> Result<Vec<(String, Bip32Derivation)>> {
    validate_bip32_path_for_braid(braid, path)?;
    let suffix = path.trim_start_matches('m').trim_start_matches('/');
    let mut objects = Vec::with_capacity(braid.extended_public_keys().len());
    for xpub in braid.extended_public_keys() {
        let pubkey = derive_child_public_key(&xpub.base58_string, path, braid.network())?;
        let complete_path = match &xpub.path {
            Some(root) => format!("{}/{}", root, suffix),
            None => format!("m/{}", suffix),
        };
        // It's ok if some of these fingerprints are the sentinel, but at
        // least one must be real or signing won't work. On Coldcard, the
        // real one must match the multisig wallet config file.
        let (master_fingerprint, masked) = match extended_public_key_root_fingerprint(xpub) {
            Some(fingerprint) => {
                let bytes = hex::decode(fingerprint)?;
                ([bytes[0], bytes[1], bytes[2], bytes[3]], false)
            }
            None => (UNKNOWN_ROOT_FINGERPRINT, true),
        };
        objects.push((
            pubkey.clone(),
            Bip32Derivation {
                master_fingerprint,
                path: complete_path,
                pubkey: hex::decode(&pubkey)?,
                fingerprint_is_masked: masked,
            },
        ));
    }
    Ok(objects)
}

/// Returns the braid's pubkeys (compressed hex) at a particular path,
/// sorted ascending by hex value (BIP67). Address determinism depends on
/// this sort, not on the order the keys were configured in.
pub fn generate_public_keys_at_path(braid: &Braid, path: &str) -> Result<Vec<String>> {
    let mut pubkeys: Vec<String> = derive_public_key_objects_at_path(braid, path)?
        .into_iter()
        .map(|(pubkey, _)| pubkey)
        .collect();
    pubkeys.sort();
    Ok(pubkeys)
}

/// Returns the braid's pubkeys at a particular address index under the
/// branch index.
pub fn generate_public_keys_at_index(braid: &Braid, index: u32) -> Result<Vec<String>> {
    generate_public_keys_at_path(braid, &format!("{}/{}", braid.index(), index))
}

/// Returns per-signer derivation metadata at a particular path, in
/// configured key order (not BIP67-sorted).
pub fn generate_bip32_derivation_by_path(braid: &Braid, path: &str) -> Result<Vec<Bip32Derivation>> {
    Ok(derive_public_key_objects_at_path(braid, path)?
        .into_iter()
        .map(|(_, derivation)| derivation)
        .collect())
}

/// Returns per-signer derivation metadata at a particular address index
/// under the branch index.
pub fn generate_bip32_derivation_by_index(
    braid: &Braid,
    index: u32,
) -> Result<Vec<Bip32Derivation>> {
    generate_bip32_derivation_by_path(braid, &format!("{}/{}", braid.index(), index))
}

/// Confirm that a recorded derivation's child pubkey can actually be
/// derived from a global extended public key.
///
/// The relative path is taken from the tail of the derivation's path, so
/// this also works for masked or blinded xpubs whose recorded prefixes do
/// not match.
pub fn is_valid_child_pubkey(
    derivation: &Bip32Derivation,
    global_xpub: &ExtendedPublicKey,
    network: Network,
) -> Result<bool> {
    let global_path = global_xpub.path.as_deref().unwrap_or("m");
    let global_sequence = crate::paths::bip32_path_to_sequence(global_path)?;
    let derivation_sequence = crate::paths::bip32_path_to_sequence(&derivation.path)?;
    if derivation_sequence.len() < global_sequence.len() {
        return Err(Error::InvalidPath(format!(
            "Child key longer than parent: Parent: {}, Child: {}",
            global_path, derivation.path
        )));
    }
    let relative = crate::paths::bip32_sequence_to_path(
        &derivation_sequence[global_sequence.len()..],
    );
    let child_pubkey = derive_child_public_key(&global_xpub.base58_string, &relative, network)?;
    Ok(child_pubkey == hex::encode(&derivation.pubkey))
}

/// Returns a braid-aware [`Multisig`] at a particular path: BIP67-sorted
/// pubkeys plus derivation metadata plus the braid's own configuration for
/// round-tripping.
pub fn derive_multisig_by_path(braid: &Braid, path: &str) -> Result<Multisig> {
    let pubkeys = generate_public_keys_at_path(braid, path)?;
    let bip32_derivation = generate_bip32_derivation_by_path(braid, path)?;
    let refs: Vec<&str> = pubkeys.iter().map(String::as_str).collect();
    let mut multisig = generate_multisig_from_public_keys(
        braid.network(),
        braid.address_type(),
        braid.required_signers(),
        &refs,
    )?;
    multisig.set_braid_details(braid.to_json()?);
    multisig.set_bip32_derivation(bip32_derivation);
    Ok(multisig)
}

/// Returns a braid-aware [`Multisig`] at a particular address index under
/// the branch index.
pub fn derive_multisig_by_index(braid: &Braid, index: u32) -> Result<Multisig> {
    derive_multisig_by_path(braid, &format!("{}/{}", braid.index(), index))
}
