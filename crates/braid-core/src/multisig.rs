//! M-of-N multisig script generation and introspection.
//!
//! A [`Multisig`] pins down a unique bitcoin multisig address: N public
//! keys, the number of required signers M, the address type, and the
//! network. Public keys are always held in ascending lexicographic order
//! of their compressed hex encoding (BIP67), so two callers supplying the
//! same key set in different orders produce the identical address and
//! scripts.
//!
//! The address-type variant is an explicit tag fixed at construction and
//! carried alongside the script data; it is never re-inferred from script
//! shape or address prefix.

use std::str::FromStr;

use bitcoin::blockdata::opcodes::all::OP_CHECKMULTISIG;
use bitcoin::blockdata::script::Builder;
use bitcoin::script::Instruction;
use bitcoin::{Address, PublicKey, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::braid::Bip32Derivation;
use crate::error::{Error, Result};
use crate::networks::{network_data, Network};

/// The multisig address types this library can generate and spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultisigAddressType {
    /// Legacy pay-to-script-hash.
    #[serde(rename = "P2SH")]
    P2sh,
    /// P2SH-wrapped pay-to-witness-script-hash.
    #[serde(rename = "P2SH-P2WSH")]
    P2shP2wsh,
    /// Native segwit pay-to-witness-script-hash.
    #[serde(rename = "P2WSH")]
    P2wsh,
}

impl std::fmt::Display for MultisigAddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            MultisigAddressType::P2sh => "P2SH",
            MultisigAddressType::P2shP2wsh => "P2SH-P2WSH",
            MultisigAddressType::P2wsh => "P2WSH",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for MultisigAddressType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "P2SH" => Ok(MultisigAddressType::P2sh),
            "P2SH-P2WSH" => Ok(MultisigAddressType::P2shP2wsh),
            "P2WSH" => Ok(MultisigAddressType::P2wsh),
            _ => Err(Error::InvalidMultisigScript(format!(
                "unknown address type {}",
                s
            ))),
        }
    }
}

/// An M-of-N multisig address together with the scripts that spend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multisig {
    network: Network,
    address_type: MultisigAddressType,
    required_signers: usize,
    /// Compressed pubkey hex in script (BIP67) order.
    public_keys: Vec<String>,
    /// The bare `OP_M <pk...> OP_N OP_CHECKMULTISIG` script.
    script: ScriptBuf,
    redeem_script: Option<ScriptBuf>,
    witness_script: Option<ScriptBuf>,
    address: String,
    braid_details: Option<String>,
    bip32_derivation: Option<Vec<Bip32Derivation>>,
}

impl Multisig {
    /// The network this multisig address lives on.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The address-type tag fixed at construction.
    pub fn address_type(&self) -> MultisigAddressType {
        self.address_type
    }

    /// The number of required signers, M.
    pub fn required_signers(&self) -> usize {
        self.required_signers
    }

    /// The number of total signers (public keys), N.
    pub fn total_signers(&self) -> usize {
        self.public_keys.len()
    }

    /// The bare multisig script: redeem script for P2SH, witness script
    /// for the segwit types.
    pub fn script(&self) -> &ScriptBuf {
        &self.script
    }

    /// The redeem script, or `None` for P2WSH.
    pub fn redeem_script(&self) -> Option<&ScriptBuf> {
        self.redeem_script.as_ref()
    }

    /// The witness script, or `None` for P2SH.
    pub fn witness_script(&self) -> Option<&ScriptBuf> {
        self.witness_script.as_ref()
    }

    /// The compressed public keys in hex, in script (BIP67) order.
    pub fn public_keys(&self) -> &[String] {
        &self.public_keys
    }

    /// The multisig address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The braid configuration JSON this multisig was derived from, if
    /// known.
    pub fn braid_details(&self) -> Option<&str> {
        self.braid_details.as_deref()
    }

    /// Per-signer BIP32 derivation metadata, if known.
    pub fn bip32_derivation(&self) -> Option<&[Bip32Derivation]> {
        self.bip32_derivation.as_deref()
    }

    pub(crate) fn set_braid_details(&mut self, details: String) {
        self.braid_details = Some(details);
    }

    pub(crate) fn set_bip32_derivation(&mut self, derivation: Vec<Bip32Derivation>) {
        self.bip32_derivation = Some(derivation);
    }
}

fn bare_multisig_script(required_signers: usize, public_keys: &[PublicKey]) -> Result<ScriptBuf> {
    if public_keys.is_empty() || required_signers == 0 || required_signers > public_keys.len() {
        return Err(Error::InvalidMultisigScript(format!(
            "cannot build a {}-of-{} multisig",
            required_signers,
            public_keys.len()
        )));
    }
    if public_keys.len() > 16 {
        return Err(Error::InvalidMultisigScript(
            "more than 16 public keys".to_string(),
        ));
    }
    let mut builder = Builder::new().push_int(required_signers as i64);
    for key in public_keys {
        builder = builder.push_key(key);
    }
    Ok(builder
        .push_int(public_keys.len() as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script())
}

fn wrap_multisig(
    network: Network,
    address_type: MultisigAddressType,
    required_signers: usize,
    sorted_keys: Vec<String>,
    script: ScriptBuf,
) -> Result<Multisig> {
    let bitcoin_network = network_data(network);
    let (address, redeem_script, witness_script) = match address_type {
        MultisigAddressType::P2sh => {
            let address = Address::p2sh(&script, bitcoin_network)
                .map_err(|e| Error::InvalidMultisigScript(e.to_string()))?;
            (address, Some(script.clone()), None)
        }
        MultisigAddressType::P2shP2wsh => {
            let wrapper = script.to_p2wsh();
            let address = Address::p2sh(&wrapper, bitcoin_network)
                .map_err(|e| Error::InvalidMultisigScript(e.to_string()))?;
            (address, Some(wrapper), Some(script.clone()))
        }
        MultisigAddressType::P2wsh => {
            let address = Address::p2wsh(&script, bitcoin_network);
            (address, None, Some(script.clone()))
        }
    };
    Ok(Multisig {
        network,
        address_type,
        required_signers,
        public_keys: sorted_keys,
        script,
        redeem_script,
        witness_script,
        address: address.to_string(),
        braid_details: None,
        bip32_derivation: None,
    })
}

/// Build an M-of-N [`Multisig`] from compressed public key hex strings.
///
/// The keys are BIP67-sorted before script construction, so the result is
/// invariant under permutation of the inputs.
pub fn generate_multisig_from_public_keys(
    network: Network,
    address_type: MultisigAddressType,
    required_signers: usize,
    public_keys: &[&str],
) -> Result<Multisig> {
    let mut sorted: Vec<String> = public_keys.iter().map(|k| k.to_lowercase()).collect();
    sorted.sort();
    let keys = sorted
        .iter()
        .map(|k| {
            PublicKey::from_str(k).map_err(|e| Error::InvalidPublicKey(format!("{}: {}", k, e)))
        })
        .collect::<Result<Vec<PublicKey>>>()?;
    let script = bare_multisig_script(required_signers, &keys)?;
    wrap_multisig(network, address_type, required_signers, sorted, script)
}

/// Build an M-of-N [`Multisig`] from a bare multisig script in hex.
///
/// For `P2SH` the hex is the redeem script; for the segwit types it is
/// the witness script.
pub fn generate_multisig_from_hex(
    network: Network,
    address_type: MultisigAddressType,
    multisig_script_hex: &str,
) -> Result<Multisig> {
    let script = ScriptBuf::from(hex::decode(multisig_script_hex)?);
    let (required_signers, public_keys) = parse_multisig_script(&script)?;
    wrap_multisig(network, address_type, required_signers, public_keys, script)
}

/// Recover (M, pubkeys-in-script-order) from a bare multisig script.
fn parse_multisig_script(script: &ScriptBuf) -> Result<(usize, Vec<String>)> {
    let invalid = |msg: &str| Error::InvalidMultisigScript(msg.to_string());
    let mut instructions = Vec::new();
    for instruction in script.instructions() {
        instructions.push(instruction.map_err(|e| invalid(&e.to_string()))?);
    }
    if instructions.len() < 4 {
        return Err(invalid("too few script elements"));
    }
    let small_num = |instruction: &Instruction| -> Option<usize> {
        match instruction {
            Instruction::Op(op) => {
                let code = op.to_u8();
                (0x51..=0x60).contains(&code).then(|| (code - 0x50) as usize)
            }
            _ => None,
        }
    };
    let m = small_num(&instructions[0]).ok_or_else(|| invalid("missing OP_M"))?;
    let n = small_num(&instructions[instructions.len() - 2])
        .ok_or_else(|| invalid("missing OP_N"))?;
    match instructions.last() {
        Some(Instruction::Op(op)) if *op == OP_CHECKMULTISIG => {}
        _ => return Err(invalid("missing OP_CHECKMULTISIG")),
    }
    let key_instructions = &instructions[1..instructions.len() - 2];
    if key_instructions.len() != n || m > n {
        return Err(invalid("key count does not match OP_N"));
    }
    let mut public_keys = Vec::with_capacity(n);
    for instruction in key_instructions {
        match instruction {
            Instruction::PushBytes(bytes) => {
                let key_hex = hex::encode(bytes.as_bytes());
                if PublicKey::from_str(&key_hex).is_err() {
                    return Err(invalid("invalid public key in script"));
                }
                public_keys.push(key_hex);
            }
            _ => return Err(invalid("expected public key push")),
        }
    }
    Ok((m, public_keys))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY_A: &str = "021a0b6eb37bd9d2767a364601e41635a11c1dbbbb601efab8406281e210336ace";
    const PUBKEY_B: &str = "03b32dc780fba98db25b4b72cf2b69da228f5e10ca6aa8f46eabe7f9fe22c994ee";

    #[test]
    fn test_permutation_invariance() {
        for address_type in [
            MultisigAddressType::P2sh,
            MultisigAddressType::P2shP2wsh,
            MultisigAddressType::P2wsh,
        ] {
            let forward = generate_multisig_from_public_keys(
                Network::Mainnet,
                address_type,
                2,
                &[PUBKEY_A, PUBKEY_B],
            )
            .unwrap();
            let reversed = generate_multisig_from_public_keys(
                Network::Mainnet,
                address_type,
                2,
                &[PUBKEY_B, PUBKEY_A],
            )
            .unwrap();
            assert_eq!(forward, reversed);
            assert_eq!(forward.public_keys(), &[PUBKEY_A, PUBKEY_B]);
        }
    }

    #[test]
    fn test_p2sh_scripts() {
        let multisig = generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2sh,
            2,
            &[PUBKEY_A, PUBKEY_B],
        )
        .unwrap();
        assert_eq!(multisig.address_type(), MultisigAddressType::P2sh);
        assert_eq!(multisig.required_signers(), 2);
        assert_eq!(multisig.total_signers(), 2);
        assert_eq!(multisig.redeem_script(), Some(multisig.script()));
        assert!(multisig.witness_script().is_none());
        assert!(multisig.address().starts_with('3'));
    }

    #[test]
    fn test_p2wsh_scripts() {
        let multisig = generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2wsh,
            2,
            &[PUBKEY_A, PUBKEY_B],
        )
        .unwrap();
        assert!(multisig.redeem_script().is_none());
        assert_eq!(multisig.witness_script(), Some(multisig.script()));
        assert!(multisig.address().starts_with("bc1"));
    }

    #[test]
    fn test_p2sh_p2wsh_scripts() {
        let multisig = generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2shP2wsh,
            2,
            &[PUBKEY_A, PUBKEY_B],
        )
        .unwrap();
        // Both scripts exist: the witness script inside, the P2WSH wrapper
        // outside.
        assert_eq!(multisig.witness_script(), Some(multisig.script()));
        let redeem = multisig.redeem_script().unwrap();
        assert_eq!(redeem, &multisig.script().to_p2wsh());
        assert!(multisig.address().starts_with('3'));
    }

    #[test]
    fn test_generate_from_hex_round_trip() {
        let multisig = generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2wsh,
            2,
            &[PUBKEY_A, PUBKEY_B],
        )
        .unwrap();
        let script_hex = hex::encode(multisig.script().as_bytes());
        let rebuilt =
            generate_multisig_from_hex(Network::Mainnet, MultisigAddressType::P2wsh, &script_hex)
                .unwrap();
        assert_eq!(rebuilt.address(), multisig.address());
        assert_eq!(rebuilt.public_keys(), multisig.public_keys());
        assert_eq!(rebuilt.required_signers(), 2);
    }

    #[test]
    fn test_invalid_configurations() {
        assert!(generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2sh,
            3,
            &[PUBKEY_A, PUBKEY_B],
        )
        .is_err());
        assert!(generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2sh,
            0,
            &[PUBKEY_A],
        )
        .is_err());
        assert!(generate_multisig_from_public_keys(
            Network::Mainnet,
            MultisigAddressType::P2sh,
            1,
            &["deadbeef"],
        )
        .is_err());
    }

    #[test]
    fn test_address_type_display_round_trip() {
        for (address_type, name) in [
            (MultisigAddressType::P2sh, "P2SH"),
            (MultisigAddressType::P2shP2wsh, "P2SH-P2WSH"),
            (MultisigAddressType::P2wsh, "P2WSH"),
        ] {
            assert_eq!(address_type.to_string(), name);
            assert_eq!(name.parse::<MultisigAddressType>().unwrap(), address_type);
        }
    }
}
