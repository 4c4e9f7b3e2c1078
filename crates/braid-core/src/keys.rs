//! Validation, encoding, and derivation of public keys and extended
//! public keys.
//!
//! The extended public key codec implements the BIP32 serialization
//! directly:
//! `[ version ][ depth ][ parent fingerprint ][ key index ][ chain code ][ pubkey ]`

use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpub};
use secp256k1::Secp256k1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::networks::{network_data, Network};
use crate::paths::{bip32_path_to_sequence, validate_bip32_path, PathMode};
use crate::utils::{hash160_digest, validate_hex};

/// Version bytes (hex) for every known extended public key prefix.
pub const EXTENDED_PUBLIC_KEY_VERSIONS: [(&str, &str); 10] = [
    ("xpub", "0488b21e"),
    ("ypub", "049d7cb2"),
    ("zpub", "04b24746"),
    ("Ypub", "0295b43f"),
    ("Zpub", "02aa7ed3"),
    ("tpub", "043587cf"),
    ("upub", "044a5262"),
    ("vpub", "045f1cf6"),
    ("Upub", "024289ef"),
    ("Vpub", "02575483"),
];

fn version_for_prefix(prefix: &str) -> Option<[u8; 4]> {
    EXTENDED_PUBLIC_KEY_VERSIONS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, hex_version)| {
            let bytes = hex::decode(hex_version).expect("static version table");
            [bytes[0], bytes[1], bytes[2], bytes[3]]
        })
}

fn version_for_network(network: Network) -> String {
    match network {
        Network::Mainnet => "0488b21e".to_string(),
        _ => "043587cf".to_string(),
    }
}

/// Validate whether or not a string is a known extended public key prefix.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    if version_for_prefix(prefix).is_some() {
        Ok(())
    } else {
        Err(Error::InvalidPrefix(prefix.to_string()))
    }
}

/// Validate a root fingerprint: eight characters of hex.
pub fn validate_root_fingerprint(root_fingerprint: &str) -> Result<()> {
    if root_fingerprint.len() != 8 {
        return Err(Error::InvalidRootFingerprint(
            "Expected hex value of length 8".to_string(),
        ));
    }
    let hex_error = validate_hex(root_fingerprint);
    if !hex_error.is_empty() {
        return Err(Error::InvalidRootFingerprint(
            "Root fingerprint must be valid hex".to_string(),
        ));
    }
    Ok(())
}

/// An extended public key and the metadata needed to rebuild or derive
/// from it.
///
/// The pubkey is always stored compressed; the chaincode is exactly 32
/// bytes of hex; the base58 string is derived from the other fields, never
/// hand-edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPublicKey {
    /// Version bytes as hex, e.g. "0488b21e" for an xpub.
    pub version: String,
    pub depth: u8,
    pub parent_fingerprint: u32,
    pub index: u32,
    /// 32-byte chain code as hex.
    pub chaincode: String,
    /// 33-byte compressed public key as hex.
    pub pubkey: String,
    pub network: Network,
    /// The BIP32 path this key was derived at, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Fingerprint of the key at `m/` on the originating device, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_fingerprint: Option<String>,
    /// Cached base58check rendering of the key.
    pub base58_string: String,
}

impl ExtendedPublicKey {
    /// Build an extended public key from the information known about a
    /// BIP32 wallet node.
    pub fn from_origin(
        bip32_path: &str,
        pubkey: &str,
        chaincode: &str,
        parent_fingerprint: u32,
        network: Network,
    ) -> Result<Self> {
        let path_error = validate_bip32_path(bip32_path, PathMode::Any);
        if !path_error.is_empty() {
            return Err(Error::InvalidPath(path_error));
        }
        let sequence = bip32_path_to_sequence(bip32_path)?;
        let depth = sequence.len() as u8;
        let index = sequence.last().copied().unwrap_or(0);

        let pubkey_error = validate_public_key(pubkey, None);
        if !pubkey_error.is_empty() {
            return Err(Error::InvalidPublicKey(pubkey_error));
        }
        let pubkey = if is_key_compressed(pubkey) {
            pubkey.to_string()
        } else {
            compress_public_key(pubkey)?
        };

        if chaincode.len() != 64 {
            return Err(Error::InvalidExtendedPublicKey(
                "xpub derivation requires 32-byte chaincode".to_string(),
            ));
        }
        let chaincode_error = validate_hex(chaincode);
        if !chaincode_error.is_empty() {
            return Err(Error::InvalidExtendedPublicKey(chaincode_error));
        }

        let mut xpub = ExtendedPublicKey {
            version: version_for_network(network),
            depth,
            parent_fingerprint,
            index,
            chaincode: chaincode.to_lowercase(),
            pubkey: pubkey.to_lowercase(),
            network,
            path: Some(bip32_path.to_string()),
            root_fingerprint: None,
            base58_string: String::new(),
        };
        xpub.base58_string = xpub.to_base58();
        Ok(xpub)
    }

    /// Decode the BIP32 binary serialization of an extended public key.
    pub fn read(data: &[u8]) -> Result<Self> {
        if data.len() != 78 {
            return Err(Error::InvalidExtendedPublicKey(format!(
                "expected 78 bytes, got {}",
                data.len()
            )));
        }
        let version = hex::encode(&data[0..4]);
        let network = match version.as_str() {
            "0488b21e" => Network::Mainnet,
            "043587cf" => Network::Testnet,
            _ => {
                return Err(Error::InvalidExtendedPublicKey(format!(
                    "unknown version bytes {}",
                    version
                )))
            }
        };
        let pubkey = hex::encode(&data[45..78]);
        if !is_key_compressed(&pubkey) {
            return Err(Error::InvalidExtendedPublicKey(
                "pubkey must be compressed".to_string(),
            ));
        }
        secp256k1::PublicKey::from_slice(&data[45..78])?;
        let mut xpub = ExtendedPublicKey {
            version,
            depth: data[4],
            parent_fingerprint: u32::from_be_bytes([data[5], data[6], data[7], data[8]]),
            index: u32::from_be_bytes([data[9], data[10], data[11], data[12]]),
            chaincode: hex::encode(&data[13..45]),
            pubkey,
            network,
            path: None,
            root_fingerprint: None,
            base58_string: String::new(),
        };
        xpub.base58_string = xpub.to_base58();
        Ok(xpub)
    }

    /// Encode this extended public key in the BIP32 binary serialization.
    pub fn write(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(78);
        data.extend_from_slice(&hex::decode(&self.version).expect("version is valid hex"));
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint.to_be_bytes());
        data.extend_from_slice(&self.index.to_be_bytes());
        data.extend_from_slice(&hex::decode(&self.chaincode).expect("chaincode is valid hex"));
        data.extend_from_slice(&hex::decode(&self.pubkey).expect("pubkey is valid hex"));
        data
    }

    /// Return the base58check-encoded extended public key.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.write()).with_check().into_string()
    }

    /// Parse a base58check-encoded extended public key.
    pub fn from_base58(data: &str) -> Result<Self> {
        let raw = bs58::decode(data.trim()).with_check(None).into_vec()?;
        Self::read(&raw)
    }

    /// Update the network, switching the version bytes used when encoding.
    pub fn set_network(&mut self, network: Network) {
        self.network = network;
        self.version = version_for_network(network);
        self.base58_string = self.to_base58();
    }

    /// Record the BIP32 path this key lives at.
    pub fn set_bip32_path(&mut self, bip32_path: &str) -> Result<()> {
        let path_error = validate_bip32_path(bip32_path, PathMode::Any);
        if !path_error.is_empty() {
            return Err(Error::InvalidPath(path_error));
        }
        self.path = Some(bip32_path.to_string());
        Ok(())
    }

    /// Record the fingerprint of the key at `m/` on the originating device.
    pub fn set_root_fingerprint(&mut self, root_fingerprint: &str) -> Result<()> {
        validate_root_fingerprint(root_fingerprint)?;
        self.root_fingerprint = Some(root_fingerprint.to_string());
        Ok(())
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base58(s)
    }
}

impl std::fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.base58_string)
    }
}

/// Convert an extended public key between prefix formats, e.g. xpub to
/// tpub.
pub fn convert_extended_public_key(extended_public_key: &str, target_prefix: &str) -> Result<String> {
    validate_prefix(target_prefix)?;
    let source_prefix: String = extended_public_key.chars().take(4).collect();
    validate_prefix(&source_prefix)?;
    let decoded = bs58::decode(extended_public_key.trim())
        .with_check(None)
        .into_vec()?;
    if decoded.len() < 5 {
        return Err(Error::InvalidExtendedPublicKey(
            "Extended public key is too short.".to_string(),
        ));
    }
    let version = version_for_prefix(target_prefix).expect("prefix already validated");
    let mut converted = version.to_vec();
    converted.extend_from_slice(&decoded[4..]);
    Ok(bs58::encode(converted).with_check().into_string())
}

/// Check that an extended public key carries the correct prefix for the
/// network. Returns an empty string when valid.
pub fn validate_extended_public_key_for_network(
    extended_public_key: &str,
    network: Network,
) -> String {
    let mut required_prefix = String::from("'xpub'");
    let requires_tpub = matches!(
        network,
        Network::Testnet | Network::Regtest | Network::Signet
    );
    if requires_tpub {
        required_prefix.push_str(" or 'tpub'");
    }
    let prefix: String = extended_public_key.chars().take(4).collect();
    if (network == Network::Mainnet && prefix != "xpub") || (requires_tpub && prefix != "tpub") {
        return format!("Extended public key must begin with {}.", required_prefix);
    }
    String::new()
}

/// Validate the given extended public key for the given network.
///
/// Must carry the appropriate network-dependent prefix and parse as a
/// valid BIP32 extended public key. Returns an empty string when valid.
pub fn validate_extended_public_key(xpub_string: &str, network: Network) -> String {
    if xpub_string.is_empty() {
        return "Extended public key cannot be blank.".to_string();
    }
    if xpub_string.len() < 4 {
        return format!(
            "Invalid extended public key. Value {} is too short",
            xpub_string
        );
    }
    let prefix_error = validate_extended_public_key_for_network(xpub_string, network);
    if !prefix_error.is_empty() {
        return prefix_error;
    }
    if xpub_string.len() < 111 {
        return "Extended public key is too short.".to_string();
    }
    match ExtendedPublicKey::from_base58(xpub_string) {
        Ok(_) => String::new(),
        Err(_) => "Invalid extended public key.".to_string(),
    }
}

/// Validate the given public key hex.
///
/// Must be valid hex and parse as a point on the curve. When an address
/// type is given, uncompressed keys are rejected for the segwit types.
/// Returns an empty string when valid.
pub fn validate_public_key(pubkey_hex: &str, address_type: Option<&str>) -> String {
    if pubkey_hex.is_empty() {
        return "Public key cannot be blank.".to_string();
    }
    let hex_error = validate_hex(pubkey_hex);
    if !hex_error.is_empty() {
        return hex_error;
    }
    let bytes = hex::decode(pubkey_hex).expect("hex already validated");
    if secp256k1::PublicKey::from_slice(&bytes).is_err() {
        return "Invalid public key.".to_string();
    }
    if !is_key_compressed(pubkey_hex) {
        if let Some(address_type) = address_type {
            if address_type == "P2SH-P2WSH" || address_type == "P2WSH" {
                return format!("{} does not support uncompressed public keys.", address_type);
            }
        }
    }
    String::new()
}

/// Check if a given pubkey hex is compressed by its length and prefix.
pub fn is_key_compressed(pubkey: &str) -> bool {
    pubkey.len() == 66 && (pubkey.starts_with("02") || pubkey.starts_with("03"))
}

/// Compress the given public key. Compressed input is returned unchanged.
pub fn compress_public_key(pubkey_hex: &str) -> Result<String> {
    if is_key_compressed(pubkey_hex) {
        return Ok(pubkey_hex.to_lowercase());
    }
    let bytes = hex::decode(pubkey_hex)?;
    if bytes.len() != 65 {
        return Err(Error::InvalidPublicKey(pubkey_hex.to_string()));
    }
    // The parity of the y coordinate picks the prefix byte.
    let prefix = if bytes[64] & 1 != 0 { 0x03 } else { 0x02 };
    let mut compressed = vec![prefix];
    compressed.extend_from_slice(&bytes[1..33]);
    Ok(hex::encode(compressed))
}

/// Get the BIP32 fingerprint for a given pubkey: the first four bytes of
/// its hash160, as a big-endian integer. Uncompressed keys are compressed
/// first.
pub fn fingerprint_from_public_key(pubkey_hex: &str) -> Result<u32> {
    let compressed = if is_key_compressed(pubkey_hex) {
        pubkey_hex.to_string()
    } else {
        compress_public_key(pubkey_hex)?
    };
    let digest = hash160_digest(&hex::decode(compressed)?);
    Ok(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// Render a fingerprint as a zero-padded, eight-character hex string.
pub fn fingerprint_to_fixed_length_hex(fingerprint: u32) -> String {
    format!("{:08x}", fingerprint)
}

/// Returns the root fingerprint of the extended public key, when known.
pub fn extended_public_key_root_fingerprint(xpub: &ExtendedPublicKey) -> Option<&str> {
    xpub.root_fingerprint.as_deref()
}

/// Derive a base58-encoded xpub given known information about a BIP32
/// wallet node.
pub fn derive_extended_public_key(
    bip32_path: &str,
    pubkey: &str,
    chaincode: &str,
    parent_fingerprint: u32,
    network: Network,
) -> Result<String> {
    let xpub = ExtendedPublicKey::from_origin(bip32_path, pubkey, chaincode, parent_fingerprint, network)?;
    Ok(xpub.to_base58())
}

fn derive_child_node(
    extended_public_key: &str,
    bip32_path: &str,
    network: Network,
) -> Result<Xpub> {
    let path_error = validate_bip32_path(bip32_path, PathMode::Unhardened);
    if !path_error.is_empty() {
        return Err(Error::InvalidPath(path_error));
    }
    let relative = bip32_path.trim_start_matches('m').trim_start_matches('/');
    // Derivation itself is delegated to the bip32 implementation of the
    // bitcoin crate.
    let node = Xpub::from_str(extended_public_key).map_err(Error::Bip32)?;
    if node.network != bitcoin::NetworkKind::from(network_data(network)) {
        return Err(Error::InvalidExtendedPublicKey(format!(
            "extended public key is not valid for {}",
            network
        )));
    }
    let path = if relative.is_empty() {
        DerivationPath::master()
    } else {
        DerivationPath::from_str(&format!("m/{}", relative)).map_err(Error::Bip32)?
    };
    let secp = Secp256k1::verification_only();
    Ok(node.derive_pub(&secp, &path)?)
}

/// Return the compressed public key (hex) at the given BIP32 path below
/// the given extended public key. The path may carry or omit the initial
/// `m/`.
pub fn derive_child_public_key(
    extended_public_key: &str,
    bip32_path: &str,
    network: Network,
) -> Result<String> {
    let child = derive_child_node(extended_public_key, bip32_path, network)?;
    Ok(hex::encode(child.public_key.serialize()))
}

/// Return the extended public key (base58) at the given BIP32 path below
/// the given extended public key.
pub fn derive_child_extended_public_key(
    extended_public_key: &str,
    bip32_path: &str,
    network: Network,
) -> Result<String> {
    let child = derive_child_node(extended_public_key, bip32_path, network)?;
    Ok(child.to_string())
}

/// Sentinel matched (case-insensitively) against recorded bip32 paths to
/// detect a path the coordinator does not actually know.
pub const DEFAULT_UNKNOWN_PATH_SENTINEL: &str = "unknown";

/// When the recorded path for an xpub is marked unknown, return a masked
/// `m/0/0/.../0` path of the key's recorded depth rather than asserting a
/// false derivation path; otherwise return the path unchanged.
pub fn masked_derivation(xpub: &str, bip32_path: &str, to_mask: Option<&str>) -> Result<String> {
    let sentinel = to_mask.unwrap_or(DEFAULT_UNKNOWN_PATH_SENTINEL).to_lowercase();
    let unknown = bip32_path.to_lowercase().contains(&sentinel);
    if !unknown {
        return Ok(bip32_path.to_string());
    }
    let depth = ExtendedPublicKey::from_base58(xpub)?.depth as usize;
    Ok(format!("m{}", "/0".repeat(depth)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_XPUB: &str = "xpub6CCHViYn5VzKFqrKjAzSSqP8XXSU5fEC6ZYSncX5pvSKoRLrPDcF8cEaZkrQvvnuwRUXeKVjoGmAqvbwVkNBFLaRiqcdVhWPyuShUrbcZsv";
    const VALID_TPUB: &str = "tpubDCZv1xNTnmwmXe3BBMyXekiVreY853jFeC8k9AaEAqCDYi1ZTSTLH3uQonwCTRk9jL1SFu1cLNbDY76YtcDR8n2inSMwBEAdZs37EpYS9px";
    const COMPRESSED: &str = "03b32dc780fba98db25b4b72cf2b69da228f5e10ca6aa8f46eabe7f9fe22c994ee";
    const UNCOMPRESSED: &str = "04b32dc780fba98db25b4b72cf2b69da228f5e10ca6aa8f46eabe7f9fe22c994ee6e43c09d025c2ad322382347ec0f69b4e78d8e23c8ff9aa0dd0cb93665ae83d5";

    #[test]
    fn test_base58_round_trip() {
        let xpub = ExtendedPublicKey::from_base58(VALID_XPUB).unwrap();
        assert_eq!(xpub.to_base58(), VALID_XPUB);
        assert_eq!(xpub.base58_string, VALID_XPUB);
        assert_eq!(xpub.network, Network::Mainnet);
        assert_eq!(xpub.depth, 3);
    }

    #[test]
    fn test_binary_round_trip() {
        let xpub = ExtendedPublicKey::from_base58(VALID_XPUB).unwrap();
        let bytes = xpub.write();
        assert_eq!(bytes.len(), 78);
        let decoded = ExtendedPublicKey::read(&bytes).unwrap();
        assert_eq!(decoded, xpub);
    }

    #[test]
    fn test_validate_extended_public_key() {
        assert!(validate_extended_public_key("", Network::Testnet).contains("cannot be blank"));
        assert!(validate_extended_public_key("foobar", Network::Testnet).contains("must begin with"));
        assert!(validate_extended_public_key(VALID_TPUB, Network::Mainnet).contains("must begin with"));
        assert!(validate_extended_public_key(VALID_XPUB, Network::Testnet).contains("must begin with"));
        assert!(validate_extended_public_key("xpub123", Network::Mainnet).contains("is too short"));
        assert_eq!(
            validate_extended_public_key(&VALID_XPUB.replace('n', "p"), Network::Mainnet),
            "Invalid extended public key."
        );
        assert_eq!(validate_extended_public_key(VALID_XPUB, Network::Mainnet), "");
        assert_eq!(validate_extended_public_key(VALID_TPUB, Network::Testnet), "");
        assert_eq!(validate_extended_public_key(VALID_TPUB, Network::Regtest), "");
    }

    #[test]
    fn test_validate_public_key() {
        assert_eq!(validate_public_key("", None), "Public key cannot be blank.");
        assert_eq!(
            validate_public_key("zzzz", None),
            "Invalid hex: only characters a-f, A-F and 0-9 allowed."
        );
        assert_eq!(validate_public_key("deadbeef", None), "Invalid public key.");
        assert_eq!(validate_public_key(COMPRESSED, None), "");
        assert_eq!(validate_public_key(UNCOMPRESSED, None), "");
        assert_eq!(validate_public_key(UNCOMPRESSED, Some("P2SH")), "");
        assert_eq!(
            validate_public_key(UNCOMPRESSED, Some("P2WSH")),
            "P2WSH does not support uncompressed public keys."
        );
        assert_eq!(
            validate_public_key(UNCOMPRESSED, Some("P2SH-P2WSH")),
            "P2SH-P2WSH does not support uncompressed public keys."
        );
    }

    #[test]
    fn test_compress_public_key() {
        assert_eq!(compress_public_key(UNCOMPRESSED).unwrap(), COMPRESSED);
        assert_eq!(compress_public_key(COMPRESSED).unwrap(), COMPRESSED);
    }

    #[test]
    fn test_is_key_compressed() {
        assert!(is_key_compressed(COMPRESSED));
        assert!(!is_key_compressed(UNCOMPRESSED));
    }

    #[test]
    fn test_fingerprint_from_public_key() {
        assert_eq!(fingerprint_from_public_key(COMPRESSED).unwrap(), 724365675);
    }

    #[test]
    fn test_fingerprint_to_fixed_length_hex() {
        assert_eq!(fingerprint_to_fixed_length_hex(724365675), "2b2cf16b");
        assert_eq!(fingerprint_to_fixed_length_hex(3000000000), "b2d05e00");
    }

    #[test]
    fn test_derive_child_public_key() {
        assert_eq!(
            derive_child_public_key(VALID_XPUB, "m/0", Network::Mainnet).unwrap(),
            COMPRESSED
        );
        // Works without the leading m/ as well.
        assert_eq!(
            derive_child_public_key(VALID_XPUB, "0", Network::Mainnet).unwrap(),
            COMPRESSED
        );
        assert!(derive_child_public_key(VALID_XPUB, "m/0'", Network::Mainnet).is_err());
    }

    #[test]
    fn test_derive_child_extended_public_key() {
        assert_eq!(
            derive_child_extended_public_key(VALID_XPUB, "m/0/0", Network::Mainnet).unwrap(),
            "xpub6FjSpitFpSJB9BpSVwp3eJzhpaQFLbLefD1f3qaGRmok2Z2FDeSNsy5CL9TLwM3HpcV2kAyTNf2W1uUXs1jbeXGWjdWnsaqnUQ9PyWAYVhQ"
        );
    }

    #[test]
    fn test_convert_extended_public_key() {
        assert_eq!(
            convert_extended_public_key(VALID_XPUB, "tpub").unwrap(),
            VALID_TPUB
        );
        assert_eq!(
            convert_extended_public_key(VALID_TPUB, "xpub").unwrap(),
            VALID_XPUB
        );
        assert!(convert_extended_public_key(VALID_XPUB, "qpub").is_err());
    }

    #[test]
    fn test_masked_derivation() {
        assert_eq!(
            masked_derivation(VALID_XPUB, "m/0", None).unwrap(),
            "m/0"
        );
        assert_eq!(
            masked_derivation(VALID_XPUB, "Unknown", None).unwrap(),
            "m/0/0/0"
        );
        assert_eq!(
            masked_derivation(VALID_XPUB, "m/45'/0/unknown", None).unwrap(),
            "m/0/0/0"
        );
        assert_eq!(
            masked_derivation(VALID_XPUB, "mystery path", Some("mystery")).unwrap(),
            "m/0/0/0"
        );
    }

    #[test]
    fn test_from_origin() {
        let xpub = ExtendedPublicKey::from_origin(
            "m/0",
            COMPRESSED,
            "0000000000000000000000000000000000000000000000000000000000000000",
            0,
            Network::Mainnet,
        )
        .unwrap();
        assert!(xpub.to_base58().starts_with("xpub"));
        assert_eq!(xpub.depth, 1);
        assert_eq!(xpub.index, 0);
    }

    #[test]
    fn test_set_network_switches_version() {
        let mut xpub = ExtendedPublicKey::from_base58(VALID_XPUB).unwrap();
        xpub.set_network(Network::Testnet);
        assert_eq!(xpub.to_base58(), VALID_TPUB);
    }

    #[test]
    fn test_root_fingerprint() {
        let mut xpub = ExtendedPublicKey::from_base58(VALID_XPUB).unwrap();
        assert!(extended_public_key_root_fingerprint(&xpub).is_none());
        xpub.set_root_fingerprint("f57ec65d").unwrap();
        assert_eq!(extended_public_key_root_fingerprint(&xpub), Some("f57ec65d"));
        assert!(xpub.set_root_fingerprint("xyz").is_err());
    }
}
