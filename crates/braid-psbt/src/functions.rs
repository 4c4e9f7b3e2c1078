//! Helpers shared by the PSBT engine: text-encoding detection and
//! derivation-path encoding.

use base64::Engine;
use braid_core::paths::{bip32_path_to_sequence, validate_bip32_path, PathMode};
use braid_core::utils::{valid_base64, validate_hex};

use crate::constants::{PSBT_MAGIC_B64, PSBT_MAGIC_HEX};
use crate::error::{Error, Result};

/// Decode a PSBT presented as text into raw bytes.
///
/// Hex and base64 are auto-detected by their magic-byte prefixes
/// (`70736274ff` and `cHNidP8`).
pub fn bufferize(psbt: &str) -> Result<Vec<u8>> {
    if psbt.to_lowercase().starts_with(PSBT_MAGIC_HEX) && validate_hex(psbt).is_empty() {
        return Ok(hex::decode(psbt)?);
    }
    if psbt.starts_with(PSBT_MAGIC_B64) && valid_base64(psbt) {
        return base64::engine::general_purpose::STANDARD
            .decode(psbt)
            .map_err(|_| Error::NotBufferizable);
    }
    Err(Error::NotBufferizable)
}

/// Encode a BIP32 path as the uint32-per-node little-endian byte sequence
/// PSBT derivation fields carry.
pub fn parse_derivation_path_nodes_to_bytes(path: &str) -> Result<Vec<u8>> {
    let validation_message = validate_bip32_path(path, PathMode::Any);
    if !validation_message.is_empty() {
        return Err(Error::Core(braid_core::Error::InvalidPath(
            validation_message,
        )));
    }
    let mut bytes = Vec::new();
    for node in bip32_path_to_sequence(path)? {
        bytes.extend_from_slice(&node.to_le_bytes());
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bufferize_hex() {
        let bytes = bufferize("70736274ff00").unwrap();
        assert_eq!(bytes, vec![0x70, 0x73, 0x62, 0x74, 0xff, 0x00]);
    }

    #[test]
    fn test_bufferize_base64() {
        // base64 of the magic bytes plus one zero byte
        let encoded = base64::engine::general_purpose::STANDARD
            .encode([0x70, 0x73, 0x62, 0x74, 0xff, 0x00]);
        assert!(encoded.starts_with(PSBT_MAGIC_B64));
        let bytes = bufferize(&encoded).unwrap();
        assert_eq!(bytes, vec![0x70, 0x73, 0x62, 0x74, 0xff, 0x00]);
    }

    #[test]
    fn test_bufferize_rejects_garbage() {
        assert!(bufferize("hello").is_err());
        assert!(bufferize("deadbeef").is_err());
    }

    #[test]
    fn test_path_nodes_to_bytes() {
        let bytes = parse_derivation_path_nodes_to_bytes("m/45'/1/0").unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &(45u32 + 0x8000_0000).to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &0u32.to_le_bytes());
        assert!(parse_derivation_path_nodes_to_bytes("not a path").is_err());
    }
}
