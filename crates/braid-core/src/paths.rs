//! Utilities for converting and validating BIP32 derivation paths.

use crate::error::{Error, Result};
use crate::multisig::MultisigAddressType;
use crate::networks::Network;

/// Adding this offset to a BIP32 index hardens it.
pub const HARDENING_OFFSET: u32 = 0x8000_0000;

/// Whether a path or index is required to be hardened, unhardened, or
/// either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    #[default]
    Any,
    Hardened,
    Unhardened,
}

/// Return the hardened version of the given BIP32 index.
pub fn hardened_bip32_index(index: u32) -> u32 {
    index + HARDENING_OFFSET
}

fn normalized_segments(path: &str) -> Vec<&str> {
    let rest = path.strip_prefix('m').unwrap_or(path);
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        Vec::new()
    } else {
        rest.split('/').collect()
    }
}

fn parse_segment(segment: &str) -> Option<u32> {
    let (digits, hardened) = match segment.strip_suffix('\'') {
        Some(d) => (d, true),
        None => (segment, false),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u64 = digits.parse().ok()?;
    let value = if hardened {
        if value >= HARDENING_OFFSET as u64 {
            return None;
        }
        value + HARDENING_OFFSET as u64
    } else {
        value
    };
    u32::try_from(value).ok()
}

/// Convert a BIP32 derivation path to the corresponding sequence of
/// derivation indices. Hardened segments carry the hardening offset.
///
/// Accepts paths with or without the initial `m/`.
pub fn bip32_path_to_sequence(path: &str) -> Result<Vec<u32>> {
    normalized_segments(path)
        .iter()
        .map(|segment| {
            parse_segment(segment).ok_or_else(|| Error::InvalidPath(path.to_string()))
        })
        .collect()
}

/// Convert a sequence of derivation indices into the corresponding BIP32
/// derivation path. Indices above the hardening offset are rendered with a
/// trailing single-quote.
pub fn bip32_sequence_to_path(sequence: &[u32]) -> String {
    let mut path = String::from("m");
    for &index in sequence {
        if index >= HARDENING_OFFSET {
            path.push_str(&format!("/{}'", index - HARDENING_OFFSET));
        } else {
            path.push_str(&format!("/{}", index));
        }
    }
    path
}

/// Validate a given BIP32 derivation path string, optionally requiring it
/// to be fully hardened or fully unhardened.
///
/// Returns an empty string if valid or the corresponding validation
/// message if not.
pub fn validate_bip32_path(path: &str, mode: PathMode) -> String {
    if path.is_empty() {
        return "BIP32 path cannot be blank.".to_string();
    }
    if path == "m" {
        return String::new();
    }
    // The initial `m/`, or even the leading slash, may be omitted:
    // relative paths like `0/0` are fine.
    let rest = path.strip_prefix('m').unwrap_or(path);
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        return "BIP32 path is invalid.".to_string();
    }
    for segment in rest.split('/') {
        let (digits, hardened) = match segment.strip_suffix('\'') {
            Some(d) => (d, true),
            None => (segment, false),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return "BIP32 path is invalid.".to_string();
        }
        let value: u64 = match digits.parse() {
            Ok(v) => v,
            Err(_) => return "BIP32 index is too high.".to_string(),
        };
        let limit = if hardened {
            HARDENING_OFFSET as u64
        } else {
            1u64 << 32
        };
        if value >= limit {
            return "BIP32 index is too high.".to_string();
        }
        let is_hardened = hardened || value >= HARDENING_OFFSET as u64;
        match mode {
            PathMode::Hardened if !is_hardened => {
                return "BIP32 path must be fully-hardened.".to_string()
            }
            PathMode::Unhardened if is_hardened => {
                return "BIP32 path cannot include hardened segments.".to_string()
            }
            _ => {}
        }
    }
    String::new()
}

/// Validate a given BIP32 index string such as `"45"` or `"45'"`.
///
/// By default `0`-`4294967295` and `0'`-`2147483647'` are valid. With
/// `PathMode::Hardened`, only `0'`-`2147483647'` and `2147483648`-
/// `4294967295` are accepted; with `PathMode::Unhardened`, only
/// `0`-`2147483647`.
pub fn validate_bip32_index(index: &str, mode: PathMode) -> String {
    if index.is_empty() {
        return "BIP32 index cannot be blank.".to_string();
    }
    let (digits, hardened_marker) = match index.strip_suffix('\'') {
        Some(d) => (d, true),
        None => (index, false),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return "BIP32 index is invalid.".to_string();
    }
    let value: u64 = match digits.parse() {
        Ok(v) => v,
        Err(_) => return "BIP32 index is too high.".to_string(),
    };
    let limit = if hardened_marker {
        HARDENING_OFFSET as u64
    } else {
        1u64 << 32
    };
    if value >= limit {
        return "BIP32 index is too high.".to_string();
    }
    let is_hardened = hardened_marker || value >= HARDENING_OFFSET as u64;
    match mode {
        PathMode::Hardened if !is_hardened => "BIP32 index must be hardened.".to_string(),
        PathMode::Unhardened if is_hardened => "BIP32 index cannot be hardened.".to_string(),
        _ => String::new(),
    }
}

/// Return the default BIP32 root derivation path for the given address
/// type and network.
///
/// P2SH uses the BIP45 root; the segwit types use the BIP48 roots with
/// script-type suffixes `1'` (wrapped) and `2'` (native).
pub fn multisig_bip32_root(address_type: MultisigAddressType, network: Network) -> String {
    let coin_path = match network {
        Network::Mainnet => "0'",
        _ => "1'",
    };
    match address_type {
        MultisigAddressType::P2sh => format!("m/45'/{}/0'", coin_path),
        MultisigAddressType::P2shP2wsh => format!("m/48'/{}/0'/1'", coin_path),
        MultisigAddressType::P2wsh => format!("m/48'/{}/0'/2'", coin_path),
    }
}

/// Returns a BIP32 path at the given relative path under the default BIP32
/// root path for the given address type and network.
pub fn multisig_bip32_path(
    address_type: MultisigAddressType,
    network: Network,
    relative_path: &str,
) -> String {
    let root = multisig_bip32_root(address_type, network);
    format!("{}/{}", root, relative_path)
}

/// Combine two BIP32 paths into one, e.g. a key's recorded path and a
/// relative suffix below it.
pub fn combine_bip32_paths(first_path: &str, second_path: &str) -> Result<String> {
    let normalize = |path: &str| {
        let mut path = path.to_lowercase().trim().replace("//", "/");
        if path.ends_with('/') {
            path.pop();
        }
        path
    };
    let first = normalize(first_path);
    let second = normalize(second_path);

    if first == "m" {
        return Ok(second);
    }
    if second == "m" {
        return Ok(first);
    }

    let combined = format!("{}/{}", first, second.trim_start_matches("m/"));
    let error = validate_bip32_path(&combined, PathMode::Any);
    if !error.is_empty() {
        return Err(Error::InvalidPath(format!(
            "{}: {} {}",
            combined, first_path, second_path
        )));
    }
    Ok(combined)
}

/// Get the path of the parent of the given path.
pub fn get_parent_bip32_path(path: &str) -> Result<String> {
    let error = validate_bip32_path(path, PathMode::Any);
    if !error.is_empty() {
        return Err(Error::InvalidPath(error));
    }
    let sequence = bip32_path_to_sequence(path)?;
    if sequence.is_empty() {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(bip32_sequence_to_path(&sequence[..sequence.len() - 1]))
}

/// Get the relative path below `parent_path` of the given child path.
pub fn get_relative_bip32_path(parent_path: &str, child_path: &str) -> Result<String> {
    for path in [parent_path, child_path] {
        let error = validate_bip32_path(path, PathMode::Any);
        if !error.is_empty() {
            return Err(Error::InvalidPath(error));
        }
    }
    let parent = bip32_path_to_sequence(parent_path)?;
    let child = bip32_path_to_sequence(child_path)?;
    if child.len() < parent.len() || child[..parent.len()] != parent[..] {
        return Err(Error::InvalidPath(format!(
            "{} is not below {}",
            child_path, parent_path
        )));
    }
    Ok(bip32_sequence_to_path(&child[parent.len()..])
        .trim_start_matches("m/")
        .trim_start_matches('m')
        .to_string())
}
