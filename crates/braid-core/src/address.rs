//! Validation messages and classification for bitcoin addresses.

use std::str::FromStr;

use bitcoin::Address;

use crate::networks::{network_data, Network};

const BASE58_BODY: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn bech32_body_char(c: char) -> bool {
    matches!(c, 'a' | 'c'..='h' | 'j'..='n' | 'p'..='z' | '0' | '2'..='9')
}

fn base58_body_char(c: char) -> bool {
    BASE58_BODY.contains(c)
}

fn matches_magic_and_body(address: &str, network: Network) -> bool {
    let prefixes: &[&str] = match network {
        Network::Testnet => &["tb1", "bcrt1", "m", "n", "2"],
        Network::Regtest => &["bcrt1", "m", "n", "2"],
        _ => &["bc1", "1", "3"],
    };
    let Some(prefix) = prefixes.iter().find(|p| address.starts_with(**p)) else {
        return false;
    };
    let is_bech32 = address.starts_with("tb") || address.starts_with("bc");
    let body = &address[prefix.len()..];
    !body.is_empty()
        && body.chars().all(|c| {
            if is_bech32 {
                bech32_body_char(c)
            } else {
                base58_body_char(c)
            }
        })
}

/// Validate a given bitcoin address for the given network.
///
/// Returns an empty string when the address is valid, or a human-readable
/// message describing the first violation found.
pub fn validate_address(address: &str, network: Network) -> String {
    if address.trim().is_empty() {
        return "Address cannot be blank.".to_string();
    }
    // This tests whether you've got the network lined up with the address
    // type or not.
    if !matches_magic_and_body(address, network) {
        return match network {
            Network::Regtest => {
                "Address must start with one of 'bcrt1', 'm', 'n', or '2' followed by letters or digits."
            }
            Network::Testnet => {
                "Address must start with one of 'tb1', 'm', 'n', or '2' followed by letters or digits."
            }
            _ => "Address must start with either of 'bc1', '1' or '3' followed by letters or digits.",
        }
        .to_string();
    }
    match Address::from_str(address) {
        Ok(parsed) => {
            if parsed.is_valid_for_network(network_data(network)) {
                String::new()
            } else {
                "Address is invalid.".to_string()
            }
        }
        Err(_) => "Address is invalid.".to_string(),
    }
}

/// Script-type classification of an address string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    P2pkh,
    P2sh,
    P2wsh,
    P2tr,
    Unknown,
}

impl std::fmt::Display for AddressType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            AddressType::P2pkh => "P2PKH",
            AddressType::P2sh => "P2SH",
            AddressType::P2wsh => "P2WSH",
            AddressType::P2tr => "P2TR",
            AddressType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Classify an address by its prefix. Invalid addresses classify as
/// `Unknown`.
pub fn address_type(address: &str, network: Network) -> AddressType {
    if !validate_address(address, network).is_empty() {
        return AddressType::Unknown;
    }
    let bech32 = ["bc1", "tb1", "bcrt1"]
        .iter()
        .any(|p| address.starts_with(p));
    if bech32 {
        if ["bc1p", "tb1p", "bcrt1p"]
            .iter()
            .any(|p| address.starts_with(p))
        {
            return AddressType::P2tr;
        }
        return AddressType::P2wsh;
    }
    if ["1", "m", "n"].iter().any(|p| address.starts_with(p)) {
        return AddressType::P2pkh;
    }
    if address.starts_with('3') || address.starts_with('2') {
        return AddressType::P2sh;
    }
    AddressType::Unknown
}
