//! Network constants and utilities for mapping onto the `bitcoin` crate's
//! network type.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The bitcoin networks a wallet configuration can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    Signet,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
            Network::Signet => "signet",
        };
        write!(f, "{}", name)
    }
}

/// Returns the `bitcoin` crate network corresponding to the given network.
pub fn network_data(network: Network) -> bitcoin::Network {
    match network {
        Network::Mainnet => bitcoin::Network::Bitcoin,
        Network::Testnet => bitcoin::Network::Testnet,
        Network::Regtest => bitcoin::Network::Regtest,
        Network::Signet => bitcoin::Network::Signet,
    }
}

/// Returns a human-readable network label for the specified network.
pub fn network_label(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "Mainnet",
        Network::Testnet => "Testnet",
        Network::Regtest => "Regtest",
        Network::Signet => "Signet",
    }
}

/// Given an extended public key prefix, determine the network it indicates.
pub fn network_from_prefix(prefix: &str) -> Result<Network> {
    match prefix.to_lowercase().as_str() {
        "xpub" | "ypub" | "zpub" => Ok(Network::Mainnet),
        "tpub" | "upub" | "vpub" => Ok(Network::Testnet),
        _ => Err(Error::InvalidPrefix(prefix.to_string())),
    }
}
