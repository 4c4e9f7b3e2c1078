//! Conversion and validation utilities for units (satoshis, BTC), hex
//! strings, and hashing.

use base64::Engine;
use bitcoin::hashes::{hash160, Hash};

use crate::error::{Error, Result};

/// Validate whether the given string is base64.
pub fn valid_base64(input: &str) -> bool {
    !input.is_empty()
        && base64::engine::general_purpose::STANDARD
            .decode(input)
            .is_ok()
}

/// Validate whether the given string is hex.
///
/// Valid hex consists of an even number of characters `a-f`, `A-F`, or
/// `0-9`. The common `0x` prefix makes the input invalid.
pub fn validate_hex(input: &str) -> String {
    if input.len() % 2 != 0 {
        return "Invalid hex: odd-length string.".to_string();
    }
    if !input.chars().all(|c| c.is_ascii_hexdigit()) {
        return "Invalid hex: only characters a-f, A-F and 0-9 allowed.".to_string();
    }
    String::new()
}

const SATS_PER_BTC: i64 = 100_000_000;

/// Convert a value in satoshis to BTC, returned as a decimal string with
/// trailing zeros trimmed.
///
/// Accepts both positive and negative values.
pub fn satoshis_to_bitcoins(satoshis: i64) -> String {
    let sign = if satoshis < 0 { "-" } else { "" };
    let abs = satoshis.unsigned_abs();
    let whole = abs / SATS_PER_BTC as u64;
    let frac = abs % SATS_PER_BTC as u64;
    if frac == 0 {
        return format!("{}{}", sign, whole);
    }
    let frac = format!("{:08}", frac);
    format!("{}{}.{}", sign, whole, frac.trim_end_matches('0'))
}

/// Convert a value in BTC to satoshis, rounding toward zero to the nearest
/// satoshi.
pub fn bitcoins_to_satoshis(btc: &str) -> Result<i64> {
    let trimmed = btc.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() {
        return Err(Error::InvalidAmount(btc.to_string()));
    }
    let mut parts = digits.splitn(2, '.');
    let whole_str = parts.next().unwrap_or("");
    let frac_str = parts.next().unwrap_or("");
    if !whole_str.chars().all(|c| c.is_ascii_digit())
        || !frac_str.chars().all(|c| c.is_ascii_digit())
        || (whole_str.is_empty() && frac_str.is_empty())
    {
        return Err(Error::InvalidAmount(btc.to_string()));
    }
    let whole: i64 = if whole_str.is_empty() {
        0
    } else {
        whole_str
            .parse()
            .map_err(|_| Error::InvalidAmount(btc.to_string()))?
    };
    // Truncate beyond 8 decimal places: fractions of a satoshi round toward zero.
    let frac_padded = format!("{:0<8}", frac_str.chars().take(8).collect::<String>());
    let frac: i64 = frac_padded
        .parse()
        .map_err(|_| Error::InvalidAmount(btc.to_string()))?;
    whole
        .checked_mul(SATS_PER_BTC)
        .and_then(|w| w.checked_add(frac))
        .and_then(|v| v.checked_mul(sign))
        .ok_or_else(|| Error::InvalidAmount(btc.to_string()))
}

/// sha256 followed by ripemd160, the standard bitcoin script-hash digest.
pub fn hash160_digest(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// The number of bytes a compactSize encoding of `size` occupies,
/// including the prefix byte.
pub fn compact_size_length(size: u64) -> usize {
    match size {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hex() {
        assert_eq!(validate_hex("deadbeef"), "");
        assert_eq!(validate_hex("DEADbeef00"), "");
        assert_eq!(validate_hex("abc"), "Invalid hex: odd-length string.");
        assert_eq!(
            validate_hex("0xab"),
            "Invalid hex: only characters a-f, A-F and 0-9 allowed."
        );
    }

    #[test]
    fn test_valid_base64() {
        assert!(valid_base64("cHNidP8="));
        assert!(!valid_base64("not base64!!"));
        assert!(!valid_base64(""));
    }

    #[test]
    fn test_satoshis_to_bitcoins() {
        assert_eq!(satoshis_to_bitcoins(100_000_000), "1");
        assert_eq!(satoshis_to_bitcoins(1), "0.00000001");
        assert_eq!(satoshis_to_bitcoins(123_450_000), "1.2345");
        assert_eq!(satoshis_to_bitcoins(-150_000_000), "-1.5");
        assert_eq!(satoshis_to_bitcoins(0), "0");
    }

    #[test]
    fn test_bitcoins_to_satoshis() {
        assert_eq!(bitcoins_to_satoshis("1").unwrap(), 100_000_000);
        assert_eq!(bitcoins_to_satoshis("0.00000001").unwrap(), 1);
        assert_eq!(bitcoins_to_satoshis("1.2345").unwrap(), 123_450_000);
        assert_eq!(bitcoins_to_satoshis("-1.5").unwrap(), -150_000_000);
        // fractions of a satoshi truncate toward zero
        assert_eq!(bitcoins_to_satoshis("0.000000019").unwrap(), 1);
        assert_eq!(bitcoins_to_satoshis("-0.000000019").unwrap(), -1);
        assert!(bitcoins_to_satoshis("foo").is_err());
        assert!(bitcoins_to_satoshis("").is_err());
    }

    #[test]
    fn test_hash160() {
        // hash160 of the compressed generator-point pubkey
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
                .unwrap();
        assert_eq!(
            hex::encode(hash160_digest(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_compact_size_length() {
        assert_eq!(compact_size_length(0), 1);
        assert_eq!(compact_size_length(252), 1);
        assert_eq!(compact_size_length(253), 3);
        assert_eq!(compact_size_length(0xffff), 3);
        assert_eq!(compact_size_length(0x10000), 5);
        assert_eq!(compact_size_length(0x1_0000_0000), 9);
    }
}
