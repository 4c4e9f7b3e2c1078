//! The typed key-value map underlying every PSBT section.
//!
//! Each map is serialized as a sequence of
//! `(varint key-length, keytype || key-data, varint value-length, value)`
//! records terminated by a zero-length key. Maps preserve insertion
//! order, and getters for non-unique keytypes return entries in that
//! order.

use std::io::{Cursor, Read, Write};

use crate::error::{Error, Result};

/// A structured PSBT map key: one keytype byte plus optional key-data
/// distinguishing multiple keys of the same keytype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapKey {
    pub keytype: u8,
    pub keydata: Vec<u8>,
}

impl MapKey {
    /// A key with no key-data, for unique keytypes.
    pub fn of(keytype: u8) -> Self {
        MapKey {
            keytype,
            keydata: Vec::new(),
        }
    }

    /// A key carrying key-data, for non-unique keytypes.
    pub fn with_data(keytype: u8, keydata: impl Into<Vec<u8>>) -> Self {
        MapKey {
            keytype,
            keydata: keydata.into(),
        }
    }

    /// The full wire key: keytype byte followed by key-data.
    pub fn full_key(&self) -> Vec<u8> {
        let mut key = vec![self.keytype];
        key.extend_from_slice(&self.keydata);
        key
    }
}

/// One `{key, value}` entry returned by non-unique-keytype getters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: MapKey,
    pub value: Vec<u8>,
}

/// An insertion-ordered PSBT key-value map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PsbtMap {
    entries: Vec<(MapKey, Vec<u8>)>,
}

impl PsbtMap {
    pub fn new() -> Self {
        PsbtMap::default()
    }

    pub fn get(&self, key: &MapKey) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, key: &MapKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Whether any entry carries the given keytype.
    pub fn contains_keytype(&self, keytype: u8) -> bool {
        self.entries.iter().any(|(k, _)| k.keytype == keytype)
    }

    /// Insert or replace. Replacement happens in place, preserving the
    /// key's original position.
    pub fn set(&mut self, key: MapKey, value: Vec<u8>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove an entry; returns whether it existed.
    pub fn delete(&mut self, key: &MapKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// All entries sharing a keytype, in insertion order (not sorted).
    pub fn values_of_keytype(&self, keytype: u8) -> Vec<KeyValue> {
        self.entries
            .iter()
            .filter(|(k, _)| k.keytype == keytype)
            .map(|(k, v)| KeyValue {
                key: k.clone(),
                value: v.clone(),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MapKey, &Vec<u8>)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize every keypair followed by the map separator.
    pub fn serialize<W: Write>(&self, w: &mut W) -> Result<()> {
        for (key, value) in &self.entries {
            let full_key = key.full_key();
            write_compact_size(w, full_key.len() as u64)?;
            w.write_all(&full_key)?;
            write_compact_size(w, value.len() as u64)?;
            w.write_all(value)?;
        }
        w.write_all(&[0x00])?;
        Ok(())
    }

    /// Read keypairs until the zero-length-key map separator.
    pub fn read(cursor: &mut Cursor<&[u8]>) -> Result<Self> {
        let mut map = PsbtMap::new();
        loop {
            let key_len = read_compact_size(cursor)? as usize;
            if key_len == 0 {
                return Ok(map);
            }
            let mut full_key = vec![0u8; key_len];
            cursor.read_exact(&mut full_key)?;
            let key = MapKey {
                keytype: full_key[0],
                keydata: full_key[1..].to_vec(),
            };
            let value_len = read_compact_size(cursor)? as usize;
            let mut value = vec![0u8; value_len];
            cursor.read_exact(&mut value)?;
            if map.contains(&key) {
                return Err(Error::Deserialization(format!(
                    "duplicate key with keytype 0x{:02x}",
                    key.keytype
                )));
            }
            map.entries.push((key, value));
        }
    }
}

/// Write a compactSize integer.
pub fn write_compact_size<W: Write>(w: &mut W, n: u64) -> Result<()> {
    if n < 0xfd {
        w.write_all(&[n as u8])?;
    } else if n <= 0xffff {
        w.write_all(&[0xfd])?;
        w.write_all(&(n as u16).to_le_bytes())?;
    } else if n <= 0xffff_ffff {
        w.write_all(&[0xfe])?;
        w.write_all(&(n as u32).to_le_bytes())?;
    } else {
        w.write_all(&[0xff])?;
        w.write_all(&n.to_le_bytes())?;
    }
    Ok(())
}

/// Read a compactSize integer.
pub fn read_compact_size<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    match buf[0] {
        0xff => {
            let mut buf = [0u8; 8];
            r.read_exact(&mut buf)?;
            Ok(u64::from_le_bytes(buf))
        }
        0xfe => {
            let mut buf = [0u8; 4];
            r.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf) as u64)
        }
        0xfd => {
            let mut buf = [0u8; 2];
            r.read_exact(&mut buf)?;
            Ok(u16::from_le_bytes(buf) as u64)
        }
        n => Ok(n as u64),
    }
}

/// Encode a value as a compactSize integer.
pub fn compact_size_bytes(n: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(9);
    write_compact_size(&mut bytes, n).expect("write to Vec cannot fail");
    bytes
}
