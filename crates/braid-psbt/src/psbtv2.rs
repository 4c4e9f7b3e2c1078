//! An easily modifiable and serializable PSBT of version 2, conforming to
//! BIP174 as extended by BIP370.
//!
//! Getters exist for all BIP-defined keytypes. Mutation happens only
//! through the explicit Creator/Constructor/Updater/Signer operations,
//! which enforce the documented role rules; callers never touch the maps
//! directly.
//!
//! Defining BIPs:
//! https://github.com/bitcoin/bips/blob/master/bip-0174.mediawiki
//! https://github.com/bitcoin/bips/blob/master/bip-0370.mediawiki

use std::io::{Cursor, Read};
use std::str::FromStr;

use bitflags::bitflags;
use braid_core::paths::bip32_sequence_to_path;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::functions::{bufferize, parse_derivation_path_nodes_to_bytes};
use crate::map::{read_compact_size, compact_size_bytes, KeyValue, MapKey, PsbtMap};

bitflags! {
    /// The PSBT_GLOBAL_TX_MODIFIABLE bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TxModifiable: u8 {
        const INPUTS = 0b0000_0001;
        const OUTPUTS = 0b0000_0010;
        const SIGHASH_SINGLE = 0b0000_0100;
    }
}

/// One BIP32 derivation to record for an input or output.
#[derive(Debug, Clone)]
pub struct Bip32DerivationEntry {
    /// Compressed pubkey bytes (the key-data of the map entry).
    pub pubkey: Vec<u8>,
    pub master_fingerprint: [u8; 4],
    pub path: String,
}

/// Constructor-role arguments for adding an input.
#[derive(Debug, Clone, Default)]
pub struct PsbtV2InputArgs {
    /// The previous txid in stored (wire) byte order.
    pub previous_txid: Vec<u8>,
    pub output_index: u32,
    pub sequence: Option<u32>,
    pub non_witness_utxo: Option<Vec<u8>>,
    /// (amount in satoshis, scriptPubKey) of the UTXO being spent.
    pub witness_utxo: Option<(u64, Vec<u8>)>,
    pub redeem_script: Option<Vec<u8>>,
    pub witness_script: Option<Vec<u8>>,
    pub bip32_derivations: Vec<Bip32DerivationEntry>,
}

/// Constructor-role arguments for adding an output.
#[derive(Debug, Clone, Default)]
pub struct PsbtV2OutputArgs {
    pub amount: i64,
    pub script: Vec<u8>,
    pub redeem_script: Option<Vec<u8>>,
    pub witness_script: Option<Vec<u8>>,
    pub bip32_derivations: Vec<Bip32DerivationEntry>,
}

/// A PSBT v2: a global map, one map per input, and one map per output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsbtV2 {
    global_map: PsbtMap,
    input_maps: Vec<PsbtMap>,
    output_maps: Vec<PsbtMap>,
}

impl Default for PsbtV2 {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for PsbtV2 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(&bufferize(s)?)
    }
}

impl PsbtV2 {
    /// Creator role: an empty v2 psbt with the required initial global
    /// fields.
    pub fn new() -> Self {
        let mut psbt = PsbtV2 {
            global_map: PsbtMap::new(),
            input_maps: Vec::new(),
            output_maps: Vec::new(),
        };
        psbt.set_version(PSBT_V2_VERSION);
        psbt.set_tx_version(2).expect("2 is a valid tx version");
        psbt.set_input_count(0);
        psbt.set_output_count(0);
        psbt.set_fallback_locktime(Some(0));
        psbt
    }

    /// Parse a serialized psbt and re-run construction-time validation.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let mut magic = [0u8; 5];
        cursor.read_exact(&mut magic).map_err(|_| Error::InvalidMagic)?;
        if magic != PSBT_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let global_map = PsbtMap::read(&mut cursor)?;
        if !global_map.contains(&MapKey::of(PSBT_GLOBAL_VERSION))
            || !global_map.contains(&MapKey::of(PSBT_GLOBAL_TX_VERSION))
            || !global_map.contains(&MapKey::of(PSBT_GLOBAL_INPUT_COUNT))
            || !global_map.contains(&MapKey::of(PSBT_GLOBAL_OUTPUT_COUNT))
            // A v2 psbt must exclude the keytype reserved for the v0
            // unsigned transaction.
            || global_map.contains(&MapKey::of(PSBT_GLOBAL_UNSIGNED_TX))
        {
            return Err(Error::Deserialization(
                "Provided PsbtV2 not valid. Missing required global keys.".to_string(),
            ));
        }

        let mut psbt = PsbtV2 {
            global_map,
            input_maps: Vec::new(),
            output_maps: Vec::new(),
        };
        let input_count = psbt.input_count()?;
        let output_count = psbt.output_count()?;
        for _ in 0..input_count {
            psbt.input_maps.push(PsbtMap::read(&mut cursor)?);
        }
        for _ in 0..output_count {
            psbt.output_maps.push(PsbtMap::read(&mut cursor)?);
        }

        psbt.validate()?;
        Ok(psbt)
    }

    /// Serialize: magic bytes, the global map, then exactly input-count
    /// input maps and output-count output maps.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(PSBT_MAGIC);
        self.global_map
            .serialize(&mut buf)
            .expect("write to Vec cannot fail");
        for map in &self.input_maps {
            map.serialize(&mut buf).expect("write to Vec cannot fail");
        }
        for map in &self.output_maps {
            map.serialize(&mut buf).expect("write to Vec cannot fail");
        }
        buf
    }

    /// The psbt as hex text.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// The psbt as base64 text.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.serialize())
    }

    /// Checks initial construction of any valid PsbtV2. Always re-run,
    /// even for freshly parsed psbts.
    fn validate(&self) -> Result<()> {
        if self.version() < 2 {
            return Err(Error::VersionTooLow);
        }
        if self.tx_version()? < 2 {
            return Err(Error::TxVersionTooLow);
        }
        for map in &self.input_maps {
            if !map.contains_keytype(PSBT_IN_PREVIOUS_TXID) {
                return Err(Error::MissingField("PSBT_IN_PREVIOUS_TXID".to_string()));
            }
            if !map.contains_keytype(PSBT_IN_OUTPUT_INDEX) {
                return Err(Error::MissingField("PSBT_IN_OUTPUT_INDEX".to_string()));
            }
        }
        for map in &self.output_maps {
            if !map.contains_keytype(PSBT_OUT_AMOUNT) {
                return Err(Error::MissingField("PSBT_OUT_AMOUNT".to_string()));
            }
            if !map.contains_keytype(PSBT_OUT_SCRIPT) {
                return Err(Error::MissingField("PSBT_OUT_SCRIPT".to_string()));
            }
        }
        // A locktime recorded under the wrong key is rejected outright.
        for locktime in self.input_required_time_locktimes()?.into_iter().flatten() {
            if locktime < LOCKTIME_THRESHOLD {
                return Err(Error::TimeLocktimeTooLow);
            }
        }
        for locktime in self
            .input_required_height_locktimes()?
            .into_iter()
            .flatten()
        {
            if locktime >= LOCKTIME_THRESHOLD {
                return Err(Error::HeightLocktimeTooHigh);
            }
        }
        Ok(())
    }

    pub fn num_inputs(&self) -> usize {
        self.input_maps.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.output_maps.len()
    }

    // ------------------------------------------------------------------
    // Global getters/setters
    // ------------------------------------------------------------------

    pub fn version(&self) -> u32 {
        match self.global_u32(PSBT_GLOBAL_VERSION) {
            Some(version) => version,
            None => {
                // This should never happen for a psbt built through this
                // type.
                log::warn!("PSBT_GLOBAL_VERSION key is missing! Defaulting to version 2.");
                2
            }
        }
    }

    pub fn set_version(&mut self, version: u32) {
        let mut version = version;
        if version < 2 {
            log::warn!(
                "PsbtV2 cannot have a global version less than 2. Version {} specified. Setting to version 2.",
                version
            );
            version = 2;
        }
        self.global_map.set(
            MapKey::of(PSBT_GLOBAL_VERSION),
            version.to_le_bytes().to_vec(),
        );
    }

    pub fn tx_version(&self) -> Result<i32> {
        let value = self
            .global_map
            .get(&MapKey::of(PSBT_GLOBAL_TX_VERSION))
            .ok_or_else(|| Error::MissingField("PSBT_GLOBAL_TX_VERSION".to_string()))?;
        Ok(i32::from_le_bytes(value_as_4_bytes(value)?))
    }

    /// The Creator role is responsible for this value, and BIP370
    /// specifies that it cannot be less than 2.
    pub fn set_tx_version(&mut self, version: i32) -> Result<()> {
        if version < 2 {
            return Err(Error::TxVersionTooLow);
        }
        self.global_map.set(
            MapKey::of(PSBT_GLOBAL_TX_VERSION),
            version.to_le_bytes().to_vec(),
        );
        Ok(())
    }

    /// This method is provided for compatibility issues and probably
    /// shouldn't be used since a PsbtV2 with PSBT_GLOBAL_TX_VERSION = 1
    /// is BIP370 non-compliant. No guarantees can be made that a
    /// serialized PsbtV2 which used this method will be accepted by
    /// outside consumers.
    ///
    /// It exists to allow instancing this type from a partially signed
    /// PSBTv0 with transaction version 1 via [`PsbtV2::from_v0`].
    pub fn dangerously_set_global_tx_version_1(&mut self) {
        log::warn!("Dangerously setting PsbtV2.PSBT_GLOBAL_TX_VERSION to 1!");
        self.global_map.set(
            MapKey::of(PSBT_GLOBAL_TX_VERSION),
            1i32.to_le_bytes().to_vec(),
        );
    }

    pub fn fallback_locktime(&self) -> Result<Option<u32>> {
        match self.global_map.get(&MapKey::of(PSBT_GLOBAL_FALLBACK_LOCKTIME)) {
            None => Ok(None),
            Some(value) => Ok(Some(u32::from_le_bytes(value_as_4_bytes(value)?))),
        }
    }

    pub fn set_fallback_locktime(&mut self, locktime: Option<u32>) {
        match locktime {
            None => {
                self.global_map
                    .delete(&MapKey::of(PSBT_GLOBAL_FALLBACK_LOCKTIME));
            }
            Some(locktime) => self.global_map.set(
                MapKey::of(PSBT_GLOBAL_FALLBACK_LOCKTIME),
                locktime.to_le_bytes().to_vec(),
            ),
        }
    }

    pub fn input_count(&self) -> Result<usize> {
        let value = self
            .global_map
            .get(&MapKey::of(PSBT_GLOBAL_INPUT_COUNT))
            .ok_or_else(|| Error::MissingField("PSBT_GLOBAL_INPUT_COUNT".to_string()))?;
        Ok(read_compact_size(&mut Cursor::new(value))? as usize)
    }

    fn set_input_count(&mut self, count: usize) {
        self.global_map.set(
            MapKey::of(PSBT_GLOBAL_INPUT_COUNT),
            compact_size_bytes(count as u64),
        );
    }

    pub fn output_count(&self) -> Result<usize> {
        let value = self
            .global_map
            .get(&MapKey::of(PSBT_GLOBAL_OUTPUT_COUNT))
            .ok_or_else(|| Error::MissingField("PSBT_GLOBAL_OUTPUT_COUNT".to_string()))?;
        Ok(read_compact_size(&mut Cursor::new(value))? as usize)
    }

    fn set_output_count(&mut self, count: usize) {
        self.global_map.set(
            MapKey::of(PSBT_GLOBAL_OUTPUT_COUNT),
            compact_size_bytes(count as u64),
        );
    }

    pub fn tx_modifiable(&self) -> TxModifiable {
        self.global_map
            .get(&MapKey::of(PSBT_GLOBAL_TX_MODIFIABLE))
            .and_then(|value| value.first().copied())
            .map(TxModifiable::from_bits_truncate)
            .unwrap_or_default()
    }

    pub fn set_tx_modifiable(&mut self, modifiable: TxModifiable) {
        self.global_map.set(
            MapKey::of(PSBT_GLOBAL_TX_MODIFIABLE),
            vec![modifiable.bits()],
        );
    }

    /// All global xpub entries, in insertion order.
    pub fn global_xpubs(&self) -> Vec<KeyValue> {
        self.global_map.values_of_keytype(PSBT_GLOBAL_XPUB)
    }

    /// All global proprietary entries, in insertion order.
    pub fn global_proprietary(&self) -> Vec<KeyValue> {
        self.global_map.values_of_keytype(PSBT_GLOBAL_PROPRIETARY)
    }

    fn global_u32(&self, keytype: u8) -> Option<u32> {
        self.global_map
            .get(&MapKey::of(keytype))
            .and_then(|value| value_as_4_bytes(value).ok())
            .map(u32::from_le_bytes)
    }

    // ------------------------------------------------------------------
    // Input getters
    // ------------------------------------------------------------------

    pub fn input_non_witness_utxos(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_NON_WITNESS_UTXO)
    }

    pub fn input_witness_utxos(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_WITNESS_UTXO)
    }

    /// Partial signatures per input, each in map insertion order.
    pub fn input_partial_sigs(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_PARTIAL_SIG)
    }

    pub fn input_sighash_types(&self) -> Result<Vec<Option<u32>>> {
        optional_u32(&self.input_maps, PSBT_IN_SIGHASH_TYPE)
    }

    pub fn input_redeem_scripts(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_REDEEM_SCRIPT)
    }

    pub fn input_witness_scripts(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_WITNESS_SCRIPT)
    }

    /// BIP32 derivations per input, each in map insertion order.
    pub fn input_bip32_derivations(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_BIP32_DERIVATION)
    }

    pub fn input_final_script_sigs(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_FINAL_SCRIPTSIG)
    }

    pub fn input_final_script_witnesses(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_FINAL_SCRIPTWITNESS)
    }

    pub fn input_por_commitments(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_POR_COMMITMENT)
    }

    pub fn input_ripemd160s(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_RIPEMD160)
    }

    pub fn input_sha256s(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_SHA256)
    }

    pub fn input_hash160s(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_HASH160)
    }

    pub fn input_hash256s(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_HASH256)
    }

    /// Every input's previous txid, in stored (wire) byte order.
    pub fn input_previous_txids(&self) -> Result<Vec<Vec<u8>>> {
        self.input_maps
            .iter()
            .map(|map| {
                map.get(&MapKey::of(PSBT_IN_PREVIOUS_TXID))
                    .map(|value| value.to_vec())
                    .ok_or_else(|| Error::MissingField("PSBT_IN_PREVIOUS_TXID".to_string()))
            })
            .collect()
    }

    pub fn input_output_indexes(&self) -> Result<Vec<u32>> {
        self.input_maps
            .iter()
            .map(|map| {
                let value = map
                    .get(&MapKey::of(PSBT_IN_OUTPUT_INDEX))
                    .ok_or_else(|| Error::MissingField("PSBT_IN_OUTPUT_INDEX".to_string()))?;
                Ok(u32::from_le_bytes(value_as_4_bytes(value)?))
            })
            .collect()
    }

    pub fn input_sequences(&self) -> Result<Vec<Option<u32>>> {
        optional_u32(&self.input_maps, PSBT_IN_SEQUENCE)
    }

    pub fn input_required_time_locktimes(&self) -> Result<Vec<Option<u32>>> {
        optional_u32(&self.input_maps, PSBT_IN_REQUIRED_TIME_LOCKTIME)
    }

    pub fn input_required_height_locktimes(&self) -> Result<Vec<Option<u32>>> {
        optional_u32(&self.input_maps, PSBT_IN_REQUIRED_HEIGHT_LOCKTIME)
    }

    pub fn input_tap_key_sigs(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_TAP_KEY_SIG)
    }

    pub fn input_tap_script_sigs(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_TAP_SCRIPT_SIG)
    }

    pub fn input_tap_leaf_scripts(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_TAP_LEAF_SCRIPT)
    }

    pub fn input_tap_bip32_derivations(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_TAP_BIP32_DERIVATION)
    }

    pub fn input_tap_internal_keys(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_TAP_INTERNAL_KEY)
    }

    pub fn input_tap_merkle_roots(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.input_maps, PSBT_IN_TAP_MERKLE_ROOT)
    }

    pub fn input_proprietary(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.input_maps, PSBT_IN_PROPRIETARY)
    }

    // ------------------------------------------------------------------
    // Output getters
    // ------------------------------------------------------------------

    pub fn output_redeem_scripts(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.output_maps, PSBT_OUT_REDEEM_SCRIPT)
    }

    pub fn output_witness_scripts(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.output_maps, PSBT_OUT_WITNESS_SCRIPT)
    }

    /// BIP32 derivations per output, each in map insertion order.
    pub fn output_bip32_derivations(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.output_maps, PSBT_OUT_BIP32_DERIVATION)
    }

    pub fn output_amounts(&self) -> Result<Vec<i64>> {
        self.output_maps
            .iter()
            .map(|map| {
                let value = map
                    .get(&MapKey::of(PSBT_OUT_AMOUNT))
                    .ok_or_else(|| Error::MissingField("PSBT_OUT_AMOUNT".to_string()))?;
                let bytes: [u8; 8] = value.try_into().map_err(|_| {
                    Error::InvalidFieldData("PSBT_OUT_AMOUNT must be 8 bytes".to_string())
                })?;
                Ok(i64::from_le_bytes(bytes))
            })
            .collect()
    }

    pub fn output_scripts(&self) -> Result<Vec<Vec<u8>>> {
        self.output_maps
            .iter()
            .map(|map| {
                map.get(&MapKey::of(PSBT_OUT_SCRIPT))
                    .map(|value| value.to_vec())
                    .ok_or_else(|| Error::MissingField("PSBT_OUT_SCRIPT".to_string()))
            })
            .collect()
    }

    pub fn output_tap_internal_keys(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.output_maps, PSBT_OUT_TAP_INTERNAL_KEY)
    }

    pub fn output_tap_trees(&self) -> Vec<Option<Vec<u8>>> {
        optional_bytes(&self.output_maps, PSBT_OUT_TAP_TREE)
    }

    pub fn output_tap_bip32_derivations(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.output_maps, PSBT_OUT_TAP_BIP32_DERIVATION)
    }

    pub fn output_proprietary(&self) -> Vec<Vec<KeyValue>> {
        non_unique(&self.output_maps, PSBT_OUT_PROPRIETARY)
    }

    // ------------------------------------------------------------------
    // Locktime resolution
    // ------------------------------------------------------------------

    /// The `nLockTime` for this psbt as if it were a bitcoin transaction.
    ///
    /// From BIP370: if no input requires a locktime, the fallback
    /// locktime (or 0) applies. Otherwise the locktime type supported by
    /// every requiring input is chosen, heights winning ties, and the
    /// maximum value of that type is returned.
    pub fn nlock_time(&self) -> Result<u32> {
        let input_count = self.input_count()?;
        let heights: Vec<u32> = self
            .input_required_height_locktimes()?
            .into_iter()
            .flatten()
            .collect();
        let times: Vec<u32> = self
            .input_required_time_locktimes()?
            .into_iter()
            .flatten()
            .collect();

        if heights.is_empty() && times.is_empty() {
            return Ok(self.fallback_locktime()?.unwrap_or(0));
        }
        if !heights.is_empty() && (heights.len() == input_count || heights.len() >= times.len()) {
            return Ok(heights.into_iter().max().expect("heights is non-empty"));
        }
        Ok(times.into_iter().max().expect("times is non-empty"))
    }

    // ------------------------------------------------------------------
    // Creator/Constructor methods
    // ------------------------------------------------------------------

    /// Record a global xpub: key-data is the 78-byte encoded xpub, the
    /// value its master fingerprint followed by its derivation path
    /// nodes.
    pub fn add_global_xpub(&mut self, xpub: &[u8], fingerprint: &[u8], path: &str) -> Result<()> {
        let key = MapKey::with_data(PSBT_GLOBAL_XPUB, xpub);
        let mut value = fingerprint.to_vec();
        value.extend_from_slice(&parse_derivation_path_nodes_to_bytes(path)?);
        self.global_map.set(key, value);
        Ok(())
    }

    fn is_modifiable(&self, flags: TxModifiable) -> bool {
        self.tx_modifiable().contains(flags)
    }

    /// Constructor role: append an input map. Fails with `NotModifiable`
    /// when the INPUTS flag is unset, leaving the psbt unchanged.
    pub fn add_input(&mut self, args: PsbtV2InputArgs) -> Result<()> {
        if !self.is_modifiable(TxModifiable::INPUTS) {
            return Err(Error::NotModifiable("inputs".to_string()));
        }
        let mut map = PsbtMap::new();
        map.set(
            MapKey::of(PSBT_IN_PREVIOUS_TXID),
            args.previous_txid.clone(),
        );
        map.set(
            MapKey::of(PSBT_IN_OUTPUT_INDEX),
            args.output_index.to_le_bytes().to_vec(),
        );
        if let Some(sequence) = args.sequence {
            map.set(MapKey::of(PSBT_IN_SEQUENCE), sequence.to_le_bytes().to_vec());
        }
        if let Some(non_witness_utxo) = args.non_witness_utxo {
            map.set(MapKey::of(PSBT_IN_NON_WITNESS_UTXO), non_witness_utxo);
        }
        if let Some((amount, script)) = args.witness_utxo {
            let mut value = (amount as i64).to_le_bytes().to_vec();
            value.extend_from_slice(&compact_size_bytes(script.len() as u64));
            value.extend_from_slice(&script);
            map.set(MapKey::of(PSBT_IN_WITNESS_UTXO), value);
        }
        if let Some(redeem_script) = args.redeem_script {
            map.set(MapKey::of(PSBT_IN_REDEEM_SCRIPT), redeem_script);
        }
        if let Some(witness_script) = args.witness_script {
            map.set(MapKey::of(PSBT_IN_WITNESS_SCRIPT), witness_script);
        }
        for derivation in &args.bip32_derivations {
            let key = MapKey::with_data(PSBT_IN_BIP32_DERIVATION, derivation.pubkey.clone());
            let mut value = derivation.master_fingerprint.to_vec();
            value.extend_from_slice(&parse_derivation_path_nodes_to_bytes(&derivation.path)?);
            map.set(key, value);
        }

        self.input_maps.push(map);
        self.set_input_count(self.input_maps.len());
        Ok(())
    }

    /// Constructor role: append an output map. Fails with `NotModifiable`
    /// when the OUTPUTS flag is unset, leaving the psbt unchanged.
    pub fn add_output(&mut self, args: PsbtV2OutputArgs) -> Result<()> {
        if !self.is_modifiable(TxModifiable::OUTPUTS) {
            return Err(Error::NotModifiable("outputs".to_string()));
        }
        let mut map = PsbtMap::new();
        map.set(MapKey::of(PSBT_OUT_AMOUNT), args.amount.to_le_bytes().to_vec());
        map.set(MapKey::of(PSBT_OUT_SCRIPT), args.script.clone());
        if let Some(redeem_script) = args.redeem_script {
            map.set(MapKey::of(PSBT_OUT_REDEEM_SCRIPT), redeem_script);
        }
        if let Some(witness_script) = args.witness_script {
            map.set(MapKey::of(PSBT_OUT_WITNESS_SCRIPT), witness_script);
        }
        for derivation in &args.bip32_derivations {
            let key = MapKey::with_data(PSBT_OUT_BIP32_DERIVATION, derivation.pubkey.clone());
            let mut value = derivation.master_fingerprint.to_vec();
            value.extend_from_slice(&parse_derivation_path_nodes_to_bytes(&derivation.path)?);
            map.set(key, value);
        }

        self.output_maps.push(map);
        self.set_output_count(self.output_maps.len());
        Ok(())
    }

    /// Removes an input map.
    pub fn delete_input(&mut self, index: usize) -> Result<()> {
        if !self.is_modifiable(TxModifiable::INPUTS) {
            return Err(Error::NotModifiable("inputs".to_string()));
        }
        if index >= self.input_maps.len() {
            return Err(Error::InvalidInputIndex(index));
        }
        self.input_maps.remove(index);
        self.set_input_count(self.input_maps.len());
        Ok(())
    }

    /// Removes an output map. Under SIGHASH_SINGLE the input at the same
    /// index is tied to the output, so its signatures are dropped as
    /// well: they are no longer valid.
    pub fn delete_output(&mut self, index: usize) -> Result<()> {
        if !self.is_modifiable(TxModifiable::OUTPUTS) {
            return Err(Error::NotModifiable("outputs".to_string()));
        }
        if index >= self.output_maps.len() {
            return Err(Error::InvalidOutputIndex(index));
        }
        if self.is_modifiable(TxModifiable::SIGHASH_SINGLE) && index < self.input_maps.len() {
            self.remove_partial_sig(index, None)?;
        }
        self.output_maps.remove(index);
        self.set_output_count(self.output_maps.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Signer methods
    // ------------------------------------------------------------------

    /// Adds a signature for an input, validating that the input exists
    /// and does not already carry a signature for the pubkey, then
    /// updating PSBT_GLOBAL_TX_MODIFIABLE from the signature's sighash
    /// byte. The insertion and the bitmask update are atomic: on failure
    /// both are rolled back.
    ///
    /// The signature is DER with its trailing sighash-type byte, as the
    /// Signer produced it per BIP174.
    pub fn add_partial_sig(&mut self, input_index: usize, pubkey: &[u8], sig: &[u8]) -> Result<()> {
        if input_index >= self.input_maps.len() {
            return Err(Error::InvalidInputIndex(input_index));
        }
        if pubkey.is_empty() || sig.is_empty() {
            return Err(Error::InvalidFieldData(
                "addPartialSig requires a pubkey and a sig".to_string(),
            ));
        }
        let key = MapKey::with_data(PSBT_IN_PARTIAL_SIG, pubkey);
        if self.input_maps[input_index].contains(&key) {
            return Err(Error::DuplicatePartialSig);
        }

        let modifiable_backup = self.tx_modifiable();
        self.input_maps[input_index].set(key.clone(), sig.to_vec());
        if let Err(error) = self.handle_sighash_type(sig) {
            // To remain atomic, reset everything to the way it was.
            self.input_maps[input_index].delete(&key);
            self.set_tx_modifiable(modifiable_backup);
            return Err(error);
        }
        Ok(())
    }

    /// Removes all sigs for an input unless a pubkey is specified, in
    /// which case only that pubkey's sig is removed (and must exist).
    pub fn remove_partial_sig(&mut self, input_index: usize, pubkey: Option<&[u8]>) -> Result<()> {
        if input_index >= self.input_maps.len() {
            return Err(Error::InvalidInputIndex(input_index));
        }
        match pubkey {
            Some(pubkey) => {
                let key = MapKey::with_data(PSBT_IN_PARTIAL_SIG, pubkey);
                if !self.input_maps[input_index].delete(&key) {
                    return Err(Error::NoSignatureForPubkey(hex::encode(pubkey)));
                }
            }
            None => {
                let keys: Vec<MapKey> = self.input_maps[input_index]
                    .values_of_keytype(PSBT_IN_PARTIAL_SIG)
                    .into_iter()
                    .map(|entry| entry.key)
                    .collect();
                for key in keys {
                    self.input_maps[input_index].delete(&key);
                }
            }
        }
        Ok(())
    }

    /// Ensures the psbt is in the proper state when adding a partial sig
    /// keypair, per the BIP370 Signer role.
    fn handle_sighash_type(&mut self, sig: &[u8]) -> Result<()> {
        let mut sighash = *sig.last().ok_or_else(|| {
            Error::InvalidFieldData("signature carries no sighash byte".to_string())
        })?;
        let mut modifiable = self.tx_modifiable();

        if sighash & SIGHASH_ANYONECANPAY == 0 {
            modifiable.remove(TxModifiable::INPUTS);
        } else {
            // Unset the ANYONECANPAY bit for simpler comparisons below.
            sighash ^= SIGHASH_ANYONECANPAY;
        }
        // Can't use bitwise tests the whole way: SIGHASH_SINGLE is a 3.
        if sighash != SIGHASH_NONE {
            modifiable.remove(TxModifiable::OUTPUTS);
        }
        if sighash == SIGHASH_SINGLE {
            modifiable.insert(TxModifiable::SIGHASH_SINGLE);
        }

        self.set_tx_modifiable(modifiable);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Legacy import
    // ------------------------------------------------------------------

    /// Build a PsbtV2 from a legacy (v0) psbt.
    ///
    /// Partial signatures are replayed strictly last: adding a signature
    /// can shrink PSBT_GLOBAL_TX_MODIFIABLE and block further structural
    /// mutation, so reversing this order would corrupt reconstruction.
    pub fn from_v0(psbt: &bitcoin::Psbt, allow_txn_version_1: bool) -> Result<Self> {
        use bitcoin::hashes::Hash;

        // Creator role. Fully modifiable so the v0 inputs and outputs can
        // be added.
        let mut psbtv2 = PsbtV2::new();
        psbtv2.set_tx_modifiable(TxModifiable::INPUTS | TxModifiable::OUTPUTS);

        let tx_version = psbt.unsigned_tx.version.0;
        if tx_version == 1 && allow_txn_version_1 {
            psbtv2.dangerously_set_global_tx_version_1();
        } else {
            psbtv2.set_tx_version(tx_version)?;
        }

        for (xpub, (fingerprint, path)) in &psbt.xpub {
            psbtv2.add_global_xpub(
                &xpub.encode(),
                fingerprint.as_bytes(),
                &derivation_path_string(path),
            )?;
        }

        // Constructor role.
        for (index, input) in psbt.inputs.iter().enumerate() {
            let tx_input = &psbt.unsigned_tx.input[index];
            psbtv2.add_input(PsbtV2InputArgs {
                previous_txid: tx_input.previous_output.txid.to_byte_array().to_vec(),
                output_index: tx_input.previous_output.vout,
                sequence: Some(tx_input.sequence.0),
                non_witness_utxo: input
                    .non_witness_utxo
                    .as_ref()
                    .map(bitcoin::consensus::serialize),
                witness_utxo: input
                    .witness_utxo
                    .as_ref()
                    .map(|utxo| (utxo.value.to_sat(), utxo.script_pubkey.to_bytes())),
                redeem_script: input.redeem_script.as_ref().map(|s| s.to_bytes()),
                witness_script: input.witness_script.as_ref().map(|s| s.to_bytes()),
                bip32_derivations: input
                    .bip32_derivation
                    .iter()
                    .map(|(pubkey, (fingerprint, path))| Bip32DerivationEntry {
                        pubkey: pubkey.serialize().to_vec(),
                        master_fingerprint: *fingerprint.as_bytes(),
                        path: derivation_path_string(path),
                    })
                    .collect(),
            })?;
        }

        for (index, output) in psbt.outputs.iter().enumerate() {
            let tx_output = &psbt.unsigned_tx.output[index];
            psbtv2.add_output(PsbtV2OutputArgs {
                amount: tx_output.value.to_sat() as i64,
                script: tx_output.script_pubkey.to_bytes(),
                redeem_script: output.redeem_script.as_ref().map(|s| s.to_bytes()),
                witness_script: output.witness_script.as_ref().map(|s| s.to_bytes()),
                bip32_derivations: output
                    .bip32_derivation
                    .iter()
                    .map(|(pubkey, (fingerprint, path))| Bip32DerivationEntry {
                        pubkey: pubkey.serialize().to_vec(),
                        master_fingerprint: *fingerprint.as_bytes(),
                        path: derivation_path_string(path),
                    })
                    .collect(),
            })?;
        }

        // Finally, replay partial sigs. This must be performed last since
        // it may change PSBT_GLOBAL_TX_MODIFIABLE, preventing inputs or
        // outputs from being added.
        for (index, input) in psbt.inputs.iter().enumerate() {
            for (pubkey, sig) in &input.partial_sigs {
                psbtv2.add_partial_sig(index, &pubkey.to_bytes(), &sig.to_vec())?;
            }
        }

        Ok(psbtv2)
    }
}

/// Attempts to extract the version number from a raw psbt regardless of
/// psbt validity.
pub fn psbt_version_number(data: &[u8]) -> Result<u32> {
    if data.len() < PSBT_MAGIC.len() {
        return Err(Error::InvalidMagic);
    }
    let mut cursor = Cursor::new(&data[PSBT_MAGIC.len()..]);
    let map = PsbtMap::read(&mut cursor)?;
    Ok(map
        .get(&MapKey::of(PSBT_GLOBAL_VERSION))
        .and_then(|value| value_as_4_bytes(value).ok())
        .map(u32::from_le_bytes)
        .unwrap_or(0))
}

fn derivation_path_string(path: &bitcoin::bip32::DerivationPath) -> String {
    let sequence: Vec<u32> = path.into_iter().map(|child| u32::from(*child)).collect();
    bip32_sequence_to_path(&sequence)
}

fn value_as_4_bytes(value: &[u8]) -> Result<[u8; 4]> {
    value
        .try_into()
        .map_err(|_| Error::InvalidFieldData("expected a 4-byte value".to_string()))
}

fn optional_bytes(maps: &[PsbtMap], keytype: u8) -> Vec<Option<Vec<u8>>> {
    maps.iter()
        .map(|map| map.get(&MapKey::of(keytype)).map(|value| value.to_vec()))
        .collect()
}

fn optional_u32(maps: &[PsbtMap], keytype: u8) -> Result<Vec<Option<u32>>> {
    maps.iter()
        .map(|map| {
            map.get(&MapKey::of(keytype))
                .map(|value| Ok(u32::from_le_bytes(value_as_4_bytes(value)?)))
                .transpose()
        })
        .collect()
}

fn non_unique(maps: &[PsbtMap], keytype: u8) -> Vec<Vec<KeyValue>> {
    maps.iter().map(|map| map.values_of_keytype(keytype)).collect()
}
