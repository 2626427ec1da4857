use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tree_hash_derive::TreeHash;

use super::beacon::Root;
use super::hex_serde;

/// Maximum length of `extra_data` in an execution payload.
pub const MAX_EXTRA_DATA_BYTES: usize = 32;

/// Number of bytes in the logs bloom filter.
pub const BYTES_PER_LOGS_BLOOM: usize = 256;

/// The 2048-bit logs bloom, an SSZ `ByteVector[256]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsBloom(#[serde(with = "hex_serde::bloom")] pub [u8; BYTES_PER_LOGS_BLOOM]);

impl Default for LogsBloom {
    fn default() -> Self {
        Self([0; BYTES_PER_LOGS_BLOOM])
    }
}

/// Payload `extra_data`, an SSZ `ByteList[32]`.
///
/// Decoding does not enforce the limit, [`ExecutionPayloadHeader::validate`] does.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraData(#[serde(with = "hex_serde::bytes")] pub Vec<u8>);

impl ExtraData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ExtraData {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Execution payload header (Deneb), the link between beacon and execution layers.
///
/// The light client only records `block_number` and `state_root`, but every
/// field is needed to recompute the header's `hash_tree_root` and check it
/// against the beacon block body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TreeHash)]
pub struct ExecutionPayloadHeader {
    #[serde(with = "hex_serde::root")]
    pub parent_hash: Root,
    pub fee_recipient: Address,
    /// Root of the execution layer state trie.
    #[serde(with = "hex_serde::root")]
    pub state_root: Root,
    #[serde(with = "hex_serde::root")]
    pub receipts_root: Root,
    pub logs_bloom: LogsBloom,
    #[serde(with = "hex_serde::root")]
    pub prev_randao: Root,
    /// Block number in the execution layer.
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: ExtraData,
    pub base_fee_per_gas: U256,
    #[serde(with = "hex_serde::root")]
    pub block_hash: Root,
    #[serde(with = "hex_serde::root")]
    pub transactions_root: Root,
    #[serde(with = "hex_serde::root")]
    pub withdrawals_root: Root,
    pub blob_gas_used: u64,
    pub excess_blob_gas: u64,
}

impl ExecutionPayloadHeader {
    /// Check the list bounds the SSZ schema puts on this header.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.extra_data.0.len() > MAX_EXTRA_DATA_BYTES {
            return Err("extra_data exceeds 32 bytes");
        }
        Ok(())
    }
}
