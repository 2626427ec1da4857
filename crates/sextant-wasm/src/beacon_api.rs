//! Beacon API JSON format adapter.
//!
//! The Ethereum beacon chain REST API uses a different JSON format than
//! sextant-core's internal types. This module defines serde types matching
//! the API format and converts them into core update packets.
//!
//! Key differences:
//! - API uses string numbers ("12345"), core uses u64
//! - API wraps everything in { version: "...", data: {...} }
//! - API carries the fork name, core wants the fork version bytes
//! - API responses never include the committee that signed the update, the
//!   relayer supplies it separately

use alloy_primitives::{Address, U256};
use serde::Deserialize;
use sextant_core::types::beacon::*;
use sextant_core::types::execution::*;
use sextant_core::ChainSpec;

// ---------------------------------------------------------------------------
// Hex conversion helpers
// ---------------------------------------------------------------------------

pub fn hex_to_bytes(s: &str) -> Result<Vec<u8>, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| format!("hex decode: {}", e))
}

pub fn hex_to_fixed<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let bytes = hex_to_bytes(s)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected {} bytes, got {}", N, bytes.len()))
}

pub fn hex_to_bytes32(s: &str) -> Result<[u8; 32], String> {
    hex_to_fixed::<32>(s)
}

fn parse_u64_string(s: &str) -> Result<u64, String> {
    s.parse::<u64>().map_err(|e| format!("parse u64: {}", e))
}

fn parse_branch(branch: &[String]) -> Result<Vec<Root>, String> {
    branch.iter().map(|s| hex_to_bytes32(s)).collect()
}

// ---------------------------------------------------------------------------
// Beacon API: Finality update response
// ---------------------------------------------------------------------------

/// GET /eth/v1/beacon/light_client/finality_update
#[derive(Deserialize)]
pub struct ApiFinalityUpdateResponse {
    pub version: String,
    pub data: ApiFinalityUpdateData,
}

#[derive(Deserialize)]
pub struct ApiFinalityUpdateData {
    pub attested_header: ApiLightClientHeader,
    pub finalized_header: ApiLightClientHeader,
    pub finality_branch: Vec<String>,
    pub sync_aggregate: ApiSyncAggregate,
    pub signature_slot: String,
}

impl ApiFinalityUpdateData {
    pub fn to_core_update(
        &self,
        spec: &ChainSpec,
        signature_sync_committee: SyncCommittee,
    ) -> Result<FinalizedHeaderUpdate, String> {
        let signature_slot = parse_u64_string(&self.signature_slot)?;
        Ok(FinalizedHeaderUpdate {
            attested_header: self.attested_header.to_core()?,
            finalized_header: self.finalized_header.to_core()?,
            finality_branch: parse_branch(&self.finality_branch)?,
            sync_aggregate: self.sync_aggregate.to_core()?,
            signature_slot,
            fork_version: signing_fork_version(spec, signature_slot)?,
            signature_sync_committee,
        })
    }
}

// ---------------------------------------------------------------------------
// Beacon API: Period update (one element of the updates response)
// ---------------------------------------------------------------------------

/// One element of GET /eth/v1/beacon/light_client/updates
#[derive(Deserialize)]
pub struct ApiPeriodUpdateResponse {
    pub version: String,
    pub data: ApiPeriodUpdateData,
}

#[derive(Deserialize)]
pub struct ApiPeriodUpdateData {
    pub attested_header: ApiLightClientHeader,
    pub next_sync_committee: ApiSyncCommittee,
    pub next_sync_committee_branch: Vec<String>,
    pub finalized_header: ApiLightClientHeader,
    pub finality_branch: Vec<String>,
    pub sync_aggregate: ApiSyncAggregate,
    pub signature_slot: String,
}

impl ApiPeriodUpdateData {
    pub fn to_core_updates(
        &self,
        spec: &ChainSpec,
        signature_sync_committee: SyncCommittee,
    ) -> Result<(FinalizedHeaderUpdate, SyncCommitteePeriodUpdate), String> {
        let signature_slot = parse_u64_string(&self.signature_slot)?;
        let header_update = FinalizedHeaderUpdate {
            attested_header: self.attested_header.to_core()?,
            finalized_header: self.finalized_header.to_core()?,
            finality_branch: parse_branch(&self.finality_branch)?,
            sync_aggregate: self.sync_aggregate.to_core()?,
            signature_slot,
            fork_version: signing_fork_version(spec, signature_slot)?,
            signature_sync_committee,
        };
        let committee_update = SyncCommitteePeriodUpdate {
            next_sync_committee: self.next_sync_committee.to_core()?,
            next_sync_committee_branch: parse_branch(&self.next_sync_committee_branch)?,
        };
        Ok((header_update, committee_update))
    }
}

// ---------------------------------------------------------------------------
// Beacon API: Shared sub-structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ApiLightClientHeader {
    pub beacon: ApiBeaconBlockHeader,
    pub execution: ApiExecutionPayloadHeader,
    pub execution_branch: Vec<String>,
}

impl ApiLightClientHeader {
    pub fn to_core(&self) -> Result<LightClientHeader, String> {
        Ok(LightClientHeader {
            beacon: self.beacon.to_core()?,
            execution: self.execution.to_core()?,
            execution_branch: parse_branch(&self.execution_branch)?,
        })
    }
}

#[derive(Deserialize)]
pub struct ApiBeaconBlockHeader {
    pub slot: String,
    pub proposer_index: String,
    pub parent_root: String,
    pub state_root: String,
    pub body_root: String,
}

impl ApiBeaconBlockHeader {
    pub fn to_core(&self) -> Result<BeaconBlockHeader, String> {
        Ok(BeaconBlockHeader {
            slot: parse_u64_string(&self.slot)?,
            proposer_index: parse_u64_string(&self.proposer_index)?,
            parent_root: hex_to_bytes32(&self.parent_root)?,
            state_root: hex_to_bytes32(&self.state_root)?,
            body_root: hex_to_bytes32(&self.body_root)?,
        })
    }
}

#[derive(Deserialize)]
pub struct ApiExecutionPayloadHeader {
    pub parent_hash: String,
    pub fee_recipient: String,
    pub state_root: String,
    pub receipts_root: String,
    pub logs_bloom: String,
    pub prev_randao: String,
    pub block_number: String,
    pub gas_limit: String,
    pub gas_used: String,
    pub timestamp: String,
    pub extra_data: String,
    pub base_fee_per_gas: String,
    pub block_hash: String,
    pub transactions_root: String,
    pub withdrawals_root: String,
    pub blob_gas_used: String,
    pub excess_blob_gas: String,
}

impl ApiExecutionPayloadHeader {
    pub fn to_core(&self) -> Result<ExecutionPayloadHeader, String> {
        let extra_data = hex_to_bytes(&self.extra_data)?;
        if extra_data.len() > MAX_EXTRA_DATA_BYTES {
            return Err(format!("extra_data is {} bytes", extra_data.len()));
        }

        Ok(ExecutionPayloadHeader {
            parent_hash: hex_to_bytes32(&self.parent_hash)?,
            fee_recipient: Address::from(hex_to_fixed::<20>(&self.fee_recipient)?),
            state_root: hex_to_bytes32(&self.state_root)?,
            receipts_root: hex_to_bytes32(&self.receipts_root)?,
            logs_bloom: LogsBloom(hex_to_fixed::<BYTES_PER_LOGS_BLOOM>(&self.logs_bloom)?),
            prev_randao: hex_to_bytes32(&self.prev_randao)?,
            block_number: parse_u64_string(&self.block_number)?,
            gas_limit: parse_u64_string(&self.gas_limit)?,
            gas_used: parse_u64_string(&self.gas_used)?,
            timestamp: parse_u64_string(&self.timestamp)?,
            extra_data: extra_data.into(),
            base_fee_per_gas: U256::from_str_radix(&self.base_fee_per_gas, 10)
                .map_err(|e| format!("base_fee_per_gas: {}", e))?,
            block_hash: hex_to_bytes32(&self.block_hash)?,
            transactions_root: hex_to_bytes32(&self.transactions_root)?,
            withdrawals_root: hex_to_bytes32(&self.withdrawals_root)?,
            blob_gas_used: parse_u64_string(&self.blob_gas_used)?,
            excess_blob_gas: parse_u64_string(&self.excess_blob_gas)?,
        })
    }
}

#[derive(Deserialize)]
pub struct ApiSyncAggregate {
    pub sync_committee_bits: String,
    pub sync_committee_signature: String,
}

impl ApiSyncAggregate {
    pub fn to_core(&self) -> Result<SyncAggregate, String> {
        let bits = hex_to_fixed::<{ SYNC_COMMITTEE_SIZE / 8 }>(&self.sync_committee_bits)
            .map_err(|e| format!("sync_committee_bits: {}", e))?;

        // Length is checked by the verifier, not here.
        let signature = BlsSignature(hex_to_bytes(&self.sync_committee_signature)?);

        Ok(SyncAggregate {
            sync_committee_bits: SyncCommitteeBits::new(bits),
            sync_committee_signature: signature,
        })
    }
}

#[derive(Deserialize)]
pub struct ApiSyncCommittee {
    pub pubkeys: Vec<String>,
    pub aggregate_pubkey: String,
}

impl ApiSyncCommittee {
    pub fn to_core(&self) -> Result<SyncCommittee, String> {
        let pubkeys: Vec<BlsPublicKey> = self
            .pubkeys
            .iter()
            .enumerate()
            .map(|(i, hex_pk)| {
                let bytes = hex_to_bytes(hex_pk)?;
                BlsPublicKey::from_bytes(&bytes)
                    .map_err(|e| format!("pubkey[{}]: {}", i, e))
            })
            .collect::<Result<_, _>>()?;

        let agg_bytes = hex_to_bytes(&self.aggregate_pubkey)?;
        let aggregate_pubkey = BlsPublicKey::from_bytes(&agg_bytes)
            .map_err(|e| format!("aggregate_pubkey: {}", e))?;

        let committee = SyncCommittee {
            pubkeys,
            aggregate_pubkey,
        };
        committee.validate()?;
        Ok(committee)
    }
}

// ---------------------------------------------------------------------------
// Entry points used by the bindings
// ---------------------------------------------------------------------------

/// The `version` of a response names the fork of its attested header. It
/// must be one we know the payload shape of, but it does not pick the
/// signing domain.
fn check_known_fork(spec: &ChainSpec, version: &str) -> Result<(), String> {
    spec.fork_version(version)
        .map(|_| ())
        .ok_or_else(|| format!("unknown fork: {}", version))
}

/// The committee signs under the fork active at the slot before
/// `signature_slot`, which differs from the attested header's fork across a
/// fork boundary.
fn signing_fork_version(spec: &ChainSpec, signature_slot: u64) -> Result<[u8; 4], String> {
    let slot = signature_slot.max(1) - 1;
    spec.fork_version_at_slot(slot)
        .ok_or_else(|| format!("no fork active at slot {}", slot))
}

fn parse_committee(committee_json: &str) -> Result<SyncCommittee, String> {
    let api: ApiSyncCommittee = serde_json::from_str(committee_json)
        .map_err(|e| format!("Invalid sync committee JSON: {}", e))?;
    api.to_core()
}

/// Decode a finality update response together with the committee that signed it.
pub fn decode_finality_update(
    spec: &ChainSpec,
    update_json: &str,
    committee_json: &str,
) -> Result<FinalizedHeaderUpdate, String> {
    let resp: ApiFinalityUpdateResponse = serde_json::from_str(update_json)
        .map_err(|e| format!("Invalid finality update JSON: {}", e))?;
    check_known_fork(spec, &resp.version)?;
    resp.data.to_core_update(spec, parse_committee(committee_json)?)
}

/// Decode one period update together with the committee that signed it.
pub fn decode_period_update(
    spec: &ChainSpec,
    update_json: &str,
    committee_json: &str,
) -> Result<(FinalizedHeaderUpdate, SyncCommitteePeriodUpdate), String> {
    let resp: ApiPeriodUpdateResponse = serde_json::from_str(update_json)
        .map_err(|e| format!("Invalid period update JSON: {}", e))?;
    check_known_fork(spec, &resp.version)?;
    resp.data.to_core_updates(spec, parse_committee(committee_json)?)
}
