use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use tree_hash_derive::TreeHash;

use super::execution::ExecutionPayloadHeader;
use super::hex_serde;

/// Number of validators in the Ethereum beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Slots per sync committee period (256 epochs * 32 slots/epoch = 8192).
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Epochs per sync committee period.
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;

/// Slots per epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Domain type for sync committee signatures.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Minimum number of sync committee participants required (2/3 of 512, rounded up).
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: usize = (SYNC_COMMITTEE_SIZE * 2 + 2) / 3;

/// A 32-byte SSZ digest.
pub type Root = [u8; 32];

/// Participation bits of a sync aggregate. Bit `i` is set when committee member `i` signed.
pub type SyncCommitteeBits = BitArray<[u8; SYNC_COMMITTEE_SIZE / 8], Lsb0>;

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = hex_serde::decode_prefixed(&String::deserialize(deserializer)?)
            .map_err(<D::Error as serde::de::Error>::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("Invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A BLS12-381 signature blob as received from the relayer.
///
/// The length is not checked on construction: a malformed blob is carried
/// through to signature verification, which rejects it explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlsSignature(pub Vec<u8>);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex_serde::decode_prefixed(&String::deserialize(deserializer)?)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the signature as a fixed-size array, or `None` if the blob has the wrong length.
    pub fn to_fixed(&self) -> Option<[u8; BLS_SIGNATURE_LEN]> {
        self.0.as_slice().try_into().ok()
    }
}

/// A beacon chain block header.
/// The minimal header, enough to verify the chain without storing full blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TreeHash)]
pub struct BeaconBlockHeader {
    /// Slot number of this block.
    pub slot: u64,
    /// Index of the validator who proposed this block.
    pub proposer_index: u64,
    /// Root hash of the parent beacon block.
    #[serde(with = "hex_serde::root")]
    pub parent_root: Root,
    /// Root hash of the beacon state after processing this block.
    #[serde(with = "hex_serde::root")]
    pub state_root: Root,
    /// Root hash of the block body.
    #[serde(with = "hex_serde::root")]
    pub body_root: Root,
}

/// The sync committee: 512 validators that sign off on the chain head.
/// Rotates every ~27 hours (256 epochs).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    /// 512 BLS public keys of committee members, in signing-bit order.
    pub pubkeys: Vec<BlsPublicKey>,
    /// Aggregated public key of the whole committee.
    pub aggregate_pubkey: BlsPublicKey,
}

impl SyncCommittee {
    /// Validate the sync committee has the correct number of members.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err("Sync committee must have exactly 512 members");
        }
        Ok(())
    }
}

/// The aggregate BLS signature from the sync committee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    /// Which of the 512 committee members signed.
    #[serde(with = "hex_serde::bits")]
    pub sync_committee_bits: SyncCommitteeBits,
    /// The aggregated BLS signature from all participating members.
    pub sync_committee_signature: BlsSignature,
}

/// A beacon header together with the execution payload header committed to in its body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightClientHeader {
    pub beacon: BeaconBlockHeader,
    pub execution: ExecutionPayloadHeader,
    /// Merkle branch proving `execution` against `beacon.body_root`.
    #[serde(with = "hex_serde::roots")]
    pub execution_branch: Vec<Root>,
}

/// A finality update, as served by `/eth/v1/beacon/light_client/finality_update`,
/// plus the committee the relayer claims signed it.
///
/// Every field must be cryptographically verified before accepting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinalizedHeaderUpdate {
    /// The header that the sync committee is attesting to.
    pub attested_header: LightClientHeader,
    /// The finalized header committed to in the attested state.
    pub finalized_header: LightClientHeader,
    /// Merkle branch proving `finalized_header` against `attested_header.beacon.state_root`.
    #[serde(with = "hex_serde::roots")]
    pub finality_branch: Vec<Root>,
    /// The aggregate signature from the sync committee.
    pub sync_aggregate: SyncAggregate,
    /// The slot at which the signature was produced.
    pub signature_slot: u64,
    /// Fork version the committee signed under.
    #[serde(with = "hex_serde::bytes4")]
    pub fork_version: [u8; 4],
    /// The committee of the signature period. Its root must match the stored one.
    pub signature_sync_committee: SyncCommittee,
}

/// The next sync committee and its proof against the attested state,
/// taken from `/eth/v1/beacon/light_client/updates`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncCommitteePeriodUpdate {
    pub next_sync_committee: SyncCommittee,
    /// Merkle branch proving `next_sync_committee` against `attested_header.beacon.state_root`.
    #[serde(with = "hex_serde::roots")]
    pub next_sync_committee_branch: Vec<Root>,
}
