//! Fixtures shared by the unit tests: sparse Merkle trees, synthetic
//! committees, canned BLS backends and self-consistent updates.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::config::{ChainSpec, Checkpoint};
use crate::consensus::light_client::LightClient;
use crate::consensus::period::compute_sync_committee_period;
use crate::consensus::signature::AggregateVerifier;
use crate::merkle::*;
use crate::ssz::{sha256_hash, sha256_pair, HashTreeRoot};
use crate::types::beacon::*;
use crate::types::execution::ExecutionPayloadHeader;

pub const CHECKPOINT_BLOCK_NUMBER: u64 = 19_000_000;
pub const CHECKPOINT_EXECUTION_ROOT: Root = [0xee; 32];

/// A Merkle tree holding only the leaves inserted into it. Every other
/// subtree hashes to zero.
#[derive(Default)]
pub struct SparseTree {
    leaves: BTreeMap<u64, Root>,
}

impl SparseTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gindex: u64, leaf: Root) {
        self.leaves.insert(gindex, leaf);
    }

    pub fn root(&self) -> Root {
        self.node(1)
    }

    /// Sibling hashes from the leaf at `gindex` up to the root.
    pub fn branch(&self, gindex: u64) -> Vec<Root> {
        let mut branch = Vec::new();
        let mut current = gindex;
        while current > 1 {
            branch.push(self.node(current ^ 1));
            current >>= 1;
        }
        branch
    }

    fn node(&self, gindex: u64) -> Root {
        if let Some(leaf) = self.leaves.get(&gindex) {
            return *leaf;
        }
        if !self.leaves.keys().any(|&leaf| is_descendant(leaf, gindex)) {
            return [0u8; 32];
        }
        sha256_pair(&self.node(2 * gindex), &self.node(2 * gindex + 1))
    }
}

fn is_descendant(mut gindex: u64, ancestor: u64) -> bool {
    while gindex > ancestor {
        gindex >>= 1;
    }
    gindex == ancestor
}

/// Participation bits with the first `n` members set.
pub fn bits_with_first(n: usize) -> SyncCommitteeBits {
    let mut bits = SyncCommitteeBits::ZERO;
    for i in 0..n {
        bits.set(i, true);
    }
    bits
}

/// A full committee of distinct placeholder keys. Different seeds give
/// committees with different roots.
pub fn committee(seed: u8) -> SyncCommittee {
    let pubkeys = (0..SYNC_COMMITTEE_SIZE)
        .map(|i| {
            let mut key = [0u8; BLS_PUBKEY_LEN];
            key[0] = seed;
            key[1..3].copy_from_slice(&(i as u16).to_be_bytes());
            BlsPublicKey(key)
        })
        .collect();
    SyncCommittee {
        pubkeys,
        aggregate_pubkey: BlsPublicKey([seed; BLS_PUBKEY_LEN]),
    }
}

pub struct AcceptAllVerifier;

impl AggregateVerifier for AcceptAllVerifier {
    fn aggregate_verify(&self, _: &[&BlsPublicKey], _: &Root, _: &[u8; BLS_SIGNATURE_LEN]) -> bool {
        true
    }
}

pub struct RejectAllVerifier;

impl AggregateVerifier for RejectAllVerifier {
    fn aggregate_verify(&self, _: &[&BlsPublicKey], _: &Root, _: &[u8; BLS_SIGNATURE_LEN]) -> bool {
        false
    }
}

/// Accepts everything and remembers what it was asked to verify.
#[derive(Default)]
pub struct RecordingVerifier {
    pub calls: RefCell<Vec<(Vec<BlsPublicKey>, Root)>>,
}

impl AggregateVerifier for RecordingVerifier {
    fn aggregate_verify(
        &self,
        pubkeys: &[&BlsPublicKey],
        message: &Root,
        _: &[u8; BLS_SIGNATURE_LEN],
    ) -> bool {
        self.calls
            .borrow_mut()
            .push((pubkeys.iter().map(|&pk| pk.clone()).collect(), *message));
        true
    }
}

pub fn execution_root_for(block_number: u64) -> Root {
    sha256_hash(&block_number.to_le_bytes())
}

/// A light client header whose execution branch verifies. The block number
/// equals the slot.
pub fn light_client_header(slot: u64, state_root: Root) -> LightClientHeader {
    let execution = ExecutionPayloadHeader {
        block_number: slot,
        state_root: execution_root_for(slot),
        timestamp: 1_700_000_000 + slot * 12,
        ..Default::default()
    };

    let mut body = SparseTree::new();
    body.insert(EXECUTION_PAYLOAD_GINDEX, execution.hash_tree_root());

    LightClientHeader {
        beacon: BeaconBlockHeader {
            slot,
            proposer_index: slot % 1000,
            parent_root: sha256_hash(&slot.to_be_bytes()),
            state_root,
            body_root: body.root(),
        },
        execution_branch: body.branch(EXECUTION_PAYLOAD_GINDEX),
        execution,
    }
}

/// Mainnet constants with a checkpoint at `checkpoint_slot`. The committee
/// for period `p` is `committee(p)`.
pub struct Fixture {
    pub spec: ChainSpec,
    pub checkpoint_slot: u64,
}

impl Fixture {
    pub fn new(checkpoint_slot: u64) -> Self {
        Self {
            spec: ChainSpec::mainnet(),
            checkpoint_slot,
        }
    }

    pub fn committee_root(&self, period: u64) -> Root {
        committee(period as u8).hash_tree_root()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        let period = compute_sync_committee_period(&self.spec, self.checkpoint_slot);
        Checkpoint {
            header: BeaconBlockHeader {
                slot: self.checkpoint_slot,
                ..Default::default()
            },
            execution_block_number: CHECKPOINT_BLOCK_NUMBER,
            execution_state_root: CHECKPOINT_EXECUTION_ROOT,
            sync_committee_root: self.committee_root(period),
        }
    }

    pub fn client(&self) -> LightClient<AcceptAllVerifier> {
        self.client_with(AcceptAllVerifier)
    }

    pub fn client_with<V: AggregateVerifier>(&self, verifier: V) -> LightClient<V> {
        LightClient::new(self.spec.clone(), self.checkpoint(), verifier).unwrap()
    }

    /// Pretend the committee for `period` was learned earlier.
    pub fn install_committee(&self, client: &mut LightClient<AcceptAllVerifier>, period: u64) {
        let mut state = client.state().clone();
        state.sync_committee_roots.insert(period, self.committee_root(period));
        *client = LightClient::from_state(self.spec.clone(), state, AcceptAllVerifier).unwrap();
    }

    /// A finality update whose proofs all verify, signed by the committee of
    /// the signature slot's period.
    pub fn finality_update(
        &self,
        finalized_slot: u64,
        attested_slot: u64,
        signature_slot: u64,
    ) -> FinalizedHeaderUpdate {
        self.period_update(finalized_slot, attested_slot, signature_slot, 0).0
    }

    /// Like [`Fixture::finality_update`], with `committee(next_seed)` committed to as
    /// the next sync committee in the attested state.
    pub fn period_update(
        &self,
        finalized_slot: u64,
        attested_slot: u64,
        signature_slot: u64,
        next_seed: u8,
    ) -> (FinalizedHeaderUpdate, SyncCommitteePeriodUpdate) {
        let finalized_header = light_client_header(finalized_slot, sha256_hash(b"finalized state"));
        let next_sync_committee = committee(next_seed);

        let mut state = SparseTree::new();
        state.insert(FINALIZED_ROOT_GINDEX, finalized_header.beacon.hash_tree_root());
        state.insert(NEXT_SYNC_COMMITTEE_GINDEX, next_sync_committee.hash_tree_root());
        let attested_header = light_client_header(attested_slot, state.root());

        let signature_period = compute_sync_committee_period(&self.spec, signature_slot);
        let header_update = FinalizedHeaderUpdate {
            attested_header,
            finalized_header,
            finality_branch: state.branch(FINALIZED_ROOT_GINDEX),
            sync_aggregate: SyncAggregate {
                sync_committee_bits: bits_with_first(400),
                sync_committee_signature: BlsSignature(vec![0xab; BLS_SIGNATURE_LEN]),
            },
            signature_slot,
            fork_version: self.spec.fork_version("deneb").unwrap_or_default(),
            signature_sync_committee: committee(signature_period as u8),
        };
        let committee_update = SyncCommitteePeriodUpdate {
            next_sync_committee,
            next_sync_committee_branch: state.branch(NEXT_SYNC_COMMITTEE_GINDEX),
        };
        (header_update, committee_update)
    }
}
