use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::config::{ChainSpec, Checkpoint, ConfigError};
use crate::consensus::events::LightClientEvent;
use crate::consensus::period::compute_sync_committee_period;
use crate::consensus::signature::{verify_signed_header, AggregateVerifier};
use crate::consensus::sync_committee::{is_supermajority, participant_count};
use crate::error::{LightClientError, ProofTarget};
use crate::merkle::*;
use crate::ssz::HashTreeRoot;
use crate::types::beacon::*;
use crate::types::hex_serde;

/// Everything the light client has verified so far. Mutated only by a
/// successful import.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// The latest finalized beacon block header we have verified.
    pub finalized_header: BeaconBlockHeader,
    pub finalized_execution_block_number: u64,
    #[serde(with = "hex_serde::root")]
    pub finalized_execution_state_root: Root,
    /// Write-once committee roots, keyed by sync committee period.
    #[serde(with = "hex_serde::root_map")]
    pub sync_committee_roots: BTreeMap<u64, Root>,
    #[serde(with = "hex_serde::root")]
    pub genesis_validators_root: Root,
}

/// A sync committee light client over a pluggable BLS backend.
#[derive(Debug)]
pub struct LightClient<V> {
    spec: ChainSpec,
    state: ClientState,
    verifier: V,
}

impl<V: AggregateVerifier> LightClient<V> {
    /// Start from a trusted checkpoint. Only the committee root for the
    /// checkpoint's own period is known afterwards.
    pub fn new(spec: ChainSpec, checkpoint: Checkpoint, verifier: V) -> Result<Self, ConfigError> {
        spec.validate()?;

        let period = compute_sync_committee_period(&spec, checkpoint.header.slot);
        let state = ClientState {
            finalized_header: checkpoint.header,
            finalized_execution_block_number: checkpoint.execution_block_number,
            finalized_execution_state_root: checkpoint.execution_state_root,
            sync_committee_roots: BTreeMap::from([(period, checkpoint.sync_committee_root)]),
            genesis_validators_root: spec.genesis_validators_root,
        };
        info!(slot = state.finalized_header.slot, period, "light client initialized");

        Ok(Self { spec, state, verifier })
    }

    /// Resume from a state previously produced by this client.
    ///
    /// The state must belong to the chain described by `spec`.
    pub fn from_state(spec: ChainSpec, state: ClientState, verifier: V) -> Result<Self, ConfigError> {
        spec.validate()?;
        if state.genesis_validators_root != spec.genesis_validators_root {
            return Err(ConfigError::GenesisValidatorsRootMismatch {
                spec: spec.genesis_validators_root,
                state: state.genesis_validators_root,
            });
        }
        Ok(Self { spec, state, verifier })
    }

    pub fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn finalized_header(&self) -> &BeaconBlockHeader {
        &self.state.finalized_header
    }

    pub fn finalized_slot(&self) -> u64 {
        self.state.finalized_header.slot
    }

    pub fn finalized_execution_block_number(&self) -> u64 {
        self.state.finalized_execution_block_number
    }

    pub fn finalized_execution_state_root(&self) -> Root {
        self.state.finalized_execution_state_root
    }

    /// Period of the stored finalized header.
    pub fn current_period(&self) -> u64 {
        self.period(self.state.finalized_header.slot)
    }

    pub fn sync_committee_root(&self, period: u64) -> Option<Root> {
        self.state.sync_committee_roots.get(&period).copied()
    }

    /// Advance the finalized header with a finality update signed by the
    /// committee of the stored period or the one after it.
    pub fn import_finalized_header(
        &mut self,
        update: &FinalizedHeaderUpdate,
    ) -> Result<Vec<LightClientEvent>, LightClientError> {
        self.process_finalized_header(update).inspect_err(|e| {
            debug!(
                error = %e,
                signature_slot = update.signature_slot,
                finalized_slot = update.finalized_header.beacon.slot,
                "rejected finalized header update"
            )
        })
    }

    /// Install the committee for the period after the update's signature
    /// period, advancing the finalized header too when the update is newer.
    pub fn import_next_sync_committee(
        &mut self,
        header_update: &FinalizedHeaderUpdate,
        committee_update: &SyncCommitteePeriodUpdate,
    ) -> Result<Vec<LightClientEvent>, LightClientError> {
        self.process_next_sync_committee(header_update, committee_update)
            .inspect_err(|e| {
                debug!(
                    error = %e,
                    signature_slot = header_update.signature_slot,
                    attested_slot = header_update.attested_header.beacon.slot,
                    "rejected sync committee update"
                )
            })
    }

    fn process_finalized_header(
        &mut self,
        update: &FinalizedHeaderUpdate,
    ) -> Result<Vec<LightClientEvent>, LightClientError> {
        check_well_formed(update)?;
        check_participation(update)?;
        check_slot_order(update)?;
        validate_header_proofs(update)?;

        // The signer must belong to the committee of the locally known period
        // or the very next one.
        let stored_period = self.current_period();
        let signature_period = self.period(update.signature_slot);
        if signature_period != stored_period && signature_period != stored_period + 1 {
            return Err(LightClientError::InvalidSignaturePeriod {
                signature_period,
                stored_period,
            });
        }

        self.authenticate(update, signature_period)?;

        let update_slot = update.finalized_header.beacon.slot;
        let current_slot = self.state.finalized_header.slot;
        if update_slot <= current_slot {
            return Err(LightClientError::StaleUpdate {
                update_slot,
                current_slot,
            });
        }

        Ok(self.apply_finalized_header(update))
    }

    fn process_next_sync_committee(
        &mut self,
        header_update: &FinalizedHeaderUpdate,
        committee_update: &SyncCommitteePeriodUpdate,
    ) -> Result<Vec<LightClientEvent>, LightClientError> {
        check_well_formed(header_update)?;
        committee_update
            .next_sync_committee
            .validate()
            .map_err(LightClientError::MalformedUpdate)?;
        check_participation(header_update)?;
        check_slot_order(header_update)?;
        validate_header_proofs(header_update)?;

        let attested_period = self.period(header_update.attested_header.beacon.slot);
        let finalized_period = self.period(header_update.finalized_header.beacon.slot);
        let signature_period = self.period(header_update.signature_slot);
        if attested_period != finalized_period || finalized_period != signature_period {
            return Err(LightClientError::InconsistentPeriods {
                attested_period,
                finalized_period,
                signature_period,
            });
        }

        self.authenticate(header_update, signature_period)?;

        let committee_root = committee_update.next_sync_committee.hash_tree_root();
        validate_branch(
            &committee_root,
            &committee_update.next_sync_committee_branch,
            NEXT_SYNC_COMMITTEE_DEPTH,
            NEXT_SYNC_COMMITTEE_GINDEX,
            &header_update.attested_header.beacon.state_root,
        )
        .map_err(|source| LightClientError::InvalidProof {
            target: ProofTarget::NextSyncCommitteeBranch,
            source,
        })?;

        let next_period = signature_period + 1;
        if self.state.sync_committee_roots.contains_key(&next_period) {
            return Err(LightClientError::SyncCommitteeAlreadyImported {
                period: next_period,
            });
        }

        // All checks passed. Nothing below can fail.
        let mut events = Vec::new();
        if header_update.finalized_header.beacon.slot > self.state.finalized_header.slot {
            events = self.apply_finalized_header(header_update);
        }
        if let Entry::Vacant(slot) = self.state.sync_committee_roots.entry(next_period) {
            slot.insert(committee_root);
            info!(
                period = next_period,
                committee_root = %hex::encode(committee_root),
                "imported next sync committee"
            );
            events.push(LightClientEvent::NextSyncCommitteeImported {
                period: next_period,
                committee_root,
            });
        }
        Ok(events)
    }

    /// The stored committee root for `period` must exist and match the
    /// committee that signed, and the signature must verify.
    fn authenticate(
        &self,
        update: &FinalizedHeaderUpdate,
        period: u64,
    ) -> Result<(), LightClientError> {
        let expected = self
            .sync_committee_root(period)
            .ok_or(LightClientError::UnknownSyncCommittee { period })?;
        let found = update.signature_sync_committee.hash_tree_root();
        if found != expected {
            return Err(LightClientError::SyncCommitteeMismatch {
                period,
                expected,
                found,
            });
        }

        verify_signed_header(
            &self.verifier,
            &update.sync_aggregate,
            &update.signature_sync_committee,
            &update.fork_version,
            &update.attested_header.beacon,
            &self.state.genesis_validators_root,
        )?;
        trace!(period, "sync committee signature verified");
        Ok(())
    }

    fn apply_finalized_header(&mut self, update: &FinalizedHeaderUpdate) -> Vec<LightClientEvent> {
        let finalized = &update.finalized_header;
        self.state.finalized_header = finalized.beacon.clone();
        self.state.finalized_execution_block_number = finalized.execution.block_number;
        self.state.finalized_execution_state_root = finalized.execution.state_root;

        info!(
            slot = finalized.beacon.slot,
            block_number = finalized.execution.block_number,
            "imported finalized header"
        );
        vec![
            LightClientEvent::FinalizedHeaderImported {
                header: finalized.beacon.clone(),
            },
            LightClientEvent::FinalizedExecutionPayloadImported {
                block_number: finalized.execution.block_number,
                state_root: finalized.execution.state_root,
            },
        ]
    }

    fn period(&self, slot: u64) -> u64 {
        compute_sync_committee_period(&self.spec, slot)
    }
}

/// Schema bounds that the tree hasher relies on.
fn check_well_formed(update: &FinalizedHeaderUpdate) -> Result<(), LightClientError> {
    update.attested_header.execution.validate().map_err(LightClientError::MalformedUpdate)?;
    update.finalized_header.execution.validate().map_err(LightClientError::MalformedUpdate)?;
    update.signature_sync_committee.validate().map_err(LightClientError::MalformedUpdate)?;
    Ok(())
}

fn check_participation(update: &FinalizedHeaderUpdate) -> Result<(), LightClientError> {
    let bits = &update.sync_aggregate.sync_committee_bits;
    if !is_supermajority(bits) {
        return Err(LightClientError::InsufficientParticipation {
            participants: participant_count(bits),
            required: MIN_SYNC_COMMITTEE_PARTICIPANTS as u64,
        });
    }
    Ok(())
}

/// signature_slot > attested_slot >= finalized_slot
fn check_slot_order(update: &FinalizedHeaderUpdate) -> Result<(), LightClientError> {
    let signature_slot = update.signature_slot;
    let attested_slot = update.attested_header.beacon.slot;
    let finalized_slot = update.finalized_header.beacon.slot;
    if !(signature_slot > attested_slot && attested_slot >= finalized_slot) {
        return Err(LightClientError::InvalidSlotOrder {
            signature_slot,
            attested_slot,
            finalized_slot,
        });
    }
    Ok(())
}

/// Check the finality branch and both execution branches of an update.
pub fn validate_header_proofs(update: &FinalizedHeaderUpdate) -> Result<(), LightClientError> {
    let attested = &update.attested_header;
    let finalized = &update.finalized_header;

    validate_branch(
        &finalized.beacon.hash_tree_root(),
        &update.finality_branch,
        FINALIZED_ROOT_DEPTH,
        FINALIZED_ROOT_GINDEX,
        &attested.beacon.state_root,
    )
    .map_err(|source| LightClientError::InvalidProof {
        target: ProofTarget::FinalityBranch,
        source,
    })?;

    validate_execution_branch(attested).map_err(|source| LightClientError::InvalidProof {
        target: ProofTarget::AttestedExecutionBranch,
        source,
    })?;

    validate_execution_branch(finalized).map_err(|source| LightClientError::InvalidProof {
        target: ProofTarget::FinalizedExecutionBranch,
        source,
    })?;

    Ok(())
}

fn validate_execution_branch(header: &LightClientHeader) -> Result<(), BranchError> {
    validate_branch(
        &header.execution.hash_tree_root(),
        &header.execution_branch,
        EXECUTION_PAYLOAD_DEPTH,
        EXECUTION_PAYLOAD_GINDEX,
        &header.beacon.body_root,
    )
}
