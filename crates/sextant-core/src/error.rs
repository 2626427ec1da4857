use std::fmt;

use thiserror::Error;

use crate::consensus::signature::SignatureError;
use crate::merkle::BranchError;

/// Which embedded proof of an update failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofTarget {
    /// Finalized header root in the attested state.
    FinalityBranch,
    /// Execution payload in the attested block body.
    AttestedExecutionBranch,
    /// Execution payload in the finalized block body.
    FinalizedExecutionBranch,
    /// Next sync committee in the attested state.
    NextSyncCommitteeBranch,
}

impl fmt::Display for ProofTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProofTarget::FinalityBranch => "finality branch",
            ProofTarget::AttestedExecutionBranch => "attested execution branch",
            ProofTarget::FinalizedExecutionBranch => "finalized execution branch",
            ProofTarget::NextSyncCommitteeBranch => "next sync committee branch",
        };
        f.write_str(name)
    }
}

/// Why an update was rejected. A rejected update never changes client state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightClientError {
    #[error("Malformed update: {0}")]
    MalformedUpdate(&'static str),

    #[error("Insufficient sync committee participation: {participants}/512 (need at least {required})")]
    InsufficientParticipation { participants: u64, required: u64 },

    #[error(
        "(signature_slot > attested_slot >= finalized_slot) must hold, \
        found: ({signature_slot} > {attested_slot} >= {finalized_slot})"
    )]
    InvalidSlotOrder {
        signature_slot: u64,
        attested_slot: u64,
        finalized_slot: u64,
    },

    #[error("Invalid Merkle proof for {target}: {source}")]
    InvalidProof {
        target: ProofTarget,
        source: BranchError,
    },

    #[error(
        "Signature period {signature_period} must equal the stored period \
        {stored_period} or the one after it"
    )]
    InvalidSignaturePeriod {
        signature_period: u64,
        stored_period: u64,
    },

    #[error(
        "Committee rotation needs one period, found attested {attested_period}, \
        finalized {finalized_period}, signature {signature_period}"
    )]
    InconsistentPeriods {
        attested_period: u64,
        finalized_period: u64,
        signature_period: u64,
    },

    #[error("No sync committee root known for period {period}")]
    UnknownSyncCommittee { period: u64 },

    #[error("Sync committee root for period {period} is 0x{}, update carries 0x{}", hex::encode(.expected), hex::encode(.found))]
    SyncCommitteeMismatch {
        period: u64,
        expected: [u8; 32],
        found: [u8; 32],
    },

    #[error("Invalid sync committee signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    #[error("Update slot {update_slot} is not newer than current state slot {current_slot}")]
    StaleUpdate { update_slot: u64, current_slot: u64 },

    #[error("Sync committee for period {period} is already imported")]
    SyncCommitteeAlreadyImported { period: u64 },
}
