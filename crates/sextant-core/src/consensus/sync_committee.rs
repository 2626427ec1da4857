//! Participation counting and signer selection over the sync committee bitfield.

use crate::types::beacon::{BlsPublicKey, SyncCommittee, SyncCommitteeBits, SYNC_COMMITTEE_SIZE};

/// Count how many sync committee members participated (set bits).
pub fn participant_count(bits: &SyncCommitteeBits) -> u64 {
    bits.count_ones() as u64
}

/// At least 2/3 of the committee signed. Exactly 2/3 passes.
pub fn is_supermajority(bits: &SyncCommitteeBits) -> bool {
    participant_count(bits) * 3 >= SYNC_COMMITTEE_SIZE as u64 * 2
}

/// Public keys of the participating members, in committee order.
///
/// Bits beyond the end of `committee.pubkeys` select nothing; a short
/// committee never hashes to a trusted root, so it is rejected earlier.
pub fn select_participants<'a>(
    bits: &SyncCommitteeBits,
    committee: &'a SyncCommittee,
) -> Vec<&'a BlsPublicKey> {
    bits.iter_ones()
        .filter_map(|i| committee.pubkeys.get(i))
        .collect()
}
