use crate::config::ChainSpec;

/// Sync committee period containing `slot`.
pub fn compute_sync_committee_period(spec: &ChainSpec, slot: u64) -> u64 {
    slot / spec.slots_per_epoch / spec.epochs_per_sync_committee_period
}
