use serde::{Deserialize, Serialize};

use crate::types::beacon::{BeaconBlockHeader, Root};
use crate::types::hex_serde;

/// Observable effects of a committed update, in the order they happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LightClientEvent {
    FinalizedHeaderImported {
        header: BeaconBlockHeader,
    },
    FinalizedExecutionPayloadImported {
        block_number: u64,
        #[serde(with = "hex_serde::root")]
        state_root: Root,
    },
    NextSyncCommitteeImported {
        period: u64,
        #[serde(with = "hex_serde::root")]
        committee_root: Root,
    },
}
