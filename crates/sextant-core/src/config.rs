//! Chain constants and the trusted starting point of a client.
//!
//! Both are supplied once, out of band, by whoever deploys the client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::beacon::{BeaconBlockHeader, Root, EPOCHS_PER_SYNC_COMMITTEE_PERIOD, SLOTS_PER_EPOCH};
use crate::types::hex_serde;

/// Ethereum mainnet genesis validators root.
pub const MAINNET_GENESIS_VALIDATORS_ROOT: Root = [
    0x4b, 0x36, 0x3d, 0xb9, 0x4e, 0x28, 0x61, 0x20, 0xd7, 0x6e, 0xb9, 0x05, 0x34, 0x0f, 0xdd, 0x4e,
    0x54, 0xbf, 0xe9, 0xf0, 0x6b, 0xf3, 0x3f, 0xf6, 0xcf, 0x5a, 0xd2, 0x7f, 0x51, 0x1b, 0xfe, 0x95,
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid chain spec: {0}")]
    InvalidChainSpec(&'static str),

    #[error(
        "State is for genesis validators root 0x{}, chain spec has 0x{}",
        hex::encode(.state),
        hex::encode(.spec)
    )]
    GenesisValidatorsRootMismatch { spec: [u8; 32], state: [u8; 32] },
}

/// A named fork, the epoch it activates at and the 4-byte version its
/// signatures are bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fork {
    pub name: String,
    #[serde(with = "hex_serde::bytes4")]
    pub version: [u8; 4],
    #[serde(default)]
    pub epoch: u64,
}

/// Per-network constants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub slots_per_epoch: u64,
    pub epochs_per_sync_committee_period: u64,
    /// Mixed into every signing domain.
    #[serde(with = "hex_serde::root")]
    pub genesis_validators_root: Root,
    #[serde(default)]
    pub forks: Vec<Fork>,
}

impl ChainSpec {
    pub fn mainnet() -> Self {
        let fork = |name: &str, version: [u8; 4], epoch: u64| Fork {
            name: name.to_string(),
            version,
            epoch,
        };
        Self {
            slots_per_epoch: SLOTS_PER_EPOCH,
            epochs_per_sync_committee_period: EPOCHS_PER_SYNC_COMMITTEE_PERIOD,
            genesis_validators_root: MAINNET_GENESIS_VALIDATORS_ROOT,
            forks: vec![
                fork("phase0", [0x00, 0x00, 0x00, 0x00], 0),
                fork("altair", [0x01, 0x00, 0x00, 0x00], 74_240),
                fork("bellatrix", [0x02, 0x00, 0x00, 0x00], 144_896),
                fork("capella", [0x03, 0x00, 0x00, 0x00], 194_048),
                fork("deneb", [0x04, 0x00, 0x00, 0x00], 269_568),
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Reject constants that would make period arithmetic divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots_per_epoch == 0 {
            return Err(ConfigError::InvalidChainSpec("slots_per_epoch must be non-zero"));
        }
        if self.epochs_per_sync_committee_period == 0 {
            return Err(ConfigError::InvalidChainSpec(
                "epochs_per_sync_committee_period must be non-zero",
            ));
        }
        Ok(())
    }

    /// Look up a fork version by the name the beacon API reports (`"deneb"`, ...).
    pub fn fork_version(&self, name: &str) -> Option<[u8; 4]> {
        self.forks
            .iter()
            .find(|fork| fork.name.eq_ignore_ascii_case(name))
            .map(|fork| fork.version)
    }

    /// The version of the latest fork active at `slot`.
    pub fn fork_version_at_slot(&self, slot: u64) -> Option<[u8; 4]> {
        let epoch = slot / self.slots_per_epoch.max(1);
        self.forks
            .iter()
            .filter(|fork| fork.epoch <= epoch)
            .max_by_key(|fork| fork.epoch)
            .map(|fork| fork.version)
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// The trusted starting point: a finalized header, its execution pointer and
/// the root of the sync committee for the header's period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub header: BeaconBlockHeader,
    pub execution_block_number: u64,
    #[serde(with = "hex_serde::root")]
    pub execution_state_root: Root,
    #[serde(with = "hex_serde::root")]
    pub sync_committee_root: Root,
}

impl Checkpoint {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
