//! # Sextant Core
//!
//! Verification logic for an Ethereum beacon chain sync committee light client.
//!
//! This crate contains **no networking code** and **no WASM dependencies**.
//! Updates are handed in by an untrusted relayer; nothing in them is believed
//! until the Merkle branches, the committee root and the aggregate BLS
//! signature have all been checked.
//!
//! ## Trust Model
//!
//! - **Checkpoint**: a finalized header and the root of its period's sync
//!   committee, obtained out of band. This is the only trusted input.
//!
//! - **Sync committee verification** (`consensus` module): 2/3+ of the
//!   512-member committee must sign. Committee roots are learned one period
//!   at a time and never overwritten.
//!
//! - **Header proofs** (`merkle` module): SSZ branches tie the finalized
//!   header to the attested state and each execution payload header to its
//!   block body.
//!
//! ## Usage
//!
//! ```ignore
//! use sextant_core::{BlstVerifier, ChainSpec, Checkpoint, LightClient};
//!
//! let mut client = LightClient::new(ChainSpec::mainnet(), checkpoint, BlstVerifier)?;
//! let events = client.import_finalized_header(&update)?;
//! ```

pub mod config;
pub mod consensus;
pub mod error;
pub mod merkle;
pub mod shared;
pub mod ssz;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types for convenience
pub use config::{ChainSpec, Checkpoint, ConfigError, Fork};
pub use consensus::{
    events::LightClientEvent,
    light_client::{ClientState, LightClient},
    period::compute_sync_committee_period,
    signature::{AggregateVerifier, BlstVerifier, SignatureError},
};
pub use error::{LightClientError, ProofTarget};
pub use merkle::{is_valid_branch, BranchError};
pub use shared::SharedLightClient;
pub use ssz::HashTreeRoot;
pub use types::{beacon::*, execution::*};
