use std::sync::Arc;

use parking_lot::RwLock;

use crate::consensus::events::LightClientEvent;
use crate::consensus::light_client::{ClientState, LightClient};
use crate::consensus::signature::AggregateVerifier;
use crate::error::LightClientError;
use crate::types::beacon::{BeaconBlockHeader, FinalizedHeaderUpdate, Root, SyncCommitteePeriodUpdate};

/// A light client that can be shared between threads.
///
/// Imports take the write lock for the whole check-then-commit sequence, so
/// concurrent imports are applied one at a time and readers never observe a
/// half-applied update.
pub struct SharedLightClient<V> {
    inner: Arc<RwLock<LightClient<V>>>,
}

impl<V> Clone for SharedLightClient<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: AggregateVerifier> SharedLightClient<V> {
    pub fn new(client: LightClient<V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(client)),
        }
    }

    pub fn import_finalized_header(
        &self,
        update: &FinalizedHeaderUpdate,
    ) -> Result<Vec<LightClientEvent>, LightClientError> {
        self.inner.write().import_finalized_header(update)
    }

    pub fn import_next_sync_committee(
        &self,
        header_update: &FinalizedHeaderUpdate,
        committee_update: &SyncCommitteePeriodUpdate,
    ) -> Result<Vec<LightClientEvent>, LightClientError> {
        self.inner
            .write()
            .import_next_sync_committee(header_update, committee_update)
    }

    pub fn finalized_header(&self) -> BeaconBlockHeader {
        self.inner.read().finalized_header().clone()
    }

    pub fn finalized_slot(&self) -> u64 {
        self.inner.read().finalized_slot()
    }

    pub fn finalized_execution_block_number(&self) -> u64 {
        self.inner.read().finalized_execution_block_number()
    }

    pub fn finalized_execution_state_root(&self) -> Root {
        self.inner.read().finalized_execution_state_root()
    }

    pub fn sync_committee_root(&self, period: u64) -> Option<Root> {
        self.inner.read().sync_committee_root(period)
    }

    /// A consistent copy of the whole state.
    pub fn snapshot(&self) -> ClientState {
        self.inner.read().state().clone()
    }
}
