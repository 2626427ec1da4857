//! # Sextant WASM
//!
//! WebAssembly bindings for the Sextant beacon chain light client.
//! This crate bridges `sextant-core`'s pure Rust verification logic to
//! JavaScript via `wasm-bindgen`.
//!
//! ## Architecture
//!
//! - All cryptographic verification happens in Rust/WASM (never in JS)
//! - BLS12-381 aggregate signature verification through `blst`
//! - Accepts raw beacon API JSON, format conversion handled internally
//! - The host fetches updates and decides when to call in; nothing here
//!   touches the network

mod beacon_api;

use serde::{Deserialize, Serialize};
use sextant_core::{
    BlstVerifier, ChainSpec, Checkpoint, ClientState, LightClient, LightClientEvent,
};
use wasm_bindgen::prelude::*;

/// Set up panic hook on WASM initialization.
/// This ensures Rust panics are logged to the browser console with full stack traces.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// The main Sextant client. Holds the verified chain state.
#[wasm_bindgen]
pub struct SextantClient {
    client: LightClient<BlstVerifier>,
}

#[wasm_bindgen]
impl SextantClient {
    /// Initialize from a trusted checkpoint.
    ///
    /// `checkpoint_json` is a `Checkpoint` (finalized header, execution block
    /// number and state root, committee root). `chain_spec_json` defaults to
    /// mainnet when absent.
    ///
    /// The checkpoint is the only moment of trust. It must be obtained from
    /// multiple independent sources before calling this.
    #[wasm_bindgen(constructor)]
    pub fn new(checkpoint_json: &str, chain_spec_json: Option<String>) -> Result<SextantClient, JsValue> {
        let spec = parse_spec(chain_spec_json)?;
        let checkpoint = Checkpoint::from_json(checkpoint_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid checkpoint: {}", e)))?;

        log_to_console(&format!(
            "[Sextant] Initializing at slot {}, committee root 0x{}",
            checkpoint.header.slot,
            hex::encode(checkpoint.sync_committee_root)
        ));

        let client = LightClient::new(spec, checkpoint, BlstVerifier)
            .map_err(|e| JsValue::from_str(&format!("Failed to initialize: {}", e)))?;

        Ok(SextantClient { client })
    }

    /// Resume from JSON produced by [`SextantClient::state_json`].
    pub fn from_state(state_json: &str, chain_spec_json: Option<String>) -> Result<SextantClient, JsValue> {
        let spec = parse_spec(chain_spec_json)?;
        let state: ClientState = serde_json::from_str(state_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid state JSON: {}", e)))?;
        let client = LightClient::from_state(spec, state, BlstVerifier)
            .map_err(|e| JsValue::from_str(&format!("Failed to resume: {}", e)))?;

        log_to_console(&format!("[Sextant] Resumed at slot {}", client.finalized_slot()));
        Ok(SextantClient { client })
    }

    /// Import a finality update.
    ///
    /// Accepts the raw JSON from:
    ///   GET /eth/v1/beacon/light_client/finality_update
    /// plus the sync committee of the signature period as
    /// `{ pubkeys, aggregate_pubkey }`.
    ///
    /// Returns the emitted events. A rejected update leaves the state untouched
    /// and surfaces as an error.
    pub fn import_finality_update(
        &mut self,
        update_json: &str,
        committee_json: &str,
    ) -> Result<JsValue, JsValue> {
        let update = beacon_api::decode_finality_update(self.client.spec(), update_json, committee_json)
            .map_err(|e| JsValue::from_str(&format!("Update conversion: {}", e)))?;

        let events = self
            .client
            .import_finalized_header(&update)
            .map_err(|e| reject(&e.to_string()))?;

        log_to_console(&format!(
            "[Sextant] Finalized slot {} (execution block #{})",
            self.client.finalized_slot(),
            self.client.finalized_execution_block_number()
        ));
        events_to_js(&events)
    }

    /// Import one element of:
    ///   GET /eth/v1/beacon/light_client/updates
    /// installing the next period's sync committee.
    pub fn import_period_update(
        &mut self,
        update_json: &str,
        committee_json: &str,
    ) -> Result<JsValue, JsValue> {
        let (header_update, committee_update) =
            beacon_api::decode_period_update(self.client.spec(), update_json, committee_json)
                .map_err(|e| JsValue::from_str(&format!("Update conversion: {}", e)))?;

        let events = self
            .client
            .import_next_sync_committee(&header_update, &committee_update)
            .map_err(|e| reject(&e.to_string()))?;

        for event in &events {
            if let LightClientEvent::NextSyncCommitteeImported { period, .. } = event {
                log_to_console(&format!("[Sextant] Sync committee for period {} installed", period));
            }
        }
        events_to_js(&events)
    }

    /// Latest finalized slot we have cryptographic proof for.
    pub fn finalized_slot(&self) -> u64 {
        self.client.finalized_slot()
    }

    pub fn execution_block_number(&self) -> u64 {
        self.client.finalized_execution_block_number()
    }

    /// Execution state root of the finalized block (hex encoded).
    /// This is the root `eth_getProof` responses verify against.
    pub fn execution_state_root(&self) -> String {
        format!("0x{}", hex::encode(self.client.finalized_execution_state_root()))
    }

    pub fn sync_committee_root(&self, period: u64) -> Option<String> {
        self.client
            .sync_committee_root(period)
            .map(|r| format!("0x{}", hex::encode(r)))
    }

    /// Get the sync state summary for the TypeScript layer.
    pub fn sync_state(&self) -> Result<JsValue, JsValue> {
        let period = self.client.current_period();
        let sync_state = SyncStateResponse {
            finalized_slot: self.client.finalized_slot(),
            current_period: period,
            has_next_committee: self.client.sync_committee_root(period + 1).is_some(),
            execution_block_number: self.client.finalized_execution_block_number(),
            execution_state_root: self.execution_state_root(),
        };

        serde_wasm_bindgen::to_value(&sync_state)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// The whole verified state as JSON, for persistence.
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.client.state())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}

// --- Response types ---

#[derive(Serialize, Deserialize)]
struct SyncStateResponse {
    finalized_slot: u64,
    current_period: u64,
    has_next_committee: bool,
    execution_block_number: u64,
    execution_state_root: String,
}

// --- Private helpers ---

fn parse_spec(chain_spec_json: Option<String>) -> Result<ChainSpec, JsValue> {
    match chain_spec_json {
        Some(json) => ChainSpec::from_json(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid chain spec: {}", e))),
        None => Ok(ChainSpec::mainnet()),
    }
}

fn events_to_js(events: &[LightClientEvent]) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&events)
        .map_err(|e| JsValue::from_str(&format!("Serialization: {}", e)))
}

fn reject(reason: &str) -> JsValue {
    log_to_console(&format!("[Sextant] Update rejected: {}", reason));
    JsValue::from_str(reason)
}

// --- Console logging ---

fn log_to_console(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}
