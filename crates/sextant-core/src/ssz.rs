//! SSZ `hash_tree_root` for the containers the light client has to hash.
//!
//! Merkleization is done by `tree_hash`. The header containers derive
//! `TreeHash`; the byte fields and the committee carry manual impls sized by
//! their schema. [`HashTreeRoot`] is what the rest of the crate calls.
//!
//! Hashing never fails or panics on over-long lists. Schema limits are
//! checked by the types' `validate` methods before anything is hashed.

use sha2::{Digest, Sha256};
use tree_hash::{merkle_root, mix_in_length, Hash256, PackedEncoding, TreeHash, TreeHashType, BYTES_PER_CHUNK};

use crate::types::beacon::{BlsPublicKey, Root, SyncCommittee, BLS_PUBKEY_LEN, SYNC_COMMITTEE_SIZE};
use crate::types::execution::{ExtraData, LogsBloom, BYTES_PER_LOGS_BLOOM, MAX_EXTRA_DATA_BYTES};

/// Types that reduce to a single SSZ Merkle root.
pub trait HashTreeRoot {
    fn hash_tree_root(&self) -> Root;
}

impl<T: TreeHash> HashTreeRoot for T {
    fn hash_tree_root(&self) -> Root {
        self.tree_hash_root().0
    }
}

impl TreeHash for BlsPublicKey {
    fn tree_hash_type() -> TreeHashType {
        <[u8; BLS_PUBKEY_LEN]>::tree_hash_type()
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_root(&self) -> Hash256 {
        self.0.tree_hash_root()
    }
}

impl TreeHash for LogsBloom {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::Vector
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("Vector should never be packed.")
    }

    fn tree_hash_root(&self) -> Hash256 {
        merkle_root(&self.0, BYTES_PER_LOGS_BLOOM / BYTES_PER_CHUNK)
    }
}

impl TreeHash for ExtraData {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::List
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        unreachable!("List should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("List should never be packed.")
    }

    fn tree_hash_root(&self) -> Hash256 {
        let contents = merkle_root(&self.0, MAX_EXTRA_DATA_BYTES.div_ceil(BYTES_PER_CHUNK));
        mix_in_length(&contents, self.0.len())
    }
}

impl TreeHash for SyncCommittee {
    fn tree_hash_type() -> TreeHashType {
        TreeHashType::Container
    }

    fn tree_hash_packed_encoding(&self) -> PackedEncoding {
        unreachable!("Struct should never be packed.")
    }

    fn tree_hash_packing_factor() -> usize {
        unreachable!("Struct should never be packed.")
    }

    fn tree_hash_root(&self) -> Hash256 {
        let leaves: Vec<u8> = self
            .pubkeys
            .iter()
            .flat_map(|pk| pk.tree_hash_root().0)
            .collect();
        let pubkeys_root = merkle_root(&leaves, SYNC_COMMITTEE_SIZE);

        let fields = [pubkeys_root.0, self.aggregate_pubkey.tree_hash_root().0].concat();
        merkle_root(&fields, 2)
    }
}

/// SHA256 hash of arbitrary data.
pub fn sha256_hash(data: &[u8]) -> Root {
    Sha256::digest(data).into()
}

/// SHA256 hash of two 32-byte values concatenated.
pub fn sha256_pair(a: &Root, b: &Root) -> Root {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}
