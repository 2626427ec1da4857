//! SSZ Merkle branch verification against a generalized index.

use thiserror::Error;

use crate::ssz::sha256_pair;
use crate::types::beacon::Root;

/// Generalized index of the execution payload in the beacon block body.
pub const EXECUTION_PAYLOAD_GINDEX: u64 = 25;
pub const EXECUTION_PAYLOAD_DEPTH: usize = 4;

/// Generalized index for the next sync committee in the beacon state.
pub const NEXT_SYNC_COMMITTEE_GINDEX: u64 = 55;
pub const NEXT_SYNC_COMMITTEE_DEPTH: usize = 5;

/// Generalized index for the finalized checkpoint root in the beacon state.
pub const FINALIZED_ROOT_GINDEX: u64 = 105;
pub const FINALIZED_ROOT_DEPTH: usize = 6;

/// Why a branch failed to verify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BranchError {
    #[error("branch has {found} nodes, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("branch does not hash to the expected root")]
    RootMismatch,
}

/// Verify a Merkle branch (SSZ proof) against an expected root.
pub fn is_valid_branch(
    leaf: &Root,
    branch: &[Root],
    depth: usize,
    generalized_index: u64,
    root: &Root,
) -> bool {
    validate_branch(leaf, branch, depth, generalized_index, root).is_ok()
}

/// Like [`is_valid_branch`], but reports which way the branch is wrong.
///
/// At level `i` the running hash is the right child when bit `i` of
/// `generalized_index` is set, the left child otherwise.
pub fn validate_branch(
    leaf: &Root,
    branch: &[Root],
    depth: usize,
    generalized_index: u64,
    root: &Root,
) -> Result<(), BranchError> {
    if branch.len() != depth {
        return Err(BranchError::LengthMismatch {
            expected: depth,
            found: branch.len(),
        });
    }

    let computed = branch
        .iter()
        .enumerate()
        .fold(*leaf, |current, (i, node)| {
            if (generalized_index >> i) & 1 == 1 {
                sha256_pair(node, &current)
            } else {
                sha256_pair(&current, node)
            }
        });

    if computed != *root {
        return Err(BranchError::RootMismatch);
    }
    Ok(())
}
