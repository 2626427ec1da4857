//! Signing domain, signing root and the aggregate-signature check.

use thiserror::Error;
use tracing::{debug, trace};
use tree_hash_derive::TreeHash;

use crate::consensus::sync_committee::select_participants;
use crate::ssz::HashTreeRoot;
use crate::types::beacon::*;

/// DST (domain separation tag) for Ethereum BLS signatures.
pub const ETH_BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Signature is {found} bytes, expected {expected}")]
    InvalidLength { expected: usize, found: usize },

    #[error("No sync committee members participated")]
    NoParticipants,

    #[error("The aggregate signature does not verify against the participating committee members")]
    VerificationFailed,
}

/// The pairing backend. Implementations must be pure and terminate.
pub trait AggregateVerifier {
    /// Check `signature` as the aggregate of `pubkeys` each signing `message`.
    fn aggregate_verify(
        &self,
        pubkeys: &[&BlsPublicKey],
        message: &Root,
        signature: &[u8; BLS_SIGNATURE_LEN],
    ) -> bool;
}

impl<V: AggregateVerifier + ?Sized> AggregateVerifier for &V {
    fn aggregate_verify(
        &self,
        pubkeys: &[&BlsPublicKey],
        message: &Root,
        signature: &[u8; BLS_SIGNATURE_LEN],
    ) -> bool {
        (**self).aggregate_verify(pubkeys, message, signature)
    }
}

/// BLS12-381 verification backed by `blst`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlstVerifier;

impl AggregateVerifier for BlstVerifier {
    fn aggregate_verify(
        &self,
        pubkeys: &[&BlsPublicKey],
        message: &Root,
        signature: &[u8; BLS_SIGNATURE_LEN],
    ) -> bool {
        use blst::min_pk::{AggregatePublicKey, PublicKey, Signature};
        use blst::BLST_ERROR;

        let sig = match Signature::from_bytes(signature) {
            Ok(sig) => sig,
            Err(e) => {
                debug!(error = ?e, "failed to deserialize signature");
                return false;
            }
        };

        let pks = match pubkeys
            .iter()
            .map(|pk| PublicKey::from_bytes(&pk.0))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(pks) => pks,
            Err(e) => {
                debug!(error = ?e, "failed to deserialize committee public key");
                return false;
            }
        };

        let pk_refs: Vec<&PublicKey> = pks.iter().collect();
        let agg_pk = match AggregatePublicKey::aggregate(&pk_refs, false) {
            Ok(agg) => agg.to_public_key(),
            Err(e) => {
                debug!(error = ?e, "failed to aggregate public keys");
                return false;
            }
        };

        sig.verify(true, message, ETH_BLS_DST, &[], &agg_pk, false) == BLST_ERROR::BLST_SUCCESS
    }
}

#[derive(TreeHash)]
struct ForkData {
    current_version: [u8; 4],
    genesis_validators_root: Root,
}

#[derive(TreeHash)]
struct SigningData {
    object_root: Root,
    domain: Root,
}

/// Compute the domain for sync committee signing.
/// domain = domain_type + fork_data_root[:28]
pub fn compute_domain(
    domain_type: &[u8; 4],
    fork_version: &[u8; 4],
    genesis_validators_root: &Root,
) -> Root {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type);
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    domain
}

/// hash_tree_root of `ForkData { current_version, genesis_validators_root }`.
pub fn compute_fork_data_root(fork_version: &[u8; 4], genesis_validators_root: &Root) -> Root {
    ForkData {
        current_version: *fork_version,
        genesis_validators_root: *genesis_validators_root,
    }
    .hash_tree_root()
}

/// Compute the signing root for a beacon block header.
/// The committee signs hash_tree_root(header) wrapped in a signing domain,
/// never the header directly.
pub fn compute_signing_root(header: &BeaconBlockHeader, domain: &Root) -> Root {
    SigningData {
        object_root: header.hash_tree_root(),
        domain: *domain,
    }
    .hash_tree_root()
}

/// Verify a sync committee signature over `header`.
///
/// The supermajority check is the caller's job; this only authenticates
/// whoever the bitfield says signed.
pub fn verify_signed_header<V: AggregateVerifier + ?Sized>(
    verifier: &V,
    aggregate: &SyncAggregate,
    committee: &SyncCommittee,
    fork_version: &[u8; 4],
    header: &BeaconBlockHeader,
    genesis_validators_root: &Root,
) -> Result<(), SignatureError> {
    let domain = compute_domain(&DOMAIN_SYNC_COMMITTEE, fork_version, genesis_validators_root);
    let signing_root = compute_signing_root(header, &domain);
    trace!(signing_root = %hex::encode(signing_root), slot = header.slot, "computed signing root");

    let signature = aggregate
        .sync_committee_signature
        .to_fixed()
        .ok_or(SignatureError::InvalidLength {
            expected: BLS_SIGNATURE_LEN,
            found: aggregate.sync_committee_signature.as_bytes().len(),
        })?;

    let participants = select_participants(&aggregate.sync_committee_bits, committee);
    if participants.is_empty() {
        return Err(SignatureError::NoParticipants);
    }

    if !verifier.aggregate_verify(&participants, &signing_root, &signature) {
        return Err(SignatureError::VerificationFailed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAINNET_GENESIS_VALIDATORS_ROOT;
    use crate::ssz::sha256_pair;
    use crate::test_utils::{bits_with_first, committee, AcceptAllVerifier, RecordingVerifier, RejectAllVerifier};
    use blst::min_pk::{AggregatePublicKey, AggregateSignature, SecretKey};

    fn aggregate(count: usize, signature: Vec<u8>) -> SyncAggregate {
        SyncAggregate {
            sync_committee_bits: bits_with_first(count),
            sync_committee_signature: BlsSignature(signature),
        }
    }

    #[test]
    fn test_compute_domain() {
        let domain = compute_domain(
            &DOMAIN_SYNC_COMMITTEE,
            &[0x04, 0x00, 0x00, 0x00], // Deneb fork version
            &[0xaa; 32],
        );
        // Domain should start with the domain type
        assert_eq!(&domain[..4], &DOMAIN_SYNC_COMMITTEE);
        assert_eq!(
            &domain[4..],
            &compute_fork_data_root(&[0x04, 0x00, 0x00, 0x00], &[0xaa; 32])[..28]
        );
        let mut version_leaf = [0u8; 32];
        version_leaf[..4].copy_from_slice(&[0x04, 0x00, 0x00, 0x00]);
        assert_eq!(
            compute_fork_data_root(&[0x04, 0x00, 0x00, 0x00], &[0xaa; 32]),
            sha256_pair(&version_leaf, &[0xaa; 32])
        );
        // Different fork, different domain
        let capella = compute_domain(&DOMAIN_SYNC_COMMITTEE, &[0x03, 0x00, 0x00, 0x00], &[0xaa; 32]);
        assert_ne!(domain, capella);
    }

    #[test]
    fn test_signing_root_binds_domain() {
        let header = BeaconBlockHeader { slot: 9, ..Default::default() };
        let a = compute_signing_root(&header, &[1; 32]);
        let b = compute_signing_root(&header, &[2; 32]);
        assert_ne!(a, b);
        assert_eq!(a, sha256_pair(&header.hash_tree_root(), &[1; 32]));
    }

    #[test]
    fn test_rejects_malformed_signature_length() {
        let committee = committee(1);
        let result = verify_signed_header(
            &AcceptAllVerifier,
            &aggregate(400, vec![0u8; 95]),
            &committee,
            &[0x04, 0, 0, 0],
            &BeaconBlockHeader::default(),
            &[0; 32],
        );
        assert_eq!(
            result,
            Err(SignatureError::InvalidLength { expected: 96, found: 95 })
        );
    }

    #[test]
    fn test_rejects_empty_signer_set() {
        let result = verify_signed_header(
            &AcceptAllVerifier,
            &aggregate(0, vec![0u8; 96]),
            &committee(1),
            &[0x04, 0, 0, 0],
            &BeaconBlockHeader::default(),
            &[0; 32],
        );
        assert_eq!(result, Err(SignatureError::NoParticipants));
    }

    #[test]
    fn test_backend_rejection_surfaces() {
        let result = verify_signed_header(
            &RejectAllVerifier,
            &aggregate(400, vec![0u8; 96]),
            &committee(1),
            &[0x04, 0, 0, 0],
            &BeaconBlockHeader::default(),
            &[0; 32],
        );
        assert_eq!(result, Err(SignatureError::VerificationFailed));
    }

    #[test]
    fn test_backend_receives_signers_and_signing_root() {
        let committee = committee(3);
        let header = BeaconBlockHeader { slot: 77, ..Default::default() };
        let fork_version = [0x04, 0, 0, 0];
        let gvr = [0x5a; 32];
        let verifier = RecordingVerifier::default();

        verify_signed_header(
            &verifier,
            &aggregate(350, vec![0x11; 96]),
            &committee,
            &fork_version,
            &header,
            &gvr,
        )
        .unwrap();

        let calls = verifier.calls.borrow();
        assert_eq!(calls.len(), 1);
        let (signers, message) = &calls[0];
        assert_eq!(signers, &committee.pubkeys[..350].to_vec());
        let domain = compute_domain(&DOMAIN_SYNC_COMMITTEE, &fork_version, &gvr);
        assert_eq!(*message, compute_signing_root(&header, &domain));
    }

    #[test]
    fn test_blst_rejects_garbage() {
        let committee = committee(4);
        let result = verify_signed_header(
            &BlstVerifier,
            &aggregate(400, vec![0u8; 96]),
            &committee,
            &[0x04, 0, 0, 0],
            &BeaconBlockHeader::default(),
            &[0; 32],
        );
        assert_eq!(result, Err(SignatureError::VerificationFailed));
    }

    #[test]
    fn test_blst_verifies_committee_aggregate() {
        let secret_keys: Vec<SecretKey> = (0..SYNC_COMMITTEE_SIZE)
            .map(|i| {
                let mut ikm = [0x5e; 32];
                ikm[..8].copy_from_slice(&(i as u64).to_le_bytes());
                SecretKey::key_gen(&ikm, &[]).unwrap()
            })
            .collect();
        let public_keys: Vec<_> = secret_keys.iter().map(SecretKey::sk_to_pk).collect();
        let aggregate_pubkey = AggregatePublicKey::aggregate(&public_keys.iter().collect::<Vec<_>>(), false)
            .unwrap()
            .to_public_key();
        let committee = SyncCommittee {
            pubkeys: public_keys.iter().map(|pk| BlsPublicKey(pk.compress())).collect(),
            aggregate_pubkey: BlsPublicKey(aggregate_pubkey.compress()),
        };

        let header = BeaconBlockHeader {
            slot: 8_626_200,
            proposer_index: 1234,
            parent_root: [0x01; 32],
            state_root: [0x02; 32],
            body_root: [0x03; 32],
        };
        let fork_version = [0x04, 0x00, 0x00, 0x00];
        let gvr = MAINNET_GENESIS_VALIDATORS_ROOT;
        let domain = compute_domain(&DOMAIN_SYNC_COMMITTEE, &fork_version, &gvr);
        let signing_root = compute_signing_root(&header, &domain);

        let signatures: Vec<_> = secret_keys[..400]
            .iter()
            .map(|sk| sk.sign(&signing_root, ETH_BLS_DST, &[]))
            .collect();
        let signature = AggregateSignature::aggregate(&signatures.iter().collect::<Vec<_>>(), false)
            .unwrap()
            .to_signature();
        let mut aggregate = aggregate(400, signature.compress().to_vec());

        let verify = |aggregate: &SyncAggregate, fork_version: &[u8; 4]| {
            verify_signed_header(&BlstVerifier, aggregate, &committee, fork_version, &header, &gvr)
        };
        assert_eq!(verify(&aggregate, &fork_version), Ok(()));

        // Signed under Deneb, checked under Capella.
        assert_eq!(
            verify(&aggregate, &[0x03, 0x00, 0x00, 0x00]),
            Err(SignatureError::VerificationFailed)
        );

        // A signer missing from the bitfield.
        aggregate.sync_committee_bits.set(399, false);
        assert_eq!(verify(&aggregate, &fork_version), Err(SignatureError::VerificationFailed));

        // A non-signer claimed in the bitfield.
        aggregate.sync_committee_bits.set(399, true);
        aggregate.sync_committee_bits.set(400, true);
        assert_eq!(verify(&aggregate, &fork_version), Err(SignatureError::VerificationFailed));
    }
}
