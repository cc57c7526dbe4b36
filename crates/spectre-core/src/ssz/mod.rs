//! Hand-rolled SSZ-style Merkleization.
//!
//! This mirrors the sha256-pair binary-tree Merkleization beacon-chain SSZ
//! actually uses, simplified to the containers this crate needs: the
//! beacon block header, the 512-pubkey sync-committee set, and the
//! execution payload header. It intentionally does not pull in a general
//! SSZ library — every container here is fixed-shape and known at compile
//! time, so a generic encoder would buy nothing but risk.

pub mod merkle;

pub use merkle::{
    compute_domain, hash_beacon_block_header, hash_tree_root_execution_payload_header,
    hash_tree_root_sync_committee_pubkeys, verify_merkle_branch, EXECUTION_STATE_ROOT_GINDEX,
};
