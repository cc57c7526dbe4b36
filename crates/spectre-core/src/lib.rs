//! # Spectre Core
//!
//! Pure Rust data model and witness-assembly logic for the Spectre Relay
//! light-client pipeline.
//!
//! This crate contains **no networking code**. It owns:
//!
//! - The beacon-chain/light-client data model (`types::beacon`).
//! - The on-chain/wire payload shapes consumed by the verifier contract and
//!   the prover RPC (`types::witness`).
//! - Hand-rolled SSZ-style Merkleization used to build the inclusion proofs
//!   the verifier checks on-chain (`ssz`).
//! - The Step/Rotate witness builder, generic over the `BeaconAdapter` and
//!   `ProverClient` trait boundaries so it can be driven against fakes in
//!   tests without a network (`witness_builder`).
//!
//! Everything in this crate is synchronous pure computation except the two
//! trait boundaries in `witness_builder`, which are `async_trait` so
//! `spectre-client` can implement them against real HTTP/JSON-RPC endpoints.

pub mod error;
pub mod ssz;
pub mod types;
pub mod witness_builder;

pub use error::WitnessError;
pub use types::{beacon::*, message::*, witness::*};
pub use witness_builder::{
    build_rotate_witness, build_step_witness, rotate_proof, step_proof, BeaconAdapter,
    ProverClient,
};
