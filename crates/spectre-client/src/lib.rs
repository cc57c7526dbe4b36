//! # Spectre Client
//!
//! Typed HTTP/JSON-RPC adapters implementing `spectre_core`'s `BeaconAdapter`
//! and `ProverClient` trait boundaries, plus the Router `Deposit` log
//! decoder. This crate is the only place in the workspace that speaks HTTP —
//! everything it returns is already converted into `spectre_core` types.

mod beacon;
mod prover;
mod router;

pub use beacon::{BeaconApiError, HttpBeaconAdapter};
pub use prover::{JsonRpcProverClient, ProverRpcError};
pub use router::{decode_deposit_log, DepositRecord, RouterLogError, RouterLogFetcher, MAX_BLOCK_RANGE};
