//! Boundary between the Merkle engine and the anchoring microservice
//!
//! The engine itself never talks to a ledger. This crate prepares issuance
//! batches (tree, leaves, proofs), submits their leaf digests to the anchoring
//! service and reads back what the chain has confirmed.

mod batch;
mod config;
mod error;
mod http;
mod mock;
mod service;

pub use batch::{AnchorBatch, hash_records_chunked};
pub use config::AnchorConfig;
pub use error::{AnchorError, Result};
pub use http::HttpAnchorClient;
pub use mock::MockAnchorService;
pub use service::{
    AnchorReceipt, AnchorRequest, AnchorService, AnchoredEvent, EventQuery, confirm_inclusion,
};
