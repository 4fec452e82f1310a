//! Shared test utilities for the q-explore client
//!
//! - Deterministic ids and timestamps
//! - Record and generation-response fixtures

pub mod fixtures;
